use anyhow::Result;
use serde::Deserialize;

use crate::audio::{EncoderSettings, Encoding};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Directory the working file lives in
    pub output_dir: String,

    /// File stem of the working file (extension comes from the encoding)
    pub file_stem: String,

    pub encoder: EncoderSettings,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: "recordings".to_string(),
            file_stem: format!("memo-{}", uuid::Uuid::new_v4()),
            // The built-in tone backend encodes WAV; native AAC backends
            // override this from their config file
            encoder: EncoderSettings {
                encoding: Encoding::Wav,
                ..EncoderSettings::default()
            },
        }
    }
}

impl RecorderConfig {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
