use super::state::{Phase, RecordingOutcome};

/// Notifications republished to observers (the UI or any caller).
///
/// Errors arrive here too: the controller recovers every backend failure
/// locally and reports it instead of propagating.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The session moved to a new phase
    PhaseChanged(Phase),

    /// Elapsed whole seconds ticked forward while recording
    Progress { elapsed_seconds: u64 },

    /// A recording finished and the outcome was recorded
    RecordingFinished(RecordingOutcome),

    /// Playback of the working file ended
    PlaybackFinished { succeeded: bool },

    /// An intent failed or was rejected; the phase reflects whatever the
    /// failure semantics left in place
    Error { intent: &'static str, message: String },
}
