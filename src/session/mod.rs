//! Recording session management
//!
//! This module provides the `RecordingSessionController` abstraction that
//! manages:
//! - Microphone authorization at startup
//! - The recording phase state machine (idle/recording/paused/stopped)
//! - Elapsed-time tracking from backend progress ticks
//! - Stop-before-play serialization of the single audio device
//! - Observer notifications for state changes and recovered errors

mod controller;
mod events;
mod state;

pub use controller::RecordingSessionController;
pub use events::SessionEvent;
pub use state::{Authorization, Phase, RecordingOutcome, Session};
