//! State machine states for the voxclip daemon
//!
//! Dictation workflow:
//! Idle → Recording → Processing → Completed → Idle
//!
//! Only the `RecordingController` mutates the state; everything else
//! (status display, tests) reads it.

use std::time::Instant;

/// Application state
#[derive(Debug, Clone)]
pub enum AppState {
    /// Waiting for the hotkey
    Idle,

    /// Capturing audio from the microphone
    Recording {
        /// When recording started
        started_at: Instant,
        /// Session sequence id
        session: u64,
    },

    /// Recording stopped, transcription in flight
    Processing {
        /// Session sequence id
        session: u64,
    },

    /// Transcript delivered, holding briefly before returning to idle
    Completed {
        /// When processing finished
        finished_at: Instant,
    },
}

impl AppState {
    pub fn new() -> Self {
        AppState::Idle
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, AppState::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, AppState::Recording { .. })
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, AppState::Processing { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, AppState::Completed { .. })
    }

    /// Get recording duration if currently recording
    pub fn recording_duration(&self) -> Option<std::time::Duration> {
        match self {
            AppState::Recording { started_at, .. } => Some(started_at.elapsed()),
            _ => None,
        }
    }

    /// Session id of the active recording or processing session
    pub fn session(&self) -> Option<u64> {
        match self {
            AppState::Recording { session, .. } | AppState::Processing { session } => {
                Some(*session)
            }
            _ => None,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppState::Idle => write!(f, "Idle"),
            AppState::Recording { started_at, .. } => {
                write!(f, "Recording ({:.1}s)", started_at.elapsed().as_secs_f32())
            }
            AppState::Processing { session } => write!(f, "Processing (session {})", session),
            AppState::Completed { .. } => write!(f, "Completed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = AppState::new();
        assert!(state.is_idle());
        assert!(state.session().is_none());
    }

    #[test]
    fn test_recording_state() {
        let state = AppState::Recording {
            started_at: Instant::now(),
            session: 3,
        };
        assert!(state.is_recording());
        assert!(!state.is_idle());
        assert!(state.recording_duration().is_some());
        assert_eq!(state.session(), Some(3));
    }

    #[test]
    fn test_idle_has_no_duration() {
        assert!(AppState::Idle.recording_duration().is_none());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(format!("{}", AppState::Idle), "Idle");

        let state = AppState::Recording {
            started_at: Instant::now(),
            session: 1,
        };
        assert!(format!("{}", state).starts_with("Recording"));

        let state = AppState::Processing { session: 1 };
        assert!(format!("{}", state).starts_with("Processing"));
    }
}
