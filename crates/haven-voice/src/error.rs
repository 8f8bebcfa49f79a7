//! Error types for the voice adapter

use haven_core::HavenError;
use thiserror::Error;

/// Result type alias for voice operations
pub type VoiceResult<T> = Result<T, VoiceError>;

/// Errors raised by recognition and speech collaborators
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Recognition engine unavailable: {0}")]
    RecognitionUnavailable(String),

    #[error("Recognition failed: {0}")]
    Recognition(String),

    #[error("Microphone permission denied")]
    MicrophoneDenied,

    #[error("TTS error: {0}")]
    Synthesis(String),

    #[error("Audio playback error: {0}")]
    Playback(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(String),
}

impl From<VoiceError> for HavenError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::MicrophoneDenied => HavenError::PermissionDenied(err.to_string()),
            VoiceError::Synthesis(_) | VoiceError::Playback(_) => HavenError::Speech(err.to_string()),
            VoiceError::RecognitionUnavailable(_)
            | VoiceError::Recognition(_)
            | VoiceError::ChannelClosed(_) => HavenError::VoiceSession(err.to_string()),
        }
    }
}
