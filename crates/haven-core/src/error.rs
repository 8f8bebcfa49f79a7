//! Error types for the Haven safety core.
//!
//! None of these are fatal to the host application. Adapters log and swallow them so
//! the worst outcome of any failure is "no proactive nudge fires".

use thiserror::Error;

/// Result type alias for core operations
pub type HavenResult<T> = Result<T, HavenError>;

/// Errors that can occur inside the safety core
#[derive(Debug, Error)]
pub enum HavenError {
    /// Crisis classifier or nudge generator threw, timed out, or returned nothing usable.
    #[error("Classification failed: {0}")]
    Classification(String),

    /// Speech synthesis or playback failed.
    #[error("Speech failed: {0}")]
    Speech(String),

    /// Recognition engine unavailable or failed on start.
    #[error("Voice session failed: {0}")]
    VoiceSession(String),

    /// Notification or microphone permission not granted. Treated as a soft disable.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Mood store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Settings file error: {0}")]
    Settings(String),

    #[error("HALT flow error: {0}")]
    Halt(String),

    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    #[error("Unknown mood level: {0}")]
    UnknownMoodLevel(String),

    #[error("Invalid crisis phrase pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<sled::Error> for HavenError {
    fn from(err: sled::Error) -> Self {
        HavenError::Store(err.to_string())
    }
}

impl From<toml::de::Error> for HavenError {
    fn from(err: toml::de::Error) -> Self {
        HavenError::Settings(err.to_string())
    }
}

impl From<toml::ser::Error> for HavenError {
    fn from(err: toml::ser::Error) -> Self {
        HavenError::Settings(err.to_string())
    }
}
