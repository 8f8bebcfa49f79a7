//! # Haven Voice - hands-free wake-word commands
//!
//! ```text
//! SpeechRecognizer ──► RecognitionSession ──► WakeWordAdapter ──► IntentTable (first match)
//!        ▲   restart on Ended                      │
//!        └──────────────────────────────────────── ├─► SpeechOutput (exclusive slot)
//!                                                  ├─► AppState::navigate
//!                                                  └─► HapticPulse (urgent)
//! ```

pub mod error;
pub mod intents;
pub mod recognition;
pub mod speech_output;
pub mod wake_word;

pub use error::{VoiceError, VoiceResult};
pub use intents::{contains_wake_word, IntentTable, VoiceIntent, DEFAULT_INTENTS};
pub use recognition::{ChannelRecognizer, RecognitionEvent, RecognitionSession, SpeechRecognizer};
pub use speech_output::{AudioPayload, AudioPlayer, PlaybackDone, SpeechOutput, SpeechSynthesizer};
pub use wake_word::{TranscriptOutcome, VoiceLoopExit, WakeWordAdapter};
