//! Continuous speech recognition seam.
//!
//! A platform recognizer hands out one `RecognitionSession` at a time. Sessions end on their
//! own (`Ended`) every so often; the wake-word loop restarts them. Dropping a session stops it.

use crate::error::{VoiceError, VoiceResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// A final transcript for one utterance.
    Transcript(String),
    /// The engine closed the session on its own.
    Ended,
    /// The engine errored mid-session.
    Failed(String),
}

pub struct RecognitionSession {
    events: mpsc::Receiver<RecognitionEvent>,
    stop: CancellationToken,
}

impl RecognitionSession {
    /// `stop` is cancelled when the session is stopped or dropped; the engine should watch it.
    pub fn new(events: mpsc::Receiver<RecognitionEvent>, stop: CancellationToken) -> Self {
        Self { events, stop }
    }

    /// Next event; a closed channel reads as a natural end.
    pub async fn next_event(&mut self) -> RecognitionEvent {
        self.events.recv().await.unwrap_or(RecognitionEvent::Ended)
    }

    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }
}

impl Drop for RecognitionSession {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Start listening. An error means the engine is unavailable for now.
    async fn start_session(&self) -> VoiceResult<RecognitionSession>;
}

struct ActiveSession {
    tx: mpsc::Sender<RecognitionEvent>,
    stop: CancellationToken,
}

/// In-process recognizer fed by hand. Backs the daemon's `say` command and the tests.
#[derive(Default)]
pub struct ChannelRecognizer {
    active: Mutex<Option<ActiveSession>>,
    starts: AtomicUsize,
    unavailable: AtomicBool,
}

impl ChannelRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `start_session` fail (or succeed again).
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of sessions started so far.
    pub fn session_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Whether a session is live and not stopped.
    pub fn is_listening(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| !s.stop.is_cancelled() && !s.tx.is_closed())
            .unwrap_or(false)
    }

    /// Push an event into the live session. Returns `false` when nobody is listening.
    pub fn inject(&self, event: RecognitionEvent) -> bool {
        let guard = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(session) if !session.stop.is_cancelled() => session.tx.try_send(event).is_ok(),
            _ => {
                debug!(target: "haven::voice", "no live recognition session; event dropped");
                false
            }
        }
    }

    pub fn hear(&self, transcript: impl Into<String>) -> bool {
        self.inject(RecognitionEvent::Transcript(transcript.into()))
    }

    /// Simulate the engine timing out its session.
    pub fn end_session(&self) -> bool {
        self.inject(RecognitionEvent::Ended)
    }
}

#[async_trait]
impl SpeechRecognizer for ChannelRecognizer {
    async fn start_session(&self) -> VoiceResult<RecognitionSession> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(VoiceError::RecognitionUnavailable(
                "speech recognition not available".to_string(),
            ));
        }
        let (tx, rx) = mpsc::channel(32);
        let stop = CancellationToken::new();
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(ActiveSession {
            tx,
            stop: stop.clone(),
        });
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(RecognitionSession::new(rx, stop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_recognizer_session() {
        let recognizer = ChannelRecognizer::new();
        assert!(!recognizer.hear("too early"));

        let mut session = recognizer.start_session().await.unwrap();
        assert!(recognizer.is_listening());
        assert!(recognizer.hear("hey haven"));
        assert_eq!(
            session.next_event().await,
            RecognitionEvent::Transcript("hey haven".to_string())
        );

        drop(session);
        assert!(!recognizer.is_listening());
        assert!(!recognizer.end_session());
        assert_eq!(recognizer.session_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_engine() {
        let recognizer = ChannelRecognizer::new();
        recognizer.set_available(false);
        assert!(recognizer.start_session().await.is_err());
        recognizer.set_available(true);
        assert!(recognizer.start_session().await.is_ok());
    }
}
