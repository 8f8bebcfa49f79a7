//! **SpeechOutput**: exclusive "now speaking" slot over synthesis + playback.
//!
//! Starting an utterance stops whatever is playing first. Any synthesis or playback failure
//! is logged and the slot is reset, so the UI never shows a stuck speaking state.

use crate::error::VoiceResult;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Synthesized audio (WAV/MP3 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
}

/// Text to audio. `Ok(None)` means nothing to play.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> VoiceResult<Option<AudioPayload>>;
}

pub type PlaybackDone = Box<dyn FnOnce() + Send>;

pub trait AudioPlayer: Send + Sync {
    /// Start playback; `on_done` runs when it finishes or is stopped.
    fn play(&self, payload: AudioPayload, on_done: Option<PlaybackDone>) -> VoiceResult<()>;
    fn stop_all(&self);
}

pub struct SpeechOutput {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    player: Arc<dyn AudioPlayer>,
    speaking: Arc<Mutex<Option<u64>>>,
    next_id: AtomicU64,
}

impl SpeechOutput {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, player: Arc<dyn AudioPlayer>) -> Self {
        Self {
            synthesizer,
            player,
            speaking: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.current_utterance().is_some()
    }

    /// Id of the utterance holding the slot.
    pub fn current_utterance(&self) -> Option<u64> {
        *self.speaking.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stop(&self) {
        self.player.stop_all();
        *self.speaking.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Speak `text`, replacing any current utterance. Returns the utterance id when playback
    /// started; `None` on failure, empty audio, or when a newer utterance took the slot.
    pub async fn speak(&self, text: &str) -> Option<u64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.player.stop_all();
        *self.speaking.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);

        let payload = match self.synthesizer.synthesize(text).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                release(&self.speaking, id);
                return None;
            }
            Err(e) => {
                warn!(target: "haven::speech", error = %e, "speech synthesis failed");
                release(&self.speaking, id);
                return None;
            }
        };

        if self.current_utterance() != Some(id) {
            debug!(target: "haven::speech", utterance = id, "superseded during synthesis; dropped");
            return None;
        }

        let slot = Arc::clone(&self.speaking);
        let on_done: PlaybackDone = Box::new(move || release(&slot, id));
        if let Err(e) = self.player.play(payload, Some(on_done)) {
            warn!(target: "haven::speech", error = %e, "audio playback failed");
            release(&self.speaking, id);
            return None;
        }
        debug!(target: "haven::speech", utterance = id, "speaking");
        Some(id)
    }
}

/// Clear the slot only if `id` still owns it.
fn release(slot: &Mutex<Option<u64>>, id: u64) {
    let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if *guard == Some(id) {
        *guard = None;
    }
}
