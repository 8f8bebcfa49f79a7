//! Voice Wake-Word Adapter.
//!
//! Active only while the user is authenticated, onboarding is complete and hands-free mode is
//! on. `run` is the supervised "always listening" loop: start a session, act on transcripts,
//! restart on a natural end, and exit on cancellation, disable, or engine failure.

use crate::intents::{contains_wake_word, IntentTable};
use crate::recognition::{RecognitionEvent, SpeechRecognizer};
use crate::speech_output::SpeechOutput;
use haven_core::{AppState, HapticIntensity, HapticPulse, Route};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// First delay once sessions keep ending with nothing heard; doubles up to `MAX_IDLE_BACKOFF`.
const IDLE_RESTART_BACKOFF: Duration = Duration::from_millis(250);
const MAX_IDLE_BACKOFF: Duration = Duration::from_secs(5);

/// Delay before the next restart after `idle_restarts` back-to-back sessions with no transcript.
/// The first restart is always immediate.
fn restart_backoff(idle_restarts: u32) -> Option<Duration> {
    if idle_restarts < 2 {
        return None;
    }
    let doublings = (idle_restarts - 2).min(8);
    Some((IDLE_RESTART_BACKOFF * 2u32.pow(doublings)).min(MAX_IDLE_BACKOFF))
}

/// Why the supervised loop returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceLoopExit {
    /// Owner cancelled the scope.
    Cancelled,
    /// An enabling condition went false.
    Disabled,
    /// Engine unavailable or errored; voice stays off until conditions change.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptOutcome {
    NoWakeWord,
    NoIntent,
    Matched { intent: &'static str, route: Route },
}

pub struct WakeWordAdapter {
    app: Arc<AppState>,
    recognizer: Arc<dyn SpeechRecognizer>,
    speech: Arc<SpeechOutput>,
    haptics: Arc<dyn HapticPulse>,
    intents: IntentTable,
}

impl WakeWordAdapter {
    pub fn new(
        app: Arc<AppState>,
        recognizer: Arc<dyn SpeechRecognizer>,
        speech: Arc<SpeechOutput>,
        haptics: Arc<dyn HapticPulse>,
    ) -> Self {
        Self {
            app,
            recognizer,
            speech,
            haptics,
            intents: IntentTable::default(),
        }
    }

    pub fn with_intents(mut self, intents: IntentTable) -> Self {
        self.intents = intents;
        self
    }

    /// Authenticated, onboarded, and hands-free on.
    pub fn is_enabled(app: &AppState) -> bool {
        let session = app.session();
        session.authenticated && session.onboarding_complete && app.settings().hands_free_enabled
    }

    /// Wake word → first matching intent → confirmation (unless quiet) → navigate → urgent haptic.
    /// Navigation and haptic do not wait for the confirmation audio.
    pub fn handle_transcript(&self, transcript: &str) -> TranscriptOutcome {
        if !contains_wake_word(transcript, &self.app.config().wake_word) {
            debug!(target: "haven::voice", "no wake word; transcript ignored");
            return TranscriptOutcome::NoWakeWord;
        }
        let Some(intent) = self.intents.first_match(transcript).copied() else {
            debug!(target: "haven::voice", transcript = %transcript, "wake word heard; no intent matched");
            return TranscriptOutcome::NoIntent;
        };

        if !self.app.settings().quiet_mode {
            self.speak_in_background(intent.confirmation);
        }
        self.app.navigate(intent.route);
        self.haptics.pulse(HapticIntensity::Urgent);
        info!(
            target: "haven::voice",
            intent = intent.name,
            route = %intent.route,
            "voice command"
        );
        TranscriptOutcome::Matched {
            intent: intent.name,
            route: intent.route,
        }
    }

    fn speak_in_background(&self, text: &'static str) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let speech = Arc::clone(&self.speech);
                handle.spawn(async move {
                    speech.speak(text).await;
                });
            }
            Err(_) => warn!(target: "haven::voice", "no async runtime; confirmation skipped"),
        }
    }

    /// Supervised recognition loop. Returns when `cancel` fires, when the adapter is no longer
    /// enabled, or when the engine fails.
    pub async fn run(&self, cancel: CancellationToken) -> VoiceLoopExit {
        let mut revision = self.app.subscribe();
        let mut idle_restarts: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return VoiceLoopExit::Cancelled;
            }
            if !Self::is_enabled(&self.app) {
                debug!(target: "haven::voice", "voice adapter not enabled");
                return VoiceLoopExit::Disabled;
            }

            let mut session = tokio::select! {
                _ = cancel.cancelled() => return VoiceLoopExit::Cancelled,
                started = self.recognizer.start_session() => match started {
                    Ok(session) => session,
                    Err(e) => {
                        warn!(target: "haven::voice", error = %e, "recognition unavailable; voice disabled");
                        return VoiceLoopExit::Failed(e.to_string());
                    }
                },
            };
            info!(target: "haven::voice", "recognition session started");

            let mut heard = false;
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => {
                        session.stop();
                        info!(target: "haven::voice", "recognition stopped");
                        return VoiceLoopExit::Cancelled;
                    }
                    Ok(()) = revision.changed() => {
                        if !Self::is_enabled(&self.app) {
                            session.stop();
                            info!(target: "haven::voice", "voice disabled; recognition stopped");
                            return VoiceLoopExit::Disabled;
                        }
                        continue;
                    }
                    event = session.next_event() => event,
                };
                match event {
                    RecognitionEvent::Transcript(text) => {
                        // a transcript can race a disable that has not reached `revision` yet
                        if !Self::is_enabled(&self.app) {
                            session.stop();
                            return VoiceLoopExit::Disabled;
                        }
                        heard = true;
                        self.handle_transcript(&text);
                    }
                    RecognitionEvent::Ended => break,
                    RecognitionEvent::Failed(reason) => {
                        session.stop();
                        warn!(target: "haven::voice", reason = %reason, "recognition failed; voice disabled");
                        return VoiceLoopExit::Failed(reason);
                    }
                }
            }
            drop(session);
            idle_restarts = if heard { 0 } else { idle_restarts.saturating_add(1) };
            match restart_backoff(idle_restarts) {
                None => {
                    debug!(target: "haven::voice", "recognition session ended; restarting");
                    tokio::task::yield_now().await;
                }
                Some(delay) => {
                    debug!(
                        target: "haven::voice",
                        idle_restarts,
                        delay_ms = delay.as_millis() as u64,
                        "recognition ending without input; backing off"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return VoiceLoopExit::Cancelled,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VoiceResult;
    use crate::recognition::ChannelRecognizer;
    use crate::speech_output::{AudioPayload, AudioPlayer, PlaybackDone, SpeechSynthesizer};
    use async_trait::async_trait;
    use haven_core::SessionFlags;
    use std::sync::Mutex;

    struct SilentSynth;

    #[async_trait]
    impl SpeechSynthesizer for SilentSynth {
        async fn synthesize(&self, _text: &str) -> VoiceResult<Option<AudioPayload>> {
            Ok(None)
        }
    }

    struct NullPlayer;

    impl AudioPlayer for NullPlayer {
        fn play(&self, _payload: AudioPayload, _on_done: Option<PlaybackDone>) -> VoiceResult<()> {
            Ok(())
        }
        fn stop_all(&self) {}
    }

    #[derive(Default)]
    struct RecordingHaptics(Mutex<Vec<HapticIntensity>>);

    impl HapticPulse for RecordingHaptics {
        fn pulse(&self, intensity: HapticIntensity) {
            self.0.lock().unwrap().push(intensity);
        }
    }

    fn adapter() -> (WakeWordAdapter, Arc<AppState>, Arc<RecordingHaptics>) {
        let app = Arc::new(AppState::default());
        let haptics = Arc::new(RecordingHaptics::default());
        let speech = Arc::new(SpeechOutput::new(Arc::new(SilentSynth), Arc::new(NullPlayer)));
        let adapter = WakeWordAdapter::new(
            Arc::clone(&app),
            Arc::new(ChannelRecognizer::new()),
            speech,
            haptics.clone(),
        );
        (adapter, app, haptics)
    }

    #[test]
    fn test_restart_backoff_schedule() {
        assert_eq!(restart_backoff(0), None);
        assert_eq!(restart_backoff(1), None);
        assert_eq!(restart_backoff(2), Some(Duration::from_millis(250)));
        assert_eq!(restart_backoff(3), Some(Duration::from_millis(500)));
        assert_eq!(restart_backoff(7), Some(Duration::from_secs(5)));
        assert_eq!(restart_backoff(u32::MAX), Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_transcript_without_wake_word_ignored() {
        let (adapter, app, haptics) = adapter();
        assert_eq!(adapter.handle_transcript("breathe please"), TranscriptOutcome::NoWakeWord);
        assert_eq!(app.current_route(), Route::Dashboard);
        assert!(haptics.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_matched_intent_navigates_and_pulses() {
        let (adapter, app, haptics) = adapter();
        assert_eq!(
            adapter.handle_transcript("Hey Haven, I need to breathe"),
            TranscriptOutcome::Matched {
                intent: "breathe",
                route: Route::Breathing
            }
        );
        assert_eq!(app.current_route(), Route::Breathing);
        assert_eq!(app.navigator().origin(), Some(Route::Dashboard));
        assert_eq!(*haptics.0.lock().unwrap(), vec![HapticIntensity::Urgent]);
        assert_eq!(adapter.handle_transcript("hey haven sing a song"), TranscriptOutcome::NoIntent);
    }

    #[test]
    fn test_enabling_conditions() {
        let app = AppState::default();
        assert!(!WakeWordAdapter::is_enabled(&app));
        app.set_session(SessionFlags {
            authenticated: true,
            onboarding_complete: true,
        });
        assert!(!WakeWordAdapter::is_enabled(&app));
        app.update_settings(|s| s.hands_free_enabled = true);
        assert!(WakeWordAdapter::is_enabled(&app));
        app.set_session(SessionFlags {
            authenticated: true,
            onboarding_complete: false,
        });
        assert!(!WakeWordAdapter::is_enabled(&app));
    }
}
