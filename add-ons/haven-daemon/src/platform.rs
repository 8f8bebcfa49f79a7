//! Logging-only platform collaborators for running the core headless.

use async_trait::async_trait;
use haven_core::{
    BadgeEngine, HapticIntensity, HapticPulse, HavenResult, MoodLevel, MoodStore,
    NotificationOptions, NotificationPermission, SystemNotifier, TelephonyIntent,
};
use haven_voice::{AudioPayload, AudioPlayer, PlaybackDone, SpeechSynthesizer, VoiceResult};
use std::sync::Arc;
use tracing::info;

/// Dialer, haptics, notifier and speaker that only log what a device would do.
pub struct LoggingPlatform {
    notification_permission: NotificationPermission,
}

impl LoggingPlatform {
    /// `HAVEN_NOTIFICATIONS=granted|denied` (anything else: never asked).
    pub fn from_env() -> Self {
        let notification_permission = match std::env::var("HAVEN_NOTIFICATIONS")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "granted" => NotificationPermission::Granted,
            "denied" => NotificationPermission::Denied,
            _ => NotificationPermission::Default,
        };
        Self {
            notification_permission,
        }
    }
}

impl TelephonyIntent for LoggingPlatform {
    fn dial(&self, phone_number: &str) {
        info!(target: "haven::platform", phone_number, "dial");
        println!("📞 dialing {}", phone_number);
    }
}

impl HapticPulse for LoggingPlatform {
    fn pulse(&self, intensity: HapticIntensity) {
        info!(target: "haven::platform", intensity = ?intensity, "haptic pulse");
    }
}

impl SystemNotifier for LoggingPlatform {
    fn permission(&self) -> NotificationPermission {
        self.notification_permission
    }

    fn notify(&self, title: &str, body: &str, options: &NotificationOptions) {
        info!(target: "haven::platform", tag = ?options.tag, "notification");
        println!("🔔 {}: {}", title, body);
    }
}

/// "Synthesizes" by passing the text through as bytes.
#[async_trait]
impl SpeechSynthesizer for LoggingPlatform {
    async fn synthesize(&self, text: &str) -> VoiceResult<Option<AudioPayload>> {
        Ok(Some(AudioPayload {
            bytes: text.as_bytes().to_vec(),
        }))
    }
}

impl AudioPlayer for LoggingPlatform {
    fn play(&self, payload: AudioPayload, on_done: Option<PlaybackDone>) -> VoiceResult<()> {
        println!("🔊 {}", String::from_utf8_lossy(&payload.bytes));
        if let Some(done) = on_done {
            done();
        }
        Ok(())
    }

    fn stop_all(&self) {}
}

/// Logs a check-in streak summary whenever the journal changes.
pub struct StreakBadges {
    store: Arc<dyn MoodStore>,
}

impl StreakBadges {
    pub fn new(store: Arc<dyn MoodStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BadgeEngine for StreakBadges {
    async fn recompute(&self) -> HavenResult<()> {
        let entries = self.store.read_all()?;
        let steady = entries
            .iter()
            .rev()
            .take_while(|e| !matches!(e.mood_level, MoodLevel::Crisis))
            .count();
        info!(
            target: "haven::platform",
            check_ins = entries.len(),
            since_last_crisis = steady,
            "badges recomputed"
        );
        Ok(())
    }
}
