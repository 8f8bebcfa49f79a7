//! Integration test: Biometric Vulnerability Adapter under paused time.
//!
//! Verifies that:
//! 1. Under a continuous breach the adapter fires at most once per 300s of its own firing.
//! 2. It never fires while the user is on a regulation tool.
//! 3. Notifications go out only when permission was already granted.
//! 4. Cancelling the token ends the poll.

use async_trait::async_trait;
use haven_core::{
    AppState, BiometricSample, CannedNudgeGenerator, HapticIntensity, HapticPulse, HavenResult,
    NotificationOptions, NotificationPermission, NudgePresenter, ProactiveNudgeGenerator, Route,
    SystemNotifier, TelephonyIntent,
};
use haven_sentinel::{BiometricAdapter, GateDecision};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

struct NoDialer;

impl TelephonyIntent for NoDialer {
    fn dial(&self, _phone_number: &str) {}
}

#[derive(Default)]
struct TimedHaptics(Mutex<Vec<(Instant, HapticIntensity)>>);

impl HapticPulse for TimedHaptics {
    fn pulse(&self, intensity: HapticIntensity) {
        self.0.lock().unwrap().push((Instant::now(), intensity));
    }
}

struct FakeNotifier {
    permission: NotificationPermission,
    sent: Mutex<Vec<String>>,
}

impl SystemNotifier for FakeNotifier {
    fn permission(&self) -> NotificationPermission {
        self.permission
    }

    fn notify(&self, _title: &str, body: &str, _options: &NotificationOptions) {
        self.sent.lock().unwrap().push(body.to_string());
    }
}

struct Harness {
    app: Arc<AppState>,
    presenter: Arc<NudgePresenter>,
    haptics: Arc<TimedHaptics>,
    notifier: Arc<FakeNotifier>,
    adapter: Arc<BiometricAdapter>,
}

fn harness(
    permission: NotificationPermission,
    generator: Arc<dyn ProactiveNudgeGenerator>,
) -> Harness {
    let app = Arc::new(AppState::default());
    let presenter = Arc::new(NudgePresenter::new(Arc::clone(&app), Arc::new(NoDialer)));
    let haptics = Arc::new(TimedHaptics::default());
    let notifier = Arc::new(FakeNotifier {
        permission,
        sent: Mutex::new(Vec::new()),
    });
    let adapter = Arc::new(BiometricAdapter::new(
        Arc::clone(&app),
        Arc::clone(&presenter),
        generator,
        notifier.clone(),
        haptics.clone(),
    ));
    Harness {
        app,
        presenter,
        haptics,
        notifier,
        adapter,
    }
}

#[tokio::test(start_paused = true)]
async fn continuous_breach_respects_cooldown() {
    let h = harness(NotificationPermission::Granted, Arc::new(CannedNudgeGenerator));
    h.app.record_biometric(BiometricSample::synced(130));

    let cancel = CancellationToken::new();
    let adapter = Arc::clone(&h.adapter);
    let token = cancel.clone();
    let poll = tokio::spawn(async move { adapter.run(token).await });

    tokio::time::sleep(Duration::from_secs(950)).await;
    cancel.cancel();
    poll.await.unwrap();

    let pulses = h.haptics.0.lock().unwrap();
    assert_eq!(pulses.len(), 4, "fires at 0s, 300s, 600s, 900s");
    for pair in pulses.windows(2) {
        assert!(pair[1].0 - pair[0].0 >= Duration::from_secs(300));
    }
    assert!(pulses.iter().all(|(_, i)| *i == HapticIntensity::Light));

    let sent = h.notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 4);
    assert!(sent[0].contains("130"));

    let nudge = h.presenter.snapshot();
    assert!(nudge.is_open);
    assert_eq!(nudge.context, "heart_rate:130");
    assert!(nudge.message.contains("breath"));
}

#[tokio::test(start_paused = true)]
async fn never_fires_on_regulation_tools() {
    let h = harness(NotificationPermission::Granted, Arc::new(CannedNudgeGenerator));
    h.app.record_biometric(BiometricSample::synced(160));
    for route in [Route::Breathing, Route::Grounding, Route::BodyScan] {
        h.app.navigate(route);
        for _ in 0..40 {
            assert_eq!(h.adapter.tick().await, GateDecision::Suppressed(route));
            tokio::time::advance(Duration::from_secs(10)).await;
        }
    }
    assert!(h.haptics.0.lock().unwrap().is_empty());
    assert!(!h.presenter.is_open());
    assert!(h.adapter.last_fired().is_none());
}

#[tokio::test(start_paused = true)]
async fn gates_on_flag_sync_and_threshold() {
    let h = harness(NotificationPermission::Default, Arc::new(CannedNudgeGenerator));
    assert_eq!(h.adapter.tick().await, GateDecision::NoSample);

    h.app.record_biometric(BiometricSample {
        is_synced: false,
        ..BiometricSample::synced(140)
    });
    assert_eq!(h.adapter.tick().await, GateDecision::NotSynced);

    h.app.record_biometric(BiometricSample::synced(105));
    assert_eq!(h.adapter.tick().await, GateDecision::BelowThreshold(105));

    h.app.record_biometric(BiometricSample::synced(106));
    h.app.update_settings(|s| s.biometric_alerts_enabled = false);
    assert_eq!(h.adapter.tick().await, GateDecision::FeatureDisabled);

    h.app.update_settings(|s| {
        s.biometric_alerts_enabled = true;
        s.quiet_mode = true;
    });
    assert_eq!(h.adapter.tick().await, GateDecision::Fire { heart_rate: 106 });
    // quiet mode: no haptic; permission never granted: no notification
    assert!(h.haptics.0.lock().unwrap().is_empty());
    assert!(h.notifier.sent.lock().unwrap().is_empty());
    assert!(h.presenter.is_open());

    assert!(matches!(
        h.adapter.tick().await,
        GateDecision::CoolingDown { .. }
    ));
}

/// Generator that stalls long enough for the user to open a breathing tool.
struct SlowGenerator;

#[async_trait]
impl ProactiveNudgeGenerator for SlowGenerator {
    async fn generate(&self, _context_summary: &str) -> HavenResult<String> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok("late message".to_string())
    }
}

#[tokio::test(start_paused = true)]
async fn stale_generation_result_is_dropped() {
    let h = harness(NotificationPermission::Denied, Arc::new(SlowGenerator));
    h.app.record_biometric(BiometricSample::synced(125));
    let adapter = Arc::clone(&h.adapter);
    let tick = tokio::spawn(async move { adapter.tick().await });
    tokio::time::sleep(Duration::from_secs(1)).await;
    h.app.navigate(Route::Breathing);
    assert_eq!(tick.await.unwrap(), GateDecision::Fire { heart_rate: 125 });
    assert!(!h.presenter.is_open());
    assert!(h.adapter.last_fired().is_some());
}
