//! Biometric Vulnerability Adapter.
//!
//! A fixed-interval poll over the latest wearable sample. Each tick fires only when every gate
//! holds, checked in order:
//!
//! 1. biometric alerts enabled
//! 2. current route is not a regulation tool (breathing, grounding, body scan)
//! 3. at least the cooldown (300s) since this adapter last fired
//! 4. sample synced and heart rate above the threshold (105 bpm)
//!
//! The cooldown counts from the last firing, not from when the breach started.

use haven_core::{
    notify_if_granted, nudge_message_or_fallback, AppState, BiometricSample, HapticIntensity,
    HapticPulse, HavenConfig, NotificationOptions, NudgePresenter, ProactiveNudgeGenerator, Route,
    SystemNotifier,
};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const NOTIFICATION_TAG: &str = "haven-heart-rate";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Fire { heart_rate: u32 },
    FeatureDisabled,
    Suppressed(Route),
    CoolingDown { remaining: Duration },
    NoSample,
    NotSynced,
    BelowThreshold(u32),
}

/// Pure gate + cooldown bookkeeping, separate from the side effects of firing.
#[derive(Debug, Clone)]
pub struct BiometricGate {
    threshold: u32,
    cooldown: Duration,
    last_fired: Option<Instant>,
}

impl BiometricGate {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            last_fired: None,
        }
    }

    pub fn from_config(config: &HavenConfig) -> Self {
        Self::new(config.heart_rate_threshold, config.biometric_cooldown())
    }

    pub fn last_fired(&self) -> Option<Instant> {
        self.last_fired
    }

    pub fn evaluate(
        &self,
        enabled: bool,
        route: Route,
        sample: Option<&BiometricSample>,
        now: Instant,
    ) -> GateDecision {
        if !enabled {
            return GateDecision::FeatureDisabled;
        }
        if route.is_regulation_tool() {
            return GateDecision::Suppressed(route);
        }
        if let Some(last) = self.last_fired {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.cooldown {
                return GateDecision::CoolingDown {
                    remaining: self.cooldown - elapsed,
                };
            }
        }
        let Some(sample) = sample else {
            return GateDecision::NoSample;
        };
        if !sample.is_synced {
            return GateDecision::NotSynced;
        }
        if sample.heart_rate <= self.threshold {
            return GateDecision::BelowThreshold(sample.heart_rate);
        }
        GateDecision::Fire {
            heart_rate: sample.heart_rate,
        }
    }

    pub fn record_fire(&mut self, now: Instant) {
        self.last_fired = Some(now);
    }
}

pub struct BiometricAdapter {
    app: Arc<AppState>,
    presenter: Arc<NudgePresenter>,
    generator: Arc<dyn ProactiveNudgeGenerator>,
    notifier: Arc<dyn SystemNotifier>,
    haptics: Arc<dyn HapticPulse>,
    gate: Mutex<BiometricGate>,
}

impl BiometricAdapter {
    pub fn new(
        app: Arc<AppState>,
        presenter: Arc<NudgePresenter>,
        generator: Arc<dyn ProactiveNudgeGenerator>,
        notifier: Arc<dyn SystemNotifier>,
        haptics: Arc<dyn HapticPulse>,
    ) -> Self {
        let gate = BiometricGate::from_config(app.config());
        Self {
            app,
            presenter,
            generator,
            notifier,
            haptics,
            gate: Mutex::new(gate),
        }
    }

    pub fn is_enabled(app: &AppState) -> bool {
        app.settings().biometric_alerts_enabled
    }

    pub fn last_fired(&self) -> Option<Instant> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner).last_fired()
    }

    /// One poll. The fire timestamp is recorded before any await so overlapping ticks
    /// cannot both pass the cooldown.
    pub async fn tick(&self) -> GateDecision {
        let now = Instant::now();
        let sample = self.app.latest_biometric();
        let decision = {
            let mut gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
            let decision = gate.evaluate(
                Self::is_enabled(&self.app),
                self.app.current_route(),
                sample.as_ref(),
                now,
            );
            if matches!(decision, GateDecision::Fire { .. }) {
                gate.record_fire(now);
            }
            decision
        };
        match decision {
            GateDecision::Fire { heart_rate } => self.fire(heart_rate).await,
            other => debug!(target: "haven::biometric", decision = ?other, "no fire"),
        }
        decision
    }

    async fn fire(&self, heart_rate: u32) {
        info!(target: "haven::biometric", heart_rate, "elevated heart rate; firing");
        if !self.app.settings().quiet_mode {
            self.haptics.pulse(HapticIntensity::Light);
        }
        let notified = notify_if_granted(
            self.notifier.as_ref(),
            "Heart rate elevated",
            &format!("Your heart rate is {} bpm. Take a moment to check in.", heart_rate),
            &NotificationOptions {
                tag: Some(NOTIFICATION_TAG.to_string()),
                require_interaction: false,
            },
        );
        debug!(target: "haven::biometric", notified, "system notification");

        let config = self.app.config();
        let context = format!("Heart rate elevated to {} bpm.", heart_rate);
        let message = nudge_message_or_fallback(
            self.generator.as_ref(),
            &context,
            config.generation_timeout(),
            &config.nudge_fallback_message,
        )
        .await;

        if !Self::is_enabled(&self.app) || self.app.current_route().is_regulation_tool() {
            debug!(target: "haven::biometric", "conditions changed during generation; nudge dropped");
            return;
        }
        self.presenter
            .open_nudge(message, format!("heart_rate:{}", heart_rate));
    }

    /// Poll every `biometric_poll_secs` until `cancel` fires. An in-flight tick is abandoned
    /// on cancellation.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.app.config().biometric_poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            target: "haven::biometric",
            poll_secs = self.app.config().biometric_poll_secs,
            "biometric poll started"
        );
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = self.tick() => {}
                    }
                }
            }
        }
        info!(target: "haven::biometric", "biometric poll stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(hr: u32, synced: bool) -> BiometricSample {
        BiometricSample {
            is_synced: synced,
            ..BiometricSample::synced(hr)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_order() {
        let mut gate = BiometricGate::new(105, Duration::from_secs(300));
        let now = Instant::now();
        let high = sample(130, true);

        assert_eq!(
            gate.evaluate(false, Route::Dashboard, Some(&high), now),
            GateDecision::FeatureDisabled
        );
        assert_eq!(
            gate.evaluate(true, Route::Grounding, Some(&high), now),
            GateDecision::Suppressed(Route::Grounding)
        );
        assert_eq!(gate.evaluate(true, Route::Dashboard, None, now), GateDecision::NoSample);
        assert_eq!(
            gate.evaluate(true, Route::Dashboard, Some(&sample(130, false)), now),
            GateDecision::NotSynced
        );
        assert_eq!(
            gate.evaluate(true, Route::Dashboard, Some(&sample(105, true)), now),
            GateDecision::BelowThreshold(105)
        );
        assert_eq!(
            gate.evaluate(true, Route::Dashboard, Some(&high), now),
            GateDecision::Fire { heart_rate: 130 }
        );

        gate.record_fire(now);
        let later = now + Duration::from_secs(299);
        assert_eq!(
            gate.evaluate(true, Route::Dashboard, Some(&high), later),
            GateDecision::CoolingDown {
                remaining: Duration::from_secs(1)
            }
        );
        let after = now + Duration::from_secs(300);
        assert_eq!(
            gate.evaluate(true, Route::Dashboard, Some(&high), after),
            GateDecision::Fire { heart_rate: 130 }
        );
    }
}
