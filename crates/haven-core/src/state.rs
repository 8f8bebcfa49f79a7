//! Injected application state container.
//!
//! Replaces an ambient global store: one `Arc<AppState>` is handed to every adapter.
//! Locks are `std::sync` and are never held across an `.await`. Every settings/session change
//! bumps a `watch` revision so the lifecycle supervisor can start or cancel loops.

use crate::config::{HavenConfig, Settings};
use crate::crisis::CrisisModal;
use crate::navigation::Navigator;
use crate::shared::{BiometricSample, Route, SessionFlags};
use std::sync::{PoisonError, RwLock};
use tokio::sync::watch;
use tracing::debug;

pub struct AppState {
    config: HavenConfig,
    navigator: Navigator,
    crisis: CrisisModal,
    settings: RwLock<Settings>,
    session: RwLock<SessionFlags>,
    biometric: RwLock<Option<BiometricSample>>,
    revision: watch::Sender<u64>,
}

impl AppState {
    pub fn new(config: HavenConfig, settings: Settings) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            navigator: Navigator::new(config.default_home_route),
            crisis: CrisisModal::new(),
            config,
            settings: RwLock::new(settings),
            session: RwLock::new(SessionFlags::default()),
            biometric: RwLock::new(None),
            revision,
        }
    }

    pub fn config(&self) -> &HavenConfig {
        &self.config
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// The always-available crisis resource modal.
    pub fn crisis(&self) -> &CrisisModal {
        &self.crisis
    }

    // -- navigation surface ---------------------------------------------------

    pub fn navigate(&self, route: Route) {
        self.navigator.navigate(route);
    }

    pub fn return_to_origin(&self) -> Route {
        self.navigator.return_to_origin()
    }

    pub fn current_route(&self) -> Route {
        self.navigator.current()
    }

    // -- settings -------------------------------------------------------------

    pub fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `f` to the settings and notify lifecycle watchers.
    pub fn update_settings(&self, f: impl FnOnce(&mut Settings)) {
        {
            let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut settings);
            debug!(target: "haven::state", settings = ?settings, "settings updated");
        }
        self.bump();
    }

    // -- session --------------------------------------------------------------

    pub fn session(&self) -> SessionFlags {
        *self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_session(&self, flags: SessionFlags) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = flags;
        debug!(target: "haven::state", session = ?flags, "session updated");
        self.bump();
    }

    // -- biometrics -----------------------------------------------------------

    /// Called by the external wearable sync collaborator.
    pub fn record_biometric(&self, sample: BiometricSample) {
        *self.biometric.write().unwrap_or_else(PoisonError::into_inner) = Some(sample);
    }

    pub fn latest_biometric(&self) -> Option<BiometricSample> {
        self.biometric
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // -- lifecycle notifications ----------------------------------------------

    /// Receiver that changes whenever settings or session flags change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(HavenConfig::default(), Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_updates_bump_revision() {
        let app = AppState::default();
        let rx = app.subscribe();
        assert_eq!(app.revision(), 0);

        app.update_settings(|s| s.hands_free_enabled = true);
        assert!(app.settings().hands_free_enabled);
        assert_eq!(*rx.borrow(), 1);

        app.set_session(SessionFlags {
            authenticated: true,
            onboarding_complete: true,
        });
        assert_eq!(app.revision(), 2);
        assert!(app.session().authenticated);
    }

    #[test]
    fn test_biometric_overwrite() {
        let app = AppState::default();
        assert!(app.latest_biometric().is_none());
        app.record_biometric(BiometricSample::synced(80));
        app.record_biometric(BiometricSample::synced(110));
        assert_eq!(app.latest_biometric().unwrap().heart_rate, 110);
    }

    #[test]
    fn test_home_route_from_config() {
        let config = HavenConfig {
            default_home_route: Route::Journal,
            ..Default::default()
        };
        let app = AppState::new(config, Settings::default());
        assert_eq!(app.current_route(), Route::Journal);
        app.navigate(Route::Breathing);
        assert_eq!(app.return_to_origin(), Route::Journal);
    }
}
