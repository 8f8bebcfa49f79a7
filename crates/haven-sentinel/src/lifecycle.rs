//! Lifecycle supervisor for the long-lived loops.
//!
//! Watches the `AppState` revision and reconciles two slots, the voice recognition loop and
//! the biometric poll, against their enabling conditions. Every loop runs under a child token
//! of the supervisor's root token, so `shutdown` (or dropping the supervisor) tears all of
//! them down.

use crate::biometric::BiometricAdapter;
use haven_core::AppState;
use haven_voice::{VoiceLoopExit, WakeWordAdapter};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleStatus {
    pub voice_running: bool,
    pub biometric_running: bool,
    /// Recognition failed; stays set until an enabling condition goes false.
    pub voice_failed: bool,
}

struct Slot<T> {
    token: CancellationToken,
    handle: JoinHandle<T>,
}

impl<T> Slot<T> {
    fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

pub struct LifecycleSupervisor {
    root: CancellationToken,
    status: Arc<Mutex<LifecycleStatus>>,
    task: Option<JoinHandle<()>>,
}

impl LifecycleSupervisor {
    /// Spawn the supervisor. Pass `None` for an adapter the host does not provide.
    pub fn start(
        app: Arc<AppState>,
        voice: Option<Arc<WakeWordAdapter>>,
        biometric: Option<Arc<BiometricAdapter>>,
    ) -> Self {
        let root = CancellationToken::new();
        let status = Arc::new(Mutex::new(LifecycleStatus::default()));
        let task = tokio::spawn(supervise(
            app,
            voice,
            biometric,
            root.clone(),
            Arc::clone(&status),
        ));
        info!(target: "haven::lifecycle", "lifecycle supervisor started");
        Self {
            root,
            status,
            task: Some(task),
        }
    }

    pub fn status(&self) -> LifecycleStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel every loop and wait for the supervisor to finish.
    pub async fn shutdown(mut self) {
        self.root.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(target: "haven::lifecycle", error = %e, "supervisor task failed");
            }
        }
    }
}

impl Drop for LifecycleSupervisor {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

async fn supervise(
    app: Arc<AppState>,
    voice: Option<Arc<WakeWordAdapter>>,
    biometric: Option<Arc<BiometricAdapter>>,
    root: CancellationToken,
    status: Arc<Mutex<LifecycleStatus>>,
) {
    let mut revision = app.subscribe();
    let mut voice_slot: Option<Slot<VoiceLoopExit>> = None;
    let mut biometric_slot: Option<Slot<()>> = None;
    let mut voice_failed = false;

    loop {
        if let Some(adapter) = &voice {
            reconcile_voice(&app, adapter, &root, &mut voice_slot, &mut voice_failed).await;
        }
        if let Some(adapter) = &biometric {
            reconcile_biometric(&app, adapter, &root, &mut biometric_slot);
        }
        *status.lock().unwrap_or_else(PoisonError::into_inner) = LifecycleStatus {
            voice_running: voice_slot.as_ref().map(Slot::is_running).unwrap_or(false),
            biometric_running: biometric_slot.as_ref().map(Slot::is_running).unwrap_or(false),
            voice_failed,
        };

        tokio::select! {
            _ = root.cancelled() => break,
            changed = revision.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    stop_slot(voice_slot.take(), "voice").await;
    stop_slot(biometric_slot.take(), "biometric").await;
    *status.lock().unwrap_or_else(PoisonError::into_inner) = LifecycleStatus {
        voice_failed,
        ..LifecycleStatus::default()
    };
    info!(target: "haven::lifecycle", "lifecycle supervisor stopped");
}

async fn reconcile_voice(
    app: &Arc<AppState>,
    adapter: &Arc<WakeWordAdapter>,
    root: &CancellationToken,
    slot: &mut Option<Slot<VoiceLoopExit>>,
    voice_failed: &mut bool,
) {
    if slot.as_ref().is_some_and(|s| !s.is_running()) {
        if let Some(mut finished) = slot.take() {
            match (&mut finished.handle).await {
                Ok(VoiceLoopExit::Failed(reason)) => {
                    warn!(target: "haven::lifecycle", reason = %reason, "voice loop failed; voice off until re-enabled");
                    *voice_failed = true;
                }
                Ok(exit) => debug!(target: "haven::lifecycle", exit = ?exit, "voice loop exited"),
                Err(e) => {
                    warn!(target: "haven::lifecycle", error = %e, "voice loop panicked");
                    *voice_failed = true;
                }
            }
        }
    }

    if !WakeWordAdapter::is_enabled(app) {
        *voice_failed = false;
        if slot.is_some() {
            stop_slot(slot.take(), "voice").await;
        }
        return;
    }
    if slot.is_none() && !*voice_failed {
        let token = root.child_token();
        let adapter = Arc::clone(adapter);
        let loop_token = token.clone();
        let handle = tokio::spawn(async move { adapter.run(loop_token).await });
        info!(target: "haven::lifecycle", "voice loop started");
        *slot = Some(Slot { token, handle });
    }
}

fn reconcile_biometric(
    app: &Arc<AppState>,
    adapter: &Arc<BiometricAdapter>,
    root: &CancellationToken,
    slot: &mut Option<Slot<()>>,
) {
    let enabled = BiometricAdapter::is_enabled(app);
    let running = slot.as_ref().is_some_and(Slot::is_running);
    if enabled && !running {
        let token = root.child_token();
        let adapter = Arc::clone(adapter);
        let loop_token = token.clone();
        let handle = tokio::spawn(async move { adapter.run(loop_token).await });
        info!(target: "haven::lifecycle", "biometric poll scheduled");
        *slot = Some(Slot { token, handle });
    } else if !enabled && slot.is_some() {
        // dropping the slot cancels its token; the poll exits at its next select
        *slot = None;
        info!(target: "haven::lifecycle", "biometric poll cancelled");
    }
}

async fn stop_slot<T>(slot: Option<Slot<T>>, name: &'static str) {
    let Some(mut slot) = slot else {
        return;
    };
    slot.token.cancel();
    if let Err(e) = (&mut slot.handle).await {
        warn!(target: "haven::lifecycle", loop_name = name, error = %e, "loop task failed");
    }
    debug!(target: "haven::lifecycle", loop_name = name, "loop stopped");
}
