//! Intervention Priority Engine (Nudge Presenter).
//!
//! Single-slot state machine: `Idle → Open(message, context) → {CallSponsor | AcceptTool | Decline} → Idle`.
//! A trigger that arrives while a nudge is showing is dropped, not queued or merged; whichever
//! async resolution lands first owns the slot.

use crate::collaborators::TelephonyIntent;
use crate::shared::{NudgeState, Route};
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// User response to an open nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeAction {
    CallSponsor,
    AcceptTool,
    Decline,
}

/// What resolving a nudge actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NudgeOutcome {
    /// Dialer invoked with the sanitized number.
    SponsorDialed(String),
    /// No usable sponsor number; the nudge closed anyway.
    NoSponsorConfigured,
    ToolOpened(Route),
    Declined,
    /// Nothing was open; no effect.
    NotOpen,
}

pub struct NudgePresenter {
    state: Mutex<NudgeState>,
    app: Arc<AppState>,
    telephony: Arc<dyn TelephonyIntent>,
}

impl NudgePresenter {
    pub fn new(app: Arc<AppState>, telephony: Arc<dyn TelephonyIntent>) -> Self {
        Self {
            state: Mutex::new(NudgeState::default()),
            app,
            telephony,
        }
    }

    /// Show a nudge. Returns `false` (and changes nothing) when one is already open.
    pub fn open_nudge(&self, message: impl Into<String>, context: impl Into<String>) -> bool {
        let mut state = self.lock();
        if state.is_open {
            debug!(
                target: "haven::nudge",
                showing = %state.context,
                "nudge already open; trigger dropped"
            );
            return false;
        }
        *state = NudgeState {
            is_open: true,
            message: message.into(),
            context: context.into(),
        };
        info!(target: "haven::nudge", context = %state.context, "nudge opened");
        true
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_open
    }

    pub fn snapshot(&self) -> NudgeState {
        self.lock().clone()
    }

    pub fn resolve(&self, action: NudgeAction) -> NudgeOutcome {
        match action {
            NudgeAction::CallSponsor => self.call_sponsor(),
            NudgeAction::AcceptTool => self.accept_tool(),
            NudgeAction::Decline => self.decline(),
        }
    }

    /// Dial the sponsor when a number is configured; close either way.
    pub fn call_sponsor(&self) -> NudgeOutcome {
        if !self.close() {
            return NudgeOutcome::NotOpen;
        }
        match self.app.settings().sanitized_sponsor_phone() {
            Some(number) => {
                info!(target: "haven::nudge", "dialing sponsor");
                self.telephony.dial(&number);
                NudgeOutcome::SponsorDialed(number)
            }
            None => {
                info!(target: "haven::nudge", "no sponsor number configured");
                NudgeOutcome::NoSponsorConfigured
            }
        }
    }

    pub fn accept_tool(&self) -> NudgeOutcome {
        if !self.close() {
            return NudgeOutcome::NotOpen;
        }
        let route = Route::PRIMARY_SAFETY_TOOLKIT;
        self.app.navigate(route);
        NudgeOutcome::ToolOpened(route)
    }

    pub fn decline(&self) -> NudgeOutcome {
        if !self.close() {
            return NudgeOutcome::NotOpen;
        }
        info!(target: "haven::nudge", "nudge declined");
        NudgeOutcome::Declined
    }

    /// Back to Idle. Returns whether a nudge was open.
    fn close(&self) -> bool {
        let mut state = self.lock();
        if !state.is_open {
            debug!(target: "haven::nudge", "action ignored; no nudge open");
            return false;
        }
        *state = NudgeState::default();
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NudgeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
