//! Navigation Stack Controller.
//!
//! Tracks the current screen plus a depth-1 "origin" memory: the hub that launched the
//! current tool chain. Tool→Tool hops never touch the origin, so a chained exercise still
//! returns to the hub the user started from.
//!
//! A tool launched from inside a composite flow (e.g. the crisis plan) registers that flow as
//! its embedded parent; `finish_tool` honours it before falling back to the origin.

use crate::shared::Route;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    pub current_route: Route,
    pub origin_route: Option<Route>,
    /// Parent composite flow that completed tools return to instead of the origin.
    #[serde(default)]
    pub embedded_parent: Option<Route>,
}

impl NavigationState {
    pub fn at(route: Route) -> Self {
        Self {
            current_route: route,
            origin_route: None,
            embedded_parent: None,
        }
    }
}

/// Owns `NavigationState`. Callers handle scroll/focus; this only updates state.
pub struct Navigator {
    state: RwLock<NavigationState>,
    home: Route,
}

impl Navigator {
    /// Start on `home`, which is also the fallback for `return_to_origin`.
    pub fn new(home: Route) -> Self {
        Self {
            state: RwLock::new(NavigationState::at(home)),
            home,
        }
    }

    pub fn home(&self) -> Route {
        self.home
    }

    pub fn current(&self) -> Route {
        self.read().current_route
    }

    pub fn origin(&self) -> Option<Route> {
        self.read().origin_route
    }

    pub fn embedded_parent(&self) -> Option<Route> {
        self.read().embedded_parent
    }

    pub fn snapshot(&self) -> NavigationState {
        self.read().clone()
    }

    /// Replace the whole state, e.g. after the host reloads a persisted snapshot.
    pub fn restore(&self, state: NavigationState) {
        *self.write() = state;
    }

    /// Hub→Tool records the hub as origin when none is held yet; every other transition only
    /// moves `current_route`. The origin is cleared by `return_to_origin`.
    pub fn navigate(&self, route: Route) {
        let mut state = self.write();
        let from = state.current_route;
        if from.is_hub() && route.is_tool() && state.origin_route.is_none() {
            state.origin_route = Some(from);
        }
        state.current_route = route;
        info!(
            target: "haven::nav",
            from = %from,
            to = %route,
            origin = ?state.origin_route,
            "navigate"
        );
    }

    /// Go back to the recorded origin (or home) and forget it. Returns the landing route.
    pub fn return_to_origin(&self) -> Route {
        let mut state = self.write();
        let target = state.origin_route.take().unwrap_or(self.home);
        state.current_route = target;
        info!(target: "haven::nav", to = %target, "return to origin");
        target
    }

    /// Mark the current composite flow as the return point for tools it launches.
    pub fn enter_embedded_flow(&self, parent: Route) {
        self.write().embedded_parent = Some(parent);
        debug!(target: "haven::nav", parent = %parent, "embedded flow entered");
    }

    pub fn exit_embedded_flow(&self) {
        self.write().embedded_parent = None;
        debug!(target: "haven::nav", "embedded flow cleared");
    }

    /// Completion path for any tool: the embedded parent wins over the generic origin.
    pub fn finish_tool(&self) -> Route {
        match self.embedded_parent() {
            Some(parent) => {
                self.navigate(parent);
                parent
            }
            None => self.return_to_origin(),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, NavigationState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, NavigationState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::DEFAULT_HOME)
    }
}
