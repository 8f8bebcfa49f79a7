//! haven-core: safety orchestrator core (shared types, navigation, nudge presenter, HALT diagnostic).
//!
//! Adapters (voice, mood, biometric) live in sibling crates and drive this one through
//! `AppState`, `NudgePresenter` and the collaborator traits.

mod collaborators;
mod config;
mod crisis;
mod error;
mod generator;
pub mod halt;
mod navigation;
mod nudge;
mod shared;
mod state;
mod store;

// Shared value types
pub use shared::{
    BiometricSample, HaltAxis, HaltScoreSet, InterventionDecision, MoodEntry, MoodLevel,
    NudgeState, Route, RouteKind, SessionFlags,
};

// Configuration (file + env) and persisted user settings
pub use config::{HavenConfig, Settings, DEFAULT_CRISIS_PHRASES, DEFAULT_NUDGE_FALLBACK};

pub use error::{HavenError, HavenResult};

// Injected platform and model collaborators
pub use collaborators::{
    notify_if_granted, BadgeEngine, CrisisTextClassifier, HapticIntensity, HapticPulse,
    NotificationOptions, NotificationPermission, ProactiveNudgeGenerator, ReflectionSummarizer,
    SystemNotifier, TelephonyIntent,
};

pub use crisis::{CrisisModal, CrisisModalState, CrisisTrigger, PhraseCrisisClassifier};
pub use generator::{
    classify_or_safe, nudge_message_or_fallback, CannedNudgeGenerator, OpenRouterNudgeGenerator,
};
pub use halt::{
    archive_entry, protocol_for, resolve_intervention, submit_halt_scores, HaltExit, HaltPhase,
    HaltProtocol, HaltSession,
};
pub use navigation::{NavigationState, Navigator};
pub use nudge::{NudgeAction, NudgeOutcome, NudgePresenter};
pub use state::AppState;
pub use store::{InMemoryMoodStore, MoodStore, SledMoodStore};
