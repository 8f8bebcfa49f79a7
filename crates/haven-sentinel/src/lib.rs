//! haven-sentinel: signal intake adapters (mood/text, biometric) and the lifecycle supervisor
//! that keeps the long-lived loops in step with settings and session state.

pub mod biometric;
pub mod lifecycle;
pub mod mood;

pub use biometric::{BiometricAdapter, BiometricGate, GateDecision};
pub use lifecycle::{LifecycleStatus, LifecycleSupervisor};
pub use mood::{context_summary, MoodAdapter, MoodOutcome, MOOD_NUDGE_CONTEXT};
