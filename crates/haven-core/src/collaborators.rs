//! Platform and AI capabilities the core consumes but does not implement.
//!
//! The host app provides real implementations (notification center, dialer, haptic engine,
//! LLM backend). Reference implementations for the text capabilities live in
//! `crisis` and `generator`.

use crate::error::HavenResult;
use crate::shared::HaltScoreSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Decides whether free text contains crisis language.
#[async_trait]
pub trait CrisisTextClassifier: Send + Sync {
    async fn is_crisis(&self, text: &str) -> HavenResult<bool>;
}

/// Produces a short supportive message for the nudge presenter.
#[async_trait]
pub trait ProactiveNudgeGenerator: Send + Sync {
    async fn generate(&self, context_summary: &str) -> HavenResult<String>;
}

/// Produces the closing reflection text of a HALT session.
#[async_trait]
pub trait ReflectionSummarizer: Send + Sync {
    async fn summarize(&self, scores: &HaltScoreSet) -> HavenResult<String>;
}

/// Gamification/badge recomputation. Fire-and-forget from the mood path.
#[async_trait]
pub trait BadgeEngine: Send + Sync {
    async fn recompute(&self) -> HavenResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
    Granted,
    Denied,
    /// Never asked. The core never asks from an automated path.
    Default,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOptions {
    /// Replaces an earlier notification with the same tag.
    pub tag: Option<String>,
    pub require_interaction: bool,
}

pub trait SystemNotifier: Send + Sync {
    fn permission(&self) -> NotificationPermission;
    fn notify(&self, title: &str, body: &str, options: &NotificationOptions);
}

/// Emit a notification only when permission was already granted. Returns whether it was sent.
pub fn notify_if_granted(
    notifier: &dyn SystemNotifier,
    title: &str,
    body: &str,
    options: &NotificationOptions,
) -> bool {
    if notifier.permission() != NotificationPermission::Granted {
        return false;
    }
    notifier.notify(title, body, options);
    true
}

/// Hands a number to the platform dialer.
pub trait TelephonyIntent: Send + Sync {
    fn dial(&self, phone_number: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HapticIntensity {
    Light,
    Urgent,
}

pub trait HapticPulse: Send + Sync {
    fn pulse(&self, intensity: HapticIntensity);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeNotifier {
        permission: NotificationPermission,
        sent: Mutex<Vec<String>>,
    }

    impl SystemNotifier for FakeNotifier {
        fn permission(&self) -> NotificationPermission {
            self.permission
        }

        fn notify(&self, title: &str, _body: &str, _options: &NotificationOptions) {
            self.sent.lock().unwrap().push(title.to_string());
        }
    }

    #[test]
    fn test_notify_only_when_granted() {
        for (permission, expected) in [
            (NotificationPermission::Granted, true),
            (NotificationPermission::Denied, false),
            (NotificationPermission::Default, false),
        ] {
            let notifier = FakeNotifier {
                permission,
                sent: Mutex::new(Vec::new()),
            };
            let sent = notify_if_granted(&notifier, "t", "b", &NotificationOptions::default());
            assert_eq!(sent, expected);
            assert_eq!(notifier.sent.lock().unwrap().len(), usize::from(expected));
        }
    }
}
