//! Mood/Text Adapter.
//!
//! `submit_mood`: persist → crisis check (level or note text) → struggling nudge → badge
//! recompute. A crisis always wins and never also opens a nudge for the same entry.

use chrono::Utc;
use haven_core::{
    classify_or_safe, nudge_message_or_fallback, AppState, BadgeEngine, CrisisTextClassifier,
    CrisisTrigger, MoodEntry, MoodLevel, MoodStore, NudgePresenter, ProactiveNudgeGenerator,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Prior entries folded into the nudge context.
pub const CONTEXT_HISTORY: usize = 3;

pub const MOOD_NUDGE_CONTEXT: &str = "mood:struggling";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodOutcome {
    /// Crisis modal opened; the nudge path was skipped.
    CrisisOpened(CrisisTrigger),
    NudgeOpened,
    /// Another nudge already held the slot.
    NudgeDropped,
    /// Struggling, but nudges are off (or were turned off while generating).
    NudgeSuppressed,
    /// Nothing beyond persistence.
    Recorded,
}

pub struct MoodAdapter {
    app: Arc<AppState>,
    store: Arc<dyn MoodStore>,
    classifier: Arc<dyn CrisisTextClassifier>,
    generator: Arc<dyn ProactiveNudgeGenerator>,
    presenter: Arc<NudgePresenter>,
    badges: Option<Arc<dyn BadgeEngine>>,
}

impl MoodAdapter {
    pub fn new(
        app: Arc<AppState>,
        store: Arc<dyn MoodStore>,
        classifier: Arc<dyn CrisisTextClassifier>,
        generator: Arc<dyn ProactiveNudgeGenerator>,
        presenter: Arc<NudgePresenter>,
    ) -> Self {
        Self {
            app,
            store,
            classifier,
            generator,
            presenter,
            badges: None,
        }
    }

    pub fn with_badges(mut self, badges: Arc<dyn BadgeEngine>) -> Self {
        self.badges = Some(badges);
        self
    }

    pub async fn submit_mood(&self, entry: MoodEntry) -> MoodOutcome {
        let prior = self.store.recent(CONTEXT_HISTORY).unwrap_or_else(|e| {
            warn!(target: "haven::mood", error = %e, "failed to read mood history");
            Vec::new()
        });
        if let Err(e) = self.store.append(&entry) {
            warn!(target: "haven::mood", error = %e, "failed to persist mood entry");
        }
        info!(target: "haven::mood", mood = %entry.mood_level, id = %entry.id, "mood submitted");
        self.spawn_badge_recompute();

        if let Some(trigger) = self.crisis_trigger(&entry).await {
            self.app.crisis().open(trigger);
            return MoodOutcome::CrisisOpened(trigger);
        }

        if entry.mood_level != MoodLevel::Struggling {
            return MoodOutcome::Recorded;
        }
        if !self.app.settings().vulnerability_nudges_enabled {
            debug!(target: "haven::mood", "vulnerability nudges disabled");
            return MoodOutcome::NudgeSuppressed;
        }

        let config = self.app.config();
        let summary = context_summary(&entry, &prior);
        let message = nudge_message_or_fallback(
            self.generator.as_ref(),
            &summary,
            config.generation_timeout(),
            &config.nudge_fallback_message,
        )
        .await;

        // settings may have changed while the generator was running
        if !self.app.settings().vulnerability_nudges_enabled {
            debug!(target: "haven::mood", "nudges disabled during generation; result dropped");
            return MoodOutcome::NudgeSuppressed;
        }
        if self.presenter.open_nudge(message, MOOD_NUDGE_CONTEXT) {
            MoodOutcome::NudgeOpened
        } else {
            MoodOutcome::NudgeDropped
        }
    }

    async fn crisis_trigger(&self, entry: &MoodEntry) -> Option<CrisisTrigger> {
        if entry.mood_level == MoodLevel::Crisis {
            return Some(CrisisTrigger::MoodLevel);
        }
        if entry.note.trim().is_empty() {
            return None;
        }
        let deadline = self.app.config().generation_timeout();
        classify_or_safe(self.classifier.as_ref(), &entry.note, deadline)
            .await
            .then_some(CrisisTrigger::CrisisLanguage)
    }

    fn spawn_badge_recompute(&self) {
        let Some(badges) = self.badges.clone() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = badges.recompute().await {
                        warn!(target: "haven::mood", error = %e, "badge recompute failed");
                    }
                });
            }
            Err(_) => debug!(target: "haven::mood", "no async runtime; badge recompute skipped"),
        }
    }
}

/// Plain-text context for the generator: the new entry plus up to three earlier ones.
pub fn context_summary(entry: &MoodEntry, prior: &[MoodEntry]) -> String {
    let mut summary = format!("Current mood: {}.", entry.mood_level);
    let note = entry.note.trim();
    if !note.is_empty() {
        summary.push_str(&format!(" Note: \"{}\".", note));
    }
    let start = prior.len().saturating_sub(CONTEXT_HISTORY);
    let recent = &prior[start..];
    if !recent.is_empty() {
        let now = Utc::now();
        let history: Vec<String> = recent
            .iter()
            .rev()
            .map(|e| {
                let hours = (now - e.timestamp).num_hours().max(0);
                format!("{} ({}h ago)", e.mood_level, hours)
            })
            .collect();
        summary.push_str(&format!(" Recent check-ins: {}.", history.join(", ")));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_context_summary_uses_last_three_newest_first() {
        let now = Utc::now();
        let prior: Vec<MoodEntry> = [
            (MoodLevel::Great, 10),
            (MoodLevel::Good, 5),
            (MoodLevel::Neutral, 3),
            (MoodLevel::Struggling, 1),
        ]
        .into_iter()
        .map(|(level, h)| MoodEntry::new(level, "").with_timestamp(now - Duration::hours(h)))
        .collect();
        let entry = MoodEntry::new(MoodLevel::Struggling, "  rough shift at work ");
        let summary = context_summary(&entry, &prior);
        assert!(summary.starts_with("Current mood: struggling."));
        assert!(summary.contains("Note: \"rough shift at work\"."));
        assert!(summary.contains("struggling (1h ago), neutral (3h ago), good (5h ago)"));
        assert!(!summary.contains("great"));
    }

    #[test]
    fn test_context_summary_without_history() {
        let entry = MoodEntry::new(MoodLevel::Struggling, "");
        assert_eq!(context_summary(&entry, &[]), "Current mood: struggling.");
    }
}
