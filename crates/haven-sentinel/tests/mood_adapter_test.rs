//! Integration test: Mood/Text Adapter.
//!
//! ## Scenario
//! 1. A `crisis` entry opens the crisis modal exactly once and never opens a nudge.
//! 2. Any configured crisis phrase in a note opens the modal, whatever the level.
//! 3. A `struggling` entry opens a nudge (generated, or the canned fallback on failure).
//! 4. Nudges off ⇒ nothing opens; a nudge already showing ⇒ the new one is dropped.
//! 5. Every entry is persisted and badge recompute failures are swallowed.

use async_trait::async_trait;
use haven_core::{
    AppState, BadgeEngine, CannedNudgeGenerator, CrisisTrigger, HavenConfig, HavenError,
    HavenResult, InMemoryMoodStore, MoodEntry, MoodLevel, MoodStore, NudgePresenter,
    PhraseCrisisClassifier, ProactiveNudgeGenerator, Settings, TelephonyIntent,
    DEFAULT_CRISIS_PHRASES, DEFAULT_NUDGE_FALLBACK,
};
use haven_sentinel::{MoodAdapter, MoodOutcome, MOOD_NUDGE_CONTEXT};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct NoDialer;

impl TelephonyIntent for NoDialer {
    fn dial(&self, _phone_number: &str) {}
}

/// Records context summaries; fails when `fail` is set.
#[derive(Default)]
struct RecordingGenerator {
    contexts: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl ProactiveNudgeGenerator for RecordingGenerator {
    async fn generate(&self, context_summary: &str) -> HavenResult<String> {
        self.contexts.lock().unwrap().push(context_summary.to_string());
        if self.fail {
            return Err(HavenError::Classification("model unavailable".to_string()));
        }
        Ok("You reached out. That matters.".to_string())
    }
}

#[derive(Default)]
struct FlakyBadges {
    calls: AtomicUsize,
}

#[async_trait]
impl BadgeEngine for FlakyBadges {
    async fn recompute(&self) -> HavenResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(HavenError::Store("badge table locked".to_string()))
    }
}

struct Harness {
    app: Arc<AppState>,
    store: Arc<InMemoryMoodStore>,
    presenter: Arc<NudgePresenter>,
    generator: Arc<RecordingGenerator>,
    badges: Arc<FlakyBadges>,
    adapter: MoodAdapter,
}

fn harness(generator: RecordingGenerator) -> Harness {
    let app = Arc::new(AppState::new(HavenConfig::default(), Settings::default()));
    let store = Arc::new(InMemoryMoodStore::new());
    let presenter = Arc::new(NudgePresenter::new(Arc::clone(&app), Arc::new(NoDialer)));
    let generator = Arc::new(generator);
    let badges = Arc::new(FlakyBadges::default());
    let classifier = Arc::new(PhraseCrisisClassifier::new(DEFAULT_CRISIS_PHRASES).unwrap());
    let adapter = MoodAdapter::new(
        Arc::clone(&app),
        store.clone(),
        classifier,
        generator.clone(),
        Arc::clone(&presenter),
    )
    .with_badges(badges.clone());
    Harness {
        app,
        store,
        presenter,
        generator,
        badges,
        adapter,
    }
}

#[tokio::test]
async fn crisis_level_opens_modal_once_without_nudge() {
    let h = harness(RecordingGenerator::default());
    let outcome = h
        .adapter
        .submit_mood(MoodEntry::new(MoodLevel::Crisis, "can't do this"))
        .await;
    assert_eq!(outcome, MoodOutcome::CrisisOpened(CrisisTrigger::MoodLevel));
    let modal = h.app.crisis().snapshot();
    assert!(modal.is_open);
    assert_eq!(modal.open_count, 1);
    assert!(!h.presenter.is_open());
    assert!(h.generator.contexts.lock().unwrap().is_empty());
    assert_eq!(h.store.read_all().unwrap().len(), 1);
}

#[tokio::test]
async fn crisis_phrases_open_modal_at_any_level() {
    for (i, phrase) in DEFAULT_CRISIS_PHRASES.iter().enumerate() {
        let h = harness(RecordingGenerator::default());
        let level = if i % 2 == 0 { MoodLevel::Good } else { MoodLevel::Struggling };
        let note = format!("Journal: lately I think {} is on my mind.", phrase);
        let outcome = h.adapter.submit_mood(MoodEntry::new(level, note)).await;
        assert_eq!(
            outcome,
            MoodOutcome::CrisisOpened(CrisisTrigger::CrisisLanguage),
            "phrase: {}",
            phrase
        );
        assert!(!h.presenter.is_open());
    }
}

#[tokio::test]
async fn struggling_opens_generated_nudge_with_history() {
    let h = harness(RecordingGenerator::default());
    h.adapter
        .submit_mood(MoodEntry::new(MoodLevel::Good, "slept well"))
        .await;
    let outcome = h
        .adapter
        .submit_mood(MoodEntry::new(MoodLevel::Struggling, "fight with my brother"))
        .await;
    assert_eq!(outcome, MoodOutcome::NudgeOpened);
    let nudge = h.presenter.snapshot();
    assert_eq!(nudge.message, "You reached out. That matters.");
    assert_eq!(nudge.context, MOOD_NUDGE_CONTEXT);

    let contexts = h.generator.contexts.lock().unwrap();
    assert_eq!(contexts.len(), 1);
    assert!(contexts[0].contains("struggling"));
    assert!(contexts[0].contains("good (0h ago)"));
}

#[tokio::test]
async fn generator_failure_falls_back_to_canned_message() {
    let h = harness(RecordingGenerator {
        fail: true,
        ..Default::default()
    });
    let outcome = h
        .adapter
        .submit_mood(MoodEntry::new(MoodLevel::Struggling, ""))
        .await;
    assert_eq!(outcome, MoodOutcome::NudgeOpened);
    assert_eq!(h.presenter.snapshot().message, DEFAULT_NUDGE_FALLBACK);
}

#[tokio::test]
async fn nudges_disabled_or_slot_taken() {
    let h = harness(RecordingGenerator::default());
    h.app
        .update_settings(|s| s.vulnerability_nudges_enabled = false);
    let outcome = h
        .adapter
        .submit_mood(MoodEntry::new(MoodLevel::Struggling, "tired"))
        .await;
    assert_eq!(outcome, MoodOutcome::NudgeSuppressed);
    assert!(!h.presenter.is_open());

    h.app.update_settings(|s| s.vulnerability_nudges_enabled = true);
    h.presenter.open_nudge("earlier", "heart_rate:120");
    let outcome = h
        .adapter
        .submit_mood(MoodEntry::new(MoodLevel::Struggling, "tired"))
        .await;
    assert_eq!(outcome, MoodOutcome::NudgeDropped);
    assert_eq!(h.presenter.snapshot().context, "heart_rate:120");
}

#[tokio::test]
async fn plain_entries_only_persist_and_badge_errors_are_swallowed() {
    let h = harness(RecordingGenerator::default());
    for level in [MoodLevel::Great, MoodLevel::Good, MoodLevel::Neutral] {
        assert_eq!(
            h.adapter.submit_mood(MoodEntry::new(level, "ok day")).await,
            MoodOutcome::Recorded
        );
    }
    assert_eq!(h.store.read_all().unwrap().len(), 3);
    assert!(!h.presenter.is_open());
    assert!(!h.app.crisis().is_open());

    tokio::time::timeout(Duration::from_secs(5), async {
        while h.badges.calls.load(Ordering::SeqCst) < 3 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn canned_generator_keys_on_struggling() {
    let app = Arc::new(AppState::default());
    let presenter = Arc::new(NudgePresenter::new(Arc::clone(&app), Arc::new(NoDialer)));
    let adapter = MoodAdapter::new(
        Arc::clone(&app),
        Arc::new(InMemoryMoodStore::new()),
        Arc::new(PhraseCrisisClassifier::new(DEFAULT_CRISIS_PHRASES).unwrap()),
        Arc::new(CannedNudgeGenerator),
        Arc::clone(&presenter),
    );
    adapter
        .submit_mood(MoodEntry::new(MoodLevel::Struggling, ""))
        .await;
    assert!(presenter.snapshot().message.contains("sponsor"));
}
