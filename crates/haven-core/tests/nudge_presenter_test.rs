//! Integration test: single-slot nudge presenter.
//!
//! ## Scenario
//! 1. A second `open_nudge` while one is showing is a no-op; the first payload stays.
//! 2. `CallSponsor` with no number closes without invoking telephony.
//! 3. `AcceptTool` from a hub lands on the toolkit and remembers the hub.
//! 4. The crisis modal opens independently of an open nudge.

use haven_core::{
    AppState, CrisisTrigger, HavenConfig, NudgeOutcome, NudgePresenter, Route, Settings,
    TelephonyIntent,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingDialer {
    calls: Mutex<Vec<String>>,
}

impl TelephonyIntent for RecordingDialer {
    fn dial(&self, phone_number: &str) {
        self.calls.lock().unwrap().push(phone_number.to_string());
    }
}

fn setup(sponsor: Option<&str>) -> (Arc<AppState>, NudgePresenter, Arc<RecordingDialer>) {
    let settings = Settings {
        sponsor_phone: sponsor.map(str::to_string),
        ..Default::default()
    };
    let app = Arc::new(AppState::new(HavenConfig::default(), settings));
    let dialer = Arc::new(RecordingDialer::default());
    let presenter = NudgePresenter::new(Arc::clone(&app), dialer.clone());
    (app, presenter, dialer)
}

#[test]
fn second_open_keeps_first_payload() {
    let (_, presenter, _) = setup(None);
    for (message, context) in [("a", "ctx-a"), ("b", "ctx-b"), ("c", "ctx-c")] {
        presenter.open_nudge(message, context);
    }
    let state = presenter.snapshot();
    assert_eq!((state.message.as_str(), state.context.as_str()), ("a", "ctx-a"));
}

#[test]
fn call_sponsor_without_number_never_dials() {
    for blank in [None, Some(""), Some("   \t ")] {
        let (_, presenter, dialer) = setup(blank);
        presenter.open_nudge("msg", "ctx");
        assert_eq!(presenter.call_sponsor(), NudgeOutcome::NoSponsorConfigured);
        assert!(!presenter.is_open());
        assert!(dialer.calls.lock().unwrap().is_empty());
    }
}

#[test]
fn accept_tool_from_journal_returns_to_journal() {
    let (app, presenter, _) = setup(None);
    app.navigate(Route::Journal);
    presenter.open_nudge("msg", "ctx");
    presenter.accept_tool();
    assert_eq!(app.current_route(), Route::SafetyToolkit);
    // toolkit is a hub, so it becomes the origin for the tool the user picks next
    app.navigate(Route::Breathing);
    assert_eq!(app.return_to_origin(), Route::SafetyToolkit);
}

#[test]
fn crisis_modal_is_independent_of_nudge() {
    let (app, presenter, _) = setup(None);
    presenter.open_nudge("msg", "ctx");
    assert!(app.crisis().open(CrisisTrigger::Manual));
    assert!(presenter.is_open());
    assert!(app.crisis().is_open());
    presenter.decline();
    assert!(app.crisis().is_open());
}
