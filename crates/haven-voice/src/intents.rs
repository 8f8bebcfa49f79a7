//! Ordered voice intents: (keyword group → confirmation + route) pairs, first match wins.
//!
//! Kept as data so a new intent can be tested on its own. There is no scoring; an earlier
//! row shadows a later one when both match.

use haven_core::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceIntent {
    pub name: &'static str,
    /// Lowercase substrings; any one of them matches.
    pub keywords: &'static [&'static str],
    pub confirmation: &'static str,
    pub route: Route,
}

impl VoiceIntent {
    /// `lowered` must already be lowercase.
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

pub const DEFAULT_INTENTS: &[VoiceIntent] = &[
    VoiceIntent {
        name: "crisis",
        keywords: &["crisis", "emergency"],
        confirmation: "Opening your crisis plan. You are not alone.",
        route: Route::CrisisPlan,
    },
    VoiceIntent {
        name: "sponsor",
        keywords: &["sponsor"],
        confirmation: "Let's get ready to reach your sponsor.",
        route: Route::SponsorScript,
    },
    VoiceIntent {
        name: "breathe",
        keywords: &["breathe", "breathing"],
        confirmation: "Let's breathe together.",
        route: Route::Breathing,
    },
    VoiceIntent {
        name: "ground",
        keywords: &["ground", "panic"],
        confirmation: "Starting a grounding exercise.",
        route: Route::Grounding,
    },
    VoiceIntent {
        name: "urge",
        keywords: &["urge", "craving"],
        confirmation: "Let's surf this urge together.",
        route: Route::UrgeSurfing,
    },
    VoiceIntent {
        name: "halt",
        keywords: &["halt"],
        confirmation: "Starting a HALT check.",
        route: Route::HaltCheck,
    },
    VoiceIntent {
        name: "mood",
        keywords: &["mood", "feeling"],
        confirmation: "Let's check in on how you're feeling.",
        route: Route::MoodCheckIn,
    },
    VoiceIntent {
        name: "journal",
        keywords: &["journal"],
        confirmation: "Opening your journal.",
        route: Route::Journal,
    },
    VoiceIntent {
        name: "home",
        keywords: &["home", "dashboard"],
        confirmation: "Going home.",
        route: Route::Dashboard,
    },
    VoiceIntent {
        name: "toolkit",
        keywords: &["toolkit", "tools"],
        confirmation: "Opening your safety toolkit.",
        route: Route::SafetyToolkit,
    },
];

#[derive(Debug, Clone)]
pub struct IntentTable {
    intents: Vec<VoiceIntent>,
}

impl IntentTable {
    pub fn new(intents: Vec<VoiceIntent>) -> Self {
        Self { intents }
    }

    /// Append at the lowest priority.
    pub fn push(&mut self, intent: VoiceIntent) {
        self.intents.push(intent);
    }

    pub fn intents(&self) -> &[VoiceIntent] {
        &self.intents
    }

    /// Top-to-bottom, case-insensitive substring match.
    pub fn first_match(&self, transcript: &str) -> Option<&VoiceIntent> {
        let lowered = transcript.to_lowercase();
        self.intents.iter().find(|intent| intent.matches(&lowered))
    }
}

impl Default for IntentTable {
    fn default() -> Self {
        Self::new(DEFAULT_INTENTS.to_vec())
    }
}

/// Case-insensitive check for the wake phrase. A blank wake word never matches.
pub fn contains_wake_word(transcript: &str, wake_word: &str) -> bool {
    let wake = wake_word.trim().to_lowercase();
    !wake.is_empty() && transcript.to_lowercase().contains(&wake)
}
