//! Crisis resources: the hard-interrupt modal and the phrase-based text classifier.
//!
//! The modal never goes through the nudge presenter. It can be shown alongside a nudge or
//! instead of one, and `open_manually` keeps it reachable even when every adapter is down.

use crate::collaborators::CrisisTextClassifier;
use crate::error::HavenResult;
use async_trait::async_trait;
use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

/// Why the crisis modal was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisTrigger {
    /// Mood entry logged at the `crisis` level.
    MoodLevel,
    /// Journal note matched crisis language.
    CrisisLanguage,
    /// User tapped the always-visible crisis button.
    Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisModalState {
    pub is_open: bool,
    pub trigger: Option<CrisisTrigger>,
    /// Total number of open requests since start.
    pub open_count: u64,
}

#[derive(Debug, Default)]
pub struct CrisisModal {
    state: Mutex<CrisisModalState>,
}

impl CrisisModal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show crisis resources. Returns `false` when the modal was already showing.
    pub fn open(&self, trigger: CrisisTrigger) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.open_count += 1;
        state.trigger = Some(trigger);
        let newly_opened = !state.is_open;
        state.is_open = true;
        warn!(
            target: "haven::crisis",
            trigger = ?trigger,
            open_count = state.open_count,
            "crisis resources opened"
        );
        newly_opened
    }

    pub fn open_manually(&self) -> bool {
        self.open(CrisisTrigger::Manual)
    }

    pub fn dismiss(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.is_open = false;
        info!(target: "haven::crisis", "crisis resources dismissed");
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).is_open
    }

    pub fn snapshot(&self) -> CrisisModalState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Case-insensitive whole-phrase matcher over a configured phrase list.
#[derive(Debug, Clone)]
pub struct PhraseCrisisClassifier {
    phrases: Vec<String>,
    set: RegexSet,
}

impl PhraseCrisisClassifier {
    pub fn new<I, S>(phrases: I) -> HavenResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases: Vec<String> = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        let patterns: Vec<String> = phrases.iter().map(|p| phrase_pattern(p)).collect();
        let set = RegexSetBuilder::new(&patterns).case_insensitive(true).build()?;
        Ok(Self { phrases, set })
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Phrases found in `text`, in configuration order.
    pub fn matched_phrases(&self, text: &str) -> Vec<&str> {
        self.set
            .matches(text)
            .into_iter()
            .map(|i| self.phrases[i].as_str())
            .collect()
    }

    pub fn matches(&self, text: &str) -> bool {
        self.set.is_match(text)
    }
}

/// Escape the phrase and let any whitespace run match any whitespace run. The phrase must sit
/// between non-word characters (or the ends of the text), so punctuation-edged phrases like
/// "kms!" still match.
fn phrase_pattern(phrase: &str) -> String {
    let body = phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    format!(r"(?:^|\W){}(?:\W|$)", body)
}

#[async_trait]
impl CrisisTextClassifier for PhraseCrisisClassifier {
    async fn is_crisis(&self, text: &str) -> HavenResult<bool> {
        Ok(self.matches(text))
    }
}
