//! Shared types used across all Haven crates.

use crate::error::{HavenError, HavenResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// -----------------------------------------------------------------------------
// Routes
// -----------------------------------------------------------------------------

/// Whether a route is a top-level destination or a focused guided exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Hub,
    Tool,
}

/// Screen identifier. The set is fixed at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    // Hubs
    Dashboard,
    SafetyToolkit,
    Journal,
    Library,
    Settings,
    // Tools
    Breathing,
    Grounding,
    BodyScan,
    UrgeSurfing,
    MoodCheckIn,
    HaltCheck,
    AngerCoolDown,
    ReachOut,
    RestReset,
    NourishCheck,
    CrisisPlan,
    SponsorScript,
    Gratitude,
}

impl Route {
    /// Where `return_to_origin` lands when no origin was recorded.
    pub const DEFAULT_HOME: Route = Route::Dashboard;
    /// Target of the nudge "accept tool" action.
    pub const PRIMARY_SAFETY_TOOLKIT: Route = Route::SafetyToolkit;

    pub const ALL: [Route; 18] = [
        Route::Dashboard,
        Route::SafetyToolkit,
        Route::Journal,
        Route::Library,
        Route::Settings,
        Route::Breathing,
        Route::Grounding,
        Route::BodyScan,
        Route::UrgeSurfing,
        Route::MoodCheckIn,
        Route::HaltCheck,
        Route::AngerCoolDown,
        Route::ReachOut,
        Route::RestReset,
        Route::NourishCheck,
        Route::CrisisPlan,
        Route::SponsorScript,
        Route::Gratitude,
    ];

    pub fn kind(self) -> RouteKind {
        match self {
            Route::Dashboard
            | Route::SafetyToolkit
            | Route::Journal
            | Route::Library
            | Route::Settings => RouteKind::Hub,
            _ => RouteKind::Tool,
        }
    }

    #[inline]
    pub fn is_hub(self) -> bool {
        self.kind() == RouteKind::Hub
    }

    #[inline]
    pub fn is_tool(self) -> bool {
        self.kind() == RouteKind::Tool
    }

    /// Breathing/grounding tools. Biometric nudges are suppressed while one is on screen.
    pub fn is_regulation_tool(self) -> bool {
        matches!(self, Route::Breathing | Route::Grounding | Route::BodyScan)
    }

    pub fn slug(self) -> &'static str {
        match self {
            Route::Dashboard => "dashboard",
            Route::SafetyToolkit => "safety-toolkit",
            Route::Journal => "journal",
            Route::Library => "library",
            Route::Settings => "settings",
            Route::Breathing => "breathing",
            Route::Grounding => "grounding",
            Route::BodyScan => "body-scan",
            Route::UrgeSurfing => "urge-surfing",
            Route::MoodCheckIn => "mood-check-in",
            Route::HaltCheck => "halt-check",
            Route::AngerCoolDown => "anger-cool-down",
            Route::ReachOut => "reach-out",
            Route::RestReset => "rest-reset",
            Route::NourishCheck => "nourish-check",
            Route::CrisisPlan => "crisis-plan",
            Route::SponsorScript => "sponsor-script",
            Route::Gratitude => "gratitude",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Route {
    type Err = HavenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Route::ALL
            .iter()
            .copied()
            .find(|r| r.slug().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| HavenError::UnknownRoute(wanted.to_string()))
    }
}

// -----------------------------------------------------------------------------
// Mood journal
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodLevel {
    Great,
    Good,
    Neutral,
    Struggling,
    Crisis,
}

impl MoodLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            MoodLevel::Great => "great",
            MoodLevel::Good => "good",
            MoodLevel::Neutral => "neutral",
            MoodLevel::Struggling => "struggling",
            MoodLevel::Crisis => "crisis",
        }
    }
}

impl fmt::Display for MoodLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoodLevel {
    type Err = HavenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "great" => Ok(MoodLevel::Great),
            "good" => Ok(MoodLevel::Good),
            "neutral" => Ok(MoodLevel::Neutral),
            "struggling" => Ok(MoodLevel::Struggling),
            "crisis" => Ok(MoodLevel::Crisis),
            other => Err(HavenError::UnknownMoodLevel(other.to_string())),
        }
    }
}

/// One journal entry. Append-only: created on submission, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub mood_level: MoodLevel,
    pub note: String,
}

impl MoodEntry {
    pub fn new(mood_level: MoodLevel, note: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            mood_level,
            note: note.into(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

// -----------------------------------------------------------------------------
// Biometrics
// -----------------------------------------------------------------------------

/// Latest wearable reading. Written by the external sync collaborator; the core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiometricSample {
    pub heart_rate: u32,
    pub is_synced: bool,
    pub timestamp: DateTime<Utc>,
}

impl BiometricSample {
    pub fn synced(heart_rate: u32) -> Self {
        Self {
            heart_rate,
            is_synced: true,
            timestamp: Utc::now(),
        }
    }
}

// -----------------------------------------------------------------------------
// HALT
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HaltAxis {
    Hunger,
    Anger,
    Lonely,
    Tired,
}

impl HaltAxis {
    /// Order in which the user scores the axes.
    pub const COLLECTION_ORDER: [HaltAxis; 4] =
        [HaltAxis::Hunger, HaltAxis::Anger, HaltAxis::Lonely, HaltAxis::Tired];

    /// Order in which the resolver tests the axes. Anger first, independent of magnitude.
    pub const PRIORITY_ORDER: [HaltAxis; 4] =
        [HaltAxis::Anger, HaltAxis::Lonely, HaltAxis::Tired, HaltAxis::Hunger];

    pub fn as_str(self) -> &'static str {
        match self {
            HaltAxis::Hunger => "hunger",
            HaltAxis::Anger => "anger",
            HaltAxis::Lonely => "lonely",
            HaltAxis::Tired => "tired",
        }
    }
}

impl fmt::Display for HaltAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four self-reported scores in 1..=10. Fresh per diagnostic session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaltScoreSet {
    pub hunger: u8,
    pub anger: u8,
    pub lonely: u8,
    pub tired: u8,
    pub timestamp: DateTime<Utc>,
}

impl HaltScoreSet {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;
    /// Pre-filled value for every axis, so advancing is always possible.
    pub const DEFAULT_SCORE: u8 = 5;

    /// Build a validated score set.
    pub fn new(hunger: u8, anger: u8, lonely: u8, tired: u8) -> HavenResult<Self> {
        for (axis, value) in [
            (HaltAxis::Hunger, hunger),
            (HaltAxis::Anger, anger),
            (HaltAxis::Lonely, lonely),
            (HaltAxis::Tired, tired),
        ] {
            Self::validate(axis, value)?;
        }
        Ok(Self {
            hunger,
            anger,
            lonely,
            tired,
            timestamp: Utc::now(),
        })
    }

    /// Reject a set with any axis outside 1..=10, e.g. one built as a literal or deserialized.
    pub fn validate_all(&self) -> HavenResult<()> {
        for axis in HaltAxis::COLLECTION_ORDER {
            Self::validate(axis, self.get(axis))?;
        }
        Ok(())
    }

    fn validate(axis: HaltAxis, value: u8) -> HavenResult<()> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(())
        } else {
            Err(HavenError::Halt(format!(
                "{} score {} outside {}..={}",
                axis,
                value,
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn get(&self, axis: HaltAxis) -> u8 {
        match axis {
            HaltAxis::Hunger => self.hunger,
            HaltAxis::Anger => self.anger,
            HaltAxis::Lonely => self.lonely,
            HaltAxis::Tired => self.tired,
        }
    }

    pub fn set(&mut self, axis: HaltAxis, value: u8) -> HavenResult<()> {
        Self::validate(axis, value)?;
        match axis {
            HaltAxis::Hunger => self.hunger = value,
            HaltAxis::Anger => self.anger = value,
            HaltAxis::Lonely => self.lonely = value,
            HaltAxis::Tired => self.tired = value,
        }
        Ok(())
    }

    /// Highest score across the four axes.
    pub fn max(&self) -> u8 {
        HaltAxis::COLLECTION_ORDER
            .iter()
            .map(|a| self.get(*a))
            .max()
            .unwrap_or(Self::MIN)
    }
}

impl Default for HaltScoreSet {
    fn default() -> Self {
        Self {
            hunger: Self::DEFAULT_SCORE,
            anger: Self::DEFAULT_SCORE,
            lonely: Self::DEFAULT_SCORE,
            tired: Self::DEFAULT_SCORE,
            timestamp: Utc::now(),
        }
    }
}

/// Outcome of the HALT resolver: at most one corrective protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionDecision {
    pub axis: Option<HaltAxis>,
    pub target_route: Option<Route>,
}

impl InterventionDecision {
    pub fn none() -> Self {
        Self {
            axis: None,
            target_route: None,
        }
    }

    pub fn offer(axis: HaltAxis, target_route: Route) -> Self {
        Self {
            axis: Some(axis),
            target_route: Some(target_route),
        }
    }

    pub fn is_none(&self) -> bool {
        self.axis.is_none()
    }
}

// -----------------------------------------------------------------------------
// Nudge
// -----------------------------------------------------------------------------

/// The single global nudge slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NudgeState {
    pub is_open: bool,
    pub message: String,
    pub context: String,
}

// -----------------------------------------------------------------------------
// Session
// -----------------------------------------------------------------------------

/// Authentication/onboarding facts the voice adapter's enabling condition depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFlags {
    pub authenticated: bool,
    pub onboarding_complete: bool,
}
