//! HALT diagnostic sub-engine (Hunger, Anger, Lonely, Tired).
//!
//! `Collecting(0..3) → Evaluating → {InterventionOffered(axis) | Archiving} → Reflection → Terminal`.
//!
//! The resolver walks a fixed priority order (anger, lonely, tired, hunger) and surfaces the
//! first axis above 7, even when a later axis scored higher. Anger leads because it degrades
//! impulse control the most.

use crate::collaborators::ReflectionSummarizer;
use crate::error::{HavenError, HavenResult};
use crate::shared::{HaltAxis, HaltScoreSet, InterventionDecision, MoodEntry, MoodLevel, Route};
use crate::state::AppState;
use crate::store::MoodStore;
use std::time::Duration;
use tracing::{info, warn};

/// An axis must score strictly above this to offer its protocol.
pub const INTERVENTION_THRESHOLD: u8 = 7;
/// Any axis at or above this archives as `struggling`.
pub const STRUGGLING_THRESHOLD: u8 = 8;

const REFLECTION_FALLBACK: &str = "Thanks for checking in with yourself. Every honest check-in counts.";

/// The corrective protocol offered for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HaltProtocol {
    pub axis: HaltAxis,
    pub route: Route,
    pub title: &'static str,
    pub prompt: &'static str,
}

pub fn protocol_for(axis: HaltAxis) -> HaltProtocol {
    match axis {
        HaltAxis::Anger => HaltProtocol {
            axis,
            route: Route::AngerCoolDown,
            title: "Cool the fire",
            prompt: "Anger is running high. Step away and let your body settle before you act.",
        },
        HaltAxis::Lonely => HaltProtocol {
            axis,
            route: Route::ReachOut,
            title: "Reach out",
            prompt: "Isolation feeds the disease. Pick one person to text or call.",
        },
        HaltAxis::Tired => HaltProtocol {
            axis,
            route: Route::RestReset,
            title: "Rest reset",
            prompt: "Exhaustion lowers your guard. Plan a real rest, even twenty minutes.",
        },
        HaltAxis::Hunger => HaltProtocol {
            axis,
            route: Route::NourishCheck,
            title: "Nourish",
            prompt: "Low fuel looks a lot like a craving. Eat something simple first.",
        },
    }
}

/// Pick at most one protocol, by priority order rather than magnitude.
pub fn resolve_intervention(scores: &HaltScoreSet) -> InterventionDecision {
    HaltAxis::PRIORITY_ORDER
        .iter()
        .copied()
        .find(|axis| scores.get(*axis) > INTERVENTION_THRESHOLD)
        .map(|axis| InterventionDecision::offer(axis, protocol_for(axis).route))
        .unwrap_or_else(InterventionDecision::none)
}

/// Fold a score set into a single journal entry. Out-of-range scores are rejected.
pub fn archive_entry(scores: &HaltScoreSet) -> HavenResult<MoodEntry> {
    scores.validate_all()?;
    let peak = scores.max();
    let mood_level = if peak >= STRUGGLING_THRESHOLD {
        MoodLevel::Struggling
    } else {
        MoodLevel::Neutral
    };
    let note = format!(
        "HALT check-in: hunger {}/10, anger {}/10, lonely {}/10, tired {}/10. Peak intensity {}/10.",
        scores.hunger, scores.anger, scores.lonely, scores.tired, peak
    );
    Ok(MoodEntry::new(mood_level, note).with_timestamp(scores.timestamp))
}

/// Archive the scores and append the entry to the journal. Invalid scores are rejected before
/// anything is stored; a store failure is logged and the entry is returned either way.
pub fn submit_halt_scores(store: &dyn MoodStore, scores: &HaltScoreSet) -> HavenResult<MoodEntry> {
    let entry = archive_entry(scores)?;
    if let Err(e) = store.append(&entry) {
        warn!(target: "haven::halt", error = %e, "failed to persist HALT entry");
    }
    info!(
        target: "haven::halt",
        mood = %entry.mood_level,
        peak = scores.max(),
        "HALT scores archived"
    );
    Ok(entry)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltPhase {
    Collecting { axis_index: usize },
    Evaluating,
    InterventionOffered(HaltAxis),
    Archiving,
    Reflection,
    Terminal,
}

/// How a session ended, handed to the exit callback.
#[derive(Debug, Clone, PartialEq)]
pub enum HaltExit {
    /// User took the offered protocol; nothing was archived.
    FollowedProtocol(Route),
    /// Scores archived into this entry and reflection shown.
    Completed(MoodEntry),
}

pub type HaltExitCallback = Box<dyn FnOnce(&HaltExit) + Send>;

/// One diagnostic run. Created fresh per session; discarded at Terminal.
pub struct HaltSession {
    phase: HaltPhase,
    scores: HaltScoreSet,
    archived: Option<MoodEntry>,
    reflection: Option<String>,
    exit: Option<HaltExit>,
    on_exit: Option<HaltExitCallback>,
}

impl HaltSession {
    pub fn new() -> Self {
        Self {
            phase: HaltPhase::Collecting { axis_index: 0 },
            scores: HaltScoreSet::default(),
            archived: None,
            reflection: None,
            exit: None,
            on_exit: None,
        }
    }

    pub fn with_exit_callback(mut self, callback: impl FnOnce(&HaltExit) + Send + 'static) -> Self {
        self.on_exit = Some(Box::new(callback));
        self
    }

    pub fn phase(&self) -> &HaltPhase {
        &self.phase
    }

    pub fn scores(&self) -> &HaltScoreSet {
        &self.scores
    }

    pub fn archived(&self) -> Option<&MoodEntry> {
        self.archived.as_ref()
    }

    pub fn reflection(&self) -> Option<&str> {
        self.reflection.as_deref()
    }

    pub fn exit(&self) -> Option<&HaltExit> {
        self.exit.as_ref()
    }

    /// Axis being scored, while collecting.
    pub fn current_axis(&self) -> Option<HaltAxis> {
        match self.phase {
            HaltPhase::Collecting { axis_index } => HaltAxis::COLLECTION_ORDER.get(axis_index).copied(),
            _ => None,
        }
    }

    /// Protocol on offer, if any.
    pub fn offered_protocol(&self) -> Option<HaltProtocol> {
        match self.phase {
            HaltPhase::InterventionOffered(axis) => Some(protocol_for(axis)),
            _ => None,
        }
    }

    /// Score the current axis.
    pub fn set_score(&mut self, value: u8) -> HavenResult<()> {
        let axis = self.current_axis().ok_or_else(|| self.wrong_phase("score an axis"))?;
        self.scores.set(axis, value)
    }

    /// Next axis; after the last one, evaluate and move to the offer or straight to archiving.
    pub fn advance(&mut self) -> HavenResult<&HaltPhase> {
        let axis_index = match self.phase {
            HaltPhase::Collecting { axis_index } => axis_index,
            _ => return Err(self.wrong_phase("advance")),
        };
        if axis_index + 1 < HaltAxis::COLLECTION_ORDER.len() {
            self.phase = HaltPhase::Collecting {
                axis_index: axis_index + 1,
            };
        } else {
            self.phase = HaltPhase::Evaluating;
            self.evaluate();
        }
        Ok(&self.phase)
    }

    /// Previous axis while collecting.
    pub fn back(&mut self) -> HavenResult<&HaltPhase> {
        let axis_index = match self.phase {
            HaltPhase::Collecting { axis_index } if axis_index > 0 => axis_index,
            _ => return Err(self.wrong_phase("go back")),
        };
        self.phase = HaltPhase::Collecting {
            axis_index: axis_index - 1,
        };
        Ok(&self.phase)
    }

    fn evaluate(&mut self) {
        self.scores.timestamp = chrono::Utc::now();
        let decision = resolve_intervention(&self.scores);
        self.phase = match decision.axis {
            Some(axis) => HaltPhase::InterventionOffered(axis),
            None => HaltPhase::Archiving,
        };
        info!(
            target: "haven::halt",
            hunger = self.scores.hunger,
            anger = self.scores.anger,
            lonely = self.scores.lonely,
            tired = self.scores.tired,
            offered = ?decision.axis,
            "HALT evaluated"
        );
    }

    /// Take the offered protocol: navigate there and end the session without archiving.
    pub fn follow_protocol(&mut self, app: &AppState) -> HavenResult<Route> {
        let protocol = self
            .offered_protocol()
            .ok_or_else(|| self.wrong_phase("follow a protocol"))?;
        app.navigate(protocol.route);
        self.terminate(HaltExit::FollowedProtocol(protocol.route));
        Ok(protocol.route)
    }

    /// Skip the offered protocol and fall through to archiving.
    pub fn proceed_without_protocol(&mut self) -> HavenResult<()> {
        if self.offered_protocol().is_none() {
            return Err(self.wrong_phase("skip the protocol"));
        }
        self.phase = HaltPhase::Archiving;
        Ok(())
    }

    /// Convert the scores into a journal entry and move on to reflection.
    pub fn archive(&mut self, store: &dyn MoodStore) -> HavenResult<MoodEntry> {
        if self.phase != HaltPhase::Archiving {
            return Err(self.wrong_phase("archive"));
        }
        let entry = submit_halt_scores(store, &self.scores)?;
        self.archived = Some(entry.clone());
        self.phase = HaltPhase::Reflection;
        Ok(entry)
    }

    /// Ask the reflection collaborator for a closing summary, with a canned fallback.
    pub async fn reflect(
        &mut self,
        summarizer: &dyn ReflectionSummarizer,
        deadline: Duration,
    ) -> HavenResult<String> {
        if self.phase != HaltPhase::Reflection {
            return Err(self.wrong_phase("reflect"));
        }
        let text = match tokio::time::timeout(deadline, summarizer.summarize(&self.scores)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => REFLECTION_FALLBACK.to_string(),
            Ok(Err(e)) => {
                warn!(target: "haven::halt", error = %e, "reflection summary failed");
                REFLECTION_FALLBACK.to_string()
            }
            Err(_) => {
                warn!(target: "haven::halt", "reflection summary timed out");
                REFLECTION_FALLBACK.to_string()
            }
        };
        self.reflection = Some(text.clone());
        Ok(text)
    }

    /// Leave reflection; the exit callback fires.
    pub fn finish(&mut self) -> HavenResult<()> {
        if self.phase != HaltPhase::Reflection {
            return Err(self.wrong_phase("finish"));
        }
        let entry = self
            .archived
            .clone()
            .ok_or_else(|| HavenError::Halt("reflection reached without an archived entry".to_string()))?;
        self.terminate(HaltExit::Completed(entry));
        Ok(())
    }

    fn terminate(&mut self, exit: HaltExit) {
        self.phase = HaltPhase::Terminal;
        if let Some(callback) = self.on_exit.take() {
            callback(&exit);
        }
        self.exit = Some(exit);
    }

    fn wrong_phase(&self, action: &str) -> HavenError {
        HavenError::Halt(format!("cannot {} while {:?}", action, self.phase))
    }
}

impl Default for HaltSession {
    fn default() -> Self {
        Self::new()
    }
}
