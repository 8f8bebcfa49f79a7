//! Nudge message generation.
//!
//! The core treats generation as a black box returning a string. Every call goes through
//! `nudge_message_or_fallback` / `classify_or_safe` so that failures, timeouts and empty output
//! are recovered locally and never reach the user as an error.

use crate::collaborators::{CrisisTextClassifier, ProactiveNudgeGenerator, ReflectionSummarizer};
use crate::error::{HavenError, HavenResult};
use crate::shared::HaltScoreSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

/// Await the generator with a deadline; fall back to `fallback` on error, timeout or blank output.
pub async fn nudge_message_or_fallback(
    generator: &dyn ProactiveNudgeGenerator,
    context_summary: &str,
    deadline: Duration,
    fallback: &str,
) -> String {
    let result = match tokio::time::timeout(deadline, generator.generate(context_summary)).await {
        Ok(Ok(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Ok(Ok(_)) => Err(HavenError::Classification("generator returned empty text".to_string())),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(HavenError::Classification(format!(
            "generator timed out after {}s",
            deadline.as_secs()
        ))),
    };
    match result {
        Ok(text) => text,
        Err(e) => {
            warn!(target: "haven::generator", error = %e, "nudge generation failed; using fallback");
            fallback.to_string()
        }
    }
}

/// Run the crisis classifier with a deadline. A failed classification counts as "not crisis";
/// the manual crisis button stays available regardless.
pub async fn classify_or_safe(
    classifier: &dyn CrisisTextClassifier,
    text: &str,
    deadline: Duration,
) -> bool {
    match tokio::time::timeout(deadline, classifier.is_crisis(text)).await {
        Ok(Ok(verdict)) => verdict,
        Ok(Err(e)) => {
            warn!(target: "haven::generator", error = %e, "crisis classification failed");
            false
        }
        Err(_) => {
            warn!(target: "haven::generator", "crisis classification timed out");
            false
        }
    }
}

/// Offline generator: picks a fixed supportive line keyed on the context summary.
#[derive(Debug, Clone, Default)]
pub struct CannedNudgeGenerator;

impl CannedNudgeGenerator {
    pub fn message_for(context_summary: &str) -> &'static str {
        let lower = context_summary.to_lowercase();
        if lower.contains("heart rate") {
            "Your body is running hot right now. A slow breath in, a longer breath out. Want to try a short reset or call your sponsor?"
        } else if lower.contains("struggling") {
            "Thanks for being honest about today. You don't have to carry it alone. Reach out to your sponsor or open a tool?"
        } else {
            "Checking in. Would a quick tool or a call help right now?"
        }
    }
}

#[async_trait]
impl ProactiveNudgeGenerator for CannedNudgeGenerator {
    async fn generate(&self, context_summary: &str) -> HavenResult<String> {
        Ok(Self::message_for(context_summary).to_string())
    }
}

#[async_trait]
impl ReflectionSummarizer for CannedNudgeGenerator {
    async fn summarize(&self, scores: &HaltScoreSet) -> HavenResult<String> {
        let peak = scores.max();
        let text = if peak >= 8 {
            format!("Today peaked at {}/10. Naming it is the first step; be gentle with yourself tonight.", peak)
        } else {
            format!("Nothing above {}/10 today. Notice what kept you steady.", peak)
        };
        Ok(text)
    }
}

// OpenAI-compatible request/response for OpenRouter
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Remote generator over an OpenAI-compatible chat completion endpoint.
pub struct OpenRouterNudgeGenerator {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenRouterNudgeGenerator {
    const SYSTEM_PROMPT: &'static str = "You write one or two short, warm sentences for a person in addiction recovery \
        who may be struggling right now. Offer, without pressure, to call their sponsor or open a coping tool. \
        No diagnoses, no lists, no emojis.";

    /// Build from `OPENROUTER_API_KEY`. Returns `None` when no key is set.
    pub fn from_env(model: &str) -> Option<Self> {
        let key = std::env::var("OPENROUTER_API_KEY").ok()?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self::new(key.to_string(), model))
    }

    pub fn new(api_key: String, model: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            base_url: OPENROUTER_API_BASE.to_string(),
            client,
        }
    }

    /// Point at another OpenAI-compatible endpoint (base URL without trailing slash).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ProactiveNudgeGenerator for OpenRouterNudgeGenerator {
    async fn generate(&self, context_summary: &str) -> HavenResult<String> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Self::SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: context_summary.to_string(),
                },
            ],
            temperature: Some(0.6),
            max_tokens: Some(120),
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(HavenError::Classification(format!(
                "nudge API error {}: {}",
                status, text
            )));
        }
        let parsed: ChatResponse = res.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| HavenError::Classification("nudge API returned no choices".to_string()))
    }
}
