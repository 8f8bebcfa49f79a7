//! Haven configuration.
//!
//! `HavenConfig` holds build/deploy constants (thresholds, wake word, crisis phrases) and is
//! loaded from an optional TOML file plus `HAVEN__*` environment overrides. `Settings` holds
//! the user-facing toggles; the host persists them with `save_to_path`.

use crate::error::HavenResult;
use crate::shared::Route;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Phrases that mark a journal note as crisis language. Matched case-insensitively on word boundaries.
pub const DEFAULT_CRISIS_PHRASES: &[&str] = &[
    "kill myself",
    "end it all",
    "suicide",
    "suicidal",
    "want to die",
    "better off dead",
    "hurt myself",
    "self harm",
    "overdose",
    "no reason to live",
];

pub const DEFAULT_NUDGE_FALLBACK: &str =
    "It looks like things are heavy right now. Would you like to reach out to your sponsor or open your safety toolkit?";

/// Deploy-time configuration.
///
/// | Key | Default | Env override |
/// |-----|---------|--------------|
/// | wake_word | "hey haven" | HAVEN__WAKE_WORD |
/// | crisis_phrases | see `DEFAULT_CRISIS_PHRASES` | HAVEN__CRISIS_PHRASES (comma separated) |
/// | heart_rate_threshold | 105 | HAVEN__HEART_RATE_THRESHOLD |
/// | biometric_poll_secs | 10 | HAVEN__BIOMETRIC_POLL_SECS |
/// | biometric_cooldown_secs | 300 | HAVEN__BIOMETRIC_COOLDOWN_SECS |
/// | generation_timeout_secs | 15 | HAVEN__GENERATION_TIMEOUT_SECS |
/// | default_home_route | dashboard | HAVEN__DEFAULT_HOME_ROUTE |
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HavenConfig {
    pub wake_word: String,
    pub crisis_phrases: Vec<String>,
    /// Fire only when the synced heart rate is strictly above this (bpm).
    pub heart_rate_threshold: u32,
    pub biometric_poll_secs: u64,
    /// Minimum time between two biometric firings, measured from the previous firing.
    pub biometric_cooldown_secs: u64,
    /// Upper bound on any classifier/generator call before the canned fallback is used.
    pub generation_timeout_secs: u64,
    pub default_home_route: Route,
    pub nudge_fallback_message: String,
    /// Model for the OpenRouter nudge generator, when one is wired.
    pub openrouter_model: String,
}

impl Default for HavenConfig {
    fn default() -> Self {
        Self {
            wake_word: "hey haven".to_string(),
            crisis_phrases: DEFAULT_CRISIS_PHRASES.iter().map(|s| s.to_string()).collect(),
            heart_rate_threshold: 105,
            biometric_poll_secs: 10,
            biometric_cooldown_secs: 300,
            generation_timeout_secs: 15,
            default_home_route: Route::DEFAULT_HOME,
            nudge_fallback_message: DEFAULT_NUDGE_FALLBACK.to_string(),
            openrouter_model: "meta-llama/llama-3.3-70b-instruct".to_string(),
        }
    }
}

impl HavenConfig {
    /// Load config from file and environment. Precedence: env `HAVEN_CONFIG` path > `config/haven` > defaults.
    pub fn load() -> HavenResult<Self> {
        let config_path = std::env::var("HAVEN_CONFIG").unwrap_or_else(|_| "config/haven".to_string());
        Self::load_from(&config_path)
    }

    /// Load from an explicit file stem/path (extension optional) layered under `HAVEN__*` env vars.
    pub fn load_from(config_path: &str) -> HavenResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("HAVEN")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("crisis_phrases"),
            );
        let built = builder.build()?;
        Ok(built.try_deserialize()?)
    }

    pub fn biometric_poll_interval(&self) -> Duration {
        Duration::from_secs(self.biometric_poll_secs.max(1))
    }

    pub fn biometric_cooldown(&self) -> Duration {
        Duration::from_secs(self.biometric_cooldown_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs.max(1))
    }
}

fn default_true() -> bool {
    true
}

/// User-facing toggles. Stored locally in `haven_settings.toml` by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Struggling mood entries and heart-rate spikes may open a proactive nudge.
    #[serde(default = "default_true")]
    pub vulnerability_nudges_enabled: bool,
    /// Biometric poll runs at all.
    #[serde(default = "default_true")]
    pub biometric_alerts_enabled: bool,
    /// Voice wake-word listening.
    #[serde(default)]
    pub hands_free_enabled: bool,
    /// Suppresses spoken confirmations and haptics.
    #[serde(default)]
    pub quiet_mode: bool,
    #[serde(default)]
    pub sponsor_phone: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vulnerability_nudges_enabled: true,
            biometric_alerts_enabled: true,
            hands_free_enabled: false,
            quiet_mode: false,
            sponsor_phone: None,
        }
    }
}

impl Settings {
    pub fn default_path() -> PathBuf {
        PathBuf::from("haven_settings.toml")
    }

    /// Load settings from `path`, or defaults when the file does not exist yet.
    pub fn load_from_path(path: &Path) -> HavenResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_to_path(&self, path: &Path) -> HavenResult<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Sponsor number with all whitespace removed; `None` when nothing dialable is left.
    pub fn sanitized_sponsor_phone(&self) -> Option<String> {
        let raw = self.sponsor_phone.as_deref()?;
        let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }
}
