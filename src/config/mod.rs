//! Palette configuration.
//!
//! Loaded from `<config_dir>/command-palette/config.toml`. Every field has a
//! default, so a partial file only overrides what it names:
//!
//! ```toml
//! debounce_ms = 250
//! max_history = 20
//!
//! [parser]
//! threshold = 0.65
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

const APP_DIR_NAME: &str = "command-palette";
const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Input silence required before a query is committed
    pub debounce_ms: u64,
    /// Queries shorter than this (in characters) never reach a provider
    pub min_query_len: usize,
    /// Ceiling for a single provider call
    pub provider_timeout_ms: u64,
    pub max_history: usize,
    /// Storage key the history list is persisted under
    pub history_key: String,
    pub parser: ParserConfig,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            min_query_len: 2,
            provider_timeout_ms: 8000,
            max_history: 10,
            history_key: "command_palette_history".to_string(),
            parser: ParserConfig::default(),
        }
    }
}

impl PaletteConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.debounce_ms > 5000 {
            bail!("debounce_ms out of range (0-5000): {}", self.debounce_ms);
        }
        if self.min_query_len == 0 {
            bail!("min_query_len must be at least 1");
        }
        if !(1..=60_000).contains(&self.provider_timeout_ms) {
            bail!("provider_timeout_ms out of range (1-60000): {}", self.provider_timeout_ms);
        }
        if !(1..=500).contains(&self.max_history) {
            bail!("max_history out of range (1-500): {}", self.max_history);
        }
        if self.history_key.trim().is_empty() {
            bail!("history_key is required");
        }
        self.parser.validate()
    }
}

/// Tuning for the intent parser.
///
/// The confidence constants are empirical; they are kept here rather than in
/// the parser so deployments can adjust them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Minimum confidence for a structured intent
    pub threshold: f64,
    /// Confidence added per matched task slot (verb, target, date)
    pub slot_weight: f64,
    pub slot_cap: f64,
    /// Confidence of the plain search fallback, kept below `threshold`
    pub search_confidence: f64,
    pub navigate_confidence: f64,
    /// Shortest input that may prefix-match a route alias
    pub min_route_prefix: usize,
    /// Leading phrases that start a task, matched accent- and case-insensitively
    pub action_verbs: Vec<String>,
    pub routes: Vec<RouteAlias>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAlias {
    pub route: String,
    pub aliases: Vec<String>,
}

impl RouteAlias {
    fn new(route: &str, aliases: &[&str]) -> Self {
        Self {
            route: route.to_string(),
            aliases: aliases.iter().map(|alias| alias.to_string()).collect(),
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        let verbs = [
            "créer tâche",
            "créer une tâche",
            "nouvelle tâche",
            "ajouter tâche",
            "ajouter une tâche",
            "rappeler",
            "appeler",
            "relancer",
            "planifier",
            "create task",
            "new task",
            "remind",
            "call",
            "follow up",
        ];

        Self {
            threshold: 0.6,
            slot_weight: 0.4,
            slot_cap: 0.95,
            search_confidence: 0.5,
            navigate_confidence: 0.9,
            min_route_prefix: 3,
            action_verbs: verbs.iter().map(|verb| verb.to_string()).collect(),
            routes: vec![
                RouteAlias::new("/", &["accueil", "tableau de bord", "dashboard", "home"]),
                RouteAlias::new(
                    "/organisations",
                    &["organisations", "organizations", "entreprises", "companies"],
                ),
                RouteAlias::new("/people", &["personnes", "contacts", "people"]),
                RouteAlias::new("/tasks", &["tâches", "tasks"]),
                RouteAlias::new("/campaigns", &["campagnes", "campaigns", "emailing"]),
                RouteAlias::new("/ai-suggestions", &["suggestions ia", "suggestions", "ai suggestions"]),
                RouteAlias::new("/legal", &["documents légaux", "mentions légales", "legal"]),
                RouteAlias::new("/settings", &["paramètres", "réglages", "settings"]),
            ],
        }
    }
}

impl ParserConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("threshold", self.threshold),
            ("slot_weight", self.slot_weight),
            ("slot_cap", self.slot_cap),
            ("search_confidence", self.search_confidence),
            ("navigate_confidence", self.navigate_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("parser.{name} must be within [0, 1]: {value}");
            }
        }
        if self.search_confidence >= self.threshold {
            bail!("parser.search_confidence must stay below parser.threshold");
        }
        if self.navigate_confidence < self.threshold {
            bail!("parser.navigate_confidence must reach parser.threshold");
        }
        if self.min_route_prefix == 0 {
            bail!("parser.min_route_prefix must be at least 1");
        }
        if self.action_verbs.iter().any(|verb| verb.trim().is_empty()) {
            bail!("parser.action_verbs must not contain empty entries");
        }
        Ok(())
    }
}

/// Directory holding config and persisted palette data
pub fn app_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Failed to get platform config directory")?;
    Ok(base.join(APP_DIR_NAME))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(app_dir()?.join(CONFIG_FILENAME))
}
