//! Agent configuration, loadable from TOML with environment overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::resolver::OllamaConfig;

/// Top-level configuration for the workflow agent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentConfig {
    /// JSON Lines audit trail.
    #[serde(default = "default_audit_log_path")]
    pub audit_log_path: PathBuf,
    /// Simulate every call instead of executing it.
    #[serde(default)]
    pub dry_run: bool,
    /// Who is submitting requests; recorded in every audit record.
    #[serde(default)]
    pub actor: Option<String>,
    /// Ollama model resolver settings. Disabled unless configured.
    #[serde(default)]
    pub ollama: OllamaConfig,
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("logs/audit.jsonl")
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            audit_log_path: default_audit_log_path(),
            dry_run: false,
            actor: None,
            ollama: OllamaConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// File (if given) or defaults, then process environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `AUDIT_LOG_PATH`, `DRY_RUN_MODE`, `OLLAMA_HOST` and
    /// `OLLAMA_MODEL` from `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<()> {
        if let Some(path) = lookup("AUDIT_LOG_PATH").filter(|p| !p.trim().is_empty()) {
            self.audit_log_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup("DRY_RUN_MODE") {
            self.dry_run = parse_flag(&raw)
                .ok_or_else(|| anyhow::anyhow!("DRY_RUN_MODE must be true or false, got '{raw}'"))?;
        }
        if let Some(host) = lookup("OLLAMA_HOST").filter(|h| !h.trim().is_empty()) {
            self.ollama.host = host;
            self.ollama.enabled = true;
        }
        if let Some(model) = lookup("OLLAMA_MODEL").filter(|m| !m.trim().is_empty()) {
            self.ollama.model = model;
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" | "" => Some(false),
        _ => None,
    }
}
