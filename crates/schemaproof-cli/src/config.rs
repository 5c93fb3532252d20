//! `schemaproof.toml` loading. Only the CLI touches files and environment.

use chrono::{DateTime, Utc};
use schemaproof_investigate::InvestigateOptions;
use schemaproof_kernel::scoring::default_required_kinds;
use schemaproof_kernel::{ReadinessThresholds, ScoringOptions, WeightConfig};
use schemaproof_ledger::ArtifactKind;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "SCHEMAPROOF_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "schemaproof.toml";
const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Kept loose so a bad weight table degrades to the built-in weights
    /// instead of rejecting the whole file.
    weights: Option<toml::Value>,
    readiness: ReadinessThresholds,
    scoring: ScoringSection,
    verify: VerifySection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ScoringSection {
    required_kinds: Option<Vec<ArtifactKind>>,
    targets: Option<Vec<ArtifactKind>>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct VerifySection {
    timeout_ms: u64,
}

impl Default for VerifySection {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_VERIFY_TIMEOUT_MS,
        }
    }
}

impl AppConfig {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(raw).map_err(|e| e.to_string())?;
        config.readiness.validate().map_err(|e| e.to_string())?;
        if config.verify.timeout_ms == 0 {
            return Err("verify.timeout_ms must be at least 1".to_string());
        }
        if config
            .scoring
            .required_kinds
            .as_ref()
            .is_some_and(|kinds| kinds.is_empty())
        {
            return Err("scoring.required_kinds must name at least one kind".to_string());
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        Self::parse(&raw).map_err(|e| format!("invalid config {}: {e}", path.display()))
    }

    pub fn weights(&self) -> WeightConfig {
        let Some(table) = &self.weights else {
            return WeightConfig::builtin();
        };
        match serde_json::to_value(table) {
            Ok(value) => WeightConfig::from_value(&value),
            Err(error) => {
                tracing::warn!(error = %error, "weights table is not representable; using built-in weights");
                WeightConfig::builtin()
            }
        }
    }

    fn required_kinds(&self) -> Vec<ArtifactKind> {
        self.scoring
            .required_kinds
            .clone()
            .unwrap_or_else(default_required_kinds)
    }

    pub fn scoring_options(&self, at: Option<DateTime<Utc>>) -> ScoringOptions {
        ScoringOptions {
            timestamp: at,
            targets: self
                .scoring
                .targets
                .as_ref()
                .map(|targets| targets.iter().cloned().collect()),
            required_kinds: self.required_kinds(),
            thresholds: self.readiness,
        }
    }

    pub fn investigate_options(&self, at: Option<DateTime<Utc>>) -> InvestigateOptions {
        InvestigateOptions {
            timestamp: at,
            required_kinds: self.required_kinds(),
        }
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify.timeout_ms)
    }
}

/// `--config`, then `$SCHEMAPROOF_CONFIG`, then `./schemaproof.toml` when present.
/// An explicitly named file must exist; the implicit default may be absent.
pub fn resolve_config_path(flag: Option<&str>) -> Result<Option<PathBuf>, String> {
    let explicit = flag
        .map(str::to_string)
        .or_else(|| std::env::var(CONFIG_ENV).ok().filter(|v| !v.is_empty()));
    if let Some(raw) = explicit {
        let path = PathBuf::from(raw);
        if !path.exists() {
            return Err(format!("config file not found: {}", path.display()));
        }
        return Ok(Some(path));
    }
    let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
    Ok(fallback.exists().then_some(fallback))
}
