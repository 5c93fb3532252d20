//! Weight configuration and precedence-ordered weight resolution.
//!
//! Resolution walks a fixed list of rules and stops at the first match:
//!
//! ```text
//! OverrideRule   exact uid, then `tbl:<Table>.*`
//! DirectiveRule  element directive tags
//! SubstringRule  needles inside the uid
//! DefaultRule    always matches
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::ConfigError;

pub const DEFAULT_WEIGHT: u32 = 1;
pub const MAX_WEIGHT: u32 = 1_000;

/// Name fragments that mark an element as privacy-sensitive.
pub const SENSITIVE_SUBSTRINGS: [&str; 6] = ["password", "secret", "ssn", "token", "email", "phone"];

pub fn is_sensitive_uid(uid: &str) -> bool {
    let uid = uid.to_ascii_lowercase();
    SENSITIVE_SUBSTRINGS.iter().any(|needle| uid.contains(needle))
}

fn default_weight() -> u32 {
    DEFAULT_WEIGHT
}

/// Externally supplied weight data. Read-only to the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightConfig {
    #[serde(default = "default_weight")]
    pub default: u32,
    #[serde(default)]
    pub substrings: BTreeMap<String, u32>,
    #[serde(default)]
    pub directives: BTreeMap<String, u32>,
    #[serde(default)]
    pub overrides: BTreeMap<String, u32>,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WeightConfig {
    pub fn builtin() -> Self {
        let directives = [
            ("pk", 10),
            ("sensitive", 10),
            ("tenant", 9),
            ("fk", 7),
            ("unique", 6),
            ("index", 4),
        ];
        let substrings = [
            ("password", 10),
            ("secret", 10),
            ("ssn", 10),
            ("token", 9),
            ("email", 8),
            ("phone", 7),
        ];
        Self {
            default: DEFAULT_WEIGHT,
            substrings: substrings
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            directives: directives
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            overrides: BTreeMap::new(),
        }
    }

    /// Parse and validate, failing on any malformed entry.
    pub fn try_from_value(value: &Value) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_value(value.clone())
            .map_err(|e| ConfigError::InvalidWeights(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse, falling back to [`WeightConfig::builtin`] with a warning when
    /// the supplied data is malformed.
    pub fn from_value(value: &Value) -> Self {
        match Self::try_from_value(value) {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(error = %error, "falling back to built-in weight configuration");
                Self::builtin()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default == 0 {
            return Err(ConfigError::InvalidWeights(
                "default weight must be at least 1".to_string(),
            ));
        }
        let sections = [
            ("substrings", &self.substrings),
            ("directives", &self.directives),
            ("overrides", &self.overrides),
        ];
        for (section, entries) in sections {
            for (key, weight) in entries {
                if key.trim().is_empty() {
                    return Err(ConfigError::InvalidWeights(format!(
                        "{section}: empty key"
                    )));
                }
                if *weight > MAX_WEIGHT {
                    return Err(ConfigError::InvalidWeights(format!(
                        "{section}.{key}: weight {weight} exceeds {MAX_WEIGHT}"
                    )));
                }
            }
        }
        if self.default > MAX_WEIGHT {
            return Err(ConfigError::InvalidWeights(format!(
                "default weight {} exceeds {MAX_WEIGHT}",
                self.default
            )));
        }
        Ok(())
    }
}

/// What weight resolution sees of a schema element.
#[derive(Debug, Clone, Copy)]
pub struct WeightSubject<'a> {
    pub uid: &'a str,
    pub table: Option<&'a str>,
    pub tags: &'a BTreeSet<String>,
}

/// Which rule produced a weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum WeightSource {
    Override { key: String },
    Directive { tag: String },
    Substring { needle: String },
    Default,
}

impl fmt::Display for WeightSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Override { key } => write!(f, "override:{key}"),
            Self::Directive { tag } => write!(f, "directive:{tag}"),
            Self::Substring { needle } => write!(f, "substring:{needle}"),
            Self::Default => f.write_str("default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedWeight {
    pub weight: u32,
    pub source: WeightSource,
}

/// One precedence level of weight resolution.
pub trait WeightRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` hands the element to the next rule.
    fn resolve(&self, subject: &WeightSubject<'_>) -> Option<ResolvedWeight>;
}

pub struct OverrideRule {
    overrides: BTreeMap<String, u32>,
}

impl WeightRule for OverrideRule {
    fn name(&self) -> &'static str {
        "override"
    }

    fn resolve(&self, subject: &WeightSubject<'_>) -> Option<ResolvedWeight> {
        let exact = self
            .overrides
            .get_key_value(subject.uid)
            .map(|(key, weight)| (key.clone(), *weight));
        let wildcard = || {
            let table = subject.table?;
            if !subject.uid.starts_with("col:") {
                return None;
            }
            let key = format!("tbl:{table}.*");
            self.overrides.get(&key).map(|weight| (key, *weight))
        };
        exact.or_else(wildcard).map(|(key, weight)| ResolvedWeight {
            weight,
            source: WeightSource::Override { key },
        })
    }
}

pub struct DirectiveRule {
    directives: BTreeMap<String, u32>,
}

impl WeightRule for DirectiveRule {
    fn name(&self) -> &'static str {
        "directive"
    }

    fn resolve(&self, subject: &WeightSubject<'_>) -> Option<ResolvedWeight> {
        best_match(
            self.directives
                .iter()
                .filter(|(tag, _)| subject.tags.contains(&tag.to_ascii_lowercase())),
        )
        .map(|(tag, weight)| ResolvedWeight {
            weight,
            source: WeightSource::Directive { tag },
        })
    }
}

pub struct SubstringRule {
    substrings: BTreeMap<String, u32>,
}

impl WeightRule for SubstringRule {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn resolve(&self, subject: &WeightSubject<'_>) -> Option<ResolvedWeight> {
        let haystack = subject.uid.to_ascii_lowercase();
        best_match(
            self.substrings
                .iter()
                .filter(|(needle, _)| haystack.contains(&needle.to_ascii_lowercase())),
        )
        .map(|(needle, weight)| ResolvedWeight {
            weight,
            source: WeightSource::Substring { needle },
        })
    }
}

pub struct DefaultRule {
    weight: u32,
}

impl WeightRule for DefaultRule {
    fn name(&self) -> &'static str {
        "default"
    }

    fn resolve(&self, _subject: &WeightSubject<'_>) -> Option<ResolvedWeight> {
        Some(ResolvedWeight {
            weight: self.weight,
            source: WeightSource::Default,
        })
    }
}

/// Highest weight wins; ties go to the lexicographically first key, which
/// BTreeMap iteration order already gives us.
fn best_match<'a>(candidates: impl Iterator<Item = (&'a String, &'a u32)>) -> Option<(String, u32)> {
    let mut best: Option<(&String, u32)> = None;
    for (key, weight) in candidates {
        if best.is_none_or(|(_, current)| *weight > current) {
            best = Some((key, *weight));
        }
    }
    best.map(|(key, weight)| (key.clone(), weight))
}

/// Precedence-ordered rule chain built from a [`WeightConfig`].
pub struct WeightResolver {
    rules: Vec<Box<dyn WeightRule>>,
}

impl WeightResolver {
    pub fn new(config: &WeightConfig) -> Self {
        Self {
            rules: vec![
                Box::new(OverrideRule {
                    overrides: config.overrides.clone(),
                }),
                Box::new(DirectiveRule {
                    directives: config.directives.clone(),
                }),
                Box::new(SubstringRule {
                    substrings: config.substrings.clone(),
                }),
                Box::new(DefaultRule {
                    weight: config.default,
                }),
            ],
        }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn resolve(&self, subject: &WeightSubject<'_>) -> ResolvedWeight {
        self.rules
            .iter()
            .find_map(|rule| rule.resolve(subject))
            .unwrap_or(ResolvedWeight {
                weight: DEFAULT_WEIGHT,
                source: WeightSource::Default,
            })
    }
}

impl fmt::Debug for WeightResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightResolver")
            .field("rules", &self.rule_names())
            .finish()
    }
}
