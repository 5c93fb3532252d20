//! The evidence ledger and its JSON interchange format.
//!
//! `{ version, commit, timestamp, evidence, errors, warnings }` where
//! `evidence` is `uid -> kind -> [citation]` and the issue maps are
//! `uid -> [issue]`. Writes only append; nothing is ever overwritten.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};

use crate::citation::{ArtifactLocation, Citation, LedgerIssue};
use crate::kind::ArtifactKind;

pub const LEDGER_FORMAT_VERSION: u64 = 1;

pub type KindCitations = BTreeMap<ArtifactKind, Vec<Citation>>;

static EMPTY_EVIDENCE: KindCitations = BTreeMap::new();

/// Append-only record of generated artifacts per schema element.
///
/// Not internally synchronized: concurrent generators must serialize their
/// writes (single writer or an external mutex).
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceLedger {
    commit: String,
    timestamp: DateTime<Utc>,
    evidence: BTreeMap<String, KindCitations>,
    errors: BTreeMap<String, Vec<LedgerIssue>>,
    warnings: BTreeMap<String, Vec<LedgerIssue>>,
}

impl EvidenceLedger {
    pub fn new(commit: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            commit: commit.into(),
            timestamp,
            evidence: BTreeMap::new(),
            errors: BTreeMap::new(),
            warnings: BTreeMap::new(),
        }
    }

    pub fn commit(&self) -> &str {
        &self.commit
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Append a citation stamped with this ledger's commit and the current time.
    pub fn record(
        &mut self,
        uid: impl Into<String>,
        kind: ArtifactKind,
        location: ArtifactLocation,
    ) {
        let citation = Citation {
            file: location.file,
            line_range: location.line_range,
            commit: self.commit.clone(),
            timestamp: Utc::now(),
        };
        self.record_citation(uid, kind, citation);
    }

    /// Append a fully formed citation. The commit is kept as given, so an
    /// imported citation from another commit is preserved for verification
    /// to reject.
    pub fn record_citation(
        &mut self,
        uid: impl Into<String>,
        kind: ArtifactKind,
        citation: Citation,
    ) {
        self.evidence
            .entry(uid.into())
            .or_default()
            .entry(kind)
            .or_default()
            .push(citation);
    }

    pub fn record_error(&mut self, uid: impl Into<String>, issue: LedgerIssue) {
        self.errors.entry(uid.into()).or_default().push(issue);
    }

    pub fn record_warning(&mut self, uid: impl Into<String>, issue: LedgerIssue) {
        self.warnings.entry(uid.into()).or_default().push(issue);
    }

    /// Kind -> citations for `uid`; empty when nothing was recorded.
    pub fn evidence(&self, uid: &str) -> &KindCitations {
        self.evidence.get(uid).unwrap_or(&EMPTY_EVIDENCE)
    }

    pub fn citations(&self, uid: &str, kind: &ArtifactKind) -> &[Citation] {
        self.evidence(uid).get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_kind(&self, uid: &str, kind: &ArtifactKind) -> bool {
        !self.citations(uid, kind).is_empty()
    }

    /// True iff every kind in `kinds` has at least one citation for `uid`.
    pub fn has_artifact(&self, uid: &str, kinds: &[ArtifactKind]) -> bool {
        kinds.iter().all(|kind| self.has_kind(uid, kind))
    }

    /// Same contract as [`Self::has_artifact`], named for completeness checks.
    pub fn has_complete_artifacts(&self, uid: &str, required: &[ArtifactKind]) -> bool {
        self.has_artifact(uid, required)
    }

    pub fn errors(&self, uid: &str) -> &[LedgerIssue] {
        self.errors.get(uid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn warnings(&self, uid: &str) -> &[LedgerIssue] {
        self.warnings.get(uid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.values().map(Vec::len).sum()
    }

    /// Every artifact kind cited anywhere in the ledger.
    pub fn kinds_present(&self) -> BTreeSet<ArtifactKind> {
        self.evidence
            .values()
            .flat_map(|kinds| {
                kinds
                    .iter()
                    .filter(|(_, citations)| !citations.is_empty())
                    .map(|(kind, _)| kind.clone())
            })
            .collect()
    }

    pub fn citation_count(&self) -> usize {
        self.iter_citations().count()
    }

    /// Flattened `(uid, kind, citation)` view in deterministic order.
    pub fn iter_citations(&self) -> impl Iterator<Item = (&str, &ArtifactKind, &Citation)> {
        self.evidence.iter().flat_map(|(uid, kinds)| {
            kinds.iter().flat_map(move |(kind, citations)| {
                citations
                    .iter()
                    .map(move |citation| (uid.as_str(), kind, citation))
            })
        })
    }

    pub fn to_json(&self) -> Value {
        let evidence: Map<String, Value> = self
            .evidence
            .iter()
            .map(|(uid, kinds)| {
                let kinds: Map<String, Value> = kinds
                    .iter()
                    .map(|(kind, citations)| {
                        (
                            kind.as_str().to_string(),
                            serde_json::to_value(citations).unwrap_or(Value::Null),
                        )
                    })
                    .collect();
                (uid.clone(), Value::Object(kinds))
            })
            .collect();

        json!({
            "version": LEDGER_FORMAT_VERSION,
            "commit": self.commit,
            "timestamp": self.timestamp,
            "evidence": evidence,
            "errors": self.errors,
            "warnings": self.warnings,
        })
    }

    pub fn to_json_string(&self) -> Result<String, LedgerError> {
        serde_json::to_string_pretty(&self.to_json())
            .map_err(|e| LedgerError::Serialize(e.to_string()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self, LedgerError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| LedgerError::Parse(e.to_string()))?;
        Self::from_json(&value)
    }

    /// Restore a ledger, including errors and warnings.
    ///
    /// Structural problems inside `evidence` (non-object entries, non-array
    /// kinds, unparseable citations) count as missing evidence rather than
    /// failing the load. Citations without their own commit or timestamp
    /// inherit the bundle's.
    pub fn from_json(value: &Value) -> Result<Self, LedgerError> {
        let root = value
            .as_object()
            .ok_or_else(|| LedgerError::Parse("ledger document must be an object".to_string()))?;

        if let Some(version) = root.get("version") {
            let version = version
                .as_u64()
                .ok_or_else(|| LedgerError::Parse("version must be an integer".to_string()))?;
            if version != LEDGER_FORMAT_VERSION {
                return Err(LedgerError::UnsupportedVersion(version));
            }
        }

        let commit = root
            .get("commit")
            .and_then(Value::as_str)
            .ok_or(LedgerError::MissingField("commit"))?
            .to_string();
        let timestamp = root
            .get("timestamp")
            .ok_or(LedgerError::MissingField("timestamp"))
            .and_then(|raw| {
                serde_json::from_value::<DateTime<Utc>>(raw.clone())
                    .map_err(|e| LedgerError::Parse(format!("timestamp: {e}")))
            })?;

        let mut ledger = Self::new(commit, timestamp);

        if let Some(Value::Object(evidence)) = root.get("evidence") {
            for (uid, entry) in evidence {
                let Some(kinds) = entry.as_object() else {
                    tracing::warn!(
                        uid = %uid,
                        "evidence entry is not an object; treating as no evidence"
                    );
                    continue;
                };
                for (kind, citations) in kinds {
                    let Some(citations) = citations.as_array() else {
                        tracing::warn!(
                            uid = %uid,
                            kind = %kind,
                            "citations are not an array; skipping"
                        );
                        continue;
                    };
                    let kind = ArtifactKind::parse(kind);
                    for raw in citations {
                        match ledger.parse_citation(raw) {
                            Ok(citation) => {
                                ledger.record_citation(uid.clone(), kind.clone(), citation)
                            }
                            Err(error) => {
                                tracing::warn!(
                                    uid = %uid,
                                    kind = %kind,
                                    error = %error,
                                    "skipping malformed citation"
                                );
                            }
                        }
                    }
                }
            }
        }

        let sections = [
            ("errors", &mut ledger.errors),
            ("warnings", &mut ledger.warnings),
        ];
        for (field, target) in sections {
            let Some(Value::Object(issues)) = root.get(field) else {
                continue;
            };
            for (uid, list) in issues {
                let Some(list) = list.as_array() else {
                    continue;
                };
                for raw in list {
                    match serde_json::from_value::<LedgerIssue>(raw.clone()) {
                        Ok(issue) => target.entry(uid.clone()).or_default().push(issue),
                        Err(error) => {
                            tracing::warn!(
                                uid = %uid,
                                section = field,
                                error = %error,
                                "skipping malformed issue"
                            );
                        }
                    }
                }
            }
        }

        Ok(ledger)
    }

    fn parse_citation(&self, raw: &Value) -> Result<Citation, serde_json::Error> {
        let mut object = match raw {
            Value::Object(object) => object.clone(),
            // Bare string citations are file paths.
            Value::String(file) => {
                let mut object = Map::new();
                object.insert("file".to_string(), Value::String(file.clone()));
                object
            }
            other => return serde_json::from_value(other.clone()),
        };
        object
            .entry("commit")
            .or_insert_with(|| Value::String(self.commit.clone()));
        object
            .entry("timestamp")
            .or_insert_with(|| json!(self.timestamp));
        serde_json::from_value(Value::Object(object))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger parse error: {0}")]
    Parse(String),

    #[error("ledger is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unsupported ledger version: {0}")]
    UnsupportedVersion(u64),

    #[error("ledger serialization error: {0}")]
    Serialize(String),
}
