//! Citation and per-element issue records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Inclusive 1-based line span inside a cited file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Where an artifact was produced, as handed to [`crate::EvidenceLedger::record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    pub file: String,
    pub line_range: Option<LineRange>,
}

impl ArtifactLocation {
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line_range: None,
        }
    }

    pub fn lines(file: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            file: file.into(),
            line_range: Some(LineRange::new(start, end)),
        }
    }
}

/// One piece of evidence: artifact location plus the commit it was produced under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_range: Option<LineRange>,
    pub commit: String,
    pub timestamp: DateTime<Utc>,
}

impl Citation {
    /// `file:start-end@abcdef1`
    pub fn short_ref(&self) -> String {
        let short: String = self.commit.chars().take(7).collect();
        match self.line_range {
            Some(range) => format!("{}:{range}@{short}", self.file),
            None => format!("{}@{short}", self.file),
        }
    }
}

/// Severity of a recorded error or warning.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Info,
    #[default]
    Warning,
    Error,
}

/// A generator-reported problem attached to one schema element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerIssue {
    pub message: String,
    #[serde(rename = "type", default)]
    pub issue_type: String,
    #[serde(default)]
    pub severity: IssueSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl LedgerIssue {
    pub fn new(
        message: impl Into<String>,
        issue_type: impl Into<String>,
        severity: IssueSeverity,
    ) -> Self {
        Self {
            message: message.into(),
            issue_type: issue_type.into(),
            severity,
            context: None,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn line_range_normalizes_order() {
        let range = LineRange::new(12, 4);
        assert_eq!((range.start, range.end), (4, 12));
        assert_eq!(range.to_string(), "4-12");
        assert_eq!(LineRange::new(7, 7).to_string(), "7");
    }

    #[test]
    fn short_ref_truncates_commit() {
        let citation = Citation {
            file: "db/schema.sql".to_string(),
            line_range: Some(LineRange::new(10, 14)),
            commit: "0123456789abcdef".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        };
        assert_eq!(citation.short_ref(), "db/schema.sql:10-14@0123456");
    }
}
