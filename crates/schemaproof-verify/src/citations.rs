//! Citation verification against version control and the working tree.

use rayon::prelude::*;
use schemaproof_git::{ObjectStore, WorkingTree};
use schemaproof_ledger::{ArtifactKind, Citation, EvidenceLedger};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationStatus {
    Verified,
    Unverified,
    Failed,
}

impl fmt::Display for CitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Verified => "verified",
            Self::Unverified => "unverified",
            Self::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationCheck {
    pub uid: String,
    pub kind: ArtifactKind,
    pub citation: String,
    pub status: CitationStatus,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CitationTally {
    pub total: usize,
    pub verified: usize,
    pub unverified: usize,
    pub failed: usize,
    /// `verified / total`, 0 when nothing was cited.
    pub rate: f64,
}

impl CitationTally {
    pub fn from_checks(checks: &[CitationCheck]) -> Self {
        let count = |status: CitationStatus| checks.iter().filter(|c| c.status == status).count();
        let verified = count(CitationStatus::Verified);
        let unverified = count(CitationStatus::Unverified);
        let failed = count(CitationStatus::Failed);
        let total = verified + unverified + failed;
        Self {
            total,
            verified,
            unverified,
            failed,
            rate: if total == 0 {
                0.0
            } else {
                verified as f64 / total as f64
            },
        }
    }
}

/// Classify one citation. Lookup problems degrade to `failed`.
pub fn check_citation<S, W>(
    store: &S,
    tree: &W,
    bundle_commit: &str,
    citation: &Citation,
) -> (CitationStatus, String)
where
    S: ObjectStore + ?Sized,
    W: WorkingTree + ?Sized,
{
    if citation.commit != bundle_commit {
        return (
            CitationStatus::Failed,
            format!("commit {} does not match bundle {bundle_commit}", citation.commit),
        );
    }
    let historical = match store.file_at(&citation.commit, &citation.file) {
        Ok(Some(content)) => content,
        Ok(None) => {
            return (
                CitationStatus::Failed,
                format!("{} not found at {}", citation.file, citation.commit),
            );
        }
        Err(err) => return (CitationStatus::Failed, format!("lookup failed: {err}")),
    };
    match tree.read_file(&citation.file) {
        Ok(Some(local)) if local == historical => {
            (CitationStatus::Verified, "matches working tree".to_string())
        }
        Ok(Some(_)) => (
            CitationStatus::Failed,
            "working tree differs from cited commit".to_string(),
        ),
        Ok(None) => (
            CitationStatus::Unverified,
            "absent from working tree; historical content trusted".to_string(),
        ),
        Err(err) => (
            CitationStatus::Failed,
            format!("unreadable in working tree: {err}"),
        ),
    }
}

/// Check every citation in the ledger in parallel, preserving ledger order.
pub fn check_citations<S, W>(store: &S, tree: &W, ledger: &EvidenceLedger) -> Vec<CitationCheck>
where
    S: ObjectStore + ?Sized,
    W: WorkingTree + ?Sized,
{
    let commit = ledger.commit();
    let cited: Vec<(&str, &ArtifactKind, &Citation)> = ledger.iter_citations().collect();
    cited
        .par_iter()
        .map(|(uid, kind, citation)| {
            let (status, reason) = check_citation(store, tree, commit, citation);
            if status == CitationStatus::Failed {
                tracing::warn!(uid, file = %citation.file, reason = %reason, "citation failed verification");
            }
            CitationCheck {
                uid: uid.to_string(),
                kind: (*kind).clone(),
                citation: citation.short_ref(),
                status,
                reason,
            }
        })
        .collect()
}
