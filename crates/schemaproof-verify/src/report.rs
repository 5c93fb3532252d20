use chrono::{DateTime, SecondsFormat, Utc};
use schemaproof_git::{ObjectStore, WorkingTree};
use schemaproof_investigate::InvestigationReport;
use schemaproof_kernel::{KernelError, SchemaIr, WeightConfig, report_digest};
use schemaproof_ledger::EvidenceLedger;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

use crate::arithmetic::{ArithmeticCheck, Discrepancy, cross_check};
use crate::citations::{CitationCheck, CitationStatus, CitationTally, check_citations};
use crate::consistency::{ConsistencyFlag, consistency_flags};

pub const VERIFICATION_REPORT_VERSION: u32 = 1;

/// Verification rate needed for a clean opinion.
pub const PASSING_RATE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opinion {
    #[serde(rename = "PASSED")]
    Passed,
    #[serde(rename = "CONCERNS NOTED")]
    ConcernsNoted,
}

impl Opinion {
    pub fn from_findings(rate: f64, flags: usize) -> Self {
        if rate >= PASSING_RATE && flags == 0 {
            Self::Passed
        } else {
            Self::ConcernsNoted
        }
    }
}

impl fmt::Display for Opinion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Passed => "PASSED",
            Self::ConcernsNoted => "CONCERNS NOTED",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub commit: String,
    pub investigation_digest: String,
    pub citations: CitationTally,
    pub checks: Vec<CitationCheck>,
    pub arithmetic: ArithmeticCheck,
    pub flags: Vec<ConsistencyFlag>,
    pub opinion: Opinion,
    pub digest: String,
}

/// Re-derives findings from the raw ledger instead of trusting the
/// investigation's own numbers.
pub struct Verifier<S, W> {
    store: S,
    tree: W,
}

impl<S: ObjectStore, W: WorkingTree> Verifier<S, W> {
    pub fn new(store: S, tree: W) -> Self {
        Self { store, tree }
    }

    pub fn verify(
        &self,
        schema: &SchemaIr,
        ledger: &EvidenceLedger,
        report: &InvestigationReport,
        weights: &WeightConfig,
    ) -> Result<VerificationReport, KernelError> {
        let checks = check_citations(&self.store, &self.tree, ledger);
        let citations = CitationTally::from_checks(&checks);
        let meta = &report.metadata;
        let arithmetic = cross_check(meta.weighted_completion, schema, ledger, weights);
        let flags = consistency_flags(meta.scs, meta.tci, meta.mri, schema, ledger);
        let opinion = Opinion::from_findings(citations.rate, flags.len());

        tracing::debug!(
            total = citations.total,
            verified = citations.verified,
            failed = citations.failed,
            flags = flags.len(),
            opinion = %opinion,
            "verified investigation"
        );

        let mut verification = VerificationReport {
            version: VERIFICATION_REPORT_VERSION,
            timestamp: report.timestamp,
            commit: ledger.commit().to_string(),
            investigation_digest: report.digest.clone(),
            citations,
            checks,
            arithmetic,
            flags,
            opinion,
            digest: String::new(),
        };
        verification.digest = report_digest(&verification)?;
        Ok(verification)
    }
}

impl VerificationReport {
    pub fn render_narrative(&self) -> String {
        let tally = &self.citations;
        let short: String = self.commit.chars().take(7).collect();
        let mut out = String::new();
        let _ = writeln!(out, "Verification of commit {short}");
        let _ = writeln!(
            out,
            "Recorded {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Citations: {} total, {} verified, {} unverified, {} failed (rate {:.1}%)",
            tally.total,
            tally.verified,
            tally.unverified,
            tally.failed,
            tally.rate * 100.0
        );
        for check in self
            .checks
            .iter()
            .filter(|check| check.status != CitationStatus::Verified)
        {
            let _ = writeln!(
                out,
                "  [{}] {} {} ({})",
                check.status, check.uid, check.citation, check.reason
            );
        }

        let arithmetic = &self.arithmetic;
        let label = match arithmetic.discrepancy {
            Discrepancy::Acceptable => "acceptable",
            Discrepancy::Significant => "significant",
        };
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Arithmetic: reported {:.4}, approximate {:.4}, difference {:.4} ({label})",
            arithmetic.reported, arithmetic.approximate, arithmetic.difference
        );

        let _ = writeln!(out);
        if self.flags.is_empty() {
            let _ = writeln!(out, "Consistency: no flags");
        } else {
            let _ = writeln!(out, "Consistency flags:");
            for flag in &self.flags {
                let _ = writeln!(out, "  - {}", flag.message);
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Opinion: {}", self.opinion);
        out
    }
}
