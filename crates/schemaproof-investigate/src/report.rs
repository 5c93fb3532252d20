use chrono::{DateTime, SecondsFormat, Utc};
use schemaproof_kernel::scoring::rollup;
use schemaproof_kernel::{
    KernelError, Readiness, SchemaIr, ScoreReport, WeightConfig, WeightResolver, report_digest,
    weigh,
};
use schemaproof_ledger::{ArtifactKind, EvidenceLedger};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::gates::{Gate, migration_risk_gate, sensitive_fields_gate, test_coverage_gate};
use crate::row::{ElementRow, ElementStatus, element_row};

pub const INVESTIGATION_REPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct InvestigateOptions {
    pub timestamp: Option<DateTime<Utc>>,
    pub required_kinds: Vec<ArtifactKind>,
}

impl Default for InvestigateOptions {
    fn default() -> Self {
        Self {
            timestamp: None,
            required_kinds: vec![ArtifactKind::Sql, ArtifactKind::Test],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationMetadata {
    /// Share of weight whose element has every required artifact kind.
    pub weighted_completion: f64,
    pub earned_weight: u64,
    pub total_weight: u64,
    /// Blended SCS as reported by the scoring engine.
    pub scs: f64,
    pub tci: f64,
    pub mri: f64,
    pub citation_count: usize,
    pub element_count: usize,
    pub required_kinds: Vec<ArtifactKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationReport {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub commit: String,
    pub metadata: InvestigationMetadata,
    /// Sorted by UID.
    pub rows: Vec<ElementRow>,
    pub gates: Vec<Gate>,
    pub readiness: Readiness,
    pub score_digest: String,
    pub digest: String,
}

pub fn investigate(
    schema: &SchemaIr,
    ledger: &EvidenceLedger,
    scores: &ScoreReport,
    weights: &WeightConfig,
    options: &InvestigateOptions,
) -> Result<InvestigationReport, KernelError> {
    let resolver = WeightResolver::new(weights);
    let elements = weigh(schema.scored_fields(), &resolver);
    let completion = rollup(&elements, ledger, &options.required_kinds);

    let mut rows: Vec<ElementRow> = elements
        .iter()
        .map(|item| element_row(item, ledger))
        .collect();
    rows.sort_by(|a, b| a.uid.cmp(&b.uid));

    let gates = vec![
        migration_risk_gate(scores.scores.mri),
        test_coverage_gate(scores.scores.tci),
        sensitive_fields_gate(&elements, ledger),
    ];

    tracing::debug!(
        elements = rows.len(),
        completion = completion.score,
        "investigated schema"
    );

    let mut report = InvestigationReport {
        version: INVESTIGATION_REPORT_VERSION,
        timestamp: options.timestamp.unwrap_or(scores.timestamp),
        commit: ledger.commit().to_string(),
        metadata: InvestigationMetadata {
            weighted_completion: completion.score,
            earned_weight: completion.earned,
            total_weight: completion.total,
            scs: scores.scores.scs,
            tci: scores.scores.tci,
            mri: scores.scores.mri,
            citation_count: ledger.citation_count(),
            element_count: rows.len(),
            required_kinds: options.required_kinds.clone(),
        },
        rows,
        gates,
        readiness: scores.readiness.clone(),
        score_digest: scores.digest.clone(),
        digest: String::new(),
    };
    report.digest = report_digest(&report)?;
    Ok(report)
}

fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

impl InvestigationReport {
    pub fn status_count(&self, status: ElementStatus) -> usize {
        self.rows.iter().filter(|row| row.status == status).count()
    }

    pub fn render_narrative(&self) -> String {
        let meta = &self.metadata;
        let short: String = self.commit.chars().take(7).collect();
        let mut out = String::new();
        let _ = writeln!(out, "Investigation of commit {short}");
        let _ = writeln!(
            out,
            "Recorded {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Weighted completion: {} ({}/{} weight)",
            percent(meta.weighted_completion),
            meta.earned_weight,
            meta.total_weight
        );
        let _ = writeln!(
            out,
            "SCS {:.3}  TCI {:.3}  MRI {:.3}  citations {}  elements {}",
            meta.scs, meta.tci, meta.mri, meta.citation_count, meta.element_count
        );
        let _ = writeln!(
            out,
            "complete {}  SQL only {}  tests only {}  missing {}",
            self.status_count(ElementStatus::Complete),
            self.status_count(ElementStatus::SqlOnly),
            self.status_count(ElementStatus::TestsOnly),
            self.status_count(ElementStatus::Missing)
        );

        let _ = writeln!(out);
        let _ = writeln!(out, "Elements:");
        for row in &self.rows {
            let _ = writeln!(
                out,
                "  {:<32} {:>4}  {:<20} {:<10}  {:<16} {}",
                row.uid,
                row.weight,
                row.source,
                row.status.as_str(),
                row.deduction,
                row.citations
            );
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Gates:");
        for gate in &self.gates {
            let _ = writeln!(out, "  [{}] {}: {}", gate.status, gate.name, gate.detail);
            for offender in &gate.offenders {
                let _ = writeln!(out, "         - {offender}");
            }
        }

        let _ = writeln!(out);
        let readiness = if self.readiness.ready {
            "ready"
        } else {
            "not ready"
        };
        let _ = writeln!(out, "Verdict: {} ({readiness})", self.readiness.verdict);
        out
    }
}
