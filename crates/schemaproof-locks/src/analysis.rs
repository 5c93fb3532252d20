//! Batch aggregation over a migration's statements.

use schemaproof_kernel::MigrationStep;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use crate::classify::{ClassifyHint, LockImpactClassifier, MigrationOperation, OperationType, RiskLevel};

/// Above this total the migration should be split.
pub const BATCHING_THRESHOLD_MS: u64 = 5 * 60 * 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationSummary {
    pub total_operations: usize,
    pub risk_distribution: BTreeMap<RiskLevel, usize>,
    pub total_duration_ms: u64,
    pub affected_tables: BTreeSet<String>,
    /// Indices into `operations` of statements whose lock blocks reads or writes.
    pub blocking_operations: Vec<usize>,
    pub risk_score: u64,
    pub overall_risk: RiskLevel,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationAnalysis {
    pub operations: Vec<MigrationOperation>,
    pub summary: MigrationSummary,
}

/// Split a script on `;`.
///
/// Separators inside quoted strings, dollar-quoted bodies (`$$ .. $$`,
/// `$tag$ .. $tag$`) and comments do not split. Comments are dropped.
pub fn split_statements(script: &str) -> Vec<String> {
    let chars: Vec<char> = script.chars().collect();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '\'' | '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&c| c == ch)
                    .map_or(chars.len(), |offset| i + offset + 2);
                current.extend(&chars[i..end]);
                i = end;
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                // Keep the newline so the next token stays separated.
                i = chars[i..]
                    .iter()
                    .position(|&c| c == '\n')
                    .map_or(chars.len(), |offset| i + offset);
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i = block_comment_end(&chars, i);
                current.push(' ');
            }
            '$' => match dollar_tag_len(&chars, i) {
                Some(len) => {
                    let tag = &chars[i..i + len];
                    let end = find_tag(&chars, i + len, tag).map_or(chars.len(), |at| at + len);
                    current.extend(&chars[i..end]);
                    i = end;
                }
                None => {
                    current.push(ch);
                    i += 1;
                }
            },
            ';' => {
                push_statement(&mut statements, &current);
                current.clear();
                i += 1;
            }
            _ => {
                current.push(ch);
                i += 1;
            }
        }
    }
    push_statement(&mut statements, &current);
    statements
}

/// Index just past the `*/` closing the comment opened at `start`. Block
/// comments nest.
fn block_comment_end(chars: &[char], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i + 1 < chars.len() {
        match (chars[i], chars[i + 1]) {
            ('/', '*') => {
                depth += 1;
                i += 2;
            }
            ('*', '/') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    chars.len()
}

/// Length of the dollar-quote opener (`$$` or `$tag$`) at `start`, if any.
/// `$1` placeholders and identifiers containing `$` are not openers.
fn dollar_tag_len(chars: &[char], start: usize) -> Option<usize> {
    if start > 0 {
        let prev = chars[start - 1];
        if prev.is_alphanumeric() || prev == '_' {
            return None;
        }
    }
    let first = *chars.get(start + 1)?;
    if first == '$' {
        return Some(2);
    }
    if !(first.is_alphabetic() || first == '_') {
        return None;
    }
    let mut i = start + 2;
    while let Some(&c) = chars.get(i) {
        if c == '$' {
            return Some(i - start + 1);
        }
        if !(c.is_alphanumeric() || c == '_') {
            return None;
        }
        i += 1;
    }
    None
}

fn find_tag(chars: &[char], from: usize, tag: &[char]) -> Option<usize> {
    if from > chars.len() || tag.len() > chars.len() - from {
        return None;
    }
    (from..=chars.len() - tag.len()).find(|&at| chars[at..at + tag.len()] == *tag)
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}

fn recommendations(operations: &[MigrationOperation], blocking: usize, total_ms: u64) -> Vec<String> {
    let mut out = Vec::new();
    if blocking > 0 {
        out.push(format!(
            "Schedule the {blocking} blocking operation(s) in a low-traffic maintenance window."
        ));
    }
    if operations
        .iter()
        .any(|op| op.operation_type == OperationType::CreateIndex)
    {
        out.push(
            "Use CREATE INDEX CONCURRENTLY so the index builds without blocking writes."
                .to_string(),
        );
    }
    if operations
        .iter()
        .any(|op| op.operation_type == OperationType::AddConstraint)
    {
        out.push(
            "Add constraints as NOT VALID, then VALIDATE CONSTRAINT in a separate transaction."
                .to_string(),
        );
    }
    if total_ms > BATCHING_THRESHOLD_MS {
        out.push(format!(
            "Estimated duration {} exceeds 5 minutes; split the migration into smaller batches.",
            format_duration(total_ms)
        ));
    }
    out
}

fn summarize(operations: &[MigrationOperation]) -> MigrationSummary {
    let mut risk_distribution: BTreeMap<RiskLevel, usize> =
        RiskLevel::ALL.into_iter().map(|level| (level, 0)).collect();
    let mut affected_tables = BTreeSet::new();
    let mut blocking_operations = Vec::new();
    let mut total_duration_ms: u64 = 0;
    let mut risk_score: u64 = 0;

    for (index, op) in operations.iter().enumerate() {
        *risk_distribution.entry(op.risk_level).or_default() += 1;
        affected_tables.extend(op.affected_tables.iter().cloned());
        if op.is_blocking() {
            blocking_operations.push(index);
        }
        total_duration_ms = total_duration_ms.saturating_add(op.estimated_duration_ms);
        risk_score += op.risk_level.tier_points();
    }

    MigrationSummary {
        total_operations: operations.len(),
        recommendations: recommendations(operations, blocking_operations.len(), total_duration_ms),
        risk_distribution,
        total_duration_ms,
        affected_tables,
        blocking_operations,
        risk_score,
        overall_risk: RiskLevel::from_score(risk_score),
    }
}

impl LockImpactClassifier {
    pub fn analyze<S: AsRef<str>>(&self, statements: &[S], hint: ClassifyHint) -> MigrationAnalysis {
        let operations: Vec<MigrationOperation> = statements
            .iter()
            .map(|sql| self.classify(sql.as_ref(), hint))
            .collect();
        let summary = summarize(&operations);
        tracing::debug!(
            operations = summary.total_operations,
            blocking = summary.blocking_operations.len(),
            risk = %summary.overall_risk,
            "analyzed migration"
        );
        MigrationAnalysis {
            operations,
            summary,
        }
    }

    /// Analyze the SQL rendered for each step. Steps without SQL are skipped.
    pub fn analyze_steps(&self, steps: &[MigrationStep], hint: ClassifyHint) -> MigrationAnalysis {
        let statements: Vec<&str> = steps.iter().filter_map(|step| step.sql.as_deref()).collect();
        self.analyze(&statements, hint)
    }
}

fn format_duration(ms: u64) -> String {
    if ms >= 60_000 {
        format!("{:.1}min", ms as f64 / 60_000.0)
    } else if ms >= 1_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else {
        format!("{ms}ms")
    }
}

fn join_tables(tables: &BTreeSet<String>) -> String {
    if tables.is_empty() {
        "-".to_string()
    } else {
        tables.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

impl MigrationAnalysis {
    /// PASS when no statement rates HIGH or CRITICAL.
    pub fn passes(&self) -> bool {
        self.operations
            .iter()
            .all(|op| op.risk_level < RiskLevel::High)
    }

    pub fn render_narrative(&self) -> String {
        let summary = &self.summary;
        let mut out = String::new();
        let _ = writeln!(out, "Migration lock analysis");
        let _ = writeln!(
            out,
            "Operations: {}  Overall risk: {} (score {})",
            summary.total_operations, summary.overall_risk, summary.risk_score
        );
        let _ = writeln!(
            out,
            "Estimated duration: {}",
            format_duration(summary.total_duration_ms)
        );
        let _ = writeln!(out, "Affected tables: {}", join_tables(&summary.affected_tables));

        for (index, op) in self.operations.iter().enumerate() {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "[{}] {}  lock={}  risk={}  ~{}",
                index + 1,
                op.operation_type,
                op.lock_level,
                op.risk_level,
                format_duration(op.estimated_duration_ms)
            );
            let _ = writeln!(out, "    tables: {}", join_tables(&op.affected_tables));
            let _ = writeln!(out, "    {}", op.lock_level.description());
            let _ = writeln!(out, "    {}", op.statement);
        }

        if !summary.blocking_operations.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Blocking operations:");
            for index in &summary.blocking_operations {
                let Some(op) = self.operations.get(*index) else {
                    continue;
                };
                let blocks = if op.lock_level.blocks_reads() {
                    "reads and writes"
                } else {
                    "writes"
                };
                let _ = writeln!(
                    out,
                    "  [{}] {} on {} blocks {}",
                    index + 1,
                    op.operation_type,
                    join_tables(&op.affected_tables),
                    blocks
                );
            }
        }

        if !summary.recommendations.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Recommendations:");
            for rec in &summary.recommendations {
                let _ = writeln!(out, "  - {rec}");
            }
        }

        let _ = writeln!(out);
        if self.passes() && summary.overall_risk < RiskLevel::High {
            let _ = writeln!(out, "PASS: no high-risk lock operations");
        } else if self.passes() {
            let _ = writeln!(
                out,
                "CAUTION: no single high-risk lock operation, but combined risk is {} (score {})",
                summary.overall_risk, summary.risk_score
            );
        } else {
            let high = self
                .operations
                .iter()
                .filter(|op| op.risk_level >= RiskLevel::High)
                .count();
            let _ = writeln!(
                out,
                "WARN: {high} high-risk lock operation(s); overall risk {}",
                summary.overall_risk
            );
        }
        out
    }
}
