//! Per-statement classification: operation type, affected tables, lock,
//! risk and duration estimate.

use moka::sync::Cache;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use crate::lock::LockLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    CreateTable,
    DropTable,
    AddColumn,
    DropColumn,
    AlterColumn,
    AddConstraint,
    DropConstraint,
    AlterTable,
    CreateIndex,
    CreateIndexConcurrent,
    DropIndex,
    Reindex,
    Create,
    Drop,
    Insert,
    Update,
    Delete,
    Unknown,
}

impl OperationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateTable => "CREATE_TABLE",
            Self::DropTable => "DROP_TABLE",
            Self::AddColumn => "ADD_COLUMN",
            Self::DropColumn => "DROP_COLUMN",
            Self::AlterColumn => "ALTER_COLUMN",
            Self::AddConstraint => "ADD_CONSTRAINT",
            Self::DropConstraint => "DROP_CONSTRAINT",
            Self::AlterTable => "ALTER_TABLE",
            Self::CreateIndex => "CREATE_INDEX",
            Self::CreateIndexConcurrent => "CREATE_INDEX_CONCURRENT",
            Self::DropIndex => "DROP_INDEX",
            Self::Reindex => "REINDEX",
            Self::Create => "CREATE",
            Self::Drop => "DROP",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Baseline duration on a small table, in milliseconds.
    pub fn base_duration_ms(self) -> u64 {
        match self {
            Self::CreateTable => 100,
            Self::DropTable => 500,
            Self::AddColumn => 1_000,
            Self::DropColumn => 10_000,
            Self::AlterColumn => 30_000,
            Self::AddConstraint => 5_000,
            Self::DropConstraint => 500,
            Self::AlterTable => 1_000,
            Self::CreateIndex => 60_000,
            Self::CreateIndexConcurrent => 120_000,
            Self::DropIndex => 500,
            Self::Reindex => 60_000,
            Self::Create => 100,
            Self::Drop => 500,
            Self::Insert => 100,
            Self::Update => 5_000,
            Self::Delete => 5_000,
            Self::Unknown => 1_000,
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Contribution to the batch risk score.
    pub fn tier_points(self) -> u64 {
        match self {
            Self::Low => 5,
            Self::Medium => 25,
            Self::High => 50,
            Self::Critical => 100,
        }
    }

    pub fn from_score(score: u64) -> Self {
        match score {
            s if s >= 100 => Self::Critical,
            s if s >= 50 => Self::High,
            s if s >= 25 => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write-blocking locks at or above this severity rate HIGH.
pub const HIGH_RISK_WRITE_SEVERITY: u8 = 7;

fn normalize(sql: &str) -> String {
    sql.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}

pub fn classify_operation_type(sql: &str) -> OperationType {
    let stmt = normalize(sql);
    if stmt.starts_with("CREATE TABLE") {
        return OperationType::CreateTable;
    }
    if stmt.starts_with("DROP TABLE") {
        return OperationType::DropTable;
    }
    if stmt.starts_with("ALTER TABLE") {
        let alters = [
            ("ADD COLUMN", OperationType::AddColumn),
            ("DROP COLUMN", OperationType::DropColumn),
            ("ALTER COLUMN", OperationType::AlterColumn),
            ("ADD CONSTRAINT", OperationType::AddConstraint),
            ("DROP CONSTRAINT", OperationType::DropConstraint),
        ];
        return alters
            .into_iter()
            .find(|(needle, _)| stmt.contains(needle))
            .map_or(OperationType::AlterTable, |(_, op)| op);
    }
    if stmt.starts_with("CREATE INDEX") || stmt.starts_with("CREATE UNIQUE INDEX") {
        return if stmt.contains(" INDEX CONCURRENTLY") {
            OperationType::CreateIndexConcurrent
        } else {
            OperationType::CreateIndex
        };
    }
    if stmt.starts_with("DROP INDEX") {
        return OperationType::DropIndex;
    }
    if stmt.starts_with("REINDEX") {
        return OperationType::Reindex;
    }
    if stmt.starts_with("CREATE") {
        return OperationType::Create;
    }
    if stmt.starts_with("DROP") {
        return OperationType::Drop;
    }
    if stmt.starts_with("INSERT") {
        return OperationType::Insert;
    }
    if stmt.starts_with("UPDATE") {
        return OperationType::Update;
    }
    if stmt.starts_with("DELETE") {
        return OperationType::Delete;
    }
    OperationType::Unknown
}

fn table_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)\b(?:FROM|JOIN|UPDATE|INTO|TABLE|ON)\s+(?:IF\s+(?:NOT\s+)?EXISTS\s+)?(?:ONLY\s+)?("?[A-Za-z_][\w$]*"?(?:\."?[A-Za-z_][\w$]*"?)?)"#,
        )
        .expect("table reference regex must compile")
    })
}

/// Words that can follow a table-introducing keyword without naming a table.
const SQL_KEYWORDS: &[&str] = &[
    "select", "where", "set", "values", "default", "table", "only", "if", "not", "exists",
    "delete", "update", "cascade", "restrict", "null", "conflict", "lateral", "column",
    "constraint", "index", "concurrently", "using", "as", "and", "or", "true", "false",
];

pub fn extract_affected_tables(sql: &str) -> BTreeSet<String> {
    table_ref_re()
        .captures_iter(sql)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().replace('"', "").to_ascii_lowercase())
        .filter(|name| !SQL_KEYWORDS.contains(&name.as_str()))
        .collect()
}

pub fn lock_level_for(op: OperationType, sql: &str) -> LockLevel {
    match op {
        OperationType::AddColumn => {
            let stmt = normalize(sql);
            if stmt.contains("NOT NULL") && stmt.contains("DEFAULT") {
                LockLevel::AccessExclusive
            } else {
                LockLevel::ShareRowExclusive
            }
        }
        OperationType::AddConstraint => {
            if normalize(sql).contains("NOT VALID") {
                LockLevel::ShareRowExclusive
            } else {
                LockLevel::AccessExclusive
            }
        }
        OperationType::CreateTable => LockLevel::RowExclusive,
        OperationType::Create => LockLevel::AccessShare,
        OperationType::CreateIndex => LockLevel::Share,
        OperationType::CreateIndexConcurrent => LockLevel::ShareUpdateExclusive,
        OperationType::Insert | OperationType::Update | OperationType::Delete => {
            LockLevel::RowExclusive
        }
        OperationType::DropTable
        | OperationType::DropColumn
        | OperationType::AlterColumn
        | OperationType::DropConstraint
        | OperationType::AlterTable
        | OperationType::DropIndex
        | OperationType::Reindex
        | OperationType::Drop
        | OperationType::Unknown => LockLevel::AccessExclusive,
    }
}

pub fn risk_level_for(op: OperationType, lock: LockLevel) -> RiskLevel {
    match op {
        OperationType::DropTable | OperationType::Reindex | OperationType::AlterColumn => {
            RiskLevel::Critical
        }
        _ if lock.blocks_reads() => RiskLevel::High,
        _ if lock.blocks_writes() && lock.severity() >= HIGH_RISK_WRITE_SEVERITY => {
            RiskLevel::High
        }
        _ if lock.blocks_writes() => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

pub fn estimate_duration_ms(op: OperationType, estimated_rows: Option<u64>) -> u64 {
    let base = op.base_duration_ms();
    let factor = match estimated_rows {
        Some(rows) if rows > 1_000_000 => 10.0,
        Some(rows) if rows > 100_000 => 3.0,
        Some(rows) if rows > 10_000 => 1.5,
        _ => 1.0,
    };
    (base as f64 * factor).round() as u64
}

/// Optional context for a statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ClassifyHint {
    pub estimated_rows: Option<u64>,
}

impl ClassifyHint {
    pub fn rows(rows: u64) -> Self {
        Self {
            estimated_rows: Some(rows),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationOperation {
    pub statement: String,
    pub operation_type: OperationType,
    pub affected_tables: BTreeSet<String>,
    pub lock_level: LockLevel,
    pub risk_level: RiskLevel,
    pub estimated_duration_ms: u64,
}

impl MigrationOperation {
    pub fn is_blocking(&self) -> bool {
        self.lock_level.blocks_anything()
    }
}

pub fn classify(sql: &str, hint: ClassifyHint) -> MigrationOperation {
    let operation_type = classify_operation_type(sql);
    let lock_level = lock_level_for(operation_type, sql);
    let risk_level = risk_level_for(operation_type, lock_level);
    let operation = MigrationOperation {
        statement: sql.trim().to_string(),
        operation_type,
        affected_tables: extract_affected_tables(sql),
        lock_level,
        risk_level,
        estimated_duration_ms: estimate_duration_ms(operation_type, hint.estimated_rows),
    };
    tracing::debug!(
        op = %operation.operation_type,
        lock = %operation.lock_level,
        risk = %operation.risk_level,
        tables = operation.affected_tables.len(),
        "classified statement"
    );
    operation
}

/// Classifier with an optional memo of previously seen statements.
pub struct LockImpactClassifier {
    cache: Option<Cache<(String, Option<u64>), MigrationOperation>>,
}

impl LockImpactClassifier {
    pub fn new() -> Self {
        Self { cache: None }
    }

    pub fn with_cache(capacity: u64) -> Self {
        Self {
            cache: Some(Cache::new(capacity)),
        }
    }

    pub fn classify(&self, sql: &str, hint: ClassifyHint) -> MigrationOperation {
        let Some(cache) = &self.cache else {
            return classify(sql, hint);
        };
        let key = (sql.trim().to_string(), hint.estimated_rows);
        cache.get_with(key, || classify(sql, hint))
    }
}

impl Default for LockImpactClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LockImpactClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockImpactClassifier")
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_column_is_share_row_exclusive_medium() {
        let op = classify("ALTER TABLE users ADD COLUMN nickname text", ClassifyHint::default());
        assert_eq!(op.operation_type, OperationType::AddColumn);
        assert_eq!(op.lock_level, LockLevel::ShareRowExclusive);
        assert_eq!(op.risk_level, RiskLevel::Medium);
        assert_eq!(op.affected_tables, BTreeSet::from(["users".to_string()]));
    }

    #[test]
    fn add_column_not_null_default_takes_access_exclusive() {
        let op = classify(
            "alter table users add column active boolean not null default true",
            ClassifyHint::default(),
        );
        assert_eq!(op.lock_level, LockLevel::AccessExclusive);
        assert_eq!(op.risk_level, RiskLevel::High);
    }

    #[test]
    fn drop_table_is_critical() {
        let op = classify("DROP TABLE IF EXISTS sessions;", ClassifyHint::default());
        assert_eq!(op.operation_type, OperationType::DropTable);
        assert_eq!(op.lock_level, LockLevel::AccessExclusive);
        assert_eq!(op.risk_level, RiskLevel::Critical);
        assert_eq!(op.affected_tables, BTreeSet::from(["sessions".to_string()]));
    }

    #[test]
    fn concurrent_index_is_recognised_before_plain_index() {
        let op = classify(
            "CREATE INDEX CONCURRENTLY idx_users_email ON users (email)",
            ClassifyHint::default(),
        );
        assert_eq!(op.operation_type, OperationType::CreateIndexConcurrent);
        assert_eq!(op.lock_level, LockLevel::ShareUpdateExclusive);
        assert_eq!(op.risk_level, RiskLevel::Medium);
        assert_eq!(op.affected_tables, BTreeSet::from(["users".to_string()]));

        let unique = classify_operation_type("create unique index concurrently u on t (a)");
        assert_eq!(unique, OperationType::CreateIndexConcurrent);
        assert_eq!(
            classify_operation_type("CREATE INDEX idx ON users (email)"),
            OperationType::CreateIndex
        );
    }

    #[test]
    fn plain_index_is_share_medium() {
        // SHARE (5) blocks writes but sits below the write-block HIGH threshold.
        let op = classify("CREATE INDEX idx_users_email ON users (email)", ClassifyHint::default());
        assert_eq!(op.operation_type, OperationType::CreateIndex);
        assert_eq!(op.lock_level, LockLevel::Share);
        assert!(op.lock_level.blocks_writes());
        assert!(op.lock_level.severity() < HIGH_RISK_WRITE_SEVERITY);
        assert_eq!(op.risk_level, RiskLevel::Medium);

        let unique = classify("CREATE UNIQUE INDEX u ON users (email)", ClassifyHint::default());
        assert_eq!(unique.lock_level, LockLevel::Share);
        assert_eq!(unique.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn constraint_not_valid_is_weaker() {
        let sql = "ALTER TABLE posts ADD CONSTRAINT fk_author FOREIGN KEY (author_id) REFERENCES users (id) NOT VALID";
        assert_eq!(classify_operation_type(sql), OperationType::AddConstraint);
        assert_eq!(lock_level_for(OperationType::AddConstraint, sql), LockLevel::ShareRowExclusive);
        let strict = sql.trim_end_matches(" NOT VALID");
        assert_eq!(lock_level_for(OperationType::AddConstraint, strict), LockLevel::AccessExclusive);
    }

    #[test]
    fn unknown_is_conservative() {
        let op = classify("VACUUM FULL users", ClassifyHint::default());
        assert_eq!(op.operation_type, OperationType::Unknown);
        assert_eq!(op.lock_level, LockLevel::AccessExclusive);
        assert_eq!(op.risk_level, RiskLevel::High);
    }

    #[test]
    fn dml_and_joins_collect_every_table() {
        let tables = extract_affected_tables(
            r#"UPDATE "Orders" SET total = 0 FROM public.customers c JOIN regions r USING (region_id)"#,
        );
        let expected: BTreeSet<String> = ["orders", "public.customers", "regions"]
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(tables, expected);
    }

    #[test]
    fn keywords_are_not_tables() {
        let tables = extract_affected_tables(
            "ALTER TABLE ONLY posts ADD CONSTRAINT fk FOREIGN KEY (a) REFERENCES users (id) ON DELETE CASCADE",
        );
        assert_eq!(tables, BTreeSet::from(["posts".to_string()]));
    }

    #[test]
    fn duration_scales_with_rows() {
        let op = OperationType::DropColumn;
        assert_eq!(estimate_duration_ms(op, None), 10_000);
        assert_eq!(estimate_duration_ms(op, Some(10_000)), 10_000);
        assert_eq!(estimate_duration_ms(op, Some(10_001)), 15_000);
        assert_eq!(estimate_duration_ms(op, Some(200_000)), 30_000);
        assert_eq!(estimate_duration_ms(op, Some(5_000_000)), 100_000);
    }

    #[test]
    fn cached_classifier_matches_uncached() {
        let classifier = LockImpactClassifier::with_cache(16);
        let sql = "CREATE TABLE audit (id bigint)";
        let first = classifier.classify(sql, ClassifyHint::rows(50_000));
        let second = classifier.classify(sql, ClassifyHint::rows(50_000));
        assert_eq!(first, second);
        assert_eq!(first, classify(sql, ClassifyHint::rows(50_000)));
        assert_eq!(first.estimated_duration_ms, 150);
        assert_eq!(first.risk_level, RiskLevel::Low);
    }
}
