//! # schemaproof-locks
//!
//! Classifies each migration statement by the PostgreSQL lock it takes and
//! what that means for live traffic, then aggregates a migration-wide
//! summary with recommendations.
//!
//! ```text
//! statement ─▶ OperationType ─▶ LockLevel ─▶ RiskLevel
//!                   │
//!                   └──────────▶ duration estimate (× row-count hint)
//! ```
//!
//! Classification is a pure function of the statement text and hint; the
//! classifier's cache only avoids recomputation.

pub mod analysis;
pub mod classify;
pub mod lock;

pub use analysis::{MigrationAnalysis, MigrationSummary, split_statements};
pub use classify::{
    ClassifyHint, LockImpactClassifier, MigrationOperation, OperationType, RiskLevel,
    classify_operation_type, estimate_duration_ms, extract_affected_tables, lock_level_for,
    risk_level_for,
};
pub use lock::LockLevel;
