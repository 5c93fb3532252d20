//! # schemaproof-kernel
//!
//! Scores how ready a schema snapshot is to ship, from three angles:
//!
//! ```text
//! SchemaIr ──scored_fields()──▶ SchemaElement ──WeightResolver──▶ weight
//!                                                                  │
//! EvidenceLedger ─────────────────────────────────────────────────┤
//! [MigrationStep] ────────────────────────────────────────────────┤
//!                                                                  ▼
//!                      SCS (coverage) · MRI (risk) · TCI (tests) ─▶ Readiness
//! ```
//!
//! * **SCS**: weighted share of elements with generated artifacts.
//! * **MRI**: fixed points per dangerous migration step, capped at 1.
//! * **TCI**: weighted test coverage over constraints, RLS tables, foreign
//!   keys and migration steps.
//!
//! The kernel is pure: no file, clock, or environment access. Weight
//! configuration is passed in and never mutated.

pub mod digest;
pub mod error;
pub mod migration;
pub mod schema;
pub mod scoring;
pub mod weights;

pub use digest::{DIGEST_PREFIX, canonical_digest, report_digest};
pub use error::{ConfigError, KernelError};
pub use migration::{FieldSpec, MigrationStep, StepKind, steps_from_json_str};
pub use schema::{Directive, Field, SchemaElement, SchemaIr, Table, field_uid, table_uid};
pub use scoring::{
    CategoryScore, Readiness, ReadinessThresholds, ScoreReport, Scores, ScoringOptions, Verdict,
    WeightedElement, score, weigh,
};
pub use weights::{
    ResolvedWeight, SENSITIVE_SUBSTRINGS, WeightConfig, WeightResolver, WeightRule, WeightSource,
    WeightSubject, is_sensitive_uid,
};
