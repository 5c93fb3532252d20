//! # schemaproof-ledger
//!
//! The evidence ledger: where each generated artifact for a schema element
//! was produced, under which commit, plus per-element errors and warnings.
//!
//! ```text
//! generator ──record()──▶ EvidenceLedger ──to_json()──▶ evidence.json
//!                               │
//!                               └──▶ scoring / investigation / verification
//! ```
//!
//! The ledger is append-only within one generation run and carries no
//! internal locking. It does no file I/O; callers decide where the JSON goes.

pub mod citation;
pub mod kind;
pub mod ledger;

pub use citation::{ArtifactLocation, Citation, IssueSeverity, LedgerIssue, LineRange};
pub use kind::ArtifactKind;
pub use ledger::{EvidenceLedger, KindCitations, LEDGER_FORMAT_VERSION, LedgerError};
