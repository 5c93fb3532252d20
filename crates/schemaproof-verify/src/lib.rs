//! # schemaproof-verify
//!
//! Second opinion on an investigation. Nothing the investigator computed is
//! reused: citations are checked against version control, completion is
//! re-derived with a simpler weighting, and the score pattern is screened
//! for combinations that rarely make sense.
//!
//! ```text
//! ledger citations ──par_iter──▶ ObjectStore::file_at ──▶ WorkingTree::read_file
//!                                       │                       │
//!                                       └──── verified / unverified / failed
//! ```
//!
//! A failing lookup degrades one citation to `failed`; it never aborts the
//! pass.

pub mod arithmetic;
pub mod citations;
pub mod consistency;
pub mod report;

pub use arithmetic::{ArithmeticCheck, Discrepancy, approximate_completion, cross_check};
pub use citations::{CitationCheck, CitationStatus, CitationTally, check_citation, check_citations};
pub use consistency::{ConsistencyFlag, FlagCode, consistency_flags};
pub use report::{Opinion, VERIFICATION_REPORT_VERSION, VerificationReport, Verifier};
