//! # schemaproof-investigate
//!
//! Explains a score report element by element: which weight rule fired and
//! why, which evidence exists, and which of the fixed gates hold.
//!
//! The report is a structured snapshot keyed by commit
//! ([`InvestigationReport`]) with a deterministic text rendering
//! ([`InvestigationReport::render_narrative`]).

pub mod gates;
pub mod report;
pub mod row;

pub use gates::{Gate, GateStatus};
pub use report::{
    INVESTIGATION_REPORT_VERSION, InvestigateOptions, InvestigationMetadata, InvestigationReport,
    investigate,
};
pub use row::{ElementRow, ElementStatus, format_citations};
