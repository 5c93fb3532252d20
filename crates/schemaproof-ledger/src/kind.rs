//! Artifact kinds a generator can cite against a schema element.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of generated artifact a citation points at.
///
/// Known kinds have stable wire names; anything else round-trips verbatim
/// through [`ArtifactKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArtifactKind {
    /// DDL emitted for the element.
    Sql,
    /// Typed interface (e.g. TypeScript types).
    Types,
    /// Runtime validation schema.
    Validation,
    /// Unit-level test.
    Test,
    /// Row-level-security policy test.
    RlsTest,
    /// Relation / foreign-key integration test.
    IntegrationTest,
    /// End-to-end migration test.
    MigrationTest,
    Other(String),
}

impl ArtifactKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Sql => "sql",
            Self::Types => "types",
            Self::Validation => "validation",
            Self::Test => "test",
            Self::RlsTest => "test.rls",
            Self::IntegrationTest => "test.integration",
            Self::MigrationTest => "test.migration",
            Self::Other(name) => name,
        }
    }

    /// Parse a wire name, accepting the aliases older generators emit.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sql" | "ddl" => Self::Sql,
            "types" | "ts" | "typescript" => Self::Types,
            "validation" | "zod" => Self::Validation,
            "test" | "tests" => Self::Test,
            "test.rls" | "rls" => Self::RlsTest,
            "test.integration" | "integration" => Self::IntegrationTest,
            "test.migration" | "e2e" => Self::MigrationTest,
            _ => Self::Other(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ArtifactKind {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<&str> for ArtifactKind {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<ArtifactKind> for String {
    fn from(kind: ArtifactKind) -> Self {
        kind.as_str().to_string()
    }
}
