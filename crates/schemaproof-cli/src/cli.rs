use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "schemaproof",
    about = "Schemaproof: evidence-driven migration risk and schema-readiness analysis",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Inputs shared by every scoring-based subcommand.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the schema IR JSON
    #[arg(long)]
    pub schema: String,

    /// Path to the evidence ledger JSON
    #[arg(long)]
    pub ledger: String,

    /// Path to a JSON array of migration steps
    #[arg(long)]
    pub steps: Option<String>,

    /// Path to schemaproof.toml (falls back to $SCHEMAPROOF_CONFIG, then ./schemaproof.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// Report timestamp (RFC 3339); defaults to the ledger timestamp
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify the lock impact of a `;`-separated SQL migration script
    Classify {
        /// Path to the SQL migration script
        sql: String,

        /// Estimated rows in the affected tables
        #[arg(long)]
        rows: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute SCS, MRI, TCI and the readiness verdict
    Score {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Per-element investigation with gates and a readiness verdict
    Investigate {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Independently verify an investigation against version control
    Verify {
        #[command(flatten)]
        inputs: InputArgs,

        /// Repository path used to resolve cited files
        #[arg(long, default_value = ".")]
        repo: String,

        /// Exit non-zero when the opinion is CONCERNS NOTED
        #[arg(long)]
        strict: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
