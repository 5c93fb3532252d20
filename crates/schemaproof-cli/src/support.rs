use chrono::{DateTime, Utc};
use schemaproof_kernel::{MigrationStep, SchemaIr, WeightConfig, steps_from_json_str};
use schemaproof_ledger::EvidenceLedger;
use serde::Serialize;
use std::fs;

use crate::cli::InputArgs;
use crate::config::{AppConfig, resolve_config_path};

/// Everything a scoring-based subcommand needs, loaded and validated.
pub struct Inputs {
    pub schema: SchemaIr,
    pub ledger: EvidenceLedger,
    pub steps: Vec<MigrationStep>,
    pub config: AppConfig,
    pub weights: WeightConfig,
    pub at: Option<DateTime<Utc>>,
}

pub fn exit_with(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

pub fn read_text_or_exit(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| exit_with(format!("failed to read {path}: {e}")))
}

pub fn load_schema_or_exit(path: &str) -> SchemaIr {
    let raw = read_text_or_exit(path);
    SchemaIr::from_json_str(&raw).unwrap_or_else(|e| exit_with(format!("{path}: {e}")))
}

pub fn load_ledger_or_exit(path: &str) -> EvidenceLedger {
    let raw = read_text_or_exit(path);
    EvidenceLedger::from_json_str(&raw).unwrap_or_else(|e| exit_with(format!("{path}: {e}")))
}

pub fn load_steps_or_exit(path: Option<&str>) -> Vec<MigrationStep> {
    let Some(path) = path else {
        return Vec::new();
    };
    let raw = read_text_or_exit(path);
    steps_from_json_str(&raw)
        .unwrap_or_else(|e| exit_with(format!("{path}: invalid migration steps: {e}")))
}

pub fn load_config_or_exit(flag: Option<&str>) -> AppConfig {
    match resolve_config_path(flag) {
        Ok(Some(path)) => AppConfig::load(&path).unwrap_or_else(|e| exit_with(e)),
        Ok(None) => AppConfig::default(),
        Err(e) => exit_with(e),
    }
}

pub fn parse_at_or_exit(at: Option<&str>) -> Option<DateTime<Utc>> {
    at.map(|raw| {
        DateTime::parse_from_rfc3339(raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .unwrap_or_else(|e| exit_with(format!("invalid --at timestamp `{raw}`: {e}")))
    })
}

pub fn load_inputs_or_exit(args: &InputArgs) -> Inputs {
    let config = load_config_or_exit(args.config.as_deref());
    let weights = config.weights();
    Inputs {
        schema: load_schema_or_exit(&args.schema),
        ledger: load_ledger_or_exit(&args.ledger),
        steps: load_steps_or_exit(args.steps.as_deref()),
        at: parse_at_or_exit(args.at.as_deref()),
        config,
        weights,
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|e| exit_with(e))
    );
}

pub fn pass_fail(pass: bool) -> &'static str {
    if pass { "pass" } else { "FAIL" }
}
