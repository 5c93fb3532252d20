use chrono::{TimeZone, Utc};
use schemaproof_git::{FsWorkingTree, ObjectStore, ObjectStoreError, WorkingTree};
use schemaproof_investigate::{InvestigateOptions, investigate};
use schemaproof_kernel::scoring::{ScoringOptions, score};
use schemaproof_kernel::{SchemaIr, WeightConfig};
use schemaproof_ledger::{ArtifactKind, ArtifactLocation, Citation, EvidenceLedger};
use schemaproof_verify::{CitationStatus, Discrepancy, FlagCode, Opinion, Verifier};
use serde_json::json;
use std::collections::HashMap;
use std::io;

const COMMIT: &str = "abc1234def5678";

struct MapStore {
    files: HashMap<(String, String), String>,
}

impl MapStore {
    fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            files: entries
                .iter()
                .map(|(path, content)| ((COMMIT.to_string(), path.to_string()), content.to_string()))
                .collect(),
        }
    }
}

impl ObjectStore for MapStore {
    fn file_at(&self, commit: &str, path: &str) -> Result<Option<String>, ObjectStoreError> {
        if path == "slow.sql" {
            return Err(ObjectStoreError::Timeout {
                args: format!("show {commit}:{path}"),
                timeout_ms: 5_000,
            });
        }
        Ok(self.files.get(&(commit.to_string(), path.to_string())).cloned())
    }
}

struct MapTree {
    files: HashMap<String, String>,
}

impl WorkingTree for MapTree {
    fn read_file(&self, path: &str) -> io::Result<Option<String>> {
        Ok(self.files.get(path).cloned())
    }
}

fn tree(entries: &[(&str, &str)]) -> MapTree {
    MapTree {
        files: entries
            .iter()
            .map(|(path, content)| (path.to_string(), content.to_string()))
            .collect(),
    }
}

fn tenant_schema() -> SchemaIr {
    SchemaIr::from_value(&json!({
        "tables": [{
            "name": "User",
            "directives": [{"name": "tenant"}],
            "fields": [
                {"name": "id", "type": "ID", "primaryKey": true},
                {"name": "email", "type": "String", "unique": true}
            ]
        }]
    }))
    .unwrap()
}

fn ledger() -> EvidenceLedger {
    EvidenceLedger::new(COMMIT, Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
}

#[test]
fn clean_bundle_passes() {
    let schema = tenant_schema();
    let mut ledger = ledger();
    for uid in ["col:User.id", "col:User.email"] {
        ledger.record(uid, ArtifactKind::Sql, ArtifactLocation::lines("db/schema.sql", 1, 9));
        ledger.record(uid, ArtifactKind::Test, ArtifactLocation::file("tests/user.test.ts"));
    }
    ledger.record("tbl:User", ArtifactKind::RlsTest, ArtifactLocation::file("tests/rls.sql"));

    let weights = WeightConfig::builtin();
    let scores = score(&schema, &ledger, &[], &weights, &ScoringOptions::default()).unwrap();
    let investigation =
        investigate(&schema, &ledger, &scores, &weights, &InvestigateOptions::default()).unwrap();

    let files = [
        ("db/schema.sql", "CREATE TABLE users ();\n"),
        ("tests/user.test.ts", "test('user', () => {});\n"),
        ("tests/rls.sql", "SELECT 1;\n"),
    ];
    let verifier = Verifier::new(MapStore::new(&files), tree(&files));
    let report = verifier.verify(&schema, &ledger, &investigation, &weights).unwrap();

    assert_eq!(report.citations.total, 5);
    assert_eq!(report.citations.verified, 5);
    assert_eq!(report.citations.rate, 1.0);
    assert_eq!(report.arithmetic.discrepancy, Discrepancy::Acceptable);
    assert!(report.flags.is_empty(), "{:?}", report.flags);
    assert_eq!(report.opinion, Opinion::Passed);
    assert_eq!(report.investigation_digest, investigation.digest);
    insta::assert_snapshot!(report.render_narrative().lines().last().unwrap(), @"Opinion: PASSED");
}

#[test]
fn every_failure_mode_is_counted() {
    let schema = tenant_schema();
    let mut ledger = ledger();
    let at = ledger.timestamp();
    ledger.record("col:User.id", ArtifactKind::Sql, ArtifactLocation::file("db/schema.sql"));
    ledger.record("col:User.id", ArtifactKind::Test, ArtifactLocation::file("tests/gone.test.ts"));
    ledger.record("col:User.email", ArtifactKind::Sql, ArtifactLocation::file("db/drifted.sql"));
    ledger.record("col:User.email", ArtifactKind::Types, ArtifactLocation::file("gen/types.ts"));
    ledger.record("col:User.email", ArtifactKind::Validation, ArtifactLocation::file("slow.sql"));
    ledger.record_citation(
        "col:User.email",
        ArtifactKind::Test,
        Citation {
            file: "tests/user.test.ts".to_string(),
            line_range: None,
            commit: "ffffffffffff".to_string(),
            timestamp: at,
        },
    );

    let store = MapStore::new(&[
        ("db/schema.sql", "v1"),
        ("tests/gone.test.ts", "old test"),
        ("db/drifted.sql", "v1"),
        ("tests/user.test.ts", "t"),
    ]);
    let working = tree(&[
        ("db/schema.sql", "v1"),
        ("db/drifted.sql", "v2"),
        ("tests/user.test.ts", "t"),
    ]);

    let weights = WeightConfig::builtin();
    let scores = score(&schema, &ledger, &[], &weights, &ScoringOptions::default()).unwrap();
    let investigation =
        investigate(&schema, &ledger, &scores, &weights, &InvestigateOptions::default()).unwrap();
    let report = Verifier::new(store, working)
        .verify(&schema, &ledger, &investigation, &weights)
        .unwrap();

    let tally = report.citations;
    assert_eq!(tally.total, 6);
    assert_eq!((tally.verified, tally.unverified, tally.failed), (1, 1, 4));
    assert_eq!(tally.total, tally.verified + tally.unverified + tally.failed);
    assert!((tally.rate - 1.0 / 6.0).abs() < 1e-9);

    let status_of = |file: &str| {
        report
            .checks
            .iter()
            .find(|check| check.citation.starts_with(file))
            .map(|check| check.status)
    };
    assert_eq!(status_of("db/schema.sql"), Some(CitationStatus::Verified));
    assert_eq!(status_of("tests/gone.test.ts"), Some(CitationStatus::Unverified));
    assert_eq!(status_of("db/drifted.sql"), Some(CitationStatus::Failed));
    assert_eq!(status_of("gen/types.ts"), Some(CitationStatus::Failed));
    assert_eq!(status_of("slow.sql"), Some(CitationStatus::Failed));
    assert_eq!(status_of("tests/user.test.ts"), Some(CitationStatus::Failed));

    let mismatch = report
        .checks
        .iter()
        .find(|check| check.citation.starts_with("tests/user.test.ts"))
        .unwrap();
    assert!(mismatch.reason.contains("does not match bundle"));

    assert_eq!(report.opinion, Opinion::ConcernsNoted);
    assert!(
        report
            .render_narrative()
            .contains("Citations: 6 total, 1 verified, 1 unverified, 4 failed (rate 16.7%)")
    );
}

#[test]
fn sensitive_element_without_tests_is_flagged() {
    let schema = tenant_schema();
    let mut ledger = ledger();
    ledger.record("col:User.email", ArtifactKind::Sql, ArtifactLocation::file("db/schema.sql"));

    let weights = WeightConfig::builtin();
    let scores = score(&schema, &ledger, &[], &weights, &ScoringOptions::default()).unwrap();
    let investigation =
        investigate(&schema, &ledger, &scores, &weights, &InvestigateOptions::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let report = Verifier::new(MapStore::new(&[]), FsWorkingTree::new(dir.path()))
        .verify(&schema, &ledger, &investigation, &weights)
        .unwrap();

    let sensitive: Vec<&str> = report
        .flags
        .iter()
        .filter(|flag| flag.code == FlagCode::SensitiveUntested)
        .filter_map(|flag| flag.uid.as_deref())
        .collect();
    assert_eq!(sensitive, vec!["col:User.email"]);
    assert_eq!(report.opinion, Opinion::ConcernsNoted);
}

#[test]
fn empty_ledger_has_zero_rate_without_nan() {
    let schema = tenant_schema();
    let ledger = ledger();
    let weights = WeightConfig::builtin();
    let scores = score(&schema, &ledger, &[], &weights, &ScoringOptions::default()).unwrap();
    let investigation =
        investigate(&schema, &ledger, &scores, &weights, &InvestigateOptions::default()).unwrap();
    let report = Verifier::new(MapStore::new(&[]), tree(&[]))
        .verify(&schema, &ledger, &investigation, &weights)
        .unwrap();
    assert_eq!(report.citations.total, 0);
    assert_eq!(report.citations.rate, 0.0);
    assert_eq!(report.opinion, Opinion::ConcernsNoted);
}
