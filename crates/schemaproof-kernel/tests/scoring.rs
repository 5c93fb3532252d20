//! End-to-end scoring over a small two-table schema.

use chrono::{TimeZone, Utc};
use schemaproof_kernel::migration::{MigrationStep, StepKind};
use schemaproof_kernel::scoring::{ScoringOptions, Verdict, score};
use schemaproof_kernel::{KernelError, SchemaIr, WeightConfig};
use schemaproof_ledger::{ArtifactKind, ArtifactLocation, EvidenceLedger};
use serde_json::json;

fn blog_schema() -> SchemaIr {
    SchemaIr::from_value(&json!({
        "tables": [
            {
                "name": "User",
                "fields": [
                    {"name": "id", "type": "ID", "primaryKey": true, "nullable": false},
                    {"name": "email", "type": "String", "unique": true},
                    {"name": "bio", "type": "String"}
                ]
            },
            {
                "name": "Post",
                "directives": [{"name": "tenant"}],
                "fields": [
                    {"name": "id", "type": "ID", "primaryKey": true},
                    {"name": "authorId", "type": "ID", "references": "User.id"},
                    {"name": "author", "type": "User", "virtual": true}
                ]
            }
        ]
    }))
    .unwrap()
}

fn blog_ledger() -> EvidenceLedger {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let mut ledger = EvidenceLedger::new("4f2a9c1d0e", at);
    let sql = ArtifactLocation::lines("db/schema.sql", 1, 40);
    let tests = ArtifactLocation::lines("tests/user.test.ts", 1, 80);
    for uid in ["col:User.id", "col:User.email", "col:User.bio", "col:Post.id", "col:Post.authorId"] {
        ledger.record(uid, ArtifactKind::Sql, sql.clone());
    }
    for uid in ["col:User.id", "col:User.email", "col:Post.id"] {
        ledger.record(uid, ArtifactKind::Test, tests.clone());
    }
    ledger.record(
        "col:Post.authorId",
        ArtifactKind::IntegrationTest,
        ArtifactLocation::file("tests/relations.test.ts"),
    );
    ledger.record(
        "col:Post.authorId",
        ArtifactKind::MigrationTest,
        ArtifactLocation::file("tests/migrate.test.ts"),
    );
    ledger.record("tbl:Post", ArtifactKind::RlsTest, ArtifactLocation::file("tests/rls.sql"));
    ledger
}

fn blog_steps() -> Vec<MigrationStep> {
    vec![
        MigrationStep::new(StepKind::AddColumn, "Post").with_column("authorId"),
        MigrationStep::new(StepKind::AddIndex, "User").with_column("email"),
    ]
}

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-4
}

#[test]
fn scores_blog_schema() {
    let report = score(
        &blog_schema(),
        &blog_ledger(),
        &blog_steps(),
        &WeightConfig::builtin(),
        &ScoringOptions::default(),
    )
    .unwrap();

    // Field weights: User.id 10, User.email 6, User.bio 1, Post.id 10, Post.authorId 9.
    assert_eq!(report.metadata.total_weight, 36);
    assert_eq!(report.metadata.element_count, 5);

    let scs = &report.breakdown.scs;
    assert_eq!(scs.sql.earned, 36);
    assert_eq!(scs.tests.earned, 26);
    assert_eq!(scs.types.total, 0);
    assert!(close(scs.rollup.score, 26.0 / 36.0));
    assert!(close(report.scores.scs, (0.4 + 0.2 * 26.0 / 36.0) / 0.6));

    assert!(close(report.scores.mri, 0.1));

    let tci = &report.breakdown.tci;
    assert_eq!((tci.unit.earned, tci.unit.total), (26, 35));
    assert_eq!(tci.rls.score, 1.0);
    assert_eq!(tci.integration.score, 1.0);
    assert_eq!(tci.e2e.score, 0.5);
    assert!(close(report.scores.tci, 0.4 * 26.0 / 35.0 + 0.5));

    assert!(report.readiness.ready);
    assert_eq!(report.readiness.verdict, Verdict::Elementary);
    assert_eq!(report.commit, "4f2a9c1d0e");
}

#[test]
fn rollup_of_ten_out_of_fifteen() {
    let schema = SchemaIr::from_value(&json!({
        "tables": [{
            "name": "Account",
            "fields": [{"name": "a", "type": "String"}, {"name": "b", "type": "String"}]
        }]
    }))
    .unwrap();
    let mut weights = WeightConfig::builtin();
    weights.overrides.insert("col:Account.a".to_string(), 10);
    weights.overrides.insert("col:Account.b".to_string(), 5);

    let mut ledger = EvidenceLedger::new("c0ffee", Utc::now());
    ledger.record("col:Account.a", ArtifactKind::Sql, ArtifactLocation::file("a.sql"));
    ledger.record("col:Account.a", ArtifactKind::Test, ArtifactLocation::file("a.test.ts"));
    ledger.record("col:Account.b", ArtifactKind::Sql, ArtifactLocation::file("a.sql"));

    let report = score(&schema, &ledger, &[], &weights, &ScoringOptions::default()).unwrap();
    let rollup = report.breakdown.scs.rollup;
    assert_eq!((rollup.earned, rollup.total), (10, 15));
    insta::assert_snapshot!(format!("{:.4}", rollup.score), @"0.6667");
}

#[test]
fn empty_ledger_scores_zero_without_nan() {
    let ledger = EvidenceLedger::new("c0ffee", Utc::now());
    let report = score(
        &blog_schema(),
        &ledger,
        &[],
        &WeightConfig::builtin(),
        &ScoringOptions::default(),
    )
    .unwrap();
    assert_eq!(report.scores.scs, 0.0);
    assert_eq!(report.scores.tci, 0.0);
    assert_eq!(report.scores.mri, 0.0);
    assert!(!report.readiness.ready);
    assert_eq!(report.readiness.verdict, Verdict::YouShallNotPass);
}

#[test]
fn zero_tables_is_an_error() {
    let schema = SchemaIr::from_value(&json!({"tables": []})).unwrap();
    let ledger = EvidenceLedger::new("c0ffee", Utc::now());
    let err = score(&schema, &ledger, &[], &WeightConfig::builtin(), &ScoringOptions::default())
        .unwrap_err();
    assert!(matches!(err, KernelError::EmptySchema));
}

#[test]
fn digest_is_deterministic_for_identical_inputs() {
    let options = ScoringOptions::default();
    let run = || {
        score(
            &blog_schema(),
            &blog_ledger(),
            &blog_steps(),
            &WeightConfig::builtin(),
            &options,
        )
        .unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first.digest, second.digest);
    assert!(first.digest.starts_with("sp1_"));
    assert_eq!(first.timestamp, blog_ledger().timestamp());
}

#[test]
fn explicit_targets_disable_unlisted_categories() {
    let options = ScoringOptions {
        targets: Some([ArtifactKind::Sql, ArtifactKind::Types].into_iter().collect()),
        ..ScoringOptions::default()
    };
    let report = score(
        &blog_schema(),
        &blog_ledger(),
        &[],
        &WeightConfig::builtin(),
        &options,
    )
    .unwrap();
    let scs = &report.breakdown.scs;
    assert_eq!(scs.tests.total, 0);
    assert_eq!(scs.types.total, 36);
    // sql 1.0 at 0.4, types 0.0 at 0.2.
    assert!(close(report.scores.scs, 0.4 / 0.6));
}
