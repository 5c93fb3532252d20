use schemaproof_locks::{ClassifyHint, LockImpactClassifier, split_statements};

use crate::support::{exit_with, print_json, read_text_or_exit};

const STATEMENT_CACHE_CAPACITY: u64 = 1_024;

pub fn run(sql: String, rows: Option<u64>, json_output: bool) {
    let script = read_text_or_exit(&sql);
    let statements = split_statements(&script);
    if statements.is_empty() {
        exit_with(format!("{sql}: no SQL statements found"));
    }

    let hint = rows.map(ClassifyHint::rows).unwrap_or_default();
    let classifier = LockImpactClassifier::with_cache(STATEMENT_CACHE_CAPACITY);
    let analysis = classifier.analyze(&statements, hint);

    if json_output {
        print_json(&analysis);
    } else {
        print!("{}", analysis.render_narrative());
    }
}
