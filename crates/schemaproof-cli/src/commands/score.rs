use schemaproof_kernel::{MigrationStep, ScoreReport, score};
use schemaproof_locks::{ClassifyHint, LockImpactClassifier, MigrationAnalysis};
use serde::Serialize;

use crate::cli::InputArgs;
use crate::support::{Inputs, exit_with, load_inputs_or_exit, pass_fail, print_json};

#[derive(Serialize)]
struct ScoreOutput<'a> {
    #[serde(flatten)]
    report: &'a ScoreReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    locks: Option<MigrationAnalysis>,
}

pub fn score_or_exit(inputs: &Inputs) -> ScoreReport {
    let options = inputs.config.scoring_options(inputs.at);
    score(
        &inputs.schema,
        &inputs.ledger,
        &inputs.steps,
        &inputs.weights,
        &options,
    )
    .unwrap_or_else(|e| exit_with(e))
}

/// Lock analysis of the SQL the planner rendered, if any step carries some.
fn step_locks(steps: &[MigrationStep]) -> Option<MigrationAnalysis> {
    if steps.iter().all(|step| step.sql.is_none()) {
        return None;
    }
    Some(LockImpactClassifier::new().analyze_steps(steps, ClassifyHint::default()))
}

pub fn run(args: InputArgs, json_output: bool) {
    let inputs = load_inputs_or_exit(&args);
    let report = score_or_exit(&inputs);
    let locks = step_locks(&inputs.steps);

    if json_output {
        print_json(&ScoreOutput {
            report: &report,
            locks,
        });
        return;
    }

    let readiness = &report.readiness;
    let thresholds = &readiness.thresholds;
    let short: String = report.commit.chars().take(7).collect();
    println!("schemaproof score {short}");
    println!(
        "  Elements: {} across {} table(s), total weight {}",
        report.metadata.element_count, report.metadata.table_count, report.metadata.total_weight
    );
    println!("  Migration steps: {}", report.metadata.step_count);
    println!(
        "  SCS: {:.4} (min {:.2}) {}",
        report.scores.scs,
        thresholds.scs_min,
        pass_fail(readiness.gates.scs_pass)
    );
    println!(
        "  TCI: {:.4} (min {:.2}) {}",
        report.scores.tci,
        thresholds.tci_min,
        pass_fail(readiness.gates.tci_pass)
    );
    println!(
        "  MRI: {:.4} (max {:.2}) {}",
        report.scores.mri,
        thresholds.mri_max,
        pass_fail(readiness.gates.mri_pass)
    );
    println!("  Verdict: {}", readiness.verdict);
    println!("  Digest: {}", report.digest);

    if let Some(locks) = locks {
        println!();
        print!("{}", locks.render_narrative());
    }
}
