use schemaproof_investigate::{InvestigationReport, investigate};
use schemaproof_kernel::ScoreReport;

use crate::cli::InputArgs;
use crate::commands::score::score_or_exit;
use crate::support::{Inputs, exit_with, load_inputs_or_exit, print_json};

pub fn investigate_or_exit(inputs: &Inputs, scores: &ScoreReport) -> InvestigationReport {
    let options = inputs.config.investigate_options(inputs.at);
    investigate(
        &inputs.schema,
        &inputs.ledger,
        scores,
        &inputs.weights,
        &options,
    )
    .unwrap_or_else(|e| exit_with(e))
}

pub fn run(args: InputArgs, json_output: bool) {
    let inputs = load_inputs_or_exit(&args);
    let scores = score_or_exit(&inputs);
    let report = investigate_or_exit(&inputs, &scores);

    if json_output {
        print_json(&report);
    } else {
        print!("{}", report.render_narrative());
    }
}
