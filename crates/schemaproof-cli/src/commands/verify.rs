use schemaproof_git::{CachedObjectStore, FsWorkingTree, GitObjectStore};
use schemaproof_verify::{Opinion, Verifier};
use serde_json::json;

use crate::cli::InputArgs;
use crate::commands::investigate::investigate_or_exit;
use crate::commands::score::score_or_exit;
use crate::support::{exit_with, load_inputs_or_exit, print_json};

pub struct Args {
    pub inputs: InputArgs,
    pub repo: String,
    pub strict: bool,
    pub json: bool,
}

pub fn run(args: Args) {
    let inputs = load_inputs_or_exit(&args.inputs);
    let scores = score_or_exit(&inputs);
    let investigation = investigate_or_exit(&inputs, &scores);

    let git = GitObjectStore::discover(&args.repo)
        .unwrap_or_else(|e| exit_with(format!("{}: {e}", args.repo)))
        .with_timeout(inputs.config.verify_timeout());
    let tree = FsWorkingTree::new(git.repo_root());
    let verifier = Verifier::new(CachedObjectStore::new(git), tree);
    let report = verifier
        .verify(&inputs.schema, &inputs.ledger, &investigation, &inputs.weights)
        .unwrap_or_else(|e| exit_with(e));

    if args.json {
        print_json(&json!({
            "investigation": investigation,
            "verification": report,
        }));
    } else {
        print!("{}", investigation.render_narrative());
        println!();
        print!("{}", report.render_narrative());
    }

    if args.strict && report.opinion == Opinion::ConcernsNoted {
        std::process::exit(1);
    }
}
