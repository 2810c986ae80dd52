// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// `clap` and delegates every command to Layer 2 (application) —
// this layer only routes, never computes.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::Path;

use commands::{Commands, EvaluateArgs, ExplainArgs, TrainArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "gru-rationale",
    version = "0.1.0",
    about = "Train a GRU sequence classifier, then explain and score its predictions."
)]
pub struct Cli {
    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => Self::run_train(args),
            Commands::Evaluate(args) => Self::run_evaluate(args),
            Commands::Explain(args)  => Self::run_explain(args),
        }
    }

    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on corpus: {}", args.corpus);
        let use_case = TrainUseCase::new(args.into());
        use_case.execute()?;

        println!("Training complete. Checkpoint saved.");
        Ok(())
    }

    fn run_evaluate(args: EvaluateArgs) -> Result<()> {
        use crate::application::evaluate_use_case::EvaluateUseCase;

        let use_case = EvaluateUseCase::new(args.checkpoint_dir, args.corpus);
        let report = use_case.execute()?;

        println!(
            "Accuracy: {:.2}% over {} instances",
            report.accuracy * 100.0,
            report.total,
        );
        Ok(())
    }

    fn run_explain(args: ExplainArgs) -> Result<()> {
        use crate::application::explain_use_case::ExplainUseCase;

        let use_case = ExplainUseCase::new(args.checkpoint_dir, args.corpus);
        let metrics = use_case.execute(
            args.method.into(),
            args.top_k,
            args.scores_dir.as_deref().map(Path::new),
        )?;

        println!(
            "Interpretability @ top-{}: precision={:.4} recall={:.4} f1={:.4}",
            args.top_k, metrics.precision, metrics.recall, metrics.f1,
        );
        Ok(())
    }
}
