//! Talent Analytics CLI
//!
//! Runs the attrition and retention pipelines, scores new data with a saved
//! model and builds the dashboard export.

use anyhow::Result;
use clap::Parser;

use talent_analytics::cli::{Cli, Commands};
use talent_analytics::pipeline::schema::PipelineKind;
use talent_analytics::{run_attrition, run_dashboard, run_retention, run_score};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Attrition(args) => run_attrition(&args.to_config(PipelineKind::Attrition)),
        Commands::Retention(args) => run_retention(&args.to_config(PipelineKind::Retention)),
        Commands::Score {
            model,
            input,
            output,
            infer_schema_length,
        } => run_score(model, input, output.as_deref(), *infer_schema_length),
        Commands::Dashboard {
            attrition,
            retention,
            model,
            output,
            infer_schema_length,
        } => run_dashboard(attrition, retention, model, output, *infer_schema_length),
    }
}
