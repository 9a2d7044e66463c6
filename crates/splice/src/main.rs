//! splice: directive-driven source rewriting with line provenance.

mod cli;
mod config;
mod orchestrator;
mod output;
mod telemetry;

use clap::Parser;
use cli::Args;
use miette::{IntoDiagnostic, Result};
use splice_transformer::TransformationRegistry;

fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init(args.verbose);

    if args.list_transformations {
        let registry = TransformationRegistry::with_builtins();
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    let summary = orchestrator::run(&args).into_diagnostic()?;
    if summary.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
