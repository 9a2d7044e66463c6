//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};

/// Rewrite annotated source files and trace output lines back to their origin.
#[derive(Debug, Parser)]
#[command(name = "splice")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Working directory to rewrite
    #[arg(long, default_value = ".")]
    pub workspace: Utf8PathBuf,

    /// Files to rewrite (default: every matching file in the workspace)
    pub paths: Vec<Utf8PathBuf>,

    /// Write rewritten files below this directory
    #[arg(long = "output-dir")]
    pub output_dir: Option<Utf8PathBuf>,

    /// Print rewritten sources to stdout
    #[arg(long)]
    pub emit: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Glob patterns to ignore
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Print the original line of an output line, given as FILE:LINE
    #[arg(long, value_parser = parse_lookup)]
    pub lookup: Option<LineLookup>,

    /// List the available transformations and exit
    #[arg(long)]
    pub list_transformations: bool,

    /// Log rewrite details to stderr
    #[arg(long, short)]
    pub verbose: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output
    Json,
}

/// A request to map one output line back to its input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineLookup {
    /// The rewritten file.
    pub file: Utf8PathBuf,
    /// 1-indexed output line.
    pub line: u32,
}

fn parse_lookup(value: &str) -> Result<LineLookup, String> {
    let (file, line) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("expected FILE:LINE, got `{value}`"))?;
    let line: u32 = line
        .parse()
        .map_err(|_| format!("invalid line number `{line}`"))?;
    if file.is_empty() || line == 0 {
        return Err(format!("expected FILE:LINE with LINE >= 1, got `{value}`"));
    }
    Ok(LineLookup {
        file: Utf8PathBuf::from(file),
        line,
    })
}
