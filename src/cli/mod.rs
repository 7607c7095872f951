//! Command-line parsing for the Vahan registrations dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the derivation/query code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::Bucket;
use crate::io::ingest::parse_quarter;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "vahan", version, about = "Vehicle registrations (Vahan) metrics deriver")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print headline KPIs and key findings for the current selection.
    Summary(SummaryArgs),
    /// Print the latest-quarter QoQ/YoY growth table for the selection.
    Growth(ViewArgs),
    /// Print category totals by year and latest-year YoY per bucket.
    Categories(ViewArgs),
    /// Write the enriched manufacturer growth table to CSV.
    Export(ExportArgs),
    /// Generate a synthetic demo dataset (all four CSVs) into a directory.
    Sample(SampleArgs),
}

/// Common selection options shared by the viewing commands.
#[derive(Debug, Parser, Clone)]
pub struct ViewArgs {
    /// Data directory with the four source CSVs (default: $VAHAN_DATA_DIR, then `.`).
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Restrict to these manufacturers (repeatable; empty selects all).
    #[arg(short = 'm', long = "manufacturer", value_name = "NAME")]
    pub manufacturers: Vec<String>,

    /// Start quarter, inclusive (e.g. 2022-Q1 or 2022-01-01).
    #[arg(long, value_name = "QUARTER", value_parser = parse_quarter)]
    pub start: Option<NaiveDate>,

    /// End quarter, inclusive.
    #[arg(long, value_name = "QUARTER", value_parser = parse_quarter)]
    pub end: Option<NaiveDate>,

    /// Restrict category views to these buckets (repeatable; empty selects all).
    #[arg(short = 'b', long = "bucket", value_enum)]
    pub buckets: Vec<Bucket>,

    /// Show top-N rows in tables.
    #[arg(long, default_value_t = 30)]
    pub top: usize,
}

/// Options for the summary command.
#[derive(Debug, Parser)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Emit the summary as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Options for the export command.
#[derive(Debug, Parser)]
pub struct ExportArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,
}

/// Options for demo dataset generation.
#[derive(Debug, Parser)]
pub struct SampleArgs {
    /// Output directory for the generated CSVs.
    #[arg(long, value_name = "DIR", default_value = "sample-data")]
    pub out_dir: PathBuf,

    /// Number of manufacturers to generate.
    #[arg(short = 'n', long, default_value_t = 8)]
    pub manufacturers: usize,

    /// Number of quarters to generate.
    #[arg(short = 'q', long, default_value_t = 12)]
    pub quarters: usize,

    /// First calendar year of the series.
    #[arg(long, default_value_t = 2021)]
    pub start_year: i32,

    /// Random seed for generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
