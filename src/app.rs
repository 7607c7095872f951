//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the snapshot
//! - runs the filter/KPI/insight pass
//! - prints reports
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, ExportArgs, SampleArgs, SummaryArgs, ViewArgs};
use crate::data::sample::{SampleConfig, generate_dataset, write_dataset};
use crate::data::snapshot::{Snapshot, SourcePaths};
use crate::domain::ViewFilter;
use crate::error::AppError;
use crate::io::export::{SummaryDocument, write_growth_csv, write_summary_json};
use crate::report::format;

pub mod pipeline;

/// Entry point for the `vahan` binary.
pub fn run() -> Result<(), AppError> {
    // We want bare `vahan` (and `vahan -m Acme ...`) to behave like
    // `vahan summary ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing. This preserves a clean clap structure while
    // retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Summary(args) => handle_summary(args),
        Command::Growth(args) => handle_growth(args),
        Command::Categories(args) => handle_categories(args),
        Command::Export(args) => handle_export(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn load_snapshot(args: &ViewArgs) -> Result<Snapshot, AppError> {
    let paths = match &args.data_dir {
        Some(dir) => SourcePaths::from_dir(dir),
        None => SourcePaths::from_env(),
    };
    Snapshot::load(paths)
}

fn view_filter(args: &ViewArgs) -> ViewFilter {
    ViewFilter {
        manufacturers: args.manufacturers.clone(),
        start_quarter: args.start,
        end_quarter: args.end,
        buckets: args.buckets.clone(),
    }
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let snapshot = load_snapshot(&args.view)?;
    let run = pipeline::run_view(&snapshot, &view_filter(&args.view));

    if args.json {
        let document = SummaryDocument {
            kpis: run.kpis,
            insights: run.insights,
        };
        write_summary_json(std::io::stdout().lock(), &document)?;
        println!();
    } else {
        print!("{}", format::format_summary(&snapshot, &run.kpis, &run.insights));
    }

    Ok(())
}

fn handle_growth(args: ViewArgs) -> Result<(), AppError> {
    let snapshot = load_snapshot(&args)?;
    let run = pipeline::run_view(&snapshot, &view_filter(&args));

    print!("{}", format::format_growth_table(&run.growth_view, args.top));
    Ok(())
}

fn handle_categories(args: ViewArgs) -> Result<(), AppError> {
    let snapshot = load_snapshot(&args)?;

    print!(
        "{}",
        format::format_category_tables(&snapshot.category_growth, &args.buckets)
    );
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let snapshot = load_snapshot(&args.view)?;
    let run = pipeline::run_view(&snapshot, &view_filter(&args.view));

    write_growth_csv(&args.out, &run.growth_view)?;
    println!("Wrote {} rows to '{}'.", run.growth_view.len(), args.out.display());
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        manufacturers: args.manufacturers,
        quarters: args.quarters,
        start_year: args.start_year,
        seed: args.seed,
    };

    let dataset = generate_dataset(&config)?;
    write_dataset(&args.out_dir, &dataset)?;

    println!(
        "Generated {} manufacturers x {} quarters into '{}'.",
        config.manufacturers,
        config.quarters,
        args.out_dir.display()
    );
    Ok(())
}

/// Rewrite argv so `vahan` defaults to `vahan summary`.
///
/// Rules:
/// - `vahan`                        -> `vahan summary`
/// - `vahan -m Acme ...`            -> `vahan summary -m Acme ...`
/// - `vahan --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("summary".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "summary" | "growth" | "categories" | "export" | "sample"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "summary flags".
    if arg1.starts_with('-') {
        argv.insert(1, "summary".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
