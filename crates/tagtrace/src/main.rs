//! tagtrace - Build requirements traceability matrices from annotated documents

use eyre::{Result, WrapErr};
use facet_args as args;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tagtrace::output::{OutputFormat, render_report};
use tagtrace::{collect_documents, load_config_or_default};
use tagtrace_core::{ScanResult, TraceReport};
use tracing_subscriber::EnvFilter;

/// CLI arguments
#[derive(Debug, facet::Facet)]
struct Args {
    /// Files and directories to scan, in order
    #[facet(args::positional, default)]
    inputs: Vec<PathBuf>,

    /// Path to config file (default: .config/tagtrace/config.yaml)
    #[facet(args::named, args::short = 'c', default)]
    config: Option<PathBuf>,

    /// Output format: markdown, text, json
    #[facet(args::named, args::short = 'f', default)]
    format: Option<String>,

    /// Write the report to a file instead of stdout
    #[facet(args::named, args::short = 'o', default)]
    output: Option<PathBuf>,

    /// Exit 1 if any coverage is missing or any diagnostic was raised
    #[facet(args::named, default)]
    check: bool,

    /// Show every row chain in text output
    #[facet(args::named, args::short = 'v', default)]
    verbose: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TAGTRACE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args: Args =
        facet_args::from_std_args().wrap_err("Failed to parse command line arguments")?;

    let passing = run(args)?;
    if !passing {
        std::process::exit(1);
    }
    Ok(())
}

/// Returns false when `--check` was given and the report is not clean
fn run(args: Args) -> Result<bool> {
    if args.inputs.is_empty() {
        eyre::bail!("No input files specified. Usage: tagtrace <file-or-dir>...");
    }

    let format = match args.format.as_deref() {
        Some(f) => OutputFormat::from_str(f)
            .ok_or_else(|| eyre::eyre!("Unknown output format '{}'", f))?,
        None => OutputFormat::default(),
    };

    let config = load_config_or_default(args.config.as_deref())?;
    let trace_config = config.trace_config();

    eprintln!("{} Reading documents...", "->".blue().bold());
    let documents = collect_documents(&args.inputs, &config)?;
    eprintln!(
        "   Found {} documents",
        documents.len().to_string().green()
    );

    let scan = ScanResult::from_documents(&documents);
    eprintln!(
        "   Found {} definitions and {} relationships",
        scan.definitions.len().to_string().green(),
        scan.relationships.len().to_string().green()
    );

    let report = TraceReport::generate(&scan, &trace_config);
    let diagnostics = scan.diagnostics.len()
        + report
            .tables()
            .iter()
            .map(|t| t.diagnostics.len())
            .sum::<usize>();

    if diagnostics > 0 {
        eprintln!(
            "{} {} diagnostics",
            "!".yellow().bold(),
            diagnostics
        );
    }

    let rendered = render_report(&scan, &report, &trace_config, format, args.verbose)?;

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &rendered)
                .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Wrote report to {}",
                "OK".green().bold(),
                path.display()
            );
        }
        None => print!("{}", rendered),
    }

    let missing = report.missing_count();
    if args.check && (missing > 0 || diagnostics > 0) {
        eprintln!(
            "{} {} missing coverage markers, {} diagnostics",
            "FAIL".red().bold(),
            missing,
            diagnostics
        );
        return Ok(false);
    }

    Ok(true)
}
