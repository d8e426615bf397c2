use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};

use calendar_extract::export::{google_events, report};
use calendar_extract::input::load_lines;
use calendar_extract::months::month_name;
use calendar_extract::{Config, Pipeline};

#[derive(Parser)]
#[command(
    name = "calendar-extract",
    about = "Academic calendar OCR text to dated events"
)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract events from OCR output → JSON
    Extract {
        /// Academic year, e.g. "2025-2026" or "2025"
        #[arg(long)]
        year: Option<String>,
        /// TOML file with normalizer/parser/grid/output settings
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Report)]
        format: Format,
        /// Write here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// .txt / .json files or directories of them
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print the extracted events grouped by month
    Months {
        #[arg(long)]
        year: Option<String>,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Month-grouped report with issues
    Report,
    /// Google Calendar v3 event resources
    Google,
    /// Flat event list
    Events,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Command::Extract {
            year,
            config,
            format,
            out,
            paths,
        } => run_extract(year.as_deref(), config.as_deref(), format, out.as_deref(), &paths),
        Command::Months {
            year,
            config,
            paths,
        } => run_months(year.as_deref(), config.as_deref(), &paths),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  SHARED SETUP
// ═══════════════════════════════════════════════════════════════════════

fn build_pipeline(year: Option<&str>, config_path: Option<&Path>) -> Result<(Pipeline, Config)> {
    let config = Config::load_or_default(config_path).context("loading configuration")?;
    let pipeline = Pipeline::builder()
        .academic_year_str(year)?
        .config(config.clone())
        .build()?;
    Ok((pipeline, config))
}

fn write_output(out: Option<&Path>, body: &str) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, body).with_context(|| format!("cannot write {}", path.display()))?;
            info!("wrote {} ({} bytes)", path.display(), body.len());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(body.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
//  EXTRACT MODE: OCR lines → JSON
// ═══════════════════════════════════════════════════════════════════════

fn run_extract(
    year: Option<&str>,
    config_path: Option<&Path>,
    format: Format,
    out: Option<&Path>,
    paths: &[PathBuf],
) -> Result<()> {
    let (pipeline, config) = build_pipeline(year, config_path)?;
    let lines = load_lines(paths).context("reading OCR input")?;
    let extraction = pipeline.extract(&lines);

    let body = match format {
        Format::Report => {
            serde_json::to_string_pretty(&report(&extraction, &pipeline.academic_year()))?
        }
        Format::Google => {
            serde_json::to_string_pretty(&google_events(&extraction.events, &config.output))?
        }
        Format::Events => serde_json::to_string_pretty(&extraction.events)?,
    };
    write_output(out, &body)?;

    for issue in &extraction.issues {
        warn!("{issue}");
    }
    eprintln!("{}", extraction.summary());
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
//  MONTHS MODE: month-grouped listing on stdout
// ═══════════════════════════════════════════════════════════════════════

fn run_months(year: Option<&str>, config_path: Option<&Path>, paths: &[PathBuf]) -> Result<()> {
    let (pipeline, _) = build_pipeline(year, config_path)?;
    let lines = load_lines(paths).context("reading OCR input")?;
    let extraction = pipeline.extract(&lines);

    for group in extraction.months() {
        println!("{} {}", month_name(group.month), group.year);
        for e in group.events {
            let time = e
                .time
                .map(|t| format!(" {}", t.start.format("%H:%M")))
                .unwrap_or_default();
            let range = e
                .range_start
                .map(|d| format!("  (from {d})"))
                .unwrap_or_default();
            println!("  {}{time}  {}{range}", e.date, e.description);
        }
    }
    eprintln!("{}", extraction.summary());
    Ok(())
}
