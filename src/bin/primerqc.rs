use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use polars::prelude::*;
use tracing_subscriber::EnvFilter;

use primerqc::candidates::{load_candidates, PrecomputedEngine};
use primerqc::{result_rows, run_batch, summary_rows, BatchOpts, DesignResult, QcThresholds};

/// primerqc CLI
#[derive(Parser)]
#[command(name = "primerqc")]
#[command(version)]
#[command(about = "Primer pair QC, probe placement, scoring and ranking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the built-in QC thresholds as TOML
    Defaults,

    /// Load and validate a thresholds file
    CheckConfig {
        /// TOML thresholds file
        path: PathBuf,
    },

    /// Score and rank precomputed candidate pairs for every target
    Design {
        /// Candidate JSON (array of {id, sequence, pairs})
        candidates: PathBuf,
        /// TOML thresholds overriding the defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Threads (None = all)
        #[arg(long)]
        threads: Option<usize>,
        /// Drop pairs scoring below this
        #[arg(long)]
        min_score: Option<f64>,
        /// Keep at most N pairs per target
        #[arg(long)]
        top: Option<usize>,
        /// Do not place probes on pairs that lack one
        #[arg(long)]
        no_probes: bool,
        /// Write results as JSON to this file instead of printing tables
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Defaults => {
            print!("{}", QcThresholds::default().to_toml_string()?);
        }

        Commands::CheckConfig { path } => {
            QcThresholds::load(&path)?;
            println!("{}: ok", path.display());
        }

        Commands::Design { candidates, config, threads, min_score, top, no_probes, json } => {
            let th = match config {
                Some(p) => QcThresholds::load(p)?,
                None => QcThresholds::default(),
            };
            let records = load_candidates(&candidates)?;
            let (engine, targets) = PrecomputedEngine::from_candidates(records)?;
            let opts = BatchOpts { threads, design_probes: !no_probes, min_score, max_pairs: top };
            let results = run_batch(&targets, &engine, &th, &opts)?;

            match json {
                Some(out) => {
                    let f = std::fs::File::create(&out).with_context(|| format!("creating {}", out.display()))?;
                    serde_json::to_writer_pretty(std::io::BufWriter::new(f), &results)?;
                }
                None => print_tables(&results)?,
            }
        }
    }

    Ok(())
}

fn print_tables(results: &[DesignResult]) -> PolarsResult<()> {
    // Show all columns and full cell width.
    std::env::set_var("POLARS_FMT_TABLE_FORMATTING", "UTF8_FULL");
    std::env::set_var("POLARS_FMT_MAX_COLS", "100000");
    std::env::set_var("POLARS_FMT_MAX_ROWS", "1000000");
    std::env::set_var("POLARS_FMT_STR_LEN", "100000");
    std::env::set_var("POLARS_TABLE_WIDTH", "65535");

    for r in results {
        let rows = result_rows(r);
        if rows.is_empty() {
            continue;
        }
        let df = df!(
            "rank"       => rows.iter().map(|r| r.0).collect::<Vec<_>>(),
            "forward"    => rows.iter().map(|r| r.1.clone()).collect::<Vec<_>>(),
            "reverse"    => rows.iter().map(|r| r.2.clone()).collect::<Vec<_>>(),
            "probe"      => rows.iter().map(|r| r.3.clone()).collect::<Vec<_>>(),
            "product"    => rows.iter().map(|r| r.4).collect::<Vec<_>>(),
            "delta_tm"   => rows.iter().map(|r| r.5).collect::<Vec<_>>(),
            "score"      => rows.iter().map(|r| r.6).collect::<Vec<_>>(),
            "qc"         => rows.iter().map(|r| r.7.clone()).collect::<Vec<_>>(),
        )?;
        println!("{}", r.target_id);
        println!("{}", df);
    }

    let summary = summary_rows(results);
    let df = df!(
        "target"     => summary.iter().map(|s| s.0.clone()).collect::<Vec<_>>(),
        "status"     => summary.iter().map(|s| s.1.clone()).collect::<Vec<_>>(),
        "pairs"      => summary.iter().map(|s| s.2).collect::<Vec<_>>(),
        "best_score" => summary.iter().map(|s| s.3).collect::<Vec<_>>(),
    )?;
    println!("{}", df);
    Ok(())
}
