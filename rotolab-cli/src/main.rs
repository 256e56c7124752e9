//! RotoLab CLI — compose a virtual rotation-basket series.
//!
//! Commands:
//! - `compose` — stitch a continuous series from a schedule and a CSV
//!   data directory, write it as CSV
//! - `inspect` — print a summary of a rotation schedule file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rotolab_core::compose::{BuildParams, RebalanceMode, SeriesStitcher, VirtualSeries};
use rotolab_core::config::ComposeConfig;
use rotolab_core::data::CsvStore;
use rotolab_core::schedule::RotationSchedule;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rotolab",
    about = "RotoLab CLI — virtual rotation-basket series composer"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a continuous virtual series from a rotation schedule.
    Compose {
        /// Path to a TOML config file (mutually exclusive with the flags below).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to the rotation schedule JSON.
        #[arg(long)]
        schedule: Option<PathBuf>,

        /// Directory of per-instrument CSV files.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Output CSV path.
        #[arg(long, default_value = "virtual_series.csv")]
        output: PathBuf,

        /// Rebalance mode: full_liquidation or incremental.
        #[arg(long, default_value = "incremental")]
        mode: RebalanceMode,

        /// One-sided trading cost fraction (e.g. 0.003 = 0.3%).
        #[arg(long, default_value_t = 0.003)]
        cost: f64,

        /// Starting price of the virtual series.
        #[arg(long, default_value_t = 1000.0)]
        base_price: f64,
    },
    /// Print a summary of a rotation schedule file.
    Inspect {
        /// Path to the rotation schedule JSON.
        schedule: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compose {
            config,
            schedule,
            data_dir,
            output,
            mode,
            cost,
            base_price,
        } => run_compose(config, schedule, data_dir, output, mode, cost, base_price),
        Commands::Inspect { schedule } => run_inspect(&schedule),
    }
}

fn run_compose(
    config_path: Option<PathBuf>,
    schedule_path: Option<PathBuf>,
    data_dir: PathBuf,
    output: PathBuf,
    mode: RebalanceMode,
    cost: f64,
    base_price: f64,
) -> Result<()> {
    let (schedule_path, data_dir, params, output) = if let Some(path) = config_path {
        if schedule_path.is_some() {
            bail!("--config and --schedule are mutually exclusive");
        }
        let cfg = ComposeConfig::from_file(&path).map_err(|e| anyhow::anyhow!(e))?;
        let out = cfg.output.map(|o| o.path).unwrap_or(output);
        (cfg.schedule.path, cfg.data.dir, cfg.build.to_params(), out)
    } else {
        let Some(schedule_path) = schedule_path else {
            bail!("one of --config or --schedule is required");
        };
        let params = BuildParams {
            mode,
            trading_cost_pct: cost,
            base_price,
        };
        (schedule_path, data_dir, params, output)
    };

    let schedule = RotationSchedule::load(&schedule_path)
        .with_context(|| format!("load schedule {}", schedule_path.display()))?;
    let store = CsvStore::new(&data_dir);
    let stitcher = SeriesStitcher::new(schedule, store);

    let series = stitcher.build(&params)?;

    print_summary(&series, &params);

    series
        .to_csv(&output)
        .with_context(|| format!("write output {}", output.display()))?;
    println!("Series written to: {}", output.display());

    Ok(())
}

fn print_summary(series: &VirtualSeries, params: &BuildParams) {
    let first = series.rows.first().expect("non-empty by construction");
    let last = series.rows.last().expect("non-empty by construction");

    println!();
    println!("=== Virtual Series ===");
    println!("Mode:           {}", params.mode);
    println!("Trading cost:   {:.4}%", params.trading_cost_pct * 100.0);
    println!("Rows:           {}", series.rows.len());
    println!("Period:         {} to {}", first.date, last.date);
    println!("First close:    {:.2}", first.close);
    println!("Last close:     {:.2}", last.close);
    println!(
        "Total return:   {:.2}%",
        (last.close / first.close - 1.0) * 100.0
    );
    println!("Series hash:    {}", series.series_hash());

    if !series.report.unavailable.is_empty() {
        println!();
        println!(
            "Excluded instruments ({}):",
            series.report.unavailable.len()
        );
        for (code, reason) in &series.report.unavailable {
            println!("  {code}: {reason}");
        }
    }
    if !series.report.skipped_periods.is_empty() {
        println!(
            "Skipped periods ({}): {}",
            series.report.skipped_periods.len(),
            series
                .report
                .skipped_periods
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    println!();
}

fn run_inspect(path: &PathBuf) -> Result<()> {
    let schedule =
        RotationSchedule::load(path).with_context(|| format!("load schedule {}", path.display()))?;

    println!("Schedule: {}", path.display());
    println!(
        "Range:    {} to {}",
        schedule.start_date, schedule.end_date
    );
    println!(
        "Periods:  {} (metadata rotation_count: {})",
        schedule.period_count(),
        schedule.rotation_count
    );
    println!("Codes:    {} unique", schedule.all_codes().len());
    println!();
    println!("{:<12} {:>6}  Basket", "Start", "Size");
    println!("{}", "-".repeat(50));
    for period in &schedule.periods {
        let preview: Vec<&str> = period.codes.iter().take(6).map(|s| s.as_str()).collect();
        let suffix = if period.codes.len() > 6 { ", ..." } else { "" };
        println!(
            "{:<12} {:>6}  {}{}",
            period.start.to_string(),
            period.codes.len(),
            preview.join(", "),
            suffix
        );
    }

    Ok(())
}
