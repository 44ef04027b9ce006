use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod clean;
mod error;
mod load;
mod models;
mod plots;

use load::DuplicatePolicy;
use plots::Chart;

#[derive(Parser)]
#[command(name = "pageview-visualizer")]
#[command(about = "Clean a daily page view series and chart its trend and seasonality", long_about = None)]
struct Cli {
    /// CSV file with `date` and `value` columns
    #[arg(long, default_value = "fcc-forum-pageviews.csv")]
    csv: PathBuf,
    /// Directory the PNG charts are written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// How to treat a date that appears on more than one row
    #[arg(long, value_enum, default_value_t = DuplicatePolicy::Reject)]
    duplicates: DuplicatePolicy,
    /// Render only these charts (defaults to all three)
    #[arg(long, value_enum)]
    only: Vec<Chart>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let table = load::load_page_views(&cli.csv, cli.duplicates)
        .with_context(|| format!("failed to load page views from {}", cli.csv.display()))?;
    let (cleaned, report) = clean::clean(&table).context("failed to remove outliers")?;

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("failed to create {}", cli.out_dir.display()))?;

    let charts = if cli.only.is_empty() {
        Chart::ALL.to_vec()
    } else {
        cli.only
    };

    println!(
        "Kept {} of {} days with page views in [{:.0}, {:.0}].",
        report.kept,
        table.len(),
        report.low,
        report.high
    );
    for chart in charts {
        let path = plots::render_chart(chart, &cleaned, &cli.out_dir)
            .with_context(|| format!("failed to render {}", chart.file_name()))?;
        println!("Chart written to {}.", path.display());
    }

    Ok(())
}
