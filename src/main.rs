use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use sales_etl::config::{Config, DEFAULT_CONFIG_PATH};
use sales_etl::constants::KPIS_FILE;
use sales_etl::pipeline::processing::{ProductValidator, SaleValidator, StockValidator, Validator};
use sales_etl::pipeline::{Pipeline, PipelineOutput};
use sales_etl::report::{self, Report};
use sales_etl::{logging, metrics, storage};

#[derive(Parser)]
#[command(name = "sales_etl")]
#[command(about = "Retail sales and branch stock ETL")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, enrich and aggregate the datasets, then write every output sheet
    Run {
        /// Path to the TOML configuration
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
        /// Override the configured output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Write a Prometheus metrics snapshot to the output directory
        #[arg(long)]
        metrics: bool,
    },
    /// Only validate the datasets and print each validation report
    Validate {
        /// Path to the TOML configuration
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    Config::load(path).with_context(|| format!("loading configuration from {}", path.display()))
}

fn write_outputs(output: &PipelineOutput, report: &Report, config: &Config, dir: &Path) -> anyhow::Result<usize> {
    let tables = report::all_tables(output, report);
    for table in &tables {
        let path = storage::write_table(dir, table)
            .with_context(|| format!("writing table {}", table.name))?;
        info!("💾 Wrote {} rows to {}", table.len(), path.display());
    }

    if config.output.write_kpis_json {
        storage::write_json(&dir.join(KPIS_FILE), report).context("writing KPI summary")?;
    }
    Ok(tables.len())
}

fn run(config_path: &Path, output_dir: Option<PathBuf>, write_metrics: bool) -> anyhow::Result<()> {
    println!("🔄 Running sales ETL pipeline...");

    let config = load_config(config_path)?;
    if write_metrics {
        metrics::init().context("installing metrics recorder")?;
    }

    let raw = storage::read_datasets(&config.input).context("reading input datasets")?;
    let output = Pipeline::with_config(&config.analysis).run(&raw)?;
    let report = Report::build(&output, &config.analysis);

    let dir = output_dir.unwrap_or_else(|| config.output.dir.clone());
    let written = write_outputs(&output, &report, &config, &dir)?;

    let summary = output.summary();
    println!("\n📊 Pipeline Results:");
    println!("   {}", summary.products);
    println!("   {}", summary.stock);
    println!("   {}", summary.sales);
    println!("   Enriched sales: {}", summary.enriched_sales);
    println!("   Unmatched sales: {}", summary.unmatched_sales);
    println!("   Outliers: {}", summary.outliers);
    println!("   Revenue: {:.2}", report.kpis.total_revenue);
    println!("   Tables written: {} (in {})", written, dir.display());

    if summary.unmatched_sales > 0 {
        warn!("{} sales reference unknown products", summary.unmatched_sales);
        println!("\n⚠️  {} sales have no matching product; their profit is unknown", summary.unmatched_sales);
    }

    if write_metrics {
        if let Some(path) = metrics::write_snapshot(&dir).context("writing metrics snapshot")? {
            println!("   Metrics snapshot: {}", path.display());
        }
    }

    println!("\n✅ Pipeline completed successfully!");
    Ok(())
}

fn validate(config_path: &Path) -> anyhow::Result<()> {
    println!("🔍 Validating datasets...");

    let config = load_config(config_path)?;
    let raw = storage::read_datasets(&config.input).context("reading input datasets")?;

    let reports = [
        ProductValidator.validate(&raw.products).report().clone(),
        StockValidator.validate(&raw.stock).report().clone(),
        SaleValidator.validate(&raw.sales).report().clone(),
    ];

    println!("\n📋 Validation Reports:");
    for report in &reports {
        println!("   {}", report);
        for (reason, count) in &report.rejections {
            println!("      - {}: {}", reason, count);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, output_dir, metrics } => run(&config, output_dir, metrics),
        Commands::Validate { config } => validate(&config),
    };

    if let Err(e) = &result {
        error!("Command failed: {:#}", e);
    }
    result
}
