//! Endowment Pricing CLI
//!
//! Command-line interface for profit tests, premium sweeps and loading optimization

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;

use endowment_pricing::config::{self, IssueLevel, PricingConfig};
use endowment_pricing::optimize::{LoadingOptimizer, OptimizationOutcome, OptimizationResult};
use endowment_pricing::projection::{BatchResult, SummaryRow};
use endowment_pricing::sweep::{RatioBasis, RatioScan, SweepRow, SweepThresholds};

/// Endowment insurance profit testing
#[derive(Parser)]
#[command(name = "endowment-pricing")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run configuration (JSON)
    #[arg(short, long, global = true, default_value = "data/pricing_config.json")]
    config: PathBuf,

    /// Output directory
    #[arg(short, long, global = true, default_value = "out")]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Profit test every model point with the configured loadings
    Run,

    /// Search loading coefficients against the optimization settings
    Optimize,

    /// Scan premium ratios for one or all model points
    Sweep {
        /// Model point label; all points when omitted
        #[arg(short, long)]
        model_point: Option<String>,

        #[arg(long, default_value_t = 1.0)]
        start: f64,

        #[arg(long, default_value_t = 1.05)]
        end: f64,

        #[arg(long, default_value_t = 0.01)]
        step: f64,

        #[arg(long, default_value_t = 0.0)]
        irr_threshold: f64,

        /// Scale sum assured / premium years instead of the baseline premium
        #[arg(long)]
        ptm_basis: bool,

        /// All-points scan only: NBV floor
        #[arg(long)]
        nbv_min: Option<f64>,

        /// All-points scan only: loading surplus per sum assured floor
        #[arg(long)]
        loading_surplus_ratio_min: Option<f64>,

        /// All-points scan only: premium-to-maturity ceiling
        #[arg(long)]
        ptm_max: Option<f64>,
    },

    /// Check the configuration and report issues
    Validate,
}

/// JSON summary of a profit-test run
#[derive(Serialize)]
struct RunSummary<'a> {
    generated_at: DateTime<Utc>,
    config: &'a Path,
    expense_mode: &'static str,
    total_new_business_value: f64,
    model_points: Vec<SummaryRow>,
}

/// JSON payload of an optimization run
#[derive(Serialize)]
struct OptimizeSummary<'a> {
    generated_at: DateTime<Utc>,
    config: &'a Path,
    result: &'a OptimizationResult,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = PricingConfig::load(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;

    match cli.command {
        Commands::Validate => validate(&config),
        Commands::Run => {
            ensure_valid(&config)?;
            run(&config, &cli.config, &cli.out_dir)
        }
        Commands::Optimize => {
            ensure_valid(&config)?;
            optimize(&config, &cli.config, &cli.out_dir)
        }
        Commands::Sweep {
            model_point,
            start,
            end,
            step,
            irr_threshold,
            ptm_basis,
            nbv_min,
            loading_surplus_ratio_min,
            ptm_max,
        } => {
            let scan = RatioScan {
                start,
                end,
                step,
                irr_threshold,
                basis: if ptm_basis { RatioBasis::PremiumToMaturity } else { RatioBasis::BaselinePremium },
            };
            let thresholds = SweepThresholds {
                irr: irr_threshold,
                nbv: nbv_min,
                loading_surplus_ratio: loading_surplus_ratio_min,
                premium_to_maturity_max: ptm_max,
            };
            sweep(&config, model_point.as_deref(), &scan, &thresholds, &cli.out_dir)
        }
    }
}

fn validate(config: &PricingConfig) -> Result<()> {
    let issues = config::validate(config);
    if issues.is_empty() {
        println!("Configuration OK");
        return Ok(());
    }

    for issue in &issues {
        println!("{}", issue);
    }
    let errors = issues.iter().filter(|i| i.level == IssueLevel::Error).count();
    println!("\n{} issue(s), {} error(s)", issues.len(), errors);
    if errors > 0 {
        bail!("configuration has {} error(s)", errors);
    }
    Ok(())
}

fn ensure_valid(config: &PricingConfig) -> Result<()> {
    let issues = config::validate(config);
    for issue in &issues {
        warn!("{}", issue);
    }
    if config::has_errors(&issues) {
        bail!("configuration has errors; run `validate` for details");
    }
    Ok(())
}

fn run(config: &PricingConfig, config_path: &Path, out_dir: &Path) -> Result<()> {
    let projection = config.projection_config()?;
    let source = config.loading_source()?;
    let runner = config.scenario_runner().context("failed to load assumptions or model points")?;

    info!("profit testing {} model point(s)", runner.model_points().len());
    let batch = runner.run(&projection, &source)?;

    print_summary(&batch);

    fs::create_dir_all(out_dir).with_context(|| format!("failed to create {}", out_dir.display()))?;
    for result in &batch.results {
        let path = out_dir.join(format!("cashflows_{}.csv", result.label()));
        let mut writer = csv::Writer::from_path(&path).with_context(|| format!("failed to create {}", path.display()))?;
        for row in &result.cashflows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }

    let summary = RunSummary {
        generated_at: Utc::now(),
        config: config_path,
        expense_mode: projection.expense_model.mode_name(),
        total_new_business_value: batch.total_new_business_value(),
        model_points: batch.summary(),
    };
    let summary_path = out_dir.join("run_summary.json");
    serde_json::to_writer_pretty(File::create(&summary_path)?, &summary)?;

    println!("\nCashflows and summary written to: {}", out_dir.display());
    Ok(())
}

fn optimize(config: &PricingConfig, config_path: &Path, out_dir: &Path) -> Result<()> {
    let projection = config.projection_config()?;
    let runner = config.scenario_runner().context("failed to load assumptions or model points")?;

    let optimizer = LoadingOptimizer::new(&runner, projection, config.optimization.clone())?;
    let result = optimizer.optimize(&config.initial_coefficients())?;

    match &result.outcome {
        OptimizationOutcome::Success => println!("Optimization: success"),
        OptimizationOutcome::ConditionalSuccess(proposal) => {
            println!("Optimization: conditional success");
            println!("  Override: {}", proposal.justification);
        }
        OptimizationOutcome::Infeasible => println!("Optimization: infeasible"),
    }
    println!("  Evaluations: {}", result.evaluations);
    println!("  Coefficients: {:?}", result.coefficients);
    if let Some(min_irr) = &result.min_irr {
        println!("  Min IRR: {:.4}% ({})", min_irr.irr * 100.0, min_irr.model_point);
    }

    println!("\n{:<24} {:>8} {:>10} {:>16} {:>8}", "Model point", "Status", "IRR", "NBV", "PTM");
    println!("{}", "-".repeat(70));
    for point in &result.points {
        println!(
            "{:<24} {:>8} {:>9.4}% {:>16.0} {:>8.4}",
            point.model_point,
            point.status,
            point.irr * 100.0,
            point.new_business_value,
            point.premium_to_maturity_ratio
        );
    }
    for detail in &result.failure_details {
        println!("  {}", detail);
    }

    fs::create_dir_all(out_dir).with_context(|| format!("failed to create {}", out_dir.display()))?;
    let path = out_dir.join("optimize_result.json");
    let summary = OptimizeSummary {
        generated_at: Utc::now(),
        config: config_path,
        result: &result,
    };
    serde_json::to_writer_pretty(File::create(&path)?, &summary)?;
    println!("\nResult written to: {}", path.display());
    Ok(())
}

fn sweep(
    config: &PricingConfig,
    model_point: Option<&str>,
    scan: &RatioScan,
    thresholds: &SweepThresholds,
    out_dir: &Path,
) -> Result<()> {
    let projection = config.projection_config()?;
    let source = config.loading_source()?;
    let runner = config.scenario_runner().context("failed to load assumptions or model points")?;

    let outcomes = match model_point {
        Some(label) => vec![runner.sweep_model_point(&projection, label, &source, scan)?],
        None => runner.sweep_all(&projection, &source, scan, thresholds)?.outcomes,
    };

    println!("{:<24} {:>6} {:>12} {:>10} {:>16} {:>8} {:>5}", "Model point", "Ratio", "Gross", "IRR", "NBV", "PTM", "Pass");
    println!("{}", "-".repeat(88));
    let mut rows: Vec<&SweepRow> = Vec::new();
    for outcome in &outcomes {
        for row in &outcome.rows {
            println!(
                "{:<24} {:>6.2} {:>12} {:>9.4}% {:>16.0} {:>8.4} {:>5}",
                row.model_point,
                row.ratio,
                row.gross_annual_premium,
                row.irr * 100.0,
                row.new_business_value,
                row.premium_to_maturity_ratio,
                if row.passes { "yes" } else { "no" }
            );
            rows.push(row);
        }
    }

    println!("\nMinimum ratios:");
    for outcome in &outcomes {
        match (outcome.minimum_ratio, outcome.minimum_gross_premium) {
            (Some(ratio), Some(gross)) => {
                println!("  {:<24} r={:.2} gross={}", outcome.model_point, ratio, gross)
            }
            _ => println!("  {:<24} not found", outcome.model_point),
        }
    }

    fs::create_dir_all(out_dir).with_context(|| format!("failed to create {}", out_dir.display()))?;
    let path = out_dir.join("sweep.csv");
    let mut writer = csv::Writer::from_path(&path).with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    println!("\nSweep rows written to: {}", path.display());
    Ok(())
}

fn print_summary(batch: &BatchResult) {
    println!(
        "{:<24} {:>12} {:>12} {:>10} {:>16} {:>14} {:>8}",
        "Model point", "Net P", "Gross P", "IRR", "NBV", "Load surplus", "PTM"
    );
    println!("{}", "-".repeat(102));
    for row in batch.summary() {
        println!(
            "{:<24} {:>12} {:>12} {:>9.4}% {:>16.0} {:>14.0} {:>8.4}",
            row.model_point,
            row.net_annual_premium,
            row.gross_annual_premium,
            row.irr * 100.0,
            row.new_business_value,
            row.loading_surplus,
            row.premium_to_maturity_ratio
        );
    }
    println!("\nTotal NBV: {:.0}", batch.total_new_business_value());
}
