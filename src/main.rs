//! Leveraged-borrow optimizer
//!
//! Loads pool snapshots, finds the revenue-maximizing borrow for each pool in
//! parallel and prints one JSON report per pool to stdout.

use alloy::primitives::utils::format_units;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use leverage_core::ray_math::{ray_to_f64, RAY_DECIMALS};
use leverage_core::{
    compute_interest_primes, compute_revenue, constrained_borrow, find_optimal_borrow,
    BorrowBounds, OptimizerConfig, PoolSnapshot, Ray, SnapshotRegistry,
};

/// Environment variable names.
mod env {
    pub const SNAPSHOT_DIR: &str = "SNAPSHOT_DIR";
}

const DEFAULT_SNAPSHOT_DIR: &str = "./config/pools";

/// Per-pool result printed to stdout. Amounts are decimal token strings.
#[derive(Debug, Serialize)]
struct PoolReport {
    pool: String,
    current_borrow: String,
    optimal_borrow: String,
    recommended_borrow: String,
    /// Recommended borrow in raw token units, when decimals are configured
    #[serde(skip_serializing_if = "Option::is_none")]
    recommended_borrow_units: Option<String>,
    delta: String,
    annual_revenue: String,
    borrow_rate: f64,
    collateral_capped: bool,
    converged: bool,
    iterations: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing (logs to stderr, reports to stdout)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,leverage_core=debug")),
        )
        .init();

    // Use OPTIMIZER_PROFILE env var to select: default, precise, fast, or file path
    let config = OptimizerConfig::from_env()?;
    config.log_config();

    let snapshot_dir =
        std::env::var(env::SNAPSHOT_DIR).unwrap_or_else(|_| DEFAULT_SNAPSHOT_DIR.to_string());
    let registry = SnapshotRegistry::load_from_dir(&snapshot_dir)?;
    if registry.is_empty() {
        bail!("No pool snapshots loaded from {}", snapshot_dir);
    }

    let mut jobs = JoinSet::new();
    for snapshot in registry.iter().cloned() {
        let config = config.clone();
        jobs.spawn_blocking(move || {
            let name = snapshot.name().to_string();
            (name, optimize_pool(&snapshot, &config))
        });
    }

    let mut failures = 0usize;
    let mut reports = Vec::with_capacity(registry.len());
    while let Some(joined) = jobs.join_next().await {
        let (pool, outcome) = joined.context("Optimization task panicked")?;
        match outcome {
            Ok(report) => reports.push(report),
            Err(e) => {
                failures += 1;
                warn!(pool = %pool, error = %format!("{e:#}"), "Failed to optimize pool");
            }
        }
    }

    reports.sort_by(|a, b| a.pool.cmp(&b.pool));
    for report in &reports {
        println!("{}", serde_json::to_string_pretty(report)?);
    }

    info!(pools = reports.len(), failures, "Optimization complete");
    if reports.is_empty() {
        bail!("Every pool snapshot failed to optimize");
    }
    Ok(())
}

fn optimize_pool(snapshot: &PoolSnapshot, config: &OptimizerConfig) -> Result<PoolReport> {
    let params = snapshot.into_parameters()?;
    let recommendation = find_optimal_borrow(&params, BorrowBounds::feasible(&params), config)?;

    let mut recommended = recommendation.to_borrow;
    if let Some(max_collat_ratio) = snapshot.strategy.max_collat_ratio {
        recommended =
            constrained_borrow(recommended, params.strategy_assets, max_collat_ratio)?;
    }
    let collateral_capped = recommended != recommendation.to_borrow;

    // Borrows are made in whole raw token units
    let recommended = snapshot.round_to_token(recommended)?;
    let revenue = if recommended == recommendation.to_borrow {
        recommendation.revenue_at_optimum
    } else {
        compute_revenue(recommended, &params)?
    };
    let rate = compute_interest_primes(recommended, &params)?;

    info!(
        pool = %snapshot.name(),
        optimal = ray_to_f64(recommendation.to_borrow),
        recommended = ray_to_f64(recommended),
        revenue = ray_to_f64(revenue),
        converged = recommendation.converged,
        "Pool optimized"
    );

    Ok(PoolReport {
        pool: snapshot.name().to_string(),
        current_borrow: tokens(params.current_borrow)?,
        optimal_borrow: tokens(recommendation.to_borrow)?,
        recommended_borrow: tokens(recommended)?,
        recommended_borrow_units: snapshot.token_units(recommended).map(|u| u.to_string()),
        delta: tokens(recommended - params.current_borrow)?,
        annual_revenue: tokens(revenue)?,
        borrow_rate: ray_to_f64(rate.interest),
        collateral_capped,
        converged: recommendation.converged,
        iterations: recommendation.iterations,
    })
}

fn tokens(value: Ray) -> Result<String> {
    format_units(value, RAY_DECIMALS).context("Failed to format amount")
}
