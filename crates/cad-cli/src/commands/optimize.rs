use anyhow::{Context, Result};
use cad_config::UnusedKeyPolicy;
use cad_portfolio::{Allocator, PortfolioSnapshot};
use std::fs;
use tracing::info;

use super::{allocation_policy, load_config};

/// Read a snapshot, reprice it, allocate and print the annotated snapshot.
pub fn run(portfolio_path: &str, target_ratio: Option<f64>, config_paths: &[String]) -> Result<()> {
    let loaded = load_config(config_paths, UnusedKeyPolicy::Warn)?;
    let cfg = loaded.simulation()?;
    let allocator = Allocator::new(allocation_policy(&cfg.allocation));

    // Read raw bytes so a UTF-8 BOM from Windows editors is tolerated.
    let bytes = fs::read(portfolio_path)
        .with_context(|| format!("read portfolio file failed: {portfolio_path}"))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    let mut snapshot: PortfolioSnapshot = serde_json::from_slice(bytes)
        .context("portfolio file must contain a valid PortfolioSnapshot JSON")?;

    if let Some(r) = target_ratio {
        snapshot.target_ratio = r;
    }
    let snapshot = snapshot.repriced(allocator.formula());

    let outcome = allocator
        .allocate_snapshot(&snapshot)
        .context("allocation failed")?;
    info!(
        visited = outcome.visited,
        unmet_rwa = outcome.unmet_rwa,
        max_reduction_fraction = allocator.policy().max_reduction_fraction,
        "optimize: allocation finished"
    );

    let annotated = PortfolioSnapshot {
        counterparties: outcome.into_counterparties(),
        cet1_capital: snapshot.cet1_capital,
        target_ratio: snapshot.target_ratio,
    };
    let out = serde_json::to_string_pretty(&annotated).context("serialize snapshot failed")?;
    println!("{out}");
    Ok(())
}
