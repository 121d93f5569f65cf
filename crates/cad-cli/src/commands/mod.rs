//! Subcommand bodies and the output helpers they share.

pub mod optimize;
pub mod simulate;

use anyhow::Result;
use cad_config::{report_unused_keys, LoadedConfig, UnusedKeyPolicy};
use cad_portfolio::AllocationPolicy;
use tracing::warn;

/// Load layered config (empty path list = defaults only) and run the
/// unused-key guard.
pub(crate) fn load_config(paths: &[String], policy: UnusedKeyPolicy) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = if path_refs.is_empty() {
        cad_config::load_layered_yaml_from_strings(&[])?
    } else {
        cad_config::load_layered_yaml(&path_refs)?
    };

    let report = report_unused_keys(&loaded.config_json, policy)?;
    if !report.is_clean() {
        warn!(
            unused = ?report.unused_leaf_pointers,
            "config: keys present but not read"
        );
    }
    Ok(loaded)
}

pub(crate) fn allocation_policy(section: &cad_config::AllocationSection) -> AllocationPolicy {
    AllocationPolicy {
        max_reduction_fraction: section.max_reduction_fraction,
        floor_fraction: section.floor_fraction,
    }
}

/// `0.125` -> `12.50%`.
pub fn format_percentage(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

/// Whole US dollars with thousands separators: `1234567.4` -> `$1,234,567`.
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}")
}
