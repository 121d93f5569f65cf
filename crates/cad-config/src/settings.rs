//! Typed simulation settings read from the merged config document.
//!
//! Missing keys fall back to defaults, so an empty document is a valid
//! configuration. Ranges are half-open `[min, max)`.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioSection {
    pub counterparty_count: usize,
    /// CET1 ratio the generated book starts at; fixes CET1 capital.
    pub initial_cet1_ratio: f64,
    /// Ratio the allocator aims for.
    pub target_cet1_ratio: f64,
}

impl Default for PortfolioSection {
    fn default() -> Self {
        Self {
            counterparty_count: 10,
            initial_cet1_ratio: 0.14,
            target_cet1_ratio: 0.125,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSection {
    /// Fixed seed for reproducible books; `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub pd_min: f64,
    pub pd_max: f64,
    pub lgd_min: f64,
    pub lgd_max: f64,
    pub exposure_min: f64,
    pub exposure_max: f64,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            seed: None,
            pd_min: 0.001,
            pd_max: 0.05,
            lgd_min: 0.3,
            lgd_max: 0.7,
            exposure_min: 1_000_000.0,
            exposure_max: 10_000_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationSection {
    pub max_reduction_fraction: f64,
    pub floor_fraction: f64,
}

impl Default for AllocationSection {
    fn default() -> Self {
        Self {
            max_reduction_fraction: 0.8,
            floor_fraction: 0.2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub portfolio: PortfolioSection,
    pub generator: GeneratorSection,
    pub allocation: AllocationSection,
}

impl SimulationConfig {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        let cfg: SimulationConfig = serde_json::from_value(config_json.clone())
            .context("CONFIG_INVALID: config does not match simulation schema")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the simulator cannot run with.
    pub fn validate(&self) -> Result<()> {
        let p = &self.portfolio;
        positive_ratio("portfolio.initial_cet1_ratio", p.initial_cet1_ratio)?;
        positive_ratio("portfolio.target_cet1_ratio", p.target_cet1_ratio)?;

        let g = &self.generator;
        unit_range("generator.pd", g.pd_min, g.pd_max)?;
        unit_range("generator.lgd", g.lgd_min, g.lgd_max)?;
        if !(g.exposure_min.is_finite() && g.exposure_max.is_finite())
            || g.exposure_min < 0.0
            || g.exposure_min >= g.exposure_max
        {
            bail!(
                "CONFIG_INVALID generator.exposure range [{}, {}) must satisfy 0 <= min < max",
                g.exposure_min,
                g.exposure_max
            );
        }

        let a = &self.allocation;
        let in_unit = |x: f64| x.is_finite() && (0.0..=1.0).contains(&x);
        if !in_unit(a.max_reduction_fraction)
            || !in_unit(a.floor_fraction)
            || (a.max_reduction_fraction + a.floor_fraction - 1.0).abs() > 1e-9
        {
            bail!(
                "CONFIG_INVALID allocation fractions must lie in [0, 1] and sum to 1 \
                 (max_reduction_fraction={}, floor_fraction={})",
                a.max_reduction_fraction,
                a.floor_fraction
            );
        }
        Ok(())
    }
}

fn positive_ratio(key: &str, v: f64) -> Result<()> {
    if !(v.is_finite() && v > 0.0) {
        bail!("CONFIG_INVALID {key}={v} must be finite and > 0");
    }
    Ok(())
}

/// `[min, max)` inside (0, 1].
fn unit_range(key: &str, min: f64, max: f64) -> Result<()> {
    if !(min.is_finite() && max.is_finite()) || min <= 0.0 || max > 1.0 || min >= max {
        bail!("CONFIG_INVALID {key} range [{min}, {max}) must satisfy 0 < min < max <= 1");
    }
    Ok(())
}
