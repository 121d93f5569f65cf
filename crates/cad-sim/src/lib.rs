//! Random counterparty books for simulation runs.
//!
//! Draws are uniform over half-open ranges. Pass a seeded [`StdRng`] (see
//! [`rng_for`]) to get the same book on every run.

use anyhow::{bail, Result};
use cad_portfolio::Counterparty;
use cad_rwa::RwaFormula;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Sampling bounds, each `[min, max)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeneratorRanges {
    pub pd_min: f64,
    pub pd_max: f64,
    pub lgd_min: f64,
    pub lgd_max: f64,
    pub exposure_min: f64,
    pub exposure_max: f64,
}

impl Default for GeneratorRanges {
    fn default() -> Self {
        Self {
            pd_min: 0.001,
            pd_max: 0.05,
            lgd_min: 0.3,
            lgd_max: 0.7,
            exposure_min: 1_000_000.0,
            exposure_max: 10_000_000.0,
        }
    }
}

impl GeneratorRanges {
    pub fn validate(&self) -> Result<()> {
        check_unit_range("pd", self.pd_min, self.pd_max)?;
        check_unit_range("lgd", self.lgd_min, self.lgd_max)?;
        if !(self.exposure_min.is_finite() && self.exposure_max.is_finite())
            || self.exposure_min < 0.0
            || self.exposure_min >= self.exposure_max
        {
            bail!(
                "GENERATOR_RANGE_INVALID exposure [{}, {}) must satisfy 0 <= min < max",
                self.exposure_min,
                self.exposure_max
            );
        }
        Ok(())
    }
}

fn check_unit_range(name: &str, min: f64, max: f64) -> Result<()> {
    if !(min.is_finite() && max.is_finite()) || min <= 0.0 || max > 1.0 || min >= max {
        bail!("GENERATOR_RANGE_INVALID {name} [{min}, {max}) must satisfy 0 < min < max <= 1");
    }
    Ok(())
}

/// Seeded when `seed` is set, OS entropy otherwise.
pub fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Draw one priced counterparty. EAD is rounded to a whole currency unit.
///
/// `ranges` is assumed valid; [`generate_counterparties`] checks it.
pub fn generate_counterparty<R, F>(
    id: usize,
    ranges: &GeneratorRanges,
    rng: &mut R,
    formula: &F,
) -> Counterparty
where
    R: Rng,
    F: RwaFormula + ?Sized,
{
    let pd = rng.gen_range(ranges.pd_min..ranges.pd_max);
    let lgd = rng.gen_range(ranges.lgd_min..ranges.lgd_max);
    let exposure = rng
        .gen_range(ranges.exposure_min..ranges.exposure_max)
        .round();
    Counterparty::new(id.to_string(), pd, lgd, exposure, formula)
}

/// Draw `count` counterparties with ids `1..=count`, in id order.
pub fn generate_counterparties<R, F>(
    count: usize,
    ranges: &GeneratorRanges,
    rng: &mut R,
    formula: &F,
) -> Result<Vec<Counterparty>>
where
    R: Rng,
    F: RwaFormula + ?Sized,
{
    ranges.validate()?;
    let book: Vec<Counterparty> = (1..=count)
        .map(|id| generate_counterparty(id, ranges, rng, formula))
        .collect();
    debug!(count, "sim: generated counterparties");
    Ok(book)
}
