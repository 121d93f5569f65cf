//! cad-rwa
//!
//! Risk-weighted asset formula and CET1 ratio primitives.
//!
//! - Simplified capital factor: K = LGD × PD
//! - RWA = K × 12.5 × EAD
//! - CET1 ratio = capital / total RWA
//!
//! Pure logic. No IO, no state.

mod formula;
mod ratio;

pub use formula::{RwaFormula, SimplifiedCapitalFactor};
pub use ratio::{cet1_ratio, required_total_rwa};

/// Minimum total capital ratio under Basel (8 %).
pub const MIN_CAPITAL_RATIO: f64 = 0.08;

/// Reciprocal of the 8 % minimum capital ratio; converts a capital
/// requirement into a risk-weighted amount.
pub const RWA_MULTIPLIER: f64 = 12.5;
