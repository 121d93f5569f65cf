use cad_rwa::cet1_ratio;

use crate::Counterparty;

/// Σ live RWA.
pub fn total_rwa(counterparties: &[Counterparty]) -> f64 {
    counterparties.iter().map(|c| c.risk_weighted_amount).sum()
}

/// Σ (suggested RWA, falling back to live RWA where no suggestion exists).
pub fn suggested_total_rwa(counterparties: &[Counterparty]) -> f64 {
    counterparties.iter().map(Counterparty::effective_rwa).sum()
}

/// Σ live EAD.
pub fn total_exposure(counterparties: &[Counterparty]) -> f64 {
    counterparties.iter().map(|c| c.exposure).sum()
}

/// CET1 ratio on live RWA (0 when there is no RWA).
pub fn current_cet1_ratio(cet1_capital: f64, counterparties: &[Counterparty]) -> f64 {
    cet1_ratio(cet1_capital, total_rwa(counterparties))
}

/// CET1 ratio if every pending suggestion were applied (0 when there is no RWA).
pub fn suggested_cet1_ratio(cet1_capital: f64, counterparties: &[Counterparty]) -> f64 {
    cet1_ratio(cet1_capital, suggested_total_rwa(counterparties))
}
