use crate::RWA_MULTIPLIER;

/// Strategy mapping (PD, LGD, EAD) to a risk-weighted amount.
///
/// Implementations must be pure and monotone non-decreasing in exposure for
/// fixed PD/LGD. The allocator relies on `rwa_per_unit_exposure` being the
/// slope of `rwa` in exposure, so a formula that is not linear in EAD should
/// report its marginal slope at the current exposure instead.
///
/// Inputs are not bounds-checked: callers supply `pd, lgd ∈ (0, 1]` and
/// `exposure >= 0`.
pub trait RwaFormula {
    /// Capital requirement per unit of exposure (K).
    fn capital_factor(&self, pd: f64, lgd: f64) -> f64;

    /// RWA produced by one unit of exposure.
    fn rwa_per_unit_exposure(&self, pd: f64, lgd: f64) -> f64 {
        self.capital_factor(pd, lgd) * RWA_MULTIPLIER
    }

    /// Risk-weighted amount for `exposure`.
    fn rwa(&self, pd: f64, lgd: f64, exposure: f64) -> f64 {
        self.rwa_per_unit_exposure(pd, lgd) * exposure
    }
}

impl<F: RwaFormula + ?Sized> RwaFormula for &F {
    fn capital_factor(&self, pd: f64, lgd: f64) -> f64 {
        (**self).capital_factor(pd, lgd)
    }

    fn rwa_per_unit_exposure(&self, pd: f64, lgd: f64) -> f64 {
        (**self).rwa_per_unit_exposure(pd, lgd)
    }

    fn rwa(&self, pd: f64, lgd: f64, exposure: f64) -> f64 {
        (**self).rwa(pd, lgd, exposure)
    }
}

/// Simplified capital factor: `K = LGD × PD`.
///
/// Stands in for the IRB formula (correlation, maturity adjustment and the
/// inverse-normal terms are deliberately absent).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SimplifiedCapitalFactor;

impl RwaFormula for SimplifiedCapitalFactor {
    fn capital_factor(&self, pd: f64, lgd: f64) -> f64 {
        lgd * pd
    }
}
