//! Scenario: RWA formula contract
//!
//! # Invariants under test
//!
//! 1. `rwa = (lgd × pd) × 12.5 × exposure` for the simplified formula.
//! 2. Reducing exposure strictly reduces RWA whenever `pd × lgd > 0`.
//! 3. A replacement formula plugged in through the trait drives the same
//!    derived quantities (`rwa_per_unit_exposure`, `rwa`).
//! 4. 12.5 is the reciprocal of the 8 % minimum capital ratio.

use cad_rwa::{cet1_ratio, RwaFormula, SimplifiedCapitalFactor, MIN_CAPITAL_RATIO, RWA_MULTIPLIER};

/// A flat risk weight ignoring PD/LGD, used to prove the trait is pluggable.
struct FlatRiskWeight(f64);

impl RwaFormula for FlatRiskWeight {
    fn capital_factor(&self, _pd: f64, _lgd: f64) -> f64 {
        self.0 * MIN_CAPITAL_RATIO
    }
}

#[test]
fn multiplier_is_reciprocal_of_minimum_ratio() {
    assert!((RWA_MULTIPLIER * MIN_CAPITAL_RATIO - 1.0).abs() < 1e-12);
}

#[test]
fn simplified_formula_matches_closed_form() {
    let f = SimplifiedCapitalFactor;
    for &(pd, lgd, ead) in &[
        (0.001, 0.3, 1_000_000.0),
        (0.05, 0.7, 10_000_000.0),
        (0.02, 0.45, 4_321_987.0),
    ] {
        let expected = (lgd * pd) * 12.5 * ead;
        assert_eq!(f.rwa(pd, lgd, ead), expected, "pd={pd} lgd={lgd} ead={ead}");
    }
}

#[test]
fn reducing_exposure_strictly_reduces_rwa() {
    let f = SimplifiedCapitalFactor;
    let before = f.rwa(0.02, 0.4, 2_000_000.0);
    let after = f.rwa(0.02, 0.4, 1_999_000.0);
    assert!(after < before, "before={before} after={after}");
}

#[test]
fn pluggable_formula_drives_derived_quantities() {
    let f = FlatRiskWeight(1.0); // 100 % risk weight
    assert!((f.rwa_per_unit_exposure(0.5, 0.5) - 1.0).abs() < 1e-12);
    assert!((f.rwa(0.01, 0.9, 250.0) - 250.0).abs() < 1e-9);
}

#[test]
fn ratio_helper_round_trips_formula_output() {
    let f = SimplifiedCapitalFactor;
    let total = f.rwa(0.05, 0.5, 1_000_000.0) + f.rwa(0.01, 0.5, 1_000_000.0);
    assert_eq!(total, 375_000.0);
    assert!((cet1_ratio(52_500.0, total) - 0.14).abs() < 1e-12);
}
