//! cad-portfolio: allocator
//!
//! Capital-relief allocation: suggest EAD reductions that bring total RWA down
//! to the level at which fixed CET1 capital meets a target ratio.
//!
//! Responsibilities (pure, no IO):
//! - Accept a portfolio of counterparties, CET1 capital and a target ratio.
//! - Produce an annotated copy: `suggested_exposure` / `suggested_risk_weighted_amount`.
//! - Never mutate the caller's records.
//!
//! Design notes:
//! - The RWA formula is a strategy (`RwaFormula`); the allocator only uses its
//!   per-unit slope and its evaluation, never the closed form.
//! - An unreachable target is not an error. The outcome reports `unmet_rwa`.
//! - When the target is already met every record receives an identity
//!   suggestion. When reduction is needed only records visited before the
//!   running gap closes receive one; the rest keep `None`, which callers read
//!   as "unchanged". Display code keys off that difference, so the two paths
//!   are kept as they are.

use cad_rwa::{required_total_rwa, RwaFormula, SimplifiedCapitalFactor};
use tracing::debug;

use crate::ordering::risk_priority_order;
use crate::{total_rwa, Counterparty, PortfolioSnapshot};

// ─── Error ───────────────────────────────────────────────────────────────────

/// Precondition violations detected at the allocator boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum AllocationError {
    /// CET1 capital is negative or not finite.
    InvalidCapital,
    /// Target ratio is zero, negative or not finite.
    NonPositiveTargetRatio,
    /// A counterparty carries a negative or non-finite exposure.
    InvalidExposure { id: String },
    /// Policy fractions are out of range or do not sum to 1.
    InvalidPolicy {
        max_reduction_fraction: f64,
        floor_fraction: f64,
    },
}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCapital => write!(f, "cet1 capital must be finite and >= 0"),
            Self::NonPositiveTargetRatio => write!(f, "target ratio must be finite and > 0"),
            Self::InvalidExposure { id } => {
                write!(f, "invalid (negative/NaN/inf) exposure for counterparty '{id}'")
            }
            Self::InvalidPolicy {
                max_reduction_fraction,
                floor_fraction,
            } => write!(
                f,
                "allocation policy fractions must lie in [0, 1] and sum to 1 \
                 (max_reduction_fraction={max_reduction_fraction}, floor_fraction={floor_fraction})"
            ),
        }
    }
}

impl std::error::Error for AllocationError {}

// ─── AllocationPolicy ────────────────────────────────────────────────────────

/// Per-counterparty reduction bounds.
///
/// - `max_reduction_fraction`: at most this share of a counterparty's current
///   EAD may be cut.
/// - `floor_fraction`: suggested EAD never drops below this share of current EAD.
///
/// The two express the same bound in different spaces and must sum to 1.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AllocationPolicy {
    pub max_reduction_fraction: f64,
    pub floor_fraction: f64,
}

impl AllocationPolicy {
    /// Cut at most 80 %, keep at least 20 %.
    pub fn standard() -> Self {
        Self {
            max_reduction_fraction: 0.8,
            floor_fraction: 0.2,
        }
    }

    pub fn validate(&self) -> Result<(), AllocationError> {
        let in_unit = |x: f64| x.is_finite() && (0.0..=1.0).contains(&x);
        let sums_to_one = (self.max_reduction_fraction + self.floor_fraction - 1.0).abs() < 1e-9;
        if in_unit(self.max_reduction_fraction) && in_unit(self.floor_fraction) && sums_to_one {
            Ok(())
        } else {
            Err(AllocationError::InvalidPolicy {
                max_reduction_fraction: self.max_reduction_fraction,
                floor_fraction: self.floor_fraction,
            })
        }
    }
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

// ─── AllocationOutcome ───────────────────────────────────────────────────────

/// The output of one allocation run.
///
/// `counterparties`: annotated copies, in input order.
/// `rwa_to_reduce`: gap at the start of the run (0 when already compliant).
/// `unmet_rwa`: gap left after the run (0 when the target is reached).
/// `visited`: records that received a suggestion.
#[derive(Clone, Debug, PartialEq)]
pub struct AllocationOutcome {
    pub counterparties: Vec<Counterparty>,
    pub current_total_rwa: f64,
    pub target_total_rwa: f64,
    pub rwa_to_reduce: f64,
    pub unmet_rwa: f64,
    pub visited: usize,
}

impl AllocationOutcome {
    /// True if the portfolio met the target before any reduction.
    pub fn already_compliant(&self) -> bool {
        self.rwa_to_reduce <= 0.0
    }

    /// True if applying the suggestions reaches (or beats) the target.
    pub fn target_met(&self) -> bool {
        self.unmet_rwa <= 0.0
    }

    pub fn into_counterparties(self) -> Vec<Counterparty> {
        self.counterparties
    }
}

// ─── Allocator ───────────────────────────────────────────────────────────────

/// Greedy, risk-prioritized exposure reducer.
///
/// # Algorithm
///
/// 1. `current = Σ RWA`, `target = capital / target_ratio`.
/// 2. If `current <= target`, every record gets an identity suggestion.
/// 3. Otherwise walk counterparties by PD descending (stable), carrying
///    `remaining = current - target`. Stop once `remaining <= 0`.
/// 4. Per counterparty: `slope = rwa_per_unit_exposure(pd, lgd)`;
///    `rwa_cut = min(remaining, EAD × max_reduction × slope)`;
///    `suggested = max(EAD - rwa_cut / slope, EAD × floor)` (no cut if `slope == 0`);
///    `suggested_rwa = rwa(pd, lgd, suggested)`.
/// 5. `remaining -= RWA - suggested_rwa`, the delta actually achieved.
pub struct Allocator<F = SimplifiedCapitalFactor> {
    formula: F,
    policy: AllocationPolicy,
}

impl Allocator<SimplifiedCapitalFactor> {
    /// Simplified capital factor with the given policy.
    pub fn new(policy: AllocationPolicy) -> Self {
        Self::with_formula(SimplifiedCapitalFactor, policy)
    }

    /// Simplified capital factor, 80 % cap / 20 % floor.
    pub fn standard() -> Self {
        Self::new(AllocationPolicy::standard())
    }
}

impl Default for Allocator<SimplifiedCapitalFactor> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<F: RwaFormula> Allocator<F> {
    pub fn with_formula(formula: F, policy: AllocationPolicy) -> Self {
        Self { formula, policy }
    }

    pub fn formula(&self) -> &F {
        &self.formula
    }

    pub fn policy(&self) -> &AllocationPolicy {
        &self.policy
    }

    /// Run allocation on a snapshot's own capital and target.
    pub fn allocate_snapshot(
        &self,
        snapshot: &PortfolioSnapshot,
    ) -> Result<AllocationOutcome, AllocationError> {
        self.allocate(
            &snapshot.counterparties,
            snapshot.cet1_capital,
            snapshot.target_ratio,
        )
    }

    /// Suggest exposure reductions so that `cet1_capital / Σ RWA >= target_ratio`.
    ///
    /// `counterparties` is read only; the outcome holds fresh copies.
    pub fn allocate(
        &self,
        counterparties: &[Counterparty],
        cet1_capital: f64,
        target_ratio: f64,
    ) -> Result<AllocationOutcome, AllocationError> {
        // ── 0. Guard inputs ──────────────────────────────────────────────────
        self.policy.validate()?;

        if !cet1_capital.is_finite() || cet1_capital < 0.0 {
            return Err(AllocationError::InvalidCapital);
        }
        if !target_ratio.is_finite() || target_ratio <= 0.0 {
            return Err(AllocationError::NonPositiveTargetRatio);
        }
        for cp in counterparties {
            if !cp.exposure.is_finite() || cp.exposure < 0.0 {
                return Err(AllocationError::InvalidExposure { id: cp.id.clone() });
            }
        }

        // Suggestions on the input belong to an earlier run.
        let mut annotated: Vec<Counterparty> = counterparties.to_vec();
        for cp in &mut annotated {
            cp.clear_suggestion();
        }

        // ── 1. Gap ───────────────────────────────────────────────────────────
        let current_total_rwa = total_rwa(&annotated);
        let target_total_rwa = required_total_rwa(cet1_capital, target_ratio);

        // ── 2. Already compliant: identity suggestion for everyone ──────────
        if current_total_rwa <= target_total_rwa {
            for cp in &mut annotated {
                cp.set_suggestion(cp.exposure, cp.risk_weighted_amount);
            }
            debug!(
                current_total_rwa,
                target_total_rwa,
                counterparties = annotated.len(),
                "allocation: target already met"
            );
            let visited = annotated.len();
            return Ok(AllocationOutcome {
                counterparties: annotated,
                current_total_rwa,
                target_total_rwa,
                rwa_to_reduce: 0.0,
                unmet_rwa: 0.0,
                visited,
            });
        }

        let rwa_to_reduce = current_total_rwa - target_total_rwa;

        // ── 3. Walk by PD desc until the gap closes ─────────────────────────
        let mut remaining = rwa_to_reduce;
        let mut visited = 0usize;

        for idx in risk_priority_order(&annotated) {
            if remaining <= 0.0 {
                break;
            }
            let cp = &mut annotated[idx];
            let (suggested_exposure, suggested_rwa) = self.reduce_one(cp, remaining);

            remaining -= cp.risk_weighted_amount - suggested_rwa;
            cp.set_suggestion(suggested_exposure, suggested_rwa);
            visited += 1;
        }

        let unmet_rwa = remaining.max(0.0);
        debug!(
            current_total_rwa,
            target_total_rwa,
            rwa_to_reduce,
            unmet_rwa,
            visited,
            "allocation: reductions suggested"
        );

        Ok(AllocationOutcome {
            counterparties: annotated,
            current_total_rwa,
            target_total_rwa,
            rwa_to_reduce,
            unmet_rwa,
            visited,
        })
    }

    /// Suggested (EAD, RWA) for one counterparty given the gap still open.
    fn reduce_one(&self, cp: &Counterparty, remaining: f64) -> (f64, f64) {
        let pd = cp.default_probability;
        let lgd = cp.loss_severity;
        let exposure = cp.exposure;

        let rwa_per_unit_exposure = self.formula.rwa_per_unit_exposure(pd, lgd);
        let max_exposure_reduction = exposure * self.policy.max_reduction_fraction;

        let exposure_reduction = if rwa_per_unit_exposure > 0.0 {
            let rwa_reduction = remaining.min(max_exposure_reduction * rwa_per_unit_exposure);
            rwa_reduction / rwa_per_unit_exposure
        } else {
            0.0
        };

        let floor = exposure * self.policy.floor_fraction;
        let suggested_exposure = (exposure - exposure_reduction).max(floor);
        let suggested_rwa = self.formula.rwa(pd, lgd, suggested_exposure);
        (suggested_exposure, suggested_rwa)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
