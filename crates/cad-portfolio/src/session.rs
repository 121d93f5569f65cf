//! Portfolio session: the caller-side state around the allocator.
//!
//! A session owns the live counterparties, the fixed CET1 capital and the
//! target ratio. Every mutation goes through `&mut self`, so optimize, apply,
//! clear and manual edits are serialized by construction.
//!
//! # Phases
//!
//! ```text
//!            optimize              apply
//!   Idle ──────────────► Suggested ──────► Applied
//!    ▲                      │                 │
//!    └── clear / edit / reset / new target ◄──┘
//! ```
//!
//! A suggestion is only meaningful relative to the exposures it was computed
//! from: any transition that changes live exposure (or the target) drops every
//! pending suggestion in the same step.

use std::collections::BTreeSet;

use cad_rwa::{RwaFormula, SimplifiedCapitalFactor};
use tracing::debug;

use crate::{
    current_cet1_ratio, sorted_by_pd, suggested_cet1_ratio, suggested_total_rwa, total_rwa,
    AllocationError, AllocationOutcome, Allocator, Counterparty, CounterpartyUpdate,
    PortfolioSnapshot,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub enum SessionError {
    /// No counterparty with this id.
    UnknownCounterparty { id: String },
    /// Two counterparties share an id.
    DuplicateCounterparty { id: String },
    /// Exposure is negative or not finite.
    InvalidExposure { id: String, exposure: f64 },
    /// PD or LGD outside (0, 1].
    InvalidRiskInput { id: String, field: &'static str, value: f64 },
    /// A ratio is zero, negative or not finite.
    InvalidRatio { field: &'static str, value: f64 },
    /// `apply_suggestions` called outside the Suggested phase.
    NoPendingSuggestions,
    /// The allocator rejected the live snapshot.
    Allocation(AllocationError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCounterparty { id } => write!(f, "unknown counterparty '{id}'"),
            Self::DuplicateCounterparty { id } => write!(f, "duplicate counterparty id '{id}'"),
            Self::InvalidExposure { id, exposure } => {
                write!(f, "invalid exposure {exposure} for counterparty '{id}'")
            }
            Self::InvalidRiskInput { id, field, value } => {
                write!(f, "{field}={value} out of (0, 1] for counterparty '{id}'")
            }
            Self::InvalidRatio { field, value } => {
                write!(f, "{field}={value} must be finite and > 0")
            }
            Self::NoPendingSuggestions => write!(f, "no pending suggestions to apply"),
            Self::Allocation(e) => write!(f, "allocation failed: {e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Allocation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AllocationError> for SessionError {
    fn from(e: AllocationError) -> Self {
        Self::Allocation(e)
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SuggestionPhase {
    /// No suggestions pending.
    Idle,
    /// Allocator output installed, not yet applied.
    Suggested,
    /// Last suggestion set became live values.
    Applied,
}

impl SuggestionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionPhase::Idle => "IDLE",
            SuggestionPhase::Suggested => "SUGGESTED",
            SuggestionPhase::Applied => "APPLIED",
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct PortfolioSession<F = SimplifiedCapitalFactor> {
    allocator: Allocator<F>,
    counterparties: Vec<Counterparty>,
    cet1_capital: f64,
    initial_ratio: f64,
    target_ratio: f64,
    phase: SuggestionPhase,
}

impl<F: RwaFormula> PortfolioSession<F> {
    /// Build a session from freshly generated counterparties.
    ///
    /// Every record is repriced and snapshotted as its reset target; CET1
    /// capital is fixed at `initial_ratio × Σ RWA` for the session's lifetime.
    pub fn initialize(
        allocator: Allocator<F>,
        counterparties: Vec<Counterparty>,
        initial_ratio: f64,
        target_ratio: f64,
    ) -> Result<Self, SessionError> {
        check_ratio("initial_ratio", initial_ratio)?;
        check_ratio("target_ratio", target_ratio)?;

        let mut session = Self {
            allocator,
            counterparties: Vec::new(),
            cet1_capital: 0.0,
            initial_ratio,
            target_ratio,
            phase: SuggestionPhase::Idle,
        };
        session.reinitialize(counterparties)?;
        Ok(session)
    }

    /// Replace the whole portfolio (new simulation). Originals are re-taken
    /// and capital is re-derived from the initial ratio.
    pub fn reinitialize(&mut self, counterparties: Vec<Counterparty>) -> Result<(), SessionError> {
        validate_book(&counterparties)?;

        let formula = self.allocator.formula();
        let mut counterparties = counterparties;
        for cp in &mut counterparties {
            cp.reprice(formula);
            cp.snapshot_original();
            cp.clear_suggestion();
        }

        self.cet1_capital = self.initial_ratio * total_rwa(&counterparties);
        self.counterparties = counterparties;
        self.phase = SuggestionPhase::Idle;
        debug!(
            counterparties = self.counterparties.len(),
            cet1_capital = self.cet1_capital,
            "session: initialized"
        );
        Ok(())
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    /// Run the allocator against live state and install its suggestions.
    pub fn optimize(&mut self) -> Result<AllocationOutcome, SessionError> {
        let outcome =
            self.allocator
                .allocate(&self.counterparties, self.cet1_capital, self.target_ratio)?;
        self.counterparties = outcome.counterparties.clone();
        self.transition(SuggestionPhase::Suggested);
        Ok(outcome)
    }

    /// Promote every pending suggestion to live values.
    pub fn apply_suggestions(&mut self) -> Result<usize, SessionError> {
        if self.phase != SuggestionPhase::Suggested {
            return Err(SessionError::NoPendingSuggestions);
        }
        let formula = self.allocator.formula();
        let mut applied = 0usize;
        for cp in &mut self.counterparties {
            if let Some(exposure) = cp.suggested_exposure {
                cp.exposure = exposure;
                cp.reprice(formula);
                cp.clear_suggestion();
                applied += 1;
            }
        }
        self.transition(SuggestionPhase::Applied);
        Ok(applied)
    }

    /// Drop pending suggestions; live values are untouched.
    pub fn clear_suggestions(&mut self) {
        self.clear_all_suggestions();
        self.transition(SuggestionPhase::Idle);
    }

    /// Manual EAD override for one counterparty.
    pub fn update_exposure(&mut self, id: &str, exposure: f64) -> Result<(), SessionError> {
        check_exposure(id, exposure)?;
        let formula = self.allocator.formula();
        let cp = find_mut(&mut self.counterparties, id)?;
        cp.exposure = exposure;
        cp.reprice(formula);
        self.clear_all_suggestions();
        self.transition(SuggestionPhase::Idle);
        Ok(())
    }

    /// Partial edit of name / PD / LGD / EAD. RWA is recomputed when a risk
    /// input changes, and pending suggestions are dropped.
    pub fn update_counterparty(
        &mut self,
        id: &str,
        update: CounterpartyUpdate,
    ) -> Result<(), SessionError> {
        if let Some(pd) = update.default_probability {
            check_unit(id, "default_probability", pd)?;
        }
        if let Some(lgd) = update.loss_severity {
            check_unit(id, "loss_severity", lgd)?;
        }
        if let Some(exposure) = update.exposure {
            check_exposure(id, exposure)?;
        }

        let touches_risk = update.touches_risk();
        let formula = self.allocator.formula();
        let cp = find_mut(&mut self.counterparties, id)?;
        if let Some(name) = update.name {
            cp.name = name;
        }
        if let Some(pd) = update.default_probability {
            cp.default_probability = pd;
        }
        if let Some(lgd) = update.loss_severity {
            cp.loss_severity = lgd;
        }
        if let Some(exposure) = update.exposure {
            cp.exposure = exposure;
        }

        if touches_risk {
            cp.reprice(formula);
            self.clear_all_suggestions();
            self.transition(SuggestionPhase::Idle);
        }
        Ok(())
    }

    /// Restore one counterparty's exposure to its initialization snapshot.
    pub fn reset_counterparty(&mut self, id: &str) -> Result<(), SessionError> {
        let formula = self.allocator.formula();
        let cp = find_mut(&mut self.counterparties, id)?;
        restore_original(cp, formula);
        self.clear_all_suggestions();
        self.transition(SuggestionPhase::Idle);
        Ok(())
    }

    /// Restore every counterparty to its initialization snapshot.
    pub fn reset_all(&mut self) {
        let formula = self.allocator.formula();
        for cp in &mut self.counterparties {
            restore_original(cp, formula);
            cp.clear_suggestion();
        }
        self.transition(SuggestionPhase::Idle);
    }

    /// Move the target. Pending suggestions were computed for the old target
    /// and are dropped.
    pub fn set_target_ratio(&mut self, target_ratio: f64) -> Result<(), SessionError> {
        check_ratio("target_ratio", target_ratio)?;
        self.target_ratio = target_ratio;
        self.clear_all_suggestions();
        self.transition(SuggestionPhase::Idle);
        Ok(())
    }

    // ── Read projections ─────────────────────────────────────────────────────

    pub fn counterparties(&self) -> &[Counterparty] {
        &self.counterparties
    }

    pub fn counterparty(&self, id: &str) -> Option<&Counterparty> {
        self.counterparties.iter().find(|c| c.id == id)
    }

    pub fn cet1_capital(&self) -> f64 {
        self.cet1_capital
    }

    pub fn initial_ratio(&self) -> f64 {
        self.initial_ratio
    }

    pub fn target_ratio(&self) -> f64 {
        self.target_ratio
    }

    pub fn phase(&self) -> SuggestionPhase {
        self.phase
    }

    /// True once a suggestion set has been applied and not since disturbed.
    pub fn optimization_applied(&self) -> bool {
        self.phase == SuggestionPhase::Applied
    }

    pub fn total_rwa(&self) -> f64 {
        total_rwa(&self.counterparties)
    }

    pub fn suggested_total_rwa(&self) -> f64 {
        suggested_total_rwa(&self.counterparties)
    }

    pub fn current_ratio(&self) -> f64 {
        current_cet1_ratio(self.cet1_capital, &self.counterparties)
    }

    pub fn suggested_ratio(&self) -> f64 {
        suggested_cet1_ratio(self.cet1_capital, &self.counterparties)
    }

    pub fn sorted_by_pd(&self) -> Vec<Counterparty> {
        sorted_by_pd(&self.counterparties)
    }

    /// Consistent copy of live state, suitable as allocator input.
    pub fn snapshot(&self) -> PortfolioSnapshot {
        PortfolioSnapshot {
            counterparties: self.counterparties.clone(),
            cet1_capital: self.cet1_capital,
            target_ratio: self.target_ratio,
        }
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn clear_all_suggestions(&mut self) {
        for cp in &mut self.counterparties {
            cp.clear_suggestion();
        }
    }

    fn transition(&mut self, next: SuggestionPhase) {
        if self.phase != next {
            debug!(from = self.phase.as_str(), to = next.as_str(), "session: phase change");
        }
        self.phase = next;
    }
}

fn find_mut<'a>(
    counterparties: &'a mut [Counterparty],
    id: &str,
) -> Result<&'a mut Counterparty, SessionError> {
    counterparties
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| SessionError::UnknownCounterparty { id: id.to_string() })
}

/// Exposure goes back to the snapshot; RWA is re-derived so a PD/LGD edit made
/// since initialization is still reflected.
fn restore_original<F: RwaFormula + ?Sized>(cp: &mut Counterparty, formula: &F) {
    if let Some(original) = cp.original_exposure {
        cp.exposure = original;
        cp.reprice(formula);
    }
}

fn validate_book(counterparties: &[Counterparty]) -> Result<(), SessionError> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for cp in counterparties {
        if !seen.insert(cp.id.as_str()) {
            return Err(SessionError::DuplicateCounterparty { id: cp.id.clone() });
        }
        check_exposure(&cp.id, cp.exposure)?;
        check_unit(&cp.id, "default_probability", cp.default_probability)?;
        check_unit(&cp.id, "loss_severity", cp.loss_severity)?;
    }
    Ok(())
}

fn check_ratio(field: &'static str, value: f64) -> Result<(), SessionError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SessionError::InvalidRatio { field, value })
    }
}

fn check_exposure(id: &str, exposure: f64) -> Result<(), SessionError> {
    if exposure.is_finite() && exposure >= 0.0 {
        Ok(())
    } else {
        Err(SessionError::InvalidExposure {
            id: id.to_string(),
            exposure,
        })
    }
}

fn check_unit(id: &str, field: &'static str, value: f64) -> Result<(), SessionError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(SessionError::InvalidRiskInput {
            id: id.to_string(),
            field,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> PortfolioSession {
        let f = SimplifiedCapitalFactor;
        PortfolioSession::initialize(
            Allocator::standard(),
            vec![
                Counterparty::new("A", 0.05, 0.5, 1_000_000.0, &f),
                Counterparty::new("B", 0.01, 0.5, 1_000_000.0, &f),
            ],
            0.14,
            0.15,
        )
        .unwrap()
    }

    #[test]
    fn initialize_fixes_capital_and_snapshots_originals() {
        let s = session();
        assert!((s.cet1_capital() - 52_500.0).abs() < 1e-6);
        assert_eq!(s.phase(), SuggestionPhase::Idle);
        for cp in s.counterparties() {
            assert_eq!(cp.original_exposure, Some(cp.exposure));
            assert_eq!(cp.original_risk_weighted_amount, Some(cp.risk_weighted_amount));
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let f = SimplifiedCapitalFactor;
        let err = PortfolioSession::initialize(
            Allocator::standard(),
            vec![
                Counterparty::new("A", 0.05, 0.5, 1.0, &f),
                Counterparty::new("A", 0.01, 0.5, 1.0, &f),
            ],
            0.14,
            0.125,
        )
        .err();
        assert_eq!(err, Some(SessionError::DuplicateCounterparty { id: "A".into() }));
    }

    #[test]
    fn apply_without_suggestions_is_rejected() {
        let mut s = session();
        assert_eq!(s.apply_suggestions(), Err(SessionError::NoPendingSuggestions));
    }

    #[test]
    fn unknown_id_is_rejected() {
        let mut s = session();
        assert_eq!(
            s.update_exposure("nope", 1.0),
            Err(SessionError::UnknownCounterparty { id: "nope".into() })
        );
        assert!(s.reset_counterparty("nope").is_err());
    }

    #[test]
    fn invalid_inputs_are_rejected_before_mutation() {
        let mut s = session();
        let before = s.counterparties().to_vec();
        assert!(s.update_exposure("A", -1.0).is_err());
        assert!(s
            .update_counterparty(
                "A",
                CounterpartyUpdate {
                    default_probability: Some(1.5),
                    exposure: Some(5.0),
                    ..CounterpartyUpdate::default()
                }
            )
            .is_err());
        assert!(s.set_target_ratio(0.0).is_err());
        assert_eq!(s.counterparties(), before.as_slice());
    }

    #[test]
    fn rename_keeps_pending_suggestions() {
        let mut s = session();
        s.optimize().unwrap();
        s.update_counterparty(
            "A",
            CounterpartyUpdate {
                name: Some("Acme Corp".into()),
                ..CounterpartyUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(s.phase(), SuggestionPhase::Suggested);
        assert_eq!(s.counterparty("A").map(|c| c.name.as_str()), Some("Acme Corp"));
        assert!(s.counterparty("A").is_some_and(Counterparty::has_suggestion));
    }

    #[test]
    fn phase_labels() {
        assert_eq!(SuggestionPhase::Idle.as_str(), "IDLE");
        assert_eq!(SuggestionPhase::Suggested.as_str(), "SUGGESTED");
        assert_eq!(SuggestionPhase::Applied.as_str(), "APPLIED");
    }
}
