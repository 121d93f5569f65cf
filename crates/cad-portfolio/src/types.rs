use cad_rwa::RwaFormula;
use serde::{Deserialize, Serialize};

/// One risk-bearing relationship in the portfolio.
///
/// `risk_weighted_amount` is derived: it always equals
/// `formula.rwa(default_probability, loss_severity, exposure)` for the live
/// exposure. Only [`Counterparty::reprice`] writes it.
///
/// `original_*` are snapshots taken when the portfolio is initialized.
/// `suggested_*` are written only by the allocator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Counterparty {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// PD in (0, 1].
    pub default_probability: f64,
    /// LGD in (0, 1].
    pub loss_severity: f64,
    /// EAD in currency units (>= 0).
    pub exposure: f64,
    #[serde(default)]
    pub risk_weighted_amount: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_exposure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_risk_weighted_amount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_exposure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_risk_weighted_amount: Option<f64>,
}

impl Counterparty {
    /// Build a priced counterparty (RWA computed from `formula`).
    pub fn new<S, F>(
        id: S,
        default_probability: f64,
        loss_severity: f64,
        exposure: f64,
        formula: &F,
    ) -> Self
    where
        S: Into<String>,
        F: RwaFormula + ?Sized,
    {
        let id = id.into();
        let mut cp = Self {
            name: format!("Counterparty {id}"),
            id,
            default_probability,
            loss_severity,
            exposure,
            risk_weighted_amount: 0.0,
            original_exposure: None,
            original_risk_weighted_amount: None,
            suggested_exposure: None,
            suggested_risk_weighted_amount: None,
        };
        cp.reprice(formula);
        cp
    }

    /// Recompute RWA for the live exposure.
    pub fn reprice<F: RwaFormula + ?Sized>(&mut self, formula: &F) {
        self.risk_weighted_amount =
            formula.rwa(self.default_probability, self.loss_severity, self.exposure);
    }

    /// Capture the live exposure/RWA as the reset target.
    pub fn snapshot_original(&mut self) {
        self.original_exposure = Some(self.exposure);
        self.original_risk_weighted_amount = Some(self.risk_weighted_amount);
    }

    pub fn has_suggestion(&self) -> bool {
        self.suggested_exposure.is_some()
    }

    pub fn set_suggestion(&mut self, exposure: f64, risk_weighted_amount: f64) {
        self.suggested_exposure = Some(exposure);
        self.suggested_risk_weighted_amount = Some(risk_weighted_amount);
    }

    pub fn clear_suggestion(&mut self) {
        self.suggested_exposure = None;
        self.suggested_risk_weighted_amount = None;
    }

    /// Suggested RWA if present, else live RWA.
    pub fn effective_rwa(&self) -> f64 {
        self.suggested_risk_weighted_amount
            .unwrap_or(self.risk_weighted_amount)
    }

    /// Exposure change implied by the suggestion (negative = reduction).
    pub fn suggested_exposure_delta(&self) -> Option<f64> {
        self.suggested_exposure.map(|s| s - self.exposure)
    }

    /// Exposure change since initialization (negative = reduction).
    pub fn exposure_delta_from_original(&self) -> Option<f64> {
        self.original_exposure.map(|o| self.exposure - o)
    }
}

/// Partial edit of a counterparty's inputs. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CounterpartyUpdate {
    pub name: Option<String>,
    pub default_probability: Option<f64>,
    pub loss_severity: Option<f64>,
    pub exposure: Option<f64>,
}

impl CounterpartyUpdate {
    /// True if applying this update changes RWA inputs.
    pub fn touches_risk(&self) -> bool {
        self.default_probability.is_some() || self.loss_severity.is_some() || self.exposure.is_some()
    }
}

/// The full state consumed by the allocator.
///
/// `counterparties` order is display order only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub counterparties: Vec<Counterparty>,
    pub cet1_capital: f64,
    pub target_ratio: f64,
}

impl PortfolioSnapshot {
    /// Re-derive every record's RWA from its inputs and drop suggestions.
    ///
    /// Snapshots read from outside the process may carry stale or missing RWA
    /// and suggestions priced against another book.
    pub fn repriced<F: RwaFormula + ?Sized>(mut self, formula: &F) -> Self {
        for cp in &mut self.counterparties {
            cp.reprice(formula);
            cp.clear_suggestion();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cad_rwa::SimplifiedCapitalFactor;

    #[test]
    fn new_prices_counterparty() {
        let cp = Counterparty::new("1", 0.05, 0.5, 1_000_000.0, &SimplifiedCapitalFactor);
        assert_eq!(cp.risk_weighted_amount, 312_500.0);
        assert_eq!(cp.name, "Counterparty 1");
        assert!(!cp.has_suggestion());
        assert!(cp.original_exposure.is_none());
    }

    #[test]
    fn effective_rwa_prefers_suggestion() {
        let mut cp = Counterparty::new("1", 0.05, 0.5, 1_000_000.0, &SimplifiedCapitalFactor);
        assert_eq!(cp.effective_rwa(), 312_500.0);
        cp.set_suggestion(920_000.0, 287_500.0);
        assert_eq!(cp.effective_rwa(), 287_500.0);
        assert_eq!(cp.suggested_exposure_delta(), Some(-80_000.0));
        cp.clear_suggestion();
        assert_eq!(cp.effective_rwa(), 312_500.0);
    }

    #[test]
    fn update_touches_risk_only_for_inputs() {
        let rename = CounterpartyUpdate {
            name: Some("Acme".into()),
            ..CounterpartyUpdate::default()
        };
        assert!(!rename.touches_risk());
        let bump = CounterpartyUpdate {
            loss_severity: Some(0.6),
            ..CounterpartyUpdate::default()
        };
        assert!(bump.touches_risk());
    }

    #[test]
    fn snapshot_deserializes_without_derived_fields() {
        let raw = r#"{
            "counterparties": [
                {"id": "A", "default_probability": 0.05, "loss_severity": 0.5, "exposure": 1000000.0}
            ],
            "cet1_capital": 52500.0,
            "target_ratio": 0.15
        }"#;
        let snap: PortfolioSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snap.counterparties[0].risk_weighted_amount, 0.0);
        let snap = snap.repriced(&SimplifiedCapitalFactor);
        assert_eq!(snap.counterparties[0].risk_weighted_amount, 312_500.0);
        assert!(snap.counterparties[0].suggested_exposure.is_none());
    }

    #[test]
    fn repriced_drops_carried_suggestions() {
        let raw = r#"{
            "counterparties": [
                {"id": "B", "default_probability": 0.01, "loss_severity": 0.5, "exposure": 1000000.0,
                 "suggested_exposure": 5.0, "suggested_risk_weighted_amount": 1.0}
            ],
            "cet1_capital": 52500.0,
            "target_ratio": 0.15
        }"#;
        let snap: PortfolioSnapshot = serde_json::from_str(raw).unwrap();
        assert!(snap.counterparties[0].has_suggestion());
        let snap = snap.repriced(&SimplifiedCapitalFactor);
        assert!(!snap.counterparties[0].has_suggestion());
        assert_eq!(snap.counterparties[0].effective_rwa(), 62_500.0);
    }
}
