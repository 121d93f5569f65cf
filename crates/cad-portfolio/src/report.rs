//! Serializable summary of one allocation run.

use serde::{Deserialize, Serialize};

use crate::{suggested_total_rwa, AllocationOutcome, Counterparty};
use cad_rwa::cet1_ratio;

/// Per-counterparty view of live vs. suggested values.
///
/// `suggested_*`, `exposure_delta` and `rwa_delta` are `None` for
/// counterparties the allocator did not visit. `exposure_change_since_start`
/// is `None` for records that were never snapshotted by a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CounterpartyDelta {
    pub id: String,
    pub name: String,
    pub default_probability: f64,
    pub loss_severity: f64,
    pub exposure: f64,
    pub risk_weighted_amount: f64,
    pub suggested_exposure: Option<f64>,
    pub suggested_risk_weighted_amount: Option<f64>,
    pub exposure_delta: Option<f64>,
    pub rwa_delta: Option<f64>,
    pub exposure_change_since_start: Option<f64>,
}

impl From<&Counterparty> for CounterpartyDelta {
    fn from(cp: &Counterparty) -> Self {
        Self {
            id: cp.id.clone(),
            name: cp.name.clone(),
            default_probability: cp.default_probability,
            loss_severity: cp.loss_severity,
            exposure: cp.exposure,
            risk_weighted_amount: cp.risk_weighted_amount,
            suggested_exposure: cp.suggested_exposure,
            suggested_risk_weighted_amount: cp.suggested_risk_weighted_amount,
            exposure_delta: cp.suggested_exposure_delta(),
            rwa_delta: cp
                .suggested_risk_weighted_amount
                .map(|s| s - cp.risk_weighted_amount),
            exposure_change_since_start: cp.exposure_delta_from_original(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationReport {
    pub cet1_capital: f64,
    pub target_ratio: f64,
    pub current_total_rwa: f64,
    pub target_total_rwa: f64,
    pub suggested_total_rwa: f64,
    pub current_ratio: f64,
    pub suggested_ratio: f64,
    pub rwa_to_reduce: f64,
    pub unmet_rwa: f64,
    pub target_met: bool,
    pub counterparties: Vec<CounterpartyDelta>,
}

impl AllocationReport {
    pub fn from_outcome(cet1_capital: f64, target_ratio: f64, outcome: &AllocationOutcome) -> Self {
        let suggested_total = suggested_total_rwa(&outcome.counterparties);
        Self {
            cet1_capital,
            target_ratio,
            current_total_rwa: outcome.current_total_rwa,
            target_total_rwa: outcome.target_total_rwa,
            suggested_total_rwa: suggested_total,
            current_ratio: cet1_ratio(cet1_capital, outcome.current_total_rwa),
            suggested_ratio: cet1_ratio(cet1_capital, suggested_total),
            rwa_to_reduce: outcome.rwa_to_reduce,
            unmet_rwa: outcome.unmet_rwa,
            target_met: outcome.target_met(),
            counterparties: outcome
                .counterparties
                .iter()
                .map(CounterpartyDelta::from)
                .collect(),
        }
    }

    /// Counterparties whose suggestion actually lowers exposure.
    pub fn reduced(&self) -> impl Iterator<Item = &CounterpartyDelta> {
        self.counterparties
            .iter()
            .filter(|d| d.exposure_delta.is_some_and(|x| x < 0.0))
    }
}
