//! cad-portfolio
//!
//! Counterparty portfolio model and capital-relief allocation.
//! - Counterparty records carry live, original and suggested EAD/RWA
//! - Risk-prioritized allocator (highest PD reduced first, 80 % cap / 20 % floor)
//! - RWA totals and CET1 ratio projections
//! - Session state machine: Idle -> Suggested -> Applied
//! - Pure deterministic logic (no IO, no time, no randomness)

mod metrics;
mod ordering;
mod types;

pub mod allocator;
pub mod report;
pub mod session;

pub use allocator::{AllocationError, AllocationOutcome, AllocationPolicy, Allocator};
pub use metrics::{
    current_cet1_ratio, suggested_cet1_ratio, suggested_total_rwa, total_exposure, total_rwa,
};
pub use ordering::{risk_priority_order, sorted_by_pd};
pub use report::{AllocationReport, CounterpartyDelta};
pub use session::{PortfolioSession, SessionError, SuggestionPhase};
pub use types::{Counterparty, CounterpartyUpdate, PortfolioSnapshot};

pub use cad_rwa::{RwaFormula, SimplifiedCapitalFactor};
