//! Risk priority ordering.
//!
//! Exposure is cut from the highest-PD counterparties first.
//!
//! # Sort key
//!
//! `default_probability` descending. Ties keep their input order: the sort is
//! stable, so the same input sequence always yields the same processing order.

use crate::Counterparty;

/// Indices into `counterparties` in processing order (highest PD first).
pub fn risk_priority_order(counterparties: &[Counterparty]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..counterparties.len()).collect();
    // Vec::sort_by is stable.
    order.sort_by(|&a, &b| {
        counterparties[b]
            .default_probability
            .total_cmp(&counterparties[a].default_probability)
    });
    order
}

/// Copy of `counterparties` sorted by PD descending (display helper).
pub fn sorted_by_pd(counterparties: &[Counterparty]) -> Vec<Counterparty> {
    risk_priority_order(counterparties)
        .into_iter()
        .map(|i| counterparties[i].clone())
        .collect()
}
