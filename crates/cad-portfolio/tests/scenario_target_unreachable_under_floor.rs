//! Scenario: the 20 % floor makes the target unreachable.
//!
//! One counterparty, RWA 312 500. capital 5 000, target 10 % → required RWA
//! 50 000, gap 262 500. The 80 % cap allows at most 250 000 of relief.
//!
//! # Invariants under test
//!
//! 1. The allocator terminates without error.
//! 2. The suggestion sits exactly on the floor (20 % of EAD).
//! 3. The outcome reports the 12 500 RWA that could not be shed.

use cad_portfolio::{Allocator, AllocationPolicy, Counterparty, SimplifiedCapitalFactor};

fn single() -> Vec<Counterparty> {
    vec![Counterparty::new(
        "A",
        0.05,
        0.5,
        1_000_000.0,
        &SimplifiedCapitalFactor,
    )]
}

#[test]
fn capped_suggestion_lands_on_floor() {
    let book = single();
    let out = Allocator::standard().allocate(&book, 5_000.0, 0.10).unwrap();

    let a = &out.counterparties[0];
    let floor = a.exposure * 0.2;
    let suggested = a.suggested_exposure.unwrap();
    assert!(suggested >= floor);
    assert!((suggested - floor).abs() < 1e-6, "suggested={suggested} floor={floor}");
    assert!((a.suggested_risk_weighted_amount.unwrap() - 62_500.0).abs() < 1e-6);

    assert!(!out.target_met());
    assert!((out.unmet_rwa - 12_500.0).abs() < 1e-6, "unmet={}", out.unmet_rwa);
}

#[test]
fn whole_book_at_floor_when_target_is_far_away() {
    let f = SimplifiedCapitalFactor;
    let book = vec![
        Counterparty::new("A", 0.04, 0.6, 3_000_000.0, &f),
        Counterparty::new("B", 0.02, 0.3, 7_500_000.0, &f),
        Counterparty::new("C", 0.01, 0.7, 1_250_000.0, &f),
    ];
    let out = Allocator::standard().allocate(&book, 1.0, 0.5).unwrap();

    assert_eq!(out.visited, 3);
    for cp in &out.counterparties {
        let s = cp.suggested_exposure.unwrap();
        assert!((s - cp.exposure * 0.2).abs() < 1e-6, "{}: {s}", cp.id);
    }
    assert!(!out.target_met());
}

#[test]
fn looser_policy_moves_the_floor() {
    let allocator = Allocator::new(AllocationPolicy {
        max_reduction_fraction: 0.5,
        floor_fraction: 0.5,
    });
    let out = allocator.allocate(&single(), 5_000.0, 0.10).unwrap();
    let s = out.counterparties[0].suggested_exposure.unwrap();
    assert!((s - 500_000.0).abs() < 1e-6, "suggested={s}");
    assert!((out.unmet_rwa - 106_250.0).abs() < 1e-6);
}
