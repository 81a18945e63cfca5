//! Integration tests for the insurance product lifecycle.
//!
//! These exercise the full path across module boundaries — factory
//! orchestration, windowed deposits, capacity enforcement, outcome
//! resolution, and settlement — the way an operator node drives it,
//! with a manual clock walking the product through its windows.

use chrono::{DateTime, Utc};
use parapool_escrow::{
    Address, CapacityFactor, Clock, CreationEvent, InsuranceFactory, InsuranceProduct,
    ManualClock, Period, ProductError, VaultError, VaultState,
};

fn addr(n: u8) -> Address {
    Address::from_bytes([n; 20])
}

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("valid timestamp")
}

/// Signature window [1_000, 2_000], coverage window [1_500, 10_000].
fn product_with_rate(factory: &mut InsuranceFactory, rate_percent: u64) -> InsuranceProduct {
    factory
        .create_insurance_for(
            addr(0xAB),
            "Cov Investor 05/2020 10%",
            "Cov Insuree 05/2020 10%",
            Period::new(ts(1_500), ts(10_000)),
            Period::new(ts(1_000), ts(2_000)),
            rate_percent,
        )
        .expect("product creation")
}

fn product(factory: &mut InsuranceFactory) -> InsuranceProduct {
    product_with_rate(factory, 100)
}

// ---------------------------------------------------------------------------
// Scenario Tests
// ---------------------------------------------------------------------------

#[test]
fn scenario_totals_track_both_sides() {
    // Investor 20, insuree 10 at factor 1 -> totals 20 / 10 / 30.
    let mut factory = InsuranceFactory::new();
    let mut product = product(&mut factory);
    let clock = ManualClock::new(ts(1_500));

    product.invest(&clock, addr(1), 20).unwrap();
    product.insure(&clock, addr(2), 10).unwrap();

    let vault = product.vault();
    assert_eq!(vault.total_investor_deposits(), 20);
    assert_eq!(vault.total_insuree_deposits(), 10);
    assert_eq!(vault.total_deposits(), 30);
}

#[test]
fn scenario_capacity_breach_leaves_totals_untouched() {
    // Investor 10; insuree tries 11 at factor 1 -> CapacityExceeded, 10 / 0.
    let mut factory = InsuranceFactory::new();
    let mut product = product(&mut factory);
    let clock = ManualClock::new(ts(1_500));

    product.invest(&clock, addr(1), 10).unwrap();
    let result = product.insure(&clock, addr(2), 11);

    assert!(matches!(
        result,
        Err(ProductError::Vault(VaultError::CapacityExceeded { .. }))
    ));
    assert_eq!(product.vault().total_investor_deposits(), 10);
    assert_eq!(product.vault().total_insuree_deposits(), 0);
}

#[test]
fn scenario_case_happened_pays_the_insuree() {
    // Investor 1, insuree 1 (factor 1), activate, close(true).
    let mut factory = InsuranceFactory::new();
    let mut product = product(&mut factory);
    let clock = ManualClock::new(ts(1_500));

    product.invest(&clock, addr(1), 1).unwrap();
    product.insure(&clock, addr(2), 1).unwrap();
    product.activate(&clock).unwrap();
    product.close_case(true).unwrap();

    assert_eq!(
        product.vault().current_state(),
        VaultState::ClosedCaseHappened
    );
    assert!(product.claim_as_investor(addr(1)).is_err());
    assert!(product.claim_as_insuree(addr(2)).is_ok());
}

#[test]
fn scenario_no_insuree_refunds_the_investor() {
    let mut factory = InsuranceFactory::new();
    let mut product = product(&mut factory);
    let clock = ManualClock::new(ts(1_500));

    product.invest(&clock, addr(1), 1).unwrap();

    // Signature window closes with zero premiums.
    clock.set(ts(2_001));
    product.set_no_insuree_found(&clock).unwrap();
    assert_eq!(product.vault().current_state(), VaultState::NoInsureeFound);

    let payout = product.claim_as_investor(addr(1)).unwrap();
    assert_eq!(payout.amount, 1);
    assert_eq!(product.vault().funds_held(), 0);
}

#[test]
fn deposits_round_trip_independent_of_ordering() {
    // Two interleavings of the same per-payer deposits end at identical
    // query results.
    let deposits: &[(u8, u64, bool)] = &[
        (1, 30, true),
        (2, 25, true),
        (3, 10, false),
        (1, 5, true),
        (4, 20, false),
        (2, 15, true),
        (3, 12, false),
    ];

    let run = |order: Vec<usize>| {
        let mut factory = InsuranceFactory::new();
        let mut product = product(&mut factory);
        let clock = ManualClock::new(ts(1_500));
        // Seed enough backing so reordering premiums never trips capacity.
        product.invest(&clock, addr(9), 100).unwrap();
        for i in order {
            let (payer, amount, is_investor) = deposits[i];
            if is_investor {
                product.invest(&clock, addr(payer), amount).unwrap();
            } else {
                product.insure(&clock, addr(payer), amount).unwrap();
            }
        }
        product
    };

    let a = run(vec![0, 1, 2, 3, 4, 5, 6]);
    let b = run(vec![2, 4, 0, 6, 1, 5, 3]);

    for payer in 1..=4u8 {
        assert_eq!(
            a.vault().deposits_of_investor(&addr(payer)),
            b.vault().deposits_of_investor(&addr(payer))
        );
        assert_eq!(
            a.vault().deposits_of_insuree(&addr(payer)),
            b.vault().deposits_of_insuree(&addr(payer))
        );
    }
    assert_eq!(a.vault().deposits_of_investor(&addr(1)), 35);
    assert_eq!(a.vault().deposits_of_insuree(&addr(3)), 22);
    assert_eq!(a.vault().total_deposits(), b.vault().total_deposits());
}

// ---------------------------------------------------------------------------
// Claim Exclusivity & Settlement
// ---------------------------------------------------------------------------

#[test]
fn claims_are_mutually_exclusive_per_outcome() {
    for outcome in [true, false] {
        let mut factory = InsuranceFactory::new();
        let mut product = product(&mut factory);
        let clock = ManualClock::new(ts(1_500));

        product.invest(&clock, addr(1), 50).unwrap();
        product.insure(&clock, addr(2), 20).unwrap();
        product.activate(&clock).unwrap();
        product.close_case(outcome).unwrap();

        let investor_claim = product.claim_as_investor(addr(1));
        let insuree_claim = product.claim_as_insuree(addr(2));
        if outcome {
            assert!(investor_claim.is_err());
            assert!(insuree_claim.is_ok());
        } else {
            assert!(investor_claim.is_ok());
            assert!(insuree_claim.is_err());
        }
    }
}

#[test]
fn multi_party_settlement_drains_the_vault_exactly_once_each() {
    let mut factory = InsuranceFactory::new();
    let mut product = product(&mut factory);
    let clock = ManualClock::new(ts(1_500));

    product.invest(&clock, addr(1), 60).unwrap();
    product.invest(&clock, addr(2), 40).unwrap();
    product.insure(&clock, addr(3), 30).unwrap();
    product.insure(&clock, addr(4), 50).unwrap();
    product.activate(&clock).unwrap();
    product.close_case(true).unwrap();

    // Premium + one-to-one coverage for each insuree.
    assert_eq!(product.claim_as_insuree(addr(3)).unwrap().amount, 60);
    assert_eq!(product.claim_as_insuree(addr(4)).unwrap().amount, 100);
    assert_eq!(product.vault().funds_held(), 20);

    // Repeat claims stay rejected; history stays queryable.
    assert!(matches!(
        product.claim_as_insuree(addr(3)),
        Err(ProductError::Vault(VaultError::AlreadyClaimed { .. }))
    ));
    assert_eq!(product.vault().deposits_of_insuree(&addr(3)), 30);
}

#[test]
fn higher_rate_scales_coverage_and_payout() {
    let mut factory = InsuranceFactory::new();
    // Factor 2.0: each premium unit reserves two backing units.
    let mut product = product_with_rate(&mut factory, 200);
    let clock = ManualClock::new(ts(1_500));

    product.invest(&clock, addr(1), 100).unwrap();
    product.insure(&clock, addr(2), 40).unwrap();
    assert_eq!(product.vault().available_capacity(), 20);

    // A premium of 11 would need 22 backing; only 20 remain.
    assert!(matches!(
        product.insure(&clock, addr(3), 11),
        Err(ProductError::Vault(VaultError::CapacityExceeded { .. }))
    ));

    product.activate(&clock).unwrap();
    product.close_case(true).unwrap();
    assert_eq!(product.claim_as_insuree(addr(2)).unwrap().amount, 120);
}

#[test]
fn explicit_factor_overrides_the_configured_one() {
    let mut factory = InsuranceFactory::new();
    let mut product = product(&mut factory);
    let clock = ManualClock::new(ts(1_500));

    product.invest(&clock, addr(1), 100).unwrap();
    product
        .insure_with_factor(&clock, addr(2), 10, CapacityFactor::from_percent(300).unwrap())
        .unwrap();
    assert_eq!(product.vault().coverage_of_insuree(&addr(2)), 30);
    assert_eq!(product.vault().available_capacity(), 70);
}

// ---------------------------------------------------------------------------
// Windows & Clock
// ---------------------------------------------------------------------------

#[test]
fn the_clock_gates_every_phase() {
    let mut factory = InsuranceFactory::new();
    let mut product = product(&mut factory);
    let clock = ManualClock::new(ts(500));

    // Before the signature window: no deposits.
    assert!(matches!(
        product.invest(&clock, addr(1), 10),
        Err(ProductError::Vault(VaultError::TooEarly { .. }))
    ));

    // Inside the window but before coverage starts: deposits yes,
    // activation no.
    clock.set(ts(1_200));
    product.invest(&clock, addr(1), 10).unwrap();
    product.insure(&clock, addr(2), 5).unwrap();
    assert!(matches!(
        product.activate(&clock),
        Err(ProductError::Vault(VaultError::TooEarly { .. }))
    ));

    // Coverage has begun: activation succeeds.
    clock.set(ts(1_500));
    product.activate(&clock).unwrap();
    assert_eq!(product.vault().current_state(), VaultState::Active);

    // After the signature window everything deposit-shaped is over.
    clock.set(ts(2_500));
    assert!(matches!(
        product.invest(&clock, addr(1), 10),
        Err(ProductError::Vault(VaultError::WrongState { .. }))
    ));
}

#[test]
fn same_clock_sample_rules_the_whole_call() {
    // The clock is read once per call: a deposit exactly at the window
    // end succeeds, one second later fails.
    let mut factory = InsuranceFactory::new();
    let mut product = product(&mut factory);
    let clock = ManualClock::new(ts(2_000));

    product.invest(&clock, addr(1), 10).unwrap();
    clock.advance(chrono::Duration::seconds(1));
    assert!(matches!(
        product.invest(&clock, addr(1), 10),
        Err(ProductError::Vault(VaultError::TooLate { .. }))
    ));
}

// ---------------------------------------------------------------------------
// Receipts & Events
// ---------------------------------------------------------------------------

#[test]
fn receipts_mirror_deposits_at_the_configured_multiplier() {
    let mut factory = InsuranceFactory::new();
    let mut product = product(&mut factory);
    let clock = ManualClock::new(ts(1_500));

    product.invest(&clock, addr(1), 7).unwrap();
    product.invest(&clock, addr(1), 3).unwrap();
    product.insure(&clock, addr(2), 4).unwrap();

    assert_eq!(product.investor_coin().balance_of(&addr(1)), 10_000);
    assert_eq!(product.investor_coin().total_supply(), 10_000);
    assert_eq!(product.insuree_coin().balance_of(&addr(2)), 4_000);
    assert_eq!(product.insuree_coin().total_supply(), 4_000);
}

#[test]
fn creation_records_cover_the_whole_product() {
    let mut factory = InsuranceFactory::new();
    let product = product(&mut factory);

    let events = factory.events().all();
    assert_eq!(events.len(), 5);

    let insurance_created = events
        .iter()
        .find_map(|record| match &record.event {
            CreationEvent::InsuranceCreated {
                investor_coin,
                insuree_coin,
                money_vault,
                ..
            } => Some((*investor_coin, *insuree_coin, *money_vault)),
            _ => None,
        })
        .expect("InsuranceCreated record");

    assert_eq!(insurance_created.0, product.investor_coin().address());
    assert_eq!(insurance_created.1, product.insuree_coin().address());
    assert_eq!(insurance_created.2, product.vault().address());
}

#[test]
fn pollers_see_only_what_is_new() {
    let mut factory = InsuranceFactory::new();
    product(&mut factory);
    let checkpoint = factory.events().len() as u64;
    assert!(factory.events_since(checkpoint).is_empty());

    product(&mut factory);
    let fresh = factory.events_since(checkpoint);
    assert_eq!(fresh.len(), 5);
    assert!(fresh.iter().all(|record| record.seq >= checkpoint));
}

#[test]
fn products_from_one_factory_are_independent() {
    let mut factory = InsuranceFactory::new();
    let mut first = product(&mut factory);
    let mut second = product(&mut factory);
    let clock = ManualClock::new(ts(1_500));

    first.invest(&clock, addr(1), 100).unwrap();
    assert_eq!(second.vault().total_investor_deposits(), 0);
    assert_ne!(first.vault().address(), second.vault().address());

    // Each vault can only mint its own coins.
    second.invest(&clock, addr(1), 5).unwrap();
    assert_eq!(first.investor_coin().total_supply(), 100_000);
    assert_eq!(second.investor_coin().total_supply(), 5_000);
}

#[test]
fn system_clock_drives_a_live_window() {
    // A product whose windows straddle the real "now" works against the
    // production clock too.
    let now = parapool_escrow::SystemClock.now();
    let mut factory = InsuranceFactory::new();
    let mut product = factory
        .create_insurance_for(
            addr(0xAB),
            "Investor",
            "Insuree",
            Period::new(now - chrono::Duration::hours(1), now + chrono::Duration::days(30)),
            Period::new(now - chrono::Duration::hours(1), now + chrono::Duration::hours(1)),
            100,
        )
        .unwrap();

    let clock = parapool_escrow::SystemClock;
    product.invest(&clock, addr(1), 10).unwrap();
    product.insure(&clock, addr(2), 10).unwrap();
    product.activate(&clock).unwrap();
    assert_eq!(product.vault().current_state(), VaultState::Active);
}
