//! Property tests for the position reduction

use proptest::prelude::*;
use rust_decimal::Decimal;
use yield_math::*;

const NOW: i64 = 1_750_000_000;

fn deposits_strategy() -> impl Strategy<Value = Vec<DepositEvent>> {
    prop::collection::vec(
        (1u128..10_000_000_000_000u128, 0i64..(5 * SECONDS_PER_YEAR)),
        0..20,
    )
    .prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(amount, age)| DepositEvent::deposit(amount, NOW - age))
            .collect()
    })
}

proptest! {
    #[test]
    fn total_deposited_is_converted_sum(
        flows in deposits_strategy(),
        decimals in prop::sample::select(vec![6u32, 8, 18]),
    ) {
        let raw_sum: u128 = flows.iter().map(|f| f.amount).sum();
        let position = compute_position(0, decimals, &flows, NOW).unwrap();

        prop_assert_eq!(position.total_deposited, to_decimal(raw_sum, decimals).unwrap());
    }

    #[test]
    fn interest_is_balance_minus_deposits(
        flows in deposits_strategy(),
        balance in 0u128..100_000_000_000_000u128,
    ) {
        let position = compute_position(balance, 6, &flows, NOW).unwrap();

        prop_assert_eq!(position.interest, position.current_balance - position.total_deposited);
    }

    #[test]
    fn reduction_is_idempotent(
        flows in deposits_strategy(),
        balance in 0u128..100_000_000_000_000u128,
    ) {
        let first = compute_position(balance, 6, &flows, NOW).unwrap();
        let second = compute_position(balance, 6, &flows, NOW).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn rate_sign_follows_interest(
        flows in deposits_strategy(),
        balance in 0u128..100_000_000_000_000u128,
    ) {
        let position = compute_position(balance, 6, &flows, NOW).unwrap();

        match position.apy {
            Apy::Annualized(rate) => {
                prop_assert!(position.exposure > Decimal::ZERO);
                prop_assert_eq!(rate.is_sign_negative() && !rate.is_zero(), position.interest < Decimal::ZERO);
            }
            Apy::InsufficientData => prop_assert!(position.exposure <= Decimal::ZERO),
        }
    }
}

#[test]
fn empty_history_never_yields_a_rate() {
    let position = compute_position(1_000_000, 6, &[], NOW).unwrap();
    assert_eq!(position.apy, Apy::InsufficientData);
}
