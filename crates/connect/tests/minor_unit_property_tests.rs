//! Property-based tests for money crossing the remote boundary.

use proptest::prelude::*;
use rust_decimal::Decimal;

use adsync_connect::ads::mapping::{from_minor_units, to_minor_units};

/// Amounts in [0, 10_000_000] with two decimal places.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..=1_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #[test]
    fn two_decimal_amounts_survive_the_round_trip(amount in arb_amount()) {
        let micros = to_minor_units(amount).unwrap();
        prop_assert_eq!(from_minor_units(micros), amount.normalize());
    }

    #[test]
    fn micro_units_are_exact_multiples_of_cents(amount in arb_amount()) {
        let micros = to_minor_units(amount).unwrap();
        prop_assert_eq!(micros % 10_000, 0);
        prop_assert!(micros >= 0);
    }

    #[test]
    fn sub_micro_fractions_round_half_away_from_zero(
        units in 0i64..1_000_000,
        tail in 0u32..10,
    ) {
        // units micros plus tail tenths of a micro
        let amount = Decimal::new(units * 10 + i64::from(tail), 7);
        let expected = if tail >= 5 { units + 1 } else { units };
        prop_assert_eq!(to_minor_units(amount).unwrap(), expected);
    }
}
