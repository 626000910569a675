//! `proptest` strategies for csvql's core types, used to exercise spec
//! §8's universal invariants (date round-trip, value equality/ordering).

use common::Row;
use proptest::prelude::*;
use types::Value;

/// A mix of Int, Text, Bool, and Null values — the four variants every
/// CSV-backed column can hold (spec §3's `Value`).
pub fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        "[a-z]{0,20}".prop_map(Value::Text),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
    ]
}

/// Rows with 1-10 columns of random values.
pub fn arb_row() -> impl Strategy<Value = Row> {
    prop::collection::vec(arb_value(), 1..10).prop_map(Row::new)
}

/// Rows with exactly `len` columns.
pub fn arb_row_with_len(len: usize) -> impl Strategy<Value = Row> {
    prop::collection::vec(arb_value(), len).prop_map(Row::new)
}

/// A calendar date within a range wide enough to cross several leap-year
/// and ISO-week-53 boundaries (spec §4.4's `CALENDAR` table and
/// `EXTRACT(WEEK ...)` both rely on the Julian-day conversion this
/// generator drives).
pub fn arb_calendar_date() -> impl Strategy<Value = (i64, i64, i64)> {
    (1900i64..2100, 1i64..=12).prop_flat_map(|(year, month)| {
        let max_day = expr::date::days_in_month(year, month);
        (Just(year), Just(month), 1i64..=max_day)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn value_equality_is_reflexive(value in arb_value()) {
            assert_eq!(value, value);
        }

        #[test]
        fn row_clone_round_trips(row in arb_row()) {
            let cloned = row.clone();
            assert_eq!(row.values, cloned.values);
        }

        #[test]
        fn row_with_len_matches_requested_length(row in arb_row_with_len(5)) {
            assert_eq!(row.values.len(), 5);
        }

        #[test]
        fn calendar_date_julian_day_round_trips((y, m, d) in arb_calendar_date()) {
            let jd = expr::date::date_to_julian(y, m, d);
            let (ry, rm, rd) = expr::date::julian_to_date(jd);
            assert_eq!((y, m, d), (ry, rm, rd));
        }
    }
}
