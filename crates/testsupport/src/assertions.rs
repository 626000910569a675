//! Assertion helpers for comparing `RecordBatch`/`Row` results, with
//! `pretty_assertions`-style diffs on mismatch.

use common::{DbResult, Row};
use pretty_assertions::assert_eq as pretty_eq;
use types::Value;

/// Builds a `Row` from plain integers, for tests that only care about
/// one column's worth of shape.
pub fn int_row(values: &[i64]) -> Row {
    Row::new(values.iter().map(|&v| Value::Int(v)).collect())
}

/// Builds a `Row` from plain strings.
pub fn text_row(values: &[&str]) -> Row {
    Row::new(values.iter().map(|&v| Value::Text(v.to_string())).collect())
}

/// Asserts a query's columns, in order, match `expected`.
pub fn assert_columns(batch: &common::RecordBatch, expected: &[&str]) {
    let actual: Vec<&str> = batch.columns.iter().map(String::as_str).collect();
    pretty_eq!(actual, expected);
}

/// Asserts a query's rows, in order, match `expected` — order matters,
/// since spec §8's sort-order invariant and most scenarios depend on it.
pub fn assert_rows(batch: &common::RecordBatch, expected: &[Row]) {
    pretty_eq!(&batch.rows, expected);
}

/// Asserts a query's rows match `expected` as a multiset — for queries
/// with no `ORDER BY`, where row order is unspecified.
pub fn assert_rows_unordered(batch: &common::RecordBatch, expected: &[Row]) {
    let mut actual = batch.rows.clone();
    let mut expected = expected.to_vec();
    actual.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));
    expected.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));
    pretty_eq!(actual, expected);
}

/// Asserts `result` failed with an error whose `Display` contains `needle`.
pub fn assert_error_contains<T: std::fmt::Debug>(result: DbResult<T>, needle: &str) {
    match result {
        Ok(value) => panic!("expected error containing '{needle}', got Ok({value:?})"),
        Err(e) => {
            let message = e.to_string();
            assert!(message.contains(needle), "expected error containing '{needle}', got: {message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::RecordBatch;

    #[test]
    fn assert_rows_accepts_matching_batches() {
        let batch = RecordBatch { columns: vec!["id".into()], rows: vec![int_row(&[1]), int_row(&[2])] };
        assert_rows(&batch, &[int_row(&[1]), int_row(&[2])]);
    }

    #[test]
    #[should_panic]
    fn assert_rows_rejects_different_order() {
        let batch = RecordBatch { columns: vec!["id".into()], rows: vec![int_row(&[2]), int_row(&[1])] };
        assert_rows(&batch, &[int_row(&[1]), int_row(&[2])]);
    }

    #[test]
    fn assert_rows_unordered_ignores_order() {
        let batch = RecordBatch { columns: vec!["id".into()], rows: vec![int_row(&[2]), int_row(&[1])] };
        assert_rows_unordered(&batch, &[int_row(&[1]), int_row(&[2])]);
    }

    #[test]
    fn assert_error_contains_matches_substring() {
        let result: DbResult<()> = Err(common::DbError::Resolver("unknown column 'x'".into()));
        assert_error_contains(result, "unknown column");
    }
}
