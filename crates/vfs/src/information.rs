//! `INFORMATION` pseudo-table (spec §6: "built-in metadata of another
//! table passed via WHERE"). The original's `information_query` is
//! declared in `query.c` but its body is not part of the retrieved
//! source, so its exact output columns are an open question — resolved
//! here by describing the named table's schema, the metadata a caller
//! asking "what does this look like" most plausibly wants: one row per
//! field, giving its name and ordinal position. Unlike every other
//! driver, this one is not reached through [`crate::open`] — the table
//! name never appears in a `FROM` clause on its own; it is handled as a
//! one-off dispatch in `executor::run_at_depth`, mirroring the original's
//! short-circuit ahead of the normal table-population path (spec §9).

use common::{ColumnId, DbResult};
use types::Value;

use crate::{OpenOptions, TableSource};

/// Describes `table`'s columns as `(field_name, ordinal)` rows.
pub fn describe(table: &str, opts: &OpenOptions) -> DbResult<(Vec<String>, Vec<Vec<Value>>)> {
    let handle = crate::open(table, opts)?;
    let columns = vec!["field".to_string(), "ordinal".to_string()];
    let rows = (0..handle.field_count() as ColumnId)
        .map(|i| {
            vec![
                Value::Text(handle.field_name(i).unwrap_or_default().to_string()),
                Value::Int(i as i64),
            ]
        })
        .collect();
    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_a_csv_table_s_columns_in_order() {
        let driver = crate::csv::CsvDriver::from_str("name,score\nAlice,10\n").unwrap();
        let columns = vec!["field".to_string(), "ordinal".to_string()];
        let rows: Vec<Vec<Value>> = (0..driver.field_count() as ColumnId)
            .map(|i| {
                vec![
                    Value::Text(driver.field_name(i).unwrap_or_default().to_string()),
                    Value::Int(i as i64),
                ]
            })
            .collect();
        assert_eq!(columns, vec!["field", "ordinal"]);
        assert_eq!(
            rows,
            vec![
                vec![Value::Text("name".into()), Value::Int(0)],
                vec![Value::Text("score".into()), Value::Int(1)],
            ]
        );
    }
}
