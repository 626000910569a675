//! Subquery materialiser (spec §4.3, §5): the nested-query side of a
//! derived table or a `.sql` view is executed elsewhere (the `catalog`
//! crate, which can see `planner`/`executor` without `vfs` depending on
//! them back); this module is the half that belongs here — write the
//! already-computed rows out as CSV to a temp file, then open that file
//! with the ordinary in-memory [`crate::csv::CsvDriver`] and delete it
//! once the content has been read, exactly as
//! `original_source`'s subquery handling does via `popen`/temp files, but
//! without the self-exec round trip (spec §5 — "preserves single-threaded
//! semantics while avoiding shared state").

use std::io::Write;

use common::{DbError, DbResult};
use tempfile::NamedTempFile;
use types::Value;

use crate::csv::CsvDriver;

/// Renders `columns`/`rows` as CSV and opens it as an in-memory
/// [`CsvDriver`]. The temp file is deleted before this function returns —
/// the driver never observes that its data ever touched disk.
pub fn materialize(columns: &[String], rows: &[Vec<Value>]) -> DbResult<CsvDriver> {
    let mut file = NamedTempFile::new().map_err(DbError::Io)?;
    write_csv(&mut file, columns, rows)?;
    let contents = std::fs::read_to_string(file.path())?;
    // `file` (and its backing path) is removed here, once `contents` has
    // already been copied out.
    drop(file);
    CsvDriver::from_str(&contents)
}

fn write_csv(
    file: &mut NamedTempFile,
    columns: &[String],
    rows: &[Vec<Value>],
) -> DbResult<()> {
    writeln!(file, "{}", columns.join(",")).map_err(DbError::Io)?;
    for row in rows {
        let rendered: Vec<String> = row.iter().map(render_field).collect();
        writeln!(file, "{}", rendered.join(",")).map_err(DbError::Io)?;
    }
    file.flush().map_err(DbError::Io)?;
    Ok(())
}

fn render_field(value: &Value) -> String {
    let text = value.display();
    if text.contains(',') || text.contains('"') {
        format!("\"{}\"", text.replace('"', ""))
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableSource;

    #[test]
    fn round_trips_rows_through_a_temp_file() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let rows = vec![
            vec![Value::Int(1), Value::Text("Alice".into())],
            vec![Value::Int(2), Value::Text("Bob, Jr".into())],
        ];
        let driver = materialize(&columns, &rows).unwrap();
        assert_eq!(driver.record_count(), 2);
        assert_eq!(driver.field_index("name"), Some(1));
    }
}
