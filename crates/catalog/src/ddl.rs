//! Data definition/manipulation as flat-file operations (spec §4.2's
//! `CREATE TABLE`/`CREATE INDEX`/`INSERT`/`DROP *` statements). There is no
//! metadata store to update — a table *is* its CSV file, an index *is* its
//! sibling CSV file, named `table__column.{primary,unique,index}.csv`
//! (spec §5.3, §6).

use std::path::Path;

use common::{DbError, DbResult};
use parser::ast::ColumnDef;
use types::Value;
use vfs::{OpenOptions, TableSource, csv::CsvDriver, index::IndexKind};

/// `CREATE TABLE name (col ty, ..., [PRIMARY KEY (col)])`. A multi-column
/// `primary_key` is rejected — csvql's primary index is a single sorted
/// column (spec §4.7), not a composite key.
pub fn create_table(
    name: &str,
    columns: &[ColumnDef],
    primary_key: Option<&[String]>,
    opts: &OpenOptions,
) -> DbResult<()> {
    let path = format!("{name}.csv");
    if Path::new(&path).exists() {
        return Err(DbError::Constraint(format!("table '{name}' already exists")));
    }
    let header: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    std::fs::write(&path, format!("{}\n", header.join(",")))?;

    if let Some(pk) = primary_key {
        let [column] = pk else {
            return Err(DbError::Constraint(
                "PRIMARY KEY must name exactly one column (no composite keys)".into(),
            ));
        };
        rebuild_index(name, column, IndexKind::Primary, None, opts)?;
    }
    Ok(())
}

/// `CREATE VIEW name AS <select>` (spec §6's `name.sql` view-naming rule):
/// a view is nothing but its defining query text, saved so `vfs::open`'s
/// fallback in `executor::resolve_table` can find and re-run it the next
/// time `name` appears in a `FROM` clause.
pub fn create_view(name: &str, body: &str) -> DbResult<()> {
    let path = format!("{name}.sql");
    if Path::new(&path).exists() {
        return Err(DbError::Constraint(format!("view '{name}' already exists")));
    }
    std::fs::write(path, body)?;
    Ok(())
}

pub fn drop_view(name: &str) -> DbResult<()> {
    std::fs::remove_file(format!("{name}.sql")).map_err(DbError::Io)
}

pub fn drop_table(name: &str) -> DbResult<()> {
    std::fs::remove_file(format!("{name}.csv"))?;
    for path in index_files_for(name) {
        let _ = std::fs::remove_file(path);
    }
    Ok(())
}

/// Builds an index file for `table`/`column`. `explicit_name`, when given
/// (the optional name in `CREATE [UNIQUE] INDEX name ON table (column)`),
/// is used as the file's stem instead of the default
/// `table__column.{unique,index}.csv` convention (spec §6).
pub fn create_index(
    table: &str,
    column: &str,
    unique: bool,
    explicit_name: Option<&str>,
    opts: &OpenOptions,
) -> DbResult<()> {
    let kind = if unique { IndexKind::Unique } else { IndexKind::Regular };
    rebuild_index(table, column, kind, explicit_name, opts)
}

pub fn drop_index(table: &str, column: &str) -> DbResult<()> {
    for suffix in ["primary", "unique", "index"] {
        let path = format!("{table}__{column}.{suffix}.csv");
        if Path::new(&path).is_file() {
            std::fs::remove_file(path)?;
        }
    }
    Ok(())
}

/// `DROP INDEX name` (spec §4.2): the grammar only carries the bare index
/// name, not the table/column it was built on, so this tries the explicit-
/// name file first, then falls back to the `table__column` naming
/// convention `name` itself implies.
pub fn drop_index_by_name(name: &str) -> DbResult<()> {
    let explicit = format!("{name}.csv");
    if Path::new(&explicit).is_file() {
        return std::fs::remove_file(explicit).map_err(DbError::Io);
    }
    if let Some((table, column)) = name.split_once("__") {
        return drop_index(table, column);
    }
    Err(DbError::Source(format!("no such index: {name}")))
}

/// Appends `rows` to `table`'s CSV file (in `columns` order, or the file's
/// own header order if `columns` is `None`), then rebuilds any index files
/// already on disk for that table so the indexed columns stay sorted
/// (spec §4.7's invariant that index files are always sorted).
pub fn insert_rows(
    table: &str,
    columns: Option<&[String]>,
    rows: &[Vec<Value>],
    opts: &OpenOptions,
) -> DbResult<usize> {
    let path = format!("{table}.csv");
    let driver = CsvDriver::open(table, opts)?;
    let header: Vec<String> = (0..driver.field_count())
        .map(|i| driver.field_name(i as common::ColumnId).unwrap_or("").to_string())
        .collect();

    let reorder: Option<Vec<usize>> = columns.map(|given| {
        given
            .iter()
            .map(|name| header.iter().position(|h| h == name).unwrap_or(usize::MAX))
            .collect()
    });

    let mut appended = String::new();
    for row in rows {
        let ordered: Vec<&Value> = match &reorder {
            Some(positions) => {
                let mut slots: Vec<Option<&Value>> = vec![None; header.len()];
                for (value, &pos) in row.iter().zip(positions) {
                    if pos != usize::MAX {
                        slots[pos] = Some(value);
                    }
                }
                slots.into_iter().map(|s| s.unwrap_or(&Value::Null)).collect()
            }
            None => row.iter().collect(),
        };
        let fields: Vec<String> = ordered.iter().map(|v| render_field(v)).collect();
        appended.push_str(&fields.join(","));
        appended.push('\n');
    }

    let mut contents = std::fs::read_to_string(&path)?;
    if !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(&appended);
    std::fs::write(&path, contents)?;

    for index_file in index_files_for(table) {
        if let Some((column, kind)) = parse_index_filename(table, &index_file) {
            rebuild_index(table, &column, kind, None, opts)?;
        }
    }

    Ok(rows.len())
}

fn rebuild_index(
    table: &str,
    column: &str,
    kind: IndexKind,
    explicit_name: Option<&str>,
    opts: &OpenOptions,
) -> DbResult<()> {
    let driver = CsvDriver::open(table, opts)?;
    let col = driver
        .field_index(column)
        .ok_or_else(|| DbError::Resolver(format!("unknown column '{column}'")))?;
    let values: Vec<Value> = (0..driver.record_count())
        .map(|r| driver.record_value(r, col))
        .collect::<DbResult<_>>()?;

    let (suffix, body) = match kind {
        IndexKind::Primary => {
            // A primary-key index assumes the table is already stored in
            // ascending order by this column; position in the index is the
            // rowid, so there is no separate rowid column to write.
            let mut body = String::from("value\n");
            for v in &values {
                body.push_str(&render_field(v));
                body.push('\n');
            }
            ("primary", body)
        }
        IndexKind::Unique | IndexKind::Regular => {
            let mut pairs: Vec<(Value, u32)> =
                values.into_iter().enumerate().map(|(i, v)| (v, i as u32)).collect();
            pairs.sort_by(|a, b| a.0.cmp_numeric_or_lexicographic(&b.0));
            if matches!(kind, IndexKind::Unique) {
                for w in pairs.windows(2) {
                    if w[0].0.eq_same_type(&w[1].0).unwrap_or(false) {
                        return Err(DbError::Constraint(format!(
                            "UNIQUE INDEX on {table}({column}) would have duplicate value {}",
                            w[0].0.display()
                        )));
                    }
                }
            }
            let mut body = String::from("value,rowid\n");
            for (v, rowid) in &pairs {
                body.push_str(&render_field(v));
                body.push(',');
                body.push_str(&rowid.to_string());
                body.push('\n');
            }
            (if matches!(kind, IndexKind::Unique) { "unique" } else { "index" }, body)
        }
    };

    let path = match explicit_name {
        Some(name) => format!("{name}.csv"),
        None => format!("{table}__{column}.{suffix}.csv"),
    };
    std::fs::write(path, body)?;
    Ok(())
}

fn index_files_for(table: &str) -> Vec<String> {
    let prefix = format!("{table}__");
    let Ok(entries) = std::fs::read_dir(".") else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter(|name| name.starts_with(&prefix) && name.ends_with(".csv"))
        .collect()
}

fn parse_index_filename(table: &str, filename: &str) -> Option<(String, IndexKind)> {
    let rest = filename.strip_prefix(table)?.strip_prefix("__")?;
    for (suffix, kind) in [
        (".primary.csv", IndexKind::Primary),
        (".unique.csv", IndexKind::Unique),
        (".index.csv", IndexKind::Regular),
    ] {
        if let Some(column) = rest.strip_suffix(suffix) {
            return Some((column.to_string(), kind));
        }
    }
    None
}

fn render_field(value: &Value) -> String {
    let text = value.display();
    if text.contains(',') || text.contains('"') {
        format!("\"{}\"", text.replace('"', ""))
    } else {
        text
    }
}
