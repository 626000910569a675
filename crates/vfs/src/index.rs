//! Index file access primitives (spec §4.7): binary search over a sorted
//! two-column CSV (`original_source/src/indices.c`'s
//! `indexSearch`/`indexUniqueScan`/`indexScan`/`indexSeek`). Index files
//! are opened through the same [`crate::csv::CsvDriver`] used for data
//! files — an index is just another CSV, per spec §5.3.

use std::{cmp::Ordering, path::PathBuf};

use common::{ColumnId, DbError, DbResult, RowList};
use expr::{BinaryOp, compare_values};
use types::Value;

use crate::{OpenOptions, TableSource, csv::CsvDriver};

/// What kind of index a [`find_index`] lookup reported (spec §4.3's
/// `find_index` contract).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexKind {
    Primary,
    Unique,
    Regular,
}

#[derive(Clone, Debug)]
pub struct IndexFile {
    pub kind: IndexKind,
    pub path: PathBuf,
}

/// Locates an on-disk index file for `table`/`column` (spec §6's naming
/// convention: `table__field.index.csv` / `table__field.unique.csv`, or a
/// `table__field.primary.csv` convention csvql uses for the PK variant).
/// Returns `None` (mapped by the caller to `find_index`'s `NONE`) if no
/// matching file exists.
pub fn find_index(table: &str, column: &str) -> Option<IndexFile> {
    let primary = format!("{table}__{column}.primary.csv");
    if std::path::Path::new(&primary).is_file() {
        return Some(IndexFile { kind: IndexKind::Primary, path: primary.into() });
    }
    let unique = format!("{table}__{column}.unique.csv");
    if std::path::Path::new(&unique).is_file() {
        return Some(IndexFile { kind: IndexKind::Unique, path: unique.into() });
    }
    let regular = format!("{table}__{column}.index.csv");
    if std::path::Path::new(&regular).is_file() {
        return Some(IndexFile { kind: IndexKind::Regular, path: regular.into() });
    }
    None
}

pub fn open_index(file: &IndexFile, opts: &OpenOptions) -> DbResult<CsvDriver> {
    let path = file
        .path
        .to_str()
        .ok_or_else(|| DbError::Index("index path is not valid UTF-8".into()))?;
    CsvDriver::open(path, opts)
}

/// Outcome of a single [`binary_search`] probe, mirroring the original's
/// "found / would-be-inserted-here / below-min / above-max" status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    Found,
    Between,
    BelowMin,
    AboveMax,
}

/// Binary searches the sorted value column (column 0) of an index driver
/// for `target`, returning the matching (or insertion) position and a
/// status describing whether it was an exact match.
pub fn binary_search(index: &CsvDriver, target: &Value) -> DbResult<(usize, SearchStatus)> {
    let n = index.record_count() as usize;
    if n == 0 {
        return Ok((0, SearchStatus::BelowMin));
    }
    let mut lo = 0usize;
    let mut hi = n;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let v = index.record_value(mid as u64, 0)?;
        match compare_values(&v, target) {
            Ordering::Less => lo = mid + 1,
            Ordering::Equal => return Ok((mid, SearchStatus::Found)),
            Ordering::Greater => hi = mid,
        }
    }
    let status = if lo == 0 {
        SearchStatus::BelowMin
    } else if lo == n {
        SearchStatus::AboveMax
    } else {
        SearchStatus::Between
    };
    Ok((lo, status))
}

/// First position `i` with `index[i] >= target` (a "lower bound" probe,
/// used by [`index_seek`] to find the start of a run of equal values).
fn lower_bound(index: &CsvDriver, target: &Value) -> DbResult<usize> {
    let n = index.record_count() as usize;
    let mut lo = 0usize;
    let mut hi = n;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let v = index.record_value(mid as u64, 0)?;
        if compare_values(&v, target) == Ordering::Less {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    Ok(lo)
}

/// First position `i` with `index[i] > target`.
fn upper_bound(index: &CsvDriver, target: &Value) -> DbResult<usize> {
    let n = index.record_count() as usize;
    let mut lo = 0usize;
    let mut hi = n;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let v = index.record_value(mid as u64, 0)?;
        if compare_values(&v, target) == Ordering::Greater {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Ok(lo)
}

fn rowid_at(index: &CsvDriver, pos: usize, rowid_col: Option<ColumnId>) -> DbResult<u32> {
    match rowid_col {
        Some(col) => {
            let v = index.record_value(pos as u64, col)?;
            v.looks_numeric()
                .map(|n| n as u32)
                .ok_or_else(|| DbError::Index(format!("non-numeric rowid in index at row {pos}")))
        }
        None => Ok(pos as u32),
    }
}

fn walk(
    index: &CsvDriver,
    rowid_col: Option<ColumnId>,
    lo: usize,
    hi: usize,
    limit: Option<usize>,
    out: &mut RowList,
) -> DbResult<()> {
    let hi = match limit {
        Some(l) => hi.min(lo + l),
        None => hi,
    };
    for pos in lo..hi {
        out.append(rowid_at(index, pos, rowid_col)?);
    }
    Ok(())
}

/// `rowid_col`: `None` for a primary-key index (rowid == position),
/// `Some(1)` for unique/regular indexes that carry an explicit rowid
/// column.
fn equality_range(
    index: &CsvDriver,
    op: BinaryOp,
    value: &Value,
) -> DbResult<Option<(usize, usize)>> {
    let (pos, status) = binary_search(index, value)?;
    let n = index.record_count() as usize;
    Ok(match op {
        BinaryOp::Eq => {
            if status == SearchStatus::Found {
                Some((pos, pos + 1))
            } else {
                None
            }
        }
        BinaryOp::Lt => Some((0, pos)),
        BinaryOp::Le => {
            Some((0, if status == SearchStatus::Found { pos + 1 } else { pos }))
        }
        BinaryOp::Gt => {
            Some((if status == SearchStatus::Found { pos + 1 } else { pos }, n))
        }
        BinaryOp::Ge => Some((pos, n)),
        _ => None,
    })
}

/// spec §4.7's `primary_seek`: binary search against a PK index (or the
/// data file treated as one), rowid == position.
pub fn primary_seek(
    index: &CsvDriver,
    op: BinaryOp,
    value: &Value,
    limit: Option<usize>,
) -> DbResult<RowList> {
    seek_unique_or_primary(index, None, op, value, limit)
}

/// spec §4.7's `unique_seek`: as `primary_seek`, but reads an explicit
/// rowid column (column 1) of each matched index row.
pub fn unique_seek(
    index: &CsvDriver,
    op: BinaryOp,
    value: &Value,
    limit: Option<usize>,
) -> DbResult<RowList> {
    seek_unique_or_primary(index, Some(1), op, value, limit)
}

fn seek_unique_or_primary(
    index: &CsvDriver,
    rowid_col: Option<ColumnId>,
    op: BinaryOp,
    value: &Value,
    limit: Option<usize>,
) -> DbResult<RowList> {
    let mut out = RowList::with_capacity(1, limit.unwrap_or(index.record_count() as usize));
    if op == BinaryOp::Ne {
        let (pos, _status) = binary_search(index, value)?;
        let n = index.record_count() as usize;
        walk(index, rowid_col, 0, pos, limit, &mut out)?;
        let remaining = limit.map(|l| l.saturating_sub(out.row_count()));
        walk(index, rowid_col, pos + 1, n, remaining, &mut out)?;
        return Ok(out);
    }
    if let Some((lo, hi)) = equality_range(index, op, value)? {
        walk(index, rowid_col, lo, hi, limit, &mut out)?;
    }
    Ok(out)
}

/// spec §4.7's `index_seek`: non-unique index, finds the first and last
/// occurrences of `value` via two binary searches, then walks the run.
/// Supports `LIKE prefix%` by searching `prefix` as a lower bound and the
/// code-point-incremented prefix as an exclusive upper bound.
pub fn index_seek(
    index: &CsvDriver,
    op: BinaryOp,
    value: &Value,
    limit: Option<usize>,
) -> DbResult<RowList> {
    let mut out = RowList::with_capacity(1, limit.unwrap_or(index.record_count() as usize));

    if op == BinaryOp::Like {
        let prefix = value.display();
        let prefix_owned = prefix.trim_end_matches('%').to_string();
        let lo = lower_bound(index, &Value::Text(prefix_owned.clone()))?;
        let upper_text = next_prefix(&prefix_owned);
        let hi = match upper_text {
            Some(next) => lower_bound(index, &Value::Text(next))?,
            None => index.record_count() as usize,
        };
        walk(index, Some(1), lo, hi, limit, &mut out)?;
        return Ok(out);
    }

    if op == BinaryOp::Ne {
        let lo = lower_bound(index, value)?;
        let hi = upper_bound(index, value)?;
        let n = index.record_count() as usize;
        walk(index, Some(1), 0, lo, limit, &mut out)?;
        let remaining = limit.map(|l| l.saturating_sub(out.row_count()));
        walk(index, Some(1), hi, n, remaining, &mut out)?;
        return Ok(out);
    }

    let n = index.record_count() as usize;
    let (range_lo, range_hi) = match op {
        BinaryOp::Eq => (lower_bound(index, value)?, upper_bound(index, value)?),
        BinaryOp::Lt => (0, lower_bound(index, value)?),
        BinaryOp::Le => (0, upper_bound(index, value)?),
        BinaryOp::Gt => (upper_bound(index, value)?, n),
        BinaryOp::Ge => (lower_bound(index, value)?, n),
        _ => (0, 0),
    };
    walk(index, Some(1), range_lo, range_hi, limit, &mut out)?;
    Ok(out)
}

/// spec §4.7's `index_scan`: walks the entire index in stored order —
/// used when a preceding index already produces ORDER BY/GROUP BY order.
pub fn index_scan(index: &CsvDriver, limit: Option<usize>) -> DbResult<RowList> {
    let mut out = RowList::with_capacity(1, limit.unwrap_or(index.record_count() as usize));
    walk(index, Some(1), 0, index.record_count() as usize, limit, &mut out)?;
    Ok(out)
}

/// The next string after incrementing the final Unicode scalar value of
/// `prefix` — used to turn a `LIKE 'prefix%'` lower bound into an
/// exclusive upper bound (`"M" -> "N"`). Returns `None` if `prefix` is
/// empty (no upper bound needed — matches everything from the prefix on).
fn next_prefix(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    let last = chars.pop()?;
    let incremented = char::from_u32(last as u32 + 1)?;
    chars.push(incremented);
    Some(chars.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_unique_index() -> CsvDriver {
        // value,rowid — sorted ascending.
        CsvDriver::from_str("value,rowid\n10,2\n20,0\n30,1\n40,3\n").unwrap()
    }

    #[test]
    fn unique_seek_equality() {
        let idx = sample_unique_index();
        let rl = unique_seek(&idx, BinaryOp::Eq, &Value::Int(20), None).unwrap();
        assert_eq!(rl.row_count(), 1);
        assert_eq!(rl.row(0), &[0]);
    }

    #[test]
    fn unique_seek_range() {
        let idx = sample_unique_index();
        let rl = unique_seek(&idx, BinaryOp::Ge, &Value::Int(20), None).unwrap();
        assert_eq!(rl.row_count(), 3);
    }

    #[test]
    fn index_seek_like_prefix() {
        let idx = CsvDriver::from_str("value,rowid\nMax,0\nMay,1\nNina,2\n").unwrap();
        let rl = index_seek(&idx, BinaryOp::Like, &Value::Text("Ma%".into()), None).unwrap();
        assert_eq!(rl.row_count(), 2);
    }

    #[test]
    fn primary_seek_uses_position_as_rowid() {
        let idx = CsvDriver::from_str("value\n10\n20\n30\n").unwrap();
        let rl = primary_seek(&idx, BinaryOp::Eq, &Value::Int(20), None).unwrap();
        assert_eq!(rl.row(0), &[1]);
    }
}
