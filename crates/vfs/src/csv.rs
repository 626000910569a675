//! Delimited-file driver (spec §4.3): covers both the streaming and
//! in-memory implementations `original_source/src/db-csv.c` /
//! `db-csv-mem.c` split into two VFS variants. Here it is one driver that
//! picks lazily at open time — below `csv_memory_threshold_bytes` the whole
//! file is slurped and served from memory; above it, the file stays open
//! and is indexed by line-start byte offset, reading one record at a time.
//! Either way the caller sees the same [`TableSource`] surface (spec §9).

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read, Seek, SeekFrom},
    path::Path,
};

use common::{ColumnId, DbError, DbResult, RowList};
use types::Value;

use crate::{FieldPredicate, OpenOptions, TableSource};

enum Storage {
    /// Fully materialised rows, each already split into fields.
    Memory { rows: Vec<Vec<String>> },
    /// File kept open; `line_offsets[i]` is the byte offset of data row
    /// `i` (the header line is not included — spec's open question is
    /// resolved in favour of "data rows are 0-indexed, header is
    /// separate").
    Streaming { file: File, line_offsets: Vec<u64> },
}

pub struct CsvDriver {
    storage: Storage,
    field_names: Vec<String>,
    record_count: u64,
}

impl CsvDriver {
    /// Resolves `name` to an actual path per spec §6 ("name" →
    /// `name`/`name.csv`) or to `stdin`, then opens it.
    pub fn open(name: &str, opts: &OpenOptions) -> DbResult<Self> {
        if name == "stdin" {
            return Self::from_reader(io::stdin().lock());
        }

        let path = Path::new(name);
        if path.is_file() {
            return Self::open_path(path, opts);
        }
        let with_ext = format!("{name}.csv");
        if Path::new(&with_ext).is_file() {
            return Self::open_path(Path::new(&with_ext), opts);
        }
        Err(DbError::Source(format!("no such table or file: {name}")))
    }

    fn open_path(path: &Path, opts: &OpenOptions) -> DbResult<Self> {
        let metadata = std::fs::metadata(path)?;
        if metadata.len() < opts.csv_memory_threshold_bytes {
            let file = File::open(path)?;
            return Self::from_reader(BufReader::new(file));
        }

        let mut file = File::open(path)?;
        let header = read_line(&mut file)?
            .ok_or_else(|| DbError::Source(format!("{}: empty file", path.display())))?;
        let field_names = split_csv_line(&header);

        let mut line_offsets = Vec::new();
        loop {
            let offset = file.stream_position()?;
            match read_line(&mut file)? {
                Some(line) if !line.is_empty() => line_offsets.push(offset),
                Some(_) => {}
                None => break,
            }
        }

        let record_count = line_offsets.len() as u64;
        Ok(Self {
            storage: Storage::Streaming { file, line_offsets },
            field_names,
            record_count,
        })
    }

    fn from_reader<R: Read>(mut reader: R) -> DbResult<Self> {
        let mut buf = String::new();
        reader
            .read_to_string(&mut buf)
            .map_err(|e| DbError::Source(format!("read failed: {e}")))?;
        Self::from_str(&buf)
    }

    pub(crate) fn from_str(contents: &str) -> DbResult<Self> {
        let mut lines = contents.lines();
        let header = lines
            .next()
            .ok_or_else(|| DbError::Source("empty CSV input".into()))?;
        let field_names = split_csv_line(header);

        let rows: Vec<Vec<String>> = lines
            .filter(|l| !l.is_empty())
            .map(split_csv_line)
            .collect();

        let record_count = rows.len() as u64;
        Ok(Self {
            storage: Storage::Memory { rows },
            field_names,
            record_count,
        })
    }

    fn read_streaming_row(file: &mut File, offset: u64) -> DbResult<Vec<String>> {
        file.seek(SeekFrom::Start(offset))?;
        let line = read_line(file)?.unwrap_or_default();
        Ok(split_csv_line(&line))
    }
}

impl TableSource for CsvDriver {
    fn field_index(&self, name: &str) -> Option<ColumnId> {
        self.field_names
            .iter()
            .position(|f| f == name)
            .map(|i| i as ColumnId)
    }

    fn field_name(&self, index: ColumnId) -> Option<&str> {
        self.field_names.get(index as usize).map(|s| s.as_str())
    }

    fn field_count(&self) -> usize {
        self.field_names.len()
    }

    fn record_count(&self) -> u64 {
        self.record_count
    }

    fn record_value(&self, row: u64, col: ColumnId) -> DbResult<Value> {
        let fields = match &self.storage {
            Storage::Memory { rows } => rows
                .get(row as usize)
                .ok_or_else(|| DbError::Source(format!("row {row} out of range")))?
                .clone(),
            Storage::Streaming { line_offsets, .. } => {
                let offset = *line_offsets
                    .get(row as usize)
                    .ok_or_else(|| DbError::Source(format!("row {row} out of range")))?;
                // `&self` can't reopen a `&mut File`; cheap reopen by path
                // would need the path kept around, so instead we clone the
                // handle's underlying fd via `try_clone`.
                let mut file = match &self.storage {
                    Storage::Streaming { file, .. } => file.try_clone()?,
                    Storage::Memory { .. } => unreachable!(),
                };
                Self::read_streaming_row(&mut file, offset)?
            }
        };
        Ok(match fields.get(col as usize) {
            Some(s) if s.is_empty() => Value::Null,
            Some(s) => Value::Text(s.clone()),
            None => Value::Null,
        })
    }
}

fn read_line<R: Read>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    let mut one = [0u8; 1];
    let mut saw_any = false;
    loop {
        let n = reader.read(&mut one)?;
        if n == 0 {
            break;
        }
        saw_any = true;
        if one[0] == b'\n' {
            break;
        }
        buf.push(one[0]);
    }
    if !saw_any && buf.is_empty() {
        return Ok(None);
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Splits one CSV line into fields. Quoting follows the original's
/// documented (not RFC4180) rule: a value beginning with `"` runs to the
/// next `"`, with no escaping of embedded quotes — behaviour is undefined
/// for embedded quotes, matching `original_source`'s documented limitation.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let bytes = line.as_bytes();
    let mut i = 0usize;
    while i <= bytes.len() {
        if i == bytes.len() {
            fields.push(String::new());
            break;
        }
        if bytes[i] == b'"' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && bytes[end] != b'"' {
                end += 1;
            }
            fields.push(line[start..end].to_string());
            i = end + 1;
            // Skip to the next comma.
            while i < bytes.len() && bytes[i] != b',' {
                i += 1;
            }
            i += 1;
        } else {
            let start = i;
            while i < bytes.len() && bytes[i] != b',' {
                i += 1;
            }
            fields.push(line[start..i].to_string());
            i += 1;
        }
    }
    fields
}

impl CsvDriver {
    /// Reads every value of column `col` in row order — the index file
    /// access primitives' view of a sorted two-column CSV.
    pub fn column_values(&self, col: ColumnId) -> DbResult<Vec<Value>> {
        (0..self.record_count())
            .map(|r| self.record_value(r, col))
            .collect()
    }
}

#[allow(unused)]
fn full_table_access_default(
    driver: &CsvDriver,
    out: &mut RowList,
    predicates: &[FieldPredicate],
    limit: Option<usize>,
) -> DbResult<()> {
    // Delegates to the trait default (VFS-agnostic loop); kept as a named
    // function so callers reading this module can see the CSV driver takes
    // no special path, unlike `CalendarDriver`.
    <CsvDriver as TableSource>::full_table_access(driver, out, predicates, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_fields() {
        assert_eq!(split_csv_line("1,Alice,10"), vec!["1", "Alice", "10"]);
    }

    #[test]
    fn splits_quoted_field_with_comma() {
        assert_eq!(
            split_csv_line(r#"1,"Smith, Alice",10"#),
            vec!["1", "Smith, Alice", "10"]
        );
    }

    #[test]
    fn trailing_empty_field_is_preserved() {
        assert_eq!(split_csv_line("1,Alice,"), vec!["1", "Alice", ""]);
    }

    #[test]
    fn reads_rows_from_memory_driver() {
        let driver = CsvDriver::from_str("id,name,score\n1,Alice,10\n2,Bob,20\n").unwrap();
        assert_eq!(driver.field_count(), 3);
        assert_eq!(driver.record_count(), 2);
        assert_eq!(driver.field_index("name"), Some(1));
        assert_eq!(
            driver.record_value(1, 1).unwrap(),
            Value::Text("Bob".into())
        );
    }

    #[test]
    fn empty_field_reads_as_null() {
        let driver = CsvDriver::from_str("id,name\n1,\n").unwrap();
        assert_eq!(driver.record_value(0, 1).unwrap(), Value::Null);
    }
}
