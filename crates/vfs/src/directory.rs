//! `DIR(path)` driver (spec §4.3): reads a directory once at open time,
//! exposing rows with columns {inode, name, type, path, size, created,
//! modified}. Grounded on `original_source/src/db-dir.c`'s `field_names`
//! list and entry layout; dates are Unix-epoch-to-Julian via `expr::date`.

use std::{fs, os::unix::fs::MetadataExt, path::PathBuf, time::UNIX_EPOCH};

use common::{ColumnId, DbError, DbResult};
use expr::date;
use types::Value;

use crate::TableSource;

const FIELD_NAMES: [&str; 7] = ["inode", "name", "type", "path", "size", "created", "modified"];

struct Entry {
    inode: u64,
    name: String,
    is_dir: bool,
    path: String,
    size: u64,
    created_julian: i64,
    modified_julian: i64,
}

pub struct DirectoryDriver {
    entries: Vec<Entry>,
}

fn unix_seconds_to_julian(secs: i64) -> i64 {
    const EPOCH_JULIAN: i64 = 2_440_588; // date_to_julian(1970, 1, 1)
    EPOCH_JULIAN + secs.div_euclid(86_400)
}

impl DirectoryDriver {
    pub fn open(path: &str) -> DbResult<Self> {
        let dir = PathBuf::from(path);
        let read_dir =
            fs::read_dir(&dir).map_err(|e| DbError::Source(format!("DIR({path}): {e}")))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| DbError::Source(format!("DIR({path}): {e}")))?;
            let metadata = entry.metadata().map_err(|e| DbError::Source(format!("{e}")))?;
            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(UNIX_EPOCH);
            let modified = metadata.modified().unwrap_or(UNIX_EPOCH);

            entries.push(Entry {
                inode: metadata.ino(),
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: metadata.is_dir(),
                path: entry.path().to_string_lossy().into_owned(),
                size: metadata.len(),
                created_julian: unix_seconds_to_julian(
                    created.duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0),
                ),
                modified_julian: unix_seconds_to_julian(
                    modified.duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0),
                ),
            });
        }

        Ok(Self { entries })
    }
}

impl TableSource for DirectoryDriver {
    fn field_index(&self, name: &str) -> Option<ColumnId> {
        FIELD_NAMES.iter().position(|f| *f == name).map(|i| i as ColumnId)
    }

    fn field_name(&self, index: ColumnId) -> Option<&str> {
        FIELD_NAMES.get(index as usize).copied()
    }

    fn field_count(&self) -> usize {
        FIELD_NAMES.len()
    }

    fn record_count(&self) -> u64 {
        self.entries.len() as u64
    }

    fn record_value(&self, row: u64, col: ColumnId) -> DbResult<Value> {
        let entry = self
            .entries
            .get(row as usize)
            .ok_or_else(|| DbError::Source(format!("row {row} out of range")))?;
        Ok(match FIELD_NAMES.get(col as usize).copied() {
            Some("inode") => Value::Int(entry.inode as i64),
            Some("name") => Value::Text(entry.name.clone()),
            Some("type") => Value::Text(if entry.is_dir { "dir" } else { "file" }.to_string()),
            Some("path") => Value::Text(entry.path.clone()),
            Some("size") => Value::Int(entry.size as i64),
            Some("created") => {
                let (y, m, d) = date::julian_to_date(entry.created_julian);
                Value::Text(date::format_date(y, m, d))
            }
            Some("modified") => {
                let (y, m, d) = date::julian_to_date(entry.modified_julian);
                Value::Text(date::format_date(y, m, d))
            }
            _ => Value::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lists_files_in_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hi").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let driver = DirectoryDriver::open(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(driver.record_count(), 2);

        let name_col = driver.field_index("name").unwrap();
        let type_col = driver.field_index("type").unwrap();
        let names: Vec<String> = (0..driver.record_count())
            .map(|r| driver.record_value(r, name_col).unwrap().display())
            .collect();
        assert!(names.contains(&"a.txt".to_string()));
        assert!(names.contains(&"sub".to_string()));

        let types: Vec<String> = (0..driver.record_count())
            .map(|r| driver.record_value(r, type_col).unwrap().display())
            .collect();
        assert!(types.contains(&"file".to_string()));
        assert!(types.contains(&"dir".to_string()));
    }
}
