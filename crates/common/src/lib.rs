#[cfg(test)]
mod tests;

pub mod pretty;
pub mod rowlist;

pub use rowlist::{RowList, ROWID_NULL};

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, io, time::Duration};
use thiserror::Error;
use types::Value;

/// Identifier for a column's position within a row's schema.
/// Examples:
/// - `let id_col: ColumnId = 0; // first selected column`
/// - `let name_col: ColumnId = 1;`
pub type ColumnId = u16;

/// Arena-local identifier assigned to a table the moment its driver is
/// opened for a query. Not persisted anywhere, and not stable across
/// invocations — csvql has no catalog file to assign a durable id from.
/// Examples:
/// - `let people = TableId(0); // first table named in FROM`
/// - `let orders = TableId(1); // first JOIN target`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableId(pub u32);

/// Positional row representation backed by `types::Value`.
/// Examples:
/// - `let row = Row::new(vec![Value::Int(1)]);`
/// - `let row = Row::new(vec![Value::Text("alice".into()), Value::Bool(true)]);`
/// - `let row = Row::new(vec![Value::Int(10), Value::Null]);`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Self::new(values)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

/// Named projection of a row keyed by column name.
/// Examples:
/// - `let mut map = RowMap::new(); map.insert("id".into(), Value::Int(1));`
/// - `let map = RowMap::from([("name".into(), Value::Text("alice".into()))]);`
pub type RowMap = HashMap<String, Value>;

/// Rectangular result set carrying column labels and rows, the shape the
/// `output` crate's emitters all consume.
/// Examples:
/// - `let rb = RecordBatch { columns: vec!["id".into()], rows: vec![Row::new(vec![Value::Int(1)])] };`
/// - `let rb = RecordBatch { columns: vec!["count".into()], rows: vec![Row::new(vec![Value::Int(42)])] };`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Canonical error type shared across every csvql subsystem, one variant
/// per pipeline stage (spec §7).
#[derive(Error, Debug)]
pub enum DbError {
    #[error("parse error: {0}")]
    Parser(String),
    #[error("name resolution error: {0}")]
    Resolver(String),
    #[error("table source error: {0}")]
    Source(String),
    #[error("index error: {0}")]
    Index(String),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("evaluation error: {0}")]
    Evaluator(String),
    #[error("limit exceeded: {0}")]
    Limit(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias that carries a `DbError`.
pub type DbResult<T> = Result<T, DbError>;

/// Runtime configuration for csvql's own components. Deliberately free of
/// the teacher's paged-storage knobs (`data_dir`/`page_size`/
/// `buffer_pool_pages`/`wal_enabled`) — csvql reads and writes flat files
/// directly and keeps nothing resident beyond one `RowList` stack.
///
/// # Example
/// ```
/// use common::Config;
///
/// let config = Config::builder()
///     .csv_memory_threshold_bytes(2 * 1024 * 1024)
///     .random_seed(7)
///     .build();
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, bon::Builder)]
pub struct Config {
    /// Files at or under this size are slurped fully into memory and served
    /// by the in-memory CSV driver instead of the streaming one (spec §4.3).
    #[builder(default = 1024 * 1024)]
    pub csv_memory_threshold_bytes: u64,
    /// Upper bound on a single tokeniser token's byte length, guarding
    /// against unbounded quoted-string input.
    #[builder(default = 65536)]
    pub max_token_length: usize,
    /// Upper bound on a single field's byte length when reading a row.
    #[builder(default = 1_048_576)]
    pub max_value_length: usize,
    /// Seed for the SAMPLE driver's linear congruential generator and for
    /// the `RANDOM()` function. Explicit, not a hidden process-global.
    #[builder(default = 0)]
    pub random_seed: u64,
    /// Name csvql invokes itself as when materialising a subquery to a
    /// temporary file (spec §5). Defaults to the current executable name.
    #[builder(default = String::from("csvql"))]
    pub program_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            csv_memory_threshold_bytes: 1024 * 1024,
            max_token_length: 65536,
            max_value_length: 1_048_576,
            random_seed: 0,
            program_name: String::from("csvql"),
        }
    }
}

/// Per-step execution statistics, surfaced by `EXPLAIN ANALYZE`-style
/// diagnostics (one entry per `PlanStep`, not per row).
///
/// # Examples
/// ```
/// use common::ExecutionStats;
/// use std::time::Duration;
///
/// let stats = ExecutionStats {
///     elapsed: Duration::from_millis(5),
///     rows_in: 1000,
///     rows_out: 250,
/// };
/// assert_eq!(stats.elapsed.as_millis(), 5);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ExecutionStats {
    /// Wall-clock time spent executing this step.
    pub elapsed: Duration,
    /// Rows present on top of the stack before this step ran.
    pub rows_in: u64,
    /// Rows left on top of the stack after this step ran.
    pub rows_out: u64,
}

impl ExecutionStats {
    /// Formats a duration in human-readable form (e.g. "123.45ms", "1.234s").
    pub fn format_duration(d: Duration) -> String {
        let micros = d.as_micros();
        if micros < 1000 {
            format!("{micros}µs")
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1000.0)
        } else {
            format!("{:.3}s", micros as f64 / 1_000_000.0)
        }
    }
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{Config, DbError, DbResult, ExecutionStats, RecordBatch, Row, RowMap, TableId};
    pub use types::{SqlType, Value};
}
