//! `SEQUENCE(n)` driver (spec §4.3): integers `0..n` with a single column.

use common::{ColumnId, DbResult};
use types::Value;

use crate::TableSource;

pub struct SequenceDriver {
    n: u64,
}

impl SequenceDriver {
    pub fn new(n: u64) -> Self {
        Self { n }
    }
}

impl TableSource for SequenceDriver {
    fn field_index(&self, name: &str) -> Option<ColumnId> {
        (name == "value" || name == "n").then_some(0)
    }

    fn field_name(&self, index: ColumnId) -> Option<&str> {
        (index == 0).then_some("value")
    }

    fn field_count(&self) -> usize {
        1
    }

    fn record_count(&self) -> u64 {
        self.n
    }

    fn record_value(&self, row: u64, _col: ColumnId) -> DbResult<Value> {
        Ok(Value::Int(row as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_zero_based_integers() {
        let driver = SequenceDriver::new(3);
        assert_eq!(driver.record_count(), 3);
        assert_eq!(driver.record_value(0, 0).unwrap(), Value::Int(0));
        assert_eq!(driver.record_value(2, 0).unwrap(), Value::Int(2));
    }
}
