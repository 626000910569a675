//! `SAMPLE` driver (spec §4.3): deterministic pseudo-random rows (id, name,
//! birth_date, score) generated by a small LCG, grounded on
//! `original_source/src/db-sample.c`'s `field_names` and `BASE_DATE`
//! (1700-01-01), reproduced here with csvql's own `expr::Lcg` so the seed
//! is an explicit parameter rather than a `rand()` process singleton
//! (spec §5/§9).

use common::{ColumnId, DbResult};
use expr::{Lcg, date};
use types::Value;

use crate::TableSource;

const FIELD_NAMES: [&str; 4] = ["id", "name", "birth_date", "score"];
const BASE_JULIAN: i64 = 2_341_972; // 1700-01-01
const DATE_RANGE_DAYS: i64 = 131_072; // 2^17, ~360 years either side

const FIRST_SYLLABLES: [&str; 8] = ["al", "ba", "ca", "de", "el", "fa", "go", "ha"];
const SECOND_SYLLABLES: [&str; 8] = ["ri", "na", "mo", "ta", "la", "ni", "so", "da"];

pub struct SampleDriver {
    seed: u64,
    record_count: u64,
}

impl SampleDriver {
    pub fn new(seed: u64, record_count: u64) -> Self {
        Self { seed, record_count }
    }

    fn row_rng(&self, row: u64) -> Lcg {
        // Re-seed deterministically per row so `record_value` stays a pure
        // function of `(seed, row)` — the executor may read the same row
        // more than once across plan steps.
        Lcg::new(self.seed.wrapping_add(row).wrapping_mul(2654435761))
    }

    fn name(rng: &mut Lcg) -> String {
        let a = FIRST_SYLLABLES[(rng.next_i64().unsigned_abs() as usize) % FIRST_SYLLABLES.len()];
        let b = SECOND_SYLLABLES[(rng.next_i64().unsigned_abs() as usize) % SECOND_SYLLABLES.len()];
        let mut name = format!("{a}{b}");
        if let Some(c) = name.get_mut(0..1) {
            c.make_ascii_uppercase();
        }
        name
    }

    fn birth_date(rng: &mut Lcg) -> String {
        let offset = (rng.next_i64().unsigned_abs() as i64) % DATE_RANGE_DAYS;
        let jd = BASE_JULIAN + offset;
        let (y, m, d) = date::julian_to_date(jd);
        date::format_date(y, m, d)
    }
}

impl TableSource for SampleDriver {
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
        self.record_count
    }

    fn record_value(&self, row: u64, col: ColumnId) -> DbResult<Value> {
        let mut rng = self.row_rng(row);
        Ok(match FIELD_NAMES.get(col as usize).copied() {
            Some("id") => Value::Int(row as i64),
            Some("name") => {
                let name = Self::name(&mut rng);
                Value::Text(name)
            }
            Some("birth_date") => {
                let _ = Self::name(&mut rng); // keep stream position aligned with "name"
                Value::Text(Self::birth_date(&mut rng))
            }
            Some("score") => {
                let _ = Self::name(&mut rng);
                let _ = Self::birth_date(&mut rng);
                Value::Int((rng.next_i64().unsigned_abs() % 101) as i64)
            }
            _ => Value::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_a_given_seed() {
        let a = SampleDriver::new(42, 10);
        let b = SampleDriver::new(42, 10);
        let name_col = a.field_index("name").unwrap();
        assert_eq!(
            a.record_value(3, name_col).unwrap(),
            b.record_value(3, name_col).unwrap()
        );
    }

    #[test]
    fn score_within_bounds() {
        let driver = SampleDriver::new(7, 50);
        let score_col = driver.field_index("score").unwrap();
        for row in 0..50 {
            let Value::Int(score) = driver.record_value(row, score_col).unwrap() else {
                panic!("expected int score");
            };
            assert!((0..=100).contains(&score));
        }
    }
}
