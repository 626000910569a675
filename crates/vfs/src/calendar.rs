//! `CALENDAR` driver (spec §4.3): a synthetic table of Julian-day rows with
//! ~28 computed columns, grounded in `original_source/src/db-calendar.c`'s
//! row generation and `expr::date`'s Julian/ISO-week arithmetic.
//!
//! `record_count` is a declared bound of 10,000,000 days (spec §9's open
//! question), so [`CalendarDriver::full_table_access`] narrows the
//! iteration range from equality/inequality predicates on `julian`,
//! `date`, or `year` instead of enumerating the full declared bound —
//! an unqualified `SELECT * FROM CALENDAR` is not expected to terminate in
//! reasonable time, matching the original.

use common::{ColumnId, DbResult, RowList};
use expr::{BinaryOp, date};
use types::Value;

use crate::{FieldPredicate, TableSource};

/// Declared record count — far larger than any query is expected to
/// actually enumerate without predicate narrowing.
const DECLARED_RECORD_COUNT: u64 = 10_000_000;

/// Julian day 0 falls in 4713 BC; csvql's calendar starts at year 1 to
/// match the date-arithmetic validity range `expr::date` documents.
const FIRST_JULIAN: i64 = 1_721_426; // date_to_julian(1, 1, 1)

const FIELD_NAMES: [&str; 28] = [
    "julian",
    "date",
    "year",
    "month",
    "day",
    "week",
    "weekday",
    "weekyear",
    "yearday",
    "millennium",
    "century",
    "decade",
    "quarter",
    "first_of_year",
    "last_of_year",
    "first_of_quarter",
    "last_of_quarter",
    "first_of_month",
    "last_of_month",
    "first_of_week",
    "last_of_week",
    "is_leap_year",
    "weekday_in_month",
    "is_weekend",
    "month_string",
    "week_string",
    "yearday_string",
    "weekday_string",
];

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub struct CalendarDriver;

impl CalendarDriver {
    pub fn new() -> Self {
        Self
    }

    fn julian_for_rowid(rowid: u64) -> i64 {
        FIRST_JULIAN + rowid as i64
    }

    fn rowid_for_julian(jd: i64) -> u64 {
        (jd - FIRST_JULIAN).max(0) as u64
    }

    fn column_value(jd: i64, col: ColumnId) -> Value {
        let (year, month, day) = date::julian_to_date(jd);
        let weekday = date::weekday(jd);
        let (weekyear, week) = date::iso_year_week(year, month, day);
        let yearday = date::ordinal_day(year, month, day);

        match FIELD_NAMES.get(col as usize).copied() {
            Some("julian") => Value::Int(jd),
            Some("date") => Value::Text(date::format_date(year, month, day)),
            Some("year") => Value::Int(year),
            Some("month") => Value::Int(month),
            Some("day") => Value::Int(day),
            Some("week") => Value::Int(week),
            Some("weekday") => Value::Int(weekday),
            Some("weekyear") => Value::Int(weekyear),
            Some("yearday") => Value::Int(yearday),
            Some("millennium") => Value::Int((year - 1).div_euclid(1000) + 1),
            Some("century") => Value::Int((year - 1).div_euclid(100) + 1),
            Some("decade") => Value::Int(year.div_euclid(10)),
            Some("quarter") => Value::Int((month - 1).div_euclid(3) + 1),
            Some("first_of_year") => Value::Text(date::format_date(year, 1, 1)),
            Some("last_of_year") => Value::Text(date::format_date(year, 12, 31)),
            Some("first_of_quarter") => {
                let q_month = (month - 1) / 3 * 3 + 1;
                Value::Text(date::format_date(year, q_month, 1))
            }
            Some("last_of_quarter") => {
                let q_month = (month - 1) / 3 * 3 + 3;
                Value::Text(date::format_date(year, q_month, date::days_in_month(year, q_month)))
            }
            Some("first_of_month") => Value::Text(date::format_date(year, month, 1)),
            Some("last_of_month") => {
                Value::Text(date::format_date(year, month, date::days_in_month(year, month)))
            }
            Some("first_of_week") => {
                let jd_monday = jd - (weekday - 1);
                let (y, m, d) = date::julian_to_date(jd_monday);
                Value::Text(date::format_date(y, m, d))
            }
            Some("last_of_week") => {
                let jd_sunday = jd + (7 - weekday);
                let (y, m, d) = date::julian_to_date(jd_sunday);
                Value::Text(date::format_date(y, m, d))
            }
            Some("is_leap_year") => Value::Bool(date::is_leap_year(year)),
            Some("weekday_in_month") => Value::Int((day - 1) / 7 + 1),
            Some("is_weekend") => Value::Bool(weekday >= 6),
            Some("month_string") => Value::Text(date::month_string(month).to_string()),
            Some("week_string") => Value::Text(format!("{weekyear:04}-W{week:02}")),
            Some("yearday_string") => Value::Text(format!("{yearday:03}")),
            Some("weekday_string") => Value::Text(WEEKDAY_NAMES[(weekday - 1) as usize].to_string()),
            _ => Value::Null,
        }
    }

    /// Narrows `[lo, hi)` Julian day bounds from any equality/inequality
    /// predicate touching `julian`, `date`, or `year`; defaults to the
    /// full declared range otherwise.
    fn narrow_range(predicates: &[FieldPredicate]) -> (i64, i64) {
        let mut lo = FIRST_JULIAN;
        let mut hi = FIRST_JULIAN + DECLARED_RECORD_COUNT as i64;

        for p in predicates {
            let name = FIELD_NAMES.get(p.column as usize).copied().unwrap_or("");
            let jd_bound = match name {
                "julian" => p.value.looks_numeric(),
                "date" => date::parse_date(&p.value.display()).ok().map(|d| d.julian()),
                "year" => p
                    .value
                    .looks_numeric()
                    .map(|y| date::date_to_julian(y, 1, 1)),
                _ => None,
            };
            let Some(v) = jd_bound else { continue };
            let (range_lo, range_hi) = if name == "year" {
                let y = p.value.looks_numeric().unwrap_or(0);
                (date::date_to_julian(y, 1, 1), date::date_to_julian(y, 12, 31) + 1)
            } else {
                (v, v + 1)
            };
            match p.op {
                BinaryOp::Eq => {
                    lo = lo.max(range_lo);
                    hi = hi.min(range_hi);
                }
                BinaryOp::Lt => hi = hi.min(range_lo),
                BinaryOp::Le => hi = hi.min(range_hi),
                BinaryOp::Gt => lo = lo.max(range_hi),
                BinaryOp::Ge => lo = lo.max(range_lo),
                _ => {}
            }
        }
        (lo, hi.max(lo))
    }
}

impl Default for CalendarDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl TableSource for CalendarDriver {
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
        DECLARED_RECORD_COUNT
    }

    fn record_value(&self, row: u64, col: ColumnId) -> DbResult<Value> {
        Ok(Self::column_value(Self::julian_for_rowid(row), col))
    }

    fn full_table_access(
        &self,
        out: &mut RowList,
        predicates: &[FieldPredicate],
        limit: Option<usize>,
    ) -> DbResult<()> {
        let (lo, hi) = Self::narrow_range(predicates);
        let mut matched = 0usize;
        for jd in lo..hi {
            if let Some(limit) = limit {
                if matched >= limit {
                    break;
                }
            }
            let mut ok = true;
            for p in predicates {
                let v = Self::column_value(jd, p.column);
                if !expr::eval_binary(&v, p.op, &p.value)?.as_bool().unwrap_or(false) {
                    ok = false;
                    break;
                }
            }
            if ok {
                out.append(Self::rowid_for_julian(jd) as u32);
                matched += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_day_of_february_2020_is_leap_day() {
        let driver = CalendarDriver::new();
        let year_col = driver.field_index("year").unwrap();
        let month_col = driver.field_index("month").unwrap();
        let date_col = driver.field_index("date").unwrap();

        let mut out = RowList::with_capacity(1, 32);
        driver
            .full_table_access(
                &mut out,
                &[
                    FieldPredicate { column: year_col, op: BinaryOp::Eq, value: Value::Int(2020) },
                    FieldPredicate { column: month_col, op: BinaryOp::Eq, value: Value::Int(2) },
                ],
                None,
            )
            .unwrap();

        assert_eq!(out.row_count(), 29);
        let last_rowid = out.row(28)[0] as u64;
        assert_eq!(
            driver.record_value(last_rowid, date_col).unwrap(),
            Value::Text("2020-02-29".into())
        );
    }

    #[test]
    fn weekday_string_matches_known_date() {
        let driver = CalendarDriver::new();
        let jd = expr::date::date_to_julian(2021, 1, 4); // a Monday
        let rowid = CalendarDriver::rowid_for_julian(jd);
        let col = driver.field_index("weekday_string").unwrap();
        assert_eq!(
            driver.record_value(rowid, col).unwrap(),
            Value::Text("Monday".into())
        );
    }
}
