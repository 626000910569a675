//! Julian day arithmetic and ISO week/weekday/weekyear computation.
//!
//! The conversions below reproduce the floor-based Gregorian<->Julian-day
//! formulas used throughout `original_source/src/date.c` (themselves the
//! standard Meeus algorithm) and the ISO 8601 week-numbering rules from
//! Claus Tøndering's calendar FAQ that the original cites in its comments.
//! `datetimeFromJulian`'s integer-truncation behaviour near year 1 is
//! reproduced as-is rather than patched — see spec's open question on this.

use common::{DbError, DbResult};

const MONTH_DAYS: [i64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

pub fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i64, month: i64) -> i64 {
    if month == 2 && is_leap_year(year) {
        29
    } else {
        MONTH_DAYS[(month - 1).clamp(0, 11) as usize]
    }
}

/// Gregorian calendar date to Julian day number (Meeus's floor-division form).
pub fn date_to_julian(year: i64, month: i64, day: i64) -> i64 {
    let (y, m) = if month <= 2 {
        (year - 1, month + 12)
    } else {
        (year, month)
    };
    let a = (y as f64 / 100.0).floor() as i64;
    let b = 2 - a + (a as f64 / 4.0).floor() as i64;
    let term1 = (365.25 * (y + 4716) as f64).floor() as i64;
    let term2 = (30.6001 * (m + 1) as f64).floor() as i64;
    term1 + term2 + day + b - 1524
}

/// Inverse of [`date_to_julian`]. Declared undefined for `jd` outside the
/// range corresponding to years 1..=9999, per the original's documented
/// limitation: the integer truncation in the `alpha`/Gregorian-correction
/// term can misplace the month boundary near year 1.
pub fn julian_to_date(jd: i64) -> (i64, i64, i64) {
    let z = jd as f64;
    let (a_corr, alpha);
    if jd >= 2299161 {
        alpha = ((z - 1867216.25) / 36524.25).floor();
        a_corr = z + 1.0 + alpha - (alpha / 4.0).floor();
    } else {
        a_corr = z;
    }
    let b = a_corr + 1524.0;
    let c = ((b - 122.1) / 365.25).floor();
    let d = (365.25 * c).floor();
    let e = ((b - d) / 30.6001).floor();
    let day = (b - d - (30.6001 * e).floor()) as i64;
    let month = if e < 14.0 { e - 1.0 } else { e - 13.0 } as i64;
    let year = if month > 2 { c - 4716.0 } else { c - 4715.0 } as i64;
    (year, month, day)
}

/// ISO weekday: 1 = Monday .. 7 = Sunday.
pub fn weekday(jd: i64) -> i64 {
    (jd.rem_euclid(7)) + 1
}

/// 1-based ordinal day within the calendar year.
pub fn ordinal_day(year: i64, month: i64, day: i64) -> i64 {
    let mut days = day;
    for m in 1..month {
        days += days_in_month(year, m);
    }
    days
}

/// Number of ISO weeks in a given ISO week-numbering year: 53 if the year
/// ends on a Thursday, or 53 if it's a leap year ending on a Friday;
/// 52 otherwise.
pub fn weeks_in_iso_year(year: i64) -> i64 {
    let wd = weekday(date_to_julian(year, 12, 31));
    if wd == 4 || (is_leap_year(year) && wd == 5) {
        53
    } else {
        52
    }
}

/// ISO (weekyear, week) pair for a calendar date.
pub fn iso_year_week(year: i64, month: i64, day: i64) -> (i64, i64) {
    let ordinal = ordinal_day(year, month, day);
    let wd = weekday(date_to_julian(year, month, day));
    let week = (ordinal - wd + 10).div_euclid(7);
    if week < 1 {
        (year - 1, weeks_in_iso_year(year - 1))
    } else {
        let wiy = weeks_in_iso_year(year);
        if week > wiy {
            (year + 1, 1)
        } else {
            (year, week)
        }
    }
}

/// A parsed calendar date, optionally carrying a time-of-day component for
/// the `DATETIME` extract target. csvql's date literals never carry
/// sub-second precision, so time is tracked only to the second.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParsedDate {
    pub year: i64,
    pub month: i64,
    pub day: i64,
}

impl ParsedDate {
    pub fn julian(&self) -> i64 {
        date_to_julian(self.year, self.month, self.day)
    }
}

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn month_from_name(name: &str) -> Option<i64> {
    let lower = name.to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .position(|m| m.to_ascii_lowercase() == lower)
        .map(|i| i as i64 + 1)
}

/// Parses the date formats the extract family accepts (spec §4.8):
/// `YYYY-MM-DD`, `DD-MON-YYYY`, `DD MON YYYY`, and the extended
/// `±NNNNN-MM-DD` form for years outside four digits.
pub fn parse_date(text: &str) -> DbResult<ParsedDate> {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix('+').or_else(|| text.strip_prefix('-')) {
        let sign = if text.starts_with('-') { -1 } else { 1 };
        let mut parts = rest.splitn(3, '-');
        if let (Some(y), Some(m), Some(d)) = (parts.next(), parts.next(), parts.next()) {
            if let (Ok(y), Ok(m), Ok(d)) = (y.parse::<i64>(), m.parse::<i64>(), d.parse::<i64>()) {
                return Ok(ParsedDate {
                    year: sign * y,
                    month: m,
                    day: d,
                });
            }
        }
    }

    // YYYY-MM-DD
    let dash_parts: Vec<&str> = text.split('-').collect();
    if dash_parts.len() == 3 {
        if let (Ok(y), Ok(m), Ok(d)) = (
            dash_parts[0].parse::<i64>(),
            dash_parts[1].parse::<i64>(),
            dash_parts[2].parse::<i64>(),
        ) {
            return Ok(ParsedDate {
                year: y,
                month: m,
                day: d,
            });
        }
        // DD-MON-YYYY
        if let (Ok(d), Some(m), Ok(y)) = (
            dash_parts[0].parse::<i64>(),
            month_from_name(dash_parts[1]),
            dash_parts[2].parse::<i64>(),
        ) {
            return Ok(ParsedDate {
                year: y,
                month: m,
                day: d,
            });
        }
    }

    // DD MON YYYY
    let space_parts: Vec<&str> = text.split_whitespace().collect();
    if space_parts.len() == 3 {
        if let (Ok(d), Some(m), Ok(y)) = (
            space_parts[0].parse::<i64>(),
            month_from_name(space_parts[1]),
            space_parts[2].parse::<i64>(),
        ) {
            return Ok(ParsedDate {
                year: y,
                month: m,
                day: d,
            });
        }
    }

    Err(DbError::Evaluator(format!("malformed date literal: {text}")))
}

pub fn format_date(year: i64, month: i64, day: i64) -> String {
    format!("{year:04}-{month:02}-{day:02}")
}

pub fn month_string(month: i64) -> &'static str {
    MONTH_NAMES[((month - 1).rem_euclid(12)) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn julian_round_trips_known_dates() {
        for &(y, m, d) in &[(2000, 1, 1), (2021, 1, 4), (2020, 2, 29), (1970, 1, 1)] {
            let jd = date_to_julian(y, m, d);
            assert_eq!(julian_to_date(jd), (y, m, d), "round trip for {y}-{m}-{d}");
        }
    }

    #[test]
    fn known_julian_day_numbers() {
        assert_eq!(date_to_julian(2000, 1, 1), 2_451_545);
        assert_eq!(date_to_julian(2021, 1, 4), 2_459_219);
    }

    #[test]
    fn weekday_matches_known_calendar() {
        // 2000-01-01 was a Saturday (ISO weekday 6).
        assert_eq!(weekday(date_to_julian(2000, 1, 1)), 6);
        // 2021-01-04 was a Monday.
        assert_eq!(weekday(date_to_julian(2021, 1, 4)), 1);
    }

    #[test]
    fn iso_week_matches_spec_scenarios() {
        assert_eq!(iso_year_week(2021, 1, 4).1, 1);
        assert_eq!(iso_year_week(2021, 1, 3).1, 53);
    }

    #[test]
    fn leap_day_2020_round_trips() {
        let jd = date_to_julian(2020, 2, 29);
        assert_eq!(julian_to_date(jd), (2020, 2, 29));
    }

    #[test]
    fn parses_all_documented_formats() {
        assert_eq!(
            parse_date("2021-01-04").unwrap(),
            ParsedDate {
                year: 2021,
                month: 1,
                day: 4
            }
        );
        assert_eq!(
            parse_date("04-Jan-2021").unwrap(),
            ParsedDate {
                year: 2021,
                month: 1,
                day: 4
            }
        );
        assert_eq!(
            parse_date("04 Jan 2021").unwrap(),
            ParsedDate {
                year: 2021,
                month: 1,
                day: 4
            }
        );
        assert_eq!(
            parse_date("+12021-01-04").unwrap(),
            ParsedDate {
                year: 12021,
                month: 1,
                day: 4
            }
        );
    }

    proptest! {
        #[test]
        fn round_trip_holds_within_4_digit_years(y in 1i64..=9999, m in 1i64..=12, d in 1i64..=28) {
            let jd = date_to_julian(y, m, d);
            prop_assert_eq!(julian_to_date(jd), (y, m, d));
        }
    }
}
