//! Scalar function family (spec §4.2/§4.8): the enumerated function set
//! csvql recognises at parse time. There is no escape hatch for arbitrary
//! user-defined functions — this enum is the whole set.

use crate::date::{self, ParsedDate};
use common::{DbError, DbResult};
use types::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ExtractPart {
    Year,
    Month,
    Day,
    Week,
    Weekday,
    Weekyear,
    Yearday,
    Heyear,
    Millennium,
    Century,
    Decade,
    Quarter,
    Julian,
    Date,
    Datetime,
    MonthString,
    WeekString,
    YeardayString,
}

impl ExtractPart {
    pub fn from_keyword(kw: &str) -> Option<Self> {
        Some(match kw.to_ascii_uppercase().as_str() {
            "YEAR" => Self::Year,
            "MONTH" => Self::Month,
            "DAY" => Self::Day,
            "WEEK" => Self::Week,
            "WEEKDAY" => Self::Weekday,
            "WEEKYEAR" => Self::Weekyear,
            "YEARDAY" => Self::Yearday,
            "HEYEAR" => Self::Heyear,
            "MILLENNIUM" => Self::Millennium,
            "CENTURY" => Self::Century,
            "DECADE" => Self::Decade,
            "QUARTER" => Self::Quarter,
            "JULIAN" => Self::Julian,
            "DATE" => Self::Date,
            "DATETIME" => Self::Datetime,
            "MONTH_STRING" => Self::MonthString,
            "WEEK_STRING" => Self::WeekString,
            "YEARDAY_STRING" => Self::YeardayString,
            _ => return None,
        })
    }
}

/// The enumerated scalar function set. `Identity` is the implicit
/// pass-through applied to a bare column/literal select item.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ScalarFn {
    Identity,
    Chr,
    ToHex,
    Random,
    Length,
    Left,
    Right,
    Extract(ExtractPart),
}

impl ScalarFn {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_uppercase().as_str() {
            "CHR" => Self::Chr,
            "TO_HEX" => Self::ToHex,
            "RANDOM" => Self::Random,
            "LENGTH" => Self::Length,
            "LEFT" => Self::Left,
            "RIGHT" => Self::Right,
            "EXTRACT" => return None, // EXTRACT is parsed with its own FROM-clause grammar
            _ => return None,
        })
    }
}

/// A small linear congruential generator, the same family
/// `original_source/src/db-sample.c` uses for its deterministic rows and
/// for `RANDOM()`. Parameters from Numerical Recipes.
#[derive(Clone, Debug)]
pub struct Lcg(pub u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_i64(&mut self) -> i64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) as i64
    }
}

pub fn eval_scalar(func: &ScalarFn, args: &[Value], rng: &mut Lcg, today: ParsedDate) -> DbResult<Value> {
    match func {
        ScalarFn::Identity => Ok(args.first().cloned().unwrap_or(Value::Null)),
        ScalarFn::Chr => {
            let n = arg_int(args, 0, "CHR")?;
            let ch = char::from_u32(n as u32)
                .ok_or_else(|| DbError::Evaluator(format!("CHR: invalid code point {n}")))?;
            Ok(Value::Text(ch.to_string()))
        }
        ScalarFn::ToHex => {
            let n = arg_int(args, 0, "TO_HEX")?;
            let width = args.get(1).and_then(|v| v.looks_numeric());
            let rendered = match width {
                Some(2) => format!("{:02X}", n),
                Some(4) => format!("{:04X}", n),
                _ => format!("{:X}", n),
            };
            Ok(Value::Text(rendered))
        }
        ScalarFn::Random => Ok(Value::Int(rng.next_i64().unsigned_abs() as i64)),
        ScalarFn::Length => {
            let s = args.first().map(|v| v.display()).unwrap_or_default();
            Ok(Value::Int(s.len() as i64))
        }
        ScalarFn::Left => {
            let s = args.first().map(|v| v.display()).unwrap_or_default();
            let n = arg_int(args, 1, "LEFT")?.max(0) as usize;
            Ok(Value::Text(s.chars().take(n).collect()))
        }
        ScalarFn::Right => {
            let s = args.first().map(|v| v.display()).unwrap_or_default();
            let n = arg_int(args, 1, "RIGHT")?.max(0) as usize;
            let len = s.chars().count();
            let skip = len.saturating_sub(n);
            Ok(Value::Text(s.chars().skip(skip).collect()))
        }
        ScalarFn::Extract(part) => eval_extract(*part, args, today),
    }
}

fn arg_int(args: &[Value], idx: usize, func: &str) -> DbResult<i64> {
    args.get(idx)
        .and_then(|v| v.looks_numeric())
        .ok_or_else(|| DbError::Evaluator(format!("{func}: expected integer argument {idx}")))
}

fn eval_extract(part: ExtractPart, args: &[Value], today: ParsedDate) -> DbResult<Value> {
    let raw = args
        .first()
        .ok_or_else(|| DbError::Evaluator("EXTRACT: missing date argument".into()))?;
    let text = raw.display();
    let parsed = if text.eq_ignore_ascii_case("CURRENT_DATE") || text.eq_ignore_ascii_case("TODAY()") {
        today
    } else {
        date::parse_date(&text)?
    };

    let jd = parsed.julian();
    let (iso_year, week) = date::iso_year_week(parsed.year, parsed.month, parsed.day);
    let yearday = date::ordinal_day(parsed.year, parsed.month, parsed.day);
    let weekday = date::weekday(jd);

    Ok(match part {
        ExtractPart::Year => Value::Int(parsed.year),
        ExtractPart::Month => Value::Int(parsed.month),
        ExtractPart::Day => Value::Int(parsed.day),
        ExtractPart::Week => Value::Int(week),
        ExtractPart::Weekday => Value::Int(weekday),
        ExtractPart::Weekyear => Value::Int(iso_year),
        ExtractPart::Yearday => Value::Int(yearday),
        ExtractPart::Heyear => Value::Int(parsed.year + 10000),
        ExtractPart::Millennium => Value::Int(parsed.year / 1000),
        ExtractPart::Century => Value::Int(parsed.year / 100),
        ExtractPart::Decade => Value::Int(parsed.year.div_euclid(10)),
        ExtractPart::Quarter => Value::Int((parsed.month - 1).div_euclid(3) + 1),
        ExtractPart::Julian => Value::Int(jd),
        ExtractPart::Date => Value::Text(date::format_date(parsed.year, parsed.month, parsed.day)),
        ExtractPart::Datetime => Value::Text(format!(
            "{}T00:00:00",
            date::format_date(parsed.year, parsed.month, parsed.day)
        )),
        ExtractPart::MonthString => Value::Text(format!("{:04}-{:02}", parsed.year, parsed.month)),
        ExtractPart::WeekString => Value::Text(format!("{iso_year:04}-W{week:02}")),
        ExtractPart::YeardayString => Value::Text(format!("{:04}-{:03}", parsed.year, yearday)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> ParsedDate {
        ParsedDate {
            year: 2026,
            month: 7,
            day: 28,
        }
    }

    #[test]
    fn extract_week_matches_spec_scenarios() {
        let v = eval_extract(
            ExtractPart::Week,
            &[Value::Text("2021-01-04".into())],
            today(),
        )
        .unwrap();
        assert_eq!(v, Value::Int(1));

        let v = eval_extract(
            ExtractPart::Week,
            &[Value::Text("2021-01-03".into())],
            today(),
        )
        .unwrap();
        assert_eq!(v, Value::Int(53));
    }

    #[test]
    fn chr_encodes_code_point() {
        let v = eval_scalar(&ScalarFn::Chr, &[Value::Int(65)], &mut Lcg::new(1), today()).unwrap();
        assert_eq!(v, Value::Text("A".into()));
    }

    #[test]
    fn to_hex_widths() {
        assert_eq!(
            eval_scalar(&ScalarFn::ToHex, &[Value::Int(10), Value::Int(2)], &mut Lcg::new(1), today()).unwrap(),
            Value::Text("0A".into())
        );
        assert_eq!(
            eval_scalar(&ScalarFn::ToHex, &[Value::Int(10), Value::Int(4)], &mut Lcg::new(1), today()).unwrap(),
            Value::Text("000A".into())
        );
        assert_eq!(
            eval_scalar(&ScalarFn::ToHex, &[Value::Int(255)], &mut Lcg::new(1), today()).unwrap(),
            Value::Text("FF".into())
        );
    }

    #[test]
    fn left_right_operate_on_chars() {
        let s = Value::Text("hello".into());
        assert_eq!(
            eval_scalar(&ScalarFn::Left, &[s.clone(), Value::Int(3)], &mut Lcg::new(1), today()).unwrap(),
            Value::Text("hel".into())
        );
        assert_eq!(
            eval_scalar(&ScalarFn::Right, &[s, Value::Int(3)], &mut Lcg::new(1), today()).unwrap(),
            Value::Text("llo".into())
        );
    }

    #[test]
    fn random_is_deterministic_given_seed() {
        let mut a = Lcg::new(42);
        let mut b = Lcg::new(42);
        assert_eq!(a.next_i64(), b.next_i64());
    }
}
