use std::cmp::Ordering;

/// Declared type of a table column, used by `CREATE TABLE` and by the
/// directory/calendar/sequence drivers when they describe their synthetic
/// schemas. Every value read off a delimited-file driver is `Text` — numeric
/// and date comparisons are a property of how a value *looks*, decided at
/// evaluation time (see `expr`'s predicate evaluator), not of its declared
/// type.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SqlType {
    Int,
    Text,
    Bool,
}

/// A scalar value flowing through expression evaluation.
///
/// Examples:
/// - `Value::Int(42)` — an integer literal, a `COUNT(*)`/`AVG()` result, or
///   a calendar column such as `year`.
/// - `Value::Text("alice".into())` — a CSV field, as read verbatim by every
///   delimited-file driver.
/// - `Value::Bool(true)` — the result of evaluating a predicate.
/// - `Value::Null` — an absent aggregate input, a `LEFT JOIN` miss, or a
///   CSV field that was empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Int(i64),
    Text(String),
    Bool(bool),
    Null,
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Renders a value the way a driver would emit it as a CSV field: no
    /// quoting, `Null` as the empty string.
    pub fn display(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Null => String::new(),
        }
    }

    /// Parses the value as a signed integer, the way the numeric-looking
    /// check in `original_source/predicates.c` does: the whole string (after
    /// an optional leading `-`) must be ASCII digits.
    pub fn looks_numeric(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Text(s) => parse_strict_integer(s),
            _ => None,
        }
    }

    pub fn cmp_same_type(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn eq_same_type(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.eq(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.eq(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.eq(b)),
            _ => None,
        }
    }

    /// Comparison used by predicate evaluation and sorting (spec §4.8/§4.10):
    /// if both sides look numeric, compare as signed integers; otherwise
    /// compare lexicographically by the bytes of their displayed form.
    pub fn cmp_numeric_or_lexicographic(&self, other: &Value) -> Ordering {
        match (self.looks_numeric(), other.looks_numeric()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.display().cmp(&other.display()),
        }
    }
}

fn parse_strict_integer(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, trimmed),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i64>().ok().map(|v| v * sign)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cmp::Ordering::{Equal, Greater, Less};

    #[test]
    fn cmp_same_type_works() {
        assert_eq!(Value::Int(1).cmp_same_type(&Value::Int(2)), Some(Less));
        assert_eq!(Value::Int(1).cmp_same_type(&Value::Text("1".into())), None);
    }

    #[test]
    fn truthiness_is_strict() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Bool(false).as_bool(), Some(false));
        assert_eq!(Value::Int(1).as_bool(), None);
        assert_eq!(Value::Text("true".into()).as_bool(), None);
        assert_eq!(Value::Null.as_bool(), None);
    }

    #[test]
    fn comparisons_require_same_type() {
        assert_eq!(Value::Int(1).cmp_same_type(&Value::Int(2)), Some(Less));
        assert_eq!(
            Value::Text("a".into()).cmp_same_type(&Value::Text("a".into())),
            Some(Equal)
        );
        assert_eq!(
            Value::Bool(true).cmp_same_type(&Value::Bool(false)),
            Some(Greater)
        );
        assert_eq!(Value::Int(1).cmp_same_type(&Value::Text("1".into())), None);
        assert_eq!(Value::Null.cmp_same_type(&Value::Int(1)), None);
    }

    #[test]
    fn equality_requires_same_type() {
        assert_eq!(Value::Int(1).eq_same_type(&Value::Int(1)), Some(true));
        assert_eq!(Value::Int(1).eq_same_type(&Value::Int(2)), Some(false));
        assert_eq!(
            Value::Text("abc".into()).eq_same_type(&Value::Text("abc".into())),
            Some(true)
        );
        assert_eq!(
            Value::Bool(true).eq_same_type(&Value::Bool(false)),
            Some(false)
        );
        assert_eq!(Value::Text("1".into()).eq_same_type(&Value::Int(1)), None);
    }

    #[test]
    fn serde_round_trip_stability() {
        let vals = vec![
            Value::Int(-42),
            Value::Text("Ada".into()),
            Value::Bool(true),
            Value::Null,
        ];

        let json = serde_json::to_string(&vals).unwrap();
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();

        assert_eq!(vals, back);
    }

    #[test]
    fn looks_numeric_matches_strict_integer_form() {
        assert_eq!(Value::Text("42".into()).looks_numeric(), Some(42));
        assert_eq!(Value::Text("-7".into()).looks_numeric(), Some(-7));
        assert_eq!(Value::Text("4.2".into()).looks_numeric(), None);
        assert_eq!(Value::Text("abc".into()).looks_numeric(), None);
        assert_eq!(Value::Text("".into()).looks_numeric(), None);
        assert_eq!(Value::Text("007".into()).looks_numeric(), Some(7));
    }

    #[test]
    fn numeric_or_lexicographic_prefers_numeric_when_both_sides_qualify() {
        let a = Value::Text("9".into());
        let b = Value::Text("10".into());
        // numerically 9 < 10, but lexicographically "9" > "10"
        assert_eq!(a.cmp_numeric_or_lexicographic(&b), Less);
    }

    #[test]
    fn numeric_or_lexicographic_falls_back_to_bytes() {
        let a = Value::Text("banana".into());
        let b = Value::Text("apple".into());
        assert_eq!(a.cmp_numeric_or_lexicographic(&b), Greater);
    }

    proptest! {
        #[test]
        fn order_is_antisymmetric(i in any::<i64>(), j in any::<i64>()) {
            let a = Value::Int(i);
            let b = Value::Int(j);
            let ord1 = a.cmp_same_type(&b);
            let ord2 = b.cmp_same_type(&a);
            match (ord1, ord2) {
                (Some(o1), Some(o2)) => assert_eq!(o1, o2.reverse()),
                _ => prop_assert!(true),
            }
        }

        #[test]
        fn eq_reflexive(val in any::<i64>()) {
            let v = Value::Int(val);
            assert_eq!(v.eq_same_type(&v), Some(true));
        }

        #[test]
        fn text_cmp_matches_std(a in ".*", b in ".*") {
            let va = Value::Text(a.clone());
            let vb = Value::Text(b.clone());
            assert_eq!(va.cmp_same_type(&vb), Some(a.cmp(&b)));
        }
    }
}
