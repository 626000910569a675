#[cfg(test)]
mod tests;

pub mod aggregate;
pub mod date;
pub mod functions;

pub use aggregate::AggregateKind;
pub use functions::{ExtractPart, Lcg, ScalarFn};

use common::{ColumnId, DbError, DbResult, Row};
use std::cmp::Ordering;
use types::Value;

/// Binary comparison and logical operators, plus `LIKE` (spec §4.2/§4.8).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    And,
    Or,
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UnaryOp {
    Not,
    IsNull,
    IsNotNull,
}

/// Resolved expression tree. Unlike `parser::ast::Expr`, every `Column`
/// reference here has already been bound to a position in the flattened
/// row vector the executor materialises for each candidate row (spec
/// §4.4's resolution output) — there is no by-name lookup left to do at
/// evaluation time.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Expr {
    Literal(Value),
    /// `CURRENT_DATE` / `TODAY()`, resolved against the evaluator's `today`
    /// at evaluation time rather than at parse time, so a single parsed
    /// query stays valid across invocations.
    CurrentDate,
    Column(ColumnId),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// `expr || expr || ...`, concatenating the displayed form of each part.
    Concat(Vec<Expr>),
    Function {
        func: ScalarFn,
        args: Vec<Expr>,
    },
    /// Only valid in SELECT-list / GROUP BY position; the executor
    /// evaluates this specially over a whole group rather than recursing
    /// through `EvalContext::eval`.
    Aggregate {
        kind: AggregateKind,
        arg: Option<Box<Expr>>,
        star: bool,
    },
}

impl Expr {
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Expr::Aggregate { .. })
    }
}

/// Evaluation context for a single materialised row: the row's flattened
/// values (one per resolved column, in the order the planner assigned
/// `ColumnId`s), an explicit RNG state for `RANDOM()`, and an explicit
/// "today" for the date pseudo-literals. Nothing here is a hidden global —
/// both are threaded in by the caller (spec §9's "no hidden singletons").
pub struct EvalContext<'a> {
    pub rng: &'a mut Lcg,
    pub today: date::ParsedDate,
}

impl<'a> EvalContext<'a> {
    pub fn new(rng: &'a mut Lcg, today: date::ParsedDate) -> Self {
        Self { rng, today }
    }

    pub fn eval(&mut self, expr: &Expr, row: &Row) -> DbResult<Value> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::CurrentDate => Ok(Value::Text(date::format_date(
                self.today.year,
                self.today.month,
                self.today.day,
            ))),
            Expr::Column(id) => row
                .values
                .get(*id as usize)
                .cloned()
                .ok_or_else(|| DbError::Evaluator(format!("column slot {id} out of range"))),
            Expr::Unary { op, expr } => {
                let v = self.eval(expr, row)?;
                Ok(match op {
                    UnaryOp::Not => {
                        let b = v
                            .as_bool()
                            .ok_or_else(|| DbError::Evaluator(format!("NOT expects bool, got {v:?}")))?;
                        Value::Bool(!b)
                    }
                    UnaryOp::IsNull => Value::Bool(v.is_null()),
                    UnaryOp::IsNotNull => Value::Bool(!v.is_null()),
                })
            }
            Expr::Binary { left, op, right } => {
                let lv = self.eval(left, row)?;
                let rv = self.eval(right, row)?;
                eval_binary(&lv, *op, &rv)
            }
            Expr::Concat(parts) => {
                let mut out = String::new();
                for p in parts {
                    out.push_str(&self.eval(p, row)?.display());
                }
                Ok(Value::Text(out))
            }
            Expr::Function { func, args } => {
                let mut values = Vec::with_capacity(args.len());
                for a in args {
                    values.push(self.eval(a, row)?);
                }
                functions::eval_scalar(func, &values, self.rng, self.today)
            }
            Expr::Aggregate { .. } => Err(DbError::Evaluator(
                "aggregate expression evaluated outside a group context".into(),
            )),
        }
    }
}

/// Predicate comparison rules (spec §4.8), shared by WHERE/ON evaluation,
/// index-predicate extraction, and sort comparators:
/// 1. If both sides parse as dates, compare by Julian day.
/// 2. If either side is `NULL`, `=`/`!=` test emptiness; other operators
///    are false.
/// 3. If both sides look numeric, compare as signed integers.
/// 4. Otherwise compare lexicographically by bytes.
pub fn eval_binary(l: &Value, op: BinaryOp, r: &Value) -> DbResult<Value> {
    use BinaryOp::*;

    if matches!(op, And | Or) {
        let lb = l
            .as_bool()
            .ok_or_else(|| DbError::Evaluator(format!("AND/OR expects bools, got {l:?}")))?;
        let rb = r
            .as_bool()
            .ok_or_else(|| DbError::Evaluator(format!("AND/OR expects bools, got {r:?}")))?;
        return Ok(Value::Bool(match op {
            And => lb && rb,
            Or => lb || rb,
            _ => unreachable!(),
        }));
    }

    if matches!(op, Like) {
        let pattern = r.display();
        let subject = l.display();
        return Ok(Value::Bool(like_match(&subject, &pattern)));
    }

    if l.is_null() || r.is_null() {
        return Ok(Value::Bool(match op {
            Eq => l.is_null() && r.is_null(),
            Ne => l.is_null() != r.is_null(),
            _ => false,
        }));
    }

    let ord = compare_values(l, r);

    Ok(Value::Bool(match op {
        Eq => ord == Ordering::Equal,
        Ne => ord != Ordering::Equal,
        Lt => ord == Ordering::Less,
        Le => ord != Ordering::Greater,
        Gt => ord == Ordering::Greater,
        Ge => ord != Ordering::Less,
        And | Or | Like => unreachable!(),
    }))
}

/// Shared comparator for predicates and sort (spec §4.8/§4.10): date-aware
/// first, then numeric, then lexicographic.
pub fn compare_values(l: &Value, r: &Value) -> Ordering {
    if let (Ok(ld), Ok(rd)) = (date::parse_date(&l.display()), date::parse_date(&r.display())) {
        return ld.julian().cmp(&rd.julian());
    }
    l.cmp_numeric_or_lexicographic(r)
}

/// `LIKE` supports only a trailing `%` wildcard (spec §4.8); any other `%`
/// is treated literally.
pub fn like_match(subject: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('%') {
        Some(prefix) => subject.starts_with(prefix),
        None => subject == pattern,
    }
}

#[cfg(test)]
mod binary_tests {
    use super::*;

    #[test]
    fn like_prefix_matches_startswith() {
        assert!(like_match("alice", "al%"));
        assert!(!like_match("bob", "al%"));
        assert!(like_match("exact", "exact"));
        assert!(!like_match("exactish", "exact"));
    }

    #[test]
    fn null_equality_tests_emptiness_only() {
        let null = Value::Null;
        let empty = Value::Text(String::new());
        assert_eq!(eval_binary(&null, BinaryOp::Eq, &empty).unwrap(), Value::Bool(false));
        assert_eq!(eval_binary(&null, BinaryOp::Eq, &null).unwrap(), Value::Bool(true));
        assert_eq!(eval_binary(&null, BinaryOp::Lt, &Value::Int(1)).unwrap(), Value::Bool(false));
    }

    #[test]
    fn date_like_strings_compare_by_julian() {
        let a = Value::Text("2021-01-03".into());
        let b = Value::Text("2021-01-04".into());
        assert_eq!(eval_binary(&a, BinaryOp::Lt, &b).unwrap(), Value::Bool(true));
    }

    #[test]
    fn numeric_strings_compare_as_integers() {
        let a = Value::Text("9".into());
        let b = Value::Text("10".into());
        assert_eq!(eval_binary(&a, BinaryOp::Lt, &b).unwrap(), Value::Bool(true));
    }
}
