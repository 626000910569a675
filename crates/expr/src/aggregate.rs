//! Aggregate evaluation over a group of rows (spec §4.8). Aggregates are
//! only meaningful in SELECT-list position or as a GROUP's output column —
//! the executor, not this module, is responsible for collecting the group's
//! argument values before calling [`eval_aggregate`].

use common::DbResult;
use types::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AggregateKind {
    Count,
    Max,
    Min,
    Avg,
    ListAgg,
}

impl AggregateKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_uppercase().as_str() {
            "COUNT" => Self::Count,
            "MAX" => Self::Max,
            "MIN" => Self::Min,
            "AVG" => Self::Avg,
            "LISTAGG" => Self::ListAgg,
            _ => return None,
        })
    }
}

/// Evaluates an aggregate over the already-evaluated per-row argument
/// values of a group. `COUNT(*)` is represented by `star = true`, in which
/// case `values` carries one placeholder entry per row (its content is
/// ignored); every other aggregate ignores rows whose evaluated value is
/// empty/`Null` per spec's "non-empty values" wording.
pub fn eval_aggregate(kind: AggregateKind, values: &[Value], star: bool) -> DbResult<Value> {
    if kind == AggregateKind::Count && star {
        return Ok(Value::Int(values.len() as i64));
    }

    let non_empty: Vec<&Value> = values
        .iter()
        .filter(|v| !v.is_null() && !v.display().is_empty())
        .collect();

    Ok(match kind {
        AggregateKind::Count => Value::Int(non_empty.len() as i64),
        AggregateKind::Max => non_empty
            .iter()
            .filter_map(|v| v.looks_numeric())
            .max()
            .map(Value::Int)
            .unwrap_or(Value::Null),
        AggregateKind::Min => non_empty
            .iter()
            .filter_map(|v| v.looks_numeric())
            .min()
            .map(Value::Int)
            .unwrap_or(Value::Null),
        AggregateKind::Avg => {
            let nums: Vec<i64> = non_empty.iter().filter_map(|v| v.looks_numeric()).collect();
            if nums.is_empty() {
                Value::Null
            } else {
                Value::Int(nums.iter().sum::<i64>() / nums.len() as i64)
            }
        }
        AggregateKind::ListAgg => {
            let joined = non_empty
                .iter()
                .map(|v| v.display())
                .collect::<Vec<_>>()
                .join(",");
            Value::Text(joined)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_star_counts_rows_regardless_of_value() {
        let placeholders = vec![Value::Null, Value::Null, Value::Null, Value::Null];
        let v = eval_aggregate(AggregateKind::Count, &placeholders, true).unwrap();
        assert_eq!(v, Value::Int(4));
    }

    #[test]
    fn avg_truncates_to_integer() {
        let scores = vec![
            Value::Int(10),
            Value::Int(20),
            Value::Int(20),
            Value::Int(5),
        ];
        let v = eval_aggregate(AggregateKind::Avg, &scores, false).unwrap();
        assert_eq!(v, Value::Int(13));
    }

    #[test]
    fn min_max_ignore_nulls() {
        let vals = vec![Value::Int(5), Value::Null, Value::Int(1), Value::Int(9)];
        assert_eq!(
            eval_aggregate(AggregateKind::Max, &vals, false).unwrap(),
            Value::Int(9)
        );
        assert_eq!(
            eval_aggregate(AggregateKind::Min, &vals, false).unwrap(),
            Value::Int(1)
        );
    }

    #[test]
    fn listagg_joins_non_empty_values_with_commas() {
        let vals = vec![
            Value::Text("a".into()),
            Value::Null,
            Value::Text("b".into()),
        ];
        assert_eq!(
            eval_aggregate(AggregateKind::ListAgg, &vals, false).unwrap(),
            Value::Text("a,b".into())
        );
    }
}
