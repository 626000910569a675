//! `TABLE_SCAN`/`TABLE_ACCESS_ROWID` (spec §4.5 rule 6, §4.9): the two plan
//! steps that read a driving table wholesale rather than through an index.

use common::{DbError, DbResult, RowList, TableId};
use parser::ast::{CompareOp, Predicate};
use vfs::{FieldPredicate, TableSource};

use crate::Executor;

/// `PlanStep::TableScan`: a full enumeration of `table`, with every
/// `predicates` entry (already narrowed by the planner to "column op
/// constant" on this table) pushed into the driver's own
/// [`TableSource::full_table_access`].
pub fn table_scan(
    ex: &Executor,
    table: TableId,
    predicates: &[Predicate],
    limit: Option<usize>,
) -> DbResult<RowList> {
    let handle = ex.catalog.handle(table);
    let field_predicates = predicates
        .iter()
        .map(|p| to_field_predicate(ex, p))
        .collect::<DbResult<Vec<_>>>()?;

    let mut out = RowList::with_capacity(1, limit.unwrap_or(handle.record_count() as usize));
    handle.full_table_access(&mut out, &field_predicates, limit)?;
    Ok(out)
}

fn to_field_predicate(ex: &Executor, p: &Predicate) -> DbResult<FieldPredicate> {
    let column = p
        .left
        .index
        .ok_or_else(|| DbError::Evaluator("pushable predicate's column was not resolved".into()))?;
    let right = p
        .right
        .as_ref()
        .ok_or_else(|| DbError::Evaluator("pushable predicate has no constant right side".into()))?;
    let value = ex.constant_value(right)?;
    let op = planner::compare_op_to_binary_op(p.op)
        .ok_or_else(|| DbError::Evaluator("IS [NOT] NULL cannot be pushed into a table scan".into()))?;
    Ok(FieldPredicate { column, op, value })
}

/// `PlanStep::TableAccessRowid`: re-checks predicates the planner could not
/// push anywhere else — multi-table comparisons, `IS [NOT] NULL`, or
/// anything left over once the driving table's access method and every
/// join's own predicate have each claimed what they could.
pub fn table_access_rowid(ex: &mut Executor, input: &RowList, predicates: &[Predicate]) -> DbResult<RowList> {
    let jc = input.join_count();
    let mut out = RowList::with_capacity(jc, input.row_count());
    for i in 0..input.row_count() {
        let rowids = input.row(i);
        let mut keep = true;
        for predicate in predicates {
            if !eval_predicate(ex, predicate, rowids)? {
                keep = false;
                break;
            }
        }
        if keep {
            out.copy_row(input, i);
        }
    }
    Ok(out)
}

pub(crate) fn eval_predicate(ex: &Executor, predicate: &Predicate, rowids: &[u32]) -> DbResult<bool> {
    let left = ex.eval_field(&predicate.left, rowids)?;
    match predicate.op {
        CompareOp::IsNull => Ok(left.is_null()),
        CompareOp::IsNotNull => Ok(!left.is_null()),
        op => {
            let right = predicate
                .right
                .as_ref()
                .ok_or_else(|| DbError::Evaluator(format!("predicate {op:?} requires a right side")))?;
            let right_val = ex.eval_field(right, rowids)?;
            let binop = planner::compare_op_to_binary_op(op)
                .expect("non-null compare op always has a BinaryOp counterpart");
            Ok(expr::eval_binary(&left, binop, &right_val)?.as_bool().unwrap_or(false))
        }
    }
}
