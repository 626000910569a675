//! `CROSS_JOIN`/`CONSTANT_JOIN`/`UNIQUE_JOIN`/`INDEX_JOIN`/`LOOP_JOIN` (spec
//! §4.5's per-table join-strategy rules, §4.9): each reads `table` and
//! extends every row already on the stack by one more rowid, using
//! `append_joined`/`append_n` so the `RowList`'s join width always matches
//! how many tables have been joined in so far.

use common::{ColumnId, DbError, DbResult, ROWID_NULL, RowList, TableId};
use parser::ast::{Field, Predicate};
use vfs::{TableSource, index, index::IndexKind};

use crate::{Executor, scan};

/// `PlanStep::CrossJoin`: the cartesian product with `table` — every left
/// row paired with every row of `table` (or, for an (unused in practice)
/// outer cross join, one `ROWID_NULL` row when `table` is empty).
pub fn cross_join(ex: &Executor, left: &RowList, table: TableId, outer: bool) -> DbResult<RowList> {
    let handle = ex.catalog.handle(table);
    let right_count = handle.record_count();
    let jc = left.join_count() + 1;
    let mut out = RowList::with_capacity(jc, left.row_count() * (right_count.max(1) as usize));
    for i in 0..left.row_count() {
        if right_count == 0 {
            if outer {
                out.append_joined(left, i, ROWID_NULL);
            }
            continue;
        }
        for r in 0..right_count {
            out.append_joined(left, i, r as u32);
        }
    }
    Ok(out)
}

/// Splits a join predicate into the field belonging to `table` (the table
/// being joined onto) and the other side (a constant, or a field read from
/// an already-joined table), plus whether the comparison needs flipping to
/// read as "new_side OP other_side" (mirrors `planner::split_predicate`,
/// which the planner keeps private since only this crate needs it too).
fn split<'p>(table: TableId, predicate: &'p Predicate) -> (&'p Field, Option<&'p Field>, bool) {
    if predicate.left.table_id == Some(table) {
        (&predicate.left, predicate.right.as_ref(), false)
    } else if predicate.right.as_ref().and_then(|f| f.table_id) == Some(table) {
        (predicate.right.as_ref().unwrap(), Some(&predicate.left), true)
    } else {
        (&predicate.left, predicate.right.as_ref(), false)
    }
}

fn new_side_column(field: &Field) -> DbResult<ColumnId> {
    field
        .index
        .ok_or_else(|| DbError::Evaluator("join predicate's own-table side was not resolved".into()))
}

/// `PlanStep::ConstantJoin`: the matching rows of `table` don't depend on
/// the left row at all (the predicate's other side is a literal), so
/// they're computed once and then crossed with every left row.
pub fn constant_join(
    ex: &Executor,
    left: &RowList,
    table: TableId,
    predicate: &Predicate,
    outer: bool,
) -> DbResult<RowList> {
    let (new_side, source, flipped) = split(table, predicate);
    let column = new_side_column(new_side)?;
    let source = source
        .ok_or_else(|| DbError::Evaluator("ConstantJoin predicate has no constant side".into()))?;
    let value = ex.constant_value(source)?;
    let op = if flipped { Predicate::flip(predicate.op) } else { predicate.op };
    let binop = planner::compare_op_to_binary_op(op)
        .ok_or_else(|| DbError::Evaluator("IS [NOT] NULL cannot drive a ConstantJoin".into()))?;

    let handle = ex.catalog.handle(table);
    let mut matches = RowList::with_capacity(1, handle.record_count() as usize);
    handle.full_table_access(&mut matches, &[vfs::FieldPredicate { column, op: binop, value }], None)?;

    let jc = left.join_count() + 1;
    let mut out = RowList::with_capacity(jc, left.row_count() * matches.row_count().max(1));
    for i in 0..left.row_count() {
        if matches.is_empty() {
            if outer {
                out.append_joined(left, i, ROWID_NULL);
            }
            continue;
        }
        for m in 0..matches.row_count() {
            out.append_joined(left, i, matches.row(m)[0]);
        }
    }
    Ok(out)
}

/// `PlanStep::UniqueJoin`: an equality join answered by `table`'s primary
/// or unique index — at most one match per left row.
pub fn unique_join(
    ex: &Executor,
    left: &RowList,
    table: TableId,
    predicate: &Predicate,
    outer: bool,
) -> DbResult<RowList> {
    seek_join(ex, left, table, predicate, outer, true)
}

/// `PlanStep::IndexJoin`: an equality join answered by `table`'s non-unique
/// index — possibly several matches per left row.
pub fn index_join(
    ex: &Executor,
    left: &RowList,
    table: TableId,
    predicate: &Predicate,
    outer: bool,
) -> DbResult<RowList> {
    seek_join(ex, left, table, predicate, outer, false)
}

fn seek_join(
    ex: &Executor,
    left: &RowList,
    table: TableId,
    predicate: &Predicate,
    outer: bool,
    unique: bool,
) -> DbResult<RowList> {
    let (new_side, source, flipped) = split(table, predicate);
    let column = new_side_column(new_side)?;
    let source = source.ok_or_else(|| {
        DbError::Evaluator("indexed join predicate has no source side to seek with".into())
    })?;
    let index_file = ex.catalog.index_for(table, column).ok_or_else(|| {
        DbError::Index(format!("no index for column {column} the planner chose a seek join for"))
    })?;
    let index_driver = index::open_index(&index_file, ex.opts)?;
    let op = if flipped { Predicate::flip(predicate.op) } else { predicate.op };
    let binop = planner::compare_op_to_binary_op(op)
        .ok_or_else(|| DbError::Evaluator("IS [NOT] NULL cannot drive an indexed join".into()))?;

    let jc = left.join_count() + 1;
    let mut out = RowList::with_capacity(jc, left.row_count());
    for i in 0..left.row_count() {
        let rowids = left.row(i);
        let seek_value = ex.eval_field(source, rowids)?;
        let matches = if unique {
            match index_file.kind {
                IndexKind::Primary => index::primary_seek(&index_driver, binop, &seek_value, None)?,
                _ => index::unique_seek(&index_driver, binop, &seek_value, None)?,
            }
        } else {
            index::index_seek(&index_driver, binop, &seek_value, None)?
        };
        if matches.is_empty() {
            if outer {
                out.append_joined(left, i, ROWID_NULL);
            }
            continue;
        }
        for m in 0..matches.row_count() {
            out.append_joined(left, i, matches.row(m)[0]);
        }
    }
    Ok(out)
}

/// `PlanStep::LoopJoin`: no index answers the predicate, so every row of
/// `table` is re-checked against every left row.
pub fn loop_join(
    ex: &Executor,
    left: &RowList,
    table: TableId,
    predicate: &Predicate,
    outer: bool,
) -> DbResult<RowList> {
    let right_count = ex.catalog.handle(table).record_count();
    let jc = left.join_count() + 1;
    let mut out = RowList::with_capacity(jc, left.row_count());
    for i in 0..left.row_count() {
        let left_rowids = left.row(i);
        let mut any = false;
        for r in 0..right_count {
            let mut combined: Vec<u32> = left_rowids.to_vec();
            combined.push(r as u32);
            if scan::eval_predicate(ex, predicate, &combined)? {
                out.append_n(&combined);
                any = true;
            }
        }
        if !any && outer {
            let mut combined: Vec<u32> = left_rowids.to_vec();
            combined.push(ROWID_NULL);
            out.append_n(&combined);
        }
    }
    Ok(out)
}
