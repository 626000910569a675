//! `INDEX_ACCESS`/`INDEX_SCAN` (spec §4.5 rules 1-5, §4.7): the driving
//! table's indexed access paths, dispatching to `vfs::index`'s primary/
//! unique/regular-index seek primitives by the [`AccessMethod`] the
//! planner already chose.

use common::{ColumnId, DbError, DbResult, RowList, TableId};
use parser::ast::Predicate;
use planner::AccessMethod;
use vfs::index;

use crate::Executor;

/// `PlanStep::IndexAccess`: one predicate answered entirely by an on-disk
/// index, via the seek primitive matching its `AccessMethod`.
pub fn index_access(
    ex: &Executor,
    table: TableId,
    method: AccessMethod,
    predicate: &Predicate,
    limit: Option<usize>,
) -> DbResult<RowList> {
    let column = predicate
        .left
        .index
        .ok_or_else(|| DbError::Evaluator("IndexAccess predicate's column was not resolved".into()))?;
    let index_file = ex
        .catalog
        .index_for(table, column)
        .ok_or_else(|| DbError::Index(format!("no index for column {column} planner chose one for")))?;
    let index_driver = index::open_index(&index_file, ex.opts)?;

    let right = predicate
        .right
        .as_ref()
        .ok_or_else(|| DbError::Evaluator("IndexAccess predicate has no constant right side".into()))?;
    let value = ex.constant_value(right)?;
    let op = planner::compare_op_to_binary_op(predicate.op)
        .ok_or_else(|| DbError::Evaluator("IS [NOT] NULL cannot use an index access path".into()))?;

    match method {
        AccessMethod::Primary => index::primary_seek(&index_driver, op, &value, limit),
        AccessMethod::Unique => index::unique_seek(&index_driver, op, &value, limit),
        AccessMethod::Index => index::index_seek(&index_driver, op, &value, limit),
    }
}

/// `PlanStep::IndexScan`: walks an index's stored order wholesale, chosen
/// only because that order already satisfies a later ORDER BY/GROUP BY —
/// no predicate is evaluated against it.
pub fn index_scan(
    ex: &Executor,
    table: TableId,
    column: ColumnId,
    limit: Option<usize>,
) -> DbResult<RowList> {
    let index_file = ex.catalog.index_for(table, column).ok_or_else(|| {
        DbError::Index(format!("no index for column {column} planner chose an IndexScan for"))
    })?;
    let index_driver = index::open_index(&index_file, ex.opts)?;
    index::index_scan(&index_driver, limit)
}
