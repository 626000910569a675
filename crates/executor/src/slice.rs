//! `REVERSE`/`SLICE` (spec §4.5, §4.9): the cheap tail-end row-count
//! operators that never touch a driver, only the top `RowList`'s rowid
//! array in place.

use crate::Executor;

/// `PlanStep::Reverse` — the planner's substitute for a full sort when a
/// single-key ORDER BY is the exact opposite of an index's stored order.
pub fn reverse(ex: &mut Executor, limit: Option<usize>) {
    let rl = ex.stack.last_mut().expect("Reverse needs a row list on the stack");
    rl.reverse(limit);
}

/// `PlanStep::Slice` — bounds the top `RowList` to `limit` rows from the
/// front. Every step that could not push its own `offset + limit` cap down
/// into a driver falls back to this (spec §4.5's limit pushdown note).
pub fn truncate(ex: &mut Executor, limit: usize) {
    let rl = ex.stack.last_mut().expect("Slice needs a row list on the stack");
    rl.truncate(limit);
}
