//! `SORT` (spec §4.5, §4.9, §5.10): one `sort_unstable_by` over row
//! indices, each comparison evaluating every ORDER BY/GROUP BY key through
//! the same expression evaluator project/group use. This replaces the
//! teacher's tree-shaped merge/insertion sort — spec §5.10 explicitly
//! rejects reproducing that for a single, flat row list.

use std::cmp::Ordering;

use common::{DbError, DbResult, RowList};
use parser::ast::{OrderItem, SortDirection};

use crate::Executor;

pub fn sort(ex: &mut Executor, keys: &[OrderItem]) -> DbResult<()> {
    let rl = ex.stack.pop().expect("Sort needs a row list on the stack");
    let n = rl.row_count();
    let mut order: Vec<usize> = (0..n).collect();
    let mut first_error: Option<DbError> = None;

    order.sort_by(|&a, &b| {
        if first_error.is_some() {
            return Ordering::Equal;
        }
        let ra = rl.row(a).to_vec();
        let rb = rl.row(b).to_vec();
        for key in keys {
            let va = match ex.eval_node(&key.column, &ra) {
                Ok(v) => v,
                Err(e) => {
                    first_error = Some(e);
                    return Ordering::Equal;
                }
            };
            let vb = match ex.eval_node(&key.column, &rb) {
                Ok(v) => v,
                Err(e) => {
                    first_error = Some(e);
                    return Ordering::Equal;
                }
            };
            let mut ord = expr::compare_values(&va, &vb);
            if key.direction == SortDirection::Desc {
                ord = ord.reverse();
            }
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });

    if let Some(e) = first_error {
        return Err(e);
    }

    let jc = rl.join_count();
    let mut sorted = RowList::with_capacity(jc, n);
    for &idx in &order {
        sorted.copy_row(&rl, idx);
    }
    ex.stack.push(sorted);
    Ok(())
}
