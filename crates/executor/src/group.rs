//! `GROUP` (spec §4.6, §4.9): collapses contiguous runs of equal GROUP BY
//! keys into one `RowList` per group, replacing the single row list on top
//! of the stack with as many row lists as there are groups. The planner
//! guarantees the input is already ordered by `keys` (it inserts a `Sort`
//! beforehand unless it can prove the order is already there).

use common::DbResult;
use common::RowList;
use parser::ast::ColumnNode;
use types::Value;

use crate::Executor;

pub fn group(ex: &mut Executor, keys: &[ColumnNode], limit: Option<usize>) -> DbResult<()> {
    let rl = ex.stack.pop().expect("Group needs a row list on the stack");
    let n = rl.row_count();
    let jc = rl.join_count();

    let mut groups: Vec<RowList> = Vec::new();
    let mut i = 0;
    while i < n {
        if let Some(l) = limit {
            if groups.len() >= l {
                break;
            }
        }
        let key_i = group_key(ex, keys, rl.row(i))?;
        let mut group_rl = RowList::with_capacity(jc, 4);
        group_rl.copy_row(&rl, i);

        let mut j = i + 1;
        while j < n {
            let key_j = group_key(ex, keys, rl.row(j))?;
            if key_j != key_i {
                break;
            }
            group_rl.copy_row(&rl, j);
            j += 1;
        }
        groups.push(group_rl);
        i = j;
    }

    for g in groups {
        ex.stack.push(g);
    }
    Ok(())
}

fn group_key(ex: &mut Executor, keys: &[ColumnNode], rowids: &[u32]) -> DbResult<Vec<Value>> {
    keys.iter().map(|k| ex.eval_node(k, rowids)).collect()
}
