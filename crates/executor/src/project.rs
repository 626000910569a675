//! `SELECT` (spec §4.2, §4.6, §4.9): the terminal step that turns whatever
//! is left on the stack into a [`RecordBatch`] — expanding `*`, evaluating
//! every output column (including aggregates, which read a whole `RowList`
//! rather than one row), and applying OFFSET/LIMIT over the result.

use catalog::Catalog;
use common::{ColumnId, DbResult, RecordBatch, Row, RowList, TableId};
use parser::ast::{ColumnNode, FieldKind, FuncKind, Query};
use types::Value;
use vfs::TableSource;

use crate::Executor;

/// One slot of the output row: either a `*`/`t.*` column expanded against
/// the catalog at plan time, or a general expression evaluated per row/group.
enum OutputItem {
    StarColumn { table: TableId, column: ColumnId, name: String },
    Node(ColumnNode),
}

pub fn select(ex: &mut Executor, query: &Query) -> DbResult<RecordBatch> {
    let items = build_output_items(query, ex.catalog);
    let columns = items
        .iter()
        .map(|item| match item {
            OutputItem::StarColumn { name, .. } => name.clone(),
            OutputItem::Node(node) => node.display_name(),
        })
        .collect();

    let groups = std::mem::take(&mut ex.stack);
    let is_grouped = !query.group_by.is_empty();
    let has_aggregate = query.columns.iter().any(ColumnNode::is_aggregate);

    let mut offset = query.offset.max(0) as usize;
    let limit = if query.limit < 0 { None } else { Some(query.limit as usize) };
    let mut rows = Vec::new();

    if is_grouped {
        for group in &groups {
            if offset > 0 {
                offset -= 1;
                continue;
            }
            if limit.is_some_and(|l| rows.len() >= l) {
                break;
            }
            ex.set_row_number(rows.len() as i64 + 1);
            rows.push(project_group(ex, &items, group)?);
        }
    } else if has_aggregate {
        let combined = combine(&groups);
        if offset == 0 && !limit.is_some_and(|l| l == 0) {
            ex.set_row_number(1);
            rows.push(project_group(ex, &items, &combined)?);
        }
    } else {
        'rows: for group in &groups {
            for i in 0..group.row_count() {
                if offset > 0 {
                    offset -= 1;
                    continue;
                }
                if limit.is_some_and(|l| rows.len() >= l) {
                    break 'rows;
                }
                ex.set_row_number(rows.len() as i64 + 1);
                rows.push(project_row(ex, &items, group, i)?);
            }
        }
    }

    Ok(RecordBatch { columns, rows })
}

/// Flattens whatever the `Group` step (or its absence) left on the stack
/// into one `RowList`, so an aggregate-only query (no `GROUP BY`, but a
/// `COUNT`/`AVG`/... in the select list) sees its whole result as a single
/// implicit group regardless of how many row lists preceded this step.
fn combine(groups: &[RowList]) -> RowList {
    let jc = groups.first().map(RowList::join_count).unwrap_or(1);
    let total = groups.iter().map(RowList::row_count).sum();
    let mut out = RowList::with_capacity(jc, total);
    for group in groups {
        for i in 0..group.row_count() {
            out.copy_row(group, i);
        }
    }
    out
}

fn project_row(ex: &mut Executor, items: &[OutputItem], rl: &RowList, row: usize) -> DbResult<Row> {
    let rowids = rl.row(row).to_vec();
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        values.push(match item {
            OutputItem::StarColumn { table, column, .. } => {
                ex.read_value(*table, rowids[table.0 as usize], *column)?
            }
            OutputItem::Node(node) => ex.eval_node(node, &rowids)?,
        });
    }
    Ok(Row::new(values))
}

/// Projects one output row for a whole group: non-aggregate columns read
/// the group's first row (every row of a group shares the same `GROUP BY`
/// key values by construction), aggregate columns fold over every row.
fn project_group(ex: &mut Executor, items: &[OutputItem], rl: &RowList) -> DbResult<Row> {
    let representative = if rl.row_count() > 0 {
        rl.row(0).to_vec()
    } else {
        vec![common::ROWID_NULL; rl.join_count().max(1)]
    };

    let mut values = Vec::with_capacity(items.len());
    for item in items {
        values.push(match item {
            OutputItem::StarColumn { table, column, .. } => {
                ex.read_value(*table, representative[table.0 as usize], *column)?
            }
            OutputItem::Node(node) if node.is_aggregate() => eval_aggregate_node(ex, node, rl)?,
            OutputItem::Node(node) => ex.eval_node(node, &representative)?,
        });
    }
    Ok(Row::new(values))
}

fn eval_aggregate_node(ex: &mut Executor, node: &ColumnNode, rl: &RowList) -> DbResult<Value> {
    let FuncKind::Aggregate(kind) = node.func else {
        unreachable!("eval_aggregate_node is only called for aggregate ColumnNodes")
    };
    let field = node.fields.first().expect("aggregate node carries exactly one argument field");
    let star = matches!(field.kind, FieldKind::Star);

    let mut values = Vec::with_capacity(rl.row_count());
    for i in 0..rl.row_count() {
        let rowids = rl.row(i);
        values.push(if star { Value::Null } else { ex.eval_field(field, rowids)? });
    }
    expr::aggregate::eval_aggregate(kind, &values, star)
}

fn build_output_items(query: &Query, catalog: &Catalog) -> Vec<OutputItem> {
    let mut items = Vec::new();
    for node in &query.columns {
        if node.is_star() {
            let field = &node.fields[0];
            match field.table_id {
                Some(table) => push_star_columns(&mut items, catalog, table),
                None => {
                    for i in 0..catalog.table_count() {
                        push_star_columns(&mut items, catalog, TableId(i as u32));
                    }
                }
            }
        } else {
            items.push(OutputItem::Node(node.clone()));
        }
    }
    items
}

fn push_star_columns(items: &mut Vec<OutputItem>, catalog: &Catalog, table: TableId) {
    let handle = catalog.handle(table);
    for column in 0..handle.field_count() as ColumnId {
        let name = handle.field_name(column).unwrap_or_default().to_string();
        items.push(OutputItem::StarColumn { table, column, name });
    }
}
