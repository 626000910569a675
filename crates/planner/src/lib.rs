//! Query planning (spec §4.5): turns a resolved [`Query`] into a flat list
//! of [`PlanStep`]s the `executor` crate interprets as a stack machine.
//!
//! This is deliberately *not* the teacher's recursive `LogicalPlan` ->
//! `PhysicalPlan` tree. There is one table per `FROM`/`JOIN` entry, planned
//! left to right: the driving table picks an access method (a predicate-
//! matched index, an index walk that happens to produce the right order,
//! or a full scan), each further table picks a join strategy, and finally
//! SORT/GROUP/SLICE/SELECT are appended as needed (`original_source`'s
//! `db.c` `selectPlan`/`chooseJoinOperator` do the same left-to-right
//! walk, just over a different index model).


use catalog::Catalog;
use common::{ColumnId, DbResult, TableId};
use expr::BinaryOp;
use parser::ast::{
    CompareOp, ColumnNode, FieldKind, JoinKind, OrderItem, Predicate, Query, SortDirection,
};
use vfs::index::IndexKind;

/// Which on-disk index file a driving-table [`PlanStep::IndexAccess`]
/// reads (spec §4.3/§4.7's three index flavours).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMethod {
    /// Position-is-rowid primary index (`table__col.primary.csv`).
    Primary,
    /// Explicit-rowid unique index (`table__col.unique.csv`).
    Unique,
    /// Explicit-rowid non-unique index (`table__col.index.csv`).
    Index,
}

/// One step of a flat execution plan. Every variant pushes exactly one
/// [`common::RowList`] onto the executor's stack, except `Select`, which
/// drains the stack into a `RecordBatch` (spec §4.5/§4.6).
#[derive(Clone, Debug)]
pub enum PlanStep {
    /// No `FROM` clause: push a single zero-width placeholder row.
    DummyRow,
    /// Full enumeration of `table`, with as many `predicates` pushed into
    /// the driver's own scan as could be converted to column-op-constant
    /// form (spec §4.5 rule 6).
    TableScan {
        table: TableId,
        predicates: Vec<Predicate>,
        limit: Option<usize>,
    },
    /// One predicate answered by an on-disk index (spec §4.5 rules 1-3).
    IndexAccess {
        table: TableId,
        method: AccessMethod,
        predicate: Predicate,
        limit: Option<usize>,
    },
    /// Walks an index file in stored (ascending) order without evaluating
    /// any predicate against it — chosen purely because the resulting
    /// order satisfies a later ORDER BY/GROUP BY (spec §4.5 rules 4-5).
    IndexScan {
        table: TableId,
        column: ColumnId,
        limit: Option<usize>,
    },
    /// Re-checks predicates that reference columns from more than one
    /// already-joined table, or that couldn't be pushed into an earlier
    /// step (`IS [NOT] NULL`, column-vs-column, ...) (spec §4.5's final
    /// "remaining predicates" step).
    TableAccessRowid { predicates: Vec<Predicate> },
    /// Cartesian product with `table` (no join predicate).
    CrossJoin { table: TableId, outer: bool },
    /// `table`'s matching rows don't depend on the left row at all (the
    /// predicate's other side is a literal) — computed once, then crossed
    /// with every left row.
    ConstantJoin {
        table: TableId,
        predicate: Predicate,
        outer: bool,
    },
    /// Equality join answered by `table`'s primary/unique index.
    UniqueJoin {
        table: TableId,
        predicate: Predicate,
        outer: bool,
    },
    /// Equality join answered by `table`'s non-unique index.
    IndexJoin {
        table: TableId,
        predicate: Predicate,
        outer: bool,
    },
    /// No index available: re-evaluate the predicate against every row of
    /// `table` for each left row.
    LoopJoin {
        table: TableId,
        predicate: Predicate,
        outer: bool,
    },
    /// Full sort by `keys`, applied when neither pre-existing index order
    /// nor a cheap reversal satisfies ORDER BY/GROUP BY.
    Sort { keys: Vec<OrderItem> },
    /// Pre-existing order already matches ORDER BY except every key is
    /// flipped — cheaper than a full sort.
    Reverse { limit: Option<usize> },
    /// Bounds the row list to `limit` rows from the front — the fallback
    /// every non-self-limiting step relies on (spec §4.5's limit pushdown
    /// note).
    Slice { limit: usize },
    /// Collapses contiguous runs of equal `keys` into one row per group,
    /// bounded to `limit` groups (spec §4.6's GROUP BY handling). Input
    /// must already be ordered by `keys` — the planner inserts a `Sort`
    /// beforehand unless it can prove the order is already there.
    Group {
        keys: Vec<ColumnNode>,
        limit: Option<usize>,
    },
    /// Drains the stack's top `RowList`, evaluates the select list (and
    /// any pending aggregates) per row, and produces the final
    /// `RecordBatch` — OFFSET is applied here, not via `Slice` (spec
    /// §4.6).
    Select,
}

#[derive(Clone, Debug)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

/// Builds a [`Plan`] for `query`, whose fields must already be resolved
/// (`catalog.resolve()` has run). Mirrors spec §4.5's decision table.
pub fn plan(query: &Query, catalog: &Catalog) -> DbResult<Plan> {
    let mut steps = Vec::new();

    if query.tables.is_empty() {
        steps.push(PlanStep::DummyRow);
        finalize(query, &mut steps, None);
        steps.push(PlanStep::Select);
        return Ok(Plan { steps });
    }

    let table0 = query.tables[0].table_id.expect("resolved table");
    let mut pending: Vec<Predicate> = query.predicates.clone();

    let (mut access_steps, mut consumed, order_hint) =
        choose_driving_access(query, catalog, table0, &pending);
    // Remove consumed predicate indices, highest first so earlier indices
    // stay valid as we go.
    consumed.sort_unstable_by(|a, b| b.cmp(a));
    consumed.dedup();
    for idx in consumed {
        pending.remove(idx);
    }
    steps.append(&mut access_steps);

    for i in 1..query.tables.len() {
        let table_ref = &query.tables[i];
        let table_id = table_ref.table_id.expect("resolved table");
        let outer = matches!(table_ref.join_kind, JoinKind::Left);
        match table_ref.join_kind {
            JoinKind::Driving => unreachable!("only tables[0] is Driving"),
            JoinKind::Cross => steps.push(PlanStep::CrossJoin { table: table_id, outer: false }),
            JoinKind::Inner | JoinKind::Left => {
                let predicate = table_ref
                    .join_predicate
                    .clone()
                    .expect("INNER/LEFT JOIN carries an ON predicate");
                steps.push(choose_join_step(catalog, table_id, predicate, outer));
            }
        }
    }

    if !pending.is_empty() {
        steps.push(PlanStep::TableAccessRowid { predicates: pending });
    }

    finalize(query, &mut steps, order_hint);
    steps.push(PlanStep::Select);
    Ok(Plan { steps })
}

/// `offset + limit` when `limit` is non-negative — the bound every
/// self-limiting step is given instead of relying on a trailing
/// [`PlanStep::Slice`] (spec §4.5's pushdown note).
fn effective_cap(query: &Query) -> Option<usize> {
    if query.limit < 0 {
        None
    } else {
        Some(query.offset.max(0) as usize + query.limit as usize)
    }
}

/// Appends GROUP BY / ORDER BY / LIMIT handling after the scan/join chain.
fn finalize(query: &Query, steps: &mut Vec<PlanStep>, order_hint: Option<(TableId, ColumnId)>) {
    let cap = effective_cap(query);

    if !query.group_by.is_empty() {
        if !group_already_ordered(&query.group_by, order_hint) {
            let keys = query
                .group_by
                .iter()
                .cloned()
                .map(|column| OrderItem { column, direction: SortDirection::Asc })
                .collect();
            steps.push(PlanStep::Sort { keys });
        }
        steps.push(PlanStep::Group { keys: query.group_by.clone(), limit: cap });
        if !query.order_by.is_empty() {
            steps.push(PlanStep::Sort { keys: query.order_by.clone() });
        }
        return;
    }

    if !query.order_by.is_empty() {
        match elide_sort(&query.order_by, order_hint) {
            SortElision::AlreadyOrdered => {}
            SortElision::Reverse => steps.push(PlanStep::Reverse { limit: cap }),
            SortElision::NeedsSort => steps.push(PlanStep::Sort { keys: query.order_by.clone() }),
        }
        if let Some(limit) = cap {
            steps.push(PlanStep::Slice { limit });
        }
        return;
    }

    if let Some(limit) = cap {
        steps.push(PlanStep::Slice { limit });
    }
}

enum SortElision {
    AlreadyOrdered,
    Reverse,
    NeedsSort,
}

/// A single-key ORDER BY on a plain, already-indexed column is satisfied
/// for free (or by a cheap [`PlanStep::Reverse`]) when `order_hint` names
/// that same column — the common case of `ORDER BY <indexed column>`
/// riding on the driving table's own `IndexScan`/range access.
fn elide_sort(order_by: &[OrderItem], order_hint: Option<(TableId, ColumnId)>) -> SortElision {
    let (Some((hint_table, hint_col)), [only]) = (order_hint, order_by) else {
        return SortElision::NeedsSort;
    };
    let Some(col) = plain_identity_column(&only.column) else {
        return SortElision::NeedsSort;
    };
    if col.0 != hint_table || col.1 != hint_col {
        return SortElision::NeedsSort;
    }
    match only.direction {
        SortDirection::Asc => SortElision::AlreadyOrdered,
        SortDirection::Desc => SortElision::Reverse,
    }
}

fn group_already_ordered(group_by: &[ColumnNode], order_hint: Option<(TableId, ColumnId)>) -> bool {
    let (Some((hint_table, hint_col)), [only]) = (order_hint, group_by) else {
        return false;
    };
    plain_identity_column(only).is_some_and(|(t, c)| t == hint_table && c == hint_col)
}

/// A `ColumnNode` that's nothing but a single resolved column reference —
/// not a function, concatenation, or expression — the shapes the planner
/// can reason about ordering/indexing for.
fn plain_identity_column(node: &ColumnNode) -> Option<(TableId, ColumnId)> {
    if !node.concat.is_empty() || !matches!(node.func, parser::ast::FuncKind::Identity) {
        return None;
    }
    let field = node.fields.first()?;
    if !matches!(field.kind, FieldKind::Column) {
        return None;
    }
    Some((field.table_id?, field.index?))
}

/// Picks the driving table's access method (spec §4.5 rules 1-6), in
/// priority order: a predicate answered by an index, an ORDER BY/GROUP BY
/// column that happens to be indexed, or a plain scan with every
/// table-0-only predicate pushed into it.
///
/// Returns the step(s) to emit, the indices of `pending` it consumed, and
/// an order hint for [`finalize`] to use for elision.
fn choose_driving_access(
    query: &Query,
    catalog: &Catalog,
    table0: TableId,
    pending: &[Predicate],
) -> (Vec<PlanStep>, Vec<usize>, Option<(TableId, ColumnId)>) {
    if let Some((idx, column, step)) = indexable_predicate(catalog, table0, pending) {
        return (vec![step], vec![idx], Some((table0, column)));
    }

    if let Some(first) = query.order_by.first() {
        if let Some((t, col)) = plain_identity_column(&first.column) {
            if t == table0 && catalog.index_for(table0, col).is_some() {
                return driving_index_scan(table0, col, pending);
            }
        }
    }

    if let Some(first) = query.group_by.first() {
        if let Some((t, col)) = plain_identity_column(first) {
            if t == table0 && catalog.index_for(table0, col).is_some() {
                return driving_index_scan(table0, col, pending);
            }
        }
    }

    let (predicates, consumed) = pushable_predicates(table0, pending);
    (
        vec![PlanStep::TableScan { table: table0, predicates, limit: None }],
        consumed,
        None,
    )
}

fn driving_index_scan(
    table0: TableId,
    column: ColumnId,
    pending: &[Predicate],
) -> (Vec<PlanStep>, Vec<usize>, Option<(TableId, ColumnId)>) {
    let (leftover, consumed) = pushable_predicates(table0, pending);
    let mut steps = vec![PlanStep::IndexScan { table: table0, column, limit: None }];
    if !leftover.is_empty() {
        steps.push(PlanStep::TableAccessRowid { predicates: leftover });
    }
    (steps, consumed, Some((table0, column)))
}

/// Every WHERE predicate that touches only `table0` and compares a plain
/// column to a constant — pushable into a driver's own `full_table_access`
/// (spec §4.3's `FieldPredicate`).
fn pushable_predicates(table0: TableId, pending: &[Predicate]) -> (Vec<Predicate>, Vec<usize>) {
    let mut predicates = Vec::new();
    let mut consumed = Vec::new();
    for (i, p) in pending.iter().enumerate() {
        if p.left.table_id != Some(table0) {
            continue;
        }
        let Some(right) = &p.right else { continue };
        if !matches!(right.kind, FieldKind::Constant(_)) {
            continue;
        }
        predicates.push(p.clone());
        consumed.push(i);
    }
    (predicates, consumed)
}

/// Finds the best table-0-only, column-vs-constant predicate with an
/// on-disk index on that column, preferring one carrying a `PK(...)` hint.
fn indexable_predicate(
    catalog: &Catalog,
    table0: TableId,
    pending: &[Predicate],
) -> Option<(usize, ColumnId, PlanStep)> {
    let mut best: Option<(usize, ColumnId, PlanStep)> = None;
    for (i, p) in pending.iter().enumerate() {
        if p.left.table_id != Some(table0) {
            continue;
        }
        let Some(right) = &p.right else { continue };
        if !matches!(right.kind, FieldKind::Constant(_)) {
            continue;
        }
        let Some(col) = p.left.index else { continue };
        let Some(index_file) = catalog.index_for(table0, col) else { continue };
        if index_file.kind != IndexKind::Regular && p.op == CompareOp::Like {
            // Primary/unique indexes have no run of duplicates to scan a
            // prefix over; LIKE only makes sense against a regular index.
            continue;
        }
        let method = match index_file.kind {
            IndexKind::Primary => AccessMethod::Primary,
            IndexKind::Unique => AccessMethod::Unique,
            IndexKind::Regular => AccessMethod::Index,
        };
        let step = PlanStep::IndexAccess {
            table: table0,
            method,
            predicate: p.clone(),
            limit: None,
        };
        if p.primary_key_hint {
            return Some((i, col, step));
        }
        if best.is_none() {
            best = Some((i, col, step));
        }
    }
    best
}

/// Picks a join strategy for `table`'s `predicate` (spec §4.5's per-table
/// join-strategy rules): a constant-only right side needs no per-row
/// lookup at all, an equality against an indexed column uses that index,
/// everything else falls back to a nested loop.
fn choose_join_step(catalog: &Catalog, table: TableId, predicate: Predicate, outer: bool) -> PlanStep {
    let (new_side, source_side) = split_predicate(table, &predicate);

    if let Some(source) = source_side {
        if matches!(source.kind, FieldKind::Constant(_)) {
            return PlanStep::ConstantJoin { table, predicate, outer };
        }
    }

    if predicate.op == CompareOp::Eq {
        if let Some(col) = new_side.index {
            if let Some(index_file) = catalog.index_for(table, col) {
                return match index_file.kind {
                    IndexKind::Primary | IndexKind::Unique => {
                        PlanStep::UniqueJoin { table, predicate, outer }
                    }
                    IndexKind::Regular => PlanStep::IndexJoin { table, predicate, outer },
                };
            }
        }
    }

    PlanStep::LoopJoin { table, predicate, outer }
}

/// Splits a join predicate into the side belonging to `table` (the table
/// this join step is joining onto) and the other side (read from the
/// already-joined left row, or a constant).
fn split_predicate(table: TableId, predicate: &Predicate) -> (&parser::ast::Field, Option<&parser::ast::Field>) {
    if predicate.left.table_id == Some(table) {
        (&predicate.left, predicate.right.as_ref())
    } else if predicate.right.as_ref().and_then(|f| f.table_id) == Some(table) {
        (predicate.right.as_ref().unwrap(), Some(&predicate.left))
    } else {
        (&predicate.left, predicate.right.as_ref())
    }
}

/// Binary comparison operator equivalent to a resolved predicate's
/// [`CompareOp`], used by executor code converting a [`Predicate`] to a
/// [`vfs::FieldPredicate`]. `IS [NOT] NULL` has no `BinaryOp` counterpart
/// and must be handled by the caller before reaching here.
pub fn compare_op_to_binary_op(op: CompareOp) -> Option<BinaryOp> {
    Some(match op {
        CompareOp::Eq => BinaryOp::Eq,
        CompareOp::Ne => BinaryOp::Ne,
        CompareOp::Lt => BinaryOp::Lt,
        CompareOp::Le => BinaryOp::Le,
        CompareOp::Gt => BinaryOp::Gt,
        CompareOp::Ge => BinaryOp::Ge,
        CompareOp::Like => BinaryOp::Like,
        CompareOp::IsNull | CompareOp::IsNotNull => return None,
    })
}
