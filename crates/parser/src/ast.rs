//! `Query` — the parsed representation the planner and catalog consume
//! (spec §3). Every `Field` starts life carrying only raw text; the
//! `catalog` crate's name resolver fills in `table_id`/`index` (or marks it
//! a pseudo-column) before the planner ever sees it. Resolution is
//! idempotent by construction: binding a `Field` twice just overwrites the
//! same two `Option`s with the same values.

use common::{ColumnId, TableId};
use expr::AggregateKind;
use types::Value;

/// Join strategy recorded on a [`TableRef`], chosen by the parser from the
/// SQL join keyword and resolved to an access method by the planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    /// First table in FROM; has no join predicate of its own.
    Driving,
    Inner,
    Left,
    /// A comma-joined table with no ON clause — cartesian product
    /// (`OPERATOR_ALWAYS` in spec's join-selection table).
    Cross,
}

/// One FROM/JOIN entry.
#[derive(Clone, Debug, PartialEq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
    pub join_kind: JoinKind,
    /// `ON` predicate for INNER/LEFT JOIN; `None` for the driving table and
    /// for CROSS/comma joins.
    pub join_predicate: Option<Predicate>,
    pub table_id: Option<TableId>,
}

impl TableRef {
    /// The name queries refer to this table by: the alias if one was given,
    /// otherwise the bare table name.
    pub fn effective_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// What a [`Field`] names: a real column, one of the reserved
/// pseudo-columns, or a literal constant (spec §3/§4.4).
#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    /// An unresolved, possibly table-qualified column reference. Resolution
    /// fills in `table_id`/`index` on the owning [`Field`].
    Column,
    /// `*` — every column of either one table (qualified, `t.*`) or every
    /// table in the FROM list (bare `*`).
    Star,
    /// `rowid` — the reserved `FIELD_ROW_INDEX` pseudo-column.
    RowId,
    /// Output row ordinal, assigned by the executor's SELECT step.
    RowNumber,
    /// A literal value parsed at parse time (string, integer, `NULL`, or
    /// the unresolved date pseudo-literals `CURRENT_DATE`/`TODAY()`, which
    /// `expr::Expr::CurrentDate` resolves at evaluation time instead).
    Constant(ConstantKind),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConstantKind {
    Value(Value),
    CurrentDate,
}

/// A single field reference: `text` is the raw SQL text (`"people.name"`,
/// `"*"`, `"rowid"`, a quoted string, ...); `table_id`/`index` are filled in
/// by [`Self::is_resolved`]'s counterpart in `catalog` once resolution runs.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub text: String,
    pub kind: FieldKind,
    pub table_id: Option<TableId>,
    pub index: Option<ColumnId>,
}

impl Field {
    pub fn column(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: FieldKind::Column,
            table_id: None,
            index: None,
        }
    }

    pub fn constant(value: Value) -> Self {
        Self {
            text: value.display(),
            kind: FieldKind::Constant(ConstantKind::Value(value)),
            table_id: None,
            index: None,
        }
    }

    pub fn star(qualifier: Option<String>) -> Self {
        Self {
            text: qualifier.map(|q| format!("{q}.*")).unwrap_or_else(|| "*".into()),
            kind: FieldKind::Star,
            table_id: None,
            index: None,
        }
    }

    pub fn rowid() -> Self {
        Self {
            text: "rowid".into(),
            kind: FieldKind::RowId,
            table_id: None,
            index: None,
        }
    }

    /// `ROW_NUMBER()` — the 1-indexed position of this row in the final,
    /// offset-adjusted output (`original_source/src/output.c`'s
    /// `FIELD_ROW_NUMBER` is `result_index + 1`).
    pub fn row_number() -> Self {
        Self {
            text: "ROW_NUMBER()".into(),
            kind: FieldKind::RowNumber,
            table_id: None,
            index: None,
        }
    }

    /// A resolvable reference is every [`FieldKind`] except literal
    /// constants and `RowNumber`, which carry their value without needing a
    /// table lookup. Used by the executor's debug-assert that every field
    /// reaching it has been through resolution (spec §3 invariant).
    pub fn needs_resolution(&self) -> bool {
        matches!(self.kind, FieldKind::Column | FieldKind::RowId)
    }

    pub fn is_resolved(&self) -> bool {
        !self.needs_resolution() || self.table_id.is_some()
    }

    /// Splits `"table.column"` into its two halves; bare names return
    /// `(None, name)` (spec §4.4).
    pub fn qualifier_and_name(&self) -> (Option<&str>, &str) {
        match self.text.split_once('.') {
            Some((prefix, suffix)) => (Some(prefix), suffix),
            None => (None, self.text.as_str()),
        }
    }
}

/// Scalar or aggregate function applied to a select-list item (spec §4.2).
#[derive(Clone, Debug, PartialEq)]
pub enum FuncKind {
    Identity,
    Scalar(expr::ScalarFn),
    Aggregate(AggregateKind),
}

/// One projected output column (spec §3's `ColumnNode`). `concat` lists the
/// additional expressions joined by `||` after the first — an empty vec
/// means this item is not part of a concatenation.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnNode {
    pub func: FuncKind,
    pub alias: Option<String>,
    pub fields: Vec<Field>,
    pub concat: Vec<ColumnNode>,
}

impl ColumnNode {
    pub fn simple(field: Field) -> Self {
        Self {
            func: FuncKind::Identity,
            alias: None,
            fields: vec![field],
            concat: Vec::new(),
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self.func, FuncKind::Aggregate(_))
    }

    pub fn is_star(&self) -> bool {
        self.fields.len() == 1 && matches!(self.fields[0].kind, FieldKind::Star)
    }

    /// Every [`Field`] this node reads from, including concatenated parts —
    /// what the catalog's resolver walks.
    pub fn fields_mut(&mut self) -> Vec<&mut Field> {
        let mut out: Vec<&mut Field> = self.fields.iter_mut().collect();
        for part in &mut self.concat {
            out.extend(part.fields_mut());
        }
        out
    }

    pub fn fields(&self) -> Vec<&Field> {
        let mut out: Vec<&Field> = self.fields.iter().collect();
        for part in &self.concat {
            out.extend(part.fields());
        }
        out
    }

    /// Display name for the output header: the alias if given, else the
    /// raw text of the (first) field.
    pub fn display_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        self.fields.first().map(|f| f.text.clone()).unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    IsNull,
    IsNotNull,
}

/// A WHERE/ON predicate. `right` is absent for `IS [NOT] NULL`.
///
/// Predicates are normalised during parsing so the field (non-constant)
/// side is `left` whenever exactly one side is constant; the comparison
/// operator is flipped to compensate (spec §3's normalisation invariant).
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    pub left: Field,
    pub op: CompareOp,
    pub right: Option<Field>,
    /// Set when the predicate came from a `PK(col)` hint (spec §4.2),
    /// nudging the planner toward `PRIMARY_KEY_SEARCH`.
    pub primary_key_hint: bool,
}

impl Predicate {
    pub fn flip(op: CompareOp) -> CompareOp {
        match op {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
            other => other,
        }
    }

    /// Normalises so the field side is `left`, flipping `op` if the
    /// constant was originally on the left.
    pub fn normalize(mut left: Field, mut op: CompareOp, mut right: Option<Field>) -> Self {
        let left_is_const = matches!(left.kind, FieldKind::Constant(_));
        let right_is_const = right
            .as_ref()
            .map(|f| matches!(f.kind, FieldKind::Constant(_)))
            .unwrap_or(false);
        if left_is_const && !right_is_const {
            if let Some(r) = right.take() {
                op = Self::flip(op);
                right = Some(std::mem::replace(&mut left, r));
            }
        }
        Self {
            left,
            op,
            right,
            primary_key_hint: false,
        }
    }

    /// Every table this predicate touches, by raw field text qualifier —
    /// used before resolution to decide which table a join predicate binds
    /// to.
    pub fn references_only_table(&self, table_id: TableId) -> bool {
        let left_ok = self.left.table_id == Some(table_id) || self.left.table_id.is_none();
        let right_ok = self
            .right
            .as_ref()
            .map(|f| f.table_id == Some(table_id) || f.table_id.is_none())
            .unwrap_or(true);
        left_ok && right_ok
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderItem {
    pub column: ColumnNode,
    pub direction: SortDirection,
}

/// Flags bitset (spec §3). Hand-rolled rather than pulling in a bitflags
/// crate — the set is small and fixed, and csvql never needs the derived
/// trait impls a bitflags macro would buy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryFlags(u16);

impl QueryFlags {
    pub const HAVE_PREDICATE: QueryFlags = QueryFlags(0b0000_0001);
    pub const GROUP: QueryFlags = QueryFlags(0b0000_0010);
    pub const ORDER: QueryFlags = QueryFlags(0b0000_0100);
    pub const PRIMARY_KEY_SEARCH: QueryFlags = QueryFlags(0b0000_1000);
    pub const EXPLAIN: QueryFlags = QueryFlags(0b0001_0000);
    pub const READ_ONLY: QueryFlags = QueryFlags(0b0010_0000);
    pub const NONE: QueryFlags = QueryFlags(0);

    pub fn contains(&self, other: QueryFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: QueryFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: QueryFlags) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for QueryFlags {
    type Output = QueryFlags;
    fn bitor(self, rhs: QueryFlags) -> QueryFlags {
        QueryFlags(self.0 | rhs.0)
    }
}

/// Maximum number of ORDER BY keys the planner will carry through a single
/// multi-key SORT step (spec §3's "small fixed cap").
pub const MAX_ORDER_BY_KEYS: usize = 8;

/// The parsed representation of a `SELECT` (spec §3).
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub tables: Vec<TableRef>,
    pub columns: Vec<ColumnNode>,
    pub predicates: Vec<Predicate>,
    pub order_by: Vec<OrderItem>,
    pub group_by: Vec<ColumnNode>,
    pub offset: i64,
    pub limit: i64,
    pub flags: QueryFlags,
}

impl Query {
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            columns: Vec::new(),
            predicates: Vec::new(),
            order_by: Vec::new(),
            group_by: Vec::new(),
            offset: 0,
            limit: -1,
            flags: QueryFlags::READ_ONLY,
        }
    }

    pub fn driving_table(&self) -> Option<&TableRef> {
        self.tables.first()
    }

    pub fn is_explain(&self) -> bool {
        self.flags.contains(QueryFlags::EXPLAIN)
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

/// Top-level statements recognised at the outer dispatch (spec §4.2); only
/// `Select` flows through the planner/executor pipeline, the rest are
/// handled directly by the `cli` crate.
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Select(Query),
    CreateTable {
        name: String,
        columns: Vec<ColumnDef>,
        primary_key: Option<Vec<String>>,
    },
    CreateView {
        name: String,
        query: Box<Query>,
    },
    DropView {
        name: String,
    },
    CreateIndex {
        name: Option<String>,
        table: String,
        column: String,
        unique: bool,
    },
    DropIndex {
        name: String,
    },
    DropTable {
        name: String,
    },
    Insert {
        table: String,
        columns: Option<Vec<String>>,
        values: Vec<Vec<Value>>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: String,
}
