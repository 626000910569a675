//! The per-query table registry and name resolver (spec §3, §4.4). Unlike
//! the teacher's persistent, on-disk catalog, csvql has nothing to load at
//! startup: every query opens its own tables, resolves its own fields, and
//! lets the drivers drop at the end of the query (spec's ephemeral-catalog
//! Non-goal — no ACID metadata store, no cross-query cache).
//!
//! DDL/DML that the old catalog persisted in a metadata file — `CREATE
//! TABLE`/`CREATE INDEX`/`INSERT`/`DROP` — is plain file manipulation here
//! (`ddl` module), grounded on how index files are just CSVs (spec §5.3).

mod ddl;
mod resolve;

use std::path::PathBuf;

use common::{ColumnId, DbError, DbResult, TableId};
use parser::ast::Query;
use vfs::{Handle, OpenOptions, TableSource, index::IndexFile};

pub use ddl::{
    create_index, create_table, create_view, drop_index, drop_index_by_name, drop_table, drop_view,
    insert_rows,
};

/// One opened table/view slot, keyed by its position in `FROM`/`JOIN` order
/// (spec §3: `TableId` is assigned left to right, driving table first).
pub struct OpenTable {
    pub id: TableId,
    /// The name queries address this table by (alias if given).
    pub effective_name: String,
    /// The raw name as written in `FROM`/`JOIN` — what index files on disk
    /// are named after, regardless of any alias.
    pub source_name: String,
    pub handle: Handle,
}

/// The tables a single query has open, plus the resolver that binds its
/// `Field`s to them.
pub struct Catalog {
    tables: Vec<OpenTable>,
}

impl Catalog {
    /// Opens every table named in `query`'s `FROM`/`JOIN` list, assigning
    /// each a `TableId` equal to its position (spec §3).
    pub fn open(query: &Query, opts: &OpenOptions) -> DbResult<Self> {
        Self::open_with(query, opts, |name, opts| vfs::open(name, opts))
    }

    /// As [`Self::open`], but each table name is resolved through `opener`
    /// instead of going straight to `vfs::open`. `executor::run` supplies
    /// an `opener` that recognises derived-table/`.sql`-view names and
    /// re-enters the whole query pipeline to materialise them — `catalog`
    /// itself has no way to run a query (that would cycle back through
    /// `planner`/`executor`), so it takes the capability as a parameter
    /// instead (spec §9's "no hidden singletons").
    pub fn open_with(
        query: &Query,
        opts: &OpenOptions,
        mut opener: impl FnMut(&str, &OpenOptions) -> DbResult<Handle>,
    ) -> DbResult<Self> {
        let mut tables = Vec::with_capacity(query.tables.len());
        for (i, table_ref) in query.tables.iter().enumerate() {
            tracing::debug!(table = %table_ref.name, alias = ?table_ref.alias, "opening query table");
            let handle = opener(&table_ref.name, opts)?;
            tables.push(OpenTable {
                id: TableId(i as u32),
                effective_name: table_ref.effective_name().to_string(),
                source_name: table_ref.name.clone(),
                handle,
            });
        }
        Ok(Self { tables })
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn table(&self, id: TableId) -> &OpenTable {
        &self.tables[id.0 as usize]
    }

    pub fn handle(&self, id: TableId) -> &Handle {
        &self.tables[id.0 as usize].handle
    }

    /// Looks up a table by the name queries use to refer to it (its alias,
    /// or its bare name when no alias was given).
    pub fn find_table(&self, name: &str) -> Option<TableId> {
        self.tables
            .iter()
            .find(|t| t.effective_name == name)
            .map(|t| t.id)
    }

    /// Binds every `Field` in `query` to a `(table_id, index)` pair, and
    /// stamps `TableRef::table_id` for each FROM/JOIN entry (spec §3/§4.4's
    /// resolution pass, run once between parsing and planning).
    pub fn resolve(&self, query: &mut Query) -> DbResult<()> {
        resolve::resolve_query(self, query)
    }

    /// Reports what kind of index (if any) exists for `table_id`'s column
    /// `column`, used by the planner to choose between `TABLE_SCAN` and the
    /// indexed access plan steps (spec §4.5's decision table).
    pub fn index_for(&self, table_id: TableId, column: ColumnId) -> Option<IndexFile> {
        let table = &self.tables[table_id.0 as usize];
        let name = table.handle.field_name(column)?;
        vfs::index::find_index(&table.source_name, name)
    }

    pub fn index_path(&self, table_id: TableId, column: ColumnId) -> Option<PathBuf> {
        self.index_for(table_id, column).map(|f| f.path)
    }
}

/// Resolves a bare table/column name error into the shared error type —
/// every lookup failure in this crate goes through `DbError::Resolver`.
pub(crate) fn unresolved(msg: impl Into<String>) -> DbError {
    DbError::Resolver(msg.into())
}
