//! Name resolution (spec §4.4): binds every `Field::Column`/`Field::RowId`
//! in a parsed `Query` to a `(TableId, ColumnId)` pair. Runs once, after
//! parsing and before planning.

use common::TableId;
use parser::ast::{Field, FieldKind, Predicate, Query};
use vfs::TableSource;

use crate::{Catalog, unresolved};

pub fn resolve_query(catalog: &Catalog, query: &mut Query) -> Result<(), common::DbError> {
    for (i, table_ref) in query.tables.iter_mut().enumerate() {
        table_ref.table_id = Some(TableId(i as u32));
    }

    // The driving table's own predicate set can reference any table already
    // joined; join predicates are resolved in the same pass since
    // `Field::table_id` lookups don't depend on ordering.
    for table_ref in &mut query.tables {
        if let Some(predicate) = &mut table_ref.join_predicate {
            resolve_predicate(catalog, predicate)?;
        }
    }

    for column in &mut query.columns {
        for field in column.fields_mut() {
            resolve_field(catalog, field)?;
        }
    }

    for predicate in &mut query.predicates {
        resolve_predicate(catalog, predicate)?;
    }

    for group in &mut query.group_by {
        for field in group.fields_mut() {
            resolve_field(catalog, field)?;
        }
    }

    for item in &mut query.order_by {
        for field in item.column.fields_mut() {
            resolve_field(catalog, field)?;
        }
    }

    Ok(())
}

fn resolve_predicate(catalog: &Catalog, predicate: &mut Predicate) -> Result<(), common::DbError> {
    resolve_field(catalog, &mut predicate.left)?;
    if let Some(right) = &mut predicate.right {
        resolve_field(catalog, right)?;
    }
    Ok(())
}

fn resolve_field(catalog: &Catalog, field: &mut Field) -> Result<(), common::DbError> {
    match &field.kind {
        FieldKind::Constant(_) => Ok(()),
        FieldKind::RowNumber => Ok(()),
        FieldKind::Star => {
            let (qualifier, _) = field.qualifier_and_name();
            if let Some(q) = qualifier {
                let table_id = catalog
                    .find_table(q)
                    .ok_or_else(|| unresolved(format!("unknown table '{q}'")))?;
                field.table_id = Some(table_id);
            }
            Ok(())
        }
        FieldKind::RowId => {
            let (qualifier, _) = field.qualifier_and_name();
            let table_id = resolve_table(catalog, qualifier, None)?;
            field.table_id = Some(table_id);
            Ok(())
        }
        FieldKind::Column => {
            let (qualifier, name) = {
                let (q, n) = field.qualifier_and_name();
                (q.map(str::to_string), n.to_string())
            };
            let table_id = resolve_table(catalog, qualifier.as_deref(), Some(&name))?;
            let index = catalog
                .handle(table_id)
                .field_index(&name)
                .ok_or_else(|| unresolved(format!("unknown column '{name}'")))?;
            field.table_id = Some(table_id);
            field.index = Some(index);
            Ok(())
        }
    }
}

/// Finds the table a (possibly unqualified) field belongs to. A qualifier
/// always wins by alias/name lookup; an unqualified field searches every
/// open table for a column of that name, erroring on ambiguity. An
/// unqualified bare `rowid` (`column == None`) binds to the driving table,
/// since every table has a rowid and there is nothing to disambiguate by.
fn resolve_table(
    catalog: &Catalog,
    qualifier: Option<&str>,
    column: Option<&str>,
) -> Result<TableId, common::DbError> {
    if let Some(q) = qualifier {
        return catalog
            .find_table(q)
            .ok_or_else(|| unresolved(format!("unknown table '{q}'")));
    }
    let Some(column) = column else {
        return Ok(TableId(0));
    };
    let mut found = None;
    for i in 0..catalog.table_count() {
        let id = TableId(i as u32);
        if catalog.handle(id).field_index(column).is_some() {
            if found.is_some() {
                return Err(unresolved(format!("column '{column}' is ambiguous")));
            }
            found = Some(id);
        }
    }
    found.ok_or_else(|| unresolved(format!("unknown column '{column}'")))
}
