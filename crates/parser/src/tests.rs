use super::*;

#[test]
fn parse_basic_statements() {
    let sql = r#"
        CREATE TABLE users (id INT, name TEXT, age INT, PRIMARY KEY (id));
        INSERT INTO users VALUES (1, 'Will', 27);
        SELECT id, name FROM users WHERE age > 20;
    "#;

    let stmts = parse_sql(sql).expect("parser should succeed");
    assert_eq!(stmts.len(), 3);

    match &stmts[0] {
        Statement::CreateTable {
            name,
            columns,
            primary_key,
        } => {
            assert_eq!(name, "users");
            assert_eq!(columns.len(), 3);
            assert_eq!(columns[1].name, "name");
            assert_eq!(columns[1].ty, "TEXT");
            assert_eq!(primary_key.as_deref(), Some(["id".to_string()].as_slice()));
        }
        other => panic!("expected CreateTable, got {other:?}"),
    }

    match &stmts[1] {
        Statement::Insert { table, values, .. } => {
            assert_eq!(table, "users");
            assert_eq!(values.len(), 1);
            assert_eq!(values[0].len(), 3);
        }
        other => panic!("expected Insert, got {other:?}"),
    }

    match &stmts[2] {
        Statement::Select(q) => {
            assert_eq!(q.tables.len(), 1);
            assert_eq!(q.tables[0].name, "users");
            assert_eq!(q.columns.len(), 2);
            assert_eq!(q.predicates.len(), 1);
            assert_eq!(q.predicates[0].op, CompareOp::Gt);
        }
        other => panic!("expected Select, got {other:?}"),
    }
}

#[test]
fn parse_join_with_aliases() {
    let q = parse_query(
        "SELECT p.name, o.total FROM people p JOIN orders o ON p.id = o.person_id WHERE o.total > 10",
    )
    .unwrap();

    assert_eq!(q.tables.len(), 2);
    assert_eq!(q.tables[0].join_kind, JoinKind::Driving);
    assert_eq!(q.tables[1].effective_name(), "o");
    assert_eq!(q.tables[1].join_kind, JoinKind::Inner);
    assert!(q.tables[1].join_predicate.is_some());
    assert_eq!(q.predicates.len(), 1);
}

#[test]
fn parse_left_join_and_cross_join() {
    let q = parse_query("SELECT * FROM a LEFT JOIN b ON a.id = b.a_id CROSS JOIN c").unwrap();
    assert_eq!(q.tables[1].join_kind, JoinKind::Left);
    assert_eq!(q.tables[2].join_kind, JoinKind::Cross);
    assert!(q.tables[2].join_predicate.is_none());
}

#[test]
fn parse_group_by_and_aggregate() {
    let q = parse_query("SELECT dept, COUNT(*), MAX(salary) FROM staff GROUP BY dept").unwrap();
    assert!(q.flags.contains(QueryFlags::GROUP));
    assert_eq!(q.group_by.len(), 1);
    assert!(q.columns[1].is_aggregate());
    assert!(q.columns[2].is_aggregate());
}

#[test]
fn parse_multi_key_order_by() {
    let q = parse_query("SELECT name FROM people ORDER BY age DESC, name ASC").unwrap();
    assert!(q.flags.contains(QueryFlags::ORDER));
    assert_eq!(q.order_by.len(), 2);
    assert_eq!(q.order_by[0].direction, SortDirection::Desc);
    assert_eq!(q.order_by[1].direction, SortDirection::Asc);
}

#[test]
fn parse_limit_offset_and_fetch_first() {
    let q = parse_query("SELECT name FROM people LIMIT 5 OFFSET 10").unwrap();
    assert_eq!(q.limit, 5);
    assert_eq!(q.offset, 10);

    let q2 = parse_query("SELECT name FROM people FETCH FIRST 3 ROWS ONLY").unwrap();
    assert_eq!(q2.limit, 3);
}

#[test]
fn parse_concat_select_item() {
    let q = parse_query("SELECT name || ' ' || city AS label FROM people").unwrap();
    assert_eq!(q.columns.len(), 1);
    assert_eq!(q.columns[0].concat.len(), 2);
    assert_eq!(q.columns[0].alias.as_deref(), Some("label"));
}

#[test]
fn parse_pk_hint_sets_flag() {
    let q = parse_query("SELECT * FROM people WHERE PK(id) = 5").unwrap();
    assert!(q.flags.contains(QueryFlags::PRIMARY_KEY_SEARCH));
    assert!(q.predicates[0].primary_key_hint);
}

#[test]
fn parse_explain_select() {
    let stmts = parse_sql("EXPLAIN SELECT * FROM people").unwrap();
    match &stmts[0] {
        Statement::Select(q) => assert!(q.is_explain()),
        other => panic!("expected Select, got {other:?}"),
    }
}

#[test]
fn parse_extract_function() {
    let q = parse_query("SELECT EXTRACT(YEAR FROM birthdate) FROM people").unwrap();
    match &q.columns[0].func {
        FuncKind::Scalar(expr::ScalarFn::Extract(expr::ExtractPart::Year)) => {}
        other => panic!("expected Extract(Year), got {other:?}"),
    }
}

#[test]
fn parse_create_view_and_drop_view() {
    let stmts = parse_sql("CREATE VIEW v AS SELECT id FROM people; DROP VIEW v;").unwrap();
    match &stmts[0] {
        Statement::CreateView { name, query } => {
            assert_eq!(name, "v");
            assert_eq!(query.columns.len(), 1);
        }
        other => panic!("expected CreateView, got {other:?}"),
    }
    match &stmts[1] {
        Statement::DropView { name } => assert_eq!(name, "v"),
        other => panic!("expected DropView, got {other:?}"),
    }
}

#[test]
fn parse_unique_index() {
    let stmts = parse_sql("CREATE UNIQUE INDEX idx_name ON people (name)").unwrap();
    match &stmts[0] {
        Statement::CreateIndex {
            name,
            table,
            column,
            unique,
        } => {
            assert_eq!(name.as_deref(), Some("idx_name"));
            assert_eq!(table, "people");
            assert_eq!(column, "name");
            assert!(unique);
        }
        other => panic!("expected CreateIndex, got {other:?}"),
    }
}

#[test]
fn rejects_negated_in_list_with_multiple_values() {
    let err = parse_query("SELECT * FROM people WHERE id IN (1, 2, 3)").unwrap_err();
    assert!(format!("{err}").contains("IN"));
}

#[test]
fn wildcard_with_qualifier() {
    let q = parse_query("SELECT p.* FROM people p").unwrap();
    assert!(q.columns[0].is_star());
    assert_eq!(q.columns[0].fields[0].text, "p.*");
}

#[test]
fn row_number_is_a_pseudo_column() {
    let q = parse_query("SELECT ROW_NUMBER(), name FROM people").unwrap();
    assert_eq!(q.columns[0].fields[0].kind, FieldKind::RowNumber);
    assert!(q.columns[0].fields[0].is_resolved());
}
