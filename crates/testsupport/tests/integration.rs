//! End-to-end scenarios (spec §8), run against real fixture directories.

use common::Row;
use testsupport::prelude::*;
use types::Value;

#[test]
fn filters_and_sorts_by_name() {
    let db = TestDb::new(&[("people.csv", PEOPLE_CSV)]);
    let batch = db.query("SELECT name FROM people WHERE score >= 20 ORDER BY name").unwrap();
    assert_rows(&batch, &[text_row(&["Bob"]), text_row(&["Cara"])]);
}

#[test]
fn counts_and_averages_the_whole_table() {
    let db = TestDb::new(&[("people.csv", PEOPLE_CSV)]);
    let batch = db.query("SELECT COUNT(*), AVG(score) FROM people").unwrap();
    assert_rows(&batch, &[int_row(&[4, 13])]);
}

#[test]
fn groups_by_score_ordered_descending() {
    let db = TestDb::new(&[("people.csv", PEOPLE_CSV)]);
    let batch =
        db.query("SELECT score, COUNT(*) FROM people GROUP BY score ORDER BY score DESC").unwrap();
    assert_rows(&batch, &[int_row(&[20, 2]), int_row(&[10, 1]), int_row(&[5, 1])]);
}

#[test]
fn extract_week_matches_iso_week_numbering() {
    let db = TestDb::empty();
    let first = db.query("SELECT EXTRACT(WEEK FROM '2021-01-04')").unwrap();
    assert_rows(&first, &[int_row(&[1])]);

    let last = db.query("SELECT EXTRACT(WEEK FROM '2021-01-03')").unwrap();
    assert_rows(&last, &[int_row(&[53])]);
}

#[test]
fn calendar_reports_the_last_day_of_a_leap_february() {
    let db = TestDb::empty();
    let batch = db
        .query("SELECT date FROM CALENDAR WHERE year = 2020 AND month = 2 ORDER BY julian DESC LIMIT 1")
        .unwrap();
    assert_rows(&batch, &[text_row(&["2020-02-29"])]);
}

#[test]
fn joins_against_a_materialised_subquery() {
    let db = TestDb::new(&[("people.csv", PEOPLE_CSV)]);
    let batch = db
        .query(
            "SELECT p.name, p.score FROM people p, (SELECT MAX(score) AS m FROM people) x \
             WHERE p.score = x.m",
        )
        .unwrap();
    assert_rows_unordered(&batch, &[
        Row::new(vec![Value::Text("Bob".into()), Value::Int(20)]),
        Row::new(vec![Value::Text("Cara".into()), Value::Int(20)]),
    ]);
}

#[test]
fn create_table_then_index_then_primary_key_seek() {
    let db = TestDb::new(&[]);
    db.exec("CREATE TABLE people (id INT, name TEXT, score INT)").unwrap();
    db.exec("INSERT INTO people VALUES (1, 'Alice', 10)").unwrap();
    db.exec("INSERT INTO people VALUES (2, 'Bob', 20)").unwrap();
    db.exec("CREATE INDEX people_name ON people (name)").unwrap();
    assert!(db.workspace().path().join("people__name.index.csv").is_file());

    let batch = db.query("SELECT score FROM people WHERE name = 'Bob'").unwrap();
    assert_rows(&batch, &[int_row(&[20])]);
}

#[test]
fn create_view_is_queryable_like_a_table() {
    let db = TestDb::new(&[("people.csv", PEOPLE_CSV)]);
    db.create_view("high_scorers", "SELECT name FROM people WHERE score >= 20").unwrap();
    let batch = db.query("SELECT name FROM high_scorers ORDER BY name").unwrap();
    assert_rows(&batch, &[text_row(&["Bob"]), text_row(&["Cara"])]);
}

#[test]
fn row_number_counts_output_rows_one_indexed() {
    let db = TestDb::new(&[("people.csv", PEOPLE_CSV)]);
    let batch = db.query("SELECT ROW_NUMBER(), name FROM people ORDER BY name").unwrap();
    assert_rows(&batch, &[
        Row::new(vec![Value::Int(1), Value::Text("Alice".into())]),
        Row::new(vec![Value::Int(2), Value::Text("Bob".into())]),
        Row::new(vec![Value::Int(3), Value::Text("Cara".into())]),
        Row::new(vec![Value::Int(4), Value::Text("Dan".into())]),
    ]);
}

#[test]
fn information_describes_a_table_s_columns() {
    let db = TestDb::new(&[("people.csv", PEOPLE_CSV)]);
    let batch = db.query("SELECT field, ordinal FROM INFORMATION WHERE field = 'people'").unwrap();
    assert_rows(&batch, &[
        text_row(&["id"]).tap_ordinal(0),
        text_row(&["name"]).tap_ordinal(1),
        text_row(&["score"]).tap_ordinal(2),
    ]);
}

trait TapOrdinal {
    fn tap_ordinal(self, ordinal: i64) -> Row;
}

impl TapOrdinal for Row {
    fn tap_ordinal(self, ordinal: i64) -> Row {
        let mut values = self.into_values();
        values.push(Value::Int(ordinal));
        Row::new(values)
    }
}
