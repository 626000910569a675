//! Result-set emitters (spec §6): TSV (default), CSV, HTML, JSON
//! (object-per-row), JSON-array (array-per-row), SQL INSERT statements, and
//! the fixed-width tabular format. Grounded on
//! `examples/original_source/src/output.c`'s `printResultLine`/
//! `printHeaderLine`/`printPreamble`/`printPostamble` format dispatch,
//! reimplemented directly over a already-materialised [`RecordBatch`]
//! rather than streaming field-by-field against a live `RowList`, since the
//! executor has already drained the stack into one by the time `cli` calls
//! this crate (spec §1's "out of scope, simple enough to reimplement
//! directly from the interfaces this spec exposes").

use common::pretty::{self, TableStyleKind};
use common::RecordBatch;
use types::Value;

/// Output format selector (spec §6's `-F`/`--format` flag values).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Tsv,
    Csv,
    Json,
    JsonArray,
    Html,
    Sql,
    Table,
}

impl Format {
    /// Parses a `-F`/`--format` flag value (spec §6's fmt enum).
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "tsv" => Format::Tsv,
            "csv" => Format::Csv,
            "json" => Format::Json,
            "json_array" => Format::JsonArray,
            "html" => Format::Html,
            "sql" => Format::Sql,
            "table" => Format::Table,
            _ => return None,
        })
    }
}

/// Knobs that vary per invocation but aren't part of the format itself.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// `-H`/`--headers`: emit a header row/array (spec §6). Ignored by
    /// `Json`, whose per-row objects always carry field names, and by
    /// `Table`, which always shows a header.
    pub headers: bool,
    /// Table name used by the `Sql` format's `INSERT INTO "name" (...)`
    /// preamble — the name of the driving table for a plain `SELECT`, or a
    /// caller-chosen placeholder for a query with no single source table.
    pub insert_table: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            headers: false,
            insert_table: String::from("result"),
        }
    }
}

/// Renders `batch` in the requested `format`.
pub fn render(batch: &RecordBatch, format: Format, opts: &RenderOptions) -> String {
    match format {
        Format::Tsv => render_delimited(batch, '\t', opts.headers),
        Format::Csv => render_delimited(batch, ',', opts.headers),
        Format::Json => render_json(batch),
        Format::JsonArray => render_json_array(batch, opts.headers),
        Format::Html => render_html(batch, opts.headers),
        Format::Sql => render_sql_insert(batch, &opts.insert_table),
        Format::Table => pretty::render_record_batch(batch, TableStyleKind::Modern),
    }
}

/// TSV/CSV: one record per line, the only formats where a field containing
/// the separator needs quoting (spec §6: "CSV quotes any field containing a
/// comma").
fn render_delimited(batch: &RecordBatch, sep: char, headers: bool) -> String {
    let mut out = String::new();
    if headers {
        out.push_str(&batch.columns.join(&sep.to_string()));
        out.push('\n');
    }
    for row in &batch.rows {
        let fields: Vec<String> = row
            .values
            .iter()
            .map(|v| quote_delimited_field(&v.display(), sep))
            .collect();
        out.push_str(&fields.join(&sep.to_string()));
        out.push('\n');
    }
    out
}

fn quote_delimited_field(text: &str, sep: char) -> String {
    if text.contains(sep) || text.contains('"') || text.contains('\n') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

/// JSON, object-per-row: `[{"col": val, ...}, ...]` (spec §6). Numeric-
/// looking values are emitted unquoted, matching the original's
/// `is_numeric(value)` check in `printResultLine`.
fn render_json(batch: &RecordBatch) -> String {
    let rows: Vec<serde_json::Value> = batch
        .rows
        .iter()
        .map(|row| {
            let map: serde_json::Map<String, serde_json::Value> = batch
                .columns
                .iter()
                .zip(&row.values)
                .map(|(name, v)| (name.clone(), value_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        })
        .collect();
    serde_json::to_string(&serde_json::Value::Array(rows)).expect("Value serializes infallibly")
}

/// JSON, array-per-row: `[["col1","col2"], [v1, v2], ...]` when headers are
/// requested, else just the row arrays (spec §6).
fn render_json_array(batch: &RecordBatch, headers: bool) -> String {
    let mut rows: Vec<serde_json::Value> = Vec::with_capacity(batch.rows.len() + 1);
    if headers {
        rows.push(serde_json::Value::Array(
            batch.columns.iter().cloned().map(serde_json::Value::String).collect(),
        ));
    }
    for row in &batch.rows {
        rows.push(serde_json::Value::Array(row.values.iter().map(value_to_json).collect()));
    }
    serde_json::to_string(&serde_json::Value::Array(rows)).expect("Value serializes infallibly")
}

fn value_to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Null => serde_json::Value::Null,
        Value::Text(s) => match s.parse::<i64>() {
            Ok(n) if looks_strictly_numeric(s) => serde_json::Value::Number(n.into()),
            _ => serde_json::Value::String(s.clone()),
        },
    }
}

fn looks_strictly_numeric(s: &str) -> bool {
    types::Value::Text(s.to_string()).looks_numeric().is_some()
}

/// HTML table with the fixed style block `printPreamble` emits (spec §6).
fn render_html(batch: &RecordBatch, headers: bool) -> String {
    let mut out = String::from(
        "<META CHARSET=\"UTF8\" /><STYLE>.csvdb{font-family:sans-serif;width:100%;border-collapse:collapse}\
.csvdb th{text-transform:capitalize}.csvdb th{border-bottom:1px solid #333}\
.csvdb td{padding:.5em 0}.csvdb tr:hover td{background-color:#f8f8f8}</STYLE>\n\
<TABLE CLASS=\"csvdb\">\n",
    );
    if headers {
        out.push_str("<TR><TH>");
        out.push_str(&batch.columns.iter().map(|c| escape_html(c)).collect::<Vec<_>>().join("</TH><TH>"));
        out.push_str("</TH></TR>\n");
    }
    for row in &batch.rows {
        out.push_str("<TR><TD>");
        let fields: Vec<String> = row.values.iter().map(|v| escape_html(&v.display())).collect();
        out.push_str(&fields.join("</TD><TD>"));
        out.push_str("</TD></TR>\n");
    }
    out.push_str("</TABLE>\n");
    out
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// `INSERT INTO "table" ("col1","col2") VALUES\n(v1,v2),\n(v3,v4);\n` (spec
/// §6). String fields are single-quoted with embedded quotes doubled;
/// numeric-looking fields are emitted bare, matching the original's
/// `is_numeric` branch in `printResultLine`.
fn render_sql_insert(batch: &RecordBatch, table: &str) -> String {
    if batch.rows.is_empty() {
        return String::new();
    }
    let columns: Vec<String> = batch.columns.iter().map(|c| format!("\"{c}\"")).collect();
    let mut out = format!("INSERT INTO \"{table}\" ({}) VALUES\n", columns.join(","));

    let tuples: Vec<String> = batch
        .rows
        .iter()
        .map(|row| {
            let fields: Vec<String> = row.values.iter().map(sql_literal).collect();
            format!("({})", fields.join(","))
        })
        .collect();
    out.push_str(&tuples.join(",\n"));
    out.push_str(";\n");
    out
}

fn sql_literal(v: &Value) -> String {
    match v {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Text(s) if s.looks_numeric().is_some() => s.clone(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Row;

    fn sample() -> RecordBatch {
        RecordBatch {
            columns: vec!["id".into(), "name".into(), "score".into()],
            rows: vec![
                Row::new(vec![Value::Int(1), Value::Text("Alice".into()), Value::Int(10)]),
                Row::new(vec![Value::Int(2), Value::Text("B,ob".into()), Value::Int(20)]),
            ],
        }
    }

    #[test]
    fn tsv_default_has_no_header_unless_requested() {
        let batch = sample();
        let opts = RenderOptions::default();
        let out = render(&batch, Format::Tsv, &opts);
        assert_eq!(out, "1\tAlice\t10\n2\tB,ob\t20\n");
    }

    #[test]
    fn csv_quotes_comma_field() {
        let batch = sample();
        let opts = RenderOptions { headers: true, ..RenderOptions::default() };
        let out = render(&batch, Format::Csv, &opts);
        assert_eq!(out, "id,name,score\n1,Alice,10\n2,\"B,ob\",20\n");
    }

    #[test]
    fn json_emits_object_per_row_with_numeric_unquoted() {
        let batch = sample();
        let out = render(&batch, Format::Json, &RenderOptions::default());
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["id"], serde_json::json!(1));
        assert_eq!(parsed[0]["name"], serde_json::json!("Alice"));
    }

    #[test]
    fn json_array_includes_header_row_when_requested() {
        let batch = sample();
        let opts = RenderOptions { headers: true, ..RenderOptions::default() };
        let out = render(&batch, Format::JsonArray, &opts);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0], serde_json::json!(["id", "name", "score"]));
        assert_eq!(parsed[1], serde_json::json!([1, "Alice", 10]));
    }

    #[test]
    fn html_wraps_rows_in_table_and_escapes() {
        let batch = RecordBatch {
            columns: vec!["tag".into()],
            rows: vec![Row::new(vec![Value::Text("<b>".into())])],
        };
        let out = render(&batch, Format::Html, &RenderOptions::default());
        assert!(out.contains("<TABLE CLASS=\"csvdb\">"));
        assert!(out.contains("&lt;b&gt;"));
    }

    #[test]
    fn sql_insert_quotes_text_not_numbers() {
        let batch = sample();
        let out = render(&batch, Format::Sql, &RenderOptions { insert_table: "people".into(), ..RenderOptions::default() });
        assert!(out.starts_with("INSERT INTO \"people\" (\"id\",\"name\",\"score\") VALUES\n"));
        assert!(out.contains("(1,'Alice',10)"));
        assert!(out.contains("(2,'B,ob',20)"));
        assert!(out.ends_with(";\n"));
    }

    #[test]
    fn format_parse_recognises_every_flag_value() {
        for (name, expected) in [
            ("tsv", Format::Tsv),
            ("csv", Format::Csv),
            ("json", Format::Json),
            ("json_array", Format::JsonArray),
            ("html", Format::Html),
            ("sql", Format::Sql),
            ("table", Format::Table),
        ] {
            assert_eq!(Format::parse(name), Some(expected));
        }
        assert_eq!(Format::parse("bogus"), None);
    }
}
