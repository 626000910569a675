use super::*;
use std::io;

#[test]
fn config_defaults_are_sane() {
    let cfg = Config::default();
    assert_eq!(cfg.csv_memory_threshold_bytes, 1024 * 1024);
    assert_eq!(cfg.random_seed, 0);
    assert_eq!(cfg.program_name, "csvql");
}

#[test]
fn config_builder_overrides_defaults() {
    let cfg = Config::builder()
        .csv_memory_threshold_bytes(4096)
        .random_seed(99)
        .build();
    assert_eq!(cfg.csv_memory_threshold_bytes, 4096);
    assert_eq!(cfg.random_seed, 99);
    assert_eq!(cfg.max_token_length, 65536);
}

#[test]
fn db_error_formats_cleanly() {
    let err = DbError::Source("no such file: orders.csv".into());
    assert!(format!("{err}").contains("orders.csv"));
}

#[test]
fn recordbatch_consistency() {
    let rb = RecordBatch {
        columns: vec!["id".into()],
        rows: vec![Row::new(vec![Value::Int(1)])],
    };
    assert_eq!(rb.columns.len(), 1);
    assert_eq!(rb.rows[0].values.len(), 1);
}

#[test]
fn io_error_converts() {
    let e = io::Error::other("oops");
    let db_err: DbError = e.into();
    assert!(matches!(db_err, DbError::Io(_)));
}

#[test]
fn execution_stats_format_duration_scales() {
    assert_eq!(
        ExecutionStats::format_duration(Duration::from_micros(500)),
        "500µs"
    );
    assert_eq!(
        ExecutionStats::format_duration(Duration::from_millis(12)),
        "12.00ms"
    );
    assert_eq!(
        ExecutionStats::format_duration(Duration::from_secs(2)),
        "2.000s"
    );
}
