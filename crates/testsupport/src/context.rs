//! [`TestDb`]: a fixture [`Workspace`] plus the `Config`/`OpenOptions`
//! every query and DDL/DML call needs, so a test reads as a sequence of
//! `db.exec("CREATE TABLE ...")`/`db.query("SELECT ...")` calls instead
//! of wiring those up by hand each time.

use common::{Config, DbResult, RecordBatch};
use parser::ast::Statement;
use vfs::OpenOptions;

use crate::fixtures::Workspace;

pub struct TestDb {
    workspace: Workspace,
    config: Config,
    opts: OpenOptions,
}

impl TestDb {
    /// A fixture directory seeded with `files`, random seed 0.
    pub fn new(files: &[(&str, &str)]) -> Self {
        Self::with_seed(files, 0)
    }

    /// As [`Self::new`], but with an explicit `RANDOM()`/`SAMPLE` seed.
    pub fn with_seed(files: &[(&str, &str)], seed: u64) -> Self {
        let config = Config::builder().random_seed(seed).build();
        let opts = OpenOptions {
            csv_memory_threshold_bytes: config.csv_memory_threshold_bytes,
            random_seed: config.random_seed,
        };
        Self { workspace: Workspace::new(files), config, opts }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn opts(&self) -> &OpenOptions {
        &self.opts
    }

    /// Runs one `SELECT` end to end (spec §4.6's full parse/plan/execute
    /// pipeline, the same entry point `cli` calls).
    pub fn query(&self, sql: &str) -> DbResult<RecordBatch> {
        executor::run(sql, &self.opts, &self.config)
    }

    /// Runs one `CREATE TABLE`/`CREATE INDEX`/`INSERT`/`DROP *` statement.
    /// Panics if given a `SELECT` (use [`Self::query`]) or a `CREATE VIEW`
    /// (use [`Self::create_view`], since a view's defining SQL text does
    /// not survive parsing into `Statement::CreateView`'s `Query` AST).
    pub fn exec(&self, sql: &str) -> DbResult<()> {
        let statement = parser::parse_sql(sql)?
            .into_iter()
            .next()
            .expect("exec() requires at least one statement");
        match statement {
            Statement::Select(_) => panic!("TestDb::exec was given a SELECT; use TestDb::query"),
            Statement::CreateTable { name, columns, primary_key } => {
                catalog::create_table(&name, &columns, primary_key.as_deref(), &self.opts)
            }
            Statement::CreateView { .. } => {
                panic!("TestDb::exec was given a CREATE VIEW; use TestDb::create_view")
            }
            Statement::DropView { name } => catalog::drop_view(&name),
            Statement::CreateIndex { name, table, column, unique } => {
                catalog::create_index(&table, &column, unique, name.as_deref(), &self.opts)
            }
            Statement::DropIndex { name } => catalog::drop_index_by_name(&name),
            Statement::DropTable { name } => catalog::drop_table(&name),
            Statement::Insert { table, columns, values } => {
                catalog::insert_rows(&table, columns.as_deref(), &values, &self.opts).map(|_| ())
            }
        }
    }

    /// Saves `body` (a bare `SELECT ...` statement) as `name.sql`, the way
    /// `cli` does after slicing the part after `AS` out of a `CREATE VIEW`
    /// statement's raw source text.
    pub fn create_view(&self, name: &str, body: &str) -> DbResult<()> {
        catalog::create_view(name, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::PEOPLE_CSV;

    #[test]
    fn exec_then_query_round_trips_through_a_real_csv_file() {
        let db = TestDb::new(&[("people.csv", PEOPLE_CSV)]);
        db.exec("INSERT INTO people (id, name, score) VALUES (5, 'Eve', 40)").unwrap();
        let batch = db.query("SELECT name FROM people WHERE id = 5").unwrap();
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].values[0], types::Value::Text("Eve".into()));
    }

    #[test]
    fn create_table_then_insert_then_select() {
        let db = TestDb::new(&[]);
        db.exec("CREATE TABLE widgets (id INT, name TEXT)").unwrap();
        db.exec("INSERT INTO widgets VALUES (1, 'Sprocket')").unwrap();
        let batch = db.query("SELECT name FROM widgets WHERE id = 1").unwrap();
        assert_eq!(batch.rows[0].values[0], types::Value::Text("Sprocket".into()));
    }
}
