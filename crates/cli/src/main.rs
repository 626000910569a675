//! `csvql` — the one-shot command line front end (spec §6): parses a
//! single argument/`-f` file/stdin blob of SQL, dispatches `SELECT` to
//! [`executor::run`] and DDL/`INSERT` to [`catalog`]'s flat-file
//! operations, then renders whatever came back in the requested format.
//! Grounded on `crates/client-cli/src/main.rs`'s `clap` derive style and
//! `crates/repl/src/main.rs`'s "print a result or print an error" shape —
//! neither this crate's interactive REPL nor its TCP client survive the
//! rewrite (spec.md has no client/server split), but the flag parsing and
//! error-reporting idiom do.

use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use common::Config;
use output::{Format, RenderOptions};
use parser::ast::Statement;
use vfs::OpenOptions;

#[derive(Parser, Debug)]
#[command(name = "csvql", about = "Query CSV files (and a few synthetic tables) with SQL")]
struct Args {
    /// SQL text to run. If omitted, read from `--file`, or from stdin
    /// when stdin is not a terminal.
    sql: Option<String>,

    /// Read the query from a file instead of the command line.
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,

    /// Emit a header row (or, for `json_array`, a header array).
    #[arg(short = 'H', long)]
    headers: bool,

    /// Output format: tsv, csv, json, json_array, html, sql, table.
    #[arg(short = 'F', long, default_value = "tsv")]
    format: String,

    /// Seed for the SAMPLE driver's generator and for RANDOM().
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Raise the log level to debug (overridden by `RUST_LOG`).
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("csvql: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<()> {
    let format = Format::parse(&args.format)
        .ok_or_else(|| anyhow::anyhow!("unknown output format '{}'", args.format))?;
    let headers = args.headers;

    let sql = read_sql(&args)?;
    let config = Config::builder().random_seed(args.seed).build();
    let opts = OpenOptions {
        csv_memory_threshold_bytes: config.csv_memory_threshold_bytes,
        random_seed: config.random_seed,
    };

    let statements = parser::parse_sql(&sql).context("parsing SQL")?;
    for statement in statements {
        execute_statement(statement, &sql, &opts, &config, format, headers)?;
    }
    Ok(())
}

/// Reads the query text from the positional argument, `-f`, or stdin, in
/// that order — spec §6's three invocation forms.
fn read_sql(args: &Args) -> Result<String> {
    if let Some(sql) = &args.sql {
        return Ok(sql.clone());
    }
    if let Some(path) = &args.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()));
    }
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        anyhow::bail!("no SQL given: pass it as an argument, via -f, or pipe it on stdin");
    }
    let mut buf = String::new();
    stdin.read_to_string(&mut buf).context("reading stdin")?;
    Ok(buf)
}

fn execute_statement(
    statement: Statement,
    raw_sql: &str,
    opts: &OpenOptions,
    config: &Config,
    format: Format,
    headers: bool,
) -> Result<()> {
    match statement {
        Statement::Select(query) => {
            if query.is_explain() {
                return explain(&query, opts);
            }
            let insert_table = query
                .driving_table()
                .map(|t| t.effective_name().to_string())
                .unwrap_or_else(|| "result".to_string());
            let batch = executor::run(raw_sql, opts, config).context("executing query")?;
            let render_opts = RenderOptions { headers, insert_table };
            print!("{}", output::render(&batch, format, &render_opts));
        }
        Statement::CreateTable { name, columns, primary_key } => {
            catalog::create_table(&name, &columns, primary_key.as_deref(), opts)
                .with_context(|| format!("creating table '{name}'"))?;
            println!("Created table '{name}'");
        }
        Statement::CreateView { name, .. } => {
            let body = extract_view_body(raw_sql)
                .ok_or_else(|| anyhow::anyhow!("malformed CREATE VIEW: no AS clause found"))?;
            catalog::create_view(&name, body).with_context(|| format!("creating view '{name}'"))?;
            println!("Created view '{name}'");
        }
        Statement::DropView { name } => {
            catalog::drop_view(&name).with_context(|| format!("dropping view '{name}'"))?;
            println!("Dropped view '{name}'");
        }
        Statement::CreateIndex { name, table, column, unique } => {
            catalog::create_index(&table, &column, unique, name.as_deref(), opts)
                .with_context(|| format!("creating index on {table}({column})"))?;
            println!("Created index on {table}({column})");
        }
        Statement::DropIndex { name } => {
            catalog::drop_index_by_name(&name).with_context(|| format!("dropping index '{name}'"))?;
            println!("Dropped index '{name}'");
        }
        Statement::DropTable { name } => {
            catalog::drop_table(&name).with_context(|| format!("dropping table '{name}'"))?;
            println!("Dropped table '{name}'");
        }
        Statement::Insert { table, columns, values } => {
            let affected = catalog::insert_rows(&table, columns.as_deref(), &values, opts)
                .with_context(|| format!("inserting into '{table}'"))?;
            println!("{affected} row(s) affected");
        }
    }
    Ok(())
}

/// `CREATE VIEW name AS <select>`'s SQL text doesn't survive parsing into
/// `Query` (the AST has no way back to source text), so the view's saved
/// body is sliced straight out of the original statement instead: the
/// first case-insensitive ` AS ` marks where the defining `SELECT` starts.
fn extract_view_body(raw_sql: &str) -> Option<&str> {
    let upper = raw_sql.to_ascii_uppercase();
    let idx = upper.find(" AS ")?;
    Some(raw_sql[idx + 4..].trim().trim_end_matches(';').trim())
}

/// `EXPLAIN`: builds the same catalog/plan a real execution would, then
/// prints the plan's steps instead of running them (spec §4.5/§4.6 are
/// diagnostic-only here — `EXPLAIN` never touches a subquery/view's own
/// nested plan, only the outer query's).
fn explain(query: &parser::ast::Query, opts: &OpenOptions) -> Result<()> {
    let mut query = query.clone();
    let catalog = catalog::Catalog::open(&query, opts).context("opening tables")?;
    catalog.resolve(&mut query).context("resolving query")?;
    let plan = planner::plan(&query, &catalog).context("planning query")?;
    for step in &plan.steps {
        println!("{step:?}");
    }
    Ok(())
}
