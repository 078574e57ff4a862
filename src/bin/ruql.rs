use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ruql::trx::TrxKind;
use ruql::{Database, DatabaseConfig, QueryResult};

/// Interactive SQL shell over an in-memory ruql database
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Transaction implementation: vacuous or undo
    #[arg(long, default_value = "vacuous")]
    trx: TrxKind,

    /// Database name
    #[arg(long, default_value = "sys")]
    db: String,

    /// Schema file: tables are recreated from it at startup and it is
    /// rewritten on exit
    #[arg(long)]
    schema: Option<PathBuf>,
}

fn open_database(config: DatabaseConfig, schema: Option<&Path>) -> io::Result<Database> {
    match schema {
        Some(path) if path.exists() => {
            let snapshot = fs::read(path)?;
            Database::from_schema_snapshot(config, &snapshot)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        }
        _ => Ok(Database::with_config(config)),
    }
}

fn save_schema(db: &Database, path: &Path) -> io::Result<()> {
    let snapshot = db
        .schema_snapshot()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, snapshot)
}

fn print_result(out: &mut impl Write, result: &QueryResult) -> io::Result<()> {
    if result.columns.is_empty() {
        return writeln!(out, "SUCCESS ({} rows affected)", result.affected_rows);
    }
    writeln!(out, "{}", result.columns.join(" | "))?;
    for row in &result.rows {
        let cells: Vec<String> = row.values().iter().map(ToString::to_string).collect();
        writeln!(out, "{}", cells.join(" | "))?;
    }
    Ok(())
}

fn strip_explain(sql: &str) -> Option<&str> {
    let (word, rest) = sql.split_once(char::is_whitespace)?;
    word.eq_ignore_ascii_case("explain").then_some(rest)
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = DatabaseConfig::new()
        .with_name(&args.db)
        .with_trx_kind(args.trx);
    let mut db = open_database(config, args.schema.as_deref())?;

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        let sql = line.trim();
        if sql.is_empty() {
            continue;
        }
        if matches!(sql, "exit" | "quit" | "\\q") {
            break;
        }

        // "explain <stmt>" prints the operator tree without executing.
        if let Some(stmt) = strip_explain(sql) {
            match db.explain(stmt) {
                Ok(plan) => writeln!(out, "{plan}")?,
                Err(e) => writeln!(out, "{}: {e}", e.code())?,
            }
            continue;
        }
        match db.execute(sql) {
            Ok(result) => print_result(&mut out, &result)?,
            Err(e) => writeln!(out, "{}: {e}", e.code())?,
        }
    }

    if let Some(path) = &args.schema {
        save_schema(&db, path)?;
    }
    Ok(())
}
