//! ruql - semantic analysis and execution core of a relational engine.
//!
//! SQL text is parsed ([`parser`]), bound against the live schema
//! ([`binder`]), turned into an operator tree ([`planner`]) and executed by
//! pulling tuples through it ([`executor`]). Every statement runs inside one
//! transaction ([`trx`]).

pub mod binder;
pub mod catalog;
pub mod error;
pub mod executor;
pub mod parser;
pub mod planner;
pub mod storage;
pub mod trx;
pub mod types;

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

pub use error::{RelError, Result, ResultCode};
pub use types::{QueryResult, Row, Value};

use binder::Stmt;
use executor::PhysicalOperator;
use planner::PhysicalPlanGenerator;
use storage::Db;
use trx::{Trx, TrxKind};

/// Configuration for creating a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Database name (default: "sys").
    pub name: String,
    /// Transaction implementation used for every statement (default: vacuous).
    pub trx_kind: TrxKind,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: "sys".to_string(),
            trx_kind: TrxKind::default(),
        }
    }
}

impl DatabaseConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the database name.
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Sets the transaction kind.
    #[must_use]
    pub fn with_trx_kind(mut self, trx_kind: TrxKind) -> Self {
        self.trx_kind = trx_kind;
        self
    }
}

/// The main database struct that provides query execution.
pub struct Database {
    db: Db,
    config: DatabaseConfig,
    next_trx_id: AtomicU64,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    /// Creates an empty in-memory database with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DatabaseConfig::default())
    }

    /// Creates an empty in-memory database.
    #[must_use]
    pub fn with_config(config: DatabaseConfig) -> Self {
        info!(db = %config.name, trx = config.trx_kind.name(), "database created");
        Database {
            db: Db::new(&config.name),
            config,
            next_trx_id: AtomicU64::new(1),
        }
    }

    /// Creates a database whose tables are rebuilt, empty, from a schema
    /// snapshot taken with [`Database::schema_snapshot`].
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the snapshot cannot be decoded.
    pub fn from_schema_snapshot(config: DatabaseConfig, snapshot: &[u8]) -> Result<Self> {
        let db = Db::from_schema_snapshot(&config.name, snapshot)?;
        info!(db = %config.name, trx = config.trx_kind.name(), "database created from schema");
        Ok(Database {
            db,
            config,
            next_trx_id: AtomicU64::new(1),
        })
    }

    /// Serializes the schema of every table.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if encoding fails.
    pub fn schema_snapshot(&self) -> Result<Vec<u8>> {
        self.db.schema_snapshot()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Returns the underlying table store.
    #[must_use]
    pub fn db(&self) -> &Db {
        &self.db
    }

    /// Executes one SQL statement. Any statements after the first are
    /// ignored.
    ///
    /// The statement runs in a fresh transaction that is committed on
    /// success and rolled back on failure.
    ///
    /// # Errors
    ///
    /// Returns the first parse, bind or execution error.
    pub fn execute(&mut self, sql: &str) -> Result<QueryResult> {
        let node = parser::parse_sql(sql)?;
        let stmt = Stmt::create(&self.db, node)?;
        debug!(kind = stmt.kind(), "executing statement");

        if let Stmt::CreateTable(create) = &stmt {
            self.db.create_table(create.table_name(), create.attrs())?;
            return Ok(QueryResult::empty());
        }

        let mut operator = PhysicalPlanGenerator::create(&stmt)?;
        let trx_id = self.next_trx_id.fetch_add(1, Ordering::SeqCst);
        let mut trx = self.config.trx_kind.create_trx(trx_id);

        let columns = match &stmt {
            Stmt::Select(select) => select.column_names().to_vec(),
            _ => Vec::new(),
        };
        match Self::run(operator.as_mut(), trx.as_mut(), columns) {
            Ok(result) => {
                trx.commit()?;
                Ok(result)
            }
            Err(e) => {
                warn!(trx = trx_id, code = %e.code(), error = %e, "statement failed, rolling back");
                if let Err(rollback_err) = trx.rollback() {
                    warn!(trx = trx_id, error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }

    fn run(
        operator: &mut dyn PhysicalOperator,
        trx: &mut dyn Trx,
        columns: Vec<String>,
    ) -> Result<QueryResult> {
        if let Err(e) = operator.open(trx) {
            if let Err(close_err) = operator.close() {
                warn!(error = %close_err, "failed to close operator after open failure");
            }
            return Err(e);
        }
        let mut result = QueryResult::new(columns);
        let collected = Self::collect_rows(operator, &mut result);
        let closed = operator.close();
        collected?;
        closed?;
        result.affected_rows = operator.affected_rows();
        Ok(result)
    }

    fn collect_rows(operator: &mut dyn PhysicalOperator, result: &mut QueryResult) -> Result<()> {
        while operator.next()? {
            let Some(tuple) = operator.current_tuple() else {
                continue;
            };
            let values = (0..tuple.cell_num())
                .map(|i| tuple.cell_at(i))
                .collect::<Result<Vec<_>>>()?;
            result.add_row(Row::new(values));
        }
        Ok(())
    }

    /// Renders the operator tree a statement would execute.
    ///
    /// # Errors
    ///
    /// Returns the first parse or bind error, or `Unsupported` for
    /// statements without a plan.
    pub fn explain(&self, sql: &str) -> Result<String> {
        let node = parser::parse_sql(sql)?;
        let stmt = Stmt::create(&self.db, node)?;
        Ok(PhysicalPlanGenerator::create(&stmt)?.describe())
    }
}
