//! Semantic analysis: binding errors and the bound statement set.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::AttrInfo;
use crate::error::{RelError, Result};
use crate::parser::ast::{
    CreateTableSqlNode, DeleteSqlNode, InsertSqlNode, ParsedSqlNode,
};
use crate::storage::{Db, Table};
use crate::types::{DataType, Value};

use super::filter_stmt::FilterStmt;
use super::select_stmt::SelectStmt;
use super::update_stmt::UpdateStmt;

/// Errors that can occur during binding.
#[derive(Debug, Clone, PartialEq)]
pub enum BindError {
    /// A column did not resolve in the table it was looked up in.
    UnresolvedColumn { table: String, field: String },
    /// An unqualified column with more than one relation in scope.
    AmbiguousColumn(String),
    /// A qualifier that names no relation of the statement.
    UnknownTable(String),
    /// Projection neither aggregated nor listed in GROUP BY.
    NonAggregatedNotInGroupBy(String),
    /// Unknown aggregate function or misplaced aggregate argument.
    InvalidAggregation(String),
    /// The two sides of a comparison have incompatible types.
    TypeMismatch { left: DataType, right: DataType },
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindError::UnresolvedColumn { table, field } => {
                write!(f, "Unresolved column '{field}' in table '{table}'")
            }
            BindError::AmbiguousColumn(name) => write!(f, "Ambiguous column: {name}"),
            BindError::UnknownTable(name) => write!(f, "Unknown table in scope: {name}"),
            BindError::NonAggregatedNotInGroupBy(expr) => {
                write!(f, "Non-aggregated expression not in group by: {expr}")
            }
            BindError::InvalidAggregation(msg) => write!(f, "Invalid aggregation: {msg}"),
            BindError::TypeMismatch { left, right } => {
                write!(f, "Type mismatch: cannot compare {left} with {right}")
            }
        }
    }
}

impl std::error::Error for BindError {}

/// A statement after semantic analysis.
#[derive(Debug)]
pub enum Stmt {
    CreateTable(CreateTableStmt),
    Insert(InsertStmt),
    Select(SelectStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
}

impl Stmt {
    /// Binds a parsed statement against `db`.
    ///
    /// # Errors
    ///
    /// Returns the first resolution or validation failure of the statement.
    pub fn create(db: &Db, node: ParsedSqlNode) -> Result<Stmt> {
        match node {
            ParsedSqlNode::CreateTable(create) => {
                CreateTableStmt::create(db, create).map(Stmt::CreateTable)
            }
            ParsedSqlNode::Insert(insert) => InsertStmt::create(db, insert).map(Stmt::Insert),
            ParsedSqlNode::Select(select) => SelectStmt::create(db, select).map(Stmt::Select),
            ParsedSqlNode::Update(update) => UpdateStmt::create(db, update).map(Stmt::Update),
            ParsedSqlNode::Delete(delete) => DeleteStmt::create(db, delete).map(Stmt::Delete),
        }
    }

    /// Returns the statement kind as an upper-case keyword.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Stmt::CreateTable(_) => "CREATE TABLE",
            Stmt::Insert(_) => "INSERT",
            Stmt::Select(_) => "SELECT",
            Stmt::Update(_) => "UPDATE",
            Stmt::Delete(_) => "DELETE",
        }
    }
}

/// Looks up a relation by name, with the error codes statements report.
pub(crate) fn resolve_table(db: &Db, name: &str) -> Result<Arc<Table>> {
    if name.is_empty() {
        warn!(db = db.name(), "invalid argument: relation name is empty");
        return Err(RelError::InvalidArgument("relation name is empty".into()));
    }
    db.find_table(name).ok_or_else(|| {
        warn!(db = db.name(), table = name, "no such table");
        RelError::SchemaTableNotExist(name.to_string())
    })
}

/// Bound CREATE TABLE.
#[derive(Debug, Clone)]
pub struct CreateTableStmt {
    table_name: String,
    attrs: Vec<AttrInfo>,
}

impl CreateTableStmt {
    /// Validates a CREATE TABLE request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty column list and
    /// `SchemaTableExist` if the name is taken.
    pub fn create(db: &Db, node: CreateTableSqlNode) -> Result<Self> {
        if node.attr_infos.is_empty() {
            return Err(RelError::InvalidArgument(format!(
                "table '{}' has no columns",
                node.relation_name
            )));
        }
        if db.find_table(&node.relation_name).is_some() {
            return Err(RelError::SchemaTableExist(node.relation_name));
        }
        let attrs = node
            .attr_infos
            .iter()
            .map(|a| AttrInfo::new(&a.name, a.data_type, a.length))
            .collect();
        Ok(CreateTableStmt {
            table_name: node.relation_name,
            attrs,
        })
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    #[must_use]
    pub fn attrs(&self) -> &[AttrInfo] {
        &self.attrs
    }
}

/// Bound INSERT: one value per field, already in the field's type.
#[derive(Debug)]
pub struct InsertStmt {
    table: Arc<Table>,
    values: Vec<Value>,
}

impl InsertStmt {
    /// Resolves the table and converts every value to its field's type.
    ///
    /// # Errors
    ///
    /// Returns `SchemaTableNotExist` for an unknown table and
    /// `InvalidArgument` for a wrong value count or an unconvertible value.
    pub fn create(db: &Db, node: InsertSqlNode) -> Result<Self> {
        let table = resolve_table(db, &node.relation_name)?;
        let meta = table.meta();
        if node.values.len() != meta.fields().len() {
            warn!(
                table = table.name(),
                expected = meta.fields().len(),
                actual = node.values.len(),
                "value count mismatch"
            );
            return Err(RelError::InvalidArgument(format!(
                "table '{}' has {} columns, got {} values",
                table.name(),
                meta.fields().len(),
                node.values.len()
            )));
        }

        let mut values = Vec::with_capacity(node.values.len());
        for (field, value) in meta.fields().iter().zip(node.values) {
            let converted = value.cast_to(field.data_type).map_err(|_| {
                RelError::InvalidArgument(format!(
                    "value {value} cannot be stored in {} column '{}'",
                    field.data_type, field.name
                ))
            })?;
            values.push(converted);
        }
        debug!(table = table.name(), "bound insert");
        Ok(InsertStmt { table, values })
    }

    #[must_use]
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Bound DELETE.
#[derive(Debug)]
pub struct DeleteStmt {
    table: Arc<Table>,
    filter: Option<FilterStmt>,
}

impl DeleteStmt {
    /// Resolves the table and its optional WHERE filter.
    ///
    /// # Errors
    ///
    /// Returns `SchemaTableNotExist` for an unknown table, or any error of
    /// filter construction.
    pub fn create(db: &Db, node: DeleteSqlNode) -> Result<Self> {
        let table = resolve_table(db, &node.relation_name)?;
        let filter = if node.conditions.is_empty() {
            None
        } else {
            let tables = std::collections::HashMap::from([(
                table.name().to_string(),
                Arc::clone(&table),
            )]);
            Some(FilterStmt::create(
                db,
                Some(&table),
                &tables,
                &node.conditions,
            )?)
        };
        Ok(DeleteStmt { table, filter })
    }

    #[must_use]
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    #[must_use]
    pub fn filter(&self) -> Option<&FilterStmt> {
        self.filter.as_ref()
    }
}
