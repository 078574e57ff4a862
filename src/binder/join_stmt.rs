//! JOIN clause binding.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::error::{RelError, Result};
use crate::parser::ast::JoinSqlNode;
use crate::storage::{Db, Table};

use super::filter_stmt::FilterStmt;

/// One joined relation with the condition of its ON clause.
#[derive(Debug)]
pub struct JoinStmt {
    table: Arc<Table>,
    condition: FilterStmt,
}

impl JoinStmt {
    /// Binds a JOIN clause. The relation must already be registered in
    /// `tables`; the condition is built by [`FilterStmt::create`] and its
    /// errors are returned unchanged.
    ///
    /// # Errors
    ///
    /// `SchemaTableNotExist` if the relation is not registered, otherwise
    /// any error of filter construction.
    pub fn create(
        db: &Db,
        default_table: Option<&Arc<Table>>,
        tables: &HashMap<String, Arc<Table>>,
        join: &JoinSqlNode,
    ) -> Result<JoinStmt> {
        let table = tables.get(&join.relation).cloned().ok_or_else(|| {
            warn!(db = db.name(), table = %join.relation, "join relation is not registered");
            RelError::SchemaTableNotExist(join.relation.clone())
        })?;
        let condition = FilterStmt::create(db, default_table, tables, &join.conditions)?;
        Ok(JoinStmt { table, condition })
    }

    #[must_use]
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    #[must_use]
    pub fn condition(&self) -> &FilterStmt {
        &self.condition
    }
}
