//! UPDATE statement binding.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::FieldMeta;
use crate::error::{RelError, Result};
use crate::parser::ast::UpdateSqlNode;
use crate::storage::{Db, Table};
use crate::types::Value;

use super::filter_stmt::FilterStmt;
use super::semantic::resolve_table;

/// A bound `UPDATE table SET field = value [WHERE ...]`.
///
/// The value is kept exactly as written. A value whose type differs from
/// the field's is rejected by the update operator before any record is
/// touched.
#[derive(Debug)]
pub struct UpdateStmt {
    table: Arc<Table>,
    field: FieldMeta,
    value: Value,
    filter: Option<FilterStmt>,
}

impl UpdateStmt {
    /// Resolves the table, the assigned field and the optional filter.
    ///
    /// # Errors
    ///
    /// `SchemaTableNotExist` for an unknown table, `SchemaFieldMissing` for
    /// an unknown field, or any error of filter construction.
    pub fn create(db: &Db, update: UpdateSqlNode) -> Result<UpdateStmt> {
        let table = resolve_table(db, &update.relation_name)?;
        let field = table
            .meta()
            .field(&update.attribute_name)
            .cloned()
            .ok_or_else(|| {
                warn!(
                    table = table.name(),
                    field = %update.attribute_name,
                    "no such field to update"
                );
                RelError::SchemaFieldMissing {
                    table: table.name().to_string(),
                    field: update.attribute_name.clone(),
                }
            })?;

        let filter = if update.conditions.is_empty() {
            None
        } else {
            let tables = HashMap::from([(table.name().to_string(), Arc::clone(&table))]);
            Some(FilterStmt::create(
                db,
                Some(&table),
                &tables,
                &update.conditions,
            )?)
        };

        debug!(table = table.name(), field = %field.name, "bound update");
        Ok(UpdateStmt {
            table,
            field,
            value: update.value,
            filter,
        })
    }

    #[must_use]
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    #[must_use]
    pub fn field(&self) -> &FieldMeta {
        &self.field
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn filter(&self) -> Option<&FilterStmt> {
        self.filter.as_ref()
    }
}
