//! SELECT statement binding.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::parser::ast::{Expression, SelectSqlNode};
use crate::storage::{Db, Table};

use super::expression::Expr;
use super::expression_binder::{BinderContext, ExpressionBinder};
use super::filter_stmt::FilterStmt;
use super::join_stmt::JoinStmt;
use super::semantic::{resolve_table, BindError};

/// A fully bound SELECT.
///
/// `tables` lists the FROM relations followed by the joined relations, in
/// declaration order.
#[derive(Debug)]
pub struct SelectStmt {
    tables: Vec<Arc<Table>>,
    from_count: usize,
    query_expressions: Vec<Expr>,
    column_names: Vec<String>,
    filter: Option<FilterStmt>,
    joins: Vec<JoinStmt>,
    group_by: Vec<Expr>,
}

impl SelectStmt {
    /// Binds a parsed SELECT against `db`.
    ///
    /// Relations are resolved first, then the projection is checked against
    /// GROUP BY, then joined relations are registered, then projection and
    /// group-by expressions are bound, and finally the WHERE filter and the
    /// join conditions are built. The first failure aborts the whole
    /// statement.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty relation name, `SchemaTableNotExist`
    /// for an unknown relation, or any bind and filter construction error.
    pub fn create(db: &Db, select: SelectSqlNode) -> Result<SelectStmt> {
        let mut binder_context = BinderContext::new();
        let mut tables: Vec<Arc<Table>> = Vec::new();
        let mut table_map: HashMap<String, Arc<Table>> = HashMap::new();

        for name in &select.relations {
            let table = resolve_table(db, name)?;
            binder_context.add_table(Arc::clone(&table));
            table_map.insert(name.clone(), Arc::clone(&table));
            tables.push(table);
        }
        let from_count = tables.len();

        let has_aggregation = select.expressions.iter().any(Expression::is_aggregation);
        if has_aggregation {
            for expr in &select.expressions {
                if expr.is_aggregation() {
                    continue;
                }
                if !select.group_by.contains(expr) {
                    warn!(db = db.name(), expression = %expr, "non-aggregation expression not in group by");
                    return Err(BindError::NonAggregatedNotInGroupBy(expr.to_string()).into());
                }
            }
        }

        for join in &select.joins {
            let table = resolve_table(db, &join.relation)?;
            binder_context.add_table(Arc::clone(&table));
            table_map.insert(join.relation.clone(), Arc::clone(&table));
            tables.push(table);
        }

        let binder = ExpressionBinder::new(&binder_context);
        let mut query_expressions = Vec::new();
        let mut column_names = Vec::new();
        for expr in &select.expressions {
            for (bound, name) in binder.bind_expression(expr)? {
                query_expressions.push(bound);
                column_names.push(name);
            }
        }
        let mut group_by = Vec::with_capacity(select.group_by.len());
        for expr in &select.group_by {
            group_by.extend(binder.bind_expression(expr)?.into_iter().map(|(e, _)| e));
        }

        let default_table = match tables.as_slice() {
            [only] => Some(only),
            _ => None,
        };
        let filter = if select.conditions.is_empty() {
            None
        } else {
            Some(FilterStmt::create(
                db,
                default_table,
                &table_map,
                &select.conditions,
            )?)
        };
        let mut joins = Vec::with_capacity(select.joins.len());
        for join in &select.joins {
            joins.push(JoinStmt::create(db, default_table, &table_map, join)?);
        }

        debug!(
            db = db.name(),
            tables = tables.len(),
            projections = query_expressions.len(),
            joins = joins.len(),
            "bound select"
        );
        Ok(SelectStmt {
            tables,
            from_count,
            query_expressions,
            column_names,
            filter,
            joins,
            group_by,
        })
    }

    /// All relations: FROM relations first, then joined ones.
    #[must_use]
    pub fn tables(&self) -> &[Arc<Table>] {
        &self.tables
    }

    /// The relations listed in FROM.
    #[must_use]
    pub fn from_tables(&self) -> &[Arc<Table>] {
        &self.tables[..self.from_count]
    }

    #[must_use]
    pub fn query_expressions(&self) -> &[Expr] {
        &self.query_expressions
    }

    /// Output column names, one per query expression.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn filter(&self) -> Option<&FilterStmt> {
        self.filter.as_ref()
    }

    #[must_use]
    pub fn joins(&self) -> &[JoinStmt] {
        &self.joins
    }

    #[must_use]
    pub fn group_by(&self) -> &[Expr] {
        &self.group_by
    }

    /// Returns true if the statement needs an aggregation step.
    #[must_use]
    pub fn is_aggregation(&self) -> bool {
        !self.group_by.is_empty() || self.query_expressions.iter().any(Expr::has_aggregate)
    }
}
