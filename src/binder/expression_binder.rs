//! Resolution of parsed expressions against the relations of a statement.

use std::sync::Arc;

use tracing::warn;

use crate::error::{RelError, Result};
use crate::parser::ast::{Expression, RelAttrSqlNode};
use crate::storage::Table;
use crate::types::{DataType, Value};

use super::expression::{AggregateFunction, Expr, FieldExpr};
use super::semantic::BindError;

/// Relations visible to expression binding, in registration order.
#[derive(Debug, Default)]
pub struct BinderContext {
    query_tables: Vec<Arc<Table>>,
}

impl BinderContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a relation. The same relation may be added twice.
    pub fn add_table(&mut self, table: Arc<Table>) {
        self.query_tables.push(table);
    }

    /// Finds a registered relation by name.
    #[must_use]
    pub fn find_table(&self, name: &str) -> Option<&Arc<Table>> {
        self.query_tables.iter().find(|t| t.name() == name)
    }

    #[must_use]
    pub fn query_tables(&self) -> &[Arc<Table>] {
        &self.query_tables
    }
}

/// Binds parsed expressions in a [`BinderContext`].
///
/// Every bound projection carries the column name it is reported under.
pub struct ExpressionBinder<'a> {
    context: &'a BinderContext,
}

impl<'a> ExpressionBinder<'a> {
    #[must_use]
    pub fn new(context: &'a BinderContext) -> Self {
        ExpressionBinder { context }
    }

    /// Binds one projection or group-by item. `*` and `t.*` expand to one
    /// expression per field.
    ///
    /// # Errors
    ///
    /// Returns a bind error for unresolved, ambiguous or misplaced names,
    /// and `InvalidArgument` for `*` without relations.
    pub fn bind_expression(&self, expr: &Expression) -> Result<Vec<(Expr, String)>> {
        match expr {
            Expression::Star { relation: None } => {
                if self.context.query_tables.is_empty() {
                    return Err(RelError::InvalidArgument("'*' requires a FROM clause".into()));
                }
                let qualify = self.context.query_tables.len() > 1;
                Ok(self
                    .context
                    .query_tables
                    .iter()
                    .flat_map(|table| Self::expand_table(table, qualify))
                    .collect())
            }
            Expression::Star {
                relation: Some(name),
            } => {
                let table = self.context.find_table(name).ok_or_else(|| {
                    warn!(table = %name, "'*' qualifier is not a relation of the query");
                    BindError::UnknownTable(name.clone())
                })?;
                Ok(Self::expand_table(
                    table,
                    self.context.query_tables.len() > 1,
                ))
            }
            other => Ok(vec![(self.bind_scalar(other)?, other.to_string())]),
        }
    }

    fn expand_table(table: &Arc<Table>, qualify: bool) -> Vec<(Expr, String)> {
        table
            .meta()
            .fields()
            .iter()
            .map(|field| {
                let name = if qualify {
                    format!("{}.{}", table.name(), field.name)
                } else {
                    field.name.clone()
                };
                (Expr::Field(FieldExpr::new(table.name(), field.clone())), name)
            })
            .collect()
    }

    /// Binds an expression that must produce exactly one value.
    ///
    /// # Errors
    ///
    /// Same as [`ExpressionBinder::bind_expression`]; a `*` here is an
    /// `InvalidArgument`.
    pub fn bind_scalar(&self, expr: &Expression) -> Result<Expr> {
        match expr {
            Expression::Star { .. } => Err(RelError::InvalidArgument(
                "'*' is only allowed as a projection or in COUNT(*)".into(),
            )),
            Expression::UnboundField(attr) => self.bind_field(attr).map(Expr::Field),
            Expression::Value(v) => Ok(Expr::Value(v.clone())),
            Expression::Arithmetic { op, left, right } => {
                let mut left = self.bind_scalar(left)?;
                let mut right = self.bind_scalar(right)?;
                coerce_literal(&mut left, right.value_type());
                coerce_literal(&mut right, left.value_type());
                Ok(Expr::Arithmetic {
                    op: *op,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
            Expression::Negative(child) => {
                Ok(Expr::Negative(Box::new(self.bind_scalar(child)?)))
            }
            Expression::UnboundAggregation { name, child } => self.bind_aggregation(name, child),
        }
    }

    /// Resolves a column reference.
    ///
    /// # Errors
    ///
    /// `UnknownTable` for a qualifier outside the query, `AmbiguousColumn`
    /// for an unqualified name with several relations, `UnresolvedColumn`
    /// for a name the table does not have.
    pub fn bind_field(&self, attr: &RelAttrSqlNode) -> Result<FieldExpr> {
        let table = match &attr.relation_name {
            Some(name) => self.context.find_table(name).ok_or_else(|| {
                warn!(table = %name, "qualifier is not a relation of the query");
                BindError::UnknownTable(name.clone())
            })?,
            None => match self.context.query_tables.as_slice() {
                [only] => only,
                [] => {
                    return Err(BindError::UnresolvedColumn {
                        table: String::new(),
                        field: attr.attribute_name.clone(),
                    }
                    .into())
                }
                _ => {
                    warn!(field = %attr.attribute_name, "cannot determine table for column");
                    return Err(BindError::AmbiguousColumn(attr.attribute_name.clone()).into());
                }
            },
        };

        let field = table.meta().field(&attr.attribute_name).ok_or_else(|| {
            warn!(table = table.name(), field = %attr.attribute_name, "no such field");
            BindError::UnresolvedColumn {
                table: table.name().to_string(),
                field: attr.attribute_name.clone(),
            }
        })?;
        Ok(FieldExpr::new(table.name(), field.clone()))
    }

    fn bind_aggregation(&self, name: &str, child: &Expression) -> Result<Expr> {
        let function = AggregateFunction::parse(name).ok_or_else(|| {
            warn!(function = name, "unknown aggregate function");
            BindError::InvalidAggregation(format!("unknown function {name}"))
        })?;

        let child = match child {
            Expression::Star { relation: None } if function == AggregateFunction::Count => {
                Expr::Value(Value::Int32(1))
            }
            Expression::Star { .. } => {
                return Err(BindError::InvalidAggregation(format!(
                    "{}({child}) is not supported",
                    function.name()
                ))
                .into())
            }
            other => self.bind_scalar(other)?,
        };

        if child.has_aggregate() {
            return Err(BindError::InvalidAggregation(format!(
                "nested aggregation in {}",
                function.name()
            ))
            .into());
        }
        if matches!(function, AggregateFunction::Sum | AggregateFunction::Avg)
            && child.value_type().is_some_and(|t| !t.is_numeric())
        {
            return Err(BindError::InvalidAggregation(format!(
                "{} over non-numeric {child}",
                function.name()
            ))
            .into());
        }

        Ok(Expr::Aggregate {
            function,
            child: Box::new(child),
        })
    }
}

/// Converts a numeric literal to the type of the other operand when the
/// conversion is lossless.
fn coerce_literal(expr: &mut Expr, target: Option<DataType>) {
    let (Expr::Value(value), Some(target)) = (&*expr, target) else {
        return;
    };
    if !target.is_numeric() || value.data_type() == Some(target) {
        return;
    }
    if let Ok(cast) = value.cast_to(target) {
        *expr = Expr::Value(cast);
    }
}
