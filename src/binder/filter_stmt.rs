//! WHERE / ON predicate construction.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{RelError, Result};
use crate::executor::Tuple;
use crate::parser::ast::{CompOp, ConditionOperand, ConditionSqlNode, RelAttrSqlNode};
use crate::storage::{Db, Table};
use crate::types::{DataType, Value};

use super::expression::{compare_values, Expr, FieldExpr};
use super::semantic::BindError;

/// One side of a comparison: a resolved column or a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterObj {
    Attr(FieldExpr),
    Value(Value),
}

impl FilterObj {
    #[must_use]
    pub fn value_type(&self) -> Option<DataType> {
        match self {
            FilterObj::Attr(field) => Some(field.field().data_type),
            FilterObj::Value(v) => v.data_type(),
        }
    }

    #[must_use]
    pub fn is_attr(&self) -> bool {
        matches!(self, FilterObj::Attr(_))
    }

    fn to_expr(&self) -> Expr {
        match self {
            FilterObj::Attr(field) => Expr::Field(field.clone()),
            FilterObj::Value(v) => Expr::Value(v.clone()),
        }
    }
}

impl fmt::Display for FilterObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterObj::Attr(field) => write!(f, "{}.{}", field.table_name(), field.field_name()),
            FilterObj::Value(Value::Char(s)) => write!(f, "'{s}'"),
            FilterObj::Value(v) => write!(f, "{v}"),
        }
    }
}

/// `left comp right`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterUnit {
    left: FilterObj,
    comp: CompOp,
    right: FilterObj,
}

impl FilterUnit {
    #[must_use]
    pub fn left(&self) -> &FilterObj {
        &self.left
    }

    #[must_use]
    pub fn comp(&self) -> CompOp {
        self.comp
    }

    #[must_use]
    pub fn right(&self) -> &FilterObj {
        &self.right
    }
}

impl fmt::Display for FilterUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.left, self.comp.as_str(), self.right)
    }
}

/// Conjunction of comparison units. An empty filter accepts every tuple.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterStmt {
    units: Vec<FilterUnit>,
}

impl FilterStmt {
    /// Resolves every condition and checks both sides are comparable.
    ///
    /// Unqualified columns resolve against `default_table`; qualified ones
    /// against `tables`. Literals are converted to the type of the column
    /// they are compared with.
    ///
    /// # Errors
    ///
    /// `SchemaTableNotExist` for an unknown qualifier, a bind error for an
    /// ambiguous or unresolved column or incompatible operand types.
    pub fn create(
        db: &Db,
        default_table: Option<&Arc<Table>>,
        tables: &HashMap<String, Arc<Table>>,
        conditions: &[ConditionSqlNode],
    ) -> Result<FilterStmt> {
        let mut units = Vec::with_capacity(conditions.len());
        for condition in conditions {
            let unit = Self::create_filter_unit(db, default_table, tables, condition)?;
            units.push(unit);
        }
        debug!(db = db.name(), units = units.len(), "created filter");
        Ok(FilterStmt { units })
    }

    fn create_filter_unit(
        db: &Db,
        default_table: Option<&Arc<Table>>,
        tables: &HashMap<String, Arc<Table>>,
        condition: &ConditionSqlNode,
    ) -> Result<FilterUnit> {
        let mut left = Self::resolve_operand(db, default_table, tables, &condition.left)?;
        let mut right = Self::resolve_operand(db, default_table, tables, &condition.right)?;

        let (Some(left_type), Some(right_type)) = (left.value_type(), right.value_type()) else {
            return Err(RelError::InvalidArgument(format!(
                "null operand in condition {}",
                condition.comp.as_str()
            )));
        };
        if left_type != right_type {
            let mismatch = || {
                warn!(
                    db = db.name(),
                    left = %left_type,
                    right = %right_type,
                    "incomparable operands in condition"
                );
                BindError::TypeMismatch {
                    left: left_type,
                    right: right_type,
                }
            };
            (left, right) = match (left, right) {
                (attr @ FilterObj::Attr(_), FilterObj::Value(v)) => {
                    let cast = v.cast_to(left_type).map_err(|_| mismatch())?;
                    (attr, FilterObj::Value(cast))
                }
                (FilterObj::Value(v), attr @ FilterObj::Attr(_)) => {
                    let cast = v.cast_to(right_type).map_err(|_| mismatch())?;
                    (FilterObj::Value(cast), attr)
                }
                _ => return Err(mismatch().into()),
            };
        }

        Ok(FilterUnit {
            left,
            comp: condition.comp,
            right,
        })
    }

    fn resolve_operand(
        db: &Db,
        default_table: Option<&Arc<Table>>,
        tables: &HashMap<String, Arc<Table>>,
        operand: &ConditionOperand,
    ) -> Result<FilterObj> {
        match operand {
            ConditionOperand::Value(v) => Ok(FilterObj::Value(v.clone())),
            ConditionOperand::Attr(attr) => {
                Self::resolve_attr(db, default_table, tables, attr).map(FilterObj::Attr)
            }
        }
    }

    fn resolve_attr(
        db: &Db,
        default_table: Option<&Arc<Table>>,
        tables: &HashMap<String, Arc<Table>>,
        attr: &RelAttrSqlNode,
    ) -> Result<FieldExpr> {
        let table = match &attr.relation_name {
            Some(name) => tables.get(name).ok_or_else(|| {
                warn!(db = db.name(), table = %name, "no such table in condition");
                RelError::SchemaTableNotExist(name.clone())
            })?,
            None => default_table.ok_or_else(|| {
                warn!(db = db.name(), field = %attr.attribute_name, "cannot determine table");
                BindError::AmbiguousColumn(attr.attribute_name.clone())
            })?,
        };
        let field = table.meta().field(&attr.attribute_name).ok_or_else(|| {
            warn!(
                db = db.name(),
                table = table.name(),
                field = %attr.attribute_name,
                "no such field in condition"
            );
            BindError::UnresolvedColumn {
                table: table.name().to_string(),
                field: attr.attribute_name.clone(),
            }
        })?;
        Ok(FieldExpr::new(table.name(), field.clone()))
    }

    #[must_use]
    pub fn filter_units(&self) -> &[FilterUnit] {
        &self.units
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The filter as one boolean expression.
    #[must_use]
    pub fn to_expr(&self) -> Expr {
        Expr::Conjunction(
            self.units
                .iter()
                .map(|unit| Expr::Comparison {
                    op: unit.comp,
                    left: Box::new(unit.left.to_expr()),
                    right: Box::new(unit.right.to_expr()),
                })
                .collect(),
        )
    }

    /// Returns true if every unit holds for `tuple`.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced field is not part of the tuple.
    pub fn evaluate(&self, tuple: &dyn Tuple) -> Result<bool> {
        for unit in &self.units {
            let left = unit.left.to_expr().get_value(tuple)?;
            let right = unit.right.to_expr().get_value(tuple)?;
            if !compare_values(unit.comp, &left, &right)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Display for FilterStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, unit) in self.units.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{unit}")?;
        }
        Ok(())
    }
}
