//! Bound expressions.

use std::fmt;

use crate::catalog::FieldMeta;
use crate::error::{RelError, Result};
use crate::executor::Tuple;
use crate::parser::ast::{ArithmeticOp, CompOp};
use crate::types::{DataType, Value};

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    /// Parses an aggregate function name, case-insensitively.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "COUNT" => Some(AggregateFunction::Count),
            "SUM" => Some(AggregateFunction::Sum),
            "AVG" => Some(AggregateFunction::Avg),
            "MIN" => Some(AggregateFunction::Min),
            "MAX" => Some(AggregateFunction::Max),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }
}

/// A column reference resolved to its owning relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldExpr {
    table: String,
    field: FieldMeta,
}

impl FieldExpr {
    #[must_use]
    pub fn new(table: &str, field: FieldMeta) -> Self {
        FieldExpr {
            table: table.to_string(),
            field,
        }
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn field(&self) -> &FieldMeta {
        &self.field
    }

    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field.name
    }
}

/// Expression with every name resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column of a bound relation.
    Field(FieldExpr),
    /// Literal.
    Value(Value),
    /// Binary arithmetic in the operands' native type.
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary minus.
    Negative(Box<Expr>),
    /// Aggregation over a child expression. Only an aggregating tuple can
    /// produce its value.
    Aggregate {
        function: AggregateFunction,
        child: Box<Expr>,
    },
    /// Comparison yielding a boolean.
    Comparison {
        op: CompOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// AND of all children. Empty means true.
    Conjunction(Vec<Expr>),
}

impl Expr {
    /// Result type of this expression, or None if it cannot be known
    /// before evaluation.
    #[must_use]
    pub fn value_type(&self) -> Option<DataType> {
        match self {
            Expr::Field(f) => Some(f.field.data_type),
            Expr::Value(v) => v.data_type(),
            Expr::Arithmetic { left, right, .. } => {
                left.value_type().or_else(|| right.value_type())
            }
            Expr::Negative(child) => child.value_type(),
            Expr::Aggregate { function, child } => match function {
                AggregateFunction::Count => Some(DataType::Int32),
                AggregateFunction::Avg => Some(DataType::Float32),
                _ => child.value_type(),
            },
            Expr::Comparison { .. } | Expr::Conjunction(_) => Some(DataType::Bool),
        }
    }

    /// Returns true if this expression contains an aggregation.
    #[must_use]
    pub fn has_aggregate(&self) -> bool {
        match self {
            Expr::Aggregate { .. } => true,
            Expr::Field(_) | Expr::Value(_) => false,
            Expr::Arithmetic { left, right, .. } | Expr::Comparison { left, right, .. } => {
                left.has_aggregate() || right.has_aggregate()
            }
            Expr::Negative(child) => child.has_aggregate(),
            Expr::Conjunction(children) => children.iter().any(Expr::has_aggregate),
        }
    }

    /// Appends every distinct aggregation in this tree to `out`.
    pub fn collect_aggregates(&self, out: &mut Vec<Expr>) {
        match self {
            Expr::Aggregate { .. } => {
                if !out.contains(self) {
                    out.push(self.clone());
                }
            }
            Expr::Field(_) | Expr::Value(_) => {}
            Expr::Arithmetic { left, right, .. } | Expr::Comparison { left, right, .. } => {
                left.collect_aggregates(out);
                right.collect_aggregates(out);
            }
            Expr::Negative(child) => child.collect_aggregates(out),
            Expr::Conjunction(children) => {
                for child in children {
                    child.collect_aggregates(out);
                }
            }
        }
    }

    /// Appends every distinct field referenced outside an aggregation.
    pub fn collect_fields(&self, out: &mut Vec<Expr>) {
        match self {
            Expr::Field(_) => {
                if !out.contains(self) {
                    out.push(self.clone());
                }
            }
            Expr::Value(_) | Expr::Aggregate { .. } => {}
            Expr::Arithmetic { left, right, .. } | Expr::Comparison { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
            Expr::Negative(child) => child.collect_fields(out),
            Expr::Conjunction(children) => {
                for child in children {
                    child.collect_fields(out);
                }
            }
        }
    }

    /// Evaluates this expression against `tuple`.
    ///
    /// A tuple that already carries the value of this exact expression (a
    /// group key or an aggregate result) answers it directly.
    ///
    /// # Errors
    ///
    /// Returns an error if a field is missing from the tuple, the operand
    /// types disagree, or the arithmetic fails.
    pub fn get_value(&self, tuple: &dyn Tuple) -> Result<Value> {
        if let Some(value) = tuple.find_expr(self) {
            return Ok(value);
        }
        match self {
            Expr::Field(field) => tuple.find_cell(field)?.ok_or_else(|| {
                RelError::Internal(format!(
                    "field {}.{} is not part of the tuple",
                    field.table, field.field.name
                ))
            }),
            Expr::Value(v) => Ok(v.clone()),
            Expr::Arithmetic { op, left, right } => {
                let l = left.get_value(tuple)?;
                let r = right.get_value(tuple)?;
                match op {
                    ArithmeticOp::Add => l.add(&r),
                    ArithmeticOp::Sub => l.subtract(&r),
                    ArithmeticOp::Mul => l.multiply(&r),
                    ArithmeticOp::Div => l.divide(&r),
                }
            }
            Expr::Negative(child) => child.get_value(tuple)?.negate(),
            Expr::Aggregate { .. } => Err(RelError::Internal(format!(
                "aggregate {self} evaluated outside an aggregation"
            ))),
            Expr::Comparison { op, left, right } => {
                let l = left.get_value(tuple)?;
                let r = right.get_value(tuple)?;
                compare_values(*op, &l, &r).map(Value::Bool)
            }
            Expr::Conjunction(children) => {
                for child in children {
                    if child.get_value(tuple)?.as_bool() != Some(true) {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
        }
    }
}

/// Applies a comparison operator. Any null operand compares false.
///
/// # Errors
///
/// Returns `TypeMismatch` when the operands have different types.
pub fn compare_values(op: CompOp, left: &Value, right: &Value) -> Result<bool> {
    if left.is_null() || right.is_null() {
        return Ok(false);
    }
    match left.compare(right) {
        Some(ordering) => Ok(op.matches(ordering)),
        None => Err(RelError::TypeMismatch {
            expected: left.data_type().map_or("NULL", |t| t.name()).to_string(),
            actual: right.data_type().map_or("NULL", |t| t.name()).to_string(),
        }),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Field(field) => write!(f, "{}.{}", field.table, field.field.name),
            Expr::Value(v) => write!(f, "{v}"),
            Expr::Arithmetic { op, left, right } => write!(f, "({left}{}{right})", op.as_str()),
            Expr::Negative(child) => write!(f, "-{child}"),
            Expr::Aggregate { function, child } => write!(f, "{}({child})", function.name()),
            Expr::Comparison { op, left, right } => write!(f, "{left}{}{right}", op.as_str()),
            Expr::Conjunction(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
        }
    }
}
