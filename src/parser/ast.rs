//! Abstract Syntax Tree definitions for SQL statements.
//!
//! Nothing in this tree is resolved against the catalog: relation and column
//! names are raw strings, and aggregate calls are kept as unbound markers.

use std::cmp::Ordering;
use std::fmt;

use crate::types::{DataType, Value};

/// A parsed SQL statement, keyed by statement kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedSqlNode {
    /// CREATE TABLE statement.
    CreateTable(CreateTableSqlNode),
    /// INSERT statement.
    Insert(InsertSqlNode),
    /// SELECT statement.
    Select(SelectSqlNode),
    /// UPDATE statement.
    Update(UpdateSqlNode),
    /// DELETE statement.
    Delete(DeleteSqlNode),
}

/// Column declaration in CREATE TABLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrInfoSqlNode {
    pub name: String,
    pub data_type: DataType,
    /// Declared length, `CHAR(n)` only.
    pub length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableSqlNode {
    pub relation_name: String,
    pub attr_infos: Vec<AttrInfoSqlNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertSqlNode {
    pub relation_name: String,
    pub values: Vec<Value>,
}

/// SELECT statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectSqlNode {
    /// Projection list.
    pub expressions: Vec<Expression>,
    /// Relations in FROM, in order.
    pub relations: Vec<String>,
    /// JOIN clauses, in order.
    pub joins: Vec<JoinSqlNode>,
    /// WHERE conditions, combined with AND.
    pub conditions: Vec<ConditionSqlNode>,
    /// GROUP BY expressions.
    pub group_by: Vec<Expression>,
}

/// `[INNER] JOIN relation [ON cond AND ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSqlNode {
    pub relation: String,
    pub conditions: Vec<ConditionSqlNode>,
}

/// `UPDATE relation SET attribute = value [WHERE ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSqlNode {
    pub relation_name: String,
    pub attribute_name: String,
    pub value: Value,
    pub conditions: Vec<ConditionSqlNode>,
}

/// `DELETE FROM relation [WHERE ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteSqlNode {
    pub relation_name: String,
    pub conditions: Vec<ConditionSqlNode>,
}

/// Possibly qualified column reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelAttrSqlNode {
    pub relation_name: Option<String>,
    pub attribute_name: String,
}

impl RelAttrSqlNode {
    /// Creates an unqualified reference.
    #[must_use]
    pub fn new(attribute_name: &str) -> Self {
        RelAttrSqlNode {
            relation_name: None,
            attribute_name: attribute_name.to_string(),
        }
    }

    /// Creates a `relation.attribute` reference.
    #[must_use]
    pub fn qualified(relation_name: &str, attribute_name: &str) -> Self {
        RelAttrSqlNode {
            relation_name: Some(relation_name.to_string()),
            attribute_name: attribute_name.to_string(),
        }
    }
}

impl fmt::Display for RelAttrSqlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.relation_name {
            Some(rel) => write!(f, "{rel}.{}", self.attribute_name),
            None => f.write_str(&self.attribute_name),
        }
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionOperand {
    Attr(RelAttrSqlNode),
    Value(Value),
}

/// `left comp right`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionSqlNode {
    pub left: ConditionOperand,
    pub comp: CompOp,
    pub right: ConditionOperand,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompOp {
    /// Parses a comparison operator from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "=" => Some(CompOp::Eq),
            "<>" | "!=" => Some(CompOp::Neq),
            "<" => Some(CompOp::Lt),
            "<=" => Some(CompOp::Lte),
            ">" => Some(CompOp::Gt),
            ">=" => Some(CompOp::Gte),
            _ => None,
        }
    }

    /// Returns the string representation of this operator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CompOp::Eq => "=",
            CompOp::Neq => "<>",
            CompOp::Lt => "<",
            CompOp::Lte => "<=",
            CompOp::Gt => ">",
            CompOp::Gte => ">=",
        }
    }

    /// Whether `left.compare(right) == ordering` satisfies this operator.
    #[must_use]
    pub fn matches(&self, ordering: Ordering) -> bool {
        match self {
            CompOp::Eq => ordering == Ordering::Equal,
            CompOp::Neq => ordering != Ordering::Equal,
            CompOp::Lt => ordering == Ordering::Less,
            CompOp::Lte => ordering != Ordering::Greater,
            CompOp::Gt => ordering == Ordering::Greater,
            CompOp::Gte => ordering != Ordering::Less,
        }
    }
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithmeticOp {
    /// Parses an arithmetic operator from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "+" => Some(ArithmeticOp::Add),
            "-" => Some(ArithmeticOp::Sub),
            "*" => Some(ArithmeticOp::Mul),
            "/" => Some(ArithmeticOp::Div),
            _ => None,
        }
    }

    /// Returns the string representation of this operator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
        }
    }
}

/// Unbound expression from the projection or GROUP BY list.
///
/// Equality is syntactic: two trees are equal when they were written the
/// same way, which is what the GROUP BY consistency check relies on.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `*` or `relation.*`.
    Star { relation: Option<String> },
    /// Column reference not yet resolved.
    UnboundField(RelAttrSqlNode),
    /// Literal.
    Value(Value),
    /// Binary arithmetic.
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Unary minus.
    Negative(Box<Expression>),
    /// Function call treated as an aggregation, e.g. `COUNT(*)`.
    UnboundAggregation { name: String, child: Box<Expression> },
}

impl Expression {
    /// Returns true for an unbound aggregation node.
    #[must_use]
    pub fn is_aggregation(&self) -> bool {
        matches!(self, Expression::UnboundAggregation { .. })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Star { relation: Some(rel) } => write!(f, "{rel}.*"),
            Expression::Star { relation: None } => f.write_str("*"),
            Expression::UnboundField(attr) => write!(f, "{attr}"),
            Expression::Value(v) => write!(f, "{v}"),
            Expression::Arithmetic { op, left, right } => {
                write!(f, "{left}{}{right}", op.as_str())
            }
            Expression::Negative(child) => write!(f, "-{child}"),
            Expression::UnboundAggregation { name, child } => write!(f, "{name}({child})"),
        }
    }
}
