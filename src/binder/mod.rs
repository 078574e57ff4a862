//! Binder module for semantic analysis.
//!
//! The binder performs semantic analysis on the parsed AST, resolving:
//! - Relation names against the database
//! - Column references against the relations of a statement
//! - Aggregation and GROUP BY consistency
//!
//! The output is a bound [`Stmt`] ready for planning.

mod expression;
mod expression_binder;
mod filter_stmt;
mod join_stmt;
mod select_stmt;
mod semantic;
mod update_stmt;

pub use expression::{compare_values, AggregateFunction, Expr, FieldExpr};
pub use expression_binder::{BinderContext, ExpressionBinder};
pub use filter_stmt::{FilterObj, FilterStmt, FilterUnit};
pub use join_stmt::JoinStmt;
pub use select_stmt::SelectStmt;
pub use semantic::{BindError, CreateTableStmt, DeleteStmt, InsertStmt, Stmt};
pub use update_stmt::UpdateStmt;
