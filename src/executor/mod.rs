//! Executor module for query execution.
//!
//! Operators form a tree and follow a pull protocol: `open` prepares an
//! operator (and performs the work of mutating operators), each `next`
//! advances to the following tuple, `current_tuple` exposes it, and `close`
//! releases resources. End of stream is `Ok(false)` from `next`, never an
//! error.

mod aggregate;
mod delete;
mod filter;
mod insert;
mod join;
mod project;
mod scan;
mod tuple;
mod update;

use crate::error::Result;
use crate::trx::Trx;

pub use aggregate::AggregateOperator;
pub use delete::DeleteOperator;
pub use filter::PredicateOperator;
pub use insert::InsertOperator;
pub use join::NestedLoopJoinOperator;
pub use project::ProjectOperator;
pub use scan::TableScanOperator;
pub use tuple::{ExpressionTuple, JoinedTuple, RowTuple, Tuple, ValueListTuple};
pub use update::UpdateOperator;

/// Lifecycle of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatorState {
    #[default]
    Unopened,
    Opened,
    Exhausted,
    Closed,
}

/// Trait for physical operators in the execution pipeline.
pub trait PhysicalOperator {
    /// Operator name shown by [`PhysicalOperator::describe`].
    fn name(&self) -> &'static str;

    /// Short parameter summary shown next to the name.
    fn param(&self) -> String {
        String::new()
    }

    /// Child operators, in evaluation order.
    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        Vec::new()
    }

    /// Prepares the operator to produce tuples.
    ///
    /// # Errors
    ///
    /// Returns the first error of the operator or its children.
    fn open(&mut self, trx: &mut dyn Trx) -> Result<()>;

    /// Advances to the next tuple. Returns `Ok(false)` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if producing the tuple fails.
    fn next(&mut self) -> Result<bool>;

    /// Releases the operator's resources. Closing twice is harmless.
    ///
    /// # Errors
    ///
    /// Returns an error if a child fails to close.
    fn close(&mut self) -> Result<()>;

    /// The tuple produced by the last successful `next`.
    fn current_tuple(&self) -> Option<&dyn Tuple>;

    /// Records changed by this operator.
    fn affected_rows(&self) -> u64 {
        0
    }

    /// Renders the operator tree, one operator per line, children indented.
    fn describe(&self) -> String {
        let mut out = self.name().to_string();
        let param = self.param();
        if !param.is_empty() {
            out.push('(');
            out.push_str(&param);
            out.push(')');
        }
        for child in self.children() {
            for line in child.describe().lines() {
                out.push_str("\n  ");
                out.push_str(line);
            }
        }
        out
    }
}
