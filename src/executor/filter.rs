//! Predicate operator for WHERE clauses.

use crate::binder::FilterStmt;
use crate::error::Result;
use crate::executor::{PhysicalOperator, Tuple};
use crate::trx::Trx;

/// Passes through the child tuples that satisfy a filter.
pub struct PredicateOperator {
    child: Box<dyn PhysicalOperator>,
    filter: FilterStmt,
}

impl PredicateOperator {
    /// Creates a new predicate operator with the given child and filter.
    #[must_use]
    pub fn new(child: Box<dyn PhysicalOperator>, filter: FilterStmt) -> Self {
        PredicateOperator { child, filter }
    }
}

impl PhysicalOperator for PredicateOperator {
    fn name(&self) -> &'static str {
        "PREDICATE"
    }

    fn param(&self) -> String {
        self.filter.to_string()
    }

    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        vec![self.child.as_ref()]
    }

    fn open(&mut self, trx: &mut dyn Trx) -> Result<()> {
        self.child.open(trx)
    }

    fn next(&mut self) -> Result<bool> {
        while self.child.next()? {
            if let Some(tuple) = self.child.current_tuple() {
                if self.filter.evaluate(tuple)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn close(&mut self) -> Result<()> {
        self.child.close()
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.child.current_tuple()
    }
}
