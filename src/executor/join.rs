//! Nested loop join.

use crate::binder::FilterStmt;
use crate::error::Result;
use crate::executor::{JoinedTuple, PhysicalOperator, RowTuple, Tuple};
use crate::trx::Trx;

/// Inner join of two children. The right side is read once at `open` and
/// replayed for every left tuple.
pub struct NestedLoopJoinOperator {
    left: Box<dyn PhysicalOperator>,
    right: Box<dyn PhysicalOperator>,
    condition: FilterStmt,
    right_rows: Vec<Vec<RowTuple>>,
    left_rows: Option<Vec<RowTuple>>,
    right_index: usize,
    current: Option<JoinedTuple>,
}

impl NestedLoopJoinOperator {
    /// Creates a join. An empty condition yields the cross product.
    #[must_use]
    pub fn new(
        left: Box<dyn PhysicalOperator>,
        right: Box<dyn PhysicalOperator>,
        condition: FilterStmt,
    ) -> Self {
        NestedLoopJoinOperator {
            left,
            right,
            condition,
            right_rows: Vec::new(),
            left_rows: None,
            right_index: 0,
            current: None,
        }
    }
}

impl PhysicalOperator for NestedLoopJoinOperator {
    fn name(&self) -> &'static str {
        "NESTED_LOOP_JOIN"
    }

    fn param(&self) -> String {
        self.condition.to_string()
    }

    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        vec![self.left.as_ref(), self.right.as_ref()]
    }

    fn open(&mut self, trx: &mut dyn Trx) -> Result<()> {
        self.left.open(trx)?;
        self.right.open(trx)?;
        self.right_rows.clear();
        while self.right.next()? {
            if let Some(tuple) = self.right.current_tuple() {
                let mut rows = Vec::new();
                tuple.append_rows(&mut rows);
                self.right_rows.push(rows);
            }
        }
        self.right.close()?;
        self.left_rows = None;
        self.right_index = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        loop {
            if self.left_rows.is_none() {
                if !self.left.next()? {
                    self.current = None;
                    return Ok(false);
                }
                let mut rows = Vec::new();
                if let Some(tuple) = self.left.current_tuple() {
                    tuple.append_rows(&mut rows);
                }
                self.right_index = 0;
                self.left_rows = Some(rows);
            }
            let Some(left_rows) = &self.left_rows else {
                continue;
            };

            while let Some(right_rows) = self.right_rows.get(self.right_index) {
                self.right_index += 1;
                let mut rows = left_rows.clone();
                rows.extend(right_rows.iter().cloned());
                let joined = JoinedTuple::new(rows);
                if self.condition.evaluate(&joined)? {
                    self.current = Some(joined);
                    return Ok(true);
                }
            }
            self.left_rows = None;
        }
    }

    fn close(&mut self) -> Result<()> {
        self.right_rows.clear();
        self.left_rows = None;
        self.current = None;
        self.left.close()
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.current.as_ref().map(|t| t as &dyn Tuple)
    }
}
