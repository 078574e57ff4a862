//! Table scan operator.

use std::sync::Arc;

use crate::error::{RelError, Result};
use crate::executor::{PhysicalOperator, RowTuple, Tuple};
use crate::storage::{Rid, Table};
use crate::trx::Trx;

/// Scan operator for full table scans.
///
/// The set of rids is fixed at `open`; records removed afterwards are
/// skipped.
pub struct TableScanOperator {
    table: Arc<Table>,
    rids: Vec<Rid>,
    cursor: usize,
    current: Option<RowTuple>,
}

impl TableScanOperator {
    /// Creates a new scan operator for the given table.
    #[must_use]
    pub fn new(table: Arc<Table>) -> Self {
        TableScanOperator {
            table,
            rids: Vec::new(),
            cursor: 0,
            current: None,
        }
    }
}

impl PhysicalOperator for TableScanOperator {
    fn name(&self) -> &'static str {
        "TABLE_SCAN"
    }

    fn param(&self) -> String {
        self.table.name().to_string()
    }

    fn open(&mut self, _trx: &mut dyn Trx) -> Result<()> {
        self.rids = self.table.scan_rids();
        self.cursor = 0;
        self.current = None;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        while let Some(rid) = self.rids.get(self.cursor).copied() {
            self.cursor += 1;
            match self.table.get_record(rid) {
                Ok(record) => {
                    self.current = Some(RowTuple::new(Arc::clone(&self.table), record));
                    return Ok(true);
                }
                Err(RelError::RecordNotExist(_)) => {}
                Err(e) => return Err(e),
            }
        }
        self.current = None;
        Ok(false)
    }

    fn close(&mut self) -> Result<()> {
        self.rids.clear();
        self.current = None;
        Ok(())
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.current.as_ref().map(|t| t as &dyn Tuple)
    }
}
