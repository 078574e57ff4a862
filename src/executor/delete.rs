//! Delete operator.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{RelError, Result};
use crate::executor::{PhysicalOperator, Tuple};
use crate::storage::{Record, Table};
use crate::trx::Trx;

/// Deletes every record its child produces.
///
/// Like the update operator, the child is drained and closed before the
/// first deletion, and the first transaction failure ends the operation.
pub struct DeleteOperator {
    table: Arc<Table>,
    child: Box<dyn PhysicalOperator>,
    deleted: u64,
}

impl DeleteOperator {
    #[must_use]
    pub fn new(table: Arc<Table>, child: Box<dyn PhysicalOperator>) -> Self {
        DeleteOperator {
            table,
            child,
            deleted: 0,
        }
    }

    fn collect_records(&mut self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        while self.child.next()? {
            let record = self
                .child
                .current_tuple()
                .and_then(Tuple::record)
                .ok_or_else(|| {
                    RelError::Internal("delete child produced a tuple without a record".into())
                })?;
            records.push(record.clone());
        }
        Ok(records)
    }
}

impl PhysicalOperator for DeleteOperator {
    fn name(&self) -> &'static str {
        "DELETE"
    }

    fn param(&self) -> String {
        self.table.name().to_string()
    }

    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        vec![self.child.as_ref()]
    }

    fn open(&mut self, trx: &mut dyn Trx) -> Result<()> {
        self.child.open(trx)?;
        let records = match self.collect_records() {
            Ok(records) => records,
            Err(e) => {
                if let Err(close_err) = self.child.close() {
                    warn!(table = self.table.name(), error = %close_err, "failed to close child");
                }
                return Err(e);
            }
        };
        self.child.close()?;

        for record in &records {
            if let Err(e) = trx.delete_record(&self.table, record) {
                warn!(
                    table = self.table.name(),
                    rid = %record.rid(),
                    error = %e,
                    "failed to delete record"
                );
                return Err(e);
            }
            self.deleted += 1;
        }
        debug!(table = self.table.name(), deleted = self.deleted, "delete done");
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        None
    }

    fn affected_rows(&self) -> u64 {
        self.deleted
    }
}
