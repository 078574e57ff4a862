//! Transaction without concurrency control.

use std::sync::Arc;

use tracing::trace;

use crate::error::Result;
use crate::storage::{Record, Table};

use super::{check_same_rid, Trx};

/// Applies every change straight to the table. Rollback does nothing.
#[derive(Debug)]
pub struct VacuousTrx {
    id: u64,
}

impl VacuousTrx {
    /// Creates a new vacuous transaction.
    #[must_use]
    pub fn new(id: u64) -> Self {
        VacuousTrx { id }
    }
}

impl Trx for VacuousTrx {
    fn id(&self) -> u64 {
        self.id
    }

    fn insert_record(&mut self, table: &Arc<Table>, record: &mut Record) -> Result<()> {
        table.insert_record(record)
    }

    fn delete_record(&mut self, table: &Arc<Table>, record: &Record) -> Result<()> {
        table.delete_record(record.rid()).map(|_| ())
    }

    fn update_record(&mut self, table: &Arc<Table>, old: &Record, new: &Record) -> Result<()> {
        check_same_rid(old, new)?;
        table.update_record_in_place(new)
    }

    fn commit(&mut self) -> Result<()> {
        trace!(trx = self.id, "commit");
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        trace!(trx = self.id, "rollback is a no-op for vacuous transactions");
        Ok(())
    }
}
