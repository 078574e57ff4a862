//! Insert operator.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::executor::{PhysicalOperator, Tuple};
use crate::storage::Table;
use crate::trx::Trx;
use crate::types::Value;

/// Inserts one row of values, already converted to the field types.
pub struct InsertOperator {
    table: Arc<Table>,
    values: Vec<Value>,
    inserted: u64,
}

impl InsertOperator {
    #[must_use]
    pub fn new(table: Arc<Table>, values: Vec<Value>) -> Self {
        InsertOperator {
            table,
            values,
            inserted: 0,
        }
    }
}

impl PhysicalOperator for InsertOperator {
    fn name(&self) -> &'static str {
        "INSERT"
    }

    fn param(&self) -> String {
        self.table.name().to_string()
    }

    fn open(&mut self, trx: &mut dyn Trx) -> Result<()> {
        let mut record = self.table.make_record(&self.values)?;
        trx.insert_record(&self.table, &mut record)?;
        self.inserted = 1;
        debug!(table = self.table.name(), rid = %record.rid(), "inserted record");
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
        self.inserted
    }
}
