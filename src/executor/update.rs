//! Update operator.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::FieldMeta;
use crate::error::{RelError, Result};
use crate::executor::{OperatorState, PhysicalOperator, Tuple};
use crate::storage::{Record, Table};
use crate::trx::Trx;
use crate::types::Value;

/// Assigns one value to one field of every record its child produces.
///
/// All work happens in `open`, in two phases: the child is drained and
/// closed, buffering a copy of every record, and only then is each buffered
/// record rewritten through the transaction. The first transaction failure
/// is returned unchanged; records after it are not touched and records
/// before it are not reverted here.
///
/// The new field bytes are the value's storage bytes truncated to the field
/// length, with the rest of the field zero-filled.
pub struct UpdateOperator {
    table: Arc<Table>,
    field: FieldMeta,
    value: Value,
    child: Option<Box<dyn PhysicalOperator>>,
    records: Vec<Record>,
    updated: u64,
    state: OperatorState,
}

impl UpdateOperator {
    /// Creates an update of `field` in `table` to `value`.
    #[must_use]
    pub fn new(table: Arc<Table>, field: FieldMeta, value: Value) -> Self {
        UpdateOperator {
            table,
            field,
            value,
            child: None,
            records: Vec::new(),
            updated: 0,
            state: OperatorState::Unopened,
        }
    }

    /// Sets the operator producing the records to update.
    #[must_use]
    pub fn with_child(mut self, child: Box<dyn PhysicalOperator>) -> Self {
        self.child = Some(child);
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> OperatorState {
        self.state
    }

    fn drain_child(child: &mut dyn PhysicalOperator, records: &mut Vec<Record>) -> Result<()> {
        while child.next()? {
            let record = child
                .current_tuple()
                .and_then(Tuple::record)
                .ok_or_else(|| {
                    RelError::Internal("update child produced a tuple without a record".into())
                })?;
            records.push(record.clone());
        }
        Ok(())
    }
}

impl PhysicalOperator for UpdateOperator {
    fn name(&self) -> &'static str {
        "UPDATE"
    }

    fn param(&self) -> String {
        format!("{}.{}={}", self.table.name(), self.field.name, self.value)
    }

    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        self.child.as_deref().into_iter().collect()
    }

    fn open(&mut self, trx: &mut dyn Trx) -> Result<()> {
        self.state = OperatorState::Opened;
        let Some(child) = self.child.as_mut() else {
            return Ok(());
        };

        child.open(trx)?;
        if let Err(e) = Self::drain_child(child.as_mut(), &mut self.records) {
            warn!(table = self.table.name(), error = %e, "failed to read records to update");
            if let Err(close_err) = child.close() {
                warn!(table = self.table.name(), error = %close_err, "failed to close child");
            }
            return Err(e);
        }
        child.close()?;

        if self.value.data_type() != Some(self.field.data_type) {
            warn!(
                table = self.table.name(),
                field = %self.field.name,
                value = %self.value,
                "value type does not match field type"
            );
            return Err(RelError::InvalidArgument(format!(
                "cannot assign {} to {} field '{}'",
                self.value, self.field.data_type, self.field.name
            )));
        }

        let bytes = self.value.to_bytes();
        for record in &self.records {
            let mut new_record = record.clone();
            new_record.write_field(&self.field, &bytes)?;
            if let Err(e) = trx.update_record(&self.table, record, &new_record) {
                warn!(
                    table = self.table.name(),
                    rid = %record.rid(),
                    error = %e,
                    "failed to update record"
                );
                return Err(e);
            }
            self.updated += 1;
        }
        debug!(table = self.table.name(), updated = self.updated, "update done");
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        if self.state == OperatorState::Opened {
            self.state = OperatorState::Exhausted;
        }
        Ok(false)
    }

    fn close(&mut self) -> Result<()> {
        self.records.clear();
        self.state = OperatorState::Closed;
        Ok(())
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        None
    }

    fn affected_rows(&self) -> u64 {
        self.updated
    }
}
