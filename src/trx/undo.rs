//! Transaction that can revert its own changes.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::storage::{Record, Rid, Table};

use super::{check_same_rid, Trx};

#[derive(Debug)]
enum UndoEntry {
    Inserted { table: Arc<Table>, rid: Rid },
    Deleted { table: Arc<Table>, before: Record },
    Updated { table: Arc<Table>, before: Record },
}

/// Applies changes directly and keeps their before-images until commit.
///
/// Rollback replays the before-images newest first. There is no isolation
/// from other transactions.
#[derive(Debug)]
pub struct UndoTrx {
    id: u64,
    undo_log: Vec<UndoEntry>,
}

impl UndoTrx {
    /// Creates a new undo-logging transaction.
    #[must_use]
    pub fn new(id: u64) -> Self {
        UndoTrx {
            id,
            undo_log: Vec::new(),
        }
    }

    /// Number of changes that rollback would revert.
    #[must_use]
    pub fn pending_changes(&self) -> usize {
        self.undo_log.len()
    }
}

impl Trx for UndoTrx {
    fn id(&self) -> u64 {
        self.id
    }

    fn insert_record(&mut self, table: &Arc<Table>, record: &mut Record) -> Result<()> {
        table.insert_record(record)?;
        self.undo_log.push(UndoEntry::Inserted {
            table: Arc::clone(table),
            rid: record.rid(),
        });
        Ok(())
    }

    fn delete_record(&mut self, table: &Arc<Table>, record: &Record) -> Result<()> {
        let before = table.delete_record(record.rid())?;
        self.undo_log.push(UndoEntry::Deleted {
            table: Arc::clone(table),
            before,
        });
        Ok(())
    }

    fn update_record(&mut self, table: &Arc<Table>, old: &Record, new: &Record) -> Result<()> {
        check_same_rid(old, new)?;
        let before = table.get_record(old.rid())?;
        table.update_record_in_place(new)?;
        self.undo_log.push(UndoEntry::Updated {
            table: Arc::clone(table),
            before,
        });
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        debug!(trx = self.id, changes = self.undo_log.len(), "commit");
        self.undo_log.clear();
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        debug!(trx = self.id, changes = self.undo_log.len(), "rollback");
        while let Some(entry) = self.undo_log.pop() {
            let result = match &entry {
                UndoEntry::Inserted { table, rid } => table.delete_record(*rid).map(|_| ()),
                UndoEntry::Deleted { table, before } => table.restore_record(before),
                UndoEntry::Updated { table, before } => table.update_record_in_place(before),
            };
            if let Err(e) = result {
                warn!(trx = self.id, error = %e, "failed to revert change");
                return Err(e);
            }
        }
        Ok(())
    }
}
