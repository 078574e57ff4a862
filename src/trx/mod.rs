//! Transaction boundary.
//!
//! Every record mutation issued by an operator goes through a [`Trx`]. What a
//! transaction guarantees (visibility, rollback) depends on the
//! implementation; callers treat every call as fallible and never retry.

mod undo;
mod vacuous;

use std::str::FromStr;
use std::sync::Arc;

use crate::error::{RelError, Result};
use crate::storage::{Record, Table};

pub use undo::UndoTrx;
pub use vacuous::VacuousTrx;

/// Record-level mutation protocol.
pub trait Trx {
    /// Returns the transaction id.
    fn id(&self) -> u64;

    /// Inserts `record`; its rid is assigned by the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table rejects the record.
    fn insert_record(&mut self, table: &Arc<Table>, record: &mut Record) -> Result<()>;

    /// Deletes `record` by its rid.
    ///
    /// # Errors
    ///
    /// Returns an error if the record no longer exists.
    fn delete_record(&mut self, table: &Arc<Table>, record: &Record) -> Result<()>;

    /// Replaces `old` with `new`; both address the same rid.
    ///
    /// # Errors
    ///
    /// Returns an error if the record no longer exists or the rids differ.
    fn update_record(&mut self, table: &Arc<Table>, old: &Record, new: &Record) -> Result<()>;

    /// Makes all changes final.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot commit.
    fn commit(&mut self) -> Result<()>;

    /// Reverts whatever the implementation is able to revert.
    ///
    /// # Errors
    ///
    /// Returns an error if reverting a change fails.
    fn rollback(&mut self) -> Result<()>;
}

/// Transaction implementations selectable by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrxKind {
    /// No concurrency control and no rollback.
    #[default]
    Vacuous,
    /// Keeps before-images and reverts them on rollback.
    Undo,
}

impl TrxKind {
    /// Starts a transaction of this kind.
    #[must_use]
    pub fn create_trx(self, id: u64) -> Box<dyn Trx> {
        match self {
            TrxKind::Vacuous => Box::new(VacuousTrx::new(id)),
            TrxKind::Undo => Box::new(UndoTrx::new(id)),
        }
    }

    /// Returns the configuration name of this kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TrxKind::Vacuous => "vacuous",
            TrxKind::Undo => "undo",
        }
    }
}

impl FromStr for TrxKind {
    type Err = RelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "vacuous" => Ok(TrxKind::Vacuous),
            "undo" => Ok(TrxKind::Undo),
            other => Err(RelError::InvalidArgument(format!(
                "unknown transaction kind '{other}'"
            ))),
        }
    }
}

pub(crate) fn check_same_rid(old: &Record, new: &Record) -> Result<()> {
    if old.rid() != new.rid() {
        return Err(RelError::InvalidArgument(format!(
            "update changes rid {} to {}",
            old.rid(),
            new.rid()
        )));
    }
    Ok(())
}
