//! Storage module: the record store the execution core runs against.
//!
//! This module provides:
//! - Record addressing and fixed-layout buffers ([`Rid`], [`Record`])
//! - An in-memory record heap per table ([`Table`])
//! - The database object resolving table names ([`Db`])

mod db;
mod record;
mod table;

pub use db::Db;
pub use record::{Record, Rid};
pub use table::{Table, SLOTS_PER_PAGE};
