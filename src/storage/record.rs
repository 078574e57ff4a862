//! Record identifiers and fixed-layout record buffers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::FieldMeta;
use crate::error::{RelError, Result};
use crate::types::Value;

/// Address of a record: page number plus slot inside the page.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Rid {
    pub page_num: u32,
    pub slot_num: u32,
}

impl Rid {
    /// Creates a new record id.
    #[must_use]
    pub const fn new(page_num: u32, slot_num: u32) -> Self {
        Rid { page_num, slot_num }
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.page_num, self.slot_num)
    }
}

/// One stored row: a byte buffer laid out by the table's [`FieldMeta`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    rid: Rid,
    data: Vec<u8>,
}

impl Record {
    /// Creates a record over an owned buffer.
    #[must_use]
    pub fn new(rid: Rid, data: Vec<u8>) -> Self {
        Record { rid, data }
    }

    /// Returns the record id.
    #[must_use]
    pub fn rid(&self) -> Rid {
        self.rid
    }

    /// Sets the record id.
    pub fn set_rid(&mut self, rid: Rid) {
        self.rid = rid;
    }

    /// Returns the raw record bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the record width in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the record holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn field_range(&self, field: &FieldMeta) -> Result<std::ops::Range<usize>> {
        let range = field.range();
        if range.end > self.data.len() {
            return Err(RelError::InvalidArgument(format!(
                "field '{}' [{}..{}) is outside a record of {} bytes",
                field.name,
                range.start,
                range.end,
                self.data.len()
            )));
        }
        Ok(range)
    }

    /// Returns the bytes of one field.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the field lies outside the record.
    pub fn field_bytes(&self, field: &FieldMeta) -> Result<&[u8]> {
        let range = self.field_range(field)?;
        Ok(&self.data[range])
    }

    /// Overwrites one field: the whole field range is zero-filled, then the
    /// first `min(field.len, bytes.len())` bytes of `bytes` are copied in.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the field lies outside the record.
    pub fn write_field(&mut self, field: &FieldMeta, bytes: &[u8]) -> Result<()> {
        let range = self.field_range(field)?;
        let copy_len = field.len.min(bytes.len());
        let target = &mut self.data[range];
        target.fill(0);
        target[..copy_len].copy_from_slice(&bytes[..copy_len]);
        Ok(())
    }

    /// Decodes one field into a [`Value`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the field lies outside the record.
    pub fn value(&self, field: &FieldMeta) -> Result<Value> {
        Value::from_bytes(field.data_type, self.field_bytes(field)?)
    }
}
