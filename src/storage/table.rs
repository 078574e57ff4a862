//! In-memory record heap for one table.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::catalog::TableMeta;
use crate::error::{RelError, Result};
use crate::storage::{Record, Rid};
use crate::types::Value;

/// Number of record slots per logical page.
pub const SLOTS_PER_PAGE: u32 = 64;

#[derive(Debug, Default)]
struct Heap {
    records: BTreeMap<Rid, Vec<u8>>,
    next_slot: u64,
}

impl Heap {
    #[allow(clippy::cast_possible_truncation)]
    fn allocate_rid(&mut self) -> Rid {
        let slot = self.next_slot;
        self.next_slot += 1;
        Rid::new(
            (slot / u64::from(SLOTS_PER_PAGE)) as u32,
            (slot % u64::from(SLOTS_PER_PAGE)) as u32,
        )
    }
}

/// A table: its metadata plus a record heap keyed by [`Rid`].
///
/// Record operations take the heap lock for the duration of one call only.
pub struct Table {
    meta: TableMeta,
    heap: RwLock<Heap>,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.meta.name)
            .field("record_count", &self.record_count())
            .finish_non_exhaustive()
    }
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(meta: TableMeta) -> Self {
        Table {
            meta,
            heap: RwLock::new(Heap::default()),
        }
    }

    /// Returns the table metadata.
    #[must_use]
    pub fn meta(&self) -> &TableMeta {
        &self.meta
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Returns the number of live records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.heap.read().records.len()
    }

    /// Encodes one value per field into a fresh record buffer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the value count differs from the field
    /// count or a value's type differs from its field's type.
    pub fn make_record(&self, values: &[Value]) -> Result<Record> {
        let fields = self.meta.fields();
        if fields.len() != values.len() {
            return Err(RelError::InvalidArgument(format!(
                "table '{}' expects {} values, got {}",
                self.meta.name,
                fields.len(),
                values.len()
            )));
        }

        let mut record = Record::new(Rid::default(), vec![0; self.meta.record_size]);
        for (field, value) in fields.iter().zip(values) {
            if value.data_type() != Some(field.data_type) {
                return Err(RelError::InvalidArgument(format!(
                    "value {value} does not match type {} of field '{}'",
                    field.data_type, field.name
                )));
            }
            record.write_field(field, &value.to_bytes())?;
        }
        Ok(record)
    }

    fn check_width(&self, record: &Record) -> Result<()> {
        if record.len() != self.meta.record_size {
            return Err(RelError::InvalidArgument(format!(
                "record of {} bytes does not fit table '{}' ({} bytes)",
                record.len(),
                self.meta.name,
                self.meta.record_size
            )));
        }
        Ok(())
    }

    /// Stores a record under a newly allocated rid, written back into `record`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the record width is wrong.
    pub fn insert_record(&self, record: &mut Record) -> Result<()> {
        self.check_width(record)?;
        let mut heap = self.heap.write();
        let rid = heap.allocate_rid();
        record.set_rid(rid);
        heap.records.insert(rid, record.data().to_vec());
        Ok(())
    }

    /// Stores a record under its own rid, which must be free.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the width is wrong or the rid is taken.
    pub fn restore_record(&self, record: &Record) -> Result<()> {
        self.check_width(record)?;
        let mut heap = self.heap.write();
        if heap.records.contains_key(&record.rid()) {
            return Err(RelError::InvalidArgument(format!(
                "rid {} is already in use",
                record.rid()
            )));
        }
        heap.records.insert(record.rid(), record.data().to_vec());
        Ok(())
    }

    /// Reads a record by rid.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotExist` if no live record has this rid.
    pub fn get_record(&self, rid: Rid) -> Result<Record> {
        self.heap
            .read()
            .records
            .get(&rid)
            .map(|data| Record::new(rid, data.clone()))
            .ok_or_else(|| RelError::RecordNotExist(format!("{}:{rid}", self.meta.name)))
    }

    /// Replaces the bytes of the record at `record.rid()`.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotExist` if the rid is not live, or `InvalidArgument`
    /// if the width is wrong.
    pub fn update_record_in_place(&self, record: &Record) -> Result<()> {
        self.check_width(record)?;
        let mut heap = self.heap.write();
        let slot = heap
            .records
            .get_mut(&record.rid())
            .ok_or_else(|| RelError::RecordNotExist(format!("{}:{}", self.meta.name, record.rid())))?;
        slot.copy_from_slice(record.data());
        Ok(())
    }

    /// Removes the record at `rid`, returning its last contents.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotExist` if the rid is not live.
    pub fn delete_record(&self, rid: Rid) -> Result<Record> {
        self.heap
            .write()
            .records
            .remove(&rid)
            .map(|data| Record::new(rid, data))
            .ok_or_else(|| RelError::RecordNotExist(format!("{}:{rid}", self.meta.name)))
    }

    /// Snapshot of all live rids in ascending order.
    #[must_use]
    pub fn scan_rids(&self) -> Vec<Rid> {
        self.heap.read().records.keys().copied().collect()
    }
}
