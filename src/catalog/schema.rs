//! Table and field metadata.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{RelError, Result};
use crate::types::DataType;

/// Default width of a `CHAR` column declared without a length.
pub const DEFAULT_CHAR_LEN: usize = 4;

/// Central registry of all table schemas in the database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Table schemas by name.
    tables: HashMap<String, TableMeta>,
    /// Next table ID for auto-increment.
    #[serde(default)]
    next_table_id: u32,
}

impl Catalog {
    /// Creates a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Catalog {
            tables: HashMap::new(),
            next_table_id: 0,
        }
    }

    /// Builds and registers the metadata of a new table.
    ///
    /// # Errors
    ///
    /// Returns `SchemaTableExist` if the name is taken, or `InvalidArgument`
    /// if the attribute list is invalid.
    pub fn create_table(&mut self, name: &str, attrs: &[AttrInfo]) -> Result<TableMeta> {
        if self.tables.contains_key(name) {
            return Err(RelError::SchemaTableExist(name.to_string()));
        }
        let meta = TableMeta::new(self.next_table_id, name, attrs)?;
        self.next_table_id += 1;
        self.tables.insert(name.to_string(), meta.clone());
        Ok(meta)
    }

    /// Retrieves a table schema by name.
    #[must_use]
    pub fn get_table(&self, name: &str) -> Option<&TableMeta> {
        self.tables.get(name)
    }

    /// Checks if a table exists in the catalog.
    #[must_use]
    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Returns all table names, sorted.
    #[must_use]
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Iterates over all table schemas in no particular order.
    pub fn tables(&self) -> impl Iterator<Item = &TableMeta> {
        self.tables.values()
    }

    /// Serializes the catalog to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| RelError::CatalogError(format!("Failed to serialize catalog: {e}")))
    }

    /// Deserializes a catalog from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| RelError::CatalogError(format!("Failed to deserialize catalog: {e}")))
    }
}

/// Attribute declaration used to build a [`TableMeta`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrInfo {
    pub name: String,
    pub data_type: DataType,
    /// Declared width in bytes.
    pub len: usize,
}

impl AttrInfo {
    /// Declares an attribute. Fixed-width types ignore `len` and use their
    /// native width.
    #[must_use]
    pub fn new(name: &str, data_type: DataType, len: Option<usize>) -> Self {
        let len = data_type
            .byte_size()
            .unwrap_or_else(|| len.unwrap_or(DEFAULT_CHAR_LEN));
        AttrInfo {
            name: name.to_string(),
            data_type,
            len,
        }
    }
}

/// Location and type of one field inside a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    pub data_type: DataType,
    /// Byte offset inside the record.
    pub offset: usize,
    /// Byte length inside the record.
    pub len: usize,
}

impl FieldMeta {
    /// Byte range this field occupies in a record.
    #[must_use]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Schema definition for a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    /// Internal table ID.
    pub table_id: u32,
    /// Table name.
    pub name: String,
    /// Fields in declaration order, with contiguous offsets.
    pub fields: Vec<FieldMeta>,
    /// Total record width in bytes.
    pub record_size: usize,
}

impl TableMeta {
    /// Lays out a table's fields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty name, no attributes, duplicate
    /// attribute names or a zero-width attribute.
    pub fn new(table_id: u32, name: &str, attrs: &[AttrInfo]) -> Result<Self> {
        if name.is_empty() {
            return Err(RelError::InvalidArgument("table name cannot be empty".into()));
        }
        if attrs.is_empty() {
            return Err(RelError::InvalidArgument(format!(
                "table '{name}' must have at least one field"
            )));
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(attrs.len());
        let mut offset = 0;
        for attr in attrs {
            if attr.name.is_empty() || !seen.insert(attr.name.as_str()) {
                return Err(RelError::InvalidArgument(format!(
                    "invalid or duplicate field name '{}'",
                    attr.name
                )));
            }
            if attr.len == 0 {
                return Err(RelError::InvalidArgument(format!(
                    "field '{}' has zero length",
                    attr.name
                )));
            }
            fields.push(FieldMeta {
                name: attr.name.clone(),
                data_type: attr.data_type,
                offset,
                len: attr.len,
            });
            offset += attr.len;
        }

        Ok(TableMeta {
            table_id,
            name: name.to_string(),
            fields,
            record_size: offset,
        })
    }

    /// Finds a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Finds the field that starts at `offset`.
    #[must_use]
    pub fn field_by_offset(&self, offset: usize) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.offset == offset)
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }
}
