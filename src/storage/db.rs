//! A named database: catalog plus the tables it describes.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::{AttrInfo, Catalog};
use crate::error::Result;
use crate::storage::Table;

/// Schema catalog and table handles of one database.
#[derive(Debug)]
pub struct Db {
    name: String,
    catalog: Catalog,
    tables: HashMap<String, Arc<Table>>,
}

impl Db {
    /// Creates an empty database.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Db {
            name: name.to_string(),
            catalog: Catalog::new(),
            tables: HashMap::new(),
        }
    }

    /// Rebuilds a database from a catalog snapshot. Every table starts
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the snapshot cannot be decoded.
    pub fn from_schema_snapshot(name: &str, snapshot: &[u8]) -> Result<Self> {
        let catalog = Catalog::deserialize(snapshot)?;
        let tables = catalog
            .tables()
            .map(|meta| (meta.name.clone(), Arc::new(Table::new(meta.clone()))))
            .collect::<HashMap<_, _>>();
        info!(db = name, tables = tables.len(), "schema restored");
        Ok(Db {
            name: name.to_string(),
            catalog,
            tables,
        })
    }

    /// Serializes the catalog so the schema can be restored later.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if encoding fails.
    pub fn schema_snapshot(&self) -> Result<Vec<u8>> {
        self.catalog.serialize()
    }

    /// Returns the database name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the schema catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Creates a table and its record heap.
    ///
    /// # Errors
    ///
    /// Returns `SchemaTableExist` if the name is taken, or `InvalidArgument`
    /// for an invalid attribute list.
    pub fn create_table(&mut self, name: &str, attrs: &[AttrInfo]) -> Result<Arc<Table>> {
        let meta = self.catalog.create_table(name, attrs).map_err(|e| {
            warn!(db = %self.name, table = name, error = %e, "failed to create table");
            e
        })?;
        let table = Arc::new(Table::new(meta));
        self.tables.insert(name.to_string(), Arc::clone(&table));
        info!(db = %self.name, table = name, "table created");
        Ok(table)
    }

    /// Resolves a table by name.
    #[must_use]
    pub fn find_table(&self, name: &str) -> Option<Arc<Table>> {
        self.tables.get(name).cloned()
    }

    /// Returns all table names, sorted.
    #[must_use]
    pub fn table_names(&self) -> Vec<&str> {
        self.catalog.table_names()
    }
}
