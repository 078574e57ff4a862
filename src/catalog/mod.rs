//! Catalog for managing table schemas.

mod schema;

pub use schema::{AttrInfo, Catalog, FieldMeta, TableMeta, DEFAULT_CHAR_LEN};
