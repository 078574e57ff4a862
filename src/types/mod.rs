//! Core value types and query results.

mod result;
mod value;

pub use result::{QueryResult, Row};
pub use value::{DataType, Value};
