//! Error types for ruql operations.

use thiserror::Error;

use crate::binder::BindError;

/// Result type alias using [`RelError`].
pub type Result<T> = std::result::Result<T, RelError>;

/// Error types for ruql operations.
#[derive(Debug, Error)]
pub enum RelError {
    /// Malformed or incompatible input (type mismatch on assignment, empty names, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A relation name did not resolve against the catalog.
    #[error("Table does not exist: {0}")]
    SchemaTableNotExist(String),

    /// A table with the same name is already registered.
    #[error("Table already exists: {0}")]
    SchemaTableExist(String),

    /// A field name did not resolve against a table's metadata.
    #[error("Field '{field}' does not exist in table '{table}'")]
    SchemaFieldMissing { table: String, field: String },

    /// Name resolution / semantic validation failure.
    #[error("Bind error: {0}")]
    Bind(BindError),

    /// Operation not defined for a type.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Operands of a value operation carry different type tags.
    #[error("Type error: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// A record id no longer addresses a live record.
    #[error("Record does not exist: {0}")]
    RecordNotExist(String),

    /// Failure reported by the transaction boundary.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Parse error with location information.
    #[error("Parse error at line {line}, column {col}: {message}")]
    ParseError {
        line: usize,
        col: usize,
        message: String,
    },

    /// Division by zero in expression evaluation.
    #[error("Division by zero")]
    DivisionByZero,

    /// Catalog snapshot errors.
    #[error("Catalog error: {0}")]
    CatalogError(String),

    /// Broken internal invariant.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<BindError> for RelError {
    fn from(err: BindError) -> Self {
        RelError::Bind(err)
    }
}

impl RelError {
    /// Returns the result code this error maps onto.
    #[must_use]
    pub fn code(&self) -> ResultCode {
        match self {
            RelError::InvalidArgument(_) => ResultCode::InvalidArgument,
            RelError::SchemaTableNotExist(_) => ResultCode::SchemaTableNotExist,
            RelError::SchemaTableExist(_) => ResultCode::SchemaTableExist,
            RelError::SchemaFieldMissing { .. } => ResultCode::SchemaFieldMissing,
            RelError::Bind(_) | RelError::TypeMismatch { .. } => ResultCode::BindFailed,
            RelError::Unsupported(_) => ResultCode::Unsupported,
            RelError::RecordNotExist(_) => ResultCode::RecordNotExist,
            RelError::Transaction(_) => ResultCode::TransactionFailed,
            RelError::ParseError { .. } => ResultCode::SqlSyntax,
            RelError::DivisionByZero | RelError::CatalogError(_) | RelError::Internal(_) => {
                ResultCode::Internal
            }
        }
    }
}

/// Fixed result-code taxonomy reported to SQL-level callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Success,
    InvalidArgument,
    SchemaTableNotExist,
    SchemaTableExist,
    SchemaFieldMissing,
    BindFailed,
    Unsupported,
    /// End of an operator's output. Never carried by a [`RelError`].
    RecordEof,
    RecordNotExist,
    TransactionFailed,
    SqlSyntax,
    Internal,
}

impl ResultCode {
    /// Returns the canonical name of this code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultCode::Success => "SUCCESS",
            ResultCode::InvalidArgument => "INVALID_ARGUMENT",
            ResultCode::SchemaTableNotExist => "SCHEMA_TABLE_NOT_EXIST",
            ResultCode::SchemaTableExist => "SCHEMA_TABLE_EXIST",
            ResultCode::SchemaFieldMissing => "SCHEMA_FIELD_MISSING",
            ResultCode::BindFailed => "BIND_FAILED",
            ResultCode::Unsupported => "UNSUPPORTED",
            ResultCode::RecordEof => "RECORD_EOF",
            ResultCode::RecordNotExist => "RECORD_NOT_EXIST",
            ResultCode::TransactionFailed => "TRANSACTION_FAILED",
            ResultCode::SqlSyntax => "SQL_SYNTAX",
            ResultCode::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
