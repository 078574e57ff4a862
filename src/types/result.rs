//! Rows and statement results returned to callers.

use super::Value;

/// One output row, values ordered like [`QueryResult::columns`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Creates a row from its values.
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Row { values }
    }

    /// Gets a value by column position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns the number of columns in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the values of the row.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Result of statement execution.
#[derive(Debug, Default)]
pub struct QueryResult {
    /// Ordered list of column names.
    pub columns: Vec<String>,
    /// Result rows.
    pub rows: Vec<Row>,
    /// Rows inserted, updated or deleted by a mutating statement.
    pub affected_rows: u64,
}

impl QueryResult {
    /// Creates a new empty result with the given column names.
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        QueryResult {
            columns,
            rows: Vec::new(),
            affected_rows: 0,
        }
    }

    /// Creates an empty result (for DDL statements).
    #[must_use]
    pub fn empty() -> Self {
        QueryResult::default()
    }

    /// Creates a result for a mutating statement.
    #[must_use]
    pub fn affected(affected_rows: u64) -> Self {
        QueryResult {
            affected_rows,
            ..QueryResult::default()
        }
    }

    /// Appends a row to the result.
    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Returns the number of rows in the result.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the result holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Gets a row by index.
    #[must_use]
    pub fn get_row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }
}
