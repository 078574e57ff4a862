//! Tuples flowing between operators.

use std::sync::Arc;

use crate::binder::{Expr, FieldExpr};
use crate::error::{RelError, Result};
use crate::storage::{Record, Table};
use crate::types::Value;

/// A row as seen by expression evaluation.
pub trait Tuple {
    /// Number of cells.
    fn cell_num(&self) -> usize;

    /// Value of the cell at `index`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if `index` is out of range.
    fn cell_at(&self, index: usize) -> Result<Value>;

    /// Value of a resolved column, or None if this tuple does not carry it.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored bytes cannot be decoded.
    fn find_cell(&self, field: &FieldExpr) -> Result<Option<Value>>;

    /// Precomputed value of a whole expression (group keys, aggregates).
    fn find_expr(&self, _expr: &Expr) -> Option<Value> {
        None
    }

    /// The stored record behind this tuple, if it is a single table row.
    fn record(&self) -> Option<&Record> {
        None
    }

    /// Appends the table rows this tuple is made of.
    fn append_rows(&self, _rows: &mut Vec<RowTuple>) {}
}

fn out_of_range(index: usize, len: usize) -> RelError {
    RelError::Internal(format!("cell {index} out of range for tuple of {len} cells"))
}

/// One record of one table.
#[derive(Debug, Clone)]
pub struct RowTuple {
    table: Arc<Table>,
    record: Record,
}

impl RowTuple {
    #[must_use]
    pub fn new(table: Arc<Table>, record: Record) -> Self {
        RowTuple { table, record }
    }

    #[must_use]
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }
}

impl Tuple for RowTuple {
    fn cell_num(&self) -> usize {
        self.table.meta().fields().len()
    }

    fn cell_at(&self, index: usize) -> Result<Value> {
        let field = self
            .table
            .meta()
            .fields()
            .get(index)
            .ok_or_else(|| out_of_range(index, self.cell_num()))?;
        self.record.value(field)
    }

    fn find_cell(&self, field: &FieldExpr) -> Result<Option<Value>> {
        if field.table_name() != self.table.name() {
            return Ok(None);
        }
        match self.table.meta().field(field.field_name()) {
            Some(meta) => self.record.value(meta).map(Some),
            None => Ok(None),
        }
    }

    fn record(&self) -> Option<&Record> {
        Some(&self.record)
    }

    fn append_rows(&self, rows: &mut Vec<RowTuple>) {
        rows.push(self.clone());
    }
}

/// Concatenation of table rows produced by a join.
#[derive(Debug, Clone, Default)]
pub struct JoinedTuple {
    rows: Vec<RowTuple>,
}

impl JoinedTuple {
    #[must_use]
    pub fn new(rows: Vec<RowTuple>) -> Self {
        JoinedTuple { rows }
    }
}

impl Tuple for JoinedTuple {
    fn cell_num(&self) -> usize {
        self.rows.iter().map(Tuple::cell_num).sum()
    }

    fn cell_at(&self, index: usize) -> Result<Value> {
        let mut offset = index;
        for row in &self.rows {
            if offset < row.cell_num() {
                return row.cell_at(offset);
            }
            offset -= row.cell_num();
        }
        Err(out_of_range(index, self.cell_num()))
    }

    fn find_cell(&self, field: &FieldExpr) -> Result<Option<Value>> {
        for row in &self.rows {
            if let Some(value) = row.find_cell(field)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn append_rows(&self, rows: &mut Vec<RowTuple>) {
        rows.extend(self.rows.iter().cloned());
    }
}

/// Plain list of computed values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueListTuple {
    values: Vec<Value>,
}

impl ValueListTuple {
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        ValueListTuple { values }
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl Tuple for ValueListTuple {
    fn cell_num(&self) -> usize {
        self.values.len()
    }

    fn cell_at(&self, index: usize) -> Result<Value> {
        self.values
            .get(index)
            .cloned()
            .ok_or_else(|| out_of_range(index, self.values.len()))
    }

    fn find_cell(&self, _field: &FieldExpr) -> Result<Option<Value>> {
        Ok(None)
    }
}

/// Values keyed by the expressions that produced them.
#[derive(Debug, Clone)]
pub struct ExpressionTuple {
    exprs: Vec<Expr>,
    values: Vec<Value>,
}

impl ExpressionTuple {
    /// Pairs every expression with its value. Both lists have equal length.
    #[must_use]
    pub fn new(exprs: Vec<Expr>, values: Vec<Value>) -> Self {
        debug_assert_eq!(exprs.len(), values.len());
        ExpressionTuple { exprs, values }
    }
}

impl Tuple for ExpressionTuple {
    fn cell_num(&self) -> usize {
        self.values.len()
    }

    fn cell_at(&self, index: usize) -> Result<Value> {
        self.values
            .get(index)
            .cloned()
            .ok_or_else(|| out_of_range(index, self.values.len()))
    }

    fn find_cell(&self, field: &FieldExpr) -> Result<Option<Value>> {
        Ok(self
            .exprs
            .iter()
            .position(|e| matches!(e, Expr::Field(f) if f == field))
            .and_then(|i| self.values.get(i).cloned()))
    }

    fn find_expr(&self, expr: &Expr) -> Option<Value> {
        self.exprs
            .iter()
            .position(|e| e == expr)
            .and_then(|i| self.values.get(i).cloned())
    }
}
