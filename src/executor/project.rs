//! Projection operator.

use crate::binder::Expr;
use crate::error::{RelError, Result};
use crate::executor::{PhysicalOperator, Tuple, ValueListTuple};
use crate::trx::Trx;

/// Evaluates the query expressions over every child tuple.
///
/// Without a child, the expressions are evaluated once over an empty tuple
/// (`SELECT 1 + 2`).
pub struct ProjectOperator {
    child: Option<Box<dyn PhysicalOperator>>,
    expressions: Vec<Expr>,
    emitted: bool,
    current: Option<ValueListTuple>,
}

impl ProjectOperator {
    /// Creates a new projection operator.
    #[must_use]
    pub fn new(child: Option<Box<dyn PhysicalOperator>>, expressions: Vec<Expr>) -> Self {
        ProjectOperator {
            child,
            expressions,
            emitted: false,
            current: None,
        }
    }
}

fn evaluate(expressions: &[Expr], tuple: &dyn Tuple) -> Result<ValueListTuple> {
    expressions
        .iter()
        .map(|expr| expr.get_value(tuple))
        .collect::<Result<Vec<_>>>()
        .map(ValueListTuple::new)
}

impl PhysicalOperator for ProjectOperator {
    fn name(&self) -> &'static str {
        "PROJECT"
    }

    fn param(&self) -> String {
        self.expressions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        self.child.as_deref().into_iter().collect()
    }

    fn open(&mut self, trx: &mut dyn Trx) -> Result<()> {
        self.emitted = false;
        self.current = None;
        match self.child.as_mut() {
            Some(child) => child.open(trx),
            None => Ok(()),
        }
    }

    fn next(&mut self) -> Result<bool> {
        let Some(child) = self.child.as_mut() else {
            if self.emitted {
                self.current = None;
                return Ok(false);
            }
            self.emitted = true;
            self.current = Some(evaluate(&self.expressions, &ValueListTuple::default())?);
            return Ok(true);
        };

        if !child.next()? {
            self.current = None;
            return Ok(false);
        }
        let tuple = child
            .current_tuple()
            .ok_or_else(|| RelError::Internal("child advanced without a tuple".into()))?;
        let values = evaluate(&self.expressions, tuple)?;
        self.current = Some(values);
        Ok(true)
    }

    fn close(&mut self) -> Result<()> {
        self.current = None;
        match self.child.as_mut() {
            Some(child) => child.close(),
            None => Ok(()),
        }
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.current.as_ref().map(|t| t as &dyn Tuple)
    }
}
