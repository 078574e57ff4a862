//! Hash aggregation.

use std::collections::HashMap;

use crate::binder::{AggregateFunction, Expr};
use crate::error::{RelError, Result};
use crate::executor::{ExpressionTuple, PhysicalOperator, Tuple};
use crate::trx::Trx;
use crate::types::Value;

/// Running state of one aggregate.
#[derive(Debug, Clone)]
enum AggregateState {
    Count(i64),
    Sum(Option<Value>),
    Avg { sum: f64, count: u64 },
    Min(Option<Value>),
    Max(Option<Value>),
}

impl AggregateState {
    fn new(function: AggregateFunction) -> Self {
        match function {
            AggregateFunction::Count => AggregateState::Count(0),
            AggregateFunction::Sum => AggregateState::Sum(None),
            AggregateFunction::Avg => AggregateState::Avg { sum: 0.0, count: 0 },
            AggregateFunction::Min => AggregateState::Min(None),
            AggregateFunction::Max => AggregateState::Max(None),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn update(&mut self, value: Value) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        match self {
            AggregateState::Count(n) => *n += 1,
            AggregateState::Sum(acc) => {
                *acc = Some(match acc.take() {
                    Some(sum) => sum.add(&value)?,
                    None => value,
                });
            }
            AggregateState::Avg { sum, count } => {
                *sum += match value {
                    Value::Int32(v) => f64::from(v),
                    Value::Int64(v) => v as f64,
                    Value::Float32(v) => f64::from(v),
                    other => {
                        return Err(RelError::Unsupported(format!("AVG over {other}")));
                    }
                };
                *count += 1;
            }
            AggregateState::Min(acc) => {
                if acc
                    .as_ref()
                    .map_or(true, |m| value.compare(m) == Some(std::cmp::Ordering::Less))
                {
                    *acc = Some(value);
                }
            }
            AggregateState::Max(acc) => {
                if acc
                    .as_ref()
                    .map_or(true, |m| value.compare(m) == Some(std::cmp::Ordering::Greater))
                {
                    *acc = Some(value);
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn finish(self) -> Result<Value> {
        Ok(match self {
            AggregateState::Count(n) => Value::Int32(i32::try_from(n).map_err(|_| {
                RelError::Internal(format!("COUNT of {n} rows overflows INT"))
            })?),
            AggregateState::Avg { count: 0, .. } => Value::Null,
            AggregateState::Avg { sum, count } => Value::Float32((sum / count as f64) as f32),
            AggregateState::Sum(acc) | AggregateState::Min(acc) | AggregateState::Max(acc) => {
                acc.unwrap_or(Value::Null)
            }
        })
    }
}

/// Groups child tuples by the group-by expressions and computes every
/// aggregate per group.
///
/// Groups are emitted in order of first appearance. Without group-by
/// expressions exactly one row is produced, even for empty input.
/// Carried expressions take their value from the first row of each group,
/// or NULL when there is none.
pub struct AggregateOperator {
    child: Box<dyn PhysicalOperator>,
    group_by: Vec<Expr>,
    carried: Vec<Expr>,
    aggregates: Vec<Expr>,
    results: Vec<ExpressionTuple>,
    cursor: usize,
}

impl AggregateOperator {
    /// Creates an aggregation. `aggregates` must only hold
    /// [`Expr::Aggregate`] nodes.
    #[must_use]
    pub fn new(child: Box<dyn PhysicalOperator>, group_by: Vec<Expr>, aggregates: Vec<Expr>) -> Self {
        AggregateOperator {
            child,
            group_by,
            carried: Vec::new(),
            aggregates,
            results: Vec::new(),
            cursor: 0,
        }
    }

    /// Adds plain expressions read from each group's first row.
    #[must_use]
    pub fn with_carried(mut self, carried: Vec<Expr>) -> Self {
        self.carried = carried;
        self
    }

    fn output_exprs(&self) -> Vec<Expr> {
        self.group_by
            .iter()
            .chain(&self.carried)
            .chain(&self.aggregates)
            .cloned()
            .collect()
    }

    fn initial_states(&self) -> Result<Vec<AggregateState>> {
        self.aggregates
            .iter()
            .map(|expr| match expr {
                Expr::Aggregate { function, .. } => Ok(AggregateState::new(*function)),
                other => Err(RelError::Internal(format!("{other} is not an aggregate"))),
            })
            .collect()
    }

    fn accumulate(
        aggregates: &[Expr],
        states: &mut [AggregateState],
        tuple: &dyn Tuple,
    ) -> Result<()> {
        for (expr, state) in aggregates.iter().zip(states.iter_mut()) {
            if let Expr::Aggregate { child, .. } = expr {
                state.update(child.get_value(tuple)?)?;
            }
        }
        Ok(())
    }
}

impl PhysicalOperator for AggregateOperator {
    fn name(&self) -> &'static str {
        "AGGREGATE"
    }

    fn param(&self) -> String {
        self.group_by
            .iter()
            .chain(&self.carried)
            .chain(&self.aggregates)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn children(&self) -> Vec<&dyn PhysicalOperator> {
        vec![self.child.as_ref()]
    }

    fn open(&mut self, trx: &mut dyn Trx) -> Result<()> {
        self.child.open(trx)?;

        let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
        // (group key followed by carried values, aggregate states)
        let mut groups: Vec<(Vec<Value>, Vec<AggregateState>)> = Vec::new();
        while self.child.next()? {
            let Some(tuple) = self.child.current_tuple() else {
                continue;
            };
            let key = self
                .group_by
                .iter()
                .map(|expr| expr.get_value(tuple))
                .collect::<Result<Vec<_>>>()?;
            let slot = match index.get(&key) {
                Some(slot) => *slot,
                None => {
                    index.insert(key.clone(), groups.len());
                    let mut values = key;
                    for expr in &self.carried {
                        values.push(expr.get_value(tuple)?);
                    }
                    groups.push((values, self.initial_states()?));
                    groups.len() - 1
                }
            };
            Self::accumulate(&self.aggregates, &mut groups[slot].1, tuple)?;
        }
        self.child.close()?;

        if groups.is_empty() && self.group_by.is_empty() {
            groups.push((vec![Value::Null; self.carried.len()], self.initial_states()?));
        }

        let exprs = self.output_exprs();
        let mut results = Vec::with_capacity(groups.len());
        for (mut values, states) in groups {
            for state in states {
                values.push(state.finish()?);
            }
            results.push(ExpressionTuple::new(exprs.clone(), values));
        }
        self.results = results;
        self.cursor = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        if self.cursor < self.results.len() {
            self.cursor += 1;
            Ok(true)
        } else {
            self.cursor = self.results.len() + 1;
            Ok(false)
        }
    }

    fn close(&mut self) -> Result<()> {
        self.results.clear();
        self.cursor = 0;
        Ok(())
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.results.get(i))
            .map(|t| t as &dyn Tuple)
    }
}
