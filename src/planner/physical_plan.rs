//! Physical plan generation from bound statements.

use tracing::debug;

use crate::binder::{
    DeleteStmt, Expr, FilterStmt, InsertStmt, SelectStmt, Stmt, UpdateStmt,
};
use crate::error::{RelError, Result};
use crate::executor::{
    AggregateOperator, DeleteOperator, InsertOperator, NestedLoopJoinOperator, PhysicalOperator,
    PredicateOperator, ProjectOperator, TableScanOperator, UpdateOperator,
};

/// Builds operator trees for bound statements.
pub struct PhysicalPlanGenerator;

impl PhysicalPlanGenerator {
    /// Creates the operator tree executing `stmt`.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` for statements executed without operators
    /// (CREATE TABLE).
    pub fn create(stmt: &Stmt) -> Result<Box<dyn PhysicalOperator>> {
        let plan = match stmt {
            Stmt::Select(select) => Self::create_select_plan(select),
            Stmt::Update(update) => Self::create_update_plan(update),
            Stmt::Delete(delete) => Self::create_delete_plan(delete),
            Stmt::Insert(insert) => Self::create_insert_plan(insert),
            Stmt::CreateTable(_) => {
                return Err(RelError::Unsupported(format!(
                    "{} has no physical plan",
                    stmt.kind()
                )))
            }
        };
        debug!(plan = %plan.describe(), "physical plan");
        Ok(plan)
    }

    fn with_filter(
        child: Box<dyn PhysicalOperator>,
        filter: Option<&FilterStmt>,
    ) -> Box<dyn PhysicalOperator> {
        match filter {
            Some(filter) => Box::new(PredicateOperator::new(child, filter.clone())),
            None => child,
        }
    }

    fn create_select_plan(select: &SelectStmt) -> Box<dyn PhysicalOperator> {
        let mut input: Option<Box<dyn PhysicalOperator>> = None;
        for table in select.from_tables() {
            let scan: Box<dyn PhysicalOperator> =
                Box::new(TableScanOperator::new(table.clone()));
            input = Some(match input {
                None => scan,
                Some(left) => Box::new(NestedLoopJoinOperator::new(
                    left,
                    scan,
                    FilterStmt::default(),
                )),
            });
        }

        for join in select.joins() {
            let scan: Box<dyn PhysicalOperator> =
                Box::new(TableScanOperator::new(join.table().clone()));
            input = Some(match input {
                None => Self::with_filter(scan, Some(join.condition())),
                Some(left) => Box::new(NestedLoopJoinOperator::new(
                    left,
                    scan,
                    join.condition().clone(),
                )),
            });
        }

        let mut input = input.map(|child| Self::with_filter(child, select.filter()));

        if select.is_aggregation() {
            let aggregates = collect_aggregates(select.query_expressions());
            let carried = collect_carried(select.query_expressions(), select.group_by());
            if let Some(child) = input.take() {
                input = Some(Box::new(
                    AggregateOperator::new(child, select.group_by().to_vec(), aggregates)
                        .with_carried(carried),
                ));
            }
        }

        Box::new(ProjectOperator::new(
            input,
            select.query_expressions().to_vec(),
        ))
    }

    fn create_update_plan(update: &UpdateStmt) -> Box<dyn PhysicalOperator> {
        let scan = Box::new(TableScanOperator::new(update.table().clone()));
        let child = Self::with_filter(scan, update.filter());
        Box::new(
            UpdateOperator::new(
                update.table().clone(),
                update.field().clone(),
                update.value().clone(),
            )
            .with_child(child),
        )
    }

    fn create_delete_plan(delete: &DeleteStmt) -> Box<dyn PhysicalOperator> {
        let scan = Box::new(TableScanOperator::new(delete.table().clone()));
        let child = Self::with_filter(scan, delete.filter());
        Box::new(DeleteOperator::new(delete.table().clone(), child))
    }

    fn create_insert_plan(insert: &InsertStmt) -> Box<dyn PhysicalOperator> {
        Box::new(InsertOperator::new(
            insert.table().clone(),
            insert.values().to_vec(),
        ))
    }
}

fn collect_aggregates(expressions: &[Expr]) -> Vec<Expr> {
    let mut aggregates = Vec::new();
    for expr in expressions {
        expr.collect_aggregates(&mut aggregates);
    }
    aggregates
}

/// Fields the projection reads outside aggregations that are not group keys.
fn collect_carried(expressions: &[Expr], group_by: &[Expr]) -> Vec<Expr> {
    let mut fields = Vec::new();
    for expr in expressions.iter().filter(|e| !group_by.contains(*e)) {
        expr.collect_fields(&mut fields);
    }
    fields.retain(|f| !group_by.contains(f));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AttrInfo;
    use crate::parser::parse_sql;
    use crate::storage::Db;
    use crate::types::DataType;

    fn plan(sql: &str) -> String {
        let mut db = Db::new("test");
        for name in ["t", "u"] {
            db.create_table(
                name,
                &[
                    AttrInfo::new("id", DataType::Int32, None),
                    AttrInfo::new("v", DataType::Int32, None),
                ],
            )
            .unwrap();
        }
        let stmt = Stmt::create(&db, parse_sql(sql).unwrap()).unwrap();
        PhysicalPlanGenerator::create(&stmt).unwrap().describe()
    }

    #[test]
    fn test_select_plan_shape() {
        let described = plan("select t.v from t join u on t.id = u.id where t.v > 1");
        let names: Vec<_> = described
            .lines()
            .map(|l| l.trim().split('(').next().unwrap_or_default())
            .collect();
        assert_eq!(
            names,
            ["PROJECT", "PREDICATE", "NESTED_LOOP_JOIN", "TABLE_SCAN", "TABLE_SCAN"]
        );
    }

    #[test]
    fn test_aggregate_plan() {
        let described = plan("select id, count(*) from t group by id");
        assert!(described.contains("AGGREGATE(t.id, COUNT(1))"));
    }

    #[test]
    fn test_ungrouped_columns_are_carried() {
        let described = plan("select id, v from t group by id");
        assert!(described.contains("AGGREGATE(t.id, t.v)"), "{described}");

        let described = plan("select id, count(*) + 1 from t");
        assert!(described.contains("AGGREGATE(t.id, COUNT(1))"), "{described}");
    }

    #[test]
    fn test_update_plan() {
        let described = plan("update t set v = 3 where id = 1");
        assert_eq!(described.lines().next(), Some("UPDATE(t.v=3)"));
        assert!(described.contains("PREDICATE(t.id=1)"));
    }

    #[test]
    fn test_create_table_has_no_plan() {
        let db = Db::new("test");
        let stmt = Stmt::create(&db, parse_sql("create table x (a int)").unwrap()).unwrap();
        assert!(matches!(
            PhysicalPlanGenerator::create(&stmt),
            Err(RelError::Unsupported(_))
        ));
    }
}
