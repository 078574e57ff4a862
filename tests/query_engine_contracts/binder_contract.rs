//! Contract tests for the Binder module.
//!
//! These tests verify the name-resolution contracts:
//! - Relations resolve against the database, columns against the relations
//! - Unqualified names need exactly one candidate table
//! - Aggregations and GROUP BY stay consistent

use std::collections::HashMap;

use ruql::binder::{BindError, Expr, FilterObj, FilterStmt, SelectStmt, Stmt};
use ruql::parser::ast::{CompOp, ConditionOperand, ConditionSqlNode, ParsedSqlNode, RelAttrSqlNode};
use ruql::parser::parse_sql;
use ruql::storage::Db;
use ruql::types::{DataType, Value};
use ruql::{RelError, ResultCode};

use super::create_db;

fn bind_select(db: &Db, sql: &str) -> ruql::Result<SelectStmt> {
    match parse_sql(sql)? {
        ParsedSqlNode::Select(select) => SelectStmt::create(db, select),
        other => panic!("not a select: {other:?}"),
    }
}

fn condition(left: ConditionOperand, comp: CompOp, right: ConditionOperand) -> ConditionSqlNode {
    ConditionSqlNode { left, comp, right }
}

#[test]
fn test_relations_resolve_in_from_order() {
    // Contract: tables = FROM relations in order, then joined relations
    let db = create_db();
    let stmt = bind_select(&db, "select * from u join t on u.id = t.id").unwrap();

    let names: Vec<_> = stmt.tables().iter().map(|t| t.name().to_string()).collect();
    assert_eq!(names, ["u", "t"]);
    assert_eq!(stmt.from_tables().len(), 1);
    assert_eq!(stmt.joins().len(), 1);
    assert_eq!(
        stmt.column_names(),
        ["u.id", "u.w", "t.id", "t.v", "t.name"]
    );
}

#[test]
fn test_unknown_relation_fails() {
    // Contract: an unknown relation is SchemaTableNotExist
    let db = create_db();
    let err = bind_select(&db, "select * from missing").unwrap_err();
    assert_eq!(err.code(), ResultCode::SchemaTableNotExist);
}

#[test]
fn test_single_table_star_is_unqualified() {
    let db = create_db();
    let stmt = bind_select(&db, "select * from t").unwrap();
    assert_eq!(stmt.column_names(), ["id", "v", "name"]);
    assert!(stmt
        .query_expressions()
        .iter()
        .all(|e| matches!(e, Expr::Field(f) if f.table_name() == "t")));
}

#[test]
fn test_unqualified_column_with_two_tables_is_ambiguous() {
    // Contract: an unqualified column is ambiguous with more than one table
    let db = create_db();
    let err = bind_select(&db, "select id from t, u").unwrap_err();
    assert!(matches!(err, RelError::Bind(BindError::AmbiguousColumn(ref c)) if c == "id"));
}

#[test]
fn test_unresolved_column_names_table() {
    let db = create_db();
    let err = bind_select(&db, "select nope from t").unwrap_err();
    assert!(matches!(
        err,
        RelError::Bind(BindError::UnresolvedColumn { ref table, ref field })
            if table == "t" && field == "nope"
    ));
}

#[test]
fn test_group_by_requires_grouped_columns() {
    // Contract: with aggregation, every non-aggregate projection must
    // appear in GROUP BY
    let db = create_db();
    let err = bind_select(&db, "select v, count(*) from t").unwrap_err();
    assert!(matches!(
        err,
        RelError::Bind(BindError::NonAggregatedNotInGroupBy(ref e)) if e == "v"
    ));

    let stmt = bind_select(&db, "select id, sum(v) from t group by id").unwrap();
    assert!(stmt.is_aggregation());
    assert_eq!(stmt.group_by().len(), 1);
}

#[test]
fn test_group_by_check_needs_top_level_aggregation() {
    // Contract: only top-level aggregation projections trigger the check
    let db = create_db();
    let stmt = bind_select(&db, "select id, v from t group by id").unwrap();
    assert_eq!(stmt.column_names(), ["id", "v"]);
    assert_eq!(stmt.group_by().len(), 1);

    let stmt = bind_select(&db, "select id, count(*) + 1 from t").unwrap();
    assert_eq!(stmt.column_names(), ["id", "count(*)+1"]);
    assert!(stmt.group_by().is_empty());
}

#[test]
fn test_count_star_binds_constant_child() {
    let db = create_db();
    let stmt = bind_select(&db, "select count(*) from t").unwrap();
    assert_eq!(stmt.column_names(), ["count(*)"]);
    match &stmt.query_expressions()[0] {
        Expr::Aggregate { child, .. } => {
            assert!(matches!(child.as_ref(), Expr::Value(Value::Int32(1))));
        }
        other => panic!("expected aggregate, got {other}"),
    }
}

#[test]
fn test_invalid_aggregations() {
    let db = create_db();
    for sql in [
        "select sum(*) from t",
        "select count(sum(v)) from t",
        "select avg(name) from t",
        "select median(v) from t",
    ] {
        let err = bind_select(&db, sql).unwrap_err();
        assert!(
            matches!(err, RelError::Bind(BindError::InvalidAggregation(_))),
            "{sql}: {err}"
        );
    }
}

#[test]
fn test_filter_unknown_qualifier_fails() {
    // Contract: a filter naming a table outside the statement fails with
    // SchemaTableNotExist
    let db = create_db();
    let conditions = [condition(
        ConditionOperand::Attr(RelAttrSqlNode::qualified("ghost", "id")),
        CompOp::Eq,
        ConditionOperand::Value(Value::Int32(1)),
    )];
    let err = FilterStmt::create(&db, None, &HashMap::new(), &conditions).unwrap_err();
    assert_eq!(err.code(), ResultCode::SchemaTableNotExist);
}

#[test]
fn test_filter_unqualified_without_default_table() {
    let db = create_db();
    let conditions = [condition(
        ConditionOperand::Attr(RelAttrSqlNode::new("id")),
        CompOp::Eq,
        ConditionOperand::Value(Value::Int32(1)),
    )];
    let err = FilterStmt::create(&db, None, &HashMap::new(), &conditions).unwrap_err();
    assert!(matches!(err, RelError::Bind(BindError::AmbiguousColumn(_))));
}

#[test]
fn test_filter_literal_takes_column_type() {
    // Contract: a literal compared with a column is converted to its type
    let db = create_db();
    let t = db.find_table("t").unwrap();
    let conditions = [condition(
        ConditionOperand::Value(Value::Int32(3)),
        CompOp::Lt,
        ConditionOperand::Attr(RelAttrSqlNode::new("v")),
    )];
    let filter = FilterStmt::create(&db, Some(&t), &HashMap::new(), &conditions).unwrap();
    let unit = &filter.filter_units()[0];
    assert!(matches!(unit.left(), FilterObj::Value(Value::Int32(3))));
    assert!(unit.right().is_attr());
    assert_eq!(unit.comp(), CompOp::Lt);

    let u = db.find_table("u").unwrap();
    let conditions = [condition(
        ConditionOperand::Attr(RelAttrSqlNode::new("w")),
        CompOp::Gt,
        ConditionOperand::Value(Value::Int32(2)),
    )];
    let filter = FilterStmt::create(&db, Some(&u), &HashMap::new(), &conditions).unwrap();
    assert_eq!(
        filter.filter_units()[0].right().value_type(),
        Some(DataType::Float32)
    );
}

#[test]
fn test_where_with_join_needs_qualifiers() {
    let db = create_db();
    let err = bind_select(&db, "select t.v from t join u on t.id = u.id where id = 1").unwrap_err();
    assert!(matches!(err, RelError::Bind(BindError::AmbiguousColumn(_))));

    let stmt = bind_select(&db, "select t.v from t join u on t.id = u.id where t.id = 1").unwrap();
    assert_eq!(stmt.filter().map(|f| f.filter_units().len()), Some(1));
}

#[test]
fn test_update_binding() {
    let db = create_db();
    let stmt = Stmt::create(&db, parse_sql("update t set name = 'x' where id = 2").unwrap()).unwrap();
    let Stmt::Update(update) = stmt else {
        panic!("expected update");
    };
    assert_eq!(update.field().name, "name");
    assert_eq!(update.value(), &Value::Char("x".into()));
    assert!(update.filter().is_some());

    let err = Stmt::create(&db, parse_sql("update t set nope = 1").unwrap()).unwrap_err();
    assert_eq!(err.code(), ResultCode::SchemaFieldMissing);
}
