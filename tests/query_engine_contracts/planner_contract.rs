//! Contract tests for the Planner module.
//!
//! These tests verify the shape of generated operator trees through their
//! rendered form.

use ruql::binder::Stmt;
use ruql::parser::parse_sql;
use ruql::planner::PhysicalPlanGenerator;
use ruql::ResultCode;

use super::create_db;

fn describe(sql: &str) -> String {
    let db = create_db();
    let stmt = Stmt::create(&db, parse_sql(sql).unwrap()).unwrap();
    PhysicalPlanGenerator::create(&stmt).unwrap().describe()
}

fn operator_names(plan: &str) -> Vec<String> {
    plan.lines()
        .map(|line| {
            let line = line.trim_start();
            line.split('(').next().unwrap_or(line).to_string()
        })
        .collect()
}

#[test]
fn test_projection_over_scan() {
    let plan = describe("select id from t");
    assert_eq!(plan, "PROJECT(t.id)\n  TABLE_SCAN(t)");
}

#[test]
fn test_from_list_is_cross_joined() {
    // Contract: FROM relations are cross joined left to right
    let plan = describe("select t.id, u.id from t, u where t.id = u.id");
    assert_eq!(
        operator_names(&plan),
        ["PROJECT", "PREDICATE", "NESTED_LOOP_JOIN", "TABLE_SCAN", "TABLE_SCAN"]
    );
    assert!(plan.contains("PREDICATE(t.id=u.id)"));
}

#[test]
fn test_join_condition_stays_on_join() {
    let plan = describe("select t.v from t join u on t.id = u.id");
    assert!(plan.contains("NESTED_LOOP_JOIN(t.id=u.id)"), "{plan}");
    assert!(!plan.contains("PREDICATE"));
}

#[test]
fn test_aggregate_below_projection() {
    let plan = describe("select id, max(v) from t group by id");
    assert_eq!(
        operator_names(&plan),
        ["PROJECT", "AGGREGATE", "TABLE_SCAN"]
    );
    assert!(plan.contains("AGGREGATE(t.id, MAX(t.v))"), "{plan}");
}

#[test]
fn test_mutation_plans() {
    assert_eq!(
        operator_names(&describe("update t set v = 1 where id > 2")),
        ["UPDATE", "PREDICATE", "TABLE_SCAN"]
    );
    assert_eq!(
        operator_names(&describe("delete from t")),
        ["DELETE", "TABLE_SCAN"]
    );
    assert_eq!(
        describe("insert into u values (1, 2.5)"),
        "INSERT(u)"
    );
}

#[test]
fn test_select_without_from_has_no_scan() {
    let plan = describe("select 1 + 2");
    assert_eq!(operator_names(&plan), ["PROJECT"]);
}

#[test]
fn test_create_table_is_not_planned() {
    let db = create_db();
    let stmt = Stmt::create(&db, parse_sql("create table w (a int)").unwrap()).unwrap();
    let err = PhysicalPlanGenerator::create(&stmt).err().unwrap();
    assert_eq!(err.code(), ResultCode::Unsupported);
}
