//! Contract tests for the Executor module.
//!
//! These tests verify the operator contracts:
//! - The update operator reads all input before its first write
//! - The first transaction failure stops a mutation and is returned as is
//! - Field writes truncate long values and zero-fill short ones
//! - Read operators follow the pull protocol

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ruql::binder::FilterStmt;
use ruql::executor::{
    AggregateOperator, DeleteOperator, NestedLoopJoinOperator, OperatorState, PhysicalOperator,
    PredicateOperator, TableScanOperator, UpdateOperator,
};
use ruql::parser::ast::{CompOp, ConditionOperand, ConditionSqlNode, RelAttrSqlNode};
use ruql::trx::VacuousTrx;
use ruql::types::Value;
use ruql::{RelError, ResultCode};

use super::{column, create_db, fill_t, EventLog, RecordSource, RecordingTrx};

fn new_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

fn update_of(
    db: &ruql::storage::Db,
    field: &str,
    value: Value,
    source: RecordSource,
) -> UpdateOperator {
    let table = db.find_table("t").unwrap();
    let field = table.meta().field(field).unwrap().clone();
    UpdateOperator::new(table, field, value).with_child(Box::new(source))
}

fn drain(op: &mut dyn PhysicalOperator) -> Vec<Vec<Value>> {
    let mut rows = Vec::new();
    while op.next().unwrap() {
        let tuple = op.current_tuple().unwrap();
        rows.push((0..tuple.cell_num()).map(|i| tuple.cell_at(i).unwrap()).collect());
    }
    rows
}

// =============================================================================
// Update operator
// =============================================================================

#[test]
fn test_update_zero_rows_calls_no_update() {
    // Contract: an empty child means zero update_record calls and success
    let db = create_db();
    let table = db.find_table("t").unwrap();
    let log = new_log();
    let source = RecordSource::new(table, Vec::new(), log.clone());
    let mut op = update_of(&db, "v", Value::Int32(1), source);
    let mut trx = RecordingTrx::new(log.clone());

    assert_eq!(op.state(), OperatorState::Unopened);
    op.open(&mut trx).unwrap();
    assert_eq!(op.state(), OperatorState::Opened);
    assert_eq!(trx.mutations(), 0);
    assert_eq!(op.affected_rows(), 0);

    assert!(!op.next().unwrap());
    assert_eq!(op.state(), OperatorState::Exhausted);
    assert!(op.current_tuple().is_none());
    op.close().unwrap();
    assert_eq!(op.state(), OperatorState::Closed);
}

#[test]
fn test_update_reads_everything_before_first_write() {
    // Contract: the child is drained and closed before any update_record
    let db = create_db();
    let (table, records) = fill_t(&db, 3);
    let log = new_log();
    let source = RecordSource::new(table.clone(), records, log.clone());
    let mut op = update_of(&db, "v", Value::Int32(0), source);
    let mut trx = RecordingTrx::new(log.clone());

    op.open(&mut trx).unwrap();

    let events = log.borrow().clone();
    let close_at = events.iter().position(|e| e == "child.close").unwrap();
    let first_update = events.iter().position(|e| e == "trx.update").unwrap();
    assert!(close_at < first_update, "events: {events:?}");
    assert_eq!(events.iter().filter(|e| *e == "child.next").count(), 4);
    assert_eq!(events.iter().filter(|e| *e == "trx.update").count(), 3);
    assert_eq!(op.affected_rows(), 3);
    assert_eq!(column(&table, "v"), vec![Value::Int32(0); 3]);
}

#[test]
fn test_update_type_mismatch_before_any_mutation() {
    // Contract: a value whose type differs from the field type fails with
    // InvalidArgument and mutates nothing
    let db = create_db();
    let (table, records) = fill_t(&db, 3);
    let log = new_log();
    let source = RecordSource::new(table.clone(), records, log.clone());
    let mut op = update_of(&db, "v", Value::Char("ten".into()), source);
    let mut trx = RecordingTrx::new(log.clone());

    let err = op.open(&mut trx).unwrap_err();
    assert_eq!(err.code(), ResultCode::InvalidArgument);
    assert_eq!(trx.mutations(), 0);
    assert!(log.borrow().iter().any(|e| e == "child.close"));
    assert_eq!(
        column(&table, "v"),
        vec![Value::Int32(10), Value::Int32(20), Value::Int32(30)]
    );
}

#[test]
fn test_update_zero_fills_short_value() {
    // Contract: a value shorter than the field leaves no stale bytes
    let db = create_db();
    let (table, records) = fill_t(&db, 1);
    let rid = records[0].rid();
    let log = new_log();
    let source = RecordSource::new(table.clone(), records, log.clone());
    let mut op = update_of(&db, "name", Value::Char("ab".into()), source);

    op.open(&mut RecordingTrx::new(log)).unwrap();

    let field = table.meta().field("name").unwrap().clone();
    let stored = table.get_record(rid).unwrap();
    assert_eq!(stored.field_bytes(&field).unwrap(), b"ab\0\0\0\0\0\0");
    assert_eq!(stored.value(&field).unwrap(), Value::Char("ab".into()));
}

#[test]
fn test_update_truncates_long_value() {
    let db = create_db();
    let (table, records) = fill_t(&db, 1);
    let log = new_log();
    let source = RecordSource::new(table.clone(), records, log.clone());
    let mut op = update_of(&db, "name", Value::Char("abcdefghijk".into()), source);

    op.open(&mut RecordingTrx::new(log)).unwrap();

    assert_eq!(column(&table, "name"), vec![Value::Char("abcdefgh".into())]);
    assert_eq!(column(&table, "id"), vec![Value::Int32(1)]);
}

#[test]
fn test_update_stops_at_first_trx_failure() {
    // Contract: failing on the 3rd of 5 rows leaves exactly 2 rows updated,
    // returns that failure and never touches rows 4 and 5
    let db = create_db();
    let (table, records) = fill_t(&db, 5);
    let log = new_log();
    let source = RecordSource::new(table.clone(), records, log.clone());
    let mut op = update_of(&db, "v", Value::Int32(-1), source);
    let mut trx = RecordingTrx::new(log.clone()).failing_at(3);

    let err = op.open(&mut trx).unwrap_err();
    assert!(matches!(err, RelError::Transaction(ref m) if m == "injected failure"));
    assert_eq!(trx.mutations(), 3);
    assert_eq!(op.affected_rows(), 2);
    assert_eq!(
        column(&table, "v"),
        vec![
            Value::Int32(-1),
            Value::Int32(-1),
            Value::Int32(30),
            Value::Int32(40),
            Value::Int32(50),
        ]
    );
}

#[test]
fn test_update_child_failure_closes_child() {
    let db = create_db();
    let (table, records) = fill_t(&db, 3);
    let log = new_log();
    let source = RecordSource::new(table.clone(), records, log.clone()).failing_at(2);
    let mut op = update_of(&db, "v", Value::Int32(7), source);
    let mut trx = RecordingTrx::new(log.clone());

    let err = op.open(&mut trx).unwrap_err();
    assert_eq!(err.code(), ResultCode::Internal);
    assert_eq!(trx.mutations(), 0);
    assert_eq!(log.borrow().last().map(String::as_str), Some("child.close"));
}

#[test]
fn test_update_without_child_is_noop() {
    let db = create_db();
    let table = db.find_table("t").unwrap();
    let field = table.meta().field("v").unwrap().clone();
    let mut op = UpdateOperator::new(table, field, Value::Int32(1));
    let mut trx = RecordingTrx::new(new_log());

    op.open(&mut trx).unwrap();
    assert!(!op.next().unwrap());
    assert_eq!(trx.mutations(), 0);
    assert!(op.describe().starts_with("UPDATE(t.v=1)"));
}

// =============================================================================
// Delete operator
// =============================================================================

#[test]
fn test_delete_stops_at_first_trx_failure() {
    let db = create_db();
    let (table, records) = fill_t(&db, 4);
    let log = new_log();
    let source = RecordSource::new(table.clone(), records, log.clone());
    let mut op = DeleteOperator::new(table.clone(), Box::new(source));
    let mut trx = RecordingTrx::new(log.clone()).failing_at(2);

    let err = op.open(&mut trx).unwrap_err();
    assert_eq!(err.code(), ResultCode::TransactionFailed);
    assert_eq!(op.affected_rows(), 1);
    assert_eq!(table.record_count(), 3);
}

// =============================================================================
// Read operators
// =============================================================================

fn t_id_eq(value: i32) -> ConditionSqlNode {
    ConditionSqlNode {
        left: ConditionOperand::Attr(RelAttrSqlNode::qualified("t", "id")),
        comp: CompOp::Eq,
        right: ConditionOperand::Value(Value::Int32(value)),
    }
}

#[test]
fn test_scan_and_predicate() {
    let db = create_db();
    let (table, _) = fill_t(&db, 4);
    let tables = HashMap::from([("t".to_string(), table.clone())]);
    let filter = FilterStmt::create(&db, None, &tables, &[t_id_eq(3)]).unwrap();

    let scan = Box::new(TableScanOperator::new(table));
    let mut op = PredicateOperator::new(scan, filter);
    let mut trx = VacuousTrx::new(1);
    op.open(&mut trx).unwrap();
    let rows = drain(&mut op);
    op.close().unwrap();

    assert_eq!(
        rows,
        vec![vec![Value::Int32(3), Value::Int32(30), Value::Char("row3".into())]]
    );
}

#[test]
fn test_nested_loop_join_pairs_rows() {
    let db = create_db();
    let (t, _) = fill_t(&db, 3);
    let u = db.find_table("u").unwrap();
    for (id, w) in [(2, 0.5_f32), (3, 1.5), (3, 2.5)] {
        let mut record = u
            .make_record(&[Value::Int32(id), Value::Float32(w)])
            .unwrap();
        u.insert_record(&mut record).unwrap();
    }
    let tables = HashMap::from([("t".to_string(), t.clone()), ("u".to_string(), u.clone())]);
    let condition = ConditionSqlNode {
        left: ConditionOperand::Attr(RelAttrSqlNode::qualified("t", "id")),
        comp: CompOp::Eq,
        right: ConditionOperand::Attr(RelAttrSqlNode::qualified("u", "id")),
    };
    let filter = FilterStmt::create(&db, None, &tables, &[condition]).unwrap();

    let mut op = NestedLoopJoinOperator::new(
        Box::new(TableScanOperator::new(t)),
        Box::new(TableScanOperator::new(u)),
        filter,
    );
    let mut trx = VacuousTrx::new(1);
    op.open(&mut trx).unwrap();
    let rows = drain(&mut op);
    op.close().unwrap();

    let pairs: Vec<_> = rows.iter().map(|r| (r[0].clone(), r[4].clone())).collect();
    assert_eq!(
        pairs,
        vec![
            (Value::Int32(2), Value::Float32(0.5)),
            (Value::Int32(3), Value::Float32(1.5)),
            (Value::Int32(3), Value::Float32(2.5)),
        ]
    );
}

#[test]
fn test_aggregate_over_empty_input() {
    // Contract: without GROUP BY an empty input still yields one row;
    // COUNT is 0 and the other aggregates are NULL
    let db = create_db();
    let table = db.find_table("t").unwrap();
    let stmt = ruql::binder::Stmt::create(
        &db,
        ruql::parser::parse_sql("select count(*), sum(v), min(name) from t").unwrap(),
    )
    .unwrap();
    let ruql::binder::Stmt::Select(select) = stmt else {
        panic!("expected select");
    };

    let mut op = AggregateOperator::new(
        Box::new(TableScanOperator::new(table)),
        Vec::new(),
        select.query_expressions().to_vec(),
    );
    op.open(&mut VacuousTrx::new(1)).unwrap();
    let rows = drain(&mut op);
    op.close().unwrap();

    assert_eq!(rows, vec![vec![Value::Int32(0), Value::Null, Value::Null]]);
}
