//! Contract tests for the query engine: binder, planner and executor.
//!
//! The executor contracts drive operators by hand through the helpers below:
//! a child operator replaying fixed records and a transaction that records
//! every call and can be told to fail.

mod binder_contract;
mod executor_contract;
mod planner_contract;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use ruql::catalog::AttrInfo;
use ruql::executor::{PhysicalOperator, RowTuple, Tuple};
use ruql::storage::{Db, Record, Table};
use ruql::trx::Trx;
use ruql::types::{DataType, Value};
use ruql::{RelError, Result};

/// Shared, ordered log of operator and transaction events.
pub type EventLog = Rc<RefCell<Vec<String>>>;

/// Creates `t(id INT, v INT, name CHAR(8))` and `u(id INT, w FLOAT)`.
pub fn create_db() -> Db {
    let mut db = Db::new("contracts");
    db.create_table(
        "t",
        &[
            AttrInfo::new("id", DataType::Int32, None),
            AttrInfo::new("v", DataType::Int32, None),
            AttrInfo::new("name", DataType::Char, Some(8)),
        ],
    )
    .expect("create t");
    db.create_table(
        "u",
        &[
            AttrInfo::new("id", DataType::Int32, None),
            AttrInfo::new("w", DataType::Float32, None),
        ],
    )
    .expect("create u");
    db
}

/// Inserts `count` rows `(i, i * 10, "row{i}")` into `t`, returning them.
pub fn fill_t(db: &Db, count: i32) -> (Arc<Table>, Vec<Record>) {
    let table = db.find_table("t").expect("table t");
    let records = (1..=count)
        .map(|i| {
            let mut record = table
                .make_record(&[
                    Value::Int32(i),
                    Value::Int32(i * 10),
                    Value::Char(format!("row{i}")),
                ])
                .expect("make record");
            table.insert_record(&mut record).expect("insert record");
            record
        })
        .collect();
    (table, records)
}

/// Child operator replaying a fixed list of records.
pub struct RecordSource {
    table: Arc<Table>,
    records: Vec<Record>,
    cursor: usize,
    current: Option<RowTuple>,
    fail_at: Option<usize>,
    log: EventLog,
}

impl RecordSource {
    pub fn new(table: Arc<Table>, records: Vec<Record>, log: EventLog) -> Self {
        RecordSource {
            table,
            records,
            cursor: 0,
            current: None,
            fail_at: None,
            log,
        }
    }

    /// Makes the `n`-th call to `next` (1-based) fail.
    pub fn failing_at(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }
}

impl PhysicalOperator for RecordSource {
    fn name(&self) -> &'static str {
        "RECORD_SOURCE"
    }

    fn open(&mut self, _trx: &mut dyn Trx) -> Result<()> {
        self.log.borrow_mut().push("child.open".into());
        self.cursor = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        self.log.borrow_mut().push("child.next".into());
        if self.fail_at == Some(self.cursor + 1) {
            return Err(RelError::Internal("injected read failure".into()));
        }
        match self.records.get(self.cursor) {
            Some(record) => {
                self.current = Some(RowTuple::new(Arc::clone(&self.table), record.clone()));
                self.cursor += 1;
                Ok(true)
            }
            None => {
                self.current = None;
                Ok(false)
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.log.borrow_mut().push("child.close".into());
        Ok(())
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.current.as_ref().map(|t| t as &dyn Tuple)
    }
}

/// Transaction applying changes straight to the table while logging every
/// call. Can be told to fail the `n`-th mutation (1-based).
pub struct RecordingTrx {
    log: EventLog,
    mutations: usize,
    fail_at: Option<usize>,
}

impl RecordingTrx {
    pub fn new(log: EventLog) -> Self {
        RecordingTrx {
            log,
            mutations: 0,
            fail_at: None,
        }
    }

    pub fn failing_at(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }

    /// Number of mutation calls received, failed ones included.
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    fn begin_mutation(&mut self, what: &str) -> Result<()> {
        self.mutations += 1;
        self.log.borrow_mut().push(format!("trx.{what}"));
        if self.fail_at == Some(self.mutations) {
            return Err(RelError::Transaction("injected failure".into()));
        }
        Ok(())
    }
}

impl Trx for RecordingTrx {
    fn id(&self) -> u64 {
        1
    }

    fn insert_record(&mut self, table: &Arc<Table>, record: &mut Record) -> Result<()> {
        self.begin_mutation("insert")?;
        table.insert_record(record)
    }

    fn delete_record(&mut self, table: &Arc<Table>, record: &Record) -> Result<()> {
        self.begin_mutation("delete")?;
        table.delete_record(record.rid()).map(|_| ())
    }

    fn update_record(&mut self, table: &Arc<Table>, _old: &Record, new: &Record) -> Result<()> {
        self.begin_mutation("update")?;
        table.update_record_in_place(new)
    }

    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Reads field `field` of every live record of `table`, in rid order.
pub fn column(table: &Arc<Table>, field: &str) -> Vec<Value> {
    let meta = table.meta().field(field).expect("field").clone();
    table
        .scan_rids()
        .into_iter()
        .map(|rid| {
            table
                .get_record(rid)
                .and_then(|r| r.value(&meta))
                .expect("read field")
        })
        .collect()
}
