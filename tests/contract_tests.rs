//! Contract tests for the public API (`Database::execute`) and the query engine.

use ruql::trx::TrxKind;
use ruql::{Database, DatabaseConfig, RelError, ResultCode, Value};

// =============================================================================
// Result Code Contracts
// =============================================================================

mod result_code_contracts {
    use super::*;

    fn db() -> Database {
        let mut db = Database::new();
        db.execute("create table t (id int, name char(4))").expect("create t");
        db
    }

    #[test]
    fn test_syntax_error_code() {
        let mut db = db();
        let err = db.execute("select from where").unwrap_err();
        assert_eq!(err.code(), ResultCode::SqlSyntax);
        assert!(matches!(err, RelError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_unknown_table_code() {
        let mut db = db();
        for sql in [
            "select * from nope",
            "insert into nope values (1)",
            "update nope set a = 1",
            "delete from nope",
        ] {
            let err = db.execute(sql).unwrap_err();
            assert_eq!(err.code(), ResultCode::SchemaTableNotExist, "{sql}");
        }
    }

    #[test]
    fn test_duplicate_table_code() {
        let mut db = db();
        let err = db.execute("create table t (x int)").unwrap_err();
        assert_eq!(err.code(), ResultCode::SchemaTableExist);
    }

    #[test]
    fn test_missing_field_code() {
        let mut db = db();
        let err = db.execute("update t set nope = 1").unwrap_err();
        assert_eq!(err.code(), ResultCode::SchemaFieldMissing);
    }

    #[test]
    fn test_bind_failure_code() {
        let mut db = db();
        let err = db.execute("select nope from t").unwrap_err();
        assert_eq!(err.code(), ResultCode::BindFailed);
    }

    #[test]
    fn test_update_type_mismatch_code() {
        // Contract: assigning a value of another type is InvalidArgument
        let mut db = db();
        db.execute("insert into t values (1, 'a')").unwrap();
        let err = db.execute("update t set id = 'x'").unwrap_err();
        assert_eq!(err.code(), ResultCode::InvalidArgument);

        let result = db.execute("select id from t").unwrap();
        assert_eq!(result.rows[0].values(), &[Value::Int32(1)]);
    }

    #[test]
    fn test_code_names() {
        assert_eq!(ResultCode::SchemaTableNotExist.to_string(), "SCHEMA_TABLE_NOT_EXIST");
        assert_eq!(ResultCode::RecordEof.as_str(), "RECORD_EOF");
    }
}

// =============================================================================
// Transaction Contracts
// =============================================================================

mod trx_contracts {
    use super::*;

    #[test]
    fn test_default_trx_is_vacuous() {
        assert_eq!(Database::new().config().trx_kind, TrxKind::Vacuous);
    }

    #[test]
    fn test_successful_statement_commits() {
        let config = DatabaseConfig::new().with_trx_kind(TrxKind::Undo);
        let mut db = Database::with_config(config);
        db.execute("create table t (id int)").unwrap();
        db.execute("insert into t values (1)").unwrap();
        db.execute("insert into t values (2)").unwrap();
        assert_eq!(db.execute("update t set id = 5").unwrap().affected_rows, 2);
        assert_eq!(db.execute("select id from t where id = 5").unwrap().row_count(), 2);
    }
}

// =============================================================================
// Query Engine Contract Tests
// =============================================================================

#[path = "query_engine_contracts/mod.rs"]
mod query_engine_contracts;
