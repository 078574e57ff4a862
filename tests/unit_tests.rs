//! Unit tests for ruql.

use std::cmp::Ordering;

use proptest::prelude::*;

use ruql::binder::compare_values;
use ruql::catalog::{AttrInfo, Catalog};
use ruql::parser::ast::{CompOp, Expression, ParsedSqlNode};
use ruql::parser::{parse_sql, parse_statements};
use ruql::types::{DataType, Value};
use ruql::RelError;

// =============================================================================
// Error Tests
// =============================================================================

mod error_tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = RelError::ParseError {
            line: 1,
            col: 5,
            message: "unexpected token".into(),
        };
        assert!(err.to_string().contains("line 1"));
        assert!(err.to_string().contains("column 5"));
        assert!(err.to_string().contains("unexpected token"));
    }

    #[test]
    fn test_table_not_exist_display() {
        let err = RelError::SchemaTableNotExist("t".into());
        assert_eq!(err.to_string(), "Table does not exist: t");
    }
}

// =============================================================================
// Parser Tests
// =============================================================================

mod parser_tests {
    use super::*;

    #[test]
    fn test_keywords_are_case_insensitive() {
        let node = parse_sql("SeLeCt id FROM t WhErE id >= 3").unwrap();
        let ParsedSqlNode::Select(select) = node else {
            panic!("expected select");
        };
        assert_eq!(select.relations, ["t"]);
        assert_eq!(select.conditions[0].comp, CompOp::Gte);
    }

    #[test]
    fn test_multiple_statements() {
        let nodes = parse_statements("create table t (a int); insert into t values (1);").unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(matches!(nodes[1], ParsedSqlNode::Insert(_)));
    }

    #[test]
    fn test_negative_and_large_literals() {
        let ParsedSqlNode::Insert(insert) =
            parse_sql("insert into t values (-7, 3000000000, -1.5, 'x y', true)").unwrap()
        else {
            panic!("expected insert");
        };
        assert_eq!(
            insert.values,
            vec![
                Value::Int32(-7),
                Value::Int64(3_000_000_000),
                Value::Float32(-1.5),
                Value::Char("x y".into()),
                Value::Bool(true),
            ]
        );
    }

    #[test]
    fn test_comment_ignored() {
        let node = parse_sql("select a -- trailing comment\n from t").unwrap();
        let ParsedSqlNode::Select(select) = node else {
            panic!("expected select");
        };
        assert!(matches!(select.expressions[0], Expression::UnboundField(_)));
    }
}

// =============================================================================
// Catalog Tests
// =============================================================================

mod catalog_tests {
    use super::*;

    #[test]
    fn test_char_default_width() {
        let mut catalog = Catalog::new();
        let meta = catalog
            .create_table("t", &[AttrInfo::new("c", DataType::Char, None)])
            .unwrap();
        assert_eq!(meta.record_size, ruql::catalog::DEFAULT_CHAR_LEN);
    }

    #[test]
    fn test_table_ids_increase() {
        let mut catalog = Catalog::new();
        let a = catalog
            .create_table("a", &[AttrInfo::new("x", DataType::Int32, None)])
            .unwrap();
        let b = catalog
            .create_table("b", &[AttrInfo::new("x", DataType::Int64, None)])
            .unwrap();
        assert!(b.table_id > a.table_id);
        assert!(catalog.table_exists("b"));
    }
}

// =============================================================================
// Value Properties
// =============================================================================

fn same_type_pair() -> impl Strategy<Value = (Value, Value)> {
    prop_oneof![
        (any::<i32>(), any::<i32>()).prop_map(|(a, b)| (Value::Int32(a), Value::Int32(b))),
        (any::<i64>(), any::<i64>()).prop_map(|(a, b)| (Value::Int64(a), Value::Int64(b))),
        (-1.0e6_f32..1.0e6, -1.0e6_f32..1.0e6)
            .prop_map(|(a, b)| (Value::Float32(a), Value::Float32(b))),
        ("[a-z]{0,6}", "[a-z]{0,6}").prop_map(|(a, b)| (Value::Char(a), Value::Char(b))),
        (any::<bool>(), any::<bool>()).prop_map(|(a, b)| (Value::Bool(a), Value::Bool(b))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: every value compares equal to itself
    #[test]
    fn prop_compare_reflexive((a, _) in same_type_pair()) {
        prop_assert_eq!(a.compare(&a), Some(Ordering::Equal));
        prop_assert!(compare_values(CompOp::Eq, &a, &a).unwrap());
    }

    /// Property: swapping operands reverses the ordering
    #[test]
    fn prop_compare_antisymmetric((a, b) in same_type_pair()) {
        let forward = a.compare(&b).unwrap();
        let backward = b.compare(&a).unwrap();
        prop_assert_eq!(forward, backward.reverse());
        prop_assert_eq!(
            compare_values(CompOp::Lt, &a, &b).unwrap(),
            compare_values(CompOp::Gt, &b, &a).unwrap()
        );
    }

    /// Property: x + (-x) is zero in the operand's own width
    #[test]
    fn prop_add_negation_is_zero(a in any::<i32>(), b in any::<i64>()) {
        let x = Value::Int32(a);
        prop_assert_eq!(x.add(&x.negate().unwrap()).unwrap(), Value::Int32(0));
        let y = Value::Int64(b);
        prop_assert_eq!(y.add(&y.negate().unwrap()).unwrap(), Value::Int64(0));
    }

    /// Property: textual form parses back to the same value
    #[test]
    fn prop_text_round_trip(i in any::<i32>(), f in -1.0e6_f32..1.0e6, s in "[ -~]{0,12}", b in any::<bool>()) {
        for v in [Value::Int32(i), Value::Float32(f), Value::Char(s), Value::Bool(b)] {
            let data_type = v.data_type().unwrap();
            prop_assert_eq!(Value::from_string(data_type, &v.to_string()).unwrap(), v);
        }
    }

    /// Property: comparisons against NULL are never true
    #[test]
    fn prop_null_never_matches(a in any::<i32>()) {
        for op in [CompOp::Eq, CompOp::Neq, CompOp::Lt, CompOp::Lte, CompOp::Gt, CompOp::Gte] {
            prop_assert!(!compare_values(op, &Value::Int32(a), &Value::Null).unwrap());
        }
    }
}
