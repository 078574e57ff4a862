//! Pest parser integration for the SQL grammar.

use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use tracing::warn;

use crate::error::{RelError, Result};
use crate::parser::ast::{
    ArithmeticOp, AttrInfoSqlNode, CompOp, ConditionOperand, ConditionSqlNode,
    CreateTableSqlNode, DeleteSqlNode, Expression, InsertSqlNode, JoinSqlNode, ParsedSqlNode,
    RelAttrSqlNode, SelectSqlNode, UpdateSqlNode,
};
use crate::types::{DataType, Value};

#[derive(Parser)]
#[grammar = "parser/sql.pest"]
struct SqlParser;

/// Parses SQL text and returns its first statement.
///
/// Any statements after the first are parsed, then ignored.
///
/// # Errors
///
/// Returns a `ParseError` if the text is syntactically invalid.
pub fn parse_sql(sql: &str) -> Result<ParsedSqlNode> {
    let mut statements = parse_statements(sql)?;
    if statements.len() > 1 {
        warn!(
            count = statements.len(),
            "multiple statements in one request, only the first is executed"
        );
    }
    if statements.is_empty() {
        return Err(syntax_error("No statement found"));
    }
    Ok(statements.swap_remove(0))
}

/// Parses every `;`-separated statement in `sql`.
///
/// # Errors
///
/// Returns a `ParseError` if the text is syntactically invalid.
pub fn parse_statements(sql: &str) -> Result<Vec<ParsedSqlNode>> {
    let pairs = SqlParser::parse(Rule::sql, sql).map_err(|e| {
        let (line, col) = match e.line_col {
            pest::error::LineColLocation::Pos((l, c))
            | pest::error::LineColLocation::Span((l, c), _) => (l, c),
        };
        RelError::ParseError {
            line,
            col,
            message: e.variant.message().to_string(),
        }
    })?;

    let mut statements = Vec::new();
    for pair in pairs {
        if pair.as_rule() == Rule::sql {
            for inner in pair.into_inner() {
                if inner.as_rule() == Rule::statement {
                    statements.push(build_statement(inner)?);
                }
            }
        }
    }
    Ok(statements)
}

fn syntax_error(message: &str) -> RelError {
    RelError::ParseError {
        line: 0,
        col: 0,
        message: message.into(),
    }
}

fn next_pair<'a>(pairs: &mut Pairs<'a, Rule>, what: &str) -> Result<Pair<'a, Rule>> {
    pairs
        .next()
        .ok_or_else(|| syntax_error(&format!("expected {what}")))
}

fn build_statement(pair: Pair<Rule>) -> Result<ParsedSqlNode> {
    let inner = next_pair(&mut pair.into_inner(), "statement")?;
    match inner.as_rule() {
        Rule::create_table => build_create_table(inner).map(ParsedSqlNode::CreateTable),
        Rule::insert => build_insert(inner).map(ParsedSqlNode::Insert),
        Rule::select => build_select(inner).map(ParsedSqlNode::Select),
        Rule::update => build_update(inner).map(ParsedSqlNode::Update),
        Rule::delete => build_delete(inner).map(ParsedSqlNode::Delete),
        _ => Err(syntax_error("Unknown statement type")),
    }
}

fn build_create_table(pair: Pair<Rule>) -> Result<CreateTableSqlNode> {
    let mut relation_name = None;
    let mut attr_infos = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::identifier => relation_name = Some(inner.as_str().to_string()),
            Rule::attr_def => attr_infos.push(build_attr_def(inner)?),
            _ => {}
        }
    }
    Ok(CreateTableSqlNode {
        relation_name: relation_name.ok_or_else(|| syntax_error("expected table name"))?,
        attr_infos,
    })
}

fn build_attr_def(pair: Pair<Rule>) -> Result<AttrInfoSqlNode> {
    let mut inner = pair.into_inner();
    let name = next_pair(&mut inner, "column name")?.as_str().to_string();
    let type_pair = next_pair(&mut inner, "column type")?;
    let data_type = DataType::parse(type_pair.as_str())
        .ok_or_else(|| syntax_error(&format!("unknown type '{}'", type_pair.as_str())))?;
    let length = match inner.next() {
        Some(len) => Some(
            len.as_str()
                .parse::<usize>()
                .map_err(|e| syntax_error(&format!("invalid length: {e}")))?,
        ),
        None => None,
    };
    Ok(AttrInfoSqlNode {
        name,
        data_type,
        length,
    })
}

fn build_insert(pair: Pair<Rule>) -> Result<InsertSqlNode> {
    let mut relation_name = None;
    let mut values = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::identifier => relation_name = Some(inner.as_str().to_string()),
            Rule::integer | Rule::float | Rule::string | Rule::boolean => {
                values.push(build_literal(inner)?);
            }
            _ => {}
        }
    }
    Ok(InsertSqlNode {
        relation_name: relation_name.ok_or_else(|| syntax_error("expected table name"))?,
        values,
    })
}

fn build_select(pair: Pair<Rule>) -> Result<SelectSqlNode> {
    let mut select = SelectSqlNode::default();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::select_list => {
                for expr in inner.into_inner() {
                    select.expressions.push(build_expression(expr)?);
                }
            }
            Rule::from_list => {
                for rel in inner.into_inner() {
                    select.relations.push(rel.as_str().to_string());
                }
            }
            Rule::join_clause => select.joins.push(build_join(inner)?),
            Rule::where_clause => select.conditions = build_where(inner)?,
            Rule::group_by_clause => {
                for expr in inner.into_inner() {
                    if expr.as_rule() == Rule::expression {
                        select.group_by.push(build_expression(expr)?);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(select)
}

fn build_join(pair: Pair<Rule>) -> Result<JoinSqlNode> {
    let mut relation = None;
    let mut conditions = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::identifier => relation = Some(inner.as_str().to_string()),
            Rule::condition_list => conditions = build_condition_list(inner)?,
            _ => {}
        }
    }
    Ok(JoinSqlNode {
        relation: relation.ok_or_else(|| syntax_error("expected join relation"))?,
        conditions,
    })
}

fn build_where(pair: Pair<Rule>) -> Result<Vec<ConditionSqlNode>> {
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::condition_list {
            return build_condition_list(inner);
        }
    }
    Ok(Vec::new())
}

fn build_update(pair: Pair<Rule>) -> Result<UpdateSqlNode> {
    let mut identifiers = Vec::new();
    let mut value = None;
    let mut conditions = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::identifier => identifiers.push(inner.as_str().to_string()),
            Rule::integer | Rule::float | Rule::string | Rule::boolean => {
                value = Some(build_literal(inner)?);
            }
            Rule::where_clause => conditions = build_where(inner)?,
            _ => {}
        }
    }
    let mut identifiers = identifiers.into_iter();
    Ok(UpdateSqlNode {
        relation_name: identifiers
            .next()
            .ok_or_else(|| syntax_error("expected table name"))?,
        attribute_name: identifiers
            .next()
            .ok_or_else(|| syntax_error("expected column name"))?,
        value: value.ok_or_else(|| syntax_error("expected value"))?,
        conditions,
    })
}

fn build_delete(pair: Pair<Rule>) -> Result<DeleteSqlNode> {
    let mut relation_name = None;
    let mut conditions = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::identifier => relation_name = Some(inner.as_str().to_string()),
            Rule::where_clause => conditions = build_where(inner)?,
            _ => {}
        }
    }
    Ok(DeleteSqlNode {
        relation_name: relation_name.ok_or_else(|| syntax_error("expected table name"))?,
        conditions,
    })
}

fn build_condition_list(pair: Pair<Rule>) -> Result<Vec<ConditionSqlNode>> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::condition)
        .map(build_condition)
        .collect()
}

fn build_condition(pair: Pair<Rule>) -> Result<ConditionSqlNode> {
    let mut inner = pair.into_inner();
    let left = build_operand(next_pair(&mut inner, "left operand")?)?;
    let op = next_pair(&mut inner, "comparison operator")?;
    let comp = CompOp::parse(op.as_str())
        .ok_or_else(|| syntax_error(&format!("unknown comparison '{}'", op.as_str())))?;
    let right = build_operand(next_pair(&mut inner, "right operand")?)?;
    Ok(ConditionSqlNode { left, comp, right })
}

fn build_operand(pair: Pair<Rule>) -> Result<ConditionOperand> {
    let inner = next_pair(&mut pair.into_inner(), "operand")?;
    match inner.as_rule() {
        Rule::rel_attr => Ok(ConditionOperand::Attr(build_rel_attr(inner)?)),
        _ => Ok(ConditionOperand::Value(build_literal(inner)?)),
    }
}

fn build_rel_attr(pair: Pair<Rule>) -> Result<RelAttrSqlNode> {
    let mut inner = pair.into_inner();
    let first = next_pair(&mut inner, "identifier")?.as_str();
    Ok(match inner.next() {
        Some(second) => RelAttrSqlNode::qualified(first, second.as_str()),
        None => RelAttrSqlNode::new(first),
    })
}

fn build_expression(pair: Pair<Rule>) -> Result<Expression> {
    let mut inner = pair.into_inner();
    let mut expr = build_term(next_pair(&mut inner, "term")?)?;
    while let Some(op) = inner.next() {
        let right = build_term(next_pair(&mut inner, "term")?)?;
        expr = arithmetic(op.as_str(), expr, right)?;
    }
    Ok(expr)
}

fn build_term(pair: Pair<Rule>) -> Result<Expression> {
    let mut inner = pair.into_inner();
    let mut expr = build_factor(next_pair(&mut inner, "factor")?)?;
    while let Some(op) = inner.next() {
        let right = build_factor(next_pair(&mut inner, "factor")?)?;
        expr = arithmetic(op.as_str(), expr, right)?;
    }
    Ok(expr)
}

fn arithmetic(op: &str, left: Expression, right: Expression) -> Result<Expression> {
    let op = ArithmeticOp::parse(op)
        .ok_or_else(|| syntax_error(&format!("unknown operator '{op}'")))?;
    Ok(Expression::Arithmetic {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn build_factor(pair: Pair<Rule>) -> Result<Expression> {
    let mut inner = pair.into_inner();
    let first = next_pair(&mut inner, "expression")?;
    match first.as_rule() {
        Rule::neg_op => {
            let child = build_factor(next_pair(&mut inner, "operand of '-'")?)?;
            Ok(Expression::Negative(Box::new(child)))
        }
        _ => build_primary(first),
    }
}

fn build_primary(pair: Pair<Rule>) -> Result<Expression> {
    match pair.as_rule() {
        Rule::expression => build_expression(pair),
        Rule::aggregate => {
            let mut inner = pair.into_inner();
            let name = next_pair(&mut inner, "function name")?.as_str().to_string();
            let child = build_primary(next_pair(&mut inner, "function argument")?)?;
            Ok(Expression::UnboundAggregation {
                name,
                child: Box::new(child),
            })
        }
        Rule::qualified_star => {
            let relation = next_pair(&mut pair.into_inner(), "relation")?
                .as_str()
                .to_string();
            Ok(Expression::Star {
                relation: Some(relation),
            })
        }
        Rule::star => Ok(Expression::Star { relation: None }),
        Rule::rel_attr => Ok(Expression::UnboundField(build_rel_attr(pair)?)),
        Rule::integer | Rule::float | Rule::string | Rule::boolean => {
            Ok(Expression::Value(build_literal(pair)?))
        }
        rule => Err(syntax_error(&format!("unexpected {rule:?} in expression"))),
    }
}

fn build_literal(pair: Pair<Rule>) -> Result<Value> {
    match pair.as_rule() {
        Rule::integer => {
            let n: i64 = pair
                .as_str()
                .parse()
                .map_err(|e| syntax_error(&format!("invalid integer '{}': {e}", pair.as_str())))?;
            Ok(i32::try_from(n).map_or(Value::Int64(n), Value::Int32))
        }
        Rule::float => pair
            .as_str()
            .parse::<f32>()
            .map(Value::Float32)
            .map_err(|e| syntax_error(&format!("invalid float '{}': {e}", pair.as_str()))),
        Rule::string => {
            let text = pair
                .into_inner()
                .next()
                .map_or("", |inner| inner.as_str());
            Ok(Value::Char(text.to_string()))
        }
        Rule::boolean => Ok(Value::Bool(pair.as_str().eq_ignore_ascii_case("true"))),
        rule => Err(syntax_error(&format!("expected literal, found {rule:?}"))),
    }
}
