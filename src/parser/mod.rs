//! SQL parser module.
//!
//! This module provides parsing of SQL text into an unbound AST using the
//! pest parser generator. Names are not resolved here; see [`crate::binder`].

pub mod ast;
mod grammar;

pub use grammar::{parse_sql, parse_statements};
