//! Dynamic SQL construction.
//!
//! Every statement produced here uses positional `$n` placeholders with a
//! parallel parameter list; values are never interpolated into the SQL text.
//! Placeholders are numbered contiguously from `$1` in the exact order the
//! clauses were appended, and the executor must bind the returned parameters
//! in that same order.

mod builder;
mod filter;

pub use builder::QueryBuilder;
pub use filter::{events_filter_query, selections_filter_query, sports_filter_query};

use chrono::{DateTime, Utc};

/// A value destined for a `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}
