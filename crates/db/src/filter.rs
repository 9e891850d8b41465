//! Query shapes for the list operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumString};
use ts_rs::TS;

/// Server-side filter operators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FilterOp {
    /// Exact match
    Eq,
    /// Case-insensitive substring match, the SQLite rendering of ILIKE
    ILike,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    #[ts(type = "any")]
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value,
        }
    }

    pub fn ilike(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::ILike,
            value: Value::String(value.into()),
        }
    }
}

/// Everything the list operation accepts. `order_by` and filter fields are
/// checked against the schema before any SQL is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    pub order_by: Option<String>,
    pub descending: bool,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            order_by: None,
            descending: false,
            limit: 50,
            offset: 0,
        }
    }
}

impl ListQuery {
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }
}
