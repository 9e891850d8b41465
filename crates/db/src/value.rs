//! JSON ⇄ SQL value codec, driven by declared field types.
//!
//! SQLite stores everything here as TEXT, INTEGER, or REAL: dates, datetimes
//! and UUIDs travel as strings, booleans as 0/1. The schema's declared type
//! decides both the bind shape and the decode shape, so a round trip always
//! hands back the JSON type the schema promises.

use schema::{FieldSchema, FieldType, TableSchema};
use serde_json::{Map, Value};
use sqlx::{Row, Sqlite, query::Query, sqlite::{SqliteArguments, SqliteRow}};

use crate::records::RecordError;

/// One row as the API sees it: column name to JSON value.
pub type Record = Map<String, Value>;

/// A value ready to bind into a dynamically built statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
}

impl SqlValue {
    /// Convert a JSON value for a column of the given type. The record has
    /// normally been validated already; this is the storage layer refusing
    /// to bind garbage regardless.
    pub fn from_json(field: &FieldSchema, value: &Value) -> Result<Self, RecordError> {
        if value.is_null() {
            return Ok(SqlValue::Null);
        }
        let mismatch = || RecordError::BadValue {
            column: field.name.clone(),
            message: format!("expected {}", field.field_type),
        };
        match field.field_type {
            FieldType::Text
            | FieldType::LongText
            | FieldType::Date
            | FieldType::DateTime
            | FieldType::Uuid => value
                .as_str()
                .map(|s| SqlValue::Text(s.to_string()))
                .ok_or_else(mismatch),
            FieldType::Integer => value.as_i64().map(SqlValue::Integer).ok_or_else(mismatch),
            FieldType::Float => value.as_f64().map(SqlValue::Real).ok_or_else(mismatch),
            FieldType::Boolean => value
                .as_bool()
                .map(|b| SqlValue::Integer(b as i64))
                .ok_or_else(mismatch),
        }
    }
}

/// Push a value onto a runtime-built query.
pub fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Integer(i) => query.bind(i),
        SqlValue::Real(f) => query.bind(f),
    }
}

/// Decode one column of a fetched row into JSON, per the schema's type.
pub fn decode_column(row: &SqliteRow, field: &FieldSchema) -> Result<Value, sqlx::Error> {
    let name = field.name.as_str();
    let value = match field.field_type {
        FieldType::Text
        | FieldType::LongText
        | FieldType::Date
        | FieldType::DateTime
        | FieldType::Uuid => row
            .try_get::<Option<String>, _>(name)?
            .map(Value::String)
            .unwrap_or(Value::Null),
        FieldType::Integer => row
            .try_get::<Option<i64>, _>(name)?
            .map(Value::from)
            .unwrap_or(Value::Null),
        FieldType::Float => row
            .try_get::<Option<f64>, _>(name)?
            .map(Value::from)
            .unwrap_or(Value::Null),
        FieldType::Boolean => row
            .try_get::<Option<bool>, _>(name)?
            .map(Value::Bool)
            .unwrap_or(Value::Null),
    };
    Ok(value)
}

/// Decode a full row in schema field order.
pub fn record_from_row(schema: &TableSchema, row: &SqliteRow) -> Result<Record, sqlx::Error> {
    let mut record = Record::new();
    for field in &schema.fields {
        record.insert(field.name.clone(), decode_column(row, field)?);
    }
    Ok(record)
}
