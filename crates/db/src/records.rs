//! Generic record access: CRUD over any registered table, with the SQL built
//! from the table's schema at runtime.
//!
//! Identifiers spliced into statements come exclusively from a validated
//! [`SchemaRegistry`](schema::SchemaRegistry) (and are double-quoted);
//! user-supplied values are always bound.

use schema::{FieldType, TableSchema};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    filter::{Filter, FilterOp, ListQuery},
    value::{Record, SqlValue, bind_value, decode_column, record_from_row},
};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("table `{table}` has no column `{column}`")]
    UnknownColumn { table: String, column: String },
    #[error("column `{column}`: {message}")]
    BadValue { column: String, message: String },
    #[error("record not found")]
    NotFound,
}

/// A page of rows plus the total count of the filtered set.
#[derive(Debug, Clone)]
pub struct ListResult {
    pub rows: Vec<Record>,
    pub total: i64,
}

fn quoted(name: &str) -> String {
    format!("\"{name}\"")
}

fn select_columns(schema: &TableSchema) -> String {
    schema
        .fields
        .iter()
        .map(|f| quoted(&f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Generic data access, parameterized per call by a table schema.
#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Compile filters into a WHERE fragment plus bind values.
    fn where_clause(
        schema: &TableSchema,
        filters: &[Filter],
    ) -> Result<(String, Vec<SqlValue>), RecordError> {
        let mut fragments = Vec::new();
        let mut binds = Vec::new();

        for filter in filters {
            let field = schema.field(&filter.field).ok_or_else(|| {
                RecordError::UnknownColumn {
                    table: schema.name.clone(),
                    column: filter.field.clone(),
                }
            })?;
            match filter.op {
                FilterOp::Eq => {
                    fragments.push(format!("{} = ?", quoted(&field.name)));
                    binds.push(SqlValue::from_json(field, &filter.value)?);
                }
                FilterOp::ILike => {
                    let needle =
                        filter
                            .value
                            .as_str()
                            .ok_or_else(|| RecordError::BadValue {
                                column: field.name.clone(),
                                message: "ilike filter needs a string".to_string(),
                            })?;
                    fragments.push(format!("LOWER({}) LIKE ?", quoted(&field.name)));
                    binds.push(SqlValue::Text(format!("%{}%", needle.to_lowercase())));
                }
            }
        }

        let clause = if fragments.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", fragments.join(" AND "))
        };
        Ok((clause, binds))
    }

    /// Bind-ready primary key value for a textual id.
    fn pk_value(schema: &TableSchema, id: &str) -> Result<SqlValue, RecordError> {
        let pk = schema.pk_field().ok_or_else(|| RecordError::UnknownColumn {
            table: schema.name.clone(),
            column: schema.primary_key.clone(),
        })?;
        match pk.field_type {
            FieldType::Integer => id.parse::<i64>().map(SqlValue::Integer).map_err(|_| {
                RecordError::BadValue {
                    column: pk.name.clone(),
                    message: "expected integer id".to_string(),
                }
            }),
            _ => Ok(SqlValue::Text(id.to_string())),
        }
    }

    /// Fetch a page of rows with server-side filters, ordering, and
    /// pagination. `total` counts the filtered set, ignoring limit/offset.
    pub async fn list(
        &self,
        schema: &TableSchema,
        query: &ListQuery,
    ) -> Result<ListResult, RecordError> {
        let (where_sql, binds) = Self::where_clause(schema, &query.filters)?;

        let order_column = match &query.order_by {
            Some(column) => {
                if !schema.has_field(column) {
                    return Err(RecordError::UnknownColumn {
                        table: schema.name.clone(),
                        column: column.clone(),
                    });
                }
                column.clone()
            }
            // Deterministic pagination needs a stable order
            None => schema.primary_key.clone(),
        };
        let direction = if query.descending { "DESC" } else { "ASC" };

        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY {} {} LIMIT ? OFFSET ?",
            select_columns(schema),
            quoted(&schema.name),
            where_sql,
            quoted(&order_column),
            direction,
        );
        debug!(table = %schema.name, sql = %sql, "listing records");

        let mut q = sqlx::query(&sql);
        for bind in binds.clone() {
            q = bind_value(q, bind);
        }
        let rows = q
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(record_from_row(schema, row)?);
        }

        let count_sql = format!(
            "SELECT COUNT(*) FROM {}{}",
            quoted(&schema.name),
            where_sql
        );
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for bind in binds {
            count_q = match bind {
                SqlValue::Null => count_q.bind(None::<String>),
                SqlValue::Text(s) => count_q.bind(s),
                SqlValue::Integer(i) => count_q.bind(i),
                SqlValue::Real(f) => count_q.bind(f),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        Ok(ListResult {
            rows: records,
            total,
        })
    }

    pub async fn find_by_pk(
        &self,
        schema: &TableSchema,
        id: &str,
    ) -> Result<Option<Record>, RecordError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?",
            select_columns(schema),
            quoted(&schema.name),
            quoted(&schema.primary_key),
        );
        let q = bind_value(sqlx::query(&sql), Self::pk_value(schema, id)?);
        let row = q.fetch_optional(&self.pool).await?;
        row.as_ref()
            .map(|r| record_from_row(schema, r))
            .transpose()
            .map_err(RecordError::from)
    }

    /// Fetch selected columns for a batch of primary keys in one statement.
    /// This is the primitive behind page-level relation resolution.
    pub async fn find_by_pks(
        &self,
        schema: &TableSchema,
        ids: &[String],
        columns: &[&str],
    ) -> Result<Vec<Record>, RecordError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut fields = Vec::with_capacity(columns.len());
        for column in columns {
            let field = schema.field(column).ok_or_else(|| RecordError::UnknownColumn {
                table: schema.name.clone(),
                column: column.to_string(),
            })?;
            fields.push(field);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM {} WHERE {} IN ({})",
            fields
                .iter()
                .map(|f| quoted(&f.name))
                .collect::<Vec<_>>()
                .join(", "),
            quoted(&schema.name),
            quoted(&schema.primary_key),
            placeholders,
        );

        let mut q = sqlx::query(&sql);
        for id in ids {
            q = bind_value(q, Self::pk_value(schema, id)?);
        }
        let rows = q.fetch_all(&self.pool).await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut record = Record::new();
            for &field in &fields {
                record.insert(field.name.clone(), decode_column(row, field)?);
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Insert a record and return the stored row. A UUID primary key is
    /// generated when the schema asks for one and the payload has none;
    /// integer primary keys fall through to SQLite's rowid assignment.
    pub async fn insert(
        &self,
        schema: &TableSchema,
        record: &Record,
    ) -> Result<Record, RecordError> {
        let mut columns: Vec<String> = Vec::new();
        let mut binds: Vec<SqlValue> = Vec::new();

        let pk = schema.pk_field().ok_or_else(|| RecordError::UnknownColumn {
            table: schema.name.clone(),
            column: schema.primary_key.clone(),
        })?;
        if pk.field_type == FieldType::Uuid && !record.contains_key(&pk.name) {
            columns.push(quoted(&pk.name));
            binds.push(SqlValue::Text(Uuid::new_v4().to_string()));
        }

        for field in &schema.fields {
            // Server-managed columns keep their database defaults
            if field.read_only && field.name != schema.primary_key {
                continue;
            }
            if let Some(value) = record.get(&field.name) {
                columns.push(quoted(&field.name));
                binds.push(SqlValue::from_json(field, value)?);
            }
        }

        let sql = if columns.is_empty() {
            format!(
                "INSERT INTO {} DEFAULT VALUES RETURNING {}",
                quoted(&schema.name),
                select_columns(schema),
            )
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                quoted(&schema.name),
                columns.join(", "),
                vec!["?"; columns.len()].join(", "),
                select_columns(schema),
            )
        };
        debug!(table = %schema.name, "inserting record");

        let mut q = sqlx::query(&sql);
        for bind in binds {
            q = bind_value(q, bind);
        }
        let row = q.fetch_one(&self.pool).await?;
        Ok(record_from_row(schema, &row)?)
    }

    /// Write the fields present in the payload. Last write wins; read-only
    /// fields and the primary key are never touched. Returns the stored row.
    pub async fn update(
        &self,
        schema: &TableSchema,
        id: &str,
        record: &Record,
    ) -> Result<Record, RecordError> {
        let mut assignments: Vec<String> = Vec::new();
        let mut binds: Vec<SqlValue> = Vec::new();

        for field in &schema.fields {
            if field.read_only || field.name == schema.primary_key {
                continue;
            }
            if let Some(value) = record.get(&field.name) {
                assignments.push(format!("{} = ?", quoted(&field.name)));
                binds.push(SqlValue::from_json(field, value)?);
            }
        }

        if assignments.is_empty() {
            // Nothing to write; behave like a read so callers still learn
            // whether the row exists
            return self
                .find_by_pk(schema, id)
                .await?
                .ok_or(RecordError::NotFound);
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ? RETURNING {}",
            quoted(&schema.name),
            assignments.join(", "),
            quoted(&schema.primary_key),
            select_columns(schema),
        );
        debug!(table = %schema.name, id = %id, "updating record");

        let mut q = sqlx::query(&sql);
        for bind in binds {
            q = bind_value(q, bind);
        }
        q = bind_value(q, Self::pk_value(schema, id)?);
        let row = q.fetch_optional(&self.pool).await?;
        match row {
            Some(row) => Ok(record_from_row(schema, &row)?),
            None => Err(RecordError::NotFound),
        }
    }

    pub async fn delete(&self, schema: &TableSchema, id: &str) -> Result<u64, RecordError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            quoted(&schema.name),
            quoted(&schema.primary_key),
        );
        let q = bind_value(sqlx::query(&sql), Self::pk_value(schema, id)?);
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
