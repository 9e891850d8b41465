//! The detail controller: fetch, edit-form generation, and validated writes
//! for a single record of any registered table.

use std::sync::Arc;

use db::{
    records::{RecordError, RecordStore},
    value::Record,
};
use schema::{
    FormDescriptor, SchemaRegistry,
    validate::{ValidationErrors, validate_record},
    widget::{FormMode, form_descriptor},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use ts_rs::TS;

use super::{
    cache::{CacheKey, EntityCache},
    nav::NavContext,
    relations::{self, RelationLabels},
};

#[derive(Debug, Error)]
pub enum DetailError {
    #[error("unknown table `{0}`")]
    UnknownTable(String),
    #[error("record not found")]
    NotFound,
    #[error(
        "navigation context field `{field}` does not reference `{parent_table}`"
    )]
    BadNavContext { field: String, parent_table: String },
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Record(RecordError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<RecordError> for DetailError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::NotFound => DetailError::NotFound,
            other => DetailError::Record(other),
        }
    }
}

/// One record plus everything the UI needs to render it: the edit form and
/// the display labels for its foreign keys.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DetailView {
    pub form: FormDescriptor,
    #[ts(type = "Record<string, any>")]
    pub record: Record,
    pub labels: RelationLabels,
}

#[derive(Clone)]
pub struct DetailService {
    store: RecordStore,
    registry: Arc<SchemaRegistry>,
    cache: EntityCache,
}

impl DetailService {
    pub fn new(store: RecordStore, registry: Arc<SchemaRegistry>, cache: EntityCache) -> Self {
        Self {
            store,
            registry,
            cache,
        }
    }

    fn schema(&self, table: &str) -> Result<&schema::TableSchema, DetailError> {
        self.registry
            .table(table)
            .ok_or_else(|| DetailError::UnknownTable(table.to_string()))
    }

    /// Fetch one record with its edit form and resolved relation labels.
    pub async fn detail(&self, table: &str, id: &str) -> Result<DetailView, DetailError> {
        let schema = self.schema(table)?;

        let key = CacheKey::record(table, id);
        if let Some(hit) = self.cache.get(&key) {
            debug!(table = %table, id = %id, "detail cache hit");
            return Ok(serde_json::from_value(hit)?);
        }

        let record = self
            .store
            .find_by_pk(schema, id)
            .await?
            .ok_or(DetailError::NotFound)?;
        let labels =
            relations::resolve(&self.registry, &self.store, schema, std::slice::from_ref(&record))
                .await?;

        let view = DetailView {
            form: form_descriptor(schema, FormMode::Edit),
            record,
            labels,
        };
        self.cache.set(key, serde_json::to_value(&view)?);
        Ok(view)
    }

    /// Build an empty create form. With a [`NavContext`] the relation field
    /// pointing at the parent is pre-filled, so a child created from a
    /// parent's detail view lands already linked.
    pub fn blank(&self, table: &str, nav: Option<&NavContext>) -> Result<DetailView, DetailError> {
        let schema = self.schema(table)?;

        let mut record = Record::new();
        if let Some(nav) = nav {
            let field = schema
                .field(&nav.parent_field)
                .filter(|f| {
                    f.relation
                        .as_ref()
                        .is_some_and(|r| r.table == nav.parent_table)
                })
                .ok_or_else(|| DetailError::BadNavContext {
                    field: nav.parent_field.clone(),
                    parent_table: nav.parent_table.clone(),
                })?;

            let value = match field.field_type {
                schema::FieldType::Integer => nav
                    .parent_id
                    .parse::<i64>()
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                _ => Value::String(nav.parent_id.clone()),
            };
            record.insert(field.name.clone(), value);
        }

        Ok(DetailView {
            form: form_descriptor(schema, FormMode::Create),
            record,
            labels: RelationLabels::new(),
        })
    }

    /// Validate and insert, invalidating the table's cache entries.
    pub async fn create(&self, table: &str, payload: Record) -> Result<Record, DetailError> {
        let schema = self.schema(table)?;
        validate_record(schema, FormMode::Create, &payload)?;
        let created = self.store.insert(schema, &payload).await?;
        self.cache.clear_table(table);
        Ok(created)
    }

    /// Validate and write the supplied fields. Last write wins.
    pub async fn update(
        &self,
        table: &str,
        id: &str,
        payload: Record,
    ) -> Result<Record, DetailError> {
        let schema = self.schema(table)?;
        validate_record(schema, FormMode::Edit, &payload)?;
        let updated = self.store.update(schema, id, &payload).await?;
        self.cache.clear_table(table);
        Ok(updated)
    }

    pub async fn delete(&self, table: &str, id: &str) -> Result<(), DetailError> {
        let schema = self.schema(table)?;
        let affected = self.store.delete(schema, id).await?;
        if affected == 0 {
            return Err(DetailError::NotFound);
        }
        self.cache.clear_table(table);
        Ok(())
    }
}
