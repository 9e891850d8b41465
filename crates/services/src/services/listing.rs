//! The list controller: one implementation for every registered table.

use std::sync::Arc;

use db::{
    filter::ListQuery,
    records::{RecordError, RecordStore},
    value::Record,
};
use schema::{SchemaRegistry, TableDescriptor, widget::table_descriptor};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use ts_rs::TS;

use super::{
    cache::{CacheKey, EntityCache},
    relations::{self, RelationLabels},
};

#[derive(Debug, Error)]
pub enum ListError {
    #[error("unknown table `{0}`")]
    UnknownTable(String),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One rendered page of a table: descriptor, rows, resolved relation labels.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ListPage {
    pub descriptor: TableDescriptor,
    #[ts(type = "Array<Record<string, any>>")]
    pub rows: Vec<Record>,
    /// Count of the server-side filtered set, ignoring pagination and the
    /// client-side search pass
    pub total: i64,
    pub labels: RelationLabels,
}

#[derive(Clone)]
pub struct ListService {
    store: RecordStore,
    registry: Arc<SchemaRegistry>,
    cache: EntityCache,
}

impl ListService {
    pub fn new(store: RecordStore, registry: Arc<SchemaRegistry>, cache: EntityCache) -> Self {
        Self {
            store,
            registry,
            cache,
        }
    }

    /// Fetch a page. Server-side filters (equality / ILIKE) run in SQL; the
    /// optional `search` term is the naive substring pass over the fetched
    /// page, matching any stringified cell. Pages are cached until a write
    /// to the table invalidates them.
    pub async fn page(
        &self,
        table: &str,
        query: &ListQuery,
        search: Option<&str>,
    ) -> Result<ListPage, ListError> {
        let schema = self
            .registry
            .table(table)
            .ok_or_else(|| ListError::UnknownTable(table.to_string()))?;

        let fingerprint = serde_json::to_string(&(query, search))?;
        let key = CacheKey::list(table, fingerprint);
        if let Some(hit) = self.cache.get(&key) {
            debug!(table = %table, "list cache hit");
            return Ok(serde_json::from_value(hit)?);
        }

        let result = self.store.list(schema, query).await?;
        let mut rows = result.rows;

        if let Some(needle) = search.filter(|s| !s.trim().is_empty()) {
            let needle = needle.to_lowercase();
            rows.retain(|row| row_matches(row, &needle));
        }

        let labels = relations::resolve(&self.registry, &self.store, schema, &rows).await?;

        let page = ListPage {
            descriptor: table_descriptor(schema),
            rows,
            total: result.total,
            labels,
        };
        self.cache.set(key, serde_json::to_value(&page)?);
        Ok(page)
    }
}

fn row_matches(row: &Record, needle: &str) -> bool {
    row.values().any(|value| match value {
        serde_json::Value::String(s) => s.to_lowercase().contains(needle),
        serde_json::Value::Number(n) => n.to_string().contains(needle),
        serde_json::Value::Bool(b) => b.to_string().contains(needle),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::{ddl::ensure_tables, filter::Filter};
    use schema::{FieldSchema, FieldType, TableSchema};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    fn registry() -> SchemaRegistry {
        let customers = TableSchema {
            name: "customers".into(),
            label: "Customers".into(),
            primary_key: "id".into(),
            label_field: "name".into(),
            fields: vec![
                FieldSchema::new("id", "Id", FieldType::Uuid).read_only(),
                FieldSchema::new("name", "Name", FieldType::Text).required(),
                FieldSchema::new("city", "City", FieldType::Text),
            ],
        };
        SchemaRegistry::from_tables(vec![customers]).unwrap()
    }

    async fn service() -> (ListService, RecordStore) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let registry = Arc::new(registry());
        ensure_tables(&pool, &registry).await.unwrap();
        let store = RecordStore::new(pool);
        (
            ListService::new(store.clone(), registry, EntityCache::new()),
            store,
        )
    }

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    async fn seed(store: &RecordStore) {
        let registry = registry();
        let schema = registry.table("customers").unwrap();
        for (name, city) in [("Ada", "London"), ("Grace", "New York"), ("Alan", "London")] {
            store
                .insert(schema, &record(json!({"name": name, "city": city})))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_page_attaches_descriptor_and_rows() {
        let (service, store) = service().await;
        seed(&store).await;

        let page = service
            .page("customers", &ListQuery::default(), None)
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.rows.len(), 3);
        assert_eq!(page.descriptor.table, "customers");
        assert_eq!(page.descriptor.columns.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_table_errors() {
        let (service, _) = service().await;
        let err = service
            .page("nope", &ListQuery::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ListError::UnknownTable(_)));
    }

    #[tokio::test]
    async fn test_search_narrows_the_fetched_page() {
        let (service, store) = service().await;
        seed(&store).await;

        let page = service
            .page("customers", &ListQuery::default(), Some("grace"))
            .await
            .unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0]["name"], json!("Grace"));
        // total reflects the server-side set, not the search pass
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn test_server_filter_composes_with_search() {
        let (service, store) = service().await;
        seed(&store).await;

        let query = ListQuery::default().with_filter(Filter::eq("city", json!("London")));
        let page = service.page("customers", &query, Some("al")).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0]["name"], json!("Alan"));
    }

    #[tokio::test]
    async fn test_pages_are_cached_per_query() {
        let (service, store) = service().await;
        seed(&store).await;

        let first = service
            .page("customers", &ListQuery::default(), None)
            .await
            .unwrap();
        // A write the cache doesn't know about is invisible until cleared
        let registry = registry();
        store
            .insert(
                registry.table("customers").unwrap(),
                &record(json!({"name": "Edsger"})),
            )
            .await
            .unwrap();
        let second = service
            .page("customers", &ListQuery::default(), None)
            .await
            .unwrap();
        assert_eq!(first.rows.len(), second.rows.len());
    }
}
