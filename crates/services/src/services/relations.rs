//! Foreign-key display resolution, batched per page.
//!
//! Looking up a label row-by-row is the N+1 shape the original suffered
//! from; here the ids on a page are grouped by target table and fetched with
//! one `IN` query per target, no matter how many rows or relation columns
//! reference it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use db::{
    records::{RecordError, RecordStore},
    value::Record,
};
use schema::{SchemaRegistry, TableSchema};
use serde_json::Value;
use tracing::warn;

/// `relation field name -> referenced id -> display label`.
pub type RelationLabels = HashMap<String, HashMap<String, String>>;

fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Resolve display labels for every relation column across a page of rows.
///
/// Dangling references simply produce no label; the raw id stays in the row,
/// so the caller loses nothing.
pub async fn resolve(
    registry: &SchemaRegistry,
    store: &RecordStore,
    schema: &TableSchema,
    rows: &[Record],
) -> Result<RelationLabels, RecordError> {
    // target table -> (ids seen on this page, label columns wanted)
    let mut per_target: BTreeMap<&str, (BTreeSet<String>, BTreeSet<&str>)> = BTreeMap::new();

    for field in schema.relation_fields() {
        let Some(relation) = field.relation.as_ref() else {
            continue;
        };
        let entry = per_target.entry(relation.table.as_str()).or_default();
        entry.1.insert(relation.label_field.as_str());
        for row in rows {
            if let Some(id) = row.get(&field.name).and_then(value_to_id) {
                entry.0.insert(id);
            }
        }
    }

    // One query per referenced table
    let mut fetched: HashMap<&str, HashMap<String, Record>> = HashMap::new();
    for (&target, (ids, label_fields)) in &per_target {
        if ids.is_empty() {
            continue;
        }
        let Some(target_schema) = registry.table(target) else {
            // Unreachable with a validated registry
            warn!(target = %target, "relation target missing from registry");
            continue;
        };
        let mut columns: BTreeSet<&str> = label_fields.clone();
        columns.insert(target_schema.primary_key.as_str());
        let columns: Vec<&str> = columns.into_iter().collect();

        let ids: Vec<String> = ids.iter().cloned().collect();
        let records = store.find_by_pks(target_schema, &ids, &columns).await?;

        let mut by_id = HashMap::with_capacity(records.len());
        for record in records {
            if let Some(id) = record.get(&target_schema.primary_key).and_then(value_to_id) {
                by_id.insert(id, record);
            }
        }
        fetched.insert(target, by_id);
    }

    let mut labels = RelationLabels::new();
    for field in schema.relation_fields() {
        let Some(relation) = field.relation.as_ref() else {
            continue;
        };
        let Some(by_id) = fetched.get(relation.table.as_str()) else {
            continue;
        };
        let mut field_labels = HashMap::new();
        for row in rows {
            let Some(id) = row.get(&field.name).and_then(value_to_id) else {
                continue;
            };
            if let Some(label) = by_id
                .get(&id)
                .and_then(|record| record.get(&relation.label_field))
                .and_then(value_to_label)
            {
                field_labels.insert(id, label);
            }
        }
        labels.insert(field.name.clone(), field_labels);
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::ddl::ensure_tables;
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
            ],
        };
        let orders = TableSchema {
            name: "orders".into(),
            label: "Orders".into(),
            primary_key: "id".into(),
            label_field: "reference".into(),
            fields: vec![
                FieldSchema::new("id", "Id", FieldType::Uuid).read_only(),
                FieldSchema::new("reference", "Reference", FieldType::Text).required(),
                FieldSchema::new("customer_id", "Customer", FieldType::Uuid)
                    .relation("customers", "name"),
                FieldSchema::new("billed_to", "Billed to", FieldType::Uuid)
                    .relation("customers", "name"),
            ],
        };
        SchemaRegistry::from_tables(vec![customers, orders]).unwrap()
    }

    async fn setup() -> (SchemaRegistry, RecordStore) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let registry = registry();
        ensure_tables(&pool, &registry).await.unwrap();
        (registry, RecordStore::new(pool))
    }

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_resolves_labels_across_fields_sharing_a_target() {
        let (registry, store) = setup().await;
        let customers = registry.table("customers").unwrap();
        let orders = registry.table("orders").unwrap();

        let ada = store
            .insert(customers, &record(json!({"name": "Ada"})))
            .await
            .unwrap();
        let bea = store
            .insert(customers, &record(json!({"name": "Bea"})))
            .await
            .unwrap();
        let ada_id = ada["id"].as_str().unwrap();
        let bea_id = bea["id"].as_str().unwrap();

        let rows = vec![
            record(json!({"customer_id": ada_id, "billed_to": bea_id})),
            record(json!({"customer_id": bea_id, "billed_to": null})),
        ];

        let labels = resolve(&registry, &store, orders, &rows).await.unwrap();
        assert_eq!(labels["customer_id"][ada_id], "Ada");
        assert_eq!(labels["customer_id"][bea_id], "Bea");
        assert_eq!(labels["billed_to"][bea_id], "Bea");
        assert!(!labels["billed_to"].contains_key(ada_id));
    }

    #[tokio::test]
    async fn test_dangling_reference_gets_no_label() {
        let (registry, store) = setup().await;
        let orders = registry.table("orders").unwrap();

        let rows = vec![record(
            json!({"customer_id": "0e4a9f6a-0000-0000-0000-000000000000"}),
        )];
        let labels = resolve(&registry, &store, orders, &rows).await.unwrap();
        assert!(labels["customer_id"].is_empty());
    }

    #[tokio::test]
    async fn test_no_relation_fields_yields_empty_map() {
        let (registry, store) = setup().await;
        let customers = registry.table("customers").unwrap();
        let labels = resolve(&registry, &store, customers, &[]).await.unwrap();
        assert!(labels.is_empty());
    }
}
