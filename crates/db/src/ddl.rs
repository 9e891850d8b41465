//! DDL generation: the registry describes the tables, so the registry can
//! also provision them.

use schema::{FieldType, SchemaRegistry, TableSchema};
use sqlx::SqlitePool;
use tracing::info;

fn sql_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Text
        | FieldType::LongText
        | FieldType::Date
        | FieldType::DateTime
        | FieldType::Uuid => "TEXT",
        FieldType::Integer | FieldType::Boolean => "INTEGER",
        FieldType::Float => "REAL",
    }
}

/// Render `CREATE TABLE IF NOT EXISTS` for one schema. Relation fields get
/// foreign key clauses against the target's primary key; the registry is
/// needed to know the target column.
pub fn create_table_sql(schema: &TableSchema, registry: &SchemaRegistry) -> String {
    let mut parts: Vec<String> = Vec::new();

    for field in &schema.fields {
        let mut column = format!("\"{}\" {}", field.name, sql_type(field.field_type));
        if field.name == schema.primary_key {
            // An INTEGER PRIMARY KEY aliases the rowid, so SQLite assigns
            // ids for tables with integer keys
            column.push_str(" PRIMARY KEY");
        } else if field.required {
            column.push_str(" NOT NULL");
        }
        if field.read_only
            && field.field_type == FieldType::DateTime
            && field.name != schema.primary_key
        {
            column.push_str(" DEFAULT CURRENT_TIMESTAMP");
        }
        parts.push(column);
    }

    for field in schema.relation_fields() {
        let Some(relation) = field.relation.as_ref() else {
            continue;
        };
        if let Some(target) = registry.table(&relation.table) {
            parts.push(format!(
                "FOREIGN KEY (\"{}\") REFERENCES \"{}\" (\"{}\")",
                field.name, target.name, target.primary_key
            ));
        }
    }

    format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
        schema.name,
        parts.join(", ")
    )
}

/// Create every registered table that does not exist yet.
pub async fn ensure_tables(pool: &SqlitePool, registry: &SchemaRegistry) -> Result<(), sqlx::Error> {
    for schema in registry.tables() {
        let sql = create_table_sql(schema, registry);
        sqlx::query(&sql).execute(pool).await?;
    }
    info!(tables = registry.len(), "storage bootstrap complete");
    Ok(())
}

/// Report registered tables missing from the database.
pub async fn missing_tables(
    pool: &SqlitePool,
    registry: &SchemaRegistry,
) -> Result<Vec<String>, sqlx::Error> {
    let mut missing = Vec::new();
    for schema in registry.tables() {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
        )
        .bind(&schema.name)
        .fetch_one(pool)
        .await?
            > 0;
        if !exists {
            missing.push(schema.name.clone());
        }
    }
    Ok(missing)
}
