use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::field::FieldSchema;

/// Metadata for one backend table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct TableSchema {
    pub name: String,
    pub label: String,
    /// Column holding the primary key. Must name one of `fields`.
    pub primary_key: String,
    /// Column shown when a row is referenced from another table.
    pub label_field: String,
    pub fields: Vec<FieldSchema>,
}

impl TableSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// The primary key's field schema. Registry validation guarantees it
    /// exists for any schema obtained through a loaded registry.
    pub fn pk_field(&self) -> Option<&FieldSchema> {
        self.field(&self.primary_key)
    }

    pub fn relation_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|f| f.is_relation())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldSchema, FieldType};

    fn orders() -> TableSchema {
        TableSchema {
            name: "orders".into(),
            label: "Orders".into(),
            primary_key: "id".into(),
            label_field: "reference".into(),
            fields: vec![
                FieldSchema::new("id", "Id", FieldType::Uuid).read_only(),
                FieldSchema::new("reference", "Reference", FieldType::Text).required(),
                FieldSchema::new("customer_id", "Customer", FieldType::Uuid)
                    .relation("customers", "name"),
            ],
        }
    }

    #[test]
    fn test_field_lookup() {
        let schema = orders();
        assert!(schema.has_field("reference"));
        assert!(!schema.has_field("missing"));
        assert_eq!(schema.pk_field().unwrap().name, "id");
    }

    #[test]
    fn test_relation_fields() {
        let schema = orders();
        let relations: Vec<_> = schema.relation_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(relations, vec!["customer_id"]);
    }
}
