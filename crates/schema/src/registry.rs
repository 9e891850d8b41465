//! The metadata dictionary: a validated map from table name to schema.
//!
//! Validation at load time is the boundary everything downstream leans on:
//! identifiers that pass here may be spliced into dynamically built SQL
//! (always double-quoted), and relation targets are guaranteed to resolve.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{field::FieldType, table::TableSchema};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to parse registry: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),
    #[error("table `{0}` registered twice")]
    DuplicateTable(String),
    #[error("table `{table}`: field `{field}` declared twice")]
    DuplicateField { table: String, field: String },
    #[error("table `{table}`: primary key `{field}` is not a field")]
    UnknownPrimaryKey { table: String, field: String },
    #[error("table `{table}`: label field `{field}` is not a field")]
    UnknownLabelField { table: String, field: String },
    #[error("table `{table}`: primary key `{field}` must be uuid or integer, got {field_type}")]
    BadPrimaryKeyType {
        table: String,
        field: String,
        field_type: FieldType,
    },
    #[error("table `{table}`, field `{field}`: relation target `{target}` is not registered")]
    UnknownRelationTarget {
        table: String,
        field: String,
        target: String,
    },
    #[error(
        "table `{table}`, field `{field}`: label field `{label_field}` missing on `{target}`"
    )]
    UnknownRelationLabel {
        table: String,
        field: String,
        target: String,
        label_field: String,
    },
    #[error(
        "table `{table}`, field `{field}`: type {field_type} does not match `{target}` primary key type {pk_type}"
    )]
    RelationTypeMismatch {
        table: String,
        field: String,
        field_type: FieldType,
        target: String,
        pk_type: FieldType,
    },
}

/// True for names safe to splice into SQL as quoted identifiers.
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRegistry {
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaRegistry {
    /// Build a registry from table schemas, rejecting anything that would
    /// make downstream SQL generation or relation resolution unsound.
    pub fn from_tables(tables: Vec<TableSchema>) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for table in tables {
            if map.insert(table.name.clone(), table.clone()).is_some() {
                return Err(RegistryError::DuplicateTable(table.name));
            }
        }
        let registry = Self { tables: map };
        registry.validate()?;
        Ok(registry)
    }

    /// Load the dictionary from its JSON representation: an array of table
    /// schemas.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let tables: Vec<TableSchema> = serde_json::from_str(json)?;
        Self::from_tables(tables)
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn validate(&self) -> Result<(), RegistryError> {
        // Per-table checks first, so the relation pass below can rely on
        // every target's primary key being sound.
        for table in self.tables.values() {
            if !is_valid_identifier(&table.name) {
                return Err(RegistryError::InvalidIdentifier(table.name.clone()));
            }
            let mut seen = std::collections::BTreeSet::new();
            for field in &table.fields {
                if !is_valid_identifier(&field.name) {
                    return Err(RegistryError::InvalidIdentifier(field.name.clone()));
                }
                if !seen.insert(field.name.as_str()) {
                    return Err(RegistryError::DuplicateField {
                        table: table.name.clone(),
                        field: field.name.clone(),
                    });
                }
            }
            let pk = table.pk_field().ok_or_else(|| RegistryError::UnknownPrimaryKey {
                table: table.name.clone(),
                field: table.primary_key.clone(),
            })?;
            if !matches!(pk.field_type, FieldType::Uuid | FieldType::Integer) {
                return Err(RegistryError::BadPrimaryKeyType {
                    table: table.name.clone(),
                    field: pk.name.clone(),
                    field_type: pk.field_type,
                });
            }
            if !table.has_field(&table.label_field) {
                return Err(RegistryError::UnknownLabelField {
                    table: table.name.clone(),
                    field: table.label_field.clone(),
                });
            }
        }

        for table in self.tables.values() {
            for field in table.relation_fields() {
                let Some(relation) = field.relation.as_ref() else {
                    continue;
                };
                let target = self.tables.get(&relation.table).ok_or_else(|| {
                    RegistryError::UnknownRelationTarget {
                        table: table.name.clone(),
                        field: field.name.clone(),
                        target: relation.table.clone(),
                    }
                })?;
                if !target.has_field(&relation.label_field) {
                    return Err(RegistryError::UnknownRelationLabel {
                        table: table.name.clone(),
                        field: field.name.clone(),
                        target: relation.table.clone(),
                        label_field: relation.label_field.clone(),
                    });
                }
                let pk_type = target.pk_field().map(|f| f.field_type).ok_or_else(|| {
                    RegistryError::UnknownPrimaryKey {
                        table: target.name.clone(),
                        field: target.primary_key.clone(),
                    }
                })?;
                if field.field_type != pk_type {
                    return Err(RegistryError::RelationTypeMismatch {
                        table: table.name.clone(),
                        field: field.name.clone(),
                        field_type: field.field_type,
                        target: relation.table.clone(),
                        pk_type,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldSchema, FieldType};

    fn customers() -> TableSchema {
        TableSchema {
            name: "customers".into(),
            label: "Customers".into(),
            primary_key: "id".into(),
            label_field: "name".into(),
            fields: vec![
                FieldSchema::new("id", "Id", FieldType::Uuid).read_only(),
                FieldSchema::new("name", "Name", FieldType::Text).required(),
            ],
        }
    }

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
                    .required()
                    .relation("customers", "name"),
            ],
        }
    }

    #[test]
    fn test_valid_registry_loads() {
        let registry = SchemaRegistry::from_tables(vec![customers(), orders()]).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.table("orders").is_some());
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_valid_identifier("customer_id"));
        assert!(is_valid_identifier("_private"));
        assert!(!is_valid_identifier("1st"));
        assert!(!is_valid_identifier("drop table"));
        assert!(!is_valid_identifier("x; --"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn test_rejects_bad_identifier() {
        let mut table = customers();
        table.fields.push(FieldSchema::new("no spaces", "Bad", FieldType::Text));
        let err = SchemaRegistry::from_tables(vec![table]).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_rejects_dangling_relation_target() {
        let err = SchemaRegistry::from_tables(vec![orders()]).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownRelationTarget { .. }));
    }

    #[test]
    fn test_rejects_missing_relation_label() {
        let mut orders = orders();
        orders.fields[2] = FieldSchema::new("customer_id", "Customer", FieldType::Uuid)
            .relation("customers", "nickname");
        let err = SchemaRegistry::from_tables(vec![customers(), orders]).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownRelationLabel { .. }));
    }

    #[test]
    fn test_rejects_relation_type_mismatch() {
        let mut orders = orders();
        orders.fields[2] = FieldSchema::new("customer_id", "Customer", FieldType::Integer)
            .relation("customers", "name");
        let err = SchemaRegistry::from_tables(vec![customers(), orders]).unwrap_err();
        assert!(matches!(err, RegistryError::RelationTypeMismatch { .. }));
    }

    #[test]
    fn test_rejects_text_primary_key() {
        let mut table = customers();
        table.primary_key = "name".into();
        let err = SchemaRegistry::from_tables(vec![table]).unwrap_err();
        assert!(matches!(err, RegistryError::BadPrimaryKeyType { .. }));
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::to_string(&vec![customers(), orders()]).unwrap();
        let registry = SchemaRegistry::from_json(&json).unwrap();
        assert_eq!(registry.table("customers").unwrap().label, "Customers");
    }
}
