use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

/// Scalar type of a column. These are the tags the widget registry and the
/// value codec key on.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldType {
    Text,
    LongText,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Uuid,
}

/// Marks a column as a foreign key into another table's primary key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct RelationSchema {
    /// Target table name
    pub table: String,
    /// Column on the target table used as the human-readable label
    pub label_field: String,
}

/// One column of a table: name, label, type, and the flags that drive
/// rendering and validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct FieldSchema {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Server-managed columns (primary keys, timestamps). Omitted from
    /// create forms, rendered as static text on edit forms, and never
    /// written through an update.
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub relation: Option<RelationSchema>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type,
            required: false,
            read_only: false,
            relation: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn relation(
        mut self,
        table: impl Into<String>,
        label_field: impl Into<String>,
    ) -> Self {
        self.relation = Some(RelationSchema {
            table: table.into(),
            label_field: label_field.into(),
        });
        self
    }

    pub fn is_relation(&self) -> bool {
        self.relation.is_some()
    }
}
