//! Descriptor generation: pure functions from a table schema to the form and
//! table descriptors a front end renders.
//!
//! The field-type to widget/acceptor mapping lives in one lookup table
//! ([`type_entry`]) rather than inside a controller, so read-only rendering,
//! editable forms, and validation all agree on what each type means.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumString};
use ts_rs::TS;

use crate::{
    field::{FieldSchema, FieldType, RelationSchema},
    table::TableSchema,
};

/// Widget tags a front end binds concrete renderers to.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WidgetKind {
    TextInput,
    TextArea,
    NumberInput,
    Checkbox,
    DatePicker,
    DateTimePicker,
    RelationPicker,
    /// Rendered as plain text, never editable
    Static,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FormMode {
    Create,
    Edit,
}

/// One entry of the type registry: how a field type renders and which JSON
/// values it accepts.
pub struct TypeEntry {
    pub widget: WidgetKind,
    pub accepts: fn(&Value) -> bool,
}

fn accepts_string(v: &Value) -> bool {
    v.is_string()
}

fn accepts_integer(v: &Value) -> bool {
    v.as_i64().is_some() || v.as_u64().is_some()
}

fn accepts_float(v: &Value) -> bool {
    v.is_number()
}

fn accepts_boolean(v: &Value) -> bool {
    v.is_boolean()
}

fn accepts_date(v: &Value) -> bool {
    v.as_str()
        .is_some_and(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
}

fn accepts_date_time(v: &Value) -> bool {
    v.as_str()
        .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok())
}

fn accepts_uuid(v: &Value) -> bool {
    v.as_str().is_some_and(|s| uuid::Uuid::parse_str(s).is_ok())
}

static TEXT: TypeEntry = TypeEntry {
    widget: WidgetKind::TextInput,
    accepts: accepts_string,
};
static LONG_TEXT: TypeEntry = TypeEntry {
    widget: WidgetKind::TextArea,
    accepts: accepts_string,
};
static INTEGER: TypeEntry = TypeEntry {
    widget: WidgetKind::NumberInput,
    accepts: accepts_integer,
};
static FLOAT: TypeEntry = TypeEntry {
    widget: WidgetKind::NumberInput,
    accepts: accepts_float,
};
static BOOLEAN: TypeEntry = TypeEntry {
    widget: WidgetKind::Checkbox,
    accepts: accepts_boolean,
};
static DATE: TypeEntry = TypeEntry {
    widget: WidgetKind::DatePicker,
    accepts: accepts_date,
};
static DATE_TIME: TypeEntry = TypeEntry {
    widget: WidgetKind::DateTimePicker,
    accepts: accepts_date_time,
};
static UUID: TypeEntry = TypeEntry {
    widget: WidgetKind::TextInput,
    accepts: accepts_uuid,
};

/// The type registry. Every [`FieldType`] has exactly one entry.
pub fn type_entry(field_type: FieldType) -> &'static TypeEntry {
    match field_type {
        FieldType::Text => &TEXT,
        FieldType::LongText => &LONG_TEXT,
        FieldType::Integer => &INTEGER,
        FieldType::Float => &FLOAT,
        FieldType::Boolean => &BOOLEAN,
        FieldType::Date => &DATE,
        FieldType::DateTime => &DATE_TIME,
        FieldType::Uuid => &UUID,
    }
}

/// One editable (or static) field of a generated form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    pub widget: WidgetKind,
    pub required: bool,
    pub relation: Option<RelationSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct FormDescriptor {
    pub table: String,
    pub mode: FormMode,
    pub fields: Vec<FormField>,
}

/// One column of the generated list view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct TableColumn {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    /// Relation columns render the resolved label instead of the raw key.
    pub is_relation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct TableDescriptor {
    pub table: String,
    pub label: String,
    pub primary_key: String,
    pub columns: Vec<TableColumn>,
}

fn widget_for(field: &FieldSchema, mode: FormMode) -> WidgetKind {
    if field.read_only && mode == FormMode::Edit {
        return WidgetKind::Static;
    }
    if field.is_relation() {
        return WidgetKind::RelationPicker;
    }
    type_entry(field.field_type).widget
}

/// Build the form descriptor for a table. In `Create` mode read-only fields
/// are omitted entirely; in `Edit` mode they appear as static text so the
/// row's identity stays visible.
pub fn form_descriptor(schema: &TableSchema, mode: FormMode) -> FormDescriptor {
    let fields = schema
        .fields
        .iter()
        .filter(|f| !(mode == FormMode::Create && f.read_only))
        .map(|f| FormField {
            name: f.name.clone(),
            label: f.label.clone(),
            field_type: f.field_type,
            widget: widget_for(f, mode),
            required: f.required,
            relation: f.relation.clone(),
        })
        .collect();

    FormDescriptor {
        table: schema.name.clone(),
        mode,
        fields,
    }
}

/// Build the list-view descriptor for a table.
pub fn table_descriptor(schema: &TableSchema) -> TableDescriptor {
    TableDescriptor {
        table: schema.name.clone(),
        label: schema.label.clone(),
        primary_key: schema.primary_key.clone(),
        columns: schema
            .fields
            .iter()
            .map(|f| TableColumn {
                name: f.name.clone(),
                label: f.label.clone(),
                field_type: f.field_type,
                is_relation: f.is_relation(),
            })
            .collect(),
    }
}
