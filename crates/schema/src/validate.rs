//! Record validation against a table schema.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::{table::TableSchema, widget::{FormMode, type_entry}};

/// One field-addressed validation failure.
#[derive(Debug, Clone, PartialEq, serde::Serialize, ts_rs::TS)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, ts_rs::TS)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "validation failed: {summary}")
    }
}

/// Check a JSON record against a schema before it is written.
///
/// In `Create` mode every required writable field must be present and
/// non-null; in `Edit` mode only the fields present in the payload are
/// checked (partial updates), but a required field may not be nulled out.
/// Unknown fields and writes to read-only fields are rejected in both modes.
pub fn validate_record(
    schema: &TableSchema,
    mode: FormMode,
    record: &Map<String, Value>,
) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    for (name, value) in record {
        let Some(field) = schema.field(name) else {
            errors.push(FieldError {
                field: name.clone(),
                message: "unknown field".to_string(),
            });
            continue;
        };
        if field.read_only {
            errors.push(FieldError {
                field: name.clone(),
                message: "field is read-only".to_string(),
            });
            continue;
        }
        if value.is_null() {
            if field.required {
                errors.push(FieldError {
                    field: name.clone(),
                    message: "required field cannot be null".to_string(),
                });
            }
            continue;
        }
        if !(type_entry(field.field_type).accepts)(value) {
            errors.push(FieldError {
                field: name.clone(),
                message: format!("expected {}", field.field_type),
            });
        }
    }

    if mode == FormMode::Create {
        for field in &schema.fields {
            if field.required && !field.read_only && !record.contains_key(&field.name) {
                errors.push(FieldError {
                    field: field.name.clone(),
                    message: "required field is missing".to_string(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { errors })
    }
}
