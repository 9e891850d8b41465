//! Declarative table metadata and the descriptor generation built on it.
//!
//! A [`registry::SchemaRegistry`] is the metadata dictionary: it describes
//! every table the service knows about (columns, types, relations, primary
//! keys). Everything else in the workspace is driven by it: SQL generation,
//! record validation, and the form/table descriptors a front end renders.

pub mod field;
pub mod registry;
pub mod table;
pub mod validate;
pub mod widget;

pub use field::{FieldSchema, FieldType, RelationSchema};
pub use registry::{RegistryError, SchemaRegistry};
pub use table::TableSchema;
pub use widget::{FormDescriptor, FormMode, TableDescriptor, WidgetKind};
