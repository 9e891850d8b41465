//! Typed navigation context for cross-view record linking.
//!
//! When the UI opens a "new child record" form from a parent's detail view,
//! the link travels here as an explicit value (query parameters at the HTTP
//! boundary) instead of through a session-storage side channel.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct NavContext {
    /// Table the parent record lives in
    pub parent_table: String,
    /// Relation field on the child table pointing at the parent
    pub parent_field: String,
    /// Primary key of the parent record
    pub parent_id: String,
}
