//! Routes for schema introspection: what tables exist and how to render
//! them.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use schema::{
    TableSchema,
    widget::{FormDescriptor, FormMode, TableDescriptor, form_descriptor, table_descriptor},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

/// One row of the table index.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TableSummary {
    pub name: String,
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub struct DescriptorQuery {
    pub mode: Option<String>,
}

/// Either descriptor shape, depending on the requested mode.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(untagged)]
pub enum DescriptorView {
    Form(FormDescriptor),
    Table(TableDescriptor),
}

pub async fn list_tables(
    State(state): State<AppState>,
) -> ResponseJson<ApiResponse<Vec<TableSummary>>> {
    let summaries = state
        .registry
        .tables()
        .map(|t| TableSummary {
            name: t.name.clone(),
            label: t.label.clone(),
        })
        .collect();
    ResponseJson(ApiResponse::success(summaries))
}

pub async fn get_schema(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<ResponseJson<ApiResponse<TableSchema>>, ApiError> {
    let schema = state
        .registry
        .table(&table)
        .ok_or_else(|| ApiError::Detail(services::services::detail::DetailError::UnknownTable(
            table.clone(),
        )))?;
    Ok(ResponseJson(ApiResponse::success(schema.clone())))
}

/// `mode=create|edit` yields a form descriptor, `mode=table` (or nothing)
/// the list-view descriptor.
pub async fn get_descriptor(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(query): Query<DescriptorQuery>,
) -> Result<ResponseJson<ApiResponse<DescriptorView>>, ApiError> {
    let schema = state
        .registry
        .table(&table)
        .ok_or_else(|| ApiError::Detail(services::services::detail::DetailError::UnknownTable(
            table.clone(),
        )))?;

    let view = match query.mode.as_deref() {
        Some("create") => DescriptorView::Form(form_descriptor(schema, FormMode::Create)),
        Some("edit") => DescriptorView::Form(form_descriptor(schema, FormMode::Edit)),
        Some("table") | None => DescriptorView::Table(table_descriptor(schema)),
        Some(other) => {
            return Err(ApiError::BadRequest(format!("unknown mode `{other}`")));
        }
    };
    Ok(ResponseJson(ApiResponse::success(view)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tables", get(list_tables))
        .route("/tables/{table}/schema", get(get_schema))
        .route("/tables/{table}/descriptor", get(get_descriptor))
}
