//! Generic CRUD routes: one set of handlers serves every registered table.

use std::collections::HashMap;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::{
    filter::{Filter, FilterOp, ListQuery},
    value::Record,
};
use schema::{FieldType, TableSchema};
use serde_json::Value;
use services::services::{
    config::Config,
    detail::DetailView,
    listing::{ListError, ListPage},
    nav::NavContext,
};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

/// Coerce a query-string value to the column's declared type. A value that
/// fails to parse passes through as a string, so the storage layer reports
/// the mismatch against the right column.
fn coerce_value(schema: &TableSchema, field: &str, raw: &str) -> Value {
    match schema.field(field).map(|f| f.field_type) {
        Some(FieldType::Integer) => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Some(FieldType::Float) => raw
            .parse::<f64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Some(FieldType::Boolean) => match raw {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        _ => Value::String(raw.to_string()),
    }
}

/// Translate the query string into a [`ListQuery`] plus the client-side
/// search term. `filter[col]=v` is equality, `match[col]=v` is the
/// case-insensitive substring filter.
fn parse_list_params(
    config: &Config,
    schema: &TableSchema,
    params: &HashMap<String, String>,
) -> Result<(ListQuery, Option<String>), ApiError> {
    let mut query = ListQuery::default();

    for (key, value) in params {
        if let Some(column) = key.strip_prefix("filter[").and_then(|k| k.strip_suffix(']')) {
            query.filters.push(Filter {
                field: column.to_string(),
                op: FilterOp::Eq,
                value: coerce_value(schema, column, value),
            });
        } else if let Some(column) = key.strip_prefix("match[").and_then(|k| k.strip_suffix(']'))
        {
            query.filters.push(Filter::ilike(column, value.clone()));
        }
    }
    // Param order is not deterministic; keep cache fingerprints stable
    query.filters.sort_by(|a, b| a.field.cmp(&b.field));

    query.order_by = params.get("order_by").cloned();
    query.descending = params
        .get("desc")
        .is_some_and(|v| v == "true" || v == "1");

    let limit = params
        .get("limit")
        .map(|v| v.parse::<i64>())
        .transpose()
        .map_err(|_| ApiError::BadRequest("limit must be an integer".to_string()))?;
    query.limit = config.clamp_limit(limit);

    query.offset = params
        .get("offset")
        .map(|v| v.parse::<i64>())
        .transpose()
        .map_err(|_| ApiError::BadRequest("offset must be an integer".to_string()))?
        .unwrap_or(0)
        .max(0);

    Ok((query, params.get("search").cloned()))
}

/// The navigation context arrives as explicit query parameters, all three or
/// none.
fn parse_nav(params: &HashMap<String, String>) -> Result<Option<NavContext>, ApiError> {
    let parent_table = params.get("parent_table");
    let parent_field = params.get("parent_field");
    let parent_id = params.get("parent_id");
    match (parent_table, parent_field, parent_id) {
        (None, None, None) => Ok(None),
        (Some(table), Some(field), Some(id)) => Ok(Some(NavContext {
            parent_table: table.clone(),
            parent_field: field.clone(),
            parent_id: id.clone(),
        })),
        _ => Err(ApiError::BadRequest(
            "navigation context needs parent_table, parent_field, and parent_id".to_string(),
        )),
    }
}

pub async fn list_records(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ResponseJson<ApiResponse<ListPage>>, ApiError> {
    let schema = state
        .registry
        .table(&table)
        .ok_or_else(|| ApiError::List(ListError::UnknownTable(table.clone())))?;
    let (query, search) = parse_list_params(&state.config, schema, &params)?;

    let page = state
        .list_service()
        .page(&table, &query, search.as_deref())
        .await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

pub async fn create_record(
    State(state): State<AppState>,
    Path(table): Path<String>,
    axum::Json(payload): axum::Json<Record>,
) -> Result<ResponseJson<ApiResponse<Record>>, ApiError> {
    let created = state.detail_service().create(&table, payload).await?;
    Ok(ResponseJson(ApiResponse::success(created)))
}

pub async fn blank_record(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ResponseJson<ApiResponse<DetailView>>, ApiError> {
    let nav = parse_nav(&params)?;
    let view = state.detail_service().blank(&table, nav.as_ref())?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

pub async fn get_record(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> Result<ResponseJson<ApiResponse<DetailView>>, ApiError> {
    let view = state.detail_service().detail(&table, &id).await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

pub async fn update_record(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    axum::Json(payload): axum::Json<Record>,
) -> Result<ResponseJson<ApiResponse<Record>>, ApiError> {
    let updated = state.detail_service().update(&table, &id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.detail_service().delete(&table, &id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/tables/{table}/records",
        Router::new()
            .route("/", get(list_records).post(create_record))
            .route("/new", get(blank_record))
            .route(
                "/{id}",
                get(get_record).put(update_record).delete(delete_record),
            ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::FieldSchema;
    use serde_json::json;

    fn customers() -> TableSchema {
        TableSchema {
            name: "customers".into(),
            label: "Customers".into(),
            primary_key: "id".into(),
            label_field: "name".into(),
            fields: vec![
                FieldSchema::new("id", "Id", FieldType::Integer).read_only(),
                FieldSchema::new("name", "Name", FieldType::Text).required(),
                FieldSchema::new("age", "Age", FieldType::Integer),
                FieldSchema::new("active", "Active", FieldType::Boolean),
            ],
        }
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_coerce_value_per_column_type() {
        let schema = customers();
        assert_eq!(coerce_value(&schema, "age", "42"), json!(42));
        assert_eq!(coerce_value(&schema, "active", "true"), json!(true));
        assert_eq!(coerce_value(&schema, "active", "0"), json!(false));
        assert_eq!(coerce_value(&schema, "name", "42"), json!("42"));
        // unparseable values stay strings so the error names the column
        assert_eq!(coerce_value(&schema, "age", "old"), json!("old"));
    }

    #[test]
    fn test_parse_list_params_filters_and_paging() {
        let config = Config::default();
        let schema = customers();
        let (query, search) = parse_list_params(
            &config,
            &schema,
            &params(&[
                ("filter[age]", "30"),
                ("match[name]", "ad"),
                ("order_by", "name"),
                ("desc", "1"),
                ("limit", "10"),
                ("offset", "20"),
                ("search", "lon"),
            ]),
        )
        .unwrap();

        assert_eq!(query.filters.len(), 2);
        assert_eq!(query.filters[0].field, "age");
        assert_eq!(query.filters[0].op, FilterOp::Eq);
        assert_eq!(query.filters[0].value, json!(30));
        assert_eq!(query.filters[1].op, FilterOp::ILike);
        assert_eq!(query.order_by.as_deref(), Some("name"));
        assert!(query.descending);
        assert_eq!(query.limit, 10);
        assert_eq!(query.offset, 20);
        assert_eq!(search.as_deref(), Some("lon"));
    }

    #[test]
    fn test_parse_list_params_clamps_limit() {
        let config = Config::default();
        let schema = customers();
        let (query, _) =
            parse_list_params(&config, &schema, &params(&[("limit", "99999")])).unwrap();
        assert_eq!(query.limit, config.max_page_size);

        let err = parse_list_params(&config, &schema, &params(&[("limit", "lots")])).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_parse_nav_all_or_nothing() {
        assert!(parse_nav(&params(&[])).unwrap().is_none());

        let nav = parse_nav(&params(&[
            ("parent_table", "customers"),
            ("parent_field", "customer_id"),
            ("parent_id", "7"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(nav.parent_table, "customers");

        let err = parse_nav(&params(&[("parent_table", "customers")])).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
