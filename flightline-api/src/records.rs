use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde_json::Value;
use uuid::Uuid;

use flightline_core::identity::Identity;
use flightline_core::store::{
    DataSource, Filter, FilterOp, ListPage, ListQuery, Pagination, SortOrder,
};

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/identity", get(current_identity))
        .route("/v1/{resource}", get(list_records).post(create_record))
        .route(
            "/v1/{resource}/{id}",
            patch(update_record).delete(delete_record),
        )
}

/// GET /v1/identity
async fn current_identity(State(state): State<AppState>) -> Json<Identity> {
    Json(state.identity)
}

/// GET /v1/{resource}?filter={field}.{op}.{value}&order={field}.{asc|desc}&page=N&page_size=M
async fn list_records(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ListPage>, ApiError> {
    let query = parse_query(&params)?;
    let page = state
        .source
        .list(&resource, &query)
        .await
        .map_err(ApiError::store)?;
    Ok(Json(page))
}

/// POST /v1/{resource}
async fn create_record(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Json(values): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let record = state
        .source
        .create(&resource, values)
        .await
        .map_err(ApiError::store)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PATCH /v1/{resource}/{id}
async fn update_record(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, Uuid)>,
    Json(values): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let record = state
        .source
        .update(&resource, id, values)
        .await
        .map_err(ApiError::store)?;
    Ok(Json(record))
}

/// DELETE /v1/{resource}/{id}
async fn delete_record(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state
        .source
        .delete(&resource, id)
        .await
        .map_err(ApiError::store)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Parses the repeated `filter`/`order` parameters and the page selection
/// into a [`ListQuery`]. A malformed clause is a 400.
fn parse_query(params: &[(String, String)]) -> Result<ListQuery, ApiError> {
    let mut query = ListQuery::new();
    let mut page = None;
    let mut page_size = None;

    for (key, raw) in params {
        match key.as_str() {
            "filter" => query.filters.push(parse_filter(raw)?),
            "order" => query.sort.push(parse_order(raw)?),
            "page" => page = Some(parse_number(raw)?),
            "page_size" => page_size = Some(parse_number(raw)?),
            other => {
                return Err(ApiError::BadRequest(format!(
                    "unknown query parameter: {}",
                    other
                )))
            }
        }
    }

    if page.is_some() || page_size.is_some() {
        query.page = Some(Pagination {
            current: page.unwrap_or(1),
            page_size: page_size.unwrap_or(50),
        });
    }
    Ok(query)
}

fn parse_filter(raw: &str) -> Result<Filter, ApiError> {
    let mut parts = raw.splitn(3, '.');
    let (field, op, value) = match (parts.next(), parts.next(), parts.next()) {
        (Some(field), Some(op), Some(value)) if !field.is_empty() => (field, op, value),
        _ => {
            return Err(ApiError::BadRequest(format!(
                "malformed filter: {} (expected field.op.value)",
                raw
            )))
        }
    };
    let op = FilterOp::parse(op)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown filter operator: {}", op)))?;
    Ok(Filter::new(field, op, decode_value(op, value)))
}

/// `in` encodes its options as `(v1,v2,...)`; every other operator carries
/// a single textual value.
fn decode_value(op: FilterOp, raw: &str) -> Value {
    if op == FilterOp::In {
        let inner = raw
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(raw);
        return Value::Array(
            inner
                .split(',')
                .filter(|option| !option.is_empty())
                .map(|option| Value::String(option.to_string()))
                .collect(),
        );
    }
    Value::String(raw.to_string())
}

fn parse_order(raw: &str) -> Result<SortOrder, ApiError> {
    let (field, direction) = raw.rsplit_once('.').ok_or_else(|| {
        ApiError::BadRequest(format!("malformed order: {} (expected field.asc|desc)", raw))
    })?;
    let descending = match direction {
        "asc" => false,
        "desc" => true,
        other => {
            return Err(ApiError::BadRequest(format!(
                "unknown sort direction: {}",
                other
            )))
        }
    };
    Ok(SortOrder {
        field: field.to_string(),
        descending,
    })
}

fn parse_number(raw: &str) -> Result<u64, ApiError> {
    raw.parse::<u64>()
        .map_err(|_| ApiError::BadRequest(format!("not a page number: {}", raw)))
}
