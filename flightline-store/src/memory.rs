use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use flightline_core::store::{
    DataSource, Filter, FilterOp, ListPage, ListQuery, StoreError, BOOKINGS, INSTRUCTORS,
    PROFILES, RESOURCES,
};

/// In-memory data source backing the development service and tests.
///
/// Collections hold flat JSON records. Reads take the shared lock,
/// mutations the exclusive one. Records created without an `id` get a
/// generated v4 UUID; a provided `id` is kept, which seeding relies on.
pub struct MemoryDataSource {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        let mut collections = HashMap::new();
        for name in [BOOKINGS, RESOURCES, INSTRUCTORS, PROFILES] {
            collections.insert(name.to_string(), Vec::new());
        }
        Self {
            collections: RwLock::new(collections),
        }
    }
}

impl Default for MemoryDataSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn list(&self, resource: &str, query: &ListQuery) -> Result<ListPage, StoreError> {
        let collections = self.collections.read().await;
        let records = collections
            .get(resource)
            .ok_or_else(|| StoreError::UnknownResource(resource.to_string()))?;

        let mut data: Vec<Value> = records
            .iter()
            .filter(|record| query.filters.iter().all(|f| matches_filter(record, f)))
            .cloned()
            .collect();

        // Total counts the filtered set before pagination.
        let total = data.len() as u64;

        if !query.sort.is_empty() {
            data.sort_by(|a, b| compare_records(a, b, query));
        }

        if let Some(page) = &query.page {
            let start = (page.current.max(1) - 1).saturating_mul(page.page_size) as usize;
            data = data
                .into_iter()
                .skip(start)
                .take(page.page_size as usize)
                .collect();
        }

        Ok(ListPage { data, total })
    }

    async fn create(&self, resource: &str, values: Value) -> Result<Value, StoreError> {
        let mut record = match values {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::Malformed(format!(
                    "expected a JSON object, got {}",
                    other
                )))
            }
        };

        if record.get("id").map_or(true, Value::is_null) {
            record.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        let record = Value::Object(record);

        let mut collections = self.collections.write().await;
        let records = collections
            .get_mut(resource)
            .ok_or_else(|| StoreError::UnknownResource(resource.to_string()))?;
        records.push(record.clone());

        tracing::debug!(resource, "record created");
        Ok(record)
    }

    async fn update(&self, resource: &str, id: Uuid, values: Value) -> Result<Value, StoreError> {
        let patch = values
            .as_object()
            .ok_or_else(|| StoreError::Malformed("update body must be a JSON object".to_string()))?
            .clone();

        let mut collections = self.collections.write().await;
        let records = collections
            .get_mut(resource)
            .ok_or_else(|| StoreError::UnknownResource(resource.to_string()))?;

        let record = records
            .iter_mut()
            .find(|record| has_id(record, id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Some(existing) = record.as_object_mut() {
            // Top-level merge; the stored id wins.
            for (key, value) in patch {
                if key != "id" {
                    existing.insert(key, value);
                }
            }
        }

        Ok(record.clone())
    }

    async fn delete(&self, resource: &str, id: Uuid) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let records = collections
            .get_mut(resource)
            .ok_or_else(|| StoreError::UnknownResource(resource.to_string()))?;

        let before = records.len();
        records.retain(|record| !has_id(record, id));
        if records.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }

        tracing::debug!(resource, %id, "record deleted");
        Ok(())
    }
}

fn has_id(record: &Value, id: Uuid) -> bool {
    record
        .get("id")
        .and_then(Value::as_str)
        .map(|raw| raw == id.to_string())
        .unwrap_or(false)
}

fn matches_filter(record: &Value, filter: &Filter) -> bool {
    let field_value = record.get(&filter.field).unwrap_or(&Value::Null);
    match filter.op {
        FilterOp::Eq => values_equal(field_value, &filter.value),
        FilterOp::Ne => !values_equal(field_value, &filter.value),
        FilterOp::Gt => matches_ordering(field_value, &filter.value, Ordering::is_gt),
        FilterOp::Gte => matches_ordering(field_value, &filter.value, Ordering::is_ge),
        FilterOp::Lt => matches_ordering(field_value, &filter.value, Ordering::is_lt),
        FilterOp::Lte => matches_ordering(field_value, &filter.value, Ordering::is_le),
        FilterOp::In => filter
            .value
            .as_array()
            .map(|options| options.iter().any(|v| values_equal(field_value, v)))
            .unwrap_or(false),
    }
}

fn matches_ordering(a: &Value, b: &Value, accept: fn(Ordering) -> bool) -> bool {
    compare_values(a, b).map(accept).unwrap_or(false)
}

/// Equality tolerant of the wire round-trip, where every filter value
/// arrives as text: values are equal when their JSON forms match or their
/// textual renderings do.
fn values_equal(a: &Value, b: &Value) -> bool {
    a == b || render_value(a) == render_value(b)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Ordered comparison across the value shapes the collections hold:
/// RFC 3339 instants when both operands parse as timestamps, numbers when
/// both are numeric, otherwise lexicographic on strings.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_instant(a), as_instant(b)) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y);
    }
    if let (Value::String(x), Value::String(y)) = (a, b) {
        return Some(x.cmp(y));
    }
    None
}

fn as_instant(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

fn compare_records(a: &Value, b: &Value, query: &ListQuery) -> Ordering {
    for order in &query.sort {
        let av = a.get(&order.field).unwrap_or(&Value::Null);
        let bv = b.get(&order.field).unwrap_or(&Value::Null);
        let mut ord = compare_values(av, bv).unwrap_or(Ordering::Equal);
        if order.descending {
            ord = ord.reverse();
        }
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
