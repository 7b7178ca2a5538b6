use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use flightline_core::booking::Booking;
use flightline_core::store::{DataSource, Filter, ListQuery, StoreError, BOOKINGS};

/// Typed facade over the `bookings` collection.
///
/// The store owns the timestamp stamping: `create` drops any caller-supplied
/// id and stamps both timestamps, `update` re-stamps `updated_at` only.
#[derive(Clone)]
pub struct BookingStore {
    source: Arc<dyn DataSource>,
}

impl BookingStore {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    pub async fn list_all(&self) -> Result<Vec<Booking>, StoreError> {
        let page = self.source.list(BOOKINGS, &ListQuery::new()).await?;
        page.data.into_iter().map(decode).collect()
    }

    /// Current-or-future bookings of one member, the members front page
    /// query: `profile_id eq` + `start_time gte after`.
    pub async fn upcoming_for(
        &self,
        profile_id: Uuid,
        after: DateTime<Utc>,
    ) -> Result<Vec<Booking>, StoreError> {
        let query = ListQuery::new()
            .filter(Filter::eq("profile_id", profile_id.to_string()))
            .filter(Filter::gte("start_time", after.to_rfc3339()));
        let page = self.source.list(BOOKINGS, &query).await?;
        page.data.into_iter().map(decode).collect()
    }

    pub async fn create(&self, draft: &Booking) -> Result<Booking, StoreError> {
        let now = Utc::now();
        let mut record = draft.clone();
        record.id = None;
        record.created_at = Some(now);
        record.updated_at = Some(now);

        let created = self.source.create(BOOKINGS, encode(&record)?).await?;
        let created = decode(created)?;
        tracing::info!(booking_id = ?created.id, resource_id = %created.resource_id, "booking created");
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, booking: &Booking) -> Result<Booking, StoreError> {
        let mut record = booking.clone();
        record.id = None; // the path carries the id
        record.updated_at = Some(Utc::now());

        let mut patch = encode(&record)?;
        // Absent keys survive the store's top-level merge, so a cleared
        // optional field has to travel as an explicit null.
        if let Some(values) = patch.as_object_mut() {
            for field in ["title", "notes", "instructor_id", "flight_type"] {
                values.entry(field).or_insert(Value::Null);
            }
        }

        let updated = self.source.update(BOOKINGS, id, patch).await?;
        let updated = decode(updated)?;
        tracing::info!(booking_id = %id, "booking updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.source.delete(BOOKINGS, id).await?;
        tracing::info!(booking_id = %id, "booking deleted");
        Ok(())
    }
}

fn encode(booking: &Booking) -> Result<Value, StoreError> {
    serde_json::to_value(booking).map_err(|e| StoreError::Malformed(e.to_string()))
}

fn decode(record: Value) -> Result<Booking, StoreError> {
    serde_json::from_value(record).map_err(|e| StoreError::Malformed(e.to_string()))
}
