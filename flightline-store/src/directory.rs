use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use flightline_core::booking::{Instructor, Profile, Resource};
use flightline_core::store::{DataSource, Filter, ListQuery, StoreError, INSTRUCTORS, PROFILES, RESOURCES};

/// Read-only lookup of bookable resources.
#[derive(Clone)]
pub struct ResourceDirectory {
    source: Arc<dyn DataSource>,
}

impl ResourceDirectory {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    pub async fn list_all(&self) -> Result<Vec<Resource>, StoreError> {
        let page = self.source.list(RESOURCES, &ListQuery::new()).await?;
        page.data.into_iter().map(decode::<Resource>).collect()
    }
}

/// Read-only lookup of instructors and their display names.
#[derive(Clone)]
pub struct InstructorDirectory {
    source: Arc<dyn DataSource>,
}

impl InstructorDirectory {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    pub async fn list_all(&self) -> Result<Vec<Instructor>, StoreError> {
        let page = self.source.list(INSTRUCTORS, &ListQuery::new()).await?;
        page.data.into_iter().map(decode::<Instructor>).collect()
    }

    /// Resolves an instructor to "first last" through the linked profile.
    pub async fn display_name(&self, instructor_id: Uuid) -> Result<String, StoreError> {
        let query = ListQuery::new().filter(Filter::eq("id", instructor_id.to_string()));
        let page = self.source.list(INSTRUCTORS, &query).await?;
        let instructor: Instructor = page
            .data
            .into_iter()
            .next()
            .map(decode)
            .transpose()?
            .ok_or_else(|| StoreError::NotFound(instructor_id.to_string()))?;

        let query = ListQuery::new().filter(Filter::eq("id", instructor.profile_id.to_string()));
        let page = self.source.list(PROFILES, &query).await?;
        let profile: Profile = page
            .data
            .into_iter()
            .next()
            .map(decode)
            .transpose()?
            .ok_or_else(|| StoreError::NotFound(instructor.profile_id.to_string()))?;

        Ok(profile.display_name())
    }
}

fn decode<T: serde::de::DeserializeOwned>(record: Value) -> Result<T, StoreError> {
    serde_json::from_value(record).map_err(|e| StoreError::Malformed(e.to_string()))
}
