use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use flightline_core::identity::{Identity, IdentityProvider};
use flightline_core::store::{DataSource, Filter, ListPage, ListQuery, StoreError};

use crate::app_config::StoreConfig;

/// Data source speaking the REST dialect over HTTP:
///
/// ```text
/// GET    /v1/{resource}?filter={field}.{op}.{value}&order={field}.{asc|desc}&page=N&page_size=M
/// POST   /v1/{resource}
/// PATCH  /v1/{resource}/{id}
/// DELETE /v1/{resource}/{id}
/// GET    /v1/identity
/// ```
///
/// When an api key is configured it is sent both as an `apikey` header and
/// as a bearer token, the way the club's hosted data provider authenticates.
#[derive(Clone)]
pub struct RestDataSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestDataSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        let source = Self::new(&config.base_url);
        match &config.api_key {
            Some(key) => source.with_api_key(key),
            None => source,
        }
    }

    fn collection_url(&self, resource: &str) -> String {
        format!("{}/v1/{}", self.base_url, resource)
    }

    fn record_url(&self, resource: &str, id: Uuid) -> String {
        format!("{}/v1/{}/{}", self.base_url, resource, id)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl DataSource for RestDataSource {
    async fn list(&self, resource: &str, query: &ListQuery) -> Result<ListPage, StoreError> {
        let request = self
            .apply_auth(self.client.get(self.collection_url(resource)))
            .query(&encode_query(query));
        let response = request.send().await.map_err(transport)?;
        let response = check_status(response).await?;
        response
            .json::<ListPage>()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))
    }

    async fn create(&self, resource: &str, values: Value) -> Result<Value, StoreError> {
        let request = self
            .apply_auth(self.client.post(self.collection_url(resource)))
            .json(&values);
        let response = request.send().await.map_err(transport)?;
        let response = check_status(response).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))
    }

    async fn update(&self, resource: &str, id: Uuid, values: Value) -> Result<Value, StoreError> {
        let request = self
            .apply_auth(self.client.patch(self.record_url(resource, id)))
            .json(&values);
        let response = request.send().await.map_err(transport)?;
        let response = check_status(response).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))
    }

    async fn delete(&self, resource: &str, id: Uuid) -> Result<(), StoreError> {
        let request = self.apply_auth(self.client.delete(self.record_url(resource, id)));
        let response = request.send().await.map_err(transport)?;
        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for RestDataSource {
    async fn current_identity(&self) -> Result<Identity, StoreError> {
        let url = format!("{}/v1/identity", self.base_url);
        let response = self
            .apply_auth(self.client.get(url))
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;
        response
            .json::<Identity>()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound(detail));
    }
    Err(StoreError::Rejected {
        status: status.as_u16(),
        detail,
    })
}

fn encode_query(query: &ListQuery) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    for filter in &query.filters {
        pairs.push(("filter", encode_filter(filter)));
    }
    for order in &query.sort {
        let direction = if order.descending { "desc" } else { "asc" };
        pairs.push(("order", format!("{}.{}", order.field, direction)));
    }
    if let Some(page) = &query.page {
        pairs.push(("page", page.current.to_string()));
        pairs.push(("page_size", page.page_size.to_string()));
    }
    pairs
}

fn encode_filter(filter: &Filter) -> String {
    format!(
        "{}.{}.{}",
        filter.field,
        filter.op.as_str(),
        encode_value(&filter.value)
    )
}

fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(encode_value)
                .collect::<Vec<String>>()
                .join(",");
            format!("({})", joined)
        }
        other => other.to_string(),
    }
}
