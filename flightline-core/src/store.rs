use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Collection names served by the data source.
pub const BOOKINGS: &str = "bookings";
pub const RESOURCES: &str = "resources";
pub const INSTRUCTORS: &str = "instructors";
pub const PROFILES: &str = "profiles";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown collection: {0}")]
    UnknownResource(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("store rejected the request ({status}): {detail}")]
    Rejected { status: u16, detail: String },
}

/// Filter operators understood by the data source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::In => "in",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "eq" => Some(FilterOp::Eq),
            "ne" => Some(FilterOp::Ne),
            "gt" => Some(FilterOp::Gt),
            "gte" => Some(FilterOp::Gte),
            "lt" => Some(FilterOp::Lt),
            "lte" => Some(FilterOp::Lte),
            "in" => Some(FilterOp::In),
            _ => None,
        }
    }
}

/// A single field predicate. `In` expects `value` to be a JSON array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Gte, value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: String,
    pub descending: bool,
}

impl SortOrder {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// 1-based page selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    pub current: u64,
    pub page_size: u64,
}

/// Filters, sort orders and pagination for a `list` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    pub sort: Vec<SortOrder>,
    pub page: Option<Pagination>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn sort(mut self, order: SortOrder) -> Self {
        self.sort.push(order);
        self
    }

    pub fn paginate(mut self, current: u64, page_size: u64) -> Self {
        self.page = Some(Pagination { current, page_size });
        self
    }
}

/// One page of raw records. `total` counts the filtered set before
/// pagination is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPage {
    pub data: Vec<Value>,
    pub total: u64,
}

/// The generic resource-oriented data-access contract the engine consumes.
///
/// Collections hold flat JSON records keyed by a string `id` (a UUID on
/// every backend this engine talks to). `update` merges the given values
/// into the stored record at the top level.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn list(&self, resource: &str, query: &ListQuery) -> Result<ListPage, StoreError>;

    async fn create(&self, resource: &str, values: Value) -> Result<Value, StoreError>;

    async fn update(&self, resource: &str, id: Uuid, values: Value) -> Result<Value, StoreError>;

    async fn delete(&self, resource: &str, id: Uuid) -> Result<(), StoreError>;
}
