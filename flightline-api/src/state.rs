use std::sync::Arc;

use flightline_core::identity::Identity;
use flightline_store::MemoryDataSource;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<MemoryDataSource>,
    pub identity: Identity,
}
