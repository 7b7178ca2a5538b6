use axum::{http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod records;
pub mod seed;
pub mod state;

pub use state::AppState;

/// Assembles the development data service: the generic record routes under
/// `/v1`, CORS open for the browser clients the store dialect serves, and
/// request tracing.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .merge(records::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
