use std::net::SocketAddr;
use std::sync::Arc;

use flightline_api::{app, AppState};
use flightline_core::identity::Identity;
use flightline_store::MemoryDataSource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "flightline_api=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = flightline_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Flightline data service on port {}", config.server.port);

    let source = Arc::new(MemoryDataSource::new());
    if config.server.seed_demo {
        flightline_api::seed::seed_demo(&source, config.identity.profile_id)
            .await
            .expect("Failed to seed demo fixtures");
    }

    let app_state = AppState {
        source,
        identity: Identity::new(config.identity.profile_id),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
