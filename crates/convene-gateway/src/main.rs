use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{Duration, Utc};
use convene_store::{EventStore, NewEvent};
use tracing::{info, warn};

mod app;
mod http;
mod ws;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "convene_gateway=info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit CONVENE_CONFIG path > ~/.convene/convene.toml
    let config_path = std::env::var("CONVENE_CONFIG").ok();
    let config =
        convene_core::config::ConveneConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
            warn!("Config load failed ({}), using defaults", e);
            convene_core::config::ConveneConfig::default()
        });

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    let store = EventStore::new();
    seed_store(&store)?;
    info!(events = store.len(), "store seeded");

    let state = Arc::new(app::AppState::new(config, store));
    let router = app::build_router(Arc::clone(&state));

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("Convene gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

/// Starter records so a fresh process has something to list and mutate.
fn seed_store(store: &EventStore) -> anyhow::Result<()> {
    for draft in [
        NewEvent {
            title: "Event 1".to_string(),
            organizer: "User A".to_string(),
            scheduled_at: Utc::now() + Duration::days(7),
            duration: 2,
            location: "Venue A".to_string(),
        },
        NewEvent {
            title: "Event 2".to_string(),
            organizer: "User B".to_string(),
            scheduled_at: Utc::now() + Duration::days(8),
            duration: 3,
            location: "Venue B".to_string(),
        },
    ] {
        store.create(draft)?;
    }
    Ok(())
}
