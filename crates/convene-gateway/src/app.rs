use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use convene_core::config::ConveneConfig;
use convene_store::EventStore;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::ws::publish::EventPublisher;
use crate::ws::registry::SubscriberRegistry;

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: ConveneConfig,
    pub store: EventStore,
    pub subscribers: Arc<SubscriberRegistry>,
    pub publisher: EventPublisher,
}

impl AppState {
    pub fn new(config: ConveneConfig, store: EventStore) -> Self {
        let subscribers = Arc::new(SubscriberRegistry::new());
        let publisher = EventPublisher::new(Arc::clone(&subscribers));
        Self {
            config,
            store,
            subscribers,
            publisher,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/api/events", get(crate::http::events::list_events))
        .route(
            "/api/events/{id}/update",
            post(crate::http::events::update_event),
        )
        .route(
            "/api/events/{id}/join",
            post(crate::http::events::join_event),
        )
        .route(
            "/api/events/{id}/leave",
            post(crate::http::events::leave_event),
        )
        .route(
            "/api/events/{id}/cancel",
            post(crate::http::events::cancel_event),
        )
        .route("/ws", get(crate::ws::connection::ws_handler))
        .with_state(state)
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Allow the configured frontend origin to call the API with credentials.
fn cors_layer(config: &ConveneConfig) -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    match config.gateway.frontend_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(e) => {
            warn!(
                origin = %config.gateway.frontend_origin,
                error = %e,
                "invalid frontend origin, cross-origin requests will be refused"
            );
        }
    }
    cors
}
