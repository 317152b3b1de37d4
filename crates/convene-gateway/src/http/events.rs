//! REST surface for the event registry.
//!
//! The transport layer deserializes caller payloads into mutations, hands
//! them to the store, and maps store errors onto response codes. Every
//! committed mutation is handed to the dispatcher in a spawned task, so
//! slow observers never sit in the request path.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use convene_store::{ApplyOutcome, Event, Mutation, StoreError};

use crate::app::AppState;

/// Full-replace update payload. `date_time` is the inbound name for the
/// replacement timestamp; reads serialize it back as `scheduled_at`.
#[derive(Debug, Deserialize)]
pub struct EventUpdate {
    pub title: String,
    pub organizer: String,
    pub date_time: DateTime<Utc>,
    pub location: String,
}

/// Identity payload for join, leave and cancel.
#[derive(Debug, Deserialize)]
pub struct UserAction {
    pub user: String,
}

#[derive(Serialize)]
pub struct EventList {
    pub events: Vec<Event>,
}

/// GET /api/events
pub async fn list_events(State(state): State<Arc<AppState>>) -> Json<EventList> {
    Json(EventList {
        events: state.store.get_all(),
    })
}

/// POST /api/events/{id}/update
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(body): Json<EventUpdate>,
) -> Result<Json<Event>, ApiError> {
    mutate(
        &state,
        id,
        Mutation::Update {
            title: body.title,
            organizer: body.organizer,
            scheduled_at: body.date_time,
            location: body.location,
        },
    )
}

/// POST /api/events/{id}/join
pub async fn join_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(body): Json<UserAction>,
) -> Result<Json<Event>, ApiError> {
    mutate(&state, id, Mutation::Join { user: body.user })
}

/// POST /api/events/{id}/leave
pub async fn leave_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(body): Json<UserAction>,
) -> Result<Json<Event>, ApiError> {
    mutate(&state, id, Mutation::Leave { user: body.user })
}

/// POST /api/events/{id}/cancel
pub async fn cancel_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(body): Json<UserAction>,
) -> Result<Json<Event>, ApiError> {
    mutate(&state, id, Mutation::Cancel { user: body.user })
}

/// Apply one mutation and, when it committed, hand the snapshot to the
/// dispatcher. Idempotent no-ops return the unchanged snapshot and skip
/// the broadcast entirely.
fn mutate(state: &Arc<AppState>, id: u64, mutation: Mutation) -> Result<Json<Event>, ApiError> {
    let ApplyOutcome { event, committed } = state.store.apply(id, &mutation)?;
    if committed {
        let publisher = state.publisher.clone();
        let snapshot = event.clone();
        tokio::spawn(async move { publisher.publish(&snapshot).await });
    }
    Ok(Json(event))
}

/// Store error ready to leave as an HTTP response.
#[derive(Debug)]
pub struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            StoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = Json(json!({
            "code": self.0.code(),
            "error": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
