use crate::startup::AppState;
use axum::{
    extract::State,
    response::sse::{KeepAlive, Sse},
    response::IntoResponse,
};

/// Server-Sent Events stream of `newEntry` and `entriesDeleted`.
pub async fn live_updates(State(state): State<AppState>) -> impl IntoResponse {
    tracing::debug!(
        subscribers = state.notifier.subscriber_count() + 1,
        "Live update subscriber connected"
    );
    Sse::new(state.notifier.event_stream()).keep_alive(KeepAlive::default())
}
