use crate::models::Caller;
use crate::state::AppState;
use crate::streamer::{event_stream, StreamEvent, StreamSettings};
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;

/// GET /mcp/sse - live `unread_snapshot` / `tool_call` / `heartbeat` events.
pub async fn stream_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let settings = StreamSettings::from_config(&state.config);
    let events = event_stream(
        state.service.clone(),
        caller,
        settings,
        state.shutdown_receiver(),
    )
    .map(|event| Ok(to_sse(event)));
    Sse::new(events)
}

fn to_sse(event: StreamEvent) -> Event {
    let sse = Event::default()
        .event(event.name())
        .data(event.data().to_string());
    match event.id() {
        Some(id) => sse.id(id),
        None => sse,
    }
}
