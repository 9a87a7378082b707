use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::Stream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::main_lib::AppState;

/// Streams domain events to the activity feed as server-sent events. A
/// client that falls behind the broadcast buffer misses the skipped events
/// and keeps receiving from the current position.
async fn subscribe_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => match Event::default().json_data(&event) {
            Ok(sse_event) => Some(Ok(sse_event)),
            Err(err) => {
                tracing::warn!("Failed to serialize domain event for SSE: {err}");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!("SSE subscriber lagged, skipped {skipped} events");
            None
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/events", get(subscribe_events))
}
