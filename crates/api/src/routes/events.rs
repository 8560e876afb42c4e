//! Live order updates over Server-Sent Events.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use common::BuyerId;
use event_store::EventStore;
use futures_util::Stream;
use tokio::sync::broadcast::error::RecvError;

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /buyers/{buyer_id}/events
///
/// Opens a live session. Each order change for the buyer arrives as an
/// `orderUpdated` event; nothing sent before the session opened is replayed.
#[tracing::instrument(skip(state))]
pub async fn stream<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(buyer_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let buyer_id: BuyerId = parse_id(&buyer_id, "buyer_id")?;
    let rx = state.sessions.subscribe(buyer_id).await;
    tracing::info!(%buyer_id, "live session opened");

    let updates = futures_util::stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(update) => {
                    let event = Event::default().event("orderUpdated").json_data(&update);
                    return Some((event, rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%buyer_id, skipped, "live session lagged, updates skipped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(updates).keep_alive(KeepAlive::default()))
}
