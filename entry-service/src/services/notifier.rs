//! Live update fan-out to connected browsers.

use crate::models::LedgerEntry;
use axum::response::sse::Event;
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    NewEntry(LedgerEntry),
    EntriesDeleted(Vec<i64>),
}

impl LiveEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LiveEvent::NewEntry(_) => "newEntry",
            LiveEvent::EntriesDeleted(_) => "entriesDeleted",
        }
    }

    fn to_sse(&self) -> Result<Event, axum::Error> {
        let event = Event::default().event(self.name());
        match self {
            LiveEvent::NewEntry(entry) => event.json_data(entry),
            LiveEvent::EntriesDeleted(ids) => event.json_data(ids),
        }
    }
}

/// Broadcasts after successful writes. No replay: a subscriber only sees
/// events sent after it subscribed.
#[derive(Clone)]
pub struct LiveNotifier {
    sender: broadcast::Sender<LiveEvent>,
}

impl LiveNotifier {
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size.max(1));
        Self { sender }
    }

    /// Fire-and-forget. Having no subscribers is not an error.
    pub fn publish(&self, event: LiveEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => tracing::debug!(event = name, receivers, "Live update sent"),
            Err(_) => tracing::trace!(event = name, "No live update subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// SSE event stream for one subscriber. Lagging subscribers skip what they missed.
    pub fn event_stream(&self) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
        BroadcastStream::new(self.subscribe()).filter_map(|received| async move {
            match received {
                Ok(event) => match event.to_sse() {
                    Ok(sse) => Some(Ok(sse)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to encode live update");
                        None
                    }
                },
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Live update subscriber lagged");
                    None
                }
            }
        })
    }
}
