//! Domain events runtime bridge for the web server.
//!
//! Core services emit events through [`ServerDomainEventSink`]; the sink
//! fans them out over a broadcast channel consumed by the SSE activity feed
//! endpoint and by the notification bridge worker. Delivery is at-least-once
//! from the subscribers' point of view and never feeds back into the ledger:
//! a failed or lagging consumer is logged and dropped, the committed
//! mutation stands.

use nestfund_core::events::{DomainEvent, DomainEventSink};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Sink handed to core services; non-blocking by construction.
pub struct ServerDomainEventSink {
    tx: broadcast::Sender<DomainEvent>,
}

impl ServerDomainEventSink {
    pub fn new(tx: broadcast::Sender<DomainEvent>) -> Self {
        Self { tx }
    }
}

impl DomainEventSink for ServerDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        // send only fails when no subscriber exists, which is fine: the
        // notification bridge normally holds one open.
        if let Err(err) = self.tx.send(event) {
            tracing::debug!("Domain event dropped (no subscribers): {err}");
        }
    }
}

/// Spawns the worker that hands events to the notification collaborator.
///
/// The collaborator owns its own delivery retries; this side only logs what
/// it handed over and keeps going on failure.
pub fn start_notification_bridge(rx: broadcast::Receiver<DomainEvent>) {
    tokio::spawn(async move {
        let mut stream = BroadcastStream::new(rx);
        while let Some(result) = stream.next().await {
            match result {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(payload) => {
                        tracing::info!(target: "nestfund::notifications", "{payload}");
                    }
                    Err(err) => {
                        tracing::warn!("Failed to serialize domain event: {err}");
                    }
                },
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!("Notification bridge lagged, skipped {skipped} events");
                }
            }
        }
    });
}
