//! Domain event sink trait and implementations.

use std::sync::{Arc, Mutex};

use super::DomainEvent;

/// Trait for receiving domain events.
///
/// Core services emit events through this trait after the ledger write has
/// committed. Emission is best-effort: the ledger is authoritative, and a
/// sink failure must never roll back a committed mutation.
///
/// Implementations must keep `emit()` fast and non-blocking (no network
/// calls, no DB writes) and queue events for async processing.
pub trait DomainEventSink: Send + Sync {
    /// Emit a single domain event.
    fn emit(&self, event: DomainEvent);

    /// Emit multiple domain events.
    ///
    /// Default implementation calls `emit()` for each event.
    fn emit_batch(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

/// No-op implementation for tests or contexts that don't need events.
#[derive(Clone, Default)]
pub struct NoOpDomainEventSink;

impl DomainEventSink for NoOpDomainEventSink {
    fn emit(&self, _event: DomainEvent) {
        // Intentionally empty - events are discarded
    }
}

/// Mock sink for testing - collects emitted events.
#[derive(Clone, Default)]
pub struct MockDomainEventSink {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl MockDomainEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Clears collected events.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Returns the number of collected events.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Returns true if no events have been collected.
    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

impl DomainEventSink for MockDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_sink_does_not_panic() {
        let sink = NoOpDomainEventSink;
        sink.emit(DomainEvent::goals_changed(vec!["g1".to_string()]));
        sink.emit_batch(vec![
            DomainEvent::goals_changed(vec!["g2".to_string()]),
            DomainEvent::goals_changed(vec!["g3".to_string()]),
        ]);
    }

    #[test]
    fn test_mock_sink_collects_events() {
        let sink = MockDomainEventSink::new();
        assert!(sink.is_empty());

        sink.emit(DomainEvent::goals_changed(vec!["g1".to_string()]));
        assert_eq!(sink.len(), 1);

        sink.emit_batch(vec![
            DomainEvent::goals_changed(vec!["g2".to_string()]),
            DomainEvent::goals_changed(vec!["g3".to_string()]),
        ]);
        assert_eq!(sink.len(), 3);

        sink.clear();
        assert!(sink.is_empty());
    }
}
