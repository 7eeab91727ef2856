// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Domain Events
//
// Two delivery paths:
// - subscribed handlers, keyed by event name and awaited one after another in
//   subscription order; a failing handler aborts the rest of that publish
// - passive observers on a tokio broadcast channel, fed only after every
//   handler succeeded (CLI summaries, test observers)
//
// In-memory only: events are lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use metrics::counter;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::error::KernelError;
use crate::domain::events::{DomainEvent, EventBus, EventContext, EventHandler};

/// An event as seen by passive observers, with its publishing context.
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub context: EventContext,
    pub event: DomainEvent,
}

pub struct InMemoryEventBus {
    handlers: RwLock<HashMap<String, Vec<EventHandler>>>,
    observers: broadcast::Sender<PublishedEvent>,
}

impl InMemoryEventBus {
    /// Capacity bounds how many events each observer buffers before the
    /// oldest are dropped.
    pub fn new(observer_capacity: usize) -> Self {
        let (observers, _) = broadcast::channel(observer_capacity.max(1));
        Self {
            handlers: RwLock::new(HashMap::new()),
            observers,
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    /// Subscribe to every successfully handled event.
    pub fn observe(&self) -> EventObserver {
        EventObserver {
            receiver: self.observers.subscribe(),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.receiver_count()
    }

    pub fn handler_count(&self, event_name: &str) -> usize {
        self.handlers
            .read()
            .get(event_name)
            .map_or(0, Vec::len)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, ctx: &EventContext, event: DomainEvent) -> Result<(), KernelError> {
        // Cloned so that no lock is held while handlers run.
        let handlers = self
            .handlers
            .read()
            .get(&event.name)
            .cloned()
            .unwrap_or_default();

        for handler in &handlers {
            handler(ctx.clone(), event.clone()).await?;
        }

        info!(
            trace_id = %ctx.trace_id,
            event = %event.name,
            handlers = handlers.len(),
            "Event published"
        );
        counter!("tessera_events_published_total", "event" => event.name.clone()).increment(1);

        if self
            .observers
            .send(PublishedEvent {
                context: ctx.clone(),
                event,
            })
            .is_err()
        {
            debug!("No observers listening to event");
        }
        Ok(())
    }

    fn subscribe(&self, event_name: &str, handler: EventHandler) {
        self.handlers
            .write()
            .entry(event_name.to_string())
            .or_default()
            .push(handler);
        debug!(event = event_name, "Handler subscribed");
    }
}

/// Receiver for passively observed events
pub struct EventObserver {
    receiver: broadcast::Receiver<PublishedEvent>,
}

impl EventObserver {
    /// Receive the next event (waits until one is available)
    pub async fn recv(&mut self) -> Result<PublishedEvent, EventBusError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => EventBusError::Closed,
            broadcast::error::RecvError::Lagged(n) => {
                warn!("Event observer lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }

    /// Try to receive an event without waiting
    pub fn try_recv(&mut self) -> Result<PublishedEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event observer lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }

    /// Everything currently buffered, oldest first.
    pub fn drain(&mut self) -> Vec<PublishedEvent> {
        let mut events = Vec::new();
        loop {
            match self.try_recv() {
                Ok(event) => events.push(event),
                Err(EventBusError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        events
    }
}

/// Errors that can occur when receiving observed events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Observer lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::event_handler;
    use crate::domain::trust::TrustLevel;
    use chrono::Utc;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn ctx() -> EventContext {
        EventContext {
            trace_id: "trace-1".to_string(),
            trust_level: TrustLevel::WriteAuthorized,
            principal: None,
        }
    }

    fn event(name: &str) -> DomainEvent {
        DomainEvent::new(name, Utc::now(), serde_json::json!({}))
    }

    fn recording(log: &Arc<Mutex<Vec<String>>>, tag: &str, fail: bool) -> EventHandler {
        let log = log.clone();
        let tag = tag.to_string();
        event_handler(move |_ctx, _event| {
            let log = log.clone();
            let tag = tag.clone();
            async move {
                log.lock().push(tag.clone());
                if fail {
                    Err(KernelError::business_rule(format!("{tag} failed")))
                } else {
                    Ok(())
                }
            }
        })
    }

    #[tokio::test]
    async fn test_handlers_run_in_subscription_order() {
        let bus = InMemoryEventBus::new(8);
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe("OrderPlaced", recording(&log, "first", false));
        bus.subscribe("OrderPlaced", recording(&log, "second", false));
        bus.subscribe("Other", recording(&log, "other", false));

        bus.publish(&ctx(), event("OrderPlaced")).await.unwrap();

        assert_eq!(*log.lock(), vec!["first", "second"]);
        assert_eq!(bus.handler_count("OrderPlaced"), 2);
    }

    #[tokio::test]
    async fn test_failing_handler_aborts_remaining_handlers() {
        let bus = InMemoryEventBus::new(8);
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe("OrderPlaced", recording(&log, "first", true));
        bus.subscribe("OrderPlaced", recording(&log, "second", false));
        let mut observer = bus.observe();

        let err = bus.publish(&ctx(), event("OrderPlaced")).await.unwrap_err();

        assert_eq!(err.to_string(), "first failed");
        assert_eq!(*log.lock(), vec!["first"]);
        assert!(matches!(observer.try_recv(), Err(EventBusError::Empty)));
    }

    #[tokio::test]
    async fn test_observers_receive_published_events() {
        let bus = InMemoryEventBus::new(8);
        let mut observer = bus.observe();
        assert_eq!(bus.observer_count(), 1);

        bus.publish(&ctx(), event("A")).await.unwrap();
        bus.publish(&ctx(), event("B")).await.unwrap();

        let first = observer.recv().await.unwrap();
        assert_eq!(first.event.name, "A");
        assert_eq!(first.context.trace_id, "trace-1");
        let rest: Vec<_> = observer.drain().into_iter().map(|p| p.event.name).collect();
        assert_eq!(rest, vec!["B"]);
    }
}
