// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Events & Event Bus Port
//!
//! Events are recorded on a unit of work while a command runs and handed to
//! the [`EventBus`] only after every staged write has committed.
//!
//! Handlers for one event name run sequentially in subscription order. The
//! first handler error aborts the remaining handlers of that `publish` call
//! and propagates to the caller.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::domain::error::KernelError;
use crate::domain::trust::TrustLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl DomainEvent {
    pub fn new(name: impl Into<String>, timestamp: DateTime<Utc>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            timestamp,
            payload,
        }
    }

    /// Serializes a typed payload into the event body.
    pub fn with_payload<P: Serialize>(
        name: impl Into<String>,
        timestamp: DateTime<Utc>,
        payload: &P,
    ) -> Result<Self, KernelError> {
        let payload = serde_json::to_value(payload)
            .map_err(|e| KernelError::Other(anyhow::Error::new(e).context("event payload")))?;
        Ok(Self::new(name, timestamp, payload))
    }
}

/// Snapshot of the publishing trust context handed to handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    pub trace_id: String,
    pub trust_level: TrustLevel,
    pub principal: Option<String>,
}

pub type EventHandler =
    Arc<dyn Fn(EventContext, DomainEvent) -> BoxFuture<'static, Result<(), KernelError>> + Send + Sync>;

/// Wraps an async closure as an [`EventHandler`].
pub fn event_handler<F, Fut>(handler: F) -> EventHandler
where
    F: Fn(EventContext, DomainEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), KernelError>> + Send + 'static,
{
    Arc::new(move |ctx, event| Box::pin(handler(ctx, event)))
}

#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, ctx: &EventContext, event: DomainEvent) -> Result<(), KernelError>;

    fn subscribe(&self, event_name: &str, handler: EventHandler);
}
