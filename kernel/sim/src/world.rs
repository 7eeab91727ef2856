// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Simulation World
//!
//! Binds an application's use cases to the deterministic services of one
//! run: the virtual clock, the event bus and the seeded random source.
//!
//! Intents and queries arrive as `(name, json)` pairs from scenario files and
//! are decoded into the application's closed command and query enums:
//!
//! | Input | Decoded as |
//! |-------|------------|
//! | `dispatch(actor, intent, payload)` | `{"intent": intent, "payload": payload}` → `A::Command` |
//! | `query(name, params)` | `{"query": name, "params": params}` → `A::Query` |
//!
//! Business-level failures of a dispatched command are logged and reported as
//! [`DispatchOutcome::Rejected`]; scenarios assert around them. Anything else
//! aborts the run.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tessera_core::infrastructure::{InMemoryEventBus, VirtualClock};
use tessera_core::{KernelError, SimulatedRandom};
use tracing::{info, warn};

use crate::error::SimulationError;

/// An application that can be driven by scenarios.
#[async_trait]
pub trait SimulationApp: Send + Sync {
    /// Adjacently tagged on `intent` / `payload`.
    type Command: DeserializeOwned + Send;
    /// Adjacently tagged on `query` / `params`.
    type Query: DeserializeOwned + Send;

    /// Every intent name `Command` accepts.
    const INTENTS: &'static [&'static str];
    /// Every query name `Query` accepts.
    const QUERIES: &'static [&'static str];

    async fn handle(&self, actor: &str, command: Self::Command) -> Result<Value, KernelError>;

    async fn answer(&self, query: Self::Query) -> Result<Value, KernelError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Completed(Value),
    Rejected { code: &'static str, message: String },
}

impl DispatchOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

pub struct World<A: SimulationApp> {
    app: A,
    clock: Arc<VirtualClock>,
    event_bus: Arc<InMemoryEventBus>,
    random: SimulatedRandom,
}

impl<A: SimulationApp> World<A> {
    pub fn new(app: A, clock: Arc<VirtualClock>, event_bus: Arc<InMemoryEventBus>, seed: u32) -> Self {
        Self {
            app,
            clock,
            event_bus,
            random: SimulatedRandom::new(seed),
        }
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    pub fn clock(&self) -> &Arc<VirtualClock> {
        &self.clock
    }

    pub fn event_bus(&self) -> &Arc<InMemoryEventBus> {
        &self.event_bus
    }

    pub fn random(&self) -> &SimulatedRandom {
        &self.random
    }

    pub async fn dispatch(
        &self,
        actor: &str,
        intent: &str,
        payload: Value,
    ) -> Result<DispatchOutcome, SimulationError> {
        info!(actor, intent, payload = %payload, "Act");
        if !A::INTENTS.iter().any(|known| *known == intent) {
            return Err(SimulationError::UnknownIntent(intent.to_string()));
        }
        let command: A::Command = decode("intent", intent, "payload", payload)?;

        match self.app.handle(actor, command).await {
            Ok(value) => Ok(DispatchOutcome::Completed(value)),
            Err(e) if e.is_business() => {
                warn!(actor, intent, code = e.code(), error = %e, "Use case rejected");
                Ok(DispatchOutcome::Rejected {
                    code: e.code(),
                    message: e.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn query(&self, name: &str, params: Value) -> Result<Value, SimulationError> {
        if !A::QUERIES.iter().any(|known| *known == name) {
            return Err(SimulationError::UnknownQuery(name.to_string()));
        }
        let query: A::Query = decode("query", name, "params", params)?;
        Ok(self.app.answer(query).await?)
    }

    /// Runs whatever is due at the current instant without moving time.
    pub async fn settle(&self) -> usize {
        self.clock.advance(0).await
    }
}

/// Builds the adjacently tagged form; a `null` body is left out so that
/// unit variants decode.
fn decode<T: DeserializeOwned>(
    tag: &str,
    name: &str,
    content: &str,
    body: Value,
) -> Result<T, SimulationError> {
    let mut tagged = Map::new();
    tagged.insert(tag.to_string(), json!(name));
    if !body.is_null() {
        tagged.insert(content.to_string(), body);
    }
    serde_json::from_value(Value::Object(tagged)).map_err(|source| SimulationError::MalformedPayload {
        name: name.to_string(),
        source,
    })
}
