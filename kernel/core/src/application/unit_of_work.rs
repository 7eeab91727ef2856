// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Unit of Work
//!
//! Stages writers and deferred events for one trace. Commit is two-phase:
//!
//! 1. every participant commits, in registration order; the first failure
//!    stops the phase, leaves later participants untouched and publishes nothing
//! 2. every deferred event is published, in registration order
//!
//! [`UnitOfWorkFactory`] keeps the set of open trace ids. A second `open` for
//! a trace that is already open fails immediately; it never waits.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use metrics::counter;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::domain::error::KernelError;
use crate::domain::events::{DomainEvent, EventBus, EventContext};
use crate::domain::repository::TransactionalParticipant;
use crate::domain::trust::{CapabilityKind, TrustContext};

type OpenTraces = Arc<Mutex<HashSet<String>>>;

pub struct UnitOfWorkFactory {
    open_traces: OpenTraces,
    event_bus: Option<Arc<dyn EventBus>>,
}

impl UnitOfWorkFactory {
    pub fn new(event_bus: Option<Arc<dyn EventBus>>) -> Self {
        Self {
            open_traces: Arc::new(Mutex::new(HashSet::new())),
            event_bus,
        }
    }

    /// Opens a unit of work for the context's trace.
    ///
    /// # Errors
    ///
    /// - `MissingCapability` if the context holds no valid `Write` capability
    /// - `NestedUnitOfWork` if a unit of work is already open for the trace
    pub fn open(&self, ctx: &TrustContext) -> Result<Arc<UnitOfWork>, KernelError> {
        ctx.capabilities().require(CapabilityKind::Write)?;

        let trace_id = ctx.trace_id().to_string();
        if !self.open_traces.lock().insert(trace_id.clone()) {
            return Err(KernelError::NestedUnitOfWork { trace_id });
        }

        debug!(trace_id = %trace_id, "Unit of work opened");
        Ok(Arc::new(UnitOfWork {
            trace_id,
            participants: Mutex::new(Vec::new()),
            pending_events: Mutex::new(Vec::new()),
            event_bus: self.event_bus.clone(),
            open_traces: self.open_traces.clone(),
            closed: AtomicBool::new(false),
        }))
    }

    pub fn is_open(&self, trace_id: &str) -> bool {
        self.open_traces.lock().contains(trace_id)
    }
}

impl fmt::Debug for UnitOfWorkFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWorkFactory")
            .field("open_traces", &self.open_traces.lock().len())
            .finish_non_exhaustive()
    }
}

pub struct UnitOfWork {
    trace_id: String,
    participants: Mutex<Vec<Arc<dyn TransactionalParticipant>>>,
    pending_events: Mutex<Vec<(EventContext, DomainEvent)>>,
    event_bus: Option<Arc<dyn EventBus>>,
    open_traces: OpenTraces,
    closed: AtomicBool,
}

impl UnitOfWork {
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Stages a writer. No I/O happens here.
    pub fn register_participant(&self, participant: Arc<dyn TransactionalParticipant>) {
        self.participants.lock().push(participant);
    }

    /// Defers an event until after a successful commit.
    pub fn register_event(&self, ctx: EventContext, event: DomainEvent) {
        self.pending_events.lock().push((ctx, event));
    }

    pub fn participant_count(&self) -> usize {
        self.participants.lock().len()
    }

    pub fn pending_event_count(&self) -> usize {
        self.pending_events.lock().len()
    }

    pub async fn commit(&self) -> Result<(), KernelError> {
        // Snapshot so that no lock is held across an await.
        let participants: Vec<_> = self.participants.lock().clone();

        for (index, participant) in participants.iter().enumerate() {
            if let Err(e) = participant.commit().await {
                warn!(
                    trace_id = %self.trace_id,
                    participant = index,
                    error = %e,
                    "Participant failed to commit; no events published"
                );
                return Err(e);
            }
        }

        let events = std::mem::take(&mut *self.pending_events.lock());
        self.participants.lock().clear();

        info!(
            trace_id = %self.trace_id,
            participants = participants.len(),
            events = events.len(),
            "Unit of work committed"
        );
        counter!("tessera_uow_commits_total").increment(1);

        if let Some(bus) = &self.event_bus {
            for (ctx, event) in events {
                bus.publish(&ctx, event).await?;
            }
        }

        Ok(())
    }

    /// Rolls back every participant in registration order and drops all
    /// pending events. Every participant is invoked; the first failure is
    /// returned.
    pub async fn rollback(&self) -> Result<(), KernelError> {
        let participants = std::mem::take(&mut *self.participants.lock());
        let dropped = std::mem::take(&mut *self.pending_events.lock()).len();

        let mut first_error = None;
        for (index, participant) in participants.iter().enumerate() {
            if let Err(e) = participant.rollback().await {
                warn!(trace_id = %self.trace_id, participant = index, error = %e, "Participant failed to roll back");
                first_error.get_or_insert(e);
            }
        }

        info!(
            trace_id = %self.trace_id,
            participants = participants.len(),
            dropped_events = dropped,
            "Unit of work rolled back"
        );
        counter!("tessera_uow_rollbacks_total").increment(1);

        first_error.map_or(Ok(()), Err)
    }

    /// Releases the trace's open marker. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.participants.lock().clear();
        self.pending_events.lock().clear();
        self.open_traces.lock().remove(&self.trace_id);
        debug!(trace_id = %self.trace_id, "Unit of work closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("trace_id", &self.trace_id)
            .field("participants", &self.participant_count())
            .field("pending_events", &self.pending_event_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}
