// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Command and query execution wrappers.
//!
//! `run_command` promotes a fresh context to `WriteAuthorized`, opens a unit of
//! work, runs the body in a write scope, commits on success and rolls back on
//! any failure (body or commit). The unit of work is always closed, including
//! when the body panics or the future is dropped mid-flight.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info_span, warn, Instrument};

use crate::application::scope::{OperationScope, ScopeServices};
use crate::application::unit_of_work::UnitOfWorkFactory;
use crate::domain::clock::Clock;
use crate::domain::error::KernelError;
use crate::domain::events::EventBus;
use crate::domain::ids::IdGenerator;
use crate::domain::trust::{ContextFactory, TrustContext};

pub struct ExecutionKernel {
    contexts: ContextFactory,
    units: UnitOfWorkFactory,
    clock: Arc<dyn Clock>,
    event_bus: Arc<dyn EventBus>,
}

impl ExecutionKernel {
    pub fn new(
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            contexts: ContextFactory::new(ids),
            units: UnitOfWorkFactory::new(Some(event_bus.clone())),
            clock,
            event_bus,
        }
    }

    pub fn contexts(&self) -> &ContextFactory {
        &self.contexts
    }

    pub fn units_of_work(&self) -> &UnitOfWorkFactory {
        &self.units
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn event_bus(&self) -> &Arc<dyn EventBus> {
        &self.event_bus
    }

    /// Runs `body` as a state-changing command on behalf of `principal`.
    pub async fn run_command<F, Fut, T>(
        &self,
        name: &str,
        principal: Option<&str>,
        body: F,
    ) -> Result<T, KernelError>
    where
        F: FnOnce(OperationScope) -> Fut,
        Fut: Future<Output = Result<T, KernelError>>,
    {
        let ctx = self.contexts.create_command(principal)?;
        self.run_command_as(name, ctx, body).await
    }

    /// Like `run_command`, with a caller-supplied context (e.g. a system
    /// actor elevated to `Administrative`).
    pub async fn run_command_as<F, Fut, T>(
        &self,
        name: &str,
        ctx: TrustContext,
        body: F,
    ) -> Result<T, KernelError>
    where
        F: FnOnce(OperationScope) -> Fut,
        Fut: Future<Output = Result<T, KernelError>>,
    {
        let span = info_span!("command", command = name, trace_id = %ctx.trace_id());

        async move {
            let uow = self.units.open(&ctx)?;
            let _close = scopeguard::guard(uow.clone(), |uow| uow.close());

            let services = ScopeServices::new(self.clock.clone())
                .with_unit_of_work(uow.clone())
                .with_event_bus(self.event_bus.clone());
            let scope = OperationScope::create(ctx, services);

            let outcome = match body(scope).await {
                Ok(value) => uow.commit().await.map(|()| value),
                Err(e) => Err(e),
            };

            if let Err(e) = &outcome {
                warn!(command = name, error = %e, "Command failed; rolling back");
                if let Err(rollback_err) = uow.rollback().await {
                    warn!(command = name, error = %rollback_err, "Rollback failed");
                }
            }

            outcome
        }
        .instrument(span)
        .await
    }

    /// Runs `body` in a read-only scope at `Trusted` level.
    pub async fn run_query<F, Fut, T>(
        &self,
        name: &str,
        principal: Option<&str>,
        body: F,
    ) -> Result<T, KernelError>
    where
        F: FnOnce(OperationScope) -> Fut,
        Fut: Future<Output = Result<T, KernelError>>,
    {
        let ctx = self.contexts.create_trusted(principal)?;
        debug!(query = name, trace_id = %ctx.trace_id(), "Running query");
        let scope = OperationScope::create(ctx, ScopeServices::new(self.clock.clone()));
        body(scope).await
    }
}

impl fmt::Debug for ExecutionKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionKernel")
            .field("units", &self.units)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::{event_handler, DomainEvent};
    use crate::domain::trust::TrustLevel;
    use crate::infrastructure::event_bus::InMemoryEventBus;
    use crate::infrastructure::id_generator::SequentialIdGenerator;
    use crate::infrastructure::virtual_clock::VirtualClock;
    use parking_lot::Mutex;

    fn kernel() -> (ExecutionKernel, Arc<Mutex<Vec<String>>>) {
        let published = Arc::new(Mutex::new(Vec::new()));
        let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new(8));
        let sink = published.clone();
        bus.subscribe(
            "Ping",
            event_handler(move |ctx, _event| {
                let sink = sink.clone();
                async move {
                    sink.lock().push(ctx.trace_id);
                    Ok(())
                }
            }),
        );
        let kernel = ExecutionKernel::new(
            Arc::new(VirtualClock::new(0)),
            Arc::new(SequentialIdGenerator::new()),
            bus,
        );
        (kernel, published)
    }

    fn ping(scope: &OperationScope) -> Result<(), KernelError> {
        scope.record_event(DomainEvent::new(
            "Ping",
            scope.clock().now(),
            serde_json::Value::Null,
        ))
    }

    #[tokio::test]
    async fn test_command_commits_and_publishes() {
        let (kernel, published) = kernel();
        let trace = kernel
            .run_command("Ping", Some("alice"), |scope| async move {
                assert_eq!(scope.context().trust_level(), TrustLevel::WriteAuthorized);
                ping(&scope)?;
                Ok(scope.trace_id().to_string())
            })
            .await
            .unwrap();

        assert_eq!(*published.lock(), vec![trace.clone()]);
        assert!(!kernel.units_of_work().is_open(&trace));
    }

    #[tokio::test]
    async fn test_failed_command_rolls_back_and_closes() {
        let (kernel, published) = kernel();
        let seen = Arc::new(Mutex::new(String::new()));
        let seen_in_body = seen.clone();

        let err = kernel
            .run_command("Ping", None, |scope| async move {
                *seen_in_body.lock() = scope.trace_id().to_string();
                ping(&scope)?;
                Err::<(), _>(KernelError::business_rule("kitchen closed"))
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "kitchen closed");
        assert!(published.lock().is_empty());
        assert!(!kernel.units_of_work().is_open(&seen.lock()));
    }

    #[tokio::test]
    async fn test_nested_open_inside_command_is_rejected() {
        let (kernel, _) = kernel();
        let err = kernel
            .run_command("Outer", None, |scope| {
                let nested = kernel.units_of_work().open(scope.context()).map(|_| ());
                async move { nested }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, KernelError::NestedUnitOfWork { .. }));
    }

    #[tokio::test]
    async fn test_query_scope_is_read_only() {
        let (kernel, _) = kernel();
        let writable = kernel
            .run_query("Peek", None, |scope| async move {
                assert_eq!(scope.context().trust_level(), TrustLevel::Trusted);
                Ok(scope.has_write_authority())
            })
            .await
            .unwrap();
        assert!(!writable);
    }
}
