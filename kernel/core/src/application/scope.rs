// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Operation Scope
//!
//! Per-request execution context: the trust context plus the services the
//! request may use. A scope without a unit of work is read-only by
//! construction: [`OperationScope::unit_of_work`] fails on it.
//!
//! [`OperationScope::authorize`] is the only way application code obtains an
//! [`EvolutionToken`]. The token lives only for the duration of the action.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, debug_span};

use crate::application::unit_of_work::UnitOfWork;
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::error::KernelError;
use crate::domain::events::{DomainEvent, EventBus};
use crate::domain::policy::{Decide, DecisionPolicy};
use crate::domain::trust::{EvolutionToken, TrustContext};

#[derive(Clone)]
pub struct ScopeServices {
    pub unit_of_work: Option<Arc<UnitOfWork>>,
    pub event_bus: Option<Arc<dyn EventBus>>,
    pub clock: Arc<dyn Clock>,
}

impl ScopeServices {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            unit_of_work: None,
            event_bus: None,
            clock,
        }
    }

    pub fn with_unit_of_work(mut self, unit_of_work: Arc<UnitOfWork>) -> Self {
        self.unit_of_work = Some(unit_of_work);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<dyn EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }
}

impl Default for ScopeServices {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[derive(Clone)]
pub struct OperationScope {
    context: Arc<TrustContext>,
    services: ScopeServices,
    label: String,
}

impl OperationScope {
    /// A write scope iff `services` carries a unit of work.
    pub fn create(context: TrustContext, services: ScopeServices) -> Self {
        Self {
            context: Arc::new(context),
            services,
            label: "root".to_string(),
        }
    }

    pub fn context(&self) -> &TrustContext {
        &self.context
    }

    pub fn trace_id(&self) -> &str {
        self.context.trace_id()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.services.clock
    }

    pub fn event_bus(&self) -> Option<&Arc<dyn EventBus>> {
        self.services.event_bus.as_ref()
    }

    /// # Errors
    ///
    /// `ReadOnlyScope` when the scope was created without a unit of work.
    pub fn unit_of_work(&self) -> Result<&Arc<UnitOfWork>, KernelError> {
        self.services
            .unit_of_work
            .as_ref()
            .ok_or(KernelError::ReadOnlyScope)
    }

    pub fn has_write_authority(&self) -> bool {
        self.services.unit_of_work.is_some()
    }

    /// Child scope for a sub-operation. Shares the trace, the trust context
    /// and every service, including the open unit of work.
    pub fn fork(&self, label: &str) -> Self {
        let span = debug_span!("fork", trace_id = %self.trace_id(), from = %self.label, label);
        let _guard = span.enter();
        debug!("Forked operation scope");
        Self {
            context: self.context.clone(),
            services: self.services.clone(),
            label: format!("{}/{}", self.label, label),
        }
    }

    /// Mints a fresh evolution token, runs `action` with it, and returns the
    /// action's result. The token is revoked when `action` returns.
    pub fn authorize<D, R>(
        &self,
        policy: &DecisionPolicy<D>,
        action: impl FnOnce(&EvolutionToken) -> R,
    ) -> R
    where
        D: Decide,
    {
        debug!(trace_id = %self.trace_id(), policy = policy.name(), principal = ?self.context.principal(), "Authorized evolution");
        let token = EvolutionToken::mint(self.services.clock.clone());
        action(&token)
    }

    /// Defers `event` on this scope's unit of work.
    pub fn record_event(&self, event: DomainEvent) -> Result<(), KernelError> {
        self.unit_of_work()?
            .register_event(self.context.event_context(), event);
        Ok(())
    }
}

impl fmt::Debug for OperationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationScope")
            .field("trace_id", &self.trace_id())
            .field("label", &self.label)
            .field("writable", &self.has_write_authority())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::unit_of_work::UnitOfWorkFactory;
    use crate::domain::error::DomainValidationError;
    use crate::domain::policy::Evolution;
    use crate::domain::trust::ContextFactory;
    use crate::domain::value::{DomainData, DomainValue, Validatable};
    use crate::infrastructure::id_generator::SequentialIdGenerator;
    use crate::infrastructure::virtual_clock::VirtualClock;
    use chrono::Utc;
    use serde::Serialize;

    #[derive(Debug, Clone, Serialize)]
    struct Flag(bool);

    impl Validatable for Flag {
        fn validate(&self) -> Result<(), DomainValidationError> {
            Ok(())
        }
    }

    impl DomainData for Flag {
        type Patch = bool;

        fn merge(&self, changes: &bool) -> Self {
            Flag(*changes)
        }
    }

    struct NoRules;

    impl Decide for NoRules {
        const NAME: &'static str = "NoRules";
        type Target = DomainValue<Flag>;
        type Context = ();

        fn decide(&self, _: &DomainValue<Flag>, _: &()) -> Result<Vec<Evolution<bool>>, KernelError> {
            Ok(vec![])
        }
    }

    fn contexts() -> ContextFactory {
        ContextFactory::new(Arc::new(SequentialIdGenerator::new()))
    }

    #[test]
    fn test_read_only_scope_has_no_unit_of_work() {
        let scope = OperationScope::create(contexts().create_trusted(None).unwrap(), ScopeServices::default());
        assert!(!scope.has_write_authority());
        let err = scope.unit_of_work().unwrap_err();
        assert!(matches!(err, KernelError::ReadOnlyScope));
        assert!(scope
            .record_event(DomainEvent::new("X", Utc::now(), serde_json::Value::Null))
            .is_err());
    }

    #[test]
    fn test_fork_shares_trace_and_unit_of_work() {
        let factory = UnitOfWorkFactory::new(None);
        let ctx = contexts().create_command(Some("alice")).unwrap();
        let uow = factory.open(&ctx).unwrap();
        let scope = OperationScope::create(ctx, ScopeServices::default().with_unit_of_work(uow.clone()));

        let child = scope.fork("inventory");
        assert_eq!(child.trace_id(), scope.trace_id());
        assert_eq!(child.label(), "root/inventory");
        assert!(Arc::ptr_eq(child.unit_of_work().unwrap(), &uow));
        assert_eq!(child.context().principal(), Some("alice"));

        child
            .record_event(DomainEvent::new("X", Utc::now(), serde_json::Value::Null))
            .unwrap();
        assert_eq!(uow.pending_event_count(), 1);
    }

    #[test]
    fn test_authorize_mints_live_token_for_action_only() {
        let clock = Arc::new(VirtualClock::new(5_000));
        let scope = OperationScope::create(
            contexts().create_trusted(None).unwrap(),
            ScopeServices::new(clock.clone()),
        );
        let policy = DecisionPolicy::new(NoRules, clock.clone());
        let value = DomainValue::new(Flag(false), clock.as_ref()).unwrap();

        let evolved = scope
            .authorize(&policy, |token| {
                assert!(token.is_valid());
                value.evolve(true, "switch on", token)
            })
            .unwrap();

        assert!(evolved.data().0);
        assert_eq!(evolved.provenance().history[0].at.timestamp_millis(), 5_000);
    }
}
