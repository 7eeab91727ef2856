// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Decision Policies
//!
//! A policy is split in two:
//!
//! - [`Decide`]: the pure rule set. `decide` inspects a target and proposes
//!   an ordered list of [`Evolution`]s. It has no side effects.
//! - [`DecisionPolicy`]: holds the rule set plus the evolution token minted at
//!   construction, and applies the proposals in order.
//!
//! `execute` does not persist anything. The returned value becomes visible to
//! other requests only once a repository save staged in the same unit of work
//! commits.

use std::borrow::Cow;
use std::sync::Arc;

use metrics::counter;
use tracing::{info, info_span};

use crate::domain::clock::Clock;
use crate::domain::error::KernelError;
use crate::domain::trust::{EvolutionToken, TrustContext};
use crate::domain::value::Evolvable;

/// One proposed change: the partial update plus a human-readable note.
#[derive(Debug, Clone, PartialEq)]
pub struct Evolution<P> {
    pub changes: P,
    pub note: String,
}

impl<P> Evolution<P> {
    pub fn new(changes: P, note: impl Into<String>) -> Self {
        Self {
            changes,
            note: note.into(),
        }
    }
}

pub trait Decide: Send + Sync {
    /// Name used in evolution reasons: `[Policy: NAME] note`.
    const NAME: &'static str;

    type Target: Evolvable + Clone;
    type Context;

    fn decide(
        &self,
        target: &Self::Target,
        context: &Self::Context,
    ) -> Result<Vec<Evolution<<Self::Target as Evolvable>::Patch>>, KernelError>;
}

pub struct DecisionPolicy<D: Decide> {
    rules: D,
    token: EvolutionToken,
}

impl<D: Decide> DecisionPolicy<D> {
    pub fn new(rules: D, clock: Arc<dyn Clock>) -> Self {
        Self {
            rules,
            token: EvolutionToken::mint(clock),
        }
    }

    pub fn name(&self) -> &'static str {
        D::NAME
    }

    pub fn rules(&self) -> &D {
        &self.rules
    }

    /// Runs `decide` and applies every proposal in order, each one observing
    /// the result of the previous.
    ///
    /// Returns `Cow::Borrowed(target)` (the very same instance) when nothing
    /// is proposed. If `decide` fails, no evolution is applied.
    pub fn execute<'a>(
        &self,
        ctx: &TrustContext,
        target: &'a D::Target,
        context: &D::Context,
    ) -> Result<Cow<'a, D::Target>, KernelError> {
        let span = info_span!("policy", policy = D::NAME, trace_id = %ctx.trace_id());
        let _guard = span.enter();

        let evolutions = self.rules.decide(target, context)?;
        let mut current = Cow::Borrowed(target);

        for evolution in evolutions {
            let reason = format!("[Policy: {}] {}", D::NAME, evolution.note);
            let next = current.evolve(evolution.changes, &reason, &self.token)?;
            info!(
                trace_id = %ctx.trace_id(),
                policy = D::NAME,
                note = %evolution.note,
                revision = next.revision(),
                "Evolution applied"
            );
            counter!("tessera_evolutions_applied_total", "policy" => D::NAME).increment(1);
            current = Cow::Owned(next);
        }

        Ok(current)
    }
}

impl<D: Decide + std::fmt::Debug> std::fmt::Debug for DecisionPolicy<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionPolicy")
            .field("name", &D::NAME)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Entity;
    use crate::domain::error::DomainValidationError;
    use crate::domain::value::{DomainData, Validatable};
    use crate::infrastructure::id_generator::SequentialIdGenerator;
    use crate::infrastructure::virtual_clock::VirtualClock;
    use crate::domain::trust::ContextFactory;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use serde::Serialize;

    #[derive(Debug, Clone, Serialize)]
    struct Tally {
        total: i64,
    }

    impl Validatable for Tally {
        fn validate(&self) -> Result<(), DomainValidationError> {
            if self.total < 0 {
                return Err(DomainValidationError::new("total must not be negative"));
            }
            Ok(())
        }
    }

    impl DomainData for Tally {
        type Patch = i64;

        fn merge(&self, changes: &i64) -> Self {
            Self { total: *changes }
        }
    }

    type TallyEntity = Entity<String, Tally>;

    enum Action {
        Nothing,
        DoubleThenIncrement,
        Reject,
    }

    struct TallyRules;

    impl Decide for TallyRules {
        const NAME: &'static str = "TallyRules";
        type Target = TallyEntity;
        type Context = Action;

        fn decide(
            &self,
            target: &TallyEntity,
            action: &Action,
        ) -> Result<Vec<Evolution<i64>>, KernelError> {
            match action {
                Action::Nothing => Ok(vec![]),
                Action::DoubleThenIncrement => {
                    let doubled = target.data().total * 2;
                    Ok(vec![
                        Evolution::new(doubled, "double"),
                        Evolution::new(doubled + 1, "increment"),
                    ])
                }
                Action::Reject => Err(KernelError::business_rule("tally is frozen")),
            }
        }
    }

    fn setup() -> (DecisionPolicy<TallyRules>, TrustContext, TallyEntity) {
        let clock = Arc::new(VirtualClock::new(0));
        let contexts = ContextFactory::new(Arc::new(SequentialIdGenerator::new()));
        let ctx = contexts.create_trusted(None).unwrap();
        let tally = Entity::new("t-1".to_string(), Tally { total: 3 }, clock.as_ref()).unwrap();
        (DecisionPolicy::new(TallyRules, clock), ctx, tally)
    }

    #[test]
    fn test_zero_evolutions_return_same_instance() {
        let (policy, ctx, tally) = setup();
        let result = policy.execute(&ctx, &tally, &Action::Nothing).unwrap();
        match result {
            Cow::Borrowed(same) => assert!(std::ptr::eq(same, &tally)),
            Cow::Owned(_) => panic!("expected the original instance"),
        }
    }

    #[test]
    fn test_evolutions_apply_in_order_with_policy_reason() {
        let (policy, ctx, tally) = setup();
        let result = policy
            .execute(&ctx, &tally, &Action::DoubleThenIncrement)
            .unwrap()
            .into_owned();

        assert_eq!(result.data().total, 7);
        assert_eq!(result.revision(), 3);
        let reasons: Vec<_> = result
            .provenance()
            .history
            .iter()
            .map(|e| e.reason.clone())
            .collect();
        assert_eq!(
            reasons,
            vec!["[Policy: TallyRules] double", "[Policy: TallyRules] increment"]
        );
        assert_eq!(tally.data().total, 3);
    }

    #[test]
    fn test_decide_failure_propagates() {
        let (policy, ctx, tally) = setup();
        let err = policy.execute(&ctx, &tally, &Action::Reject).unwrap_err();
        assert_eq!(err.to_string(), "tally is frozen");
        assert_eq!(tally.revision(), 1);
        assert_eq!(policy.name(), "TallyRules");
    }

    #[test]
    fn test_each_applied_evolution_is_counted() {
        let (policy, ctx, tally) = setup();
        let metrics_recorder = DebuggingRecorder::new();
        let snapshotter = metrics_recorder.snapshotter();

        metrics::with_local_recorder(&metrics_recorder, || {
            policy.execute(&ctx, &tally, &Action::DoubleThenIncrement).unwrap();
            policy.execute(&ctx, &tally, &Action::Nothing).unwrap();
            assert!(policy.execute(&ctx, &tally, &Action::Reject).is_err());
        });

        let applied: Vec<_> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, ..)| key.key().name() == "tessera_evolutions_applied_total")
            .map(|(key, _, _, value)| {
                let policy = key.key().labels().find(|l| l.key() == "policy").map(|l| l.value().to_string());
                (policy, value)
            })
            .collect();
        assert_eq!(applied, vec![(Some("TallyRules".to_string()), DebugValue::Counter(2))]);
    }
}
