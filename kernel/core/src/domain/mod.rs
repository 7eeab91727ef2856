// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer
//!
//! Pure kernel types. Nothing here performs I/O; the asynchronous ports
//! (`Clock::schedule`, `EventBus`, `Repository`) are implemented in
//! `crate::infrastructure`.

pub mod clock;
pub mod entity;
pub mod error;
pub mod events;
pub mod ids;
pub mod kernel_config;
pub mod policy;
pub mod random;
pub mod repository;
pub mod trust;
pub mod value;

pub use clock::{scheduled_task, Clock, ScheduledTask, SystemClock};
pub use entity::{Entity, Identified};
pub use error::{DomainValidationError, KernelError};
pub use events::{event_handler, DomainEvent, EventBus, EventContext, EventHandler};
pub use ids::IdGenerator;
pub use kernel_config::KernelConfigManifest;
pub use policy::{Decide, DecisionPolicy, Evolution};
pub use random::SimulatedRandom;
pub use repository::{Repository, TransactionalParticipant};
pub use trust::{
    Capability, CapabilityKind, CapabilitySet, ContextFactory, EvolutionToken, TrustContext, TrustLevel,
};
pub use value::{DomainData, DomainValue, Evolvable, Provenance, ProvenanceEntry, Validatable};
