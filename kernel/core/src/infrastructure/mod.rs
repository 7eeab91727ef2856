// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! In-memory reference adapters for the kernel ports.
//!
//! | Module | Port | Adapter |
//! |--------|------|---------|
//! | [`event_bus`] | `EventBus` | `InMemoryEventBus` |
//! | [`repositories`] | `Repository<E>` | `InMemoryRepository<E>` |
//! | [`virtual_clock`] | `Clock` | `VirtualClock` |
//! | [`id_generator`] | `IdGenerator` | `UuidIdGenerator`, `SequentialIdGenerator` |

pub mod event_bus;
pub mod id_generator;
pub mod repositories;
pub mod virtual_clock;

pub use event_bus::{EventBusError, EventObserver, InMemoryEventBus, PublishedEvent};
pub use id_generator::{SequentialIdGenerator, UuidIdGenerator};
pub use repositories::InMemoryRepository;
pub use virtual_clock::{on_current_thread_runtime, VirtualClock};
