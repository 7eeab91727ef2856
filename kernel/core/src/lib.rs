// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # `tessera-core` - Capability Kernel
//!
//! Application code reads and mutates domain state only through explicitly
//! granted, unforgeable authority. Writes are staged in a unit of work and
//! events are published only after every staged write has committed.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | trust contexts, capabilities, evolution tokens, values, entities, policies, ports |
//! | [`application`] | Application | `OperationScope`, `UnitOfWork`, `ExecutionKernel` |
//! | [`infrastructure`] | Infrastructure | in-memory event bus and repository, virtual clock, id generators |

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
