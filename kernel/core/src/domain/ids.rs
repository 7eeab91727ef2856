// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Identifier generation port.

/// Produces opaque identifiers for traces and entities.
///
/// Implementations live in `crate::infrastructure::id_generator`: random v4
/// UUIDs for production and per-prefix counters for simulation.
pub trait IdGenerator: Send + Sync {
    fn generate(&self, prefix: Option<&str>) -> String;
}
