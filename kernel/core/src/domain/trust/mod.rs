// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Trust & capability kernel.

mod capability;
mod context;
mod mint;
mod token;

pub use capability::{Capability, CapabilityKind, CapabilitySet};
pub use context::{ContextFactory, TrustContext, TrustLevel};
pub use token::EvolutionToken;
