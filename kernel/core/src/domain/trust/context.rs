// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Trust Contexts
//!
//! A [`TrustContext`] carries the trace id, the trust level, the capability set
//! and an optional principal for one logical request.
//!
//! ## Promotion Lattice
//!
//! | From | To | Minted capabilities |
//! |------|----|---------------------|
//! | `Untrusted` | `Trusted` | none |
//! | `Trusted` | `WriteAuthorized` | `Write` |
//! | `Trusted` | `Administrative` | `Write`, `RawAccess`, `Administrative` |
//!
//! Promotions consume the lower context. There is no setter for the trust
//! level and no public constructor for any level above `Untrusted`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::capability::{CapabilityKind, CapabilitySet};
use crate::domain::error::KernelError;
use crate::domain::events::EventContext;
use crate::domain::ids::IdGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    Untrusted,
    Trusted,
    WriteAuthorized,
    Administrative,
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Untrusted => "untrusted",
            Self::Trusted => "trusted",
            Self::WriteAuthorized => "write_authorized",
            Self::Administrative => "administrative",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct TrustContext {
    trace_id: String,
    trust_level: TrustLevel,
    capabilities: CapabilitySet,
    principal: Option<String>,
}

impl TrustContext {
    fn untrusted(trace_id: String) -> Self {
        Self {
            trace_id,
            trust_level: TrustLevel::Untrusted,
            capabilities: CapabilitySet::new(),
            principal: None,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn trust_level(&self) -> TrustLevel {
        self.trust_level
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// `Untrusted → Trusted`. The capability set stays empty.
    pub fn promote_to_trusted(self, principal: Option<&str>) -> Result<Self, KernelError> {
        self.expect_level(TrustLevel::Untrusted, TrustLevel::Trusted)?;
        debug!(trace_id = %self.trace_id, principal = ?principal, "Promoted context to trusted");
        Ok(Self {
            trace_id: self.trace_id,
            trust_level: TrustLevel::Trusted,
            capabilities: CapabilitySet::new(),
            principal: principal.map(str::to_owned),
        })
    }

    /// `Trusted → WriteAuthorized`. Mints exactly one `Write` capability.
    pub fn promote_to_write(self) -> Result<Self, KernelError> {
        self.promote(TrustLevel::WriteAuthorized, &[CapabilityKind::Write])
    }

    /// `Trusted → Administrative`. Mints `Write`, `RawAccess` and `Administrative`.
    pub fn elevate_to_administrative(self) -> Result<Self, KernelError> {
        self.promote(
            TrustLevel::Administrative,
            &[
                CapabilityKind::Write,
                CapabilityKind::RawAccess,
                CapabilityKind::Administrative,
            ],
        )
    }

    /// Plain snapshot handed to event handlers alongside each event.
    pub fn event_context(&self) -> EventContext {
        EventContext {
            trace_id: self.trace_id.clone(),
            trust_level: self.trust_level,
            principal: self.principal.clone(),
        }
    }

    fn promote(self, to: TrustLevel, kinds: &[CapabilityKind]) -> Result<Self, KernelError> {
        self.expect_level(TrustLevel::Trusted, to)?;
        debug!(trace_id = %self.trace_id, level = %to, "Promoted context");
        Ok(Self {
            trace_id: self.trace_id,
            trust_level: to,
            capabilities: CapabilitySet::minted(kinds),
            principal: self.principal,
        })
    }

    fn expect_level(&self, required: TrustLevel, to: TrustLevel) -> Result<(), KernelError> {
        if self.trust_level == required {
            Ok(())
        } else {
            Err(KernelError::InvalidPromotion {
                from: self.trust_level,
                to,
            })
        }
    }
}

/// Entry point of the trust kernel: the only way to obtain a context.
#[derive(Clone)]
pub struct ContextFactory {
    ids: Arc<dyn IdGenerator>,
}

impl ContextFactory {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }

    /// Lowest trust level, empty capability set. Generates a trace id when none is given.
    pub fn create_untrusted(&self, trace_id: Option<String>) -> TrustContext {
        let trace_id = trace_id.unwrap_or_else(|| self.ids.generate(Some("trace")));
        TrustContext::untrusted(trace_id)
    }

    /// `create_untrusted` followed by promotion to `Trusted`.
    pub fn create_trusted(&self, principal: Option<&str>) -> Result<TrustContext, KernelError> {
        self.create_untrusted(None).promote_to_trusted(principal)
    }

    /// Context carrying a `Write` capability, as used by command handlers.
    pub fn create_command(&self, principal: Option<&str>) -> Result<TrustContext, KernelError> {
        self.create_trusted(principal)?.promote_to_write()
    }

    /// Administrative context for internal system actors.
    pub fn create_system(&self, principal: &str) -> Result<TrustContext, KernelError> {
        self.create_trusted(Some(principal))?
            .elevate_to_administrative()
    }
}

impl fmt::Debug for ContextFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextFactory").finish_non_exhaustive()
    }
}
