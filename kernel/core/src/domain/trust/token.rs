// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Evolution tokens.
//!
//! Minted only by `DecisionPolicy::new` and `OperationScope::authorize`.
//! The token also carries the clock that timestamps provenance entries, so an
//! evolution under simulation is stamped with virtual time.

use std::fmt;
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};

use super::mint::{MintRegistry, Minted};
use crate::domain::clock::Clock;

static EVOLUTION_MINT: LazyLock<MintRegistry> = LazyLock::new(|| MintRegistry::new("Evolution"));

pub struct EvolutionToken {
    minted: Minted,
    clock: Arc<dyn Clock>,
}

impl EvolutionToken {
    pub(crate) fn mint(clock: Arc<dyn Clock>) -> Self {
        Self {
            minted: EVOLUTION_MINT.mint(),
            clock,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.minted.is_registered_in(&EVOLUTION_MINT)
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[cfg(test)]
    pub(crate) fn counterfeit(clock: Arc<dyn Clock>) -> Self {
        Self {
            minted: Minted::counterfeit(0, &EVOLUTION_MINT),
            clock,
        }
    }
}

impl fmt::Debug for EvolutionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvolutionToken")
            .field("minted", &self.minted)
            .finish_non_exhaustive()
    }
}
