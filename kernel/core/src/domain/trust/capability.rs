// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Capability Value Objects
//!
//! A [`Capability`] is an opaque marker of one [`CapabilityKind`]. It has no
//! public constructor and is neither `Clone` nor `Deserialize`; the only way
//! to obtain one is a trust promotion, which mints it into the private
//! registry for its kind.
//!
//! ## Verification
//!
//! [`CapabilitySet::require`] walks the set looking for an instance whose kind
//! matches *and* whose identity is present in that kind's registry. A value
//! that merely has the same shape fails the check.

use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::mint::{MintRegistry, Minted};
use crate::domain::error::KernelError;

static WRITE_MINT: LazyLock<MintRegistry> = LazyLock::new(|| MintRegistry::new("Write"));
static RAW_ACCESS_MINT: LazyLock<MintRegistry> = LazyLock::new(|| MintRegistry::new("RawAccess"));
static ADMINISTRATIVE_MINT: LazyLock<MintRegistry> =
    LazyLock::new(|| MintRegistry::new("Administrative"));

/// The kinds of authority a trust context can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CapabilityKind {
    /// Durable writes (state changes).
    Write,
    /// Raw, unfiltered reads of adapter state.
    RawAccess,
    /// Administrative operations such as purging a store.
    Administrative,
}

impl CapabilityKind {
    fn registry(self) -> &'static MintRegistry {
        match self {
            Self::Write => &WRITE_MINT,
            Self::RawAccess => &RAW_ACCESS_MINT,
            Self::Administrative => &ADMINISTRATIVE_MINT,
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Write => "Write",
            Self::RawAccess => "RawAccess",
            Self::Administrative => "Administrative",
        };
        f.write_str(name)
    }
}

/// Unforgeable authorization marker.
#[derive(Debug)]
pub struct Capability {
    kind: CapabilityKind,
    minted: Minted,
}

impl Capability {
    pub(crate) fn mint(kind: CapabilityKind) -> Self {
        Self {
            kind,
            minted: kind.registry().mint(),
        }
    }

    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    /// True iff this exact instance was produced by the mint path for its kind.
    pub fn is_valid(&self) -> bool {
        self.minted.is_registered_in(self.kind.registry())
    }

    #[cfg(test)]
    pub(crate) fn counterfeit(kind: CapabilityKind, serial: u64) -> Self {
        Self {
            kind,
            minted: Minted::counterfeit(serial, kind.registry()),
        }
    }

    #[cfg(test)]
    pub(crate) fn serial(&self) -> u64 {
        self.minted.serial()
    }
}

/// Container for the capabilities held by one trust context.
#[derive(Debug, Default)]
pub struct CapabilitySet {
    capabilities: Vec<Capability>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn minted(kinds: &[CapabilityKind]) -> Self {
        Self {
            capabilities: kinds.iter().copied().map(Capability::mint).collect(),
        }
    }

    /// Non-failing variant of [`CapabilitySet::require`].
    pub fn has(&self, kind: CapabilityKind) -> bool {
        self.find(kind).is_some()
    }

    /// Returns the matching valid capability.
    ///
    /// # Errors
    ///
    /// `MissingCapability` when no valid instance of `kind` is held.
    pub fn require(&self, kind: CapabilityKind) -> Result<&Capability, KernelError> {
        self.find(kind)
            .ok_or(KernelError::MissingCapability { capability: kind })
    }

    pub fn kinds(&self) -> Vec<CapabilityKind> {
        self.capabilities
            .iter()
            .filter(|cap| cap.is_valid())
            .map(Capability::kind)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    fn find(&self, kind: CapabilityKind) -> Option<&Capability> {
        self.capabilities
            .iter()
            .find(|cap| cap.kind == kind && cap.is_valid())
    }

    #[cfg(test)]
    pub(crate) fn insert_unchecked(&mut self, capability: Capability) {
        self.capabilities.push(capability);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [CapabilityKind; 3] = [
        CapabilityKind::Write,
        CapabilityKind::RawAccess,
        CapabilityKind::Administrative,
    ];

    #[test]
    fn test_minted_capability_is_valid() {
        for kind in ALL_KINDS {
            let cap = Capability::mint(kind);
            assert!(cap.is_valid(), "{kind} should be valid after minting");
        }
    }

    #[test]
    fn test_counterfeit_capability_fails_for_every_kind() {
        for kind in ALL_KINDS {
            let genuine = Capability::mint(kind);
            let forged = Capability::counterfeit(kind, genuine.serial());
            assert!(!forged.is_valid());

            let mut set = CapabilitySet::new();
            set.insert_unchecked(forged);
            assert!(!set.has(kind));
            let err = set.require(kind).unwrap_err();
            assert_eq!(err.to_string(), format!("Missing required capability: {kind}"));
        }
    }

    #[test]
    fn test_require_skips_forgery_and_finds_genuine() {
        let mut set = CapabilitySet::new();
        set.insert_unchecked(Capability::counterfeit(CapabilityKind::Write, 0));
        set.insert_unchecked(Capability::mint(CapabilityKind::Write));

        let cap = set.require(CapabilityKind::Write).unwrap();
        assert!(cap.is_valid());
        assert_eq!(set.kinds(), vec![CapabilityKind::Write]);
    }

    #[test]
    fn test_capability_of_other_kind_does_not_satisfy() {
        let set = CapabilitySet::minted(&[CapabilityKind::Write]);
        assert!(set.has(CapabilityKind::Write));
        assert!(!set.has(CapabilityKind::Administrative));
        assert!(matches!(
            set.require(CapabilityKind::RawAccess),
            Err(KernelError::MissingCapability {
                capability: CapabilityKind::RawAccess
            })
        ));
    }
}
