// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Values
//!
//! [`DomainValue<T>`] wraps an immutable record with a revision number and a
//! provenance trail. The record is validated at construction and again after
//! every evolution; invalid data is never returned to the caller.
//!
//! ## Evolution
//!
//! `evolve` is the only mutation path. It checks, in order:
//!
//! | Check | Failure |
//! |-------|---------|
//! | token is a live `EvolutionToken` | `KernelError::UnauthorizedEvolution` |
//! | reason is non-blank | `KernelError::MissingReason` |
//! | merged data validates | `KernelError::DomainValidation` |
//!
//! On success it returns a new value with `revision + 1` and one appended
//! history entry. The receiver is never modified.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::domain::clock::Clock;
use crate::domain::error::{DomainValidationError, KernelError};
use crate::domain::trust::EvolutionToken;

/// Type-specific validity predicate.
pub trait Validatable {
    fn validate(&self) -> Result<(), DomainValidationError>;
}

/// Record type held by a [`DomainValue`].
///
/// `Patch` is the partial-update shape; `merge` applies it and returns the
/// candidate record, which is validated before it is accepted.
pub trait DomainData: Validatable + Clone + Debug + Serialize + Send + Sync + 'static {
    type Patch: Clone + Debug + Serialize + Send + Sync + 'static;

    fn merge(&self, changes: &Self::Patch) -> Self;
}

/// Anything that changes only through a token-authorized, reasoned evolution.
pub trait Evolvable: Sized {
    type Patch: Clone + Debug + Send + Sync + 'static;

    fn evolve(
        &self,
        changes: Self::Patch,
        reason: &str,
        token: &EvolutionToken,
    ) -> Result<Self, KernelError>;

    fn revision(&self) -> u64;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvenanceEntry<P> {
    pub at: DateTime<Utc>,
    pub reason: String,
    pub diff: P,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provenance<P> {
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub history: Vec<ProvenanceEntry<P>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainValue<T: DomainData> {
    data: T,
    revision: u64,
    provenance: Provenance<T::Patch>,
}

impl<T: DomainData> DomainValue<T> {
    pub fn new(data: T, clock: &dyn Clock) -> Result<Self, DomainValidationError> {
        Self::with_origin(data, "constructor", clock.now())
    }

    pub fn with_origin(
        data: T,
        created_by: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainValidationError> {
        data.validate()?;
        Ok(Self {
            data,
            revision: 1,
            provenance: Provenance {
                created_at,
                created_by: created_by.into(),
                history: Vec::new(),
            },
        })
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn provenance(&self) -> &Provenance<T::Patch> {
        &self.provenance
    }

    pub fn evolve(
        &self,
        changes: T::Patch,
        reason: &str,
        token: &EvolutionToken,
    ) -> Result<Self, KernelError> {
        if !token.is_valid() {
            return Err(KernelError::UnauthorizedEvolution);
        }
        if reason.trim().is_empty() {
            return Err(KernelError::MissingReason);
        }

        let data = self.data.merge(&changes);
        data.validate()?;

        let mut provenance = self.provenance.clone();
        provenance.history.push(ProvenanceEntry {
            at: token.now(),
            reason: reason.to_string(),
            diff: changes,
        });

        debug!(revision = self.revision + 1, reason, "Domain value evolved");
        Ok(Self {
            data,
            revision: self.revision + 1,
            provenance,
        })
    }
}

impl<T: DomainData> Evolvable for DomainValue<T> {
    type Patch = T::Patch;

    fn evolve(
        &self,
        changes: Self::Patch,
        reason: &str,
        token: &EvolutionToken,
    ) -> Result<Self, KernelError> {
        DomainValue::evolve(self, changes, reason, token)
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

/// Values compare by data, ignoring revision and provenance.
impl<T: DomainData + PartialEq> PartialEq for DomainValue<T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}
