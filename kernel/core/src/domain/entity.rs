// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Domain entities: a [`DomainValue`] plus an identity.
//!
//! Two entities are equal iff their ids are equal, whatever their data.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::clock::Clock;
use crate::domain::error::{DomainValidationError, KernelError};
use crate::domain::trust::EvolutionToken;
use crate::domain::value::{DomainData, DomainValue, Evolvable, Provenance};

pub trait Identified {
    type Id: Clone + Eq + Hash + Display + Debug + Send + Sync + 'static;

    fn id(&self) -> &Self::Id;
}

#[derive(Debug, Clone, Serialize)]
pub struct Entity<I, T: DomainData> {
    id: I,
    #[serde(flatten)]
    value: DomainValue<T>,
}

impl<I, T> Entity<I, T>
where
    I: Clone + Eq + Hash + Display + Debug + Send + Sync + 'static,
    T: DomainData,
{
    pub fn new(id: I, data: T, clock: &dyn Clock) -> Result<Self, DomainValidationError> {
        Ok(Self {
            id,
            value: DomainValue::new(data, clock)?,
        })
    }

    pub fn with_origin(
        id: I,
        data: T,
        created_by: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainValidationError> {
        Ok(Self {
            id,
            value: DomainValue::with_origin(data, created_by, created_at)?,
        })
    }

    pub fn data(&self) -> &T {
        self.value.data()
    }

    pub fn value(&self) -> &DomainValue<T> {
        &self.value
    }

    pub fn revision(&self) -> u64 {
        self.value.revision()
    }

    pub fn provenance(&self) -> &Provenance<T::Patch> {
        self.value.provenance()
    }
}

impl<I, T> Identified for Entity<I, T>
where
    I: Clone + Eq + Hash + Display + Debug + Send + Sync + 'static,
    T: DomainData,
{
    type Id = I;

    fn id(&self) -> &I {
        &self.id
    }
}

impl<I, T> Evolvable for Entity<I, T>
where
    I: Clone + Eq + Hash + Display + Debug + Send + Sync + 'static,
    T: DomainData,
{
    type Patch = T::Patch;

    fn evolve(
        &self,
        changes: T::Patch,
        reason: &str,
        token: &EvolutionToken,
    ) -> Result<Self, KernelError> {
        Ok(Self {
            id: self.id.clone(),
            value: self.value.evolve(changes, reason, token)?,
        })
    }

    fn revision(&self) -> u64 {
        self.value.revision()
    }
}

impl<I: PartialEq, T: DomainData> PartialEq for Entity<I, T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<I: Eq, T: DomainData> Eq for Entity<I, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::Validatable;
    use crate::infrastructure::virtual_clock::VirtualClock;
    use std::sync::Arc;

    #[derive(Debug, Clone, Serialize)]
    struct Note {
        text: String,
    }

    impl Validatable for Note {
        fn validate(&self) -> Result<(), DomainValidationError> {
            Ok(())
        }
    }

    impl DomainData for Note {
        type Patch = String;

        fn merge(&self, changes: &String) -> Self {
            Self {
                text: changes.clone(),
            }
        }
    }

    #[test]
    fn test_equality_is_by_identity() {
        let clock = VirtualClock::new(0);
        let a = Entity::new("n-1".to_string(), Note { text: "x".into() }, &clock).unwrap();
        let b = Entity::new("n-1".to_string(), Note { text: "y".into() }, &clock).unwrap();
        let c = Entity::new("n-2".to_string(), Note { text: "x".into() }, &clock).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_evolve_keeps_identity() {
        let clock = Arc::new(VirtualClock::new(0));
        let token = EvolutionToken::mint(clock.clone());
        let note = Entity::new("n-1".to_string(), Note { text: "x".into() }, clock.as_ref()).unwrap();

        let edited = note.evolve("y".to_string(), "edit", &token).unwrap();
        assert_eq!(edited.id(), "n-1");
        assert_eq!(edited.data().text, "y");
        assert_eq!(edited.revision(), 2);
        assert_eq!(note.data().text, "x");
    }
}
