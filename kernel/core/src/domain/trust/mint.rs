// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Identity registries backing every minted authority object.
//!
//! A [`Minted`] handle is valid iff its mark is the exact allocation recorded in
//! its registry at mint time. Validity is membership by identity: a handle that
//! carries the same serial but a different allocation is rejected. Dropping the
//! handle removes the mark, so validity never outlives the object.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
struct MintMark {
    serial: u64,
}

/// Private membership registry for one kind of authority.
pub(crate) struct MintRegistry {
    label: &'static str,
    marks: Mutex<HashMap<u64, Weak<MintMark>>>,
}

impl MintRegistry {
    pub(crate) fn new(label: &'static str) -> Self {
        Self {
            label,
            marks: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn mint(&'static self) -> Minted {
        let serial = NEXT_SERIAL.fetch_add(1, Ordering::Relaxed);
        let mark = Arc::new(MintMark { serial });
        self.marks.lock().insert(serial, Arc::downgrade(&mark));
        Minted {
            mark,
            registry: self,
        }
    }

    fn contains(&self, mark: &Arc<MintMark>) -> bool {
        self.marks
            .lock()
            .get(&mark.serial)
            .is_some_and(|recorded| std::ptr::eq(recorded.as_ptr(), Arc::as_ptr(mark)))
    }

    fn release(&self, mark: &Arc<MintMark>) {
        let mut marks = self.marks.lock();
        let owned = marks
            .get(&mark.serial)
            .is_some_and(|recorded| std::ptr::eq(recorded.as_ptr(), Arc::as_ptr(mark)));
        if owned {
            marks.remove(&mark.serial);
        }
    }

    #[cfg(test)]
    pub(crate) fn live_count(&self) -> usize {
        self.marks.lock().len()
    }
}

impl fmt::Debug for MintRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MintRegistry").field("label", &self.label).finish()
    }
}

/// Handle proving an object went through a registry's mint path.
pub(crate) struct Minted {
    mark: Arc<MintMark>,
    registry: &'static MintRegistry,
}

impl Minted {
    pub(crate) fn is_registered_in(&self, registry: &MintRegistry) -> bool {
        std::ptr::eq(self.registry, registry) && registry.contains(&self.mark)
    }

    pub(crate) fn serial(&self) -> u64 {
        self.mark.serial
    }

    /// Builds a handle that copies a serial without going through `mint`.
    #[cfg(test)]
    pub(crate) fn counterfeit(serial: u64, registry: &'static MintRegistry) -> Self {
        Self {
            mark: Arc::new(MintMark { serial }),
            registry,
        }
    }
}

impl Drop for Minted {
    fn drop(&mut self) {
        self.registry.release(&self.mark);
    }
}

impl fmt::Debug for Minted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Minted")
            .field("registry", &self.registry.label)
            .field("serial", &self.mark.serial)
            .finish()
    }
}
