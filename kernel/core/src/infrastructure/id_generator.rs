// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0

use std::collections::HashMap;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::domain::ids::IdGenerator;

/// Random v4 UUIDs, optionally prefixed (`trace-6f1c…`).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self, prefix: Option<&str>) -> String {
        let id = Uuid::new_v4();
        match prefix {
            Some(prefix) => format!("{prefix}-{id}"),
            None => id.to_string(),
        }
    }
}

/// Deterministic `<prefix>-<n>` ids with one counter per prefix, starting at 1.
/// Unprefixed ids use the `id` prefix.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counters: Mutex<HashMap<String, u64>>,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.counters.lock().clear();
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self, prefix: Option<&str>) -> String {
        let prefix = prefix.unwrap_or("id");
        let mut counters = self.counters.lock();
        let next = counters.entry(prefix.to_string()).or_insert(0);
        *next += 1;
        format!("{prefix}-{next}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_counters_are_per_prefix() {
        let ids = SequentialIdGenerator::new();
        assert_eq!(ids.generate(Some("ticket")), "ticket-1");
        assert_eq!(ids.generate(Some("ticket")), "ticket-2");
        assert_eq!(ids.generate(Some("trace")), "trace-1");
        assert_eq!(ids.generate(None), "id-1");

        ids.reset();
        assert_eq!(ids.generate(Some("ticket")), "ticket-1");
    }

    #[test]
    fn test_uuid_ids_are_unique_and_prefixed() {
        let ids = UuidIdGenerator;
        let a = ids.generate(Some("trace"));
        let b = ids.generate(Some("trace"));
        assert_ne!(a, b);
        assert!(a.starts_with("trace-"));
        assert!(Uuid::parse_str(&ids.generate(None)).is_ok());
    }
}
