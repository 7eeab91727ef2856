// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;

use tessera_core::application::ExecutionKernel;
use tessera_core::domain::kernel_config::{ClockMode, IdStrategy};
use tessera_core::infrastructure::{InMemoryEventBus, SequentialIdGenerator, UuidIdGenerator, VirtualClock};
use tessera_core::{IdGenerator, KernelConfigManifest};
use tracing::debug;

use crate::kitchen::KitchenApp;
use crate::world::World;

/// Knobs for building a simulation world.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessOptions {
    pub seed: u32,
    /// Virtual time at which the world starts.
    pub start_ms: i64,
    pub id_strategy: IdStrategy,
    pub observer_capacity: usize,
    /// Let `StartCooking` schedule item completion on the clock.
    pub scheduled_completion: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            seed: 1,
            start_ms: 0,
            id_strategy: IdStrategy::Sequential,
            observer_capacity: 1000,
            scheduled_completion: false,
        }
    }
}

impl HarnessOptions {
    /// Takes start time and bus capacity from `config`. A `system` clock mode
    /// still yields a virtual clock starting at zero.
    ///
    /// Ids are always sequential: scenarios and golden logs refer to
    /// `ticket-1`, `item-1` and so on, whatever the configured strategy.
    pub fn from_config(config: &KernelConfigManifest) -> Self {
        let start_ms = match config.spec.clock.mode {
            ClockMode::Virtual => config.spec.clock.start_ms,
            ClockMode::System => 0,
        };
        if config.spec.ids.strategy != IdStrategy::Sequential {
            debug!(configured = ?config.spec.ids.strategy, "Replays use sequential ids");
        }
        Self {
            start_ms,
            id_strategy: IdStrategy::Sequential,
            observer_capacity: config.spec.event_bus.observer_capacity,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_scheduled_completion(mut self, enabled: bool) -> Self {
        self.scheduled_completion = enabled;
        self
    }
}

pub struct HarnessFactory;

impl HarnessFactory {
    pub fn kitchen(options: &HarnessOptions) -> World<KitchenApp> {
        debug!(?options, "Building kitchen world");

        let clock = Arc::new(VirtualClock::new(options.start_ms));
        let event_bus = Arc::new(InMemoryEventBus::new(options.observer_capacity));
        let ids: Arc<dyn IdGenerator> = match options.id_strategy {
            IdStrategy::Sequential => Arc::new(SequentialIdGenerator::new()),
            IdStrategy::Uuid => Arc::new(UuidIdGenerator),
        };

        let kernel = ExecutionKernel::new(clock.clone(), ids.clone(), event_bus.clone());
        let app = KitchenApp::new(kernel, ids, options.scheduled_completion);
        World::new(app, clock, event_bus, options.seed)
    }
}
