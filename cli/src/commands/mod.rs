// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Tessera CLI

pub mod config;
pub mod scenario;

pub use self::config::ConfigCommand;
pub use self::scenario::ScenarioCommand;
