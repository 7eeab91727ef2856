// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # `tessera-sim` - Deterministic Scenario Replay
//!
//! Replays scripted workflows against a [`World`] running on a virtual clock,
//! then compares the captured structured log stream with a golden file.
//!
//! ```text
//! Scenario ──▶ ScenarioRunner ──▶ World<A> ──▶ A: SimulationApp ──▶ ExecutionKernel
//!                   │                 │
//!                   │                 └── VirtualClock / InMemoryEventBus / SimulatedRandom
//!                   └── LogCapture ──▶ LogVerifier ──▶ *.golden.jsonl
//! ```

pub mod error;
pub mod harness;
pub mod kitchen;
pub mod log_capture;
pub mod log_verifier;
pub mod scenario;
pub mod world;

pub use error::SimulationError;
pub use harness::{HarnessFactory, HarnessOptions};
pub use log_capture::LogCapture;
pub use log_verifier::{LogVerifier, VerifyOutcome};
pub use scenario::{RunSummary, Scenario, ScenarioRunner, Step};
pub use world::{DispatchOutcome, SimulationApp, World};
