// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Scenarios
//!
//! A scenario is an ordered list of steps, tagged on `kind`:
//!
//! ```yaml
//! name: L1 Happy Path
//! seed: 1
//! steps:
//!   - kind: act
//!     actor: Waiter
//!     intent: PlaceOrder
//!     payload: { items: [Burger] }
//!   - kind: wait
//!     ms: 5000
//!   - kind: assert
//!     query: GetTicket
//!     params: { ticketId: ticket-1 }
//!     expect: { status: RECEIVED, items: [{ name: Burger, status: RECEIVED, course: 1 }] }
//! ```
//!
//! The runner executes steps strictly in order and stops at the first failure.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_core::Clock;
use tracing::{debug, info};

use crate::error::SimulationError;
use crate::world::{DispatchOutcome, SimulationApp, World};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Step {
    /// Moves virtual time forward, running everything that falls due.
    Wait { ms: u64 },
    /// Dispatches an intent, then settles the world at the current instant.
    Act {
        actor: String,
        intent: String,
        #[serde(default)]
        payload: Value,
    },
    /// Queries and deep-compares against `expect`.
    Assert {
        query: String,
        #[serde(default)]
        params: Value,
        expect: Value,
    },
}

fn default_seed() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default = "default_seed")]
    pub seed: u32,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Loads a `.json` file as JSON and anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SimulationError::io(path, e))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            Self::from_json_str(&content).map_err(|e| e.to_string())
        } else {
            Self::from_yaml_str(&content).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| SimulationError::InvalidScenario {
            path: path.to_path_buf(),
            message,
        })
    }
}

/// Counts gathered while playing a scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub steps: usize,
    pub acts: usize,
    pub rejected: usize,
    pub assertions: usize,
    pub tasks_run: usize,
    pub elapsed_ms: i64,
}

pub struct ScenarioRunner<'w, A: SimulationApp> {
    world: &'w World<A>,
}

impl<'w, A: SimulationApp> ScenarioRunner<'w, A> {
    pub fn new(world: &'w World<A>) -> Self {
        Self { world }
    }

    pub async fn play(&self, scenario: &Scenario) -> Result<RunSummary, SimulationError> {
        let clock = self.world.clock();
        let started_at = clock.now_ms();
        self.world.random().reseed(scenario.seed);
        info!(scenario = %scenario.name, seed = scenario.seed, steps = scenario.steps.len(), "Scenario started");

        let mut summary = RunSummary::default();
        for step in &scenario.steps {
            match step {
                Step::Wait { ms } => {
                    info!(ms, "Wait");
                    summary.tasks_run += clock.advance(*ms).await;
                }
                Step::Act {
                    actor,
                    intent,
                    payload,
                } => {
                    let outcome = self.world.dispatch(actor, intent, payload.clone()).await?;
                    if let DispatchOutcome::Rejected { .. } = outcome {
                        summary.rejected += 1;
                    }
                    summary.acts += 1;
                    summary.tasks_run += self.world.settle().await;
                }
                Step::Assert {
                    query,
                    params,
                    expect,
                } => {
                    let actual = self.world.query(query, params.clone()).await?;
                    if actual != *expect {
                        return Err(SimulationError::AssertionFailed {
                            query: query.clone(),
                            expected: expect.clone(),
                            actual,
                        });
                    }
                    debug!(query = %query, "Assertion passed");
                    summary.assertions += 1;
                }
            }
            summary.steps += 1;
        }

        summary.elapsed_ms = clock.now_ms() - started_at;
        info!(
            scenario = %scenario.name,
            acts = summary.acts,
            rejected = summary.rejected,
            assertions = summary.assertions,
            elapsed_ms = summary.elapsed_ms,
            "Scenario finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_parse_from_yaml() {
        let scenario = Scenario::from_yaml_str(
            r#"
name: Parse
steps:
  - kind: wait
    ms: 250
  - kind: act
    actor: Waiter
    intent: PlaceOrder
    payload: { items: [Fries] }
  - kind: assert
    query: ListTickets
    expect: []
"#,
        )
        .unwrap();

        assert_eq!(scenario.seed, 1);
        assert_eq!(scenario.steps[0], Step::Wait { ms: 250 });
        assert!(matches!(&scenario.steps[1], Step::Act { intent, .. } if intent == "PlaceOrder"));
        assert_eq!(
            scenario.steps[2],
            Step::Assert {
                query: "ListTickets".to_string(),
                params: Value::Null,
                expect: serde_json::json!([]),
            }
        );
    }

    #[test]
    fn test_unknown_step_kind_is_rejected() {
        let err = Scenario::from_json_str(r#"{"name":"x","steps":[{"kind":"sleep","ms":1}]}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_from_file_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("s.json");
        std::fs::write(&json_path, r#"{"name":"J","seed":9,"steps":[]}"#).unwrap();
        let yaml_path = dir.path().join("s.yaml");
        std::fs::write(&yaml_path, "name: Y\nsteps: []\n").unwrap();

        assert_eq!(Scenario::from_file(&json_path).unwrap().seed, 9);
        assert_eq!(Scenario::from_file(&yaml_path).unwrap().name, "Y");

        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "name: [").unwrap();
        assert!(matches!(
            Scenario::from_file(&broken),
            Err(SimulationError::InvalidScenario { .. })
        ));
    }
}
