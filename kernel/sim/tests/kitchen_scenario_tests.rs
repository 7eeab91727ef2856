// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Kitchen scenarios replayed end to end, including golden-log verification.

use serde_json::{json, Value};
use tessera_sim::kitchen::{KitchenApp, SYSTEM_CLOCK_PRINCIPAL};
use tessera_sim::{
    DispatchOutcome, HarnessFactory, HarnessOptions, LogCapture, LogVerifier, Scenario, ScenarioRunner,
    SimulationError, VerifyOutcome, World,
};
use tracing::level_filters::LevelFilter;

const L1_HAPPY_PATH: &str = include_str!("../scenarios/l1_happy_path.yaml");
const L3_DURATION: &str = include_str!("../scenarios/l3_duration.yaml");

fn kitchen(scheduled_completion: bool) -> World<KitchenApp> {
    HarnessFactory::kitchen(&HarnessOptions::default().with_scheduled_completion(scheduled_completion))
}

async fn captured_run(yaml: &str, scheduled_completion: bool) -> Vec<String> {
    let scenario = Scenario::from_yaml_str(yaml).unwrap();
    let world = kitchen(scheduled_completion);
    let capture = LogCapture::new();
    capture
        .capture(LevelFilter::INFO, ScenarioRunner::new(&world).play(&scenario))
        .await
        .unwrap();
    capture.lines()
}

#[tokio::test]
async fn test_l1_happy_path_reports_last_written_status() {
    let scenario = Scenario::from_yaml_str(L1_HAPPY_PATH).unwrap();
    let world = kitchen(false);

    let summary = ScenarioRunner::new(&world).play(&scenario).await.unwrap();

    assert_eq!(summary.steps, 9);
    assert_eq!(summary.acts, 4);
    assert_eq!(summary.assertions, 4);
    assert_eq!(summary.rejected, 0);
    assert_eq!(summary.elapsed_ms, 5_000);
}

#[tokio::test]
async fn test_l1_events_publish_in_command_order() {
    let scenario = Scenario::from_yaml_str(L1_HAPPY_PATH).unwrap();
    let world = kitchen(false);
    let mut observer = world.event_bus().observe();

    ScenarioRunner::new(&world).play(&scenario).await.unwrap();

    let names: Vec<_> = observer.drain().into_iter().map(|p| p.event.name).collect();
    assert_eq!(
        names,
        vec![
            "OrderPlaced",
            "CookingStarted",
            "ItemCompleted",
            "TicketCompleted",
            "OrderPlaced"
        ]
    );
}

#[tokio::test]
async fn test_l3_scheduled_completion_fires_at_twenty_minutes() {
    let scenario = Scenario::from_yaml_str(L3_DURATION).unwrap();
    let world = kitchen(true);
    let mut observer = world.event_bus().observe();

    let summary = ScenarioRunner::new(&world).play(&scenario).await.unwrap();

    assert_eq!(summary.tasks_run, 1);
    assert_eq!(summary.elapsed_ms, 1_200_000);

    let completed = observer
        .drain()
        .into_iter()
        .find(|p| p.event.name == "ItemCompleted")
        .unwrap();
    assert_eq!(completed.context.principal.as_deref(), Some(SYSTEM_CLOCK_PRINCIPAL));
    assert_eq!(completed.event.payload["itemName"], "Steak");
    assert_eq!(completed.event.timestamp.timestamp_millis(), 1_200_000);
}

#[tokio::test]
async fn test_l3_without_scheduling_fails_naming_query_and_values() {
    let scenario = Scenario::from_yaml_str(L3_DURATION).unwrap();
    let world = kitchen(false);

    let err = ScenarioRunner::new(&world).play(&scenario).await.unwrap_err();

    match err {
        SimulationError::AssertionFailed {
            query,
            expected,
            actual,
        } => {
            assert_eq!(query, "GetTicket");
            assert_eq!(expected["status"], "COMPLETED");
            assert_eq!(actual["status"], "COOKING");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_business_rejections_do_not_abort() {
    let world = kitchen(false);

    world
        .dispatch("Waiter", "PlaceOrder", json!({ "items": ["Soup"] }))
        .await
        .unwrap();
    world
        .dispatch("Chef", "StartCooking", json!({ "ticketId": "ticket-1" }))
        .await
        .unwrap();

    let twice = world
        .dispatch("Chef", "StartCooking", json!({ "ticketId": "ticket-1" }))
        .await
        .unwrap();
    assert_eq!(
        twice,
        DispatchOutcome::Rejected {
            code: "BUSINESS_RULE_VIOLATION",
            message: "Cannot start cooking from status: COOKING".to_string()
        }
    );

    let missing = world
        .dispatch("Chef", "StartCooking", json!({ "ticketId": "ticket-9" }))
        .await
        .unwrap();
    assert!(missing.is_rejected());

    let empty = world
        .dispatch("Waiter", "PlaceOrder", json!({ "items": [] }))
        .await
        .unwrap();
    assert!(matches!(empty, DispatchOutcome::Rejected { code: "DOMAIN_VALIDATION_ERROR", .. }));

    let tickets = world.query("ListTickets", Value::Null).await.unwrap();
    assert_eq!(tickets.as_array().map(Vec::len), Some(1));
    assert_eq!(tickets[0]["status"], "COOKING");
    assert_eq!(tickets[0]["revision"], 2);
}

#[tokio::test]
async fn test_place_order_returns_sequential_ticket_ids() {
    let world = kitchen(false);
    let first = world
        .dispatch("Waiter", "PlaceOrder", json!({ "items": ["Soup"] }))
        .await
        .unwrap();
    let second = world
        .dispatch("Waiter", "PlaceOrder", json!({ "items": ["Pie"] }))
        .await
        .unwrap();

    assert_eq!(first, DispatchOutcome::Completed(json!({ "ticketId": "ticket-1" })));
    assert_eq!(second, DispatchOutcome::Completed(json!({ "ticketId": "ticket-2" })));
}

#[tokio::test]
async fn test_captured_logs_are_structured_and_deterministic() {
    let first = captured_run(L1_HAPPY_PATH, false).await;
    let second = captured_run(L1_HAPPY_PATH, false).await;

    assert!(!first.is_empty());
    assert_eq!(first, second);

    let entries: Vec<Value> = first.iter().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert!(entries
        .iter()
        .any(|e| e["message"] == "Unit of work committed" && e["trace_id"] == "trace-1"));
    assert!(entries
        .iter()
        .any(|e| e["message"] == "Event published" && e["event"] == "OrderPlaced"));
    assert!(entries.iter().any(|e| e["message"] == "Evolution applied" && e["policy"] == "KitchenPolicy"));
    assert!(entries.iter().all(|e| e.get("timestamp").is_none()));
}

#[tokio::test]
async fn test_golden_log_bootstraps_then_verifies() {
    let dir = tempfile::tempdir().unwrap();
    let golden = dir.path().join("L3_Duration.golden.jsonl");

    let bootstrap = captured_run(L3_DURATION, true).await;
    assert!(matches!(
        LogVerifier::verify(&bootstrap, &golden).unwrap(),
        VerifyOutcome::Bootstrapped { .. }
    ));

    let replay = captured_run(L3_DURATION, true).await;
    assert_eq!(
        LogVerifier::verify(&replay, &golden).unwrap(),
        VerifyOutcome::Matched { lines: replay.len() }
    );

    let mut drifted = replay.clone();
    drifted[2] = r#"{"level":"INFO","message":"something else"}"#.to_string();
    let err = LogVerifier::verify(&drifted, &golden).unwrap_err();
    assert!(matches!(err, SimulationError::LogLineMismatch { line: 3, .. }));

    let err = LogVerifier::verify(&replay[1..], &golden).unwrap_err();
    assert!(matches!(err, SimulationError::LogLengthMismatch { .. }));
}
