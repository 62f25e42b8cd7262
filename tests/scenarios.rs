//! End-to-end behaviour of the engine against the simulated network
//!
//! Each test drives a headless engine the way the TUI does: messages in,
//! state out, with the transport running on background tasks.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use dcnview_app::{AppConfig, Engine, ExecutionPhase, Message, ResponseLine};
use dcnview_core::{
    CommandResponse, EntityKind, EntityRef, FieldSpec, Schema, SubscriptionPattern, Value,
    ValueType,
};
use dcnview_transport::test_utils::{respond_with, test_command, test_command_with};
use dcnview_transport::{spawn_demo_device, SimulatedNetwork};

const WAIT: Duration = Duration::from_secs(2);

async fn subscribed_engine(network: &SimulatedNetwork) -> Engine<SimulatedNetwork> {
    let engine = Engine::new(Arc::new(network.clone()), AppConfig::default()).unwrap();
    engine
        .subscribe_commands(&SubscriptionPattern::any())
        .await
        .unwrap();
    engine
        .subscribe_info(&SubscriptionPattern::any())
        .await
        .unwrap();
    engine
}

/// Wait for `entity` to be discovered, select it and trigger it
async fn execute(engine: &mut Engine<SimulatedNetwork>, entity: &EntityRef) {
    let identifier = entity.identifier(EntityKind::Command);
    let found = engine
        .run_until(WAIT, |state| state.directory.command(&identifier).is_some())
        .await;
    assert!(found, "{identifier} never arrived");

    engine.state.selected = Some(identifier);
    engine.process_message(Message::ExecuteSelected);
    assert!(engine.state.execution.is_some());
}

#[tokio::test]
async fn test_info_update_keeps_node_identity() {
    let network = SimulatedNetwork::new();
    let mut engine = subscribed_engine(&network).await;
    let entity = EntityRef::new("aa:01", "sensor", "readings", "count");

    network.publish_info(&entity, Value::Int(5)).unwrap();
    assert!(
        engine
            .run_until(WAIT, |state| state.directory.info(&entity).is_some())
            .await
    );
    let binding = engine.state.directory.info(&entity).unwrap().binding_id();
    assert!(binding.is_some());

    network.publish_info(&entity, Value::Int(7)).unwrap();
    assert!(
        engine
            .run_until(WAIT, |state| state
                .directory
                .info(&entity)
                .is_some_and(|node| node.value() == &Value::Int(7)))
            .await
    );

    let node = engine.state.directory.info(&entity).unwrap();
    assert_eq!(node.name(), "count");
    assert_eq!(node.display_value(), "7");
    assert_eq!(node.binding_id(), binding);
    assert_eq!(engine.state.directory.info_count(), 1);
}

#[tokio::test]
async fn test_empty_response_closes_surface() {
    let network = SimulatedNetwork::new();
    let mut engine = subscribed_engine(&network).await;
    let command = test_command("aa:01", "power", "control", "reset");
    let entity = command.entity.clone();
    network.add_command(command, respond_with(CommandResponse::empty()));

    execute(&mut engine, &entity).await;
    assert!(
        engine
            .run_until(WAIT, |state| state.execution.is_none())
            .await
    );
    assert_eq!(engine.state.pending_teardown(), 0);
}

#[tokio::test]
async fn test_error_response_stays_open_with_exact_text() {
    let network = SimulatedNetwork::new();
    let mut engine = subscribed_engine(&network).await;
    let command = test_command("aa:01", "power", "control", "reset");
    let entity = command.entity.clone();
    network.add_command(command, respond_with(CommandResponse::error("device busy")));

    execute(&mut engine, &entity).await;
    assert!(
        engine
            .run_until(WAIT, |state| state
                .execution
                .as_ref()
                .is_some_and(|surface| surface.phase != ExecutionPhase::Calling))
            .await
    );

    let surface = engine.state.execution.as_ref().unwrap();
    assert_eq!(surface.phase, ExecutionPhase::Error("device busy".into()));
}

#[tokio::test]
async fn test_undeclared_response_field_is_flagged() {
    let network = SimulatedNetwork::new();
    let mut engine = subscribed_engine(&network).await;

    let mut response_schema = Schema::new();
    response_schema.insert("a".into(), FieldSpec::required(ValueType::Int));
    let command = test_command_with(
        "aa:01",
        "power",
        "control",
        "status",
        Schema::new(),
        response_schema,
    );
    let entity = command.entity.clone();
    network.add_command(
        command,
        respond_with(
            CommandResponse::empty()
                .with_field("a", json!(3))
                .with_field("extra", json!("x")),
        ),
    );

    execute(&mut engine, &entity).await;
    assert!(
        engine
            .run_until(WAIT, |state| state
                .execution
                .as_ref()
                .is_some_and(|surface| matches!(surface.phase, ExecutionPhase::Response(_))))
            .await
    );

    let ExecutionPhase::Response(lines) = &engine.state.execution.as_ref().unwrap().phase else {
        unreachable!();
    };
    let rendered: Vec<String> = lines.iter().map(ResponseLine::to_string).collect();
    assert_eq!(rendered, ["a: 3", "invalid field extra"]);
}

#[tokio::test]
async fn test_lookup_in_flight_when_engine_drops() {
    let network = SimulatedNetwork::new();
    let engine = subscribed_engine(&network).await;
    let stats = engine.bridge_stats();
    network.set_lookup_delay(Duration::from_millis(100));

    network.add_command(
        test_command("aa:01", "power", "control", "reset"),
        respond_with(CommandResponse::empty()),
    );
    drop(engine);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(stats.posted(), 0);
    assert_eq!(stats.stale(), 1);
}

#[tokio::test]
async fn test_removing_last_info_destroys_service() {
    let network = SimulatedNetwork::new();
    let mut engine = subscribed_engine(&network).await;
    let entity = EntityRef::new("aa:01", "sensor", "readings", "level");

    network.publish_info(&entity, Value::Float(0.5)).unwrap();
    assert!(
        engine
            .run_until(WAIT, |state| state.directory.service_count() == 1)
            .await
    );

    network.remove_info(&entity);
    assert!(
        engine
            .run_until(WAIT, |state| state.directory.is_empty())
            .await
    );
    assert_eq!(engine.state.directory.service_count(), 0);
    assert_eq!(engine.state.directory.device_count(), 0);
}

#[tokio::test]
async fn test_demo_device_appears_and_goes_away() {
    let network = SimulatedNetwork::new();
    let mut engine = subscribed_engine(&network).await;

    let device = spawn_demo_device(
        &network,
        "02:00:00:00:00:01",
        "test",
        "command",
        "info",
        "values",
    );
    assert!(
        engine
            .run_until(WAIT, |state| {
                state.directory.command_count() == 5 && state.directory.info_count() == 4
            })
            .await
    );
    assert_eq!(engine.state.directory.device_count(), 1);

    // the counter field keeps moving while the device lives
    let counter = device.info()[0].clone();
    let first = engine.state.directory.info(&counter).unwrap().updates();
    assert!(
        engine
            .run_until(WAIT, |state| state
                .directory
                .info(&counter)
                .is_some_and(|node| node.updates() > first))
            .await
    );

    drop(device);
    assert!(
        engine
            .run_until(WAIT, |state| state.directory.is_empty())
            .await
    );
}

#[tokio::test]
async fn test_disabled_demo_command_is_enabled_by_its_sibling() {
    let network = SimulatedNetwork::new();
    let mut engine = subscribed_engine(&network).await;
    let device = spawn_demo_device(
        &network,
        "02:00:00:00:00:01",
        "test",
        "command",
        "info",
        "values",
    );
    let enabler = device.commands()[3].clone();
    let target = device.commands()[4].identifier(EntityKind::Command);

    assert!(
        engine
            .run_until(WAIT, |state| state
                .directory
                .command(&target)
                .is_some_and(|record| !record.enabled))
            .await
    );

    // the enabler answers with nothing, so its surface closes on its own
    execute(&mut engine, &enabler).await;
    assert!(
        engine
            .run_until(WAIT, |state| {
                state.execution.is_none()
                    && state
                        .directory
                        .command(&target)
                        .is_some_and(|record| record.enabled)
            })
            .await
    );
}
