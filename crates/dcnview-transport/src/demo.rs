//! Demo device for the simulated network
//!
//! Publishes five commands and four live info fields:
//!
//! | command | arguments | response | behaviour |
//! |---|---|---|---|
//! | `<prefix>1` | full | full | echoes its arguments |
//! | `<prefix>2` | full | none | returns nothing |
//! | `<prefix>3` | none | full | returns a fixed response |
//! | `<prefix>4` | none | none | enables `<prefix>5` |
//! | `<prefix>5` | none | none | disables itself, starts disabled |

use std::sync::{Arc, Weak};
use std::time::Duration;

use serde_json::json;
use tokio::task::JoinHandle;

use dcnview_core::prelude::*;
use dcnview_core::{
    ArgumentMap, CommandRecord, CommandResponse, EntityRef, FieldSpec, Schema, Value, ValueType,
};

use crate::sim::{CommandHandler, SimulatedNetwork, WeakNetwork};

/// Info republish period
pub const PUBLISH_INTERVAL: Duration = Duration::from_millis(250);

const COMMAND_CATEGORY: &str = "test";

/// A running demo device.
///
/// Its publishing task stops once this is dropped, and its commands and info
/// fields are withdrawn from the network.
pub struct DemoDevice {
    network: SimulatedNetwork,
    mac: String,
    service: String,
    commands: Vec<EntityRef>,
    info: Vec<EntityRef>,
    _alive: Arc<()>,
    task: JoinHandle<()>,
}

impl DemoDevice {
    pub fn mac(&self) -> &str {
        &self.mac
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn commands(&self) -> &[EntityRef] {
        &self.commands
    }

    pub fn info(&self) -> &[EntityRef] {
        &self.info
    }
}

impl Drop for DemoDevice {
    fn drop(&mut self) {
        self.task.abort();
        for entity in &self.commands {
            self.network.remove_command(entity);
        }
        for entity in &self.info {
            self.network.remove_info(entity);
        }
    }
}

/// `arg1: int`, `arg2: string?`, `arg3: float?`, `arg4: bool?`
pub fn demo_schema() -> Schema {
    let mut schema = Schema::new();
    schema.insert("arg1".into(), FieldSpec::required(ValueType::Int));
    schema.insert("arg2".into(), FieldSpec::optional(ValueType::String));
    schema.insert("arg3".into(), FieldSpec::optional(ValueType::Float));
    schema.insert("arg4".into(), FieldSpec::optional(ValueType::Bool));
    schema
}

fn fixed_response() -> CommandResponse {
    CommandResponse::empty()
        .with_field("arg1", json!(1))
        .with_field("arg2", json!("test"))
        .with_field("arg3", json!(1.1))
        .with_field("arg4", json!(true))
}

fn echo(args: &ArgumentMap) -> CommandResponse {
    args.iter()
        .fold(CommandResponse::empty(), |response, (name, value)| {
            response.with_field(name.clone(), value.to_json())
        })
}

fn toggle(network: WeakNetwork, target: EntityRef, enabled: bool) -> CommandHandler {
    Arc::new(move |_: &ArgumentMap| match network.upgrade() {
        Some(network) if network.enable_command(&target, enabled) => CommandResponse::empty(),
        _ => CommandResponse::error(format!("cannot update {}", target.name)),
    })
}

/// Publish a demo device and start its info task
///
/// Must be called from within a tokio runtime.
pub fn spawn_demo_device(
    network: &SimulatedNetwork,
    mac: &str,
    service: &str,
    command_prefix: &str,
    info_prefix: &str,
    info_category: &str,
) -> DemoDevice {
    let entity = |category: String, name: String| EntityRef::new(mac, service, category, name);
    let command_entity =
        |n: u8| entity(format!("{COMMAND_CATEGORY}{n}"), format!("{command_prefix}{n}"));
    let info_entity = |n: u8| entity(format!("{info_category}{n}"), format!("{info_prefix}{n}"));

    let schema = demo_schema();
    let weak = network.downgrade();
    let fifth = command_entity(5);

    let table: [(u8, Schema, Schema, bool, CommandHandler); 5] = [
        (1, schema.clone(), schema.clone(), true, Arc::new(echo)),
        (
            2,
            schema.clone(),
            Schema::new(),
            true,
            Arc::new(|_: &ArgumentMap| CommandResponse::empty()),
        ),
        (
            3,
            Schema::new(),
            schema,
            true,
            Arc::new(|_: &ArgumentMap| fixed_response()),
        ),
        (
            4,
            Schema::new(),
            Schema::new(),
            true,
            toggle(weak.clone(), fifth.clone(), true),
        ),
        (
            5,
            Schema::new(),
            Schema::new(),
            false,
            toggle(weak, fifth, false),
        ),
    ];

    let mut commands = Vec::with_capacity(table.len());
    for (n, arguments, response, enabled, handler) in table {
        let record = CommandRecord {
            entity: command_entity(n),
            enabled,
            arguments,
            response,
        };
        commands.push(record.entity.clone());
        if !network.add_command(record, handler) {
            warn!("Demo device {}/{} rejected command {}", mac, service, n);
        }
    }

    let info: Vec<EntityRef> = (1..=4).map(info_entity).collect();
    let alive = Arc::new(());
    let task = tokio::spawn(publish_loop(
        network.downgrade(),
        Arc::downgrade(&alive),
        info.clone(),
    ));

    info!("Demo device {}/{} started", mac, service);

    DemoDevice {
        network: network.clone(),
        mac: mac.to_string(),
        service: service.to_string(),
        commands,
        info,
        _alive: alive,
        task,
    }
}

/// Republish the four info fields until the device or network is gone
async fn publish_loop(network: WeakNetwork, alive: Weak<()>, fields: Vec<EntityRef>) {
    let mut counter: i64 = 0;
    let mut level: f64 = 0.0;
    let mut flag = false;
    let mut interval = tokio::time::interval(PUBLISH_INTERVAL);

    loop {
        interval.tick().await;
        if alive.upgrade().is_none() {
            return;
        }
        let Some(network) = network.upgrade() else {
            return;
        };

        let values = [
            Value::Int(counter),
            Value::Float(level),
            Value::Bool(flag),
            Value::String(chrono::Local::now().format("%H:%M:%S").to_string()),
        ];
        for (entity, value) in fields.iter().zip(values) {
            if let Err(e) = network.publish_info(entity, value) {
                warn!("Demo publish of {} failed: {}", entity.name, e);
            }
        }

        counter += 1;
        level += 0.5;
        flag = !flag;
    }
}
