//! Service directory: the Device → Service → Category → Field/Command tree
//!
//! Devices and services have no lifecycle of their own. A service exists
//! while it holds at least one info field or command and is destroyed with
//! its last one; a device likewise with its last service. Categories are a
//! presentation partition created on first use, kept in first-seen order and
//! only ever dropped together with their service.
//!
//! Mutated only from the UI loop.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use dcnview_core::prelude::*;
use dcnview_core::{
    CommandRecord, EntityKind, EntityRef, Identifier, InfoRecord, ServiceKey, Value,
};
use dcnview_transport::InfoSource;

use crate::binding::{BindingId, FieldBinding};

/// Whether an upsert created a node or updated one in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

#[derive(Debug)]
pub struct InfoNode {
    record: InfoRecord,
    binding: Option<FieldBinding>,
    updates: u64,
}

impl InfoNode {
    pub fn record(&self) -> &InfoRecord {
        &self.record
    }

    pub fn name(&self) -> &str {
        &self.record.entity.name
    }

    pub fn value(&self) -> &Value {
        &self.record.value
    }

    /// Rendered with the shared array/bool text rules
    pub fn display_value(&self) -> String {
        self.record.value.to_string()
    }

    pub fn binding_id(&self) -> Option<BindingId> {
        self.binding.as_ref().map(FieldBinding::id)
    }

    /// Number of live value updates applied since creation
    pub fn updates(&self) -> u64 {
        self.updates
    }
}

#[derive(Debug)]
pub struct CommandNode {
    record: CommandRecord,
}

impl CommandNode {
    pub fn record(&self) -> &CommandRecord {
        &self.record
    }

    pub fn name(&self) -> &str {
        &self.record.entity.name
    }

    pub fn is_enabled(&self) -> bool {
        self.record.enabled
    }
}

/// Names of the fields and commands shown under one category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryGroup {
    pub name: String,
    pub info: Vec<String>,
    pub commands: Vec<String>,
}

impl CategoryGroup {
    fn names_mut(&mut self, kind: EntityKind) -> &mut Vec<String> {
        match kind {
            EntityKind::Info => &mut self.info,
            EntityKind::Command => &mut self.commands,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_empty() && self.commands.is_empty()
    }
}

#[derive(Debug)]
pub struct ServiceNode {
    key: ServiceKey,
    categories: Vec<CategoryGroup>,
    info: HashMap<String, InfoNode>,
    commands: HashMap<String, CommandNode>,
}

impl ServiceNode {
    fn new(key: ServiceKey) -> Self {
        debug!("Service {} created", key);
        Self {
            key,
            categories: Vec::new(),
            info: HashMap::new(),
            commands: HashMap::new(),
        }
    }

    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.key.service
    }

    pub fn info_count(&self) -> usize {
        self.info.len()
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_empty() && self.commands.is_empty()
    }

    /// Category groups in first-seen order
    pub fn categories(&self) -> &[CategoryGroup] {
        &self.categories
    }

    pub fn info(&self, name: &str) -> Option<&InfoNode> {
        self.info.get(name)
    }

    pub fn command(&self, name: &str) -> Option<&CommandNode> {
        self.commands.get(name)
    }

    /// Record `name` under `category`, moving it if its category changed
    fn place(&mut self, kind: EntityKind, name: &str, category: &str, previous: Option<&str>) {
        if previous == Some(category) {
            return;
        }
        if let Some(previous) = previous {
            self.unplace(kind, name, previous);
        }

        let index = match self.categories.iter().position(|g| g.name == category) {
            Some(index) => index,
            None => {
                self.categories.push(CategoryGroup {
                    name: category.to_string(),
                    ..Default::default()
                });
                self.categories.len() - 1
            }
        };
        let names = self.categories[index].names_mut(kind);
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    fn unplace(&mut self, kind: EntityKind, name: &str, category: &str) {
        if let Some(group) = self.categories.iter_mut().find(|g| g.name == category) {
            group.names_mut(kind).retain(|n| n != name);
        }
    }
}

#[derive(Debug)]
pub struct DeviceNode {
    mac: String,
    services: BTreeMap<String, ServiceNode>,
}

impl DeviceNode {
    pub fn mac(&self) -> &str {
        &self.mac
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceNode> {
        self.services.values()
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

#[derive(Debug, Default)]
pub struct ServiceDirectory {
    devices: BTreeMap<String, DeviceNode>,
}

impl ServiceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an info field or update it in place.
    ///
    /// `binding` replaces the current binding when given; `None` keeps it.
    pub fn upsert_info(&mut self, record: InfoRecord, binding: Option<FieldBinding>) -> Upsert {
        let name = record.entity.name.clone();
        let category = record.entity.category.clone();
        let service = self.service_entry(record.service_key());

        let (result, previous) = match service.info.get_mut(&name) {
            Some(node) => {
                let previous = node.record.entity.category.clone();
                node.record = record;
                if binding.is_some() {
                    node.binding = binding;
                }
                (Upsert::Updated, Some(previous))
            }
            None => {
                service.info.insert(
                    name.clone(),
                    InfoNode {
                        record,
                        binding,
                        updates: 0,
                    },
                );
                (Upsert::Created, None)
            }
        };
        service.place(EntityKind::Info, &name, &category, previous.as_deref());
        result
    }

    /// Remove an info field. No-op if it is absent or its identity differs.
    pub fn remove_info(&mut self, entity: &EntityRef) -> bool {
        let key = entity.service_key();
        let Some(service) = self.service_mut(&key) else {
            return false;
        };
        let matches = service
            .info
            .get(&entity.name)
            .is_some_and(|node| node.record.entity == *entity);
        if !matches {
            return false;
        }

        service.info.remove(&entity.name);
        service.unplace(EntityKind::Info, &entity.name, &entity.category);
        self.prune(&key);
        true
    }

    pub fn upsert_command(&mut self, record: CommandRecord) -> Upsert {
        let name = record.entity.name.clone();
        let category = record.entity.category.clone();
        let service = self.service_entry(record.service_key());

        let (result, previous) = match service.commands.get_mut(&name) {
            Some(node) => {
                let previous = node.record.entity.category.clone();
                node.record = record;
                (Upsert::Updated, Some(previous))
            }
            None => {
                service
                    .commands
                    .insert(name.clone(), CommandNode { record });
                (Upsert::Created, None)
            }
        };
        service.place(EntityKind::Command, &name, &category, previous.as_deref());
        result
    }

    /// Remove a command. No-op if it is absent or its identity differs.
    pub fn remove_command(&mut self, entity: &EntityRef) -> bool {
        let key = entity.service_key();
        let Some(service) = self.service_mut(&key) else {
            return false;
        };
        let matches = service
            .commands
            .get(&entity.name)
            .is_some_and(|node| node.record.entity == *entity);
        if !matches {
            return false;
        }

        service.commands.remove(&entity.name);
        service.unplace(EntityKind::Command, &entity.name, &entity.category);
        self.prune(&key);
        true
    }

    /// Apply a live value from binding `binding`.
    ///
    /// Ignored when the field is gone, rebound since, or the value type
    /// does not match the declared one.
    pub fn apply_value(&mut self, entity: &EntityRef, binding: BindingId, value: Value) -> bool {
        let Some(node) = self
            .service_mut(&entity.service_key())
            .and_then(|service| service.info.get_mut(&entity.name))
        else {
            return false;
        };
        if node.binding_id() != Some(binding) {
            trace!("Stale binding update for {}", entity.name);
            return false;
        }
        if value.value_type() != node.record.value_type {
            warn!(
                "Ignoring {} value for {} field {}",
                value.value_type(),
                node.record.value_type,
                entity.name
            );
            return false;
        }
        node.record.value = value;
        node.updates += 1;
        true
    }

    /// Whether the field is already bound to `source`
    pub fn is_bound_to(&self, entity: &EntityRef, source: &Arc<InfoSource>) -> bool {
        self.service(&entity.service_key())
            .and_then(|service| service.info.get(&entity.name))
            .and_then(|node| node.binding.as_ref())
            .is_some_and(|binding| binding.is_bound_to(source))
    }

    pub fn device(&self, mac: &str) -> Option<&DeviceNode> {
        self.devices.get(mac)
    }

    pub fn devices(&self) -> impl Iterator<Item = &DeviceNode> {
        self.devices.values()
    }

    pub fn service(&self, key: &ServiceKey) -> Option<&ServiceNode> {
        self.devices
            .get(&key.mac)
            .and_then(|device| device.services.get(&key.service))
    }

    pub fn info(&self, entity: &EntityRef) -> Option<&InfoNode> {
        self.service(&entity.service_key())
            .and_then(|service| service.info(&entity.name))
    }

    /// Commands in display order: device, service, category, insertion
    pub fn commands(&self) -> impl Iterator<Item = &CommandRecord> {
        self.devices.values().flat_map(|device| {
            device.services.values().flat_map(|service| {
                service.categories.iter().flat_map(move |group| {
                    group
                        .commands
                        .iter()
                        .filter_map(move |name| service.commands.get(name))
                        .map(CommandNode::record)
                })
            })
        })
    }

    pub fn command(&self, identifier: &Identifier) -> Option<&CommandRecord> {
        self.commands()
            .find(|record| record.identifier() == *identifier)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn service_count(&self) -> usize {
        self.devices.values().map(DeviceNode::service_count).sum()
    }

    pub fn info_count(&self) -> usize {
        self.services().map(ServiceNode::info_count).sum()
    }

    pub fn command_count(&self) -> usize {
        self.services().map(ServiceNode::command_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    fn services(&self) -> impl Iterator<Item = &ServiceNode> {
        self.devices.values().flat_map(|device| device.services.values())
    }

    fn service_mut(&mut self, key: &ServiceKey) -> Option<&mut ServiceNode> {
        self.devices
            .get_mut(&key.mac)
            .and_then(|device| device.services.get_mut(&key.service))
    }

    fn service_entry(&mut self, key: ServiceKey) -> &mut ServiceNode {
        let device = self
            .devices
            .entry(key.mac.clone())
            .or_insert_with(|| DeviceNode {
                mac: key.mac.clone(),
                services: BTreeMap::new(),
            });
        device
            .services
            .entry(key.service.clone())
            .or_insert_with(|| ServiceNode::new(key))
    }

    /// Destroy the service if empty, then the device if empty
    fn prune(&mut self, key: &ServiceKey) {
        let Some(device) = self.devices.get_mut(&key.mac) else {
            return;
        };
        if device.services.get(&key.service).is_some_and(ServiceNode::is_empty) {
            device.services.remove(&key.service);
            debug!("Service {} destroyed", key);
        }
        if device.services.is_empty() {
            self.devices.remove(&key.mac);
            debug!("Device {} destroyed", key.mac);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::WeakUi;
    use dcnview_core::Schema;

    fn info(service: &str, category: &str, name: &str, value: i64) -> InfoRecord {
        InfoRecord::new(EntityRef::new("aa", service, category, name), Value::Int(value))
    }

    fn command(service: &str, category: &str, name: &str) -> CommandRecord {
        CommandRecord {
            entity: EntityRef::new("aa", service, category, name),
            enabled: true,
            arguments: Schema::new(),
            response: Schema::new(),
        }
    }

    #[test]
    fn test_service_created_on_first_arrival() {
        let mut dir = ServiceDirectory::new();
        assert!(dir.is_empty());

        assert_eq!(dir.upsert_info(info("svc", "c", "a", 1), None), Upsert::Created);
        assert_eq!(dir.service_count(), 1);
        assert_eq!(dir.device_count(), 1);
    }

    #[test]
    fn test_upsert_same_name_updates_in_place() {
        let mut dir = ServiceDirectory::new();
        dir.upsert_info(info("svc", "c", "level", 5), None);
        assert_eq!(dir.upsert_info(info("svc", "c", "level", 7), None), Upsert::Updated);

        let node = dir.info(&EntityRef::new("aa", "svc", "c", "level")).unwrap();
        assert_eq!(node.value(), &Value::Int(7));
        assert_eq!(node.name(), "level");
        assert_eq!(dir.info_count(), 1);
    }

    #[test]
    fn test_count_to_zero_destroys_service_and_device() {
        let mut dir = ServiceDirectory::new();
        dir.upsert_info(info("svc", "c", "a", 1), None);
        dir.upsert_info(info("svc", "d", "b", 1), None);
        dir.upsert_command(command("svc", "c", "x"));

        assert!(dir.remove_info(&EntityRef::new("aa", "svc", "c", "a")));
        assert!(dir.remove_command(&EntityRef::new("aa", "svc", "c", "x")));
        assert_eq!(dir.service_count(), 1);

        assert!(dir.remove_info(&EntityRef::new("aa", "svc", "d", "b")));
        assert_eq!(dir.service_count(), 0);
        assert_eq!(dir.device_count(), 0);
    }

    #[test]
    fn test_other_services_survive() {
        let mut dir = ServiceDirectory::new();
        dir.upsert_info(info("one", "c", "a", 1), None);
        dir.upsert_info(info("two", "c", "a", 1), None);

        dir.remove_info(&EntityRef::new("aa", "one", "c", "a"));
        assert!(dir.service(&ServiceKey::new("aa", "one")).is_none());
        assert!(dir.service(&ServiceKey::new("aa", "two")).is_some());
        assert_eq!(dir.device_count(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut dir = ServiceDirectory::new();
        assert!(!dir.remove_info(&EntityRef::new("aa", "svc", "c", "a")));
        assert!(!dir.remove_command(&EntityRef::new("aa", "svc", "c", "a")));

        dir.upsert_command(command("svc", "c", "x"));
        assert!(!dir.remove_command(&EntityRef::new("aa", "svc", "c", "y")));
        // same name, different category is a different entity
        assert!(!dir.remove_command(&EntityRef::new("aa", "svc", "other", "x")));
        assert_eq!(dir.command_count(), 1);
    }

    #[test]
    fn test_categories_keep_first_seen_order() {
        let mut dir = ServiceDirectory::new();
        dir.upsert_info(info("svc", "zeta", "a", 1), None);
        dir.upsert_info(info("svc", "alpha", "b", 1), None);
        dir.upsert_command(command("svc", "zeta", "x"));

        let service = dir.service(&ServiceKey::new("aa", "svc")).unwrap();
        let names: Vec<&str> = service.categories().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha"]);
        assert_eq!(service.categories()[0].commands, ["x"]);
    }

    #[test]
    fn test_emptied_category_is_kept() {
        let mut dir = ServiceDirectory::new();
        dir.upsert_info(info("svc", "first", "a", 1), None);
        dir.upsert_info(info("svc", "second", "b", 1), None);
        dir.remove_info(&EntityRef::new("aa", "svc", "first", "a"));

        let service = dir.service(&ServiceKey::new("aa", "svc")).unwrap();
        assert_eq!(service.categories().len(), 2);
        assert!(service.categories()[0].is_empty());
    }

    #[test]
    fn test_category_change_moves_entry() {
        let mut dir = ServiceDirectory::new();
        dir.upsert_info(info("svc", "old", "a", 1), None);
        dir.upsert_info(info("svc", "new", "a", 2), None);

        let service = dir.service(&ServiceKey::new("aa", "svc")).unwrap();
        assert!(service.categories()[0].info.is_empty());
        assert_eq!(service.categories()[1].info, ["a"]);
    }

    #[test]
    fn test_command_upsert_updates_enablement() {
        let mut dir = ServiceDirectory::new();
        let mut record = command("svc", "c", "x");
        record.enabled = false;
        dir.upsert_command(record.clone());

        record.enabled = true;
        assert_eq!(dir.upsert_command(record.clone()), Upsert::Updated);
        assert!(dir.command(&record.identifier()).unwrap().enabled);
        assert_eq!(dir.command_count(), 1);
    }

    #[test]
    fn test_commands_iterate_in_display_order() {
        let mut dir = ServiceDirectory::new();
        dir.upsert_command(command("b", "c2", "z"));
        dir.upsert_command(command("b", "c1", "y"));
        dir.upsert_command(command("a", "c", "x"));
        dir.upsert_command(command("b", "c2", "w"));

        let names: Vec<&str> = dir.commands().map(|c| c.entity.name.as_str()).collect();
        assert_eq!(names, ["x", "z", "w", "y"]);
    }

    #[test]
    fn test_apply_value_requires_current_binding() {
        let mut dir = ServiceDirectory::new();
        let record = info("svc", "c", "level", 5);
        let entity = record.entity.clone();
        let source = Arc::new(InfoSource::new(record.clone()));
        let binding = FieldBinding::bind(&source, entity.clone(), WeakUi::detached());
        let id = binding.id();
        dir.upsert_info(record, Some(binding));

        assert!(dir.is_bound_to(&entity, &source));
        assert!(dir.apply_value(&entity, id, Value::Int(7)));
        assert!(!dir.apply_value(&entity, BindingId::next(), Value::Int(9)));
        assert!(!dir.apply_value(&entity, id, Value::Float(1.0)));

        let node = dir.info(&entity).unwrap();
        assert_eq!(node.value(), &Value::Int(7));
        assert_eq!(node.updates(), 1);
    }

    #[test]
    fn test_removal_drops_binding() {
        let mut dir = ServiceDirectory::new();
        let record = info("svc", "c", "level", 5);
        let entity = record.entity.clone();
        let source = Arc::new(InfoSource::new(record.clone()));
        dir.upsert_info(
            record,
            Some(FieldBinding::bind(&source, entity.clone(), WeakUi::detached())),
        );
        assert_eq!(source.observer_count(), 1);

        dir.remove_info(&entity);
        assert_eq!(source.observer_count(), 0);
    }
}
