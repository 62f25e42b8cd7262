//! Identifier scheme for devices, services, info fields and commands
//!
//! An [`Identifier`] is the sole key used for lookup, deduplication and
//! filter matching. It is composed from five `/`-separated segments:
//!
//! ```text
//! <device-address>/<service>/<kind>/<category>/<name>
//! ```
//!
//! where `<kind>` is `command` or `info`. Category is always part of the
//! composition, for both kinds, so filters, transport lookups and directory
//! checks all agree on what an entity is.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between identifier segments. Components must not contain it.
pub const SEPARATOR: char = '/';

/// The two kinds of entity a service publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Command,
    Info,
}

impl EntityKind {
    /// Literal segment used in identifiers and filter patterns
    pub fn segment(&self) -> &'static str {
        match self {
            EntityKind::Command => "command",
            EntityKind::Info => "info",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Opaque, totally-ordered key for a command or info field
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the identifier for an entity.
///
/// Pure and deterministic. Injective as long as no component contains
/// [`SEPARATOR`]; see [`is_valid_component`].
pub fn make_identifier(
    kind: EntityKind,
    mac: &str,
    service: &str,
    category: &str,
    name: &str,
) -> Identifier {
    Identifier(format!(
        "{mac}{SEPARATOR}{service}{SEPARATOR}{}{SEPARATOR}{category}{SEPARATOR}{name}",
        kind.segment()
    ))
}

/// Whether a component can take part in an identifier
pub fn is_valid_component(component: &str) -> bool {
    !component.contains(SEPARATOR)
}

/// Key of a service node: (device-address, service-name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceKey {
    pub mac: String,
    pub service: String,
}

impl ServiceKey {
    pub fn new(mac: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            mac: mac.into(),
            service: service.into(),
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.mac, self.service)
    }
}

/// Identity of a single command or info field, without payload
///
/// This is what change notifications and removal events carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub mac: String,
    pub service: String,
    pub category: String,
    pub name: String,
}

impl EntityRef {
    pub fn new(
        mac: impl Into<String>,
        service: impl Into<String>,
        category: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            mac: mac.into(),
            service: service.into(),
            category: category.into(),
            name: name.into(),
        }
    }

    pub fn identifier(&self, kind: EntityKind) -> Identifier {
        make_identifier(kind, &self.mac, &self.service, &self.category, &self.name)
    }

    pub fn service_key(&self) -> ServiceKey {
        ServiceKey::new(self.mac.clone(), self.service.clone())
    }

    /// All components are non-empty where required and separator-free
    pub fn is_well_formed(&self) -> bool {
        !self.mac.is_empty()
            && !self.service.is_empty()
            && !self.name.is_empty()
            && [&self.mac, &self.service, &self.category, &self.name]
                .iter()
                .all(|c| is_valid_component(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_composition() {
        let id = make_identifier(EntityKind::Info, "aa:bb", "power", "battery", "level");
        assert_eq!(id.as_str(), "aa:bb/power/info/battery/level");
    }

    #[test]
    fn test_identifier_is_deterministic() {
        let a = make_identifier(EntityKind::Command, "aa", "svc", "cat", "reboot");
        let b = make_identifier(EntityKind::Command, "aa", "svc", "cat", "reboot");
        assert_eq!(a, b);
    }

    #[test]
    fn test_identifier_differs_in_every_component() {
        let base = make_identifier(EntityKind::Command, "aa", "svc", "cat", "name");
        let variants = [
            make_identifier(EntityKind::Info, "aa", "svc", "cat", "name"),
            make_identifier(EntityKind::Command, "ab", "svc", "cat", "name"),
            make_identifier(EntityKind::Command, "aa", "svx", "cat", "name"),
            make_identifier(EntityKind::Command, "aa", "svc", "cax", "name"),
            make_identifier(EntityKind::Command, "aa", "svc", "cat", "namx"),
        ];
        for variant in &variants {
            assert_ne!(&base, variant);
        }
    }

    #[test]
    fn test_identifier_empty_category_is_distinct() {
        let with = make_identifier(EntityKind::Info, "aa", "svc", "c", "n");
        let without = make_identifier(EntityKind::Info, "aa", "svc", "", "n");
        assert_ne!(with, without);
        assert_eq!(without.as_str(), "aa/svc/info//n");
    }

    #[test]
    fn test_identifiers_are_ordered() {
        let a = make_identifier(EntityKind::Info, "aa", "svc", "cat", "a");
        let b = make_identifier(EntityKind::Info, "aa", "svc", "cat", "b");
        assert!(a < b);
    }

    #[test]
    fn test_entity_ref_identifier_matches_free_function() {
        let entity = EntityRef::new("aa", "svc", "cat", "name");
        assert_eq!(
            entity.identifier(EntityKind::Info),
            make_identifier(EntityKind::Info, "aa", "svc", "cat", "name")
        );
        assert_eq!(entity.service_key(), ServiceKey::new("aa", "svc"));
    }

    #[test]
    fn test_entity_ref_well_formed() {
        assert!(EntityRef::new("aa", "svc", "", "name").is_well_formed());
        assert!(!EntityRef::new("aa", "s/vc", "cat", "name").is_well_formed());
        assert!(!EntityRef::new("", "svc", "cat", "name").is_well_formed());
        assert!(!EntityRef::new("aa", "svc", "cat", "").is_well_formed());
    }
}
