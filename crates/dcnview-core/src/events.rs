//! Change notifications emitted by the transport
//!
//! A notification carries identity only. Content (schema, value, enablement)
//! is fetched separately with a bounded lookup.

use serde::{Deserialize, Serialize};

use crate::identifier::{EntityKind, EntityRef, Identifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
}

impl ChangeKind {
    /// Added and Updated both require a content lookup
    pub fn needs_lookup(&self) -> bool {
        !matches!(self, ChangeKind::Removed)
    }
}

/// `onCommandAdd/Update/Remove` and `onInfoAdd/Update/Remove` in one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: EntityKind,
    pub change: ChangeKind,
    pub entity: EntityRef,
}

impl Notification {
    pub fn new(kind: EntityKind, change: ChangeKind, entity: EntityRef) -> Self {
        Self {
            kind,
            change,
            entity,
        }
    }

    pub fn identifier(&self) -> Identifier {
        self.entity.identifier(self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_removal_skips_lookup() {
        assert!(ChangeKind::Added.needs_lookup());
        assert!(ChangeKind::Updated.needs_lookup());
        assert!(!ChangeKind::Removed.needs_lookup());
    }

    #[test]
    fn test_notification_identifier_follows_kind() {
        let entity = EntityRef::new("aa", "svc", "cat", "n");
        let info = Notification::new(EntityKind::Info, ChangeKind::Added, entity.clone());
        let command = Notification::new(EntityKind::Command, ChangeKind::Added, entity);
        assert_ne!(info.identifier(), command.identifier());
    }
}
