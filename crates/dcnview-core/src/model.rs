//! Structured records for remote info fields and commands
//!
//! Transports hand these to the core instead of loosely-typed remote objects.
//! Records are validated with `validate()` where they enter the core.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identifier::{EntityKind, EntityRef, Identifier, ServiceKey};
use crate::schema::Schema;
use crate::value::{Value, ValueType};

/// A read-only telemetry value published by a service
#[derive(Debug, Clone, PartialEq)]
pub struct InfoRecord {
    pub entity: EntityRef,
    pub value_type: ValueType,
    pub value: Value,
}

impl InfoRecord {
    pub fn new(entity: EntityRef, value: Value) -> Self {
        Self {
            entity,
            value_type: value.value_type(),
            value,
        }
    }

    pub fn identifier(&self) -> Identifier {
        self.entity.identifier(EntityKind::Info)
    }

    pub fn service_key(&self) -> ServiceKey {
        self.entity.service_key()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.entity.is_well_formed() {
            return Err(Error::malformed(format!(
                "info identity {:?} is not well formed",
                self.entity
            )));
        }
        if self.value.value_type() != self.value_type {
            return Err(Error::malformed(format!(
                "info {} declares {} but carries {}",
                self.identifier(),
                self.value_type,
                self.value.value_type()
            )));
        }
        Ok(())
    }
}

/// A remotely invokable operation with discovered schemas
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRecord {
    pub entity: EntityRef,
    pub enabled: bool,
    pub arguments: Schema,
    pub response: Schema,
}

impl CommandRecord {
    pub fn identifier(&self) -> Identifier {
        self.entity.identifier(EntityKind::Command)
    }

    pub fn service_key(&self) -> ServiceKey {
        self.entity.service_key()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.entity.is_well_formed() {
            return Err(Error::malformed(format!(
                "command identity {:?} is not well formed",
                self.entity
            )));
        }
        Ok(())
    }
}

/// Result of a remote call
///
/// An empty `error` means no error. Fields are kept as wire JSON and typed
/// against the response schema at render time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub error: String,

    #[serde(default, flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl CommandResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// No error and no fields: a fire-and-forget success
    pub fn is_empty(&self) -> bool {
        self.error.is_empty() && self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_info_record_validation() {
        let ok = InfoRecord::new(EntityRef::new("aa", "svc", "cat", "n"), Value::Int(5));
        assert!(ok.validate().is_ok());
        assert_eq!(ok.value_type, ValueType::Int);

        let mut mismatched = ok.clone();
        mismatched.value_type = ValueType::Float;
        assert!(mismatched.validate().is_err());

        let bad_name = InfoRecord::new(EntityRef::new("aa", "svc", "cat", "a/b"), Value::Int(5));
        assert!(bad_name.validate().is_err());
    }

    #[test]
    fn test_command_identifier_uses_command_kind() {
        let command = CommandRecord {
            entity: EntityRef::new("aa", "svc", "cat", "reboot"),
            enabled: true,
            arguments: Schema::new(),
            response: Schema::new(),
        };
        assert_eq!(command.identifier().as_str(), "aa/svc/command/cat/reboot");
    }

    #[test]
    fn test_response_wire_format() {
        let response: CommandResponse =
            serde_json::from_value(json!({ "arg1": 1, "arg2": "x" })).unwrap();
        assert!(!response.is_error());
        assert_eq!(response.fields.len(), 2);

        let response: CommandResponse =
            serde_json::from_value(json!({ "error": "device busy" })).unwrap();
        assert!(response.is_error());
        assert!(response.fields.is_empty());
    }

    #[test]
    fn test_empty_response() {
        assert!(CommandResponse::empty().is_empty());
        assert!(!CommandResponse::error("x").is_empty());
        assert!(!CommandResponse::empty()
            .with_field("a", json!(1))
            .is_empty());
    }
}
