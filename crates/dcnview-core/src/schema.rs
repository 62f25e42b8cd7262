//! Argument and response schemas for commands
//!
//! A schema maps a field name to its declared type and whether it may be
//! left out. On the wire a schema looks like:
//!
//! ```json
//! { "arg1": { "type": "int" }, "arg2": { "type": "string", "optional": true } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::{Value, ValueType};

/// Declared shape of a single argument or response field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub value_type: ValueType,

    #[serde(default)]
    pub optional: bool,
}

impl FieldSpec {
    pub fn required(value_type: ValueType) -> Self {
        Self {
            value_type,
            optional: false,
        }
    }

    pub fn optional(value_type: ValueType) -> Self {
        Self {
            value_type,
            optional: true,
        }
    }
}

/// Field name to field spec
pub type Schema = BTreeMap<String, FieldSpec>;

/// Assembled call payload. Omitted optional fields are absent, never null.
pub type ArgumentMap = BTreeMap<String, Value>;

/// Parse and validate a wire schema
pub fn parse_schema(json: &serde_json::Value) -> Result<Schema> {
    if json.is_null() {
        return Ok(Schema::new());
    }
    let schema: Schema = serde_json::from_value(json.clone())?;
    if let Some(name) = schema.keys().find(|name| name.is_empty()) {
        return Err(Error::malformed(format!("schema field name {name:?} is empty")));
    }
    Ok(schema)
}

/// Check an argument map against a schema before it is sent
pub fn check_arguments(schema: &Schema, args: &ArgumentMap) -> Result<()> {
    for (name, spec) in schema {
        match args.get(name) {
            Some(value) if value.value_type() != spec.value_type => {
                return Err(Error::invalid_value(spec.value_type, value.to_string()));
            }
            None if !spec.optional => {
                return Err(Error::malformed(format!("missing required argument {name:?}")));
            }
            _ => {}
        }
    }
    if let Some(extra) = args.keys().find(|name| !schema.contains_key(*name)) {
        return Err(Error::malformed(format!("unexpected argument {extra:?}")));
    }
    Ok(())
}
