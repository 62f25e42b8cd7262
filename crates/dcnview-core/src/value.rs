//! Typed values carried by info fields and command arguments
//!
//! Rendering rule shared by display and parse-back:
//! - numeric arrays are space separated (`"1 2 3"`)
//! - boolean arrays render as `1`/`0`, space separated (`"1 0 1"`)
//! - string arrays are semicolon separated (`"a;b;c"`)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::{Error, Result};

/// Declared type of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Int,
    Float,
    String,
    BoolArray,
    IntArray,
    FloatArray,
    StringArray,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::BoolArray => "bool_array",
            ValueType::IntArray => "int_array",
            ValueType::FloatArray => "float_array",
            ValueType::StringArray => "string_array",
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(
            self,
            ValueType::BoolArray
                | ValueType::IntArray
                | ValueType::FloatArray
                | ValueType::StringArray
        )
    }

    /// Whether `c` may be typed into an entry field of this type.
    ///
    /// Entry is format-constrained so malformed numbers never reach a call.
    /// Scalar booleans are toggled, not typed.
    pub fn accepts_char(&self, c: char) -> bool {
        let int_char = c.is_ascii_digit() || c == '-' || c == '+';
        let float_char = int_char || matches!(c, '.' | 'e' | 'E');
        match self {
            ValueType::Bool => false,
            ValueType::Int => int_char,
            ValueType::Float => float_char,
            ValueType::String | ValueType::StringArray => !c.is_control(),
            ValueType::BoolArray => matches!(c, '0' | '1' | ' '),
            ValueType::IntArray => int_char || c == ' ',
            ValueType::FloatArray => float_char || c == ' ',
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bool" => Ok(ValueType::Bool),
            "int" => Ok(ValueType::Int),
            "float" => Ok(ValueType::Float),
            "string" => Ok(ValueType::String),
            "bool_array" => Ok(ValueType::BoolArray),
            "int_array" => Ok(ValueType::IntArray),
            "float_array" => Ok(ValueType::FloatArray),
            "string_array" => Ok(ValueType::StringArray),
            other => Err(Error::malformed(format!("unknown value type {other:?}"))),
        }
    }
}

/// A typed value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    BoolArray(Vec<bool>),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
    StringArray(Vec<String>),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::BoolArray(_) => ValueType::BoolArray,
            Value::IntArray(_) => ValueType::IntArray,
            Value::FloatArray(_) => ValueType::FloatArray,
            Value::StringArray(_) => ValueType::StringArray,
        }
    }

    /// Zero value used to seed entry fields
    pub fn default_for(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Bool => Value::Bool(false),
            ValueType::Int => Value::Int(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::String => Value::String(String::new()),
            ValueType::BoolArray => Value::BoolArray(Vec::new()),
            ValueType::IntArray => Value::IntArray(Vec::new()),
            ValueType::FloatArray => Value::FloatArray(Vec::new()),
            ValueType::StringArray => Value::StringArray(Vec::new()),
        }
    }

    /// Parse display text back into a value of the given type.
    ///
    /// Inverse of the [`fmt::Display`] rendering.
    pub fn parse(value_type: ValueType, text: &str) -> Result<Self> {
        let invalid = || Error::invalid_value(value_type, text);
        let trimmed = text.trim();

        match value_type {
            ValueType::Bool => parse_bool(trimmed).map(Value::Bool).ok_or_else(invalid),
            ValueType::Int => trimmed.parse().map(Value::Int).map_err(|_| invalid()),
            ValueType::Float => trimmed.parse().map(Value::Float).map_err(|_| invalid()),
            ValueType::String => Ok(Value::String(text.to_string())),
            ValueType::BoolArray => trimmed
                .split_whitespace()
                .map(parse_bool)
                .collect::<Option<Vec<_>>>()
                .map(Value::BoolArray)
                .ok_or_else(invalid),
            ValueType::IntArray => trimmed
                .split_whitespace()
                .map(str::parse)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Value::IntArray)
                .map_err(|_| invalid()),
            ValueType::FloatArray => trimmed
                .split_whitespace()
                .map(str::parse)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Value::FloatArray)
                .map_err(|_| invalid()),
            ValueType::StringArray => parse_string_array(text)
                .map(Value::StringArray)
                .ok_or_else(invalid),
        }
    }

    /// Convert a wire value into a typed value.
    ///
    /// Integers are accepted for floats, and numbers for booleans (non-zero is
    /// true), matching what publishers commonly send. Returns `None` when the
    /// JSON does not fit the declared type.
    pub fn from_json(value_type: ValueType, json: &Json) -> Option<Self> {
        match value_type {
            ValueType::Bool => json_bool(json).map(Value::Bool),
            ValueType::Int => json_int(json).map(Value::Int),
            ValueType::Float => json.as_f64().map(Value::Float),
            ValueType::String => json.as_str().map(|s| Value::String(s.to_string())),
            ValueType::BoolArray => json_array(json, json_bool).map(Value::BoolArray),
            ValueType::IntArray => json_array(json, json_int).map(Value::IntArray),
            ValueType::FloatArray => json_array(json, Json::as_f64).map(Value::FloatArray),
            ValueType::StringArray => {
                json_array(json, |j| j.as_str().map(str::to_string)).map(Value::StringArray)
            }
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Value::Bool(b) => Json::from(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => Json::from(*f),
            Value::String(s) => Json::from(s.as_str()),
            Value::BoolArray(v) => Json::from(v.clone()),
            Value::IntArray(v) => Json::from(v.clone()),
            Value::FloatArray(v) => Json::from(v.clone()),
            Value::StringArray(v) => Json::from(v.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
            Value::BoolArray(v) => {
                let parts: Vec<&str> = v.iter().map(|b| if *b { "1" } else { "0" }).collect();
                f.write_str(&parts.join(" "))
            }
            Value::IntArray(v) => f.write_str(&join(v, " ")),
            Value::FloatArray(v) => f.write_str(&join(v, " ")),
            Value::StringArray(v) => f.write_str(&render_string_array(v)),
        }
    }
}

fn join<T: fmt::Display>(items: &[T], sep: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}

/// Written for `[""]`, which would otherwise render like `[]`
const LONE_EMPTY: &str = "\\";

/// `;`-joined, with `;` and `\` inside elements escaped by `\`
fn render_string_array(items: &[String]) -> String {
    if let [only] = items {
        if only.is_empty() {
            return LONE_EMPTY.to_string();
        }
    }
    items
        .iter()
        .map(|item| item.replace('\\', "\\\\").replace(';', "\\;"))
        .collect::<Vec<_>>()
        .join(";")
}

fn parse_string_array(text: &str) -> Option<Vec<String>> {
    match text {
        "" => return Some(Vec::new()),
        LONE_EMPTY => return Some(vec![String::new()]),
        _ => {}
    }
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => current.push(chars.next()?),
            ';' => items.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    items.push(current);
    Some(items)
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "true" | "True" => Some(true),
        "0" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn json_bool(json: &Json) -> Option<bool> {
    json.as_bool()
        .or_else(|| json.as_i64().map(|n| n != 0))
}

fn json_int(json: &Json) -> Option<i64> {
    json.as_i64().or_else(|| {
        json.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn json_array<T>(json: &Json, item: impl Fn(&Json) -> Option<T>) -> Option<Vec<T>> {
    json.as_array()?.iter().map(item).collect()
}
