//! Typed value system shared by every manager
//!
//! A `DataType` declares the shape an information, test argument or action
//! parameter accepts; a `Value` is the runtime payload. Raw user text always
//! enters through `DataType::parse`, JSON from cache files through
//! `DataType::value_from_json`.

pub mod error;
mod value;

pub use error::{ConversionError, EmptyEnumError, UnknownDataTypeError};
pub use value::Value;

use std::fmt;
use std::sync::Arc;

// ============================================================================
// ENUMERATION DEFINITIONS
// ============================================================================

/// A named, closed set of accepted string members
///
/// Definitions are shared behind an `Arc` so that an `Enum` data type and an
/// `EnumList` over the same set compare equal and stay cheap to clone.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumDefinition {
    name: String,
    members: Vec<String>,
}

impl EnumDefinition {
    /// Build a definition, rejecting empty member sets
    pub fn new(
        name: impl Into<String>,
        members: &[&str],
    ) -> Result<Arc<Self>, EmptyEnumError> {
        let name = name.into();
        if members.is_empty() {
            return Err(EmptyEnumError { name });
        }
        Ok(Arc::new(Self {
            name,
            members: members.iter().map(|m| m.to_string()).collect(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn contains(&self, member: &str) -> bool {
        self.members.iter().any(|m| m == member)
    }
}

// ============================================================================
// DATA TYPES
// ============================================================================

/// Declared shape of a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Boolean,
    Integer,
    String,
    Enum(Arc<EnumDefinition>),
    IntegerList,
    StringList,
    EnumList(Arc<EnumDefinition>),
}

impl DataType {
    /// Check if this is one of the list shapes
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            DataType::IntegerList | DataType::StringList | DataType::EnumList(_)
        )
    }

    /// Element type of a list shape, if any
    pub fn element_type(&self) -> Option<DataType> {
        match self {
            DataType::IntegerList => Some(DataType::Integer),
            DataType::StringList => Some(DataType::String),
            DataType::EnumList(definition) => Some(DataType::Enum(definition.clone())),
            _ => None,
        }
    }

    /// Convert raw user text into a typed value
    ///
    /// List input is comma-separated with no quoting; each element is parsed
    /// with the element type. Empty input is rejected for every type.
    pub fn parse(&self, raw: &str) -> Result<Value, ConversionError> {
        if raw.is_empty() {
            return Err(ConversionError::EmptyInput);
        }

        match self {
            DataType::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(ConversionError::InvalidBoolean {
                    raw: raw.to_string(),
                }),
            },
            DataType::Integer => {
                raw.trim()
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| ConversionError::InvalidInteger {
                        raw: raw.to_string(),
                    })
            }
            DataType::String => Ok(Value::String(raw.to_string())),
            DataType::Enum(definition) => {
                if definition.contains(raw) {
                    Ok(Value::Enum(raw.to_string()))
                } else {
                    Err(ConversionError::UnknownEnumMember {
                        member: raw.to_string(),
                        enumeration: definition.name().to_string(),
                    })
                }
            }
            DataType::IntegerList => Self::parse_list(raw, &DataType::Integer),
            DataType::StringList => Self::parse_list(raw, &DataType::String),
            DataType::EnumList(definition) => {
                Self::parse_list(raw, &DataType::Enum(definition.clone()))
            }
        }
    }

    fn parse_list(raw: &str, element: &DataType) -> Result<Value, ConversionError> {
        let mut items = Vec::new();
        for (index, part) in raw.split(',').enumerate() {
            let item = element
                .parse(part)
                .map_err(|source| ConversionError::InvalidListElement {
                    index,
                    source: Box::new(source),
                })?;
            items.push(item);
        }
        Ok(Value::List(items))
    }

    /// Serialize a value back to its canonical text, the inverse of `parse`
    pub fn serialize(&self, value: &Value) -> String {
        value.canonical_string()
    }

    /// Structural check: does the value match this type shape?
    pub fn validate(&self, value: &Value) -> bool {
        match (self, value) {
            (DataType::Boolean, Value::Boolean(_)) => true,
            (DataType::Integer, Value::Integer(_)) => true,
            (DataType::String, Value::String(_)) => true,
            (DataType::Enum(definition), Value::Enum(member)) => definition.contains(member),
            (DataType::IntegerList, Value::List(items)) => {
                items.iter().all(|item| matches!(item, Value::Integer(_)))
            }
            (DataType::StringList, Value::List(items)) => {
                items.iter().all(|item| matches!(item, Value::String(_)))
            }
            (DataType::EnumList(definition), Value::List(items)) => items
                .iter()
                .all(|item| matches!(item, Value::Enum(member) if definition.contains(member))),
            _ => false,
        }
    }

    /// Infer the type of a runtime value
    ///
    /// Enum members and empty or mixed lists carry no usable shape, so
    /// inference fails for them.
    pub fn for_value(value: &Value) -> Result<DataType, UnknownDataTypeError> {
        match value {
            Value::Boolean(_) => Ok(DataType::Boolean),
            Value::Integer(_) => Ok(DataType::Integer),
            Value::String(_) => Ok(DataType::String),
            Value::Enum(_) => Err(UnknownDataTypeError),
            Value::List(items) => {
                if items.iter().all(|item| matches!(item, Value::Integer(_)))
                    && !items.is_empty()
                {
                    Ok(DataType::IntegerList)
                } else if items.iter().all(|item| matches!(item, Value::String(_)))
                    && !items.is_empty()
                {
                    Ok(DataType::StringList)
                } else {
                    Err(UnknownDataTypeError)
                }
            }
        }
    }

    /// Rebuild a typed value from its JSON form (cache files, payloads)
    pub fn value_from_json(
        &self,
        json: &serde_json::Value,
    ) -> Result<Value, ConversionError> {
        let mismatch = || ConversionError::ShapeMismatch {
            expected: self.to_string(),
            found: json_shape_name(json).to_string(),
        };

        match self {
            DataType::Boolean => json.as_bool().map(Value::Boolean).ok_or_else(mismatch),
            DataType::Integer => json.as_i64().map(Value::Integer).ok_or_else(mismatch),
            DataType::String => json
                .as_str()
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(mismatch),
            DataType::Enum(definition) => {
                let member = json.as_str().ok_or_else(mismatch)?;
                if definition.contains(member) {
                    Ok(Value::Enum(member.to_string()))
                } else {
                    Err(ConversionError::UnknownEnumMember {
                        member: member.to_string(),
                        enumeration: definition.name().to_string(),
                    })
                }
            }
            DataType::IntegerList => Self::list_from_json(json, &DataType::Integer, mismatch),
            DataType::StringList => Self::list_from_json(json, &DataType::String, mismatch),
            DataType::EnumList(definition) => {
                Self::list_from_json(json, &DataType::Enum(definition.clone()), mismatch)
            }
        }
    }

    fn list_from_json(
        json: &serde_json::Value,
        element: &DataType,
        mismatch: impl Fn() -> ConversionError,
    ) -> Result<Value, ConversionError> {
        let array = json.as_array().ok_or_else(&mismatch)?;
        let mut items = Vec::new();
        for (index, entry) in array.iter().enumerate() {
            let item = element.value_from_json(entry).map_err(|source| {
                ConversionError::InvalidListElement {
                    index,
                    source: Box::new(source),
                }
            })?;
            items.push(item);
        }
        Ok(Value::List(items))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "boolean"),
            DataType::Integer => write!(f, "integer"),
            DataType::String => write!(f, "string"),
            DataType::Enum(definition) => write!(f, "enum({})", definition.name()),
            DataType::IntegerList => write!(f, "list of integers"),
            DataType::StringList => write!(f, "list of strings"),
            DataType::EnumList(definition) => {
                write!(f, "list of enum({})", definition.name())
            }
        }
    }
}

fn json_shape_name(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// ============================================================================
// TESTS
// ============================================================================
