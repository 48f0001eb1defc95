// ============================================================================
// RUNTIME VALUES
// ============================================================================

use std::fmt;

/// Runtime representation of a typed value held by the engine
///
/// An `Enum` value carries only the selected member; the enumeration it
/// belongs to lives on the declaring `DataType`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    String(String),
    Enum(String),
    List(Vec<Value>),
}

impl Value {
    /// Check if this is a boolean value
    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    /// Check if this is a list value
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Get as boolean if possible
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as string slice if possible (covers both strings and enum members)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Enum(member) => Some(member),
            _ => None,
        }
    }

    /// Get as list if possible
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Canonical textual form: the inverse of `DataType::parse`
    ///
    /// Lists are comma-joined without spaces, matching the accepted input
    /// syntax, so `parse(canonical_string(v))` reproduces `v` for any value
    /// that validates against its type.
    pub fn canonical_string(&self) -> String {
        match self {
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::String(s) => s.clone(),
            Value::Enum(member) => member.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::canonical_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Convert into a JSON value for payloads and cache files
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Enum(member) => serde_json::Value::String(member.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }

    /// Short shape name used in error messages
    pub(crate) fn shape_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
            Value::Enum(_) => "enum member",
            Value::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Boolean(true).as_boolean(), Some(true));
        assert_eq!(Value::Integer(42).as_integer(), Some(42));
        assert_eq!(Value::String("x".to_string()).as_str(), Some("x"));
        assert_eq!(Value::Enum("alert".to_string()).as_str(), Some("alert"));
        assert_eq!(Value::Boolean(true).as_integer(), None);
        assert!(Value::List(vec![]).is_list());
    }

    #[test]
    fn test_canonical_string_joins_lists() {
        let value = Value::List(vec![
            Value::Integer(80),
            Value::Integer(443),
            Value::Integer(8080),
        ]);
        assert_eq!(value.canonical_string(), "80,443,8080");
    }

    #[test]
    fn test_to_json() {
        let value = Value::List(vec![
            Value::String("a".to_string()),
            Value::String("b".to_string()),
        ]);
        assert_eq!(value.to_json(), serde_json::json!(["a", "b"]));
        assert_eq!(Value::Integer(7).to_json(), serde_json::json!(7));
        assert_eq!(
            Value::Enum("alert".to_string()).to_json(),
            serde_json::json!("alert")
        );
    }
}
