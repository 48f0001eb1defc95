//! Explicit per-(host, solution) key/value state store
//!
//! Managers never hold host state themselves; every operation receives the
//! store for the host it runs against, so one solution definition can serve
//! any number of hosts concurrently.

use std::collections::BTreeMap;

use crate::types::Value;

/// In-memory configuration and metric values for one host and one solution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostConfiguration {
    values: BTreeMap<String, Value>,
}

impl HostConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached value for a key, if set
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Set or replace the cached value for a key
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over all set keys in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
