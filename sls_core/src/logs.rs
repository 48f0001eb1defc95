//! Log source declarations and retrieval

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::remote::{ExecutionContext, Fact, RemoteError};
use crate::types::Value;

/// Declared format of a log source's content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// One retrievable log stream of a solution
#[derive(Debug, Clone)]
pub struct LogSource {
    identifier: String,
    description: String,
    format: LogFormat,
    fact: Fact,
}

impl LogSource {
    /// Declare a log source; the fact's raw output is the log content
    pub fn new(
        identifier: impl Into<String>,
        description: impl Into<String>,
        format: LogFormat,
        fact: Fact,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            description: description.into(),
            format,
            fact,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Catalog entry for one log source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDescription {
    pub identifier: String,
    pub description: String,
    pub format: String,
}

#[derive(Debug, Error)]
pub enum LogsError {
    #[error("Duplicate log source identifier '{identifier}'")]
    DuplicateIdentifier { identifier: String },

    /// Log content can be large, so retrieving every source at once is not
    /// supported; callers must name one
    #[error("A log source identifier is required")]
    IdentifierRequired,

    #[error("No log source with identifier '{identifier}'")]
    NotFound { identifier: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Registry and access layer over a solution's log sources
#[derive(Debug, Clone, Default)]
pub struct LogsManager {
    items: BTreeMap<String, LogSource>,
}

impl LogsManager {
    pub fn new(items: Vec<LogSource>) -> Result<Self, LogsError> {
        let mut map = BTreeMap::new();
        for item in items {
            let identifier = item.identifier.clone();
            if map.insert(identifier.clone(), item).is_some() {
                return Err(LogsError::DuplicateIdentifier { identifier });
            }
        }
        Ok(Self { items: map })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Fetch the content of one named log source
    pub fn content(
        &self,
        ctx: &ExecutionContext<'_>,
        identifier: Option<&str>,
    ) -> Result<BTreeMap<String, String>, LogsError> {
        let identifier = identifier.ok_or(LogsError::IdentifierRequired)?;
        let source = self
            .items
            .get(identifier)
            .ok_or_else(|| LogsError::NotFound {
                identifier: identifier.to_string(),
            })?;

        let content = match source.fact.query(ctx)? {
            Value::String(text) => text,
            other => other.canonical_string(),
        };

        let mut result = BTreeMap::new();
        result.insert(source.identifier.clone(), content);
        Ok(result)
    }

    /// Static catalog of every log source
    pub fn describe(&self) -> Vec<LogDescription> {
        self.items
            .values()
            .map(|source| LogDescription {
                identifier: source.identifier.clone(),
                description: source.description.clone(),
                format: source.format.to_string(),
            })
            .collect()
    }
}
