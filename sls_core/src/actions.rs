//! Named imperative actions with typed parameter schemas

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::remote::{ExecutionContext, RemoteError};
use crate::types::{ConversionError, DataType, Value};

/// Handler invoked with fully parsed arguments
pub type ActionHandler = Arc<
    dyn Fn(&ExecutionContext<'_>, &BTreeMap<String, Value>) -> Result<(), RemoteError>
        + Send
        + Sync,
>;

/// One operator-invocable action of a solution
#[derive(Clone)]
pub struct Action {
    identifier: String,
    description: String,
    parameters: BTreeMap<String, DataType>,
    handler: ActionHandler,
}

impl Action {
    pub fn new(
        identifier: impl Into<String>,
        description: impl Into<String>,
        parameters: &[(&str, DataType)],
        handler: impl Fn(&ExecutionContext<'_>, &BTreeMap<String, Value>) -> Result<(), RemoteError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            description: description.into(),
            parameters: parameters
                .iter()
                .map(|(name, data_type)| (name.to_string(), data_type.clone()))
                .collect(),
            handler: Arc::new(handler),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("identifier", &self.identifier)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Catalog entry for one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescription {
    pub identifier: String,
    pub description: String,
    /// `name (type)` pairs, comma-separated
    pub parameters: String,
}

#[derive(Debug, Error)]
pub enum ActionsError {
    #[error("Duplicate action identifier '{identifier}'")]
    DuplicateIdentifier { identifier: String },

    #[error("No action with identifier '{identifier}'")]
    NotFound { identifier: String },

    #[error("Action '{action}' requires the missing argument '{argument}'")]
    MissingArgument { action: String, argument: String },

    #[error("Action '{action}' does not accept the argument '{argument}'")]
    UnexpectedArgument { action: String, argument: String },

    #[error("Argument '{argument}' of action '{action}' is invalid: {source}")]
    InvalidArgument {
        action: String,
        argument: String,
        #[source]
        source: ConversionError,
    },

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Registry and dispatcher for a solution's actions
#[derive(Debug, Clone, Default)]
pub struct ActionsManager {
    items: BTreeMap<String, Action>,
}

impl ActionsManager {
    pub fn new(items: Vec<Action>) -> Result<Self, ActionsError> {
        let mut map = BTreeMap::new();
        for item in items {
            let identifier = item.identifier.clone();
            if map.insert(identifier.clone(), item).is_some() {
                return Err(ActionsError::DuplicateIdentifier { identifier });
            }
        }
        Ok(Self { items: map })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Fail early when the identifier is unknown, before any remote contact
    pub fn ensure_known(&self, identifier: &str) -> Result<(), ActionsError> {
        if self.items.contains_key(identifier) {
            Ok(())
        } else {
            Err(ActionsError::NotFound {
                identifier: identifier.to_string(),
            })
        }
    }

    /// Parse raw string arguments against the schema and run the handler
    ///
    /// The provided keys must match the declared parameter names exactly;
    /// extras and omissions are both errors.
    pub fn execute(
        &self,
        ctx: &ExecutionContext<'_>,
        identifier: &str,
        arguments: &BTreeMap<String, String>,
    ) -> Result<(), ActionsError> {
        let action = self
            .items
            .get(identifier)
            .ok_or_else(|| ActionsError::NotFound {
                identifier: identifier.to_string(),
            })?;

        for provided in arguments.keys() {
            if !action.parameters.contains_key(provided) {
                return Err(ActionsError::UnexpectedArgument {
                    action: identifier.to_string(),
                    argument: provided.clone(),
                });
            }
        }

        let mut parsed = BTreeMap::new();
        for (name, data_type) in &action.parameters {
            let raw = arguments
                .get(name)
                .ok_or_else(|| ActionsError::MissingArgument {
                    action: identifier.to_string(),
                    argument: name.clone(),
                })?;
            let value =
                data_type
                    .parse(raw)
                    .map_err(|source| ActionsError::InvalidArgument {
                        action: identifier.to_string(),
                        argument: name.clone(),
                        source,
                    })?;
            parsed.insert(name.clone(), value);
        }

        (action.handler)(ctx, &parsed)?;
        Ok(())
    }

    /// Static catalog of every action
    pub fn describe(&self) -> Vec<ActionDescription> {
        self.items
            .values()
            .map(|action| ActionDescription {
                identifier: action.identifier.clone(),
                description: action.description.clone(),
                parameters: action
                    .parameters
                    .iter()
                    .map(|(name, data_type)| format!("{} ({})", name, data_type))
                    .collect::<Vec<_>>()
                    .join(", "),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{HostIdentity, ScriptedHost};
    use assert_matches::assert_matches;

    fn ctx<'a>(host: &'a ScriptedHost) -> ExecutionContext<'a> {
        ExecutionContext::new(HostIdentity::new("tester@local"), host)
    }

    fn manager() -> ActionsManager {
        let ban = Action::new(
            "ban_address",
            "Block an address for a number of seconds",
            &[("address", DataType::String), ("seconds", DataType::Integer)],
            |ctx, args| {
                let address = args.get("address").and_then(Value::as_str).unwrap_or("");
                let seconds = args.get("seconds").and_then(Value::as_integer).unwrap_or(0);
                ctx.host
                    .run_operation(&format!("svcctl ban {} {}", address, seconds))
            },
        );
        ActionsManager::new(vec![ban]).unwrap()
    }

    #[test]
    fn test_execute_parses_typed_arguments() {
        let host = ScriptedHost::new();
        let mut args = BTreeMap::new();
        args.insert("address".to_string(), "10.0.0.9".to_string());
        args.insert("seconds".to_string(), "600".to_string());

        manager().execute(&ctx(&host), "ban_address", &args).unwrap();
        assert_eq!(host.operations(), vec!["svcctl ban 10.0.0.9 600".to_string()]);
    }

    #[test]
    fn test_argument_keys_must_match_exactly() {
        let host = ScriptedHost::new();
        let manager = manager();

        let mut missing = BTreeMap::new();
        missing.insert("address".to_string(), "10.0.0.9".to_string());
        assert_matches!(
            manager.execute(&ctx(&host), "ban_address", &missing),
            Err(ActionsError::MissingArgument { .. })
        );

        let mut extra = BTreeMap::new();
        extra.insert("address".to_string(), "10.0.0.9".to_string());
        extra.insert("seconds".to_string(), "600".to_string());
        extra.insert("force".to_string(), "true".to_string());
        assert_matches!(
            manager.execute(&ctx(&host), "ban_address", &extra),
            Err(ActionsError::UnexpectedArgument { .. })
        );
        assert!(host.operations().is_empty());
    }

    #[test]
    fn test_invalid_argument_conversion() {
        let host = ScriptedHost::new();
        let mut args = BTreeMap::new();
        args.insert("address".to_string(), "10.0.0.9".to_string());
        args.insert("seconds".to_string(), "soon".to_string());

        assert_matches!(
            manager().execute(&ctx(&host), "ban_address", &args),
            Err(ActionsError::InvalidArgument { .. })
        );
    }

    #[test]
    fn test_unknown_action_found_before_remote_contact() {
        let host = ScriptedHost::new();
        let manager = manager();

        assert_matches!(manager.ensure_known("ghost"), Err(ActionsError::NotFound { .. }));
        assert_matches!(
            manager.execute(&ctx(&host), "ghost", &BTreeMap::new()),
            Err(ActionsError::NotFound { .. })
        );
        assert!(host.operations().is_empty());
        assert!(host.fact_queries().is_empty());
    }

    #[test]
    fn test_describe_summarizes_parameters() {
        let catalog = manager().describe();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].parameters, "address (string), seconds (integer)");
    }
}
