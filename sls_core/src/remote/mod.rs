//! Remote-host seam: the trait every transport implements plus the
//! fact/procedure building blocks solution definitions are written with
//!
//! The engine only ever sees `RemoteHost`; whether commands run over SSH,
//! locally or against a scripted double is the caller's concern.

pub mod error;
pub mod scripted;

pub use error::RemoteError;
pub use scripted::ScriptedHost;

use std::fmt;
use std::sync::Arc;

use crate::store::HostConfiguration;
use crate::types::{DataType, Value};

// ============================================================================
// HOST IDENTITY AND TRANSPORT TRAIT
// ============================================================================

/// Stable identifier for a managed host, e.g. `admin@10.0.0.7:22`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostIdentity {
    id: String,
}

impl HostIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Filesystem-safe token used in cache file names
    pub fn cache_token(&self) -> String {
        self.id
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | ' ' => '-',
                other => other,
            })
            .collect()
    }
}

impl fmt::Display for HostIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Transport abstraction over one managed host
///
/// `run_fact` captures stdout for interpretation; `run_operation` runs a
/// state-changing command where only success matters.
pub trait RemoteHost: Send + Sync {
    fn run_fact(&self, command: &str) -> Result<String, RemoteError>;
    fn run_operation(&self, command: &str) -> Result<(), RemoteError>;
}

/// Everything an engine operation needs to know about where it runs
pub struct ExecutionContext<'a> {
    pub host_id: HostIdentity,
    pub host: &'a dyn RemoteHost,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(host_id: HostIdentity, host: &'a dyn RemoteHost) -> Self {
        Self { host_id, host }
    }
}

// ============================================================================
// FACTS
// ============================================================================

/// Parser applied to raw fact output
pub type FactParser = Arc<dyn Fn(&str) -> Result<Value, RemoteError> + Send + Sync>;

/// A read-only probe: a shell command plus a parser for its stdout
#[derive(Clone)]
pub struct Fact {
    command: String,
    parser: FactParser,
}

impl Fact {
    /// Fact with a custom parser
    pub fn new(
        command: impl Into<String>,
        parser: impl Fn(&str) -> Result<Value, RemoteError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            command: command.into(),
            parser: Arc::new(parser),
        }
    }

    /// Fact returning the trimmed output verbatim as a string value
    pub fn raw(command: impl Into<String>) -> Self {
        Self::new(command, |output| {
            Ok(Value::String(output.trim_end().to_string()))
        })
    }

    /// Fact whose trimmed output is parsed with the given data type
    pub fn typed(command: impl Into<String>, data_type: DataType) -> Self {
        Self::new(command, move |output| {
            data_type
                .parse(output.trim())
                .map_err(|err| RemoteError::UnparsableFact {
                    reason: err.to_string(),
                })
        })
    }

    /// Fact whose output must be the literal `true` or `false`
    pub fn boolean(command: impl Into<String>) -> Self {
        Self::typed(command, DataType::Boolean)
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Run the fact against a host and interpret the result
    pub fn query(&self, ctx: &ExecutionContext<'_>) -> Result<Value, RemoteError> {
        let output = ctx.host.run_fact(&self.command)?;
        (self.parser)(&output)
    }
}

impl fmt::Debug for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fact")
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// PROCEDURES, SETTERS AND HOOKS
// ============================================================================

/// A state-changing step with no direct access to configuration values
pub type Procedure = Arc<dyn Fn(&ExecutionContext<'_>) -> Result<(), RemoteError> + Send + Sync>;

/// Remote side effect run when an information value changes
///
/// Receives the previous value (if any) and the new one.
pub type Setter = Arc<
    dyn Fn(&ExecutionContext<'_>, Option<&Value>, &Value) -> Result<(), RemoteError>
        + Send
        + Sync,
>;

/// Lifecycle step with read access to the host's configuration values
pub type LifecycleHook = Arc<
    dyn Fn(&ExecutionContext<'_>, &HostConfiguration) -> Result<(), RemoteError> + Send + Sync,
>;

/// Procedure that runs a single fixed command
pub fn command_procedure(command: impl Into<String>) -> Procedure {
    let command = command.into();
    Arc::new(move |ctx| ctx.host.run_operation(&command))
}

/// Lifecycle hook that runs a single fixed command
pub fn command_hook(command: impl Into<String>) -> LifecycleHook {
    let command = command.into();
    Arc::new(move |ctx, _store| ctx.host.run_operation(&command))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_host_identity_cache_token() {
        let identity = HostIdentity::new("admin@10.0.0.7:22");
        assert_eq!(identity.cache_token(), "admin@10.0.0.7-22");
        assert_eq!(identity.to_string(), "admin@10.0.0.7:22");
    }

    #[test]
    fn test_typed_fact_parses_trimmed_output() {
        let host = ScriptedHost::new();
        host.script_fact("wc -c < /tmp/f", " 128 \n");

        let ctx = ExecutionContext::new(HostIdentity::new("t"), &host);
        let fact = Fact::typed("wc -c < /tmp/f", DataType::Integer);
        assert_eq!(fact.query(&ctx).unwrap(), Value::Integer(128));
    }

    #[test]
    fn test_boolean_fact_rejects_garbage() {
        let host = ScriptedHost::new();
        host.script_fact("probe", "maybe\n");

        let ctx = ExecutionContext::new(HostIdentity::new("t"), &host);
        let fact = Fact::boolean("probe");
        assert_matches!(fact.query(&ctx), Err(RemoteError::UnparsableFact { .. }));
    }

    #[test]
    fn test_command_procedure_runs_operation() {
        let host = ScriptedHost::new();
        let ctx = ExecutionContext::new(HostIdentity::new("t"), &host);

        let procedure = command_procedure("systemctl restart svc");
        procedure(&ctx).unwrap();
        assert_eq!(host.operations(), vec!["systemctl restart svc".to_string()]);
    }
}
