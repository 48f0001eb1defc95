//! Built-in solution definitions shipped with the `sls` binary
//!
//! `filemark` is a deliberately small solution managing a marker file under
//! `/tmp`; it exercises every manager and needs no privileges, which makes
//! it useful for trying the tool end to end on the local machine.

use std::sync::Arc;

use sls_core::information::{Information, InformationProperty};
use sls_core::logs::{LogFormat, LogSource};
use sls_core::registry::{RegistryError, SolutionRegistry};
use sls_core::remote::Fact;
use sls_core::solution::{
    LifecycleHooks, MaturityLevel, Solution, SolutionCategory, SolutionError,
};
use sls_core::testing::{SolutionTest, TestType};
use sls_core::types::{DataType, Value};

const HOME: &str = "/tmp/sls_filemark";
const MARKER: &str = "/tmp/sls_filemark/marker";

/// Single-quote a value for safe interpolation into `sh -c` commands
fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}

/// The `filemark` demo solution: a guarded marker file
pub fn filemark() -> Result<Solution, SolutionError> {
    let install = Arc::new(|ctx: &sls_core::ExecutionContext<'_>,
                           store: &sls_core::HostConfiguration| {
        let message = store
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("guarded");
        ctx.host
            .run_operation(&format!("printf '%s' {} > {}", shell_quote(message), MARKER))
    });

    Solution::builder("filemark")
        .full_name("Filemark")
        .description("Maintains a marker file with a configurable message")
        .reference("https://github.com/sls-team/solution-lifecycle-sync")
        .maturity(MaturityLevel::Production)
        .category(SolutionCategory::Backup)
        .remote_home(HOME)
        .information(vec![
            Information::new("message", "Text stored in the marker file", DataType::String)
                .with_properties(&[
                    InformationProperty::Configuration,
                    InformationProperty::Optional,
                    InformationProperty::Writable,
                ])
                .with_default(Value::String("guarded".to_string()))
                .with_getter(Fact::raw(format!("cat {}", MARKER)))
                .with_setter(|ctx, _previous, new_value| {
                    let message = new_value.as_str().unwrap_or_default();
                    ctx.host.run_operation(&format!(
                        "printf '%s' {} > {}",
                        shell_quote(message),
                        MARKER
                    ))
                }),
            Information::new(
                "marker_size",
                "Size of the marker file in bytes",
                DataType::Integer,
            )
            .with_properties(&[
                InformationProperty::Metric,
                InformationProperty::ReadOnly,
            ])
            .with_getter(Fact::typed(
                format!("wc -c < {} | tr -d ' '", MARKER),
                DataType::Integer,
            )),
        ])
        .tests(vec![
            SolutionTest::new(
                "sh_available",
                "A POSIX shell is available",
                TestType::Requirement,
                Fact::boolean("command -v sh > /dev/null && echo true || echo false"),
            ),
            SolutionTest::new(
                "marker_present",
                "The marker file exists",
                TestType::Presence,
                Fact::boolean(format!(
                    "test -f {} && echo true || echo false",
                    MARKER
                )),
            ),
            SolutionTest::new(
                "marker_readable",
                "The marker file is readable",
                TestType::Operational,
                Fact::boolean(format!(
                    "test -r {} && echo true || echo false",
                    MARKER
                )),
            ),
        ])
        .logs(vec![LogSource::new(
            "marker",
            "Current content of the marker file",
            LogFormat::Text,
            Fact::raw(format!("cat {}", MARKER)),
        )])
        .actions(vec![sls_core::actions::Action::new(
            "append",
            "Append a line to the marker file",
            &[("content", DataType::String)],
            |ctx, args| {
                let content = args.get("content").and_then(Value::as_str).unwrap_or("");
                ctx.host.run_operation(&format!(
                    "printf '\\n%s' {} >> {}",
                    shell_quote(content),
                    MARKER
                ))
            },
        )])
        .lifecycle(LifecycleHooks {
            install,
            uninstall: sls_core::remote::command_hook(format!("rm -f {}", MARKER)),
            update: sls_core::remote::command_hook(format!("touch {}", MARKER)),
        })
        .build()
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Definition(#[from] SolutionError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Registry holding every built-in solution
pub fn default_registry() -> Result<SolutionRegistry, CatalogError> {
    let mut registry = SolutionRegistry::new();
    registry.register(filemark()?)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filemark_definition_is_valid() {
        let solution = filemark().unwrap();
        assert_eq!(solution.identifier(), "filemark");
        assert_eq!(solution.remote_home(), HOME);
        assert_eq!(solution.information.len(), 2);
    }

    #[test]
    fn test_default_registry_lists_filemark() {
        let registry = default_registry().unwrap();
        assert_eq!(registry.identifiers(), vec!["filemark"]);
    }

    #[test]
    fn test_shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }
}
