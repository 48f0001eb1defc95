//! Solution model and lifecycle state machine
//!
//! A `Solution` bundles the four managers with its lifecycle hooks and
//! metadata. Installedness is never cached: every state-dependent operation
//! re-probes the host with the presence tests before doing anything else.

pub mod error;

pub use error::SolutionError;

use std::collections::BTreeMap;
use std::fmt;

use crate::actions::ActionsManager;
use crate::cache::{CacheError, ConfigurationCache};
use crate::information::{InformationManager, InformationProperty};
use crate::logs::LogsManager;
use crate::remote::{ExecutionContext, LifecycleHook};
use crate::results::OperationPayload;
use crate::store::HostConfiguration;
use crate::testing::{TestError, TestOptions, TestType, TestsManager};
use crate::types::Value;

// ============================================================================
// METADATA
// ============================================================================

/// How production-ready a solution is, ordered from least to most
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MaturityLevel {
    DevOnly,
    Experimental,
    Beta,
    Production,
}

impl fmt::Display for MaturityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MaturityLevel::DevOnly => "dev-only",
            MaturityLevel::Experimental => "experimental",
            MaturityLevel::Beta => "beta",
            MaturityLevel::Production => "production",
        };
        write!(f, "{}", label)
    }
}

/// Functional category of a security solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolutionCategory {
    Antivirus,
    HostIps,
    NetworkIds,
    WebIds,
    LogShipping,
    CertificateManagement,
    Firewall,
    Backup,
}

impl fmt::Display for SolutionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolutionCategory::Antivirus => "antivirus",
            SolutionCategory::HostIps => "host intrusion prevention",
            SolutionCategory::NetworkIds => "network intrusion detection",
            SolutionCategory::WebIds => "web intrusion detection",
            SolutionCategory::LogShipping => "log shipping",
            SolutionCategory::CertificateManagement => "certificate management",
            SolutionCategory::Firewall => "firewall",
            SolutionCategory::Backup => "backup",
        };
        write!(f, "{}", label)
    }
}

/// The three state-changing steps every solution must provide
#[derive(Clone)]
pub struct LifecycleHooks {
    pub install: LifecycleHook,
    pub uninstall: LifecycleHook,
    pub update: LifecycleHook,
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// A request against one solution, as issued by an operator
#[derive(Debug, Clone)]
pub enum SolutionOperation {
    Init,
    Install,
    GetInformation { identifier: Option<String> },
    SetInformation { identifier: String, value: String },
    Test { identifier: Option<String> },
    GetLogs { identifier: Option<String> },
    Update,
    Uninstall,
    Execute {
        identifier: String,
        arguments: BTreeMap<String, String>,
    },
}

impl SolutionOperation {
    /// Stable operation name used in logs and result messages
    pub fn name(&self) -> &'static str {
        match self {
            SolutionOperation::Init => "init",
            SolutionOperation::Install => "install",
            SolutionOperation::GetInformation { .. } => "get_information",
            SolutionOperation::SetInformation { .. } => "set_information",
            SolutionOperation::Test { .. } => "test",
            SolutionOperation::GetLogs { .. } => "get_logs",
            SolutionOperation::Update => "update",
            SolutionOperation::Uninstall => "uninstall",
            SolutionOperation::Execute { .. } => "execute",
        }
    }
}

// ============================================================================
// SOLUTION
// ============================================================================

/// One fully described, manageable security solution
pub struct Solution {
    identifier: String,
    full_name: String,
    description: String,
    references: Vec<String>,
    maturity: MaturityLevel,
    categories: Vec<SolutionCategory>,
    remote_home: String,
    pub information: InformationManager,
    pub tests: TestsManager,
    pub logs: LogsManager,
    pub actions: ActionsManager,
    lifecycle: LifecycleHooks,
}

impl Solution {
    pub fn builder(identifier: impl Into<String>) -> SolutionBuilder {
        SolutionBuilder::new(identifier)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }

    pub fn maturity(&self) -> MaturityLevel {
        self.maturity
    }

    pub fn categories(&self) -> &[SolutionCategory] {
        &self.categories
    }

    /// Directory on the managed host owned by this solution
    pub fn remote_home(&self) -> &str {
        &self.remote_home
    }

    /// Static catalog of everything this solution exposes
    pub fn describe(&self) -> OperationPayload {
        OperationPayload::Catalog {
            information: self.information.describe(),
            tests: self.tests.describe(),
            logs: self.logs.describe(),
            actions: self.actions.describe(),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle operations
    // ------------------------------------------------------------------

    /// Dispatch one operation against one host
    pub fn dispatch(
        &self,
        ctx: &ExecutionContext<'_>,
        cache: &ConfigurationCache,
        operation: &SolutionOperation,
    ) -> Result<OperationPayload, SolutionError> {
        log::debug!(
            "Running operation '{}' of solution '{}' on host '{}'",
            operation.name(),
            self.identifier,
            ctx.host_id
        );
        match operation {
            SolutionOperation::Init => self.init(ctx, cache),
            SolutionOperation::Install => self.install(ctx, cache),
            SolutionOperation::GetInformation { identifier } => {
                self.get_information(ctx, cache, identifier.as_deref())
            }
            SolutionOperation::SetInformation { identifier, value } => {
                self.set_information(ctx, cache, identifier, value)
            }
            SolutionOperation::Test { identifier } => {
                self.test(ctx, cache, identifier.as_deref())
            }
            SolutionOperation::GetLogs { identifier } => {
                self.get_logs(ctx, cache, identifier.as_deref())
            }
            SolutionOperation::Update => self.update(ctx, cache),
            SolutionOperation::Uninstall => self.uninstall(ctx, cache),
            SolutionOperation::Execute {
                identifier,
                arguments,
            } => self.execute(ctx, cache, identifier, arguments),
        }
    }

    /// Seed defaults locally and write the first configuration file
    ///
    /// Runs before installation, so no installedness probe here.
    pub fn init(
        &self,
        ctx: &ExecutionContext<'_>,
        cache: &ConfigurationCache,
    ) -> Result<OperationPayload, SolutionError> {
        let mut store = HostConfiguration::new();
        self.information.set_defaults_locally(ctx, &mut store)?;
        self.persist(ctx, &store, cache)?;
        Ok(OperationPayload::None)
    }

    /// Install the solution on a host that does not already run it
    ///
    /// The only operation that tolerates a missing configuration file: a
    /// fresh host without a prior `init` is installed from the declared
    /// defaults.
    pub fn install(
        &self,
        ctx: &ExecutionContext<'_>,
        cache: &ConfigurationCache,
    ) -> Result<OperationPayload, SolutionError> {
        let mut store = match self.load(ctx, cache, false) {
            Ok(store) => store,
            Err(SolutionError::NoConfigurationFile { .. }) => {
                let mut store = HostConfiguration::new();
                self.information.set_defaults_locally(ctx, &mut store)?;
                store
            }
            Err(err) => return Err(err),
        };
        self.information.validate_all(&store, None)?;
        self.assert_not_installed(ctx)?;

        match self
            .tests
            .run(ctx, &TestOptions::of_type(TestType::Requirement).check_only())
        {
            Ok(report) => {
                if let Some((test, _)) = report.iter().find(|(_, passed)| !**passed) {
                    return Err(SolutionError::RequirementsNotMet { test: test.clone() });
                }
            }
            Err(err) => return Err(err.into()),
        }

        ctx.host
            .run_operation(&format!("mkdir -p {}", self.remote_home))?;
        (self.lifecycle.install)(ctx, &store)?;

        self.information.resolve_auto_generated(
            ctx,
            &mut store,
            InformationProperty::AutoGeneratedAfterInstall,
        )?;
        self.persist(ctx, &store, cache)?;
        log::info!(
            "Installed solution '{}' on host '{}'",
            self.identifier,
            ctx.host_id
        );
        Ok(OperationPayload::None)
    }

    /// Refresh one or all information values and report them
    pub fn get_information(
        &self,
        ctx: &ExecutionContext<'_>,
        cache: &ConfigurationCache,
        identifier: Option<&str>,
    ) -> Result<OperationPayload, SolutionError> {
        let mut store = self.load(ctx, cache, true)?;
        self.assert_installed(ctx)?;

        let values = self.information.get(ctx, &mut store, identifier)?;
        self.persist(ctx, &store, cache)?;
        Ok(OperationPayload::Information(values))
    }

    /// Change one configuration value locally and on the host
    pub fn set_information(
        &self,
        ctx: &ExecutionContext<'_>,
        cache: &ConfigurationCache,
        identifier: &str,
        raw_value: &str,
    ) -> Result<OperationPayload, SolutionError> {
        let mut store = self.load(ctx, cache, true)?;
        self.assert_installed(ctx)?;

        self.information.refresh(ctx, &mut store)?;
        let result = self.information.set(
            ctx,
            &mut store,
            identifier,
            Value::String(raw_value.to_string()),
            false,
        );
        // persist whatever the store now holds; a failed remote setter must
        // still leave an accurate local record
        self.persist(ctx, &store, cache)?;
        result?;
        Ok(OperationPayload::None)
    }

    /// Run one test or all of them and report per-test verdicts
    pub fn test(
        &self,
        ctx: &ExecutionContext<'_>,
        cache: &ConfigurationCache,
        identifier: Option<&str>,
    ) -> Result<OperationPayload, SolutionError> {
        let _store = self.load(ctx, cache, true)?;
        self.assert_installed(ctx)?;

        let options = match identifier {
            Some(id) => TestOptions::single(id).check_only(),
            None => TestOptions::all().check_only(),
        };
        let report = self.tests.run(ctx, &options)?;
        Ok(OperationPayload::TestReport(report))
    }

    /// Fetch the content of one log source
    pub fn get_logs(
        &self,
        ctx: &ExecutionContext<'_>,
        cache: &ConfigurationCache,
        identifier: Option<&str>,
    ) -> Result<OperationPayload, SolutionError> {
        let _store = self.load(ctx, cache, true)?;
        self.assert_installed(ctx)?;

        let content = self.logs.content(ctx, identifier)?;
        Ok(OperationPayload::LogContent(content))
    }

    /// Bring the installed solution to its latest version
    pub fn update(
        &self,
        ctx: &ExecutionContext<'_>,
        cache: &ConfigurationCache,
    ) -> Result<OperationPayload, SolutionError> {
        let mut store = self.load(ctx, cache, true)?;
        self.assert_installed(ctx)?;

        self.information.refresh(ctx, &mut store)?;
        (self.lifecycle.update)(ctx, &store)?;
        self.persist(ctx, &store, cache)?;
        Ok(OperationPayload::None)
    }

    /// Remove the solution and its home directory from the host
    ///
    /// The local configuration file is kept, so a later reinstall reuses
    /// the recorded configuration.
    pub fn uninstall(
        &self,
        ctx: &ExecutionContext<'_>,
        cache: &ConfigurationCache,
    ) -> Result<OperationPayload, SolutionError> {
        let store = self.load(ctx, cache, true)?;
        self.assert_installed(ctx)?;

        (self.lifecycle.uninstall)(ctx, &store)?;
        ctx.host
            .run_operation(&format!("rm -rf {}", self.remote_home))?;
        log::info!(
            "Uninstalled solution '{}' from host '{}'",
            self.identifier,
            ctx.host_id
        );
        Ok(OperationPayload::None)
    }

    /// Run one named action with raw string arguments
    pub fn execute(
        &self,
        ctx: &ExecutionContext<'_>,
        cache: &ConfigurationCache,
        identifier: &str,
        arguments: &BTreeMap<String, String>,
    ) -> Result<OperationPayload, SolutionError> {
        // a typo in the action name must never touch the host
        self.actions.ensure_known(identifier)?;

        let _store = self.load(ctx, cache, true)?;
        self.assert_installed(ctx)?;

        self.actions.execute(ctx, identifier, arguments)?;
        Ok(OperationPayload::None)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Load and repopulate the per-host store from the cache file
    fn load(
        &self,
        ctx: &ExecutionContext<'_>,
        cache: &ConfigurationCache,
        post_install: bool,
    ) -> Result<HostConfiguration, SolutionError> {
        let exported = match cache.load(&ctx.host_id, &self.identifier) {
            Ok(exported) => exported,
            Err(CacheError::Missing { path }) => {
                return Err(SolutionError::NoConfigurationFile { path })
            }
            Err(err) => return Err(err.into()),
        };
        let mut store = HostConfiguration::new();
        self.information
            .populate(ctx, &mut store, &exported, post_install)?;
        Ok(store)
    }

    fn persist(
        &self,
        ctx: &ExecutionContext<'_>,
        store: &HostConfiguration,
        cache: &ConfigurationCache,
    ) -> Result<(), SolutionError> {
        cache.store(
            &ctx.host_id,
            &self.identifier,
            &self.information.export_configuration(store),
        )?;
        Ok(())
    }

    /// Probe the host with the presence tests, expecting them to pass
    fn assert_installed(&self, ctx: &ExecutionContext<'_>) -> Result<(), SolutionError> {
        match self
            .tests
            .run(ctx, &TestOptions::of_type(TestType::Presence))
        {
            Ok(_) => Ok(()),
            Err(TestError::Failed { .. }) => Err(SolutionError::NotInstalled {
                solution: self.identifier.clone(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Probe the host with the presence tests, expecting them to fail
    fn assert_not_installed(&self, ctx: &ExecutionContext<'_>) -> Result<(), SolutionError> {
        match self
            .tests
            .run(ctx, &TestOptions::of_type(TestType::Presence).expecting(false))
        {
            Ok(_) => Ok(()),
            Err(TestError::Failed { .. }) => Err(SolutionError::AlreadyInstalled {
                solution: self.identifier.clone(),
            }),
            Err(err) => Err(err.into()),
        }
    }
}

impl fmt::Debug for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solution")
            .field("identifier", &self.identifier)
            .field("maturity", &self.maturity)
            .field("categories", &self.categories)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Step-by-step construction of a `Solution` with final validation
pub struct SolutionBuilder {
    identifier: String,
    full_name: Option<String>,
    description: String,
    references: Vec<String>,
    maturity: MaturityLevel,
    categories: Vec<SolutionCategory>,
    remote_home: Option<String>,
    information: Vec<crate::information::Information>,
    tests: Vec<crate::testing::SolutionTest>,
    logs: Vec<crate::logs::LogSource>,
    actions: Vec<crate::actions::Action>,
    lifecycle: Option<LifecycleHooks>,
}

impl SolutionBuilder {
    fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            full_name: None,
            description: String::new(),
            references: Vec::new(),
            maturity: MaturityLevel::DevOnly,
            categories: Vec::new(),
            remote_home: None,
            information: Vec::new(),
            tests: Vec::new(),
            logs: Vec::new(),
            actions: Vec::new(),
            lifecycle: None,
        }
    }

    pub fn full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn reference(mut self, url: impl Into<String>) -> Self {
        self.references.push(url.into());
        self
    }

    pub fn maturity(mut self, maturity: MaturityLevel) -> Self {
        self.maturity = maturity;
        self
    }

    pub fn category(mut self, category: SolutionCategory) -> Self {
        self.categories.push(category);
        self
    }

    /// Override the default `/opt/<identifier>` home directory
    pub fn remote_home(mut self, home: impl Into<String>) -> Self {
        self.remote_home = Some(home.into());
        self
    }

    pub fn information(mut self, items: Vec<crate::information::Information>) -> Self {
        self.information = items;
        self
    }

    pub fn tests(mut self, items: Vec<crate::testing::SolutionTest>) -> Self {
        self.tests = items;
        self
    }

    pub fn logs(mut self, items: Vec<crate::logs::LogSource>) -> Self {
        self.logs = items;
        self
    }

    pub fn actions(mut self, items: Vec<crate::actions::Action>) -> Self {
        self.actions = items;
        self
    }

    pub fn lifecycle(mut self, hooks: LifecycleHooks) -> Self {
        self.lifecycle = Some(hooks);
        self
    }

    /// Validate the definition and assemble the managers
    pub fn build(self) -> Result<Solution, SolutionError> {
        let lifecycle = self
            .lifecycle
            .ok_or_else(|| SolutionError::IncompleteDefinition {
                reason: "lifecycle hooks are required".to_string(),
            })?;

        let tests = TestsManager::new(self.tests)?;
        if !tests.has_type(TestType::Presence) {
            return Err(SolutionError::IncompleteDefinition {
                reason: "at least one presence test is required".to_string(),
            });
        }

        Ok(Solution {
            remote_home: self
                .remote_home
                .unwrap_or_else(|| format!("/opt/{}", self.identifier)),
            full_name: self.full_name.unwrap_or_else(|| self.identifier.clone()),
            identifier: self.identifier,
            description: self.description,
            references: self.references,
            maturity: self.maturity,
            categories: self.categories,
            information: InformationManager::new(self.information)?,
            tests,
            logs: LogsManager::new(self.logs)?,
            actions: ActionsManager::new(self.actions)?,
            lifecycle,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::information::Information;
    use crate::logs::{LogFormat, LogSource};
    use crate::remote::{command_hook, Fact, HostIdentity, ScriptedHost};
    use crate::testing::SolutionTest;
    use crate::types::DataType;
    use assert_matches::assert_matches;

    const PRESENCE_CMD: &str = "test -f /opt/guard/guard.bin && echo true || echo false";
    const REQUIREMENT_CMD: &str = "command -v sh > /dev/null && echo true || echo false";
    const UPTIME_CMD: &str = "guardctl uptime";

    fn guard() -> Solution {
        Solution::builder("guard")
            .full_name("Guard")
            .description("Demonstration intrusion detector")
            .maturity(MaturityLevel::Beta)
            .category(SolutionCategory::NetworkIds)
            .information(vec![
                Information::new("port", "Listening port", DataType::Integer)
                    .with_properties(&[
                        InformationProperty::Configuration,
                        InformationProperty::Mandatory,
                        InformationProperty::Writable,
                    ])
                    .with_default(Value::Integer(8080))
                    .with_validator(|v| matches!(v, Value::Integer(p) if (1..=65535).contains(p))),
                Information::new("uptime_seconds", "Seconds since start", DataType::Integer)
                    .with_properties(&[
                        InformationProperty::Metric,
                        InformationProperty::ReadOnly,
                    ])
                    .with_getter(Fact::typed(UPTIME_CMD, DataType::Integer)),
            ])
            .tests(vec![
                SolutionTest::new(
                    "sh_available",
                    "A POSIX shell is available",
                    TestType::Requirement,
                    Fact::boolean(REQUIREMENT_CMD),
                ),
                SolutionTest::new(
                    "binary_present",
                    "Guard binary is installed",
                    TestType::Presence,
                    Fact::boolean(PRESENCE_CMD),
                ),
            ])
            .logs(vec![LogSource::new(
                "alerts",
                "Alert journal",
                LogFormat::Text,
                Fact::raw("cat /opt/guard/alerts.log"),
            )])
            .actions(vec![crate::actions::Action::new(
                "ban_address",
                "Block an address",
                &[("address", DataType::String)],
                |ctx, args| {
                    let address = args.get("address").and_then(Value::as_str).unwrap_or("");
                    ctx.host.run_operation(&format!("guardctl ban {}", address))
                },
            )])
            .lifecycle(LifecycleHooks {
                install: command_hook("guardctl setup"),
                uninstall: command_hook("guardctl teardown"),
                update: command_hook("guardctl upgrade"),
            })
            .build()
            .unwrap()
    }

    fn ctx<'a>(host: &'a ScriptedHost) -> ExecutionContext<'a> {
        ExecutionContext::new(HostIdentity::new("tester@local"), host)
    }

    fn cache() -> (tempfile::TempDir, ConfigurationCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = ConfigurationCache::new(dir.path());
        (dir, cache)
    }

    #[test]
    fn test_builder_requires_lifecycle_and_presence() {
        assert_matches!(
            Solution::builder("bare").build(),
            Err(SolutionError::IncompleteDefinition { .. })
        );

        let no_presence = Solution::builder("bare")
            .lifecycle(LifecycleHooks {
                install: command_hook("true"),
                uninstall: command_hook("true"),
                update: command_hook("true"),
            })
            .build();
        assert_matches!(no_presence, Err(SolutionError::IncompleteDefinition { .. }));
    }

    #[test]
    fn test_full_install_cycle() {
        let solution = guard();
        let host = ScriptedHost::new();
        let (_dir, cache) = cache();
        let ctx = ctx(&host);

        // not installed during install, installed afterwards
        host.push_fact(PRESENCE_CMD, "false");
        host.push_fact(PRESENCE_CMD, "true");
        host.script_fact(REQUIREMENT_CMD, "true");
        host.script_fact(UPTIME_CMD, "60");

        solution.init(&ctx, &cache).unwrap();
        assert!(cache.exists(&ctx.host_id, "guard"));

        solution.install(&ctx, &cache).unwrap();
        assert_eq!(
            host.operations(),
            vec!["mkdir -p /opt/guard".to_string(), "guardctl setup".to_string()]
        );

        let payload = solution.get_information(&ctx, &cache, None).unwrap();
        match payload {
            OperationPayload::Information(values) => {
                assert_eq!(values.get("port"), Some(&Value::Integer(8080)));
                assert_eq!(values.get("uptime_seconds"), Some(&Value::Integer(60)));
            }
            other => panic!("unexpected payload: {:?}", other),
        }

        // metrics never land in the cache file
        let exported = cache.load(&ctx.host_id, "guard").unwrap();
        assert!(exported.contains_key("port"));
        assert!(!exported.contains_key("uptime_seconds"));
    }

    #[test]
    fn test_install_rejects_installed_host_without_side_effects() {
        let solution = guard();
        let host = ScriptedHost::new();
        let (_dir, cache) = cache();
        let ctx = ctx(&host);

        host.script_fact(PRESENCE_CMD, "true");

        solution.init(&ctx, &cache).unwrap();
        assert_matches!(
            solution.install(&ctx, &cache),
            Err(SolutionError::AlreadyInstalled { .. })
        );
        assert!(host.operations().is_empty());
    }

    #[test]
    fn test_install_gated_by_requirements() {
        let solution = guard();
        let host = ScriptedHost::new();
        let (_dir, cache) = cache();
        let ctx = ctx(&host);

        host.script_fact(PRESENCE_CMD, "false");
        host.script_fact(REQUIREMENT_CMD, "false");

        solution.init(&ctx, &cache).unwrap();
        assert_matches!(
            solution.install(&ctx, &cache),
            Err(SolutionError::RequirementsNotMet { test }) if test == "sh_available"
        );
        assert!(host.operations().is_empty());
    }

    #[test]
    fn test_operations_require_configuration_file() {
        let solution = guard();
        let host = ScriptedHost::new();
        let (_dir, cache) = cache();
        let ctx = ctx(&host);

        assert_matches!(
            solution.get_information(&ctx, &cache, None),
            Err(SolutionError::NoConfigurationFile { .. })
        );
        assert_matches!(
            solution.update(&ctx, &cache),
            Err(SolutionError::NoConfigurationFile { .. })
        );
    }

    #[test]
    fn test_install_without_init_falls_back_to_defaults() {
        let solution = guard();
        let host = ScriptedHost::new();
        let (_dir, cache) = cache();
        let ctx = ctx(&host);

        host.script_fact(PRESENCE_CMD, "false");
        host.script_fact(REQUIREMENT_CMD, "true");

        assert!(!cache.exists(&ctx.host_id, "guard"));
        solution.install(&ctx, &cache).unwrap();
        assert_eq!(
            host.operations(),
            vec!["mkdir -p /opt/guard".to_string(), "guardctl setup".to_string()]
        );

        // the declared defaults end up in the freshly written cache file
        let exported = cache.load(&ctx.host_id, "guard").unwrap();
        assert_eq!(exported.get("port"), Some(&serde_json::json!(8080)));
    }

    #[test]
    fn test_operations_require_installed_solution() {
        let solution = guard();
        let host = ScriptedHost::new();
        let (_dir, cache) = cache();
        let ctx = ctx(&host);

        host.script_fact(PRESENCE_CMD, "false");
        solution.init(&ctx, &cache).unwrap();

        assert_matches!(
            solution.get_logs(&ctx, &cache, Some("alerts")),
            Err(SolutionError::NotInstalled { .. })
        );
        assert_matches!(
            solution.update(&ctx, &cache),
            Err(SolutionError::NotInstalled { .. })
        );
    }

    #[test]
    fn test_set_information_round_trip() {
        let solution = guard();
        let host = ScriptedHost::new();
        let (_dir, cache) = cache();
        let ctx = ctx(&host);

        host.script_fact(PRESENCE_CMD, "false");
        host.script_fact(REQUIREMENT_CMD, "true");
        host.script_fact(UPTIME_CMD, "60");
        solution.init(&ctx, &cache).unwrap();
        solution.install(&ctx, &cache).unwrap();
        host.script_fact(PRESENCE_CMD, "true");

        solution
            .set_information(&ctx, &cache, "port", "9090")
            .unwrap();
        let exported = cache.load(&ctx.host_id, "guard").unwrap();
        assert_eq!(exported.get("port"), Some(&serde_json::json!(9090)));

        assert_matches!(
            solution.set_information(&ctx, &cache, "port", "not-a-port"),
            Err(SolutionError::Information(_))
        );
    }

    #[test]
    fn test_test_operation_reports_verdicts() {
        let solution = guard();
        let host = ScriptedHost::new();
        let (_dir, cache) = cache();
        let ctx = ctx(&host);

        host.script_fact(PRESENCE_CMD, "true");
        host.script_fact(REQUIREMENT_CMD, "true");
        host.script_fact(UPTIME_CMD, "60");
        solution.init(&ctx, &cache).unwrap();

        let payload = solution.test(&ctx, &cache, None).unwrap();
        match payload {
            OperationPayload::TestReport(report) => {
                assert_eq!(report.get("binary_present"), Some(&true));
                assert_eq!(report.get("sh_available"), Some(&true));
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_uninstall_removes_home_and_keeps_cache_file() {
        let solution = guard();
        let host = ScriptedHost::new();
        let (_dir, cache) = cache();
        let ctx = ctx(&host);

        host.script_fact(PRESENCE_CMD, "true");
        host.script_fact(UPTIME_CMD, "60");
        solution.init(&ctx, &cache).unwrap();

        solution.uninstall(&ctx, &cache).unwrap();
        assert_eq!(
            host.operations(),
            vec![
                "guardctl teardown".to_string(),
                "rm -rf /opt/guard".to_string()
            ]
        );
        assert!(cache.exists(&ctx.host_id, "guard"));
    }

    #[test]
    fn test_execute_checks_action_before_host_contact() {
        let solution = guard();
        let host = ScriptedHost::new();
        let (_dir, cache) = cache();
        let ctx = ctx(&host);

        assert_matches!(
            solution.execute(&ctx, &cache, "ghost", &BTreeMap::new()),
            Err(SolutionError::Actions(crate::actions::ActionsError::NotFound { .. }))
        );
        assert!(host.fact_queries().is_empty());
        assert!(host.operations().is_empty());
    }

    #[test]
    fn test_execute_runs_known_action() {
        let solution = guard();
        let host = ScriptedHost::new();
        let (_dir, cache) = cache();
        let ctx = ctx(&host);

        host.script_fact(PRESENCE_CMD, "true");
        host.script_fact(UPTIME_CMD, "60");
        solution.init(&ctx, &cache).unwrap();

        let mut args = BTreeMap::new();
        args.insert("address".to_string(), "10.0.0.9".to_string());
        solution.execute(&ctx, &cache, "ban_address", &args).unwrap();
        assert!(host
            .operations()
            .contains(&"guardctl ban 10.0.0.9".to_string()));
    }
}
