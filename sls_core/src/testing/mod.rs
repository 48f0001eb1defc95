//! Boolean health checks over a host: requirement, presence, operational,
//! security and integration tests
//!
//! Every test boils down to a fact that must resolve to a boolean. A test
//! may carry a trigger, a best-effort stimulus run before the check whose
//! failure is logged and never fatal.

pub mod error;

pub use error::TestError;

use std::collections::BTreeMap;
use std::fmt;

use crate::remote::{ExecutionContext, Fact, Procedure};
use crate::types::Value;

// ============================================================================
// TEST TYPES
// ============================================================================

/// Category of a check, ordered by lifecycle stage
///
/// `Requirement` gates installation, `Presence` answers "is it installed",
/// the rest probe an installed solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestType {
    Requirement,
    Presence,
    Operational,
    Security,
    Integration,
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TestType::Requirement => "requirement",
            TestType::Presence => "presence",
            TestType::Operational => "operational",
            TestType::Security => "security",
            TestType::Integration => "integration",
        };
        write!(f, "{}", label)
    }
}

// ============================================================================
// TEST DECLARATIONS
// ============================================================================

/// One boolean check against a host
#[derive(Clone)]
pub struct SolutionTest {
    identifier: String,
    description: String,
    test_type: TestType,
    fact: Fact,
    trigger: Option<Procedure>,
}

impl SolutionTest {
    pub fn new(
        identifier: impl Into<String>,
        description: impl Into<String>,
        test_type: TestType,
        fact: Fact,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            description: description.into(),
            test_type,
            fact,
            trigger: None,
        }
    }

    /// Attach a stimulus run before the check (e.g. provoke an alert)
    pub fn with_trigger(mut self, trigger: Procedure) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn test_type(&self) -> TestType {
        self.test_type
    }
}

impl fmt::Debug for SolutionTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolutionTest")
            .field("identifier", &self.identifier)
            .field("test_type", &self.test_type)
            .finish_non_exhaustive()
    }
}

/// Catalog entry for one test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDescription {
    pub identifier: String,
    pub description: String,
    pub test_type: String,
}

// ============================================================================
// RUN OPTIONS
// ============================================================================

/// Selection and verdict handling for one test run
#[derive(Debug, Clone)]
pub struct TestOptions {
    identifier: Option<String>,
    filter_type: Option<TestType>,
    only_check: bool,
    expected: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            identifier: None,
            filter_type: None,
            only_check: false,
            expected: true,
        }
    }
}

impl TestOptions {
    /// Run every registered test
    pub fn all() -> Self {
        Self::default()
    }

    /// Run a single test by identifier
    pub fn single(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            ..Self::default()
        }
    }

    /// Run every test of one type
    pub fn of_type(test_type: TestType) -> Self {
        Self {
            filter_type: Some(test_type),
            ..Self::default()
        }
    }

    /// Record mismatches in the report instead of failing the run
    pub fn check_only(mut self) -> Self {
        self.only_check = true;
        self
    }

    /// Expect each selected test to observe this verdict
    pub fn expecting(mut self, expected: bool) -> Self {
        self.expected = expected;
        self
    }
}

// ============================================================================
// MANAGER
// ============================================================================

/// Registry and runner for a solution's tests
#[derive(Debug, Clone, Default)]
pub struct TestsManager {
    items: BTreeMap<String, SolutionTest>,
}

impl TestsManager {
    pub fn new(items: Vec<SolutionTest>) -> Result<Self, TestError> {
        let mut map = BTreeMap::new();
        for item in items {
            let identifier = item.identifier.clone();
            if map.insert(identifier.clone(), item).is_some() {
                return Err(TestError::DuplicateIdentifier { identifier });
            }
        }
        Ok(Self { items: map })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True if at least one test of the given type is registered
    pub fn has_type(&self, test_type: TestType) -> bool {
        self.items.values().any(|t| t.test_type == test_type)
    }

    /// Run the selected tests and report per-test verdicts
    ///
    /// The report maps each identifier to whether the observed boolean
    /// matched the expected one. With `only_check` unset, the first mismatch
    /// aborts the run with `TestError::Failed`.
    pub fn run(
        &self,
        ctx: &ExecutionContext<'_>,
        options: &TestOptions,
    ) -> Result<BTreeMap<String, bool>, TestError> {
        let selected: Vec<&SolutionTest> = match &options.identifier {
            Some(id) => vec![self.items.get(id).ok_or_else(|| TestError::NotFound {
                identifier: id.clone(),
            })?],
            None => self
                .items
                .values()
                .filter(|t| options.filter_type.map_or(true, |wanted| wanted == t.test_type))
                .collect(),
        };

        let mut report = BTreeMap::new();
        for test in selected {
            if let Some(trigger) = &test.trigger {
                if let Err(err) = trigger(ctx) {
                    log::warn!(
                        "Trigger of test '{}' failed, continuing with the check: {}",
                        test.identifier,
                        err
                    );
                }
            }

            let observed = match test.fact.query(ctx) {
                Ok(Value::Boolean(b)) => b,
                Ok(other) => {
                    return Err(TestError::UnresolvableFact {
                        identifier: test.identifier.clone(),
                        reason: format!("got a {} value", other.shape_name()),
                    })
                }
                Err(crate::remote::RemoteError::UnparsableFact { reason }) => {
                    return Err(TestError::UnresolvableFact {
                        identifier: test.identifier.clone(),
                        reason,
                    })
                }
                Err(err) => return Err(err.into()),
            };

            let matched = observed == options.expected;
            report.insert(test.identifier.clone(), matched);
            if !matched && !options.only_check {
                return Err(TestError::Failed {
                    identifier: test.identifier.clone(),
                });
            }
        }
        Ok(report)
    }

    /// Static catalog of every test
    pub fn describe(&self) -> Vec<TestDescription> {
        self.items
            .values()
            .map(|test| TestDescription {
                identifier: test.identifier.clone(),
                description: test.description.clone(),
                test_type: test.test_type.to_string(),
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
