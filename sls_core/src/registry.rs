//! Registry of available solutions, keyed by identifier

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::solution::{MaturityLevel, Solution};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("A solution with identifier '{identifier}' is already registered")]
    DuplicateIdentifier { identifier: String },

    #[error("No solution with identifier '{identifier}'")]
    NotFound { identifier: String },
}

/// Catalog entry for one registered solution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionSummary {
    pub identifier: String,
    pub full_name: String,
    pub maturity: String,
    pub categories: Vec<String>,
}

/// All solutions this deployment knows how to manage
#[derive(Debug, Default)]
pub struct SolutionRegistry {
    solutions: BTreeMap<String, Arc<Solution>>,
}

impl SolutionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, solution: Solution) -> Result<(), RegistryError> {
        let identifier = solution.identifier().to_string();
        if self.solutions.contains_key(&identifier) {
            return Err(RegistryError::DuplicateIdentifier { identifier });
        }
        self.solutions.insert(identifier, Arc::new(solution));
        Ok(())
    }

    pub fn get(&self, identifier: &str) -> Result<&Arc<Solution>, RegistryError> {
        self.solutions
            .get(identifier)
            .ok_or_else(|| RegistryError::NotFound {
                identifier: identifier.to_string(),
            })
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.solutions.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// Solutions at or above the given maturity level
    pub fn with_min_maturity(&self, level: MaturityLevel) -> Vec<&Arc<Solution>> {
        self.solutions
            .values()
            .filter(|solution| solution.maturity() >= level)
            .collect()
    }

    /// Catalog of every registered solution
    pub fn summaries(&self) -> Vec<SolutionSummary> {
        self.solutions
            .values()
            .map(|solution| SolutionSummary {
                identifier: solution.identifier().to_string(),
                full_name: solution.full_name().to_string(),
                maturity: solution.maturity().to_string(),
                categories: solution
                    .categories()
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{command_hook, Fact};
    use crate::solution::{LifecycleHooks, SolutionCategory};
    use crate::testing::{SolutionTest, TestType};
    use assert_matches::assert_matches;

    fn minimal(identifier: &str, maturity: MaturityLevel) -> Solution {
        Solution::builder(identifier)
            .maturity(maturity)
            .category(SolutionCategory::Firewall)
            .tests(vec![SolutionTest::new(
                "present",
                "Installed probe",
                TestType::Presence,
                Fact::boolean("probe"),
            )])
            .lifecycle(LifecycleHooks {
                install: command_hook("true"),
                uninstall: command_hook("true"),
                update: command_hook("true"),
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = SolutionRegistry::new();
        registry
            .register(minimal("guard", MaturityLevel::Production))
            .unwrap();

        assert_eq!(registry.get("guard").unwrap().identifier(), "guard");
        assert_matches!(registry.get("ghost"), Err(RegistryError::NotFound { .. }));
        assert_matches!(
            registry.register(minimal("guard", MaturityLevel::Beta)),
            Err(RegistryError::DuplicateIdentifier { .. })
        );
    }

    #[test]
    fn test_maturity_filter() {
        let mut registry = SolutionRegistry::new();
        registry
            .register(minimal("stable", MaturityLevel::Production))
            .unwrap();
        registry
            .register(minimal("wip", MaturityLevel::Experimental))
            .unwrap();

        let production = registry.with_min_maturity(MaturityLevel::Beta);
        assert_eq!(production.len(), 1);
        assert_eq!(production[0].identifier(), "stable");
        assert_eq!(registry.with_min_maturity(MaturityLevel::DevOnly).len(), 2);
    }

    #[test]
    fn test_summaries() {
        let mut registry = SolutionRegistry::new();
        registry
            .register(minimal("guard", MaturityLevel::Beta))
            .unwrap();

        let summaries = registry.summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].identifier, "guard");
        assert_eq!(summaries[0].maturity, "beta");
        assert_eq!(summaries[0].categories, vec!["firewall".to_string()]);
    }
}
