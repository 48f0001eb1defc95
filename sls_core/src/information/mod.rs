//! Typed information registry: configuration and metric declarations plus
//! the manager that reads, writes and validates them against a host
//!
//! An `Information` is pure declaration; all host state lives in the
//! `HostConfiguration` store passed into each manager operation.

pub mod error;

pub use error::InformationError;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::remote::{ExecutionContext, Fact, Setter};
use crate::store::HostConfiguration;
use crate::types::{DataType, Value};

// ============================================================================
// PROPERTY AXES
// ============================================================================

/// Behavioral properties of an information declaration
///
/// `Configuration` items are persisted and writable by operators; `Metric`
/// items are read-only measurements. The generation properties describe how
/// an unset value gets its first content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InformationProperty {
    Configuration,
    Metric,
    Mandatory,
    Optional,
    WithDefaultValue,
    NonDeductible,
    AutoGeneratedBeforeInstall,
    AutoGeneratedAfterInstall,
    ReadOnly,
    Writable,
}

impl fmt::Display for InformationProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InformationProperty::Configuration => "configuration",
            InformationProperty::Metric => "metric",
            InformationProperty::Mandatory => "mandatory",
            InformationProperty::Optional => "optional",
            InformationProperty::WithDefaultValue => "with default value",
            InformationProperty::NonDeductible => "non-deductible",
            InformationProperty::AutoGeneratedBeforeInstall => "auto-generated before install",
            InformationProperty::AutoGeneratedAfterInstall => "auto-generated after install",
            InformationProperty::ReadOnly => "read-only",
            InformationProperty::Writable => "writable",
        };
        write!(f, "{}", label)
    }
}

// ============================================================================
// INFORMATION DECLARATIONS
// ============================================================================

/// Optional business-rule check applied after structural validation
pub type ValueValidator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A single typed configuration item or metric of a solution
#[derive(Clone)]
pub struct Information {
    identifier: String,
    description: String,
    data_type: DataType,
    properties: BTreeSet<InformationProperty>,
    default_value: Option<Value>,
    getter: Option<Fact>,
    setter: Option<Setter>,
    validator: Option<ValueValidator>,
}

impl Information {
    pub fn new(
        identifier: impl Into<String>,
        description: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            description: description.into(),
            data_type,
            properties: BTreeSet::new(),
            default_value: None,
            getter: None,
            setter: None,
            validator: None,
        }
    }

    pub fn with_properties(mut self, properties: &[InformationProperty]) -> Self {
        self.properties.extend(properties.iter().copied());
        self
    }

    pub fn with_default(mut self, default_value: Value) -> Self {
        self.default_value = Some(default_value);
        self.properties.insert(InformationProperty::WithDefaultValue);
        self
    }

    pub fn with_getter(mut self, getter: Fact) -> Self {
        self.getter = Some(getter);
        self
    }

    pub fn with_setter(
        mut self,
        setter: impl Fn(&ExecutionContext<'_>, Option<&Value>, &Value) -> Result<(), crate::remote::RemoteError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.setter = Some(Arc::new(setter));
        self
    }

    pub fn with_validator(
        mut self,
        validator: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn has(&self, property: InformationProperty) -> bool {
        self.properties.contains(&property)
    }

    /// Read-only either explicitly or because the item is a metric
    pub fn is_read_only(&self) -> bool {
        self.has(InformationProperty::ReadOnly) || self.has(InformationProperty::Metric)
    }

    fn check_declaration(&self) -> Result<(), InformationError> {
        let invalid = |reason: &str| InformationError::InvalidDeclaration {
            identifier: self.identifier.clone(),
            reason: reason.to_string(),
        };

        let is_configuration = self.has(InformationProperty::Configuration);
        let is_metric = self.has(InformationProperty::Metric);
        if is_configuration == is_metric {
            return Err(invalid("exactly one of the configuration and metric properties is required"));
        }
        if is_metric && self.has(InformationProperty::Writable) {
            return Err(invalid("a metric cannot be writable"));
        }
        if self.has(InformationProperty::Mandatory) && self.has(InformationProperty::Optional) {
            return Err(invalid("mandatory and optional are mutually exclusive"));
        }
        if self.has(InformationProperty::WithDefaultValue) {
            match &self.default_value {
                None => return Err(invalid("a default value is declared but not provided")),
                Some(default) if !self.data_type.validate(default) => {
                    return Err(invalid("the default value does not match the declared type"))
                }
                Some(_) => {}
            }
        } else if self.default_value.is_some() {
            return Err(invalid(
                "a default value is provided without the matching property",
            ));
        }
        if self.has(InformationProperty::NonDeductible) && self.getter.is_some() {
            return Err(invalid("a non-deductible value cannot have a getter"));
        }
        let auto_generated = self.has(InformationProperty::AutoGeneratedBeforeInstall)
            || self.has(InformationProperty::AutoGeneratedAfterInstall);
        if auto_generated && self.getter.is_none() {
            return Err(invalid("an auto-generated value requires a getter"));
        }
        Ok(())
    }
}

impl fmt::Debug for Information {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Information")
            .field("identifier", &self.identifier)
            .field("data_type", &self.data_type)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

/// Catalog entry for one information declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InformationDescription {
    pub identifier: String,
    pub description: String,
    pub data_type: String,
    pub properties: Vec<String>,
    pub default_value: Option<String>,
}

// ============================================================================
// MANAGER
// ============================================================================

/// Registry and access layer over a solution's information declarations
#[derive(Debug, Clone, Default)]
pub struct InformationManager {
    items: BTreeMap<String, Information>,
}

impl InformationManager {
    /// Register declarations, enforcing the property invariants up front
    pub fn new(items: Vec<Information>) -> Result<Self, InformationError> {
        let mut map = BTreeMap::new();
        for item in items {
            item.check_declaration()?;
            let identifier = item.identifier.clone();
            if map.insert(identifier.clone(), item).is_some() {
                return Err(InformationError::DuplicateIdentifier { identifier });
            }
        }
        Ok(Self { items: map })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.items.keys().map(String::as_str).collect()
    }

    fn item(&self, identifier: &str) -> Result<&Information, InformationError> {
        self.items
            .get(identifier)
            .ok_or_else(|| InformationError::NotFound {
                identifier: identifier.to_string(),
            })
    }

    /// Refresh one or all values from the host, then return the selection
    ///
    /// Non-deductible items and items without a getter keep their cached
    /// value; they still appear in the result when set.
    pub fn get(
        &self,
        ctx: &ExecutionContext<'_>,
        store: &mut HostConfiguration,
        identifier: Option<&str>,
    ) -> Result<BTreeMap<String, Value>, InformationError> {
        let selected: Vec<&Information> = match identifier {
            Some(id) => vec![self.item(id)?],
            None => self.items.values().collect(),
        };

        for info in &selected {
            if info.has(InformationProperty::NonDeductible) {
                continue;
            }
            if let Some(getter) = &info.getter {
                let value = getter.query(ctx)?;
                self.accept(info, &value)?;
                store.set(info.identifier.clone(), value);
            }
        }

        let mut result = BTreeMap::new();
        for info in selected {
            if let Some(value) = store.get(&info.identifier) {
                result.insert(info.identifier.clone(), value.clone());
            }
        }
        Ok(result)
    }

    /// Refresh every deducible value from the host
    pub fn refresh(
        &self,
        ctx: &ExecutionContext<'_>,
        store: &mut HostConfiguration,
    ) -> Result<(), InformationError> {
        self.get(ctx, store, None).map(|_| ())
    }

    /// Write a value locally, then propagate it through the setter
    ///
    /// The local store is updated before the remote side effect runs, so a
    /// failed setter still leaves an accurate local record. Raw string input
    /// that does not match the declared shape is re-parsed with the declared
    /// type before being rejected.
    pub fn set(
        &self,
        ctx: &ExecutionContext<'_>,
        store: &mut HostConfiguration,
        identifier: &str,
        value: Value,
        local_only: bool,
    ) -> Result<(), InformationError> {
        let info = self.item(identifier)?;
        if !info.has(InformationProperty::Configuration) || info.is_read_only() {
            return Err(InformationError::NotWritable {
                identifier: identifier.to_string(),
            });
        }

        let candidate = self.coerce(info, value)?;
        let previous = store.get(identifier).cloned();
        store.set(identifier.to_string(), candidate.clone());

        if !local_only {
            if let Some(setter) = &info.setter {
                setter(ctx, previous.as_ref(), &candidate)?;
            }
        }
        Ok(())
    }

    /// Seed declared defaults and resolve pre-install generated values
    pub fn set_defaults_locally(
        &self,
        ctx: &ExecutionContext<'_>,
        store: &mut HostConfiguration,
    ) -> Result<(), InformationError> {
        for info in self.items.values() {
            if let Some(default) = &info.default_value {
                store.set(info.identifier.clone(), default.clone());
            }
        }
        self.resolve_auto_generated(ctx, store, InformationProperty::AutoGeneratedBeforeInstall)
    }

    /// Restore exported values into the store, then regenerate and validate
    ///
    /// Restoration bypasses the writability gate so read-only configuration
    /// survives a reload; type and business validation still apply. Unknown
    /// keys fail loudly rather than being dropped.
    pub fn populate(
        &self,
        ctx: &ExecutionContext<'_>,
        store: &mut HostConfiguration,
        exported: &BTreeMap<String, serde_json::Value>,
        post_install: bool,
    ) -> Result<(), InformationError> {
        for (key, json) in exported {
            let info = self.item(key)?;
            let value = info.data_type.value_from_json(json).map_err(|err| {
                InformationError::InvalidValue {
                    identifier: key.clone(),
                    reason: err.to_string(),
                }
            })?;
            self.accept(info, &value)?;
            store.set(key.clone(), value);
        }

        self.resolve_auto_generated(
            ctx,
            store,
            InformationProperty::AutoGeneratedBeforeInstall,
        )?;
        if post_install {
            self.resolve_auto_generated(
                ctx,
                store,
                InformationProperty::AutoGeneratedAfterInstall,
            )?;
        }
        self.validate_all(store, None)
    }

    /// Query the getter of every item carrying the given generation property
    pub(crate) fn resolve_auto_generated(
        &self,
        ctx: &ExecutionContext<'_>,
        store: &mut HostConfiguration,
        property: InformationProperty,
    ) -> Result<(), InformationError> {
        for info in self.items.values() {
            if !info.has(property) {
                continue;
            }
            // registration guarantees a getter for generated values
            if let Some(getter) = &info.getter {
                let value = getter.query(ctx)?;
                self.accept(info, &value)?;
                store.set(info.identifier.clone(), value);
            }
        }
        Ok(())
    }

    /// Check that every mandatory item (matching the filter) has a value
    pub fn validate_all(
        &self,
        store: &HostConfiguration,
        filter: Option<InformationProperty>,
    ) -> Result<(), InformationError> {
        for info in self.items.values() {
            if let Some(property) = filter {
                if !info.has(property) {
                    continue;
                }
            }
            if info.has(InformationProperty::Mandatory) && !store.is_set(&info.identifier) {
                return Err(InformationError::MandatoryUnset {
                    identifier: info.identifier.clone(),
                });
            }
        }
        Ok(())
    }

    /// Pure projection of currently set values, optionally narrowed by
    /// identifier or property; no remote contact
    pub fn represent_as_dict(
        &self,
        store: &HostConfiguration,
        identifier: Option<&str>,
        filter: Option<InformationProperty>,
    ) -> BTreeMap<String, Value> {
        let mut result = BTreeMap::new();
        for info in self.items.values() {
            if let Some(id) = identifier {
                if info.identifier != id {
                    continue;
                }
            }
            if let Some(property) = filter {
                if !info.has(property) {
                    continue;
                }
            }
            if let Some(value) = store.get(&info.identifier) {
                result.insert(info.identifier.clone(), value.clone());
            }
        }
        result
    }

    /// Configuration values only, in JSON form ready for the cache file
    pub fn export_configuration(
        &self,
        store: &HostConfiguration,
    ) -> BTreeMap<String, serde_json::Value> {
        self.represent_as_dict(store, None, Some(InformationProperty::Configuration))
            .into_iter()
            .map(|(key, value)| (key, value.to_json()))
            .collect()
    }

    /// Static catalog of every declaration
    pub fn describe(&self) -> Vec<InformationDescription> {
        self.items
            .values()
            .map(|info| InformationDescription {
                identifier: info.identifier.clone(),
                description: info.description.clone(),
                data_type: info.data_type.to_string(),
                properties: info.properties.iter().map(|p| p.to_string()).collect(),
                default_value: info.default_value.as_ref().map(Value::canonical_string),
            })
            .collect()
    }

    /// Structural coercion plus business validation for one declaration
    fn coerce(&self, info: &Information, value: Value) -> Result<Value, InformationError> {
        let candidate = if info.data_type.validate(&value) {
            value
        } else if let Value::String(raw) = &value {
            info.data_type
                .parse(raw)
                .map_err(|err| InformationError::InvalidValue {
                    identifier: info.identifier.clone(),
                    reason: err.to_string(),
                })?
        } else {
            return Err(InformationError::InvalidValue {
                identifier: info.identifier.clone(),
                reason: format!(
                    "expected {}, got a {} value",
                    info.data_type,
                    value.shape_name()
                ),
            });
        };
        self.accept(info, &candidate)?;
        Ok(candidate)
    }

    /// Validate an already-typed value against shape and business rules
    fn accept(&self, info: &Information, value: &Value) -> Result<(), InformationError> {
        if !info.data_type.validate(value) {
            return Err(InformationError::InvalidValue {
                identifier: info.identifier.clone(),
                reason: format!(
                    "expected {}, got a {} value",
                    info.data_type,
                    value.shape_name()
                ),
            });
        }
        if let Some(validator) = &info.validator {
            if !validator(value) {
                return Err(InformationError::InvalidValue {
                    identifier: info.identifier.clone(),
                    reason: "rejected by the declaration's validator".to_string(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
