//! Per-host deployment outcomes and operation payloads

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actions::ActionDescription;
use crate::information::InformationDescription;
use crate::logs::LogDescription;
use crate::testing::TestDescription;
use crate::types::Value;

/// Outcome kind of one operation on one host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Success,
    Error,
}

/// What an operation produced besides success or failure
#[derive(Debug, Clone, PartialEq)]
pub enum OperationPayload {
    None,
    Information(BTreeMap<String, Value>),
    TestReport(BTreeMap<String, bool>),
    LogContent(BTreeMap<String, String>),
    Catalog {
        information: Vec<InformationDescription>,
        tests: Vec<TestDescription>,
        logs: Vec<LogDescription>,
        actions: Vec<ActionDescription>,
    },
}

impl OperationPayload {
    /// JSON form carried inside a `DeploymentResult`
    pub fn into_json(self) -> Option<serde_json::Value> {
        match self {
            OperationPayload::None => None,
            OperationPayload::Information(values) => Some(serde_json::Value::Object(
                values
                    .into_iter()
                    .map(|(key, value)| (key, value.to_json()))
                    .collect(),
            )),
            OperationPayload::TestReport(report) => Some(serde_json::Value::Object(
                report
                    .into_iter()
                    .map(|(key, passed)| (key, serde_json::Value::Bool(passed)))
                    .collect(),
            )),
            OperationPayload::LogContent(content) => Some(serde_json::Value::Object(
                content
                    .into_iter()
                    .map(|(key, text)| (key, serde_json::Value::String(text)))
                    .collect(),
            )),
            OperationPayload::Catalog {
                information,
                tests,
                logs,
                actions,
            } => Some(serde_json::json!({
                "information": information
                    .iter()
                    .map(|i| serde_json::json!({
                        "identifier": i.identifier,
                        "description": i.description,
                        "type": i.data_type,
                        "properties": i.properties,
                        "default": i.default_value,
                    }))
                    .collect::<Vec<_>>(),
                "tests": tests
                    .iter()
                    .map(|t| serde_json::json!({
                        "identifier": t.identifier,
                        "description": t.description,
                        "type": t.test_type,
                    }))
                    .collect::<Vec<_>>(),
                "logs": logs
                    .iter()
                    .map(|l| serde_json::json!({
                        "identifier": l.identifier,
                        "description": l.description,
                        "format": l.format,
                    }))
                    .collect::<Vec<_>>(),
                "actions": actions
                    .iter()
                    .map(|a| serde_json::json!({
                        "identifier": a.identifier,
                        "description": a.description,
                        "parameters": a.parameters,
                    }))
                    .collect::<Vec<_>>(),
            })),
        }
    }
}

/// Outcome of one operation on one host, ready for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub host_id: String,
    pub kind: ResponseKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    pub completed_at: DateTime<Utc>,
}

impl DeploymentResult {
    pub fn success(
        host_id: impl Into<String>,
        message: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self {
            host_id: host_id.into(),
            kind: ResponseKind::Success,
            message: message.into(),
            payload,
            completed_at: Utc::now(),
        }
    }

    pub fn error(host_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            host_id: host_id.into(),
            kind: ResponseKind::Error,
            message: message.into(),
            payload: None,
            completed_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == ResponseKind::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_serialization_skips_empty_payload() {
        let result = DeploymentResult::error("admin@h:22", "boom");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["message"], "boom");
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn test_information_payload_to_json() {
        let mut values = BTreeMap::new();
        values.insert("port".to_string(), Value::Integer(8080));
        let payload = OperationPayload::Information(values).into_json().unwrap();
        assert_eq!(payload, serde_json::json!({"port": 8080}));
    }

    #[test]
    fn test_test_report_payload_to_json() {
        let mut report = BTreeMap::new();
        report.insert("present".to_string(), true);
        report.insert("active".to_string(), false);
        let payload = OperationPayload::TestReport(report).into_json().unwrap();
        assert_eq!(payload, serde_json::json!({"active": false, "present": true}));
    }

    #[test]
    fn test_empty_payload_is_none() {
        assert!(OperationPayload::None.into_json().is_none());
    }
}
