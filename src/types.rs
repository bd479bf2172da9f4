//! Core types for the NLP gateway

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Liveness report for the gateway itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

impl HealthStatus {
    pub fn up() -> Self {
        Self {
            status: "Up".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// One registered method/path/handler triple
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteInfo {
    pub method: String,
    pub path: String,
    pub name: String,
}

/// A JSON document persisted under a string key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub body: serde_json::Value,
    pub stored_at: DateTime<Utc>,
}

impl Record {
    /// Key a body by its own `id` field when it carries a non-empty one, otherwise by a new UUID
    pub fn new(body: serde_json::Value) -> Self {
        let id = body
            .get("id")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Self {
            id,
            body,
            stored_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_uses_body_id() {
        let record = Record::new(json!({"id": "doc-42", "text": "hello"}));
        assert_eq!(record.id, "doc-42");
    }

    #[test]
    fn test_record_generates_id() {
        let record = Record::new(json!({"text": "hello"}));
        assert!(record.id.parse::<uuid::Uuid>().is_ok());

        // Non-string and empty ids don't count
        let numeric = Record::new(json!({"id": 7}));
        assert!(numeric.id.parse::<uuid::Uuid>().is_ok());
        let empty = Record::new(json!({"id": ""}));
        assert!(empty.id.parse::<uuid::Uuid>().is_ok());
    }

    #[test]
    fn test_health_status_up() {
        assert_eq!(HealthStatus::up().status, "Up");
    }
}
