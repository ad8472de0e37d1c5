//! Microsoft Graph JSON batch sub-requests and sub-responses.

use serde::{Deserialize, Serialize};

/// Maximum number of sub-requests Graph accepts in one `$batch` call.
pub const MAX_BATCH_REQUESTS: usize = 20;

/// One sub-request inside a Graph `$batch` call.
///
/// `id` must be unique within a single batch submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub id: String,
    pub method: String,
    pub url: String,
}

impl BatchRequest {
    /// Creates a GET sub-request.
    pub fn get(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method: "GET".to_string(),
            url: url.into(),
        }
    }
}

/// One sub-response of a Graph `$batch` call, correlated to its request by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub id: String,
    pub status: u16,
    #[serde(default)]
    pub body: serde_json::Value,
}

impl BatchResponse {
    /// Only `200 OK` sub-responses carry data that is consumed.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Per-device lookups that can share a batch with other devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Activity,
    Configuration,
    Health,
    Operations,
}

impl LookupKind {
    /// Every per-device lookup, in the order they are queued.
    pub const ALL: [LookupKind; 4] = [
        LookupKind::Activity,
        LookupKind::Configuration,
        LookupKind::Health,
        LookupKind::Operations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::Configuration => "configuration",
            Self::Health => "health",
            Self::Operations => "operations",
        }
    }

    /// Batch id for this lookup of `device_id`, e.g. `"<id>-activity"`.
    pub fn request_id(&self, device_id: &str) -> String {
        format!("{}-{}", device_id, self.as_str())
    }

    /// Graph path for this lookup of `device_id`.
    pub fn url(&self, device_id: &str) -> String {
        format!("/teamwork/devices/{}/{}", device_id, self.as_str())
    }

    /// Sub-request for this lookup of `device_id`.
    pub fn request(&self, device_id: &str) -> BatchRequest {
        BatchRequest::get(self.request_id(device_id), self.url(device_id))
    }
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_request() {
        let request = BatchRequest::get("1", "/teamwork/devices/");
        assert_eq!(request.method, "GET");
        assert_eq!(request.url, "/teamwork/devices/");
    }

    #[test]
    fn test_lookup_request_ids_are_device_suffixed() {
        let request = LookupKind::Health.request("dev-1");
        assert_eq!(request.id, "dev-1-health");
        assert_eq!(request.url, "/teamwork/devices/dev-1/health");

        let ids: Vec<String> = LookupKind::ALL.iter().map(|k| k.request_id("d")).collect();
        assert_eq!(
            ids,
            vec!["d-activity", "d-configuration", "d-health", "d-operations"]
        );
    }

    #[test]
    fn test_response_without_body() {
        let response: BatchResponse =
            serde_json::from_value(json!({ "id": "1", "status": 404 })).unwrap();
        assert!(!response.is_ok());
        assert!(response.body.is_null());
    }

    #[test]
    fn test_response_ignores_headers() {
        let response: BatchResponse = serde_json::from_value(json!({
            "id": "dev-1-activity",
            "status": 200,
            "headers": { "Content-Type": "application/json" },
            "body": { "activePeripherals": null }
        }))
        .unwrap();
        assert!(response.is_ok());
        assert_eq!(response.id, "dev-1-activity");
    }
}
