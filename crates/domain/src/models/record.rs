//! Flattened Teams device records handed back to callers.
//!
//! Two fixed shapes exist: [`TeamsDeviceSummary`] for plain inventory
//! listings and [`TeamsDeviceDetail`] when per-device activity,
//! configuration, health and operation data were requested.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// List-shape record: identity, hardware and health.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TeamsDeviceSummary {
    #[serde(rename = "TACDeviceID")]
    pub tac_device_id: String,
    pub device_type: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub user_display_name: Option<String>,
    /// Empty when the device has no signed-in user or the lookup failed
    #[serde(rename = "UserUPN")]
    pub user_upn: String,
    pub serial_number: Option<String>,
    pub mac_addresses: Vec<String>,
    pub device_health: Option<String>,
    pub activity_state: Option<String>,
    pub when_created: Option<DateTime<Utc>>,
    pub when_changed: Option<DateTime<Utc>>,
    pub changed_by_user: Option<String>,
}

/// Detailed record: the summary plus activity, configuration, health,
/// software versions and the outcome of the most recent device operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TeamsDeviceDetail {
    #[serde(flatten)]
    pub summary: TeamsDeviceSummary,

    pub notes: Option<String>,
    pub company_asset_tag: Option<String>,

    // Active peripherals
    pub room_camera: Option<String>,
    pub content_camera: Option<String>,
    pub speaker: Option<String>,
    pub communication_speaker: Option<String>,
    pub microphone: Option<String>,

    // Health
    pub connection_status: Option<String>,
    pub connection_last_modified: Option<DateTime<Utc>>,
    pub teams_connection: Option<String>,
    pub exchange_connection: Option<String>,
    pub skype_connection: Option<String>,
    pub compute_health: Option<String>,
    pub hdmi_ingest_health: Option<String>,
    pub admin_agent_freshness: Option<String>,
    pub company_portal_freshness: Option<String>,
    pub firmware_freshness: Option<String>,
    pub operating_system_freshness: Option<String>,
    pub partner_agent_freshness: Option<String>,
    pub teams_client_freshness: Option<String>,

    // Configuration
    pub configuration_created: Option<DateTime<Utc>>,
    pub configuration_created_by: Option<String>,
    pub configuration_last_modified: Option<DateTime<Utc>>,
    pub configuration_last_modified_by: Option<String>,
    pub camera_configuration: Option<serde_json::Value>,
    pub display_configuration: Option<serde_json::Value>,
    pub microphone_configuration: Option<serde_json::Value>,
    pub speaker_configuration: Option<serde_json::Value>,
    pub system_configuration: Option<serde_json::Value>,
    pub teams_client_configuration: Option<serde_json::Value>,
    pub hardware_configuration: Option<serde_json::Value>,

    // Software versions
    pub admin_agent_version: Option<String>,
    pub operating_system_version: Option<String>,
    pub teams_client_version: Option<String>,
    pub firmware_version: Option<String>,
    pub partner_agent_version: Option<String>,

    // Most recent operation; empty strings when the device has none.
    pub last_history_action: String,
    pub last_history_status: String,
    pub last_history_initiated_by: String,
    pub last_history_modified_date: String,
    pub last_history_errors: String,
}

/// A record of either shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TeamsDeviceRecord {
    Summary(TeamsDeviceSummary),
    Detailed(Box<TeamsDeviceDetail>),
}

impl TeamsDeviceRecord {
    /// Identity and hardware fields shared by both shapes.
    pub fn summary(&self) -> &TeamsDeviceSummary {
        match self {
            Self::Summary(summary) => summary,
            Self::Detailed(detail) => &detail.summary,
        }
    }

    pub fn tac_device_id(&self) -> &str {
        &self.summary().tac_device_id
    }

    pub fn user_upn(&self) -> &str {
        &self.summary().user_upn
    }

    /// Output ordering: device type, then manufacturer, then model.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        let key = |r: &Self| {
            let s = r.summary();
            (s.device_type.clone(), s.manufacturer.clone(), s.model.clone())
        };
        key(self).cmp(&key(other))
    }
}

impl From<TeamsDeviceSummary> for TeamsDeviceRecord {
    fn from(summary: TeamsDeviceSummary) -> Self {
        Self::Summary(summary)
    }
}

impl From<TeamsDeviceDetail> for TeamsDeviceRecord {
    fn from(detail: TeamsDeviceDetail) -> Self {
        Self::Detailed(Box::new(detail))
    }
}

/// Sorts records by `(DeviceType, Manufacturer, Model)`, missing values first.
pub fn sort_records(records: &mut [TeamsDeviceRecord]) {
    records.sort_by(|a, b| a.sort_cmp(b));
}
