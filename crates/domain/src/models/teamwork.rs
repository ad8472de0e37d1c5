//! Microsoft Graph Teams device resources as returned by `/teamwork/devices`.
//!
//! Every field is optional on the wire; missing or `null` values deserialize
//! to `None` so a sparse response never fails a whole record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Graph collection page (`{"value": [...], "@odata.nextLink": "..."}`).
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionPage<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// A Teams-certified device (`teamworkDevice`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamworkDevice {
    pub id: String,
    pub device_type: Option<String>,
    pub notes: Option<String>,
    pub company_asset_tag: Option<String>,
    pub health_status: Option<String>,
    pub activity_state: Option<String>,
    pub created_date_time: Option<DateTime<Utc>>,
    pub last_modified_date_time: Option<DateTime<Utc>>,
    pub created_by: Option<IdentitySet>,
    pub last_modified_by: Option<IdentitySet>,
    pub hardware_detail: Option<HardwareDetail>,
    pub current_user: Option<TeamworkUserIdentity>,
}

impl TeamworkDevice {
    /// Identifier of the user currently signed in to the device, if any.
    pub fn current_user_id(&self) -> Option<&str> {
        self.current_user
            .as_ref()
            .and_then(|user| user.id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HardwareDetail {
    pub serial_number: Option<String>,
    pub unique_id: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub mac_addresses: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamworkUserIdentity {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub user_identity_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentitySet {
    pub user: Option<Identity>,
    pub application: Option<Identity>,
}

impl IdentitySet {
    /// Display name of the user, falling back to the application.
    pub fn display_name(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|i| i.display_name.as_deref())
            .or_else(|| {
                self.application
                    .as_ref()
                    .and_then(|i| i.display_name.as_deref())
            })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Identity {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

/// `/teamwork/devices/{id}/activity`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamworkDeviceActivity {
    pub active_peripherals: Option<ActivePeripherals>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivePeripherals {
    pub room_camera: Option<Peripheral>,
    pub content_camera: Option<Peripheral>,
    pub speaker: Option<Peripheral>,
    pub communication_speaker: Option<Peripheral>,
    pub microphone: Option<Peripheral>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Peripheral {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub vendor_id: Option<String>,
    pub product_id: Option<String>,
}

/// `/teamwork/devices/{id}/configuration`
///
/// The per-component configuration blocks are kept as raw JSON; their
/// shapes differ between device families.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamworkDeviceConfiguration {
    pub created_date_time: Option<DateTime<Utc>>,
    pub created_by: Option<IdentitySet>,
    pub last_modified_date_time: Option<DateTime<Utc>>,
    pub last_modified_by: Option<IdentitySet>,
    pub software_versions: Option<SoftwareVersions>,
    pub camera_configuration: Option<serde_json::Value>,
    pub display_configuration: Option<serde_json::Value>,
    pub microphone_configuration: Option<serde_json::Value>,
    pub speaker_configuration: Option<serde_json::Value>,
    pub system_configuration: Option<serde_json::Value>,
    pub teams_client_configuration: Option<serde_json::Value>,
    pub hardware_configuration: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SoftwareVersions {
    pub admin_agent_software_version: Option<String>,
    pub operating_system_software_version: Option<String>,
    pub teams_client_software_version: Option<String>,
    pub firmware_software_version: Option<String>,
    pub partner_agent_software_version: Option<String>,
}

/// `/teamwork/devices/{id}/health`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamworkDeviceHealth {
    pub connection: Option<Connection>,
    pub login_status: Option<LoginStatus>,
    pub hardware_health: Option<HardwareHealth>,
    pub software_update_health: Option<SoftwareUpdateHealth>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Connection {
    pub connection_status: Option<String>,
    pub last_modified_date_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginStatus {
    pub teams_connection: Option<Connection>,
    pub exchange_connection: Option<Connection>,
    pub skype_connection: Option<Connection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HardwareHealth {
    pub compute_health: Option<ComponentHealth>,
    pub hdmi_ingest_health: Option<ComponentHealth>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentHealth {
    pub connection: Option<Connection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SoftwareUpdateHealth {
    pub admin_agent_software_update_status: Option<SoftwareUpdateStatus>,
    pub company_portal_software_update_status: Option<SoftwareUpdateStatus>,
    pub firmware_software_update_status: Option<SoftwareUpdateStatus>,
    pub operating_system_software_update_status: Option<SoftwareUpdateStatus>,
    pub partner_agent_software_update_status: Option<SoftwareUpdateStatus>,
    pub teams_client_software_update_status: Option<SoftwareUpdateStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SoftwareUpdateStatus {
    pub software_freshness: Option<String>,
    pub current_version: Option<String>,
    pub available_version: Option<String>,
}

/// One entry of `/teamwork/devices/{id}/operations`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamworkDeviceOperation {
    pub id: Option<String>,
    pub operation_type: Option<String>,
    pub status: Option<String>,
    pub created_by: Option<IdentitySet>,
    pub created_date_time: Option<DateTime<Utc>>,
    pub last_action_by: Option<IdentitySet>,
    pub last_action_date_time: Option<DateTime<Utc>>,
    pub started_date_time: Option<DateTime<Utc>>,
    pub completed_date_time: Option<DateTime<Utc>>,
    pub error: Option<OperationError>,
}

impl TeamworkDeviceOperation {
    /// Timestamp used to order operations newest-first.
    pub fn sort_key(&self) -> Option<DateTime<Utc>> {
        self.last_action_date_time.or(self.created_date_time)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperationError {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code.as_deref(), self.message.as_deref()) {
            (Some(code), Some(message)) => write!(f, "{}: {}", code, message),
            (Some(code), None) => write!(f, "{}", code),
            (None, Some(message)) => write!(f, "{}", message),
            (None, None) => Ok(()),
        }
    }
}

/// Subset of a Graph `user` needed to resolve a device's signed-in user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphUser {
    pub id: String,
    pub display_name: Option<String>,
    pub user_principal_name: Option<String>,
}
