//! Joins device list entries with their secondary lookup responses and
//! flattens them into output records.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::models::batch::{BatchRequest, BatchResponse, LookupKind};
use crate::models::device_type::device_type_label;
use crate::models::record::{TeamsDeviceDetail, TeamsDeviceRecord, TeamsDeviceSummary};
use crate::models::teamwork::{
    CollectionPage, Connection, GraphUser, Peripheral, SoftwareUpdateStatus, TeamworkDevice,
    TeamworkDeviceActivity, TeamworkDeviceConfiguration, TeamworkDeviceHealth,
    TeamworkDeviceOperation,
};

/// Successful sub-response bodies collected across every dispatched batch,
/// keyed by sub-request id.
#[derive(Debug, Default)]
pub struct LookupResults {
    bodies: HashMap<String, serde_json::Value>,
}

impl LookupResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the `200 OK` sub-responses; anything else means "no data".
    ///
    /// Returns the number of responses kept.
    pub fn absorb(&mut self, responses: impl IntoIterator<Item = BatchResponse>) -> usize {
        let mut kept = 0;
        for response in responses {
            if response.is_ok() {
                self.bodies.insert(response.id, response.body);
                kept += 1;
            } else {
                debug!(
                    request_id = %response.id,
                    status = response.status,
                    "Skipping unsuccessful batch sub-response"
                );
            }
        }
        kept
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Deserializes the body stored under `id`.
    ///
    /// A body that does not match `T` is logged once and treated as absent.
    pub fn get<T: DeserializeOwned>(&self, id: &str) -> Option<T> {
        let body = self.bodies.get(id)?;
        match serde_json::from_value(body.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(request_id = %id, error = %e, "Malformed batch sub-response body");
                None
            }
        }
    }

    /// Profile of `user_id`, if it was looked up successfully.
    pub fn user(&self, user_id: &str) -> Option<GraphUser> {
        self.get(user_id)
    }

    /// Every lookup result for one device.
    pub fn device_lookups(&self, device: &TeamworkDevice) -> DeviceLookups {
        let id = device.id.as_str();
        DeviceLookups {
            user: device.current_user_id().and_then(|u| self.user(u)),
            activity: self.get(&LookupKind::Activity.request_id(id)),
            configuration: self.get(&LookupKind::Configuration.request_id(id)),
            health: self.get(&LookupKind::Health.request_id(id)),
            operations: self
                .get::<CollectionPage<TeamworkDeviceOperation>>(
                    &LookupKind::Operations.request_id(id),
                )
                .map(|page| page.value),
        }
    }
}

/// Secondary data for one device; `None` wherever the lookup failed or was
/// never issued.
#[derive(Debug, Clone, Default)]
pub struct DeviceLookups {
    pub user: Option<GraphUser>,
    pub activity: Option<TeamworkDeviceActivity>,
    pub configuration: Option<TeamworkDeviceConfiguration>,
    pub health: Option<TeamworkDeviceHealth>,
    pub operations: Option<Vec<TeamworkDeviceOperation>>,
}

/// The five sub-requests for a single device: detail, activity,
/// configuration, health and operations.
pub fn single_device_requests(device_id: &str) -> Vec<BatchRequest> {
    let mut requests = vec![BatchRequest::get(
        device_id,
        format!("/teamwork/devices/{}", device_id),
    )];
    requests.extend(LookupKind::ALL.iter().map(|kind| kind.request(device_id)));
    requests
}

/// Builds the record for `device`, in detailed shape when requested.
pub fn join_device(
    device: &TeamworkDevice,
    results: &LookupResults,
    detailed: bool,
) -> TeamsDeviceRecord {
    let lookups = results.device_lookups(device);
    if detailed {
        build_detail(device, lookups).into()
    } else {
        build_summary(device, lookups.user.as_ref()).into()
    }
}

/// Flattens identity, hardware and health fields.
pub fn build_summary(device: &TeamworkDevice, user: Option<&GraphUser>) -> TeamsDeviceSummary {
    let hardware = device.hardware_detail.clone().unwrap_or_default();
    let current_user = device.current_user.as_ref();

    TeamsDeviceSummary {
        tac_device_id: device.id.clone(),
        device_type: device
            .device_type
            .as_deref()
            .map(|t| device_type_label(t).to_string()),
        manufacturer: hardware.manufacturer,
        model: hardware.model,
        user_display_name: current_user
            .and_then(|u| u.display_name.clone())
            .or_else(|| user.and_then(|u| u.display_name.clone())),
        user_upn: user
            .and_then(|u| u.user_principal_name.clone())
            .unwrap_or_default(),
        serial_number: hardware.serial_number,
        mac_addresses: hardware.mac_addresses.unwrap_or_default(),
        device_health: device.health_status.clone(),
        activity_state: device.activity_state.clone(),
        when_created: device.created_date_time,
        when_changed: device.last_modified_date_time,
        changed_by_user: device
            .last_modified_by
            .as_ref()
            .and_then(|by| by.display_name())
            .map(str::to_string),
    }
}

/// Flattens the summary plus every secondary lookup.
pub fn build_detail(device: &TeamworkDevice, lookups: DeviceLookups) -> TeamsDeviceDetail {
    let mut detail = TeamsDeviceDetail {
        summary: build_summary(device, lookups.user.as_ref()),
        notes: device.notes.clone(),
        company_asset_tag: device.company_asset_tag.clone(),
        ..Default::default()
    };

    if let Some(peripherals) = lookups.activity.and_then(|a| a.active_peripherals) {
        let name = |p: Option<Peripheral>| p.and_then(|p| p.display_name);
        detail.room_camera = name(peripherals.room_camera);
        detail.content_camera = name(peripherals.content_camera);
        detail.speaker = name(peripherals.speaker);
        detail.communication_speaker = name(peripherals.communication_speaker);
        detail.microphone = name(peripherals.microphone);
    }

    if let Some(health) = lookups.health {
        apply_health(&mut detail, health);
    }

    if let Some(configuration) = lookups.configuration {
        apply_configuration(&mut detail, configuration);
    }

    let mut operations = lookups.operations.unwrap_or_default();
    if let Some(last) = latest_operation(&mut operations) {
        detail.last_history_action = last.operation_type.clone().unwrap_or_default();
        detail.last_history_status = last.status.clone().unwrap_or_default();
        detail.last_history_initiated_by = last
            .created_by
            .as_ref()
            .and_then(|by| by.display_name())
            .unwrap_or_default()
            .to_string();
        detail.last_history_modified_date = last
            .sort_key()
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        detail.last_history_errors = last
            .error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default();
    }

    detail
}

fn connection_status(connection: Option<Connection>) -> Option<String> {
    connection.and_then(|c| c.connection_status)
}

fn freshness(status: Option<SoftwareUpdateStatus>) -> Option<String> {
    status.and_then(|s| s.software_freshness)
}

fn apply_health(detail: &mut TeamsDeviceDetail, health: TeamworkDeviceHealth) {
    if let Some(connection) = health.connection {
        detail.connection_last_modified = connection.last_modified_date_time;
        detail.connection_status = connection.connection_status;
    }
    if let Some(login) = health.login_status {
        detail.teams_connection = connection_status(login.teams_connection);
        detail.exchange_connection = connection_status(login.exchange_connection);
        detail.skype_connection = connection_status(login.skype_connection);
    }
    if let Some(hardware) = health.hardware_health {
        detail.compute_health = connection_status(hardware.compute_health.and_then(|h| h.connection));
        detail.hdmi_ingest_health =
            connection_status(hardware.hdmi_ingest_health.and_then(|h| h.connection));
    }
    if let Some(updates) = health.software_update_health {
        detail.admin_agent_freshness = freshness(updates.admin_agent_software_update_status);
        detail.company_portal_freshness = freshness(updates.company_portal_software_update_status);
        detail.firmware_freshness = freshness(updates.firmware_software_update_status);
        detail.operating_system_freshness =
            freshness(updates.operating_system_software_update_status);
        detail.partner_agent_freshness = freshness(updates.partner_agent_software_update_status);
        detail.teams_client_freshness = freshness(updates.teams_client_software_update_status);
    }
}

fn apply_configuration(detail: &mut TeamsDeviceDetail, configuration: TeamworkDeviceConfiguration) {
    detail.configuration_created = configuration.created_date_time;
    detail.configuration_created_by = configuration
        .created_by
        .as_ref()
        .and_then(|by| by.display_name())
        .map(str::to_string);
    detail.configuration_last_modified = configuration.last_modified_date_time;
    detail.configuration_last_modified_by = configuration
        .last_modified_by
        .as_ref()
        .and_then(|by| by.display_name())
        .map(str::to_string);
    detail.camera_configuration = configuration.camera_configuration;
    detail.display_configuration = configuration.display_configuration;
    detail.microphone_configuration = configuration.microphone_configuration;
    detail.speaker_configuration = configuration.speaker_configuration;
    detail.system_configuration = configuration.system_configuration;
    detail.teams_client_configuration = configuration.teams_client_configuration;
    detail.hardware_configuration = configuration.hardware_configuration;

    if let Some(versions) = configuration.software_versions {
        detail.admin_agent_version = versions.admin_agent_software_version;
        detail.operating_system_version = versions.operating_system_software_version;
        detail.teams_client_version = versions.teams_client_software_version;
        detail.firmware_version = versions.firmware_software_version;
        detail.partner_agent_version = versions.partner_agent_software_version;
    }
}

/// Sorts operations newest-first and returns the most recent one.
///
/// Ordering uses `lastActionDateTime`, then `createdDateTime`; undated
/// operations keep their API order after every dated one.
pub fn latest_operation(operations: &mut [TeamworkDeviceOperation]) -> Option<&TeamworkDeviceOperation> {
    operations.sort_by(|a, b| match (a.sort_key(), b.sort_key()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    operations.first()
}
