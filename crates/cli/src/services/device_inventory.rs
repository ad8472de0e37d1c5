//! Teams device inventory orchestrator.
//!
//! One run checks the session scopes, lists devices (or fetches one device)
//! through Graph `$batch`, resolves secondary lookups in bounded batches and
//! joins everything into sorted records. Batches are dispatched strictly one
//! after another.

use std::sync::Arc;

use domain::models::{
    device_list_requests, sort_records, CollectionPage, DeviceFilter, TeamsDeviceRecord,
    TeamworkDevice,
};
use domain::services::{
    build_detail, join_device, single_device_requests, LookupResults, SecondaryLookupQueue,
    DEFAULT_FLUSH_THRESHOLD,
};
use graph::{ensure_scopes, GraphApi, SessionProvider};
use serde_json::Value;
use shared::validation::validate_path_segment;
use tracing::{debug, info, warn};

use crate::config::GraphConfig;
use crate::error::InventoryError;

/// Permissions every inventory run needs.
pub const REQUIRED_SCOPES: [&str; 2] = ["TeamworkDevice.Read.All", "User.Read.All"];

/// What to inventory.
#[derive(Debug, Clone, Default)]
pub struct TeamsDeviceQuery {
    /// Restricts the listing to one device category
    pub filter: Option<DeviceFilter>,
    /// Fetches this single device in detailed shape; takes precedence over `filter`
    pub device_id: Option<String>,
    /// Adds activity, configuration, health and operations to listed devices
    pub detailed: bool,
}

pub struct TeamsDeviceInventory {
    api: Arc<dyn GraphApi>,
    session: Arc<dyn SessionProvider>,
    flush_threshold: usize,
    follow_next_links: bool,
}

impl TeamsDeviceInventory {
    pub fn new(api: Arc<dyn GraphApi>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            api,
            session,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            follow_next_links: true,
        }
    }

    /// Applies the batching and paging settings of `config`.
    pub fn with_config(mut self, config: &GraphConfig) -> Self {
        self.flush_threshold = config.flush_threshold;
        self.follow_next_links = config.follow_next_links;
        self
    }

    /// Runs one inventory query.
    ///
    /// A failed batch dispatch aborts the run; a failed sub-request only
    /// leaves the affected fields empty.
    pub async fn run(&self, query: &TeamsDeviceQuery) -> Result<Vec<TeamsDeviceRecord>, InventoryError> {
        if let Some(device_id) = query.device_id.as_deref() {
            validate_path_segment(device_id).map_err(|e| {
                InventoryError::InvalidQuery(format!("device id {:?}: {}", device_id, e))
            })?;
        }

        ensure_scopes(self.session.as_ref(), &REQUIRED_SCOPES).await?;

        match query.device_id.as_deref() {
            Some(device_id) => {
                if query.filter.is_some() {
                    debug!(device_id = %device_id, "Device id given, ignoring type filter");
                }
                self.fetch_single(device_id).await
            }
            None => self.fetch_list(query).await,
        }
    }

    async fn fetch_single(&self, device_id: &str) -> Result<Vec<TeamsDeviceRecord>, InventoryError> {
        let responses = self
            .api
            .send_batch(&single_device_requests(device_id))
            .await?;

        let mut results = LookupResults::new();
        results.absorb(responses);

        let Some(device) = results.get::<TeamworkDevice>(device_id) else {
            warn!(device_id = %device_id, "Teams device not found");
            return Ok(Vec::new());
        };

        let mut lookups = results.device_lookups(&device);
        lookups.user = match device.current_user_id() {
            Some(user_id) => self.api.get_user(user_id).await?,
            None => None,
        };

        Ok(vec![build_detail(&device, lookups).into()])
    }

    async fn fetch_list(&self, query: &TeamsDeviceQuery) -> Result<Vec<TeamsDeviceRecord>, InventoryError> {
        let devices = self.list_devices(query.filter).await?;
        info!(devices = devices.len(), "Listed Teams devices");

        let mut queue = SecondaryLookupQueue::new(query.detailed, self.flush_threshold);
        let mut results = LookupResults::new();
        let total = devices.len();

        for (index, device) in devices.iter().enumerate() {
            queue.enqueue_device(device);
            if queue.should_flush() {
                self.flush(&mut queue, &mut results).await?;
            }
            debug!(
                percent = (index + 1) * 100 / total,
                processed = index + 1,
                total,
                pending = queue.len(),
                "Queued secondary lookups"
            );
        }
        if !queue.is_empty() {
            self.flush(&mut queue, &mut results).await?;
        }

        debug!(
            users = queue.user_lookups(),
            responses = results.len(),
            "Secondary lookups complete"
        );

        let mut records: Vec<TeamsDeviceRecord> = devices
            .iter()
            .map(|device| join_device(device, &results, query.detailed))
            .collect();
        sort_records(&mut records);
        Ok(records)
    }

    /// Devices of every type query, continuation pages included.
    async fn list_devices(&self, filter: Option<DeviceFilter>) -> Result<Vec<TeamworkDevice>, InventoryError> {
        let responses = self.api.send_batch(&device_list_requests(filter)).await?;

        let mut devices = Vec::new();
        for response in responses {
            if !response.is_ok() {
                warn!(
                    query = %response.id,
                    status = response.status,
                    "Device list query failed"
                );
                continue;
            }

            let Some(page) = parse_page(&response.id, response.body) else {
                continue;
            };
            devices.extend(page.value);

            let mut next_link = page.next_link.filter(|_| self.follow_next_links);
            while let Some(link) = next_link.take() {
                match self.api.get_page(&link).await? {
                    Some(body) => {
                        if let Some(page) = parse_page(&response.id, body) {
                            devices.extend(page.value);
                            next_link = page.next_link;
                        }
                    }
                    None => warn!(query = %response.id, "Device list paging stopped early"),
                }
            }
        }

        Ok(devices)
    }

    async fn flush(
        &self,
        queue: &mut SecondaryLookupQueue,
        results: &mut LookupResults,
    ) -> Result<(), InventoryError> {
        let batch = queue.take_batch();
        let responses = self.api.send_batch(&batch).await?;
        let kept = results.absorb(responses);
        debug!(sub_requests = batch.len(), kept, "Flushed secondary lookups");
        Ok(())
    }
}

fn parse_page(query: &str, body: Value) -> Option<CollectionPage<TeamworkDevice>> {
    match serde_json::from_value(body) {
        Ok(page) => Some(page),
        Err(e) => {
            warn!(query = %query, error = %e, "Malformed device list page");
            None
        }
    }
}
