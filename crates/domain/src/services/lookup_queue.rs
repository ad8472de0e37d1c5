//! Secondary lookup queue for device inventory batches.
//!
//! For every listed device the orchestrator queues a de-duplicated user
//! profile lookup and, in detailed mode, four per-device lookups. The queue
//! signals a flush once it holds more than the flush threshold so a single
//! dispatched batch never exceeds the Graph sub-request ceiling.

use std::collections::HashSet;

use crate::models::batch::{BatchRequest, LookupKind, MAX_BATCH_REQUESTS};
use crate::models::teamwork::TeamworkDevice;

/// Flush once more than this many lookups are pending.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 15;

/// Most lookups a single device can add: one user plus one per [`LookupKind`].
pub const MAX_LOOKUPS_PER_DEVICE: usize = 1 + LookupKind::ALL.len();

/// Largest flush threshold that keeps every flushed batch within
/// [`MAX_BATCH_REQUESTS`].
pub const MAX_FLUSH_THRESHOLD: usize = MAX_BATCH_REQUESTS - MAX_LOOKUPS_PER_DEVICE;

/// Sub-request resolving a user's profile; the batch id is the user id.
pub fn user_request(user_id: &str) -> BatchRequest {
    BatchRequest::get(user_id, format!("/users/{}", user_id))
}

/// Pending secondary lookups for one inventory run.
#[derive(Debug)]
pub struct SecondaryLookupQueue {
    pending: Vec<BatchRequest>,
    queued_users: HashSet<String>,
    queued_devices: HashSet<String>,
    detailed: bool,
    flush_threshold: usize,
}

impl SecondaryLookupQueue {
    /// Creates an empty queue.
    ///
    /// `flush_threshold` is clamped to `1..=MAX_FLUSH_THRESHOLD`.
    pub fn new(detailed: bool, flush_threshold: usize) -> Self {
        Self {
            pending: Vec::new(),
            queued_users: HashSet::new(),
            queued_devices: HashSet::new(),
            detailed,
            flush_threshold: flush_threshold.clamp(1, MAX_FLUSH_THRESHOLD),
        }
    }

    /// Queues the lookups `device` needs and returns how many were added.
    ///
    /// A user lookup is queued at most once per distinct user id over the
    /// lifetime of the queue, whether or not it has already been flushed.
    pub fn enqueue_device(&mut self, device: &TeamworkDevice) -> usize {
        let before = self.pending.len();

        if let Some(user_id) = device.current_user_id() {
            if self.queued_users.insert(user_id.to_string()) {
                self.pending.push(user_request(user_id));
            }
        }

        if self.detailed && self.queued_devices.insert(device.id.clone()) {
            self.pending
                .extend(LookupKind::ALL.iter().map(|kind| kind.request(&device.id)));
        }

        self.pending.len() - before
    }

    /// Whether the pending lookups should be dispatched now.
    pub fn should_flush(&self) -> bool {
        self.pending.len() > self.flush_threshold
    }

    /// Removes and returns every pending lookup.
    pub fn take_batch(&mut self) -> Vec<BatchRequest> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of distinct users queued so far.
    pub fn user_lookups(&self) -> usize {
        self.queued_users.len()
    }

    pub fn flush_threshold(&self) -> usize {
        self.flush_threshold
    }
}
