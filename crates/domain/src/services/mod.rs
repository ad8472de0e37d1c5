//! Domain services for the M365 inventory tools.
//!
//! Services contain the batching and joining logic that operates on domain models.

pub mod device_join;
pub mod lookup_queue;

pub use device_join::{
    build_detail, build_summary, join_device, latest_operation, single_device_requests,
    DeviceLookups, LookupResults,
};
pub use lookup_queue::{
    user_request, SecondaryLookupQueue, DEFAULT_FLUSH_THRESHOLD, MAX_FLUSH_THRESHOLD,
    MAX_LOOKUPS_PER_DEVICE,
};
