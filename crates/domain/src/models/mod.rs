//! Domain models for the M365 inventory tools.

pub mod batch;
pub mod device_type;
pub mod record;
pub mod teamwork;
pub mod tenant_domain;

pub use batch::{BatchRequest, BatchResponse, LookupKind, MAX_BATCH_REQUESTS};
pub use device_type::{device_list_requests, device_type_label, DeviceFilter};
pub use record::{sort_records, TeamsDeviceDetail, TeamsDeviceRecord, TeamsDeviceSummary};
pub use teamwork::{CollectionPage, GraphUser, TeamworkDevice};
pub use tenant_domain::{extract_domains, DomainRecord, TenantMetadata};
