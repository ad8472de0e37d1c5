//! Caller-facing services.

pub mod device_inventory;
pub mod tenant_domains;

pub use device_inventory::{TeamsDeviceInventory, TeamsDeviceQuery, REQUIRED_SCOPES};
pub use tenant_domains::{TenantDomainResolver, TenantLookupError};
