//! Microsoft Graph access layer for the M365 inventory tools.
//!
//! This crate contains:
//! - The `GraphApi` trait and its reqwest-backed implementation
//! - The JSON batch envelope
//! - Session providers and the permission scope gate
//! - Request metrics

pub mod client;
pub mod envelope;
pub mod error;
pub mod metrics;
pub mod session;

pub use client::{GraphApi, GraphClient, GraphClientConfig};
pub use error::GraphError;
pub use session::{
    ensure_scopes, missing_scopes, ClientCredentials, ClientCredentialsSession, SessionProvider,
    StaticTokenSession,
};
