use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use domain::models::DeviceFilter;
use graph::{ClientCredentials, ClientCredentialsSession, GraphClient, SessionProvider, StaticTokenSession};
use m365_inventory::config::{AuthConfig, Config};
use m365_inventory::logging::init_logging;
use m365_inventory::services::{TeamsDeviceInventory, TeamsDeviceQuery, TenantDomainResolver};
use serde::Serialize;
use tracing::info;

#[derive(Parser)]
#[command(name = "m365-inventory", version, about = "Microsoft 365 tenant domain and Teams device inventory")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every domain registered to the tenant that owns DOMAIN
    Domains { domain: String },
    /// List Teams devices, or show one device in detail
    Devices {
        /// Phone, MTR, Display, SurfaceHub, Panel or SIPPhone
        #[arg(long)]
        filter: Option<DeviceFilter>,
        #[arg(long)]
        device_id: Option<String>,
        /// Include activity, configuration, health and last operation
        #[arg(long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    init_logging(&config.logging);

    info!("Starting m365-inventory v{}", env!("CARGO_PKG_VERSION"));

    match cli.cmd {
        Command::Domains { domain } => {
            let resolver = TenantDomainResolver::new(&config.tenant_metadata)?;
            print_json(&resolver.resolve(&domain).await)
        }
        Command::Devices {
            filter,
            device_id,
            detailed,
        } => {
            config.require_auth()?;

            let session = build_session(&config.auth, config.graph.timeout_secs)?;
            let client = GraphClient::new(config.graph.client_config(), session.clone())?;
            let inventory =
                TeamsDeviceInventory::new(Arc::new(client), session).with_config(&config.graph);

            let records = inventory
                .run(&TeamsDeviceQuery {
                    filter,
                    device_id,
                    detailed,
                })
                .await
                .context("Teams device inventory failed")?;
            print_json(&records)
        }
    }
}

/// A static token wins over the client-credentials grant.
fn build_session(auth: &AuthConfig, timeout_secs: u64) -> Result<Arc<dyn SessionProvider>> {
    if auth.has_access_token() {
        return Ok(Arc::new(StaticTokenSession::new(auth.access_token.clone())));
    }

    let credentials = ClientCredentials {
        authority_url: auth.authority_url.clone(),
        tenant_id: auth.tenant_id.clone(),
        client_id: auth.client_id.clone(),
        client_secret: auth.client_secret.clone(),
    };
    Ok(Arc::new(ClientCredentialsSession::new(
        credentials,
        Duration::from_secs(timeout_secs),
    )?))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
