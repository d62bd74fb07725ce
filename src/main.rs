//! azurerbac - weekly Azure RBAC report job
//!
//! Each run:
//! - Empties the guest RBAC review group in the directory
//! - Lists subscriptions and queues `name,id` messages for the report workers
//! - Recreates the report blob with its CSV header
//!
//! Scheduling is external; one invocation is one run.

mod api;
mod auth;
mod config;
mod connection_string;
mod error;
mod models;
mod queue;
mod report;
mod storage;

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::auth::ClientCredentials;
use crate::config::{Credentials, Settings};
use crate::report::ReportJob;

/// azurerbac - Azure RBAC report job
#[derive(Parser)]
#[command(name = "azurerbac")]
#[command(about = "Clean the guest review group, queue subscriptions and initialize the RBAC report")]
#[command(version)]
struct Args {
    /// Settings file (defaults to <config dir>/azurerbac/config.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory (tenant) id
    #[arg(long, env = "TENANT_ID")]
    tenant_id: String,

    /// Client id used for the management API
    #[arg(long, env = "REST_CLIENT_ID")]
    rest_client_id: String,

    /// Client secret used for the management API
    #[arg(long, env = "REST_CLIENT_SECRET", hide_env_values = true)]
    rest_client_secret: String,

    /// Client id used for Microsoft Graph
    #[arg(long, env = "GRAPH_CLIENT_ID")]
    graph_client_id: String,

    /// Client secret used for Microsoft Graph
    #[arg(long, env = "GRAPH_CLIENT_SECRET", hide_env_values = true)]
    graph_client_secret: String,

    /// Service Bus namespace connection string
    #[arg(long, env = "SERVICE_BUS_CONNECTION_STR", hide_env_values = true)]
    service_bus_connection_string: String,

    /// Queue receiving one message per subscription
    #[arg(long, env = "SERVICE_BUS_QUEUE_NAME")]
    service_bus_queue: String,

    /// Storage account connection string for the report blob
    #[arg(long, env = "AZURERBAC_STORAGE_ACCOUNT_CONNECTION_STRING", hide_env_values = true)]
    storage_connection_string: String,
}

impl Args {
    fn credentials(&self) -> Credentials {
        Credentials {
            tenant_id: self.tenant_id.clone(),
            management: ClientCredentials::new(&self.rest_client_id, &self.rest_client_secret),
            graph: ClientCredentials::new(&self.graph_client_id, &self.graph_client_secret),
            service_bus_connection_string: self.service_bus_connection_string.clone(),
            service_bus_queue: self.service_bus_queue.clone(),
            storage_connection_string: self.storage_connection_string.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (set RUST_LOG=debug for request-level detail)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    let http_client = api::build_http_client().context("Failed to create HTTP client")?;

    let job = ReportJob::new(http_client, settings, args.credentials());
    let summary = job.run().await.context("Report run aborted")?;

    if summary.is_clean() {
        info!(
            "Run complete: {} members removed, {} messages queued",
            summary.members_removed, summary.messages_published
        );
    } else {
        warn!(
            "Run complete with errors: {} members removed ({} failed), {} messages queued, {} stage failures",
            summary.members_removed,
            summary.member_failures,
            summary.messages_published,
            summary.failures.len()
        );
    }

    Ok(())
}
