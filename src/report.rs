//! The weekly report workflow
//!
//! One run is a fixed chain of stages:
//! - Authenticate: one token for the management API, one for Graph
//! - Clean directory: empty the guest review group
//! - Collect subscriptions: list, drop the denylist, build queue messages
//! - Publish queue: send all messages in one batch
//! - Initialize report: recreate the report blob and write the CSV header
//!
//! Authentication and subscription collection failures end the run. Every
//! other failure is logged and recorded in the [`RunSummary`].

use std::fmt;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, DirectoryApi, ManagementApi};
use crate::auth::{BearerToken, ClientCredentialsAuthenticator, TokenAudience};
use crate::config::{Credentials, Settings};
use crate::error::{BlobError, QueueError, StageError};
use crate::models::{QueueMessage, SubscriptionFilter};
use crate::queue::ServiceBusClient;
use crate::storage::{BlobClient, StorageAccount};

/// First line of the report blob.
pub const REPORT_HEADER: &str = "SubscriptionName,ManagedModel,Department,Application,ProjectCode,ProjectManager,UPN,DisplayName,RoleDefinitionName,Status\n";

/// A step of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Authenticate,
    CleanDirectory,
    CollectSubscriptions,
    PublishQueue,
    InitializeReport,
}

impl Stage {
    /// Fatal stages abort the run; the rest are logged and skipped.
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Authenticate | Self::CollectSubscriptions)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Authenticate => "authentication",
            Self::CleanDirectory => "directory cleanup",
            Self::CollectSubscriptions => "subscription collection",
            Self::PublishQueue => "queue publish",
            Self::InitializeReport => "report initialization",
        };
        f.write_str(name)
    }
}

/// Outcome of a run that was not aborted.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub members_removed: usize,
    pub member_failures: usize,
    pub messages_published: usize,
    pub report_initialized: bool,
    /// Non-fatal stage failures, in the order they happened.
    pub failures: Vec<StageError>,
}

impl RunSummary {
    /// Keep a non-fatal failure, or hand a fatal one back to the caller.
    fn record(&mut self, error: StageError) -> Result<(), StageError> {
        if error.is_fatal() {
            return Err(error);
        }
        warn!("{}", error);
        self.failures.push(error);
        Ok(())
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.member_failures == 0
    }
}

/// Result of emptying the review group.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub removed: usize,
    pub failed: usize,
}

/// One configured run of the report workflow.
pub struct ReportJob {
    http_client: Client,
    settings: Settings,
    credentials: Credentials,
}

impl ReportJob {
    pub fn new(http_client: Client, settings: Settings, credentials: Credentials) -> Self {
        let settings = Settings {
            endpoints: settings.endpoints.normalized(),
            ..settings
        };
        Self {
            http_client,
            settings,
            credentials,
        }
    }

    /// Run every stage in order.
    pub async fn run(&self) -> Result<RunSummary, StageError> {
        info!("Generating weekly Azure RBAC report");
        let mut summary = RunSummary::default();

        let (management_token, graph_token) = self.authenticate().await?;
        info!("Completed acquiring API tokens");

        match self.clean_directory(graph_token).await {
            Ok(outcome) => {
                summary.members_removed = outcome.removed;
                summary.member_failures = outcome.failed;
                info!(
                    "Completed directory cleanup: {} removed, {} failed",
                    outcome.removed, outcome.failed
                );
            }
            Err(e) => summary.record(e)?,
        }

        let messages = match self.collect_subscriptions(management_token).await {
            Ok(messages) => {
                info!("Completed getting subscriptions: {} retained", messages.len());
                messages
            }
            Err(e) => {
                summary.record(e)?;
                Vec::new()
            }
        };

        match self.publish(&messages).await {
            Ok(sent) => {
                summary.messages_published = sent;
                info!("Completed sending {} queue messages", sent);
            }
            Err(e) => summary.record(e)?,
        }

        match self.initialize_report().await {
            Ok(()) => {
                summary.report_initialized = true;
                info!("Completed creating report blob");
            }
            Err(e) => summary.record(e)?,
        }

        Ok(summary)
    }

    /// Acquire the management and Graph tokens, in that order.
    pub async fn authenticate(&self) -> Result<(BearerToken, BearerToken), StageError> {
        let authenticator = ClientCredentialsAuthenticator::new(
            self.http_client.clone(),
            &self.settings.endpoints.authority,
            &self.credentials.tenant_id,
        );

        let management = authenticator
            .acquire(TokenAudience::Management, &self.credentials.management)
            .await
            .map_err(|e| StageError::new(Stage::Authenticate, e))?;
        let graph = authenticator
            .acquire(TokenAudience::Graph, &self.credentials.graph)
            .await
            .map_err(|e| StageError::new(Stage::Authenticate, e))?;

        Ok((management, graph))
    }

    /// Remove every member of the review group.
    ///
    /// A failed listing fails the stage; a failed removal is counted and the
    /// remaining members are still processed.
    pub async fn clean_directory(&self, token: BearerToken) -> Result<CleanupOutcome, StageError> {
        let api = DirectoryApi::new(ApiClient::new(
            self.http_client.clone(),
            &self.settings.endpoints.graph,
            token,
        ));
        let group_id = &self.settings.group_id;

        let members = api
            .list_group_members(group_id)
            .await
            .map_err(|e| StageError::new(Stage::CleanDirectory, e))?;

        let mut outcome = CleanupOutcome::default();
        for member in &members {
            info!("Removing {} from group {}", member.label(), group_id);
            match api.remove_group_member(group_id, &member.id).await {
                Ok(status) => {
                    info!("Removed {} (HTTP {})", member.label(), status);
                    outcome.removed += 1;
                }
                Err(e) => {
                    warn!("Failed to remove {}: {}", member.label(), e);
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }

    /// List subscriptions and turn the retained ones into queue messages.
    pub async fn collect_subscriptions(
        &self,
        token: BearerToken,
    ) -> Result<Vec<QueueMessage>, StageError> {
        let api = ManagementApi::new(
            ApiClient::new(
                self.http_client.clone(),
                &self.settings.endpoints.management,
                token,
            ),
            &self.settings.subscriptions_api_version,
        );

        let subscriptions = api
            .list_subscriptions()
            .await
            .map_err(|e| StageError::new(Stage::CollectSubscriptions, e))?;

        let filter = SubscriptionFilter::new(self.settings.excluded_subscriptions.iter().cloned());
        let retained = filter.apply(subscriptions);
        for subscription in &retained {
            debug!(
                "Queueing {} ({})",
                subscription.display_name,
                subscription.state.as_deref().unwrap_or("state unknown")
            );
        }

        Ok(retained.iter().map(QueueMessage::from).collect())
    }

    /// Send all messages to the configured queue in one batch.
    pub async fn publish(&self, messages: &[QueueMessage]) -> Result<usize, StageError> {
        let fail = |e: QueueError| StageError::new(Stage::PublishQueue, e);

        let client = ServiceBusClient::from_connection_string(
            self.http_client.clone(),
            &self.credentials.service_bus_connection_string,
        )
        .map_err(fail)?;

        let sender = client
            .queue_sender(&self.credentials.service_bus_queue)
            .map_err(fail)?;
        sender.send_messages(messages).await.map_err(fail)
    }

    /// Recreate the report blob and write the header row.
    pub async fn initialize_report(&self) -> Result<(), StageError> {
        let fail = |e: BlobError| StageError::new(Stage::InitializeReport, e);

        let account = StorageAccount::from_connection_string(
            &self.credentials.storage_connection_string,
        )
        .map_err(|e| fail(e.into()))?;

        let blob = BlobClient::new(
            self.http_client.clone(),
            account,
            &self.settings.report_container,
            &self.settings.report_blob,
        )
        .map_err(fail)?;

        blob.create_append_blob().await.map_err(fail)?;
        blob.append_block(REPORT_HEADER).await.map_err(fail)
    }
}
