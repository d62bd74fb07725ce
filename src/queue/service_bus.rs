//! Batch send to a Service Bus queue

use super::sas::{TOKEN_LIFETIME_SECS, sas_token};
use crate::connection_string::ConnectionString;
use crate::error::{ConnectionStringError, QueueError};
use crate::models::QueueMessage;
use chrono::Utc;
use reqwest::Client;
use tracing::debug;

const BATCH_CONTENT_TYPE: &str = "application/vnd.microsoft.servicebus.json";

/// Client for one Service Bus namespace, authorized with a shared access key.
pub struct ServiceBusClient {
    http_client: Client,
    endpoint: String,
    key_name: String,
    key: String,
    entity_path: Option<String>,
}

impl ServiceBusClient {
    /// Parse `Endpoint=sb://…;SharedAccessKeyName=…;SharedAccessKey=…[;EntityPath=…]`.
    pub fn from_connection_string(
        http_client: Client,
        connection_string: &str,
    ) -> Result<Self, QueueError> {
        let cs = ConnectionString::parse(connection_string)?;

        let endpoint = cs.require("Endpoint")?;
        let endpoint = match endpoint.strip_prefix("sb://") {
            Some(host) => format!("https://{}", host),
            None if endpoint.starts_with("http://") || endpoint.starts_with("https://") => {
                endpoint.to_string()
            }
            None => {
                return Err(ConnectionStringError::InvalidValue {
                    key: "Endpoint",
                    reason: format!("unsupported scheme in {}", endpoint),
                }
                .into());
            }
        };

        Ok(Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key_name: cs.require("SharedAccessKeyName")?.to_string(),
            key: cs.require("SharedAccessKey")?.to_string(),
            entity_path: cs.get("EntityPath").map(str::to_string),
        })
    }

    /// Open a sender for `queue`. The sender borrows the client and is released when dropped.
    pub fn queue_sender(&self, queue: &str) -> Result<QueueSender<'_>, QueueError> {
        if let Some(entity_path) = &self.entity_path {
            if entity_path != queue {
                return Err(ConnectionStringError::InvalidValue {
                    key: "EntityPath",
                    reason: format!("{} does not match queue {}", entity_path, queue),
                }
                .into());
            }
        }

        debug!("Opened sender for queue {}", queue);
        Ok(QueueSender {
            client: self,
            queue: queue.to_string(),
        })
    }

    fn queue_uri(&self, queue: &str) -> String {
        format!("{}/{}", self.endpoint, queue)
    }
}

/// Scoped sender for a single queue.
pub struct QueueSender<'a> {
    client: &'a ServiceBusClient,
    queue: String,
}

impl QueueSender<'_> {
    /// Send all messages in one batch request. An empty batch sends nothing.
    ///
    /// Returns the number of messages sent.
    pub async fn send_messages(&self, messages: &[QueueMessage]) -> Result<usize, QueueError> {
        if messages.is_empty() {
            debug!("No messages for queue {}, skipping send", self.queue);
            return Ok(0);
        }

        let uri = self.client.queue_uri(&self.queue);
        let expiry = Utc::now().timestamp() + TOKEN_LIFETIME_SECS;
        let token = sas_token(&uri, &self.client.key_name, &self.client.key, expiry);
        let body = serde_json::to_vec(messages)?;

        debug!("Sending {} messages to {}", messages.len(), uri);

        let response = self
            .client
            .http_client
            .post(format!("{}/messages", uri))
            .header("Authorization", token)
            .header("Content-Type", BATCH_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueueError::SendFailed {
                queue: self.queue.clone(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(messages.len())
    }
}

impl Drop for QueueSender<'_> {
    fn drop(&mut self) {
        debug!("Closed sender for queue {}", self.queue);
    }
}
