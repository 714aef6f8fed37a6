//! [`QueueClient`] backed by AWS SQS.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs as sqs;
use sqs::types::{MessageSystemAttributeName, QueueAttributeName};

use crate::{QueueClient, QueueRef, RawMessage, SendReceipt, TransferError, MAX_BATCH_SIZE};

/// Longest visibility timeout SQS accepts (12 hours).
pub const MAX_VISIBILITY_TIMEOUT_SECS: u64 = 43_200;

/// Longest receive long-poll SQS accepts.
pub const MAX_WAIT_TIME_SECS: i32 = 20;

/// SQS client used by the transfer.
///
/// # Example
///
/// ```no_run
/// use sqs_mover::{discover_queues, SqsQueue};
///
/// # async fn example() -> Result<(), sqs_mover::TransferError> {
/// let config = aws_config::from_env().load().await;
/// let sqs = SqsQueue::from_config(config);
///
/// for queue in discover_queues(&sqs).await? {
///     println!("{}", queue.label());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SqsQueue {
    /// The AWS SDK configuration used for SQS operations
    pub config: SdkConfig,
    /// The SQS client instance
    pub client: sqs::Client,
    wait_time_seconds: i32,
}

impl SqsQueue {
    /// Creates an SqsQueue from a pre-built AWS SDK config.
    ///
    /// The caller decides on credentials, region and endpoint (e.g. LocalStack).
    pub fn from_config(config: SdkConfig) -> Self {
        let client = sqs::Client::new(&config);
        Self {
            config,
            client,
            wait_time_seconds: 0,
        }
    }

    /// Long-poll each receive call for up to `seconds` (0 to 20). The default
    /// of 0 returns immediately, possibly with nothing.
    pub fn with_wait_time_seconds(mut self, seconds: i32) -> Self {
        self.wait_time_seconds = seconds.clamp(0, MAX_WAIT_TIME_SECS);
        self
    }
}

fn visibility_timeout_secs(timeout: Duration) -> i32 {
    let secs = timeout.as_secs();
    if secs > MAX_VISIBILITY_TIMEOUT_SECS {
        log::warn!(
            "visibility timeout of {}s exceeds the SQS maximum, using {}s",
            secs,
            MAX_VISIBILITY_TIMEOUT_SECS
        );
    }
    secs.min(MAX_VISIBILITY_TIMEOUT_SECS) as i32
}

#[async_trait]
impl QueueClient for SqsQueue {
    async fn estimate_backlog(&self, queue: &QueueRef) -> Result<u64, TransferError> {
        const OPERATION: &str = "GetQueueAttributes";

        let output = self
            .client
            .get_queue_attributes()
            .queue_url(&queue.url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await
            .map_err(|e| TransferError::service(OPERATION, e))?;

        let value = output
            .attributes()
            .and_then(|attrs| attrs.get(&QueueAttributeName::ApproximateNumberOfMessages))
            .ok_or_else(|| {
                TransferError::service_msg(
                    OPERATION,
                    format!("{} did not report ApproximateNumberOfMessages", queue),
                )
            })?;

        value.parse().map_err(|e| TransferError::service(OPERATION, e))
    }

    async fn receive_batch(
        &self,
        queue: &QueueRef,
        visibility_timeout: Duration,
    ) -> Result<Vec<RawMessage>, TransferError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&queue.url)
            .max_number_of_messages(MAX_BATCH_SIZE)
            .visibility_timeout(visibility_timeout_secs(visibility_timeout))
            .wait_time_seconds(self.wait_time_seconds)
            .message_system_attribute_names(MessageSystemAttributeName::All)
            .send()
            .await
            .map_err(|e| TransferError::service("ReceiveMessage", e))?;

        Ok(output
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(RawMessage::from_aws_message)
            .collect())
    }

    async fn send_one(
        &self,
        queue: &QueueRef,
        payload: String,
    ) -> Result<SendReceipt, TransferError> {
        let output = self
            .client
            .send_message()
            .queue_url(&queue.url)
            .message_body(payload)
            .delay_seconds(0)
            .send()
            .await
            .map_err(|e| TransferError::service("SendMessage", e))?;

        Ok(SendReceipt {
            message_id: output.message_id,
        })
    }

    /// Handles pagination, returning every queue regardless of count.
    async fn list_queues(&self) -> Result<Vec<String>, TransferError> {
        let mut queues = Vec::new();
        let mut next_token = None;

        loop {
            let output = self
                .client
                .list_queues()
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| TransferError::service("ListQueues", e))?;

            if let Some(mut list) = output.queue_urls {
                queues.append(&mut list);
            }

            let Some(token) = output.next_token else {
                break;
            };
            next_token = Some(token);
        }

        Ok(queues)
    }

    async fn describe_tags(
        &self,
        queue_url: &str,
    ) -> Result<BTreeMap<String, String>, TransferError> {
        let output = self
            .client
            .list_queue_tags()
            .queue_url(queue_url)
            .send()
            .await
            .map_err(|e| TransferError::service("ListQueueTags", e))?;

        Ok(output.tags.unwrap_or_default().into_iter().collect())
    }
}
