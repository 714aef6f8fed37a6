//! The queue service seen by the engines, and the values that flow through it.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::TransferError;

/// Most messages a single receive call may return. SQS refuses anything larger.
pub const MAX_BATCH_SIZE: i32 = 10;

/// A queue discovered at startup: its URL and whatever tags it carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueRef {
    pub url: String,
    pub tags: BTreeMap<String, String>,
}

impl QueueRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tags(url: impl Into<String>, tags: BTreeMap<String, String>) -> Self {
        Self {
            url: url.into(),
            tags,
        }
    }

    /// Human readable line used when offering the queue for selection.
    pub fn label(&self) -> String {
        let tags = if self.tags.is_empty() {
            "none".to_string()
        } else {
            serde_json::to_string(&self.tags).unwrap_or_else(|_| "none".to_string())
        };
        format!("url: {}, tags: {}", self.url, tags)
    }
}

impl fmt::Display for QueueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// A message exactly as a receive call handed it over.
///
/// The receipt handle is kept for completeness; the transfer never deletes from
/// the source queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
    /// System attributes (`SentTimestamp`, `ApproximateReceiveCount`, ...)
    pub attributes: BTreeMap<String, String>,
}

impl RawMessage {
    pub fn new(message_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            receipt_handle: String::new(),
            body: body.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Converts an AWS SDK message into a RawMessage.
    ///
    /// Missing fields become empty strings; a missing body is caught later when
    /// the body fails to decode.
    pub fn from_aws_message(message: aws_sdk_sqs::types::Message) -> Self {
        let attributes = message
            .attributes
            .unwrap_or_default()
            .into_iter()
            .map(|(name, value)| (name.as_str().to_string(), value))
            .collect();

        Self {
            message_id: message.message_id.unwrap_or_default(),
            receipt_handle: message.receipt_handle.unwrap_or_default(),
            body: message.body.unwrap_or_default(),
            attributes,
        }
    }
}

/// Acknowledgement for a message accepted by the destination queue.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<String>,
}

/// The primitive operations the transfer needs from a queue service.
///
/// Every call is independent: implementations are shared by reference across
/// the concurrent calls of a round and must not rely on call ordering.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Approximate number of messages currently visible on `queue`.
    async fn estimate_backlog(&self, queue: &QueueRef) -> Result<u64, TransferError>;

    /// Receives up to [`MAX_BATCH_SIZE`] messages, hiding them from other
    /// consumers for `visibility_timeout`. An empty result is legal even while
    /// the backlog is not empty.
    async fn receive_batch(
        &self,
        queue: &QueueRef,
        visibility_timeout: Duration,
    ) -> Result<Vec<RawMessage>, TransferError>;

    /// Sends a single message body to `queue`.
    async fn send_one(&self, queue: &QueueRef, payload: String)
        -> Result<SendReceipt, TransferError>;

    /// URLs of every queue visible to the caller.
    async fn list_queues(&self) -> Result<Vec<String>, TransferError>;

    async fn describe_tags(&self, queue_url: &str)
        -> Result<BTreeMap<String, String>, TransferError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_without_tags() {
        let queue = QueueRef::new("http://localhost:4566/000000000000/orders");
        assert_eq!(
            queue.label(),
            "url: http://localhost:4566/000000000000/orders, tags: none"
        );
    }

    #[test]
    fn label_with_tags_is_sorted_json() {
        let tags = BTreeMap::from([
            ("team".to_string(), "payments".to_string()),
            ("env".to_string(), "prod".to_string()),
        ]);
        let queue = QueueRef::with_tags("http://localhost:4566/000000000000/orders-dlq", tags);
        assert_eq!(
            queue.label(),
            r#"url: http://localhost:4566/000000000000/orders-dlq, tags: {"env":"prod","team":"payments"}"#
        );
    }

    #[test]
    fn from_aws_message_keeps_body_and_attributes() {
        let message = aws_sdk_sqs::types::Message::builder()
            .message_id("m-1")
            .receipt_handle("r-1")
            .body(r#"{"id":1}"#)
            .attributes(
                aws_sdk_sqs::types::MessageSystemAttributeName::ApproximateReceiveCount,
                "2",
            )
            .build();

        let raw = RawMessage::from_aws_message(message);
        assert_eq!(raw.message_id, "m-1");
        assert_eq!(raw.receipt_handle, "r-1");
        assert_eq!(raw.body, r#"{"id":1}"#);
        assert_eq!(
            raw.attributes.get("ApproximateReceiveCount").map(String::as_str),
            Some("2")
        );
    }
}
