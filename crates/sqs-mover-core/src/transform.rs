//! Decoding received bodies and the optional substring filter.

use serde_json::Value;

use crate::{RawMessage, TransferError};

/// A message body parsed as JSON.
///
/// Object keys keep the order they had on the wire and numbers keep their exact
/// text, so re-serialising yields the body the producer wrote (minus
/// insignificant whitespace).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DecodedMessage(pub Value);

impl DecodedMessage {
    /// Compact JSON text sent to the destination queue.
    pub fn to_payload(&self) -> String {
        self.0.to_string()
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for DecodedMessage {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Parses the body of a received message.
///
/// # Errors
///
/// Returns [`TransferError::MalformedPayload`] when the body is not JSON. The
/// transfer does not skip such messages; the whole run stops.
pub fn decode(message: &RawMessage) -> Result<DecodedMessage, TransferError> {
    serde_json::from_str(&message.body)
        .map(DecodedMessage)
        .map_err(|source| TransferError::MalformedPayload {
            message_id: message.message_id.clone(),
            source,
        })
}

/// Decodes a whole drained batch, stopping at the first malformed body.
pub fn decode_all(messages: &[RawMessage]) -> Result<Vec<DecodedMessage>, TransferError> {
    messages.iter().map(decode).collect()
}

/// True when the compact JSON form of `message` contains `needle`.
///
/// Literal, case-sensitive substring match.
pub fn matches_filter(message: &DecodedMessage, needle: &str) -> bool {
    message.to_payload().contains(needle)
}

/// Result of splitting a batch with [`apply_filter`].
#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub kept: Vec<DecodedMessage>,
    pub dropped: usize,
}

/// Keeps the messages matching `needle`; everything else is counted as dropped.
pub fn apply_filter(messages: Vec<DecodedMessage>, needle: &str) -> FilterOutcome {
    let total = messages.len();
    let kept: Vec<_> = messages
        .into_iter()
        .filter(|message| matches_filter(message, needle))
        .collect();
    let dropped = total - kept.len();

    FilterOutcome { kept, dropped }
}
