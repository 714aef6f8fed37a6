use std::fmt;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Everything that can stop a transfer.
///
/// No variant is retried anywhere in the crate: the first failure aborts the
/// stage it happened in and the whole run.
#[derive(Debug)]
pub enum TransferError {
    /// A call to the queue service failed (network, throttling, permissions).
    Service {
        /// The service operation that failed, e.g. `ReceiveMessage`
        operation: &'static str,
        /// Rendered error, including the service's own message when present
        message: String,
        source: BoxError,
    },
    /// A received message body is not a well-formed JSON document.
    MalformedPayload {
        message_id: String,
        source: serde_json::Error,
    },
    /// Source and destination point at the same queue.
    SameQueue { url: String },
}

impl TransferError {
    /// Wraps a failure reported by the queue service.
    pub fn service<E>(operation: &'static str, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let message = aws_sdk_sqs::error::DisplayErrorContext(&err).to_string();
        TransferError::Service {
            operation,
            message,
            source: Box::new(err),
        }
    }

    /// Builds a service error from a plain message, for responses that came back
    /// successfully but were missing data the transfer needs.
    pub fn service_msg(operation: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        TransferError::Service {
            operation,
            source: message.clone().into(),
            message,
        }
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::Service {
                operation, message, ..
            } => write!(f, "{} failed: {}", operation, message),
            TransferError::MalformedPayload { message_id, source } => {
                write!(f, "message {} is not valid JSON: {}", message_id, source)
            }
            TransferError::SameQueue { url } => {
                write!(f, "from and to queues must be different (both are {})", url)
            }
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransferError::Service { source, .. } => Some(source.as_ref()),
            TransferError::MalformedPayload { source, .. } => Some(source),
            TransferError::SameQueue { .. } => None,
        }
    }
}
