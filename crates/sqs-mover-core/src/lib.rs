//! # sqs-mover-core
//!
//! Core library for moving messages in bulk between AWS SQS queues.
//!
//! A transfer drains every visible message from a source queue, optionally keeps
//! only the ones containing a filter string, and sends the rest to a destination
//! queue.
//!
//! ## Features
//!
//! - **Drain**: bounded-concurrency receive rounds until the queue's backlog
//!   estimate has been consumed, with a visibility timeout sized to the backlog
//! - **Filter**: literal substring match on the JSON body
//! - **Dispatch**: bounded-concurrency send rounds until the batch is empty
//! - **Discovery**: list queues along with their tags
//!
//! ## Example
//!
//! ```no_run
//! use sqs_mover::{LogReporter, QueueRef, SqsQueue, Transfer, TransferOptions};
//!
//! # async fn example() -> Result<(), sqs_mover::TransferError> {
//! let config = aws_config::from_env().load().await;
//! let sqs = SqsQueue::from_config(config);
//!
//! let source = QueueRef::new("https://sqs.eu-west-1.amazonaws.com/123456789/orders-dlq");
//! let destination = QueueRef::new("https://sqs.eu-west-1.amazonaws.com/123456789/orders");
//!
//! let outcome = Transfer::new(&sqs, TransferOptions::default())
//!     .run(&source, &destination, &LogReporter)
//!     .await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

mod client;
mod discovery;
mod dispatch;
mod drain;
mod error;
mod progress;
mod sqs;
mod timeout;
mod transfer;
mod transform;

#[cfg(test)]
mod test_utils;

pub use client::*;
pub use discovery::discover_queues;
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use drain::{DrainOutcome, Drainer, DEFAULT_MAX_EMPTY_ROUNDS};
pub use error::TransferError;
pub use progress::{LogReporter, Progress, Reporter};
pub use sqs::{SqsQueue, MAX_VISIBILITY_TIMEOUT_SECS, MAX_WAIT_TIME_SECS};
pub use timeout::{compute_visibility_timeout, MIN_VISIBILITY_TIMEOUT_SECS};
pub use transfer::{
    Transfer, TransferOptions, TransferOutcome, TransferSummary, DEFAULT_CONCURRENCY,
};
pub use transform::{
    apply_filter, decode, decode_all, matches_filter, DecodedMessage, FilterOutcome,
};
