//! Sequences one run: drain the source, decode and filter, dispatch.

use std::num::{NonZeroU32, NonZeroUsize};

use crate::drain::DEFAULT_MAX_EMPTY_ROUNDS;
use crate::transform::{apply_filter, decode_all};
use crate::{Dispatcher, Drainer, Progress, QueueClient, QueueRef, Reporter, TransferError};

/// Calls issued per round when nothing else is configured.
pub const DEFAULT_CONCURRENCY: usize = 10;

#[derive(Clone, Debug)]
pub struct TransferOptions {
    /// Upper bound on in-flight service calls, for both receiving and sending
    pub concurrency: NonZeroUsize,
    /// Literal substring a message must contain to be moved
    pub filter: Option<String>,
    /// See [`Drainer::max_empty_rounds`]
    pub max_empty_rounds: Option<NonZeroU32>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            concurrency: NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN),
            filter: None,
            max_empty_rounds: NonZeroU32::new(DEFAULT_MAX_EMPTY_ROUNDS),
        }
    }
}

/// Counts for a completed run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferSummary {
    /// Messages received from the source
    pub read: usize,
    /// Messages that passed the filter (all of them without a filter)
    pub matched: usize,
    /// Messages the filter discarded
    pub dropped: usize,
    /// Messages accepted by the destination
    pub sent: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The source had nothing visible; no send was attempted.
    NothingToMove,
    Completed(TransferSummary),
}

pub struct Transfer<'a, C: ?Sized> {
    client: &'a C,
    options: TransferOptions,
}

impl<'a, C> Transfer<'a, C>
where
    C: QueueClient + ?Sized,
{
    pub fn new(client: &'a C, options: TransferOptions) -> Self {
        Self { client, options }
    }

    /// Moves the visible messages of `source` to `destination`.
    ///
    /// Messages are copied, not moved in the strict sense: nothing is deleted
    /// from the source, which gets its messages back when their visibility
    /// timeout runs out.
    pub async fn run(
        &self,
        source: &QueueRef,
        destination: &QueueRef,
        reporter: &dyn Reporter,
    ) -> Result<TransferOutcome, TransferError> {
        if source.url == destination.url {
            return Err(TransferError::SameQueue {
                url: source.url.clone(),
            });
        }

        let drained = Drainer::new(self.client, self.options.concurrency)
            .max_empty_rounds(self.options.max_empty_rounds)
            .drain(source, reporter)
            .await?;

        let read = drained.messages.len();
        reporter.report(Progress::Drained { read });
        if read == 0 {
            log::info!("{} has no visible messages", source);
            return Ok(TransferOutcome::NothingToMove);
        }

        let decoded = decode_all(&drained.messages)?;

        let (messages, dropped) = match self.options.filter.as_deref() {
            Some(needle) => {
                let outcome = apply_filter(decoded, needle);
                reporter.report(Progress::Filtered {
                    needle: needle.to_string(),
                    matched: outcome.kept.len(),
                    dropped: outcome.dropped,
                });
                (outcome.kept, outcome.dropped)
            }
            None => (decoded, 0),
        };
        let matched = messages.len();

        let dispatched = Dispatcher::new(self.client, self.options.concurrency)
            .dispatch(destination, messages, reporter)
            .await?;

        Ok(TransferOutcome::Completed(TransferSummary {
            read,
            matched,
            dropped,
            sent: dispatched.sent,
        }))
    }
}
