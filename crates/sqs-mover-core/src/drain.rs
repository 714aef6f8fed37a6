//! Pulls every currently visible message off a queue.
//!
//! The drain runs in rounds. Each round issues one receive call per
//! concurrency slot, waits for all of them, then folds their messages into the
//! accumulated state. Rounds repeat while fewer messages have been received
//! than the queue's backlog estimate.
//!
//! The estimate is approximate, so the drain may stop a little short on a
//! growing queue or overshoot by up to one round. To avoid spinning on an
//! estimate that will never be reached, the drain also gives up after a number
//! of consecutive rounds that returned nothing at all.

use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;

use futures::future::join_all;

use crate::{
    compute_visibility_timeout, Progress, QueueClient, QueueRef, RawMessage, Reporter,
    TransferError,
};

/// Consecutive empty rounds tolerated before the drain stops early.
pub const DEFAULT_MAX_EMPTY_ROUNDS: u32 = 5;

/// Everything a finished drain produced.
#[derive(Debug)]
pub struct DrainOutcome {
    /// Backlog estimate taken before the first round
    pub estimated: u64,
    pub visibility_timeout: Duration,
    pub messages: Vec<RawMessage>,
    pub rounds: u32,
}

/// Accumulator threaded through the rounds.
#[derive(Debug, Default)]
struct DrainState {
    received: u64,
    messages: Vec<RawMessage>,
    rounds: u32,
    empty_rounds: u32,
}

impl DrainState {
    fn absorb(mut self, batch: Vec<RawMessage>) -> Self {
        self.rounds += 1;
        if batch.is_empty() {
            self.empty_rounds += 1;
        } else {
            self.empty_rounds = 0;
        }
        self.received += batch.len() as u64;
        self.messages.extend(batch);
        self
    }
}

pub struct Drainer<'a, C: ?Sized> {
    client: &'a C,
    concurrency: NonZeroUsize,
    max_empty_rounds: Option<NonZeroU32>,
}

impl<'a, C> Drainer<'a, C>
where
    C: QueueClient + ?Sized,
{
    pub fn new(client: &'a C, concurrency: NonZeroUsize) -> Self {
        Self {
            client,
            concurrency,
            max_empty_rounds: NonZeroU32::new(DEFAULT_MAX_EMPTY_ROUNDS),
        }
    }

    /// `None` keeps draining until the estimate is reached, however many
    /// rounds come back empty.
    pub fn max_empty_rounds(mut self, rounds: Option<NonZeroU32>) -> Self {
        self.max_empty_rounds = rounds;
        self
    }

    /// Drains `queue` and returns every message received.
    ///
    /// # Errors
    ///
    /// The first failing service call aborts the drain. Messages received so
    /// far are dropped and become visible again once their timeout expires.
    pub async fn drain(
        &self,
        queue: &QueueRef,
        reporter: &dyn Reporter,
    ) -> Result<DrainOutcome, TransferError> {
        let estimated = self.client.estimate_backlog(queue).await?;
        let visibility_timeout = compute_visibility_timeout(estimated);
        log::info!(
            "draining {}: ~{} messages, visibility timeout {}s",
            queue,
            estimated,
            visibility_timeout.as_secs()
        );
        reporter.report(Progress::Estimated { total: estimated });

        let mut state = DrainState::default();
        while state.received < estimated {
            let batch = self.round(queue, visibility_timeout).await?;
            log::debug!(
                "receive round {} returned {} messages",
                state.rounds + 1,
                batch.len()
            );
            state = state.absorb(batch);
            reporter.report(Progress::Received {
                received: state.received,
                total: estimated,
            });

            if let Some(limit) = self.max_empty_rounds {
                if state.received < estimated && state.empty_rounds >= limit.get() {
                    log::warn!(
                        "stopping after {} empty rounds with {} of ~{} messages received",
                        state.empty_rounds,
                        state.received,
                        estimated
                    );
                    break;
                }
            }
        }

        Ok(DrainOutcome {
            estimated,
            visibility_timeout,
            messages: state.messages,
            rounds: state.rounds,
        })
    }

    /// One receive call per concurrency slot, all awaited before returning.
    async fn round(
        &self,
        queue: &QueueRef,
        visibility_timeout: Duration,
    ) -> Result<Vec<RawMessage>, TransferError> {
        let calls = (0..self.concurrency.get())
            .map(|_| self.client.receive_batch(queue, visibility_timeout));

        let mut messages = Vec::new();
        for result in join_all(calls).await {
            messages.extend(result?);
        }

        Ok(messages)
    }
}
