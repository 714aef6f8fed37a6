//! Redelivers an in-memory batch to the destination queue.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use futures::future::join_all;

use crate::{DecodedMessage, Progress, QueueClient, QueueRef, Reporter, TransferError};

#[derive(Debug, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub sent: usize,
    pub rounds: u32,
}

pub struct Dispatcher<'a, C: ?Sized> {
    client: &'a C,
    concurrency: NonZeroUsize,
}

impl<'a, C> Dispatcher<'a, C>
where
    C: QueueClient + ?Sized,
{
    pub fn new(client: &'a C, concurrency: NonZeroUsize) -> Self {
        Self {
            client,
            concurrency,
        }
    }

    /// Sends every message in `messages` to `queue`, one send call per message
    /// and at most `concurrency` calls per round.
    ///
    /// # Errors
    ///
    /// A failed send ends the dispatch once its round has settled; no further
    /// rounds start. Messages already accepted by the destination stay there.
    pub async fn dispatch(
        &self,
        queue: &QueueRef,
        messages: Vec<DecodedMessage>,
        reporter: &dyn Reporter,
    ) -> Result<DispatchOutcome, TransferError> {
        let total = messages.len();
        let mut remaining = VecDeque::from(messages);
        let mut outcome = DispatchOutcome { sent: 0, rounds: 0 };

        log::info!("sending {} messages to {}", total, queue);
        reporter.report(Progress::Sending { total });

        while !remaining.is_empty() {
            let take = remaining.len().min(self.concurrency.get());
            let round: Vec<_> = remaining.drain(..take).collect();

            let accepted = match self.round(queue, &round).await {
                Ok(accepted) => accepted,
                Err((accepted, err)) => {
                    log::error!(
                        "dispatch to {} aborted: {} of {} messages were sent before the failure",
                        queue,
                        outcome.sent + accepted,
                        total
                    );
                    return Err(err);
                }
            };

            outcome.sent += accepted;
            outcome.rounds += 1;
            log::debug!("send round {} delivered {} messages", outcome.rounds, accepted);
            reporter.report(Progress::Sent {
                sent: outcome.sent,
                total,
            });
        }

        Ok(outcome)
    }

    /// Sends one round and returns how many messages were accepted. On failure
    /// the accepted count comes back alongside the first error.
    async fn round(
        &self,
        queue: &QueueRef,
        messages: &[DecodedMessage],
    ) -> Result<usize, (usize, TransferError)> {
        let calls = messages
            .iter()
            .map(|message| self.client.send_one(queue, message.to_payload()));

        let mut accepted = 0;
        let mut first_error = None;
        for result in join_all(calls).await {
            match result {
                Ok(_) => accepted += 1,
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            None => Ok(accepted),
            Some(err) => Err((accepted, err)),
        }
    }
}
