//! Interactive choice of source and destination queues.

use std::io::Write;

use anyhow::{bail, Context};
use sqs_mover::{QueueRef, TransferError};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::{self, Receiver};
use tokio::task::JoinHandle;

/// Feeds answers typed on `input` to a [`QueuePrompt`].
///
/// Runs on its own task so a blocking terminal read never stalls the runtime.
/// The task ends with the input, on a read error, or once the prompt is gone.
pub fn spawn_answer_reader<R>(input: R, capacity: usize) -> (JoinHandle<()>, Receiver<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity);

    let handle = tokio::spawn(async move {
        let mut answers = BufReader::new(input).lines();
        while let Some(answer) = answers.next_line().await.transpose() {
            match answer {
                Ok(answer) => {
                    if tx.send(answer).await.is_err() {
                        log::debug!("queue prompt closed, ignoring further input");
                        return;
                    }
                }
                Err(e) => {
                    log::error!("failed to read answer: {e}");
                    return;
                }
            }
        }
        log::trace!("answer input closed");
    });

    (handle, rx)
}

/// Asks the operator to pick queues from a numbered list.
pub struct QueuePrompt<W> {
    lines: Receiver<String>,
    out: W,
}

impl<W: Write> QueuePrompt<W> {
    pub fn new(lines: Receiver<String>, out: W) -> Self {
        Self { lines, out }
    }

    /// Prints the list and reads answers until one names a queue, either by its
    /// 1-based position or by its exact URL.
    pub async fn choose<'q>(
        &mut self,
        question: &str,
        queues: &'q [QueueRef],
    ) -> anyhow::Result<&'q QueueRef> {
        if queues.is_empty() {
            bail!("no queues found");
        }

        writeln!(self.out, "{question}")?;
        for (i, queue) in queues.iter().enumerate() {
            writeln!(self.out, "  {:>3}) {}", i + 1, queue.label())?;
        }

        loop {
            write!(self.out, "> ")?;
            self.out.flush()?;

            let line = self
                .lines
                .recv()
                .await
                .context("no queue selected: input ended")?;

            match parse_choice(line.trim(), queues) {
                Some(queue) => return Ok(queue),
                None => writeln!(
                    self.out,
                    "Invalid choice {:?}, enter a number between 1 and {} or a queue url",
                    line.trim(),
                    queues.len()
                )?,
            }
        }
    }

    /// Asks for the source, then the destination, and refuses the same queue twice.
    pub async fn select<'q>(
        &mut self,
        queues: &'q [QueueRef],
    ) -> anyhow::Result<(&'q QueueRef, &'q QueueRef)> {
        let from = self
            .choose("Choose the queue you want to move messages from", queues)
            .await?;
        let to = self
            .choose("Choose the queue you want to move messages to", queues)
            .await?;

        if from.url == to.url {
            return Err(TransferError::SameQueue {
                url: from.url.clone(),
            }
            .into());
        }

        Ok((from, to))
    }
}

fn parse_choice<'q>(answer: &str, queues: &'q [QueueRef]) -> Option<&'q QueueRef> {
    if let Ok(index) = answer.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| queues.get(i));
    }
    queues.iter().find(|q| q.url == answer)
}
