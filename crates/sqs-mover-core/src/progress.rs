//! Progress events emitted while a transfer runs.

/// A step forward in the transfer, emitted after the work it describes is done.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Progress {
    /// The source queue reported roughly `total` messages.
    Estimated { total: u64 },
    /// A receive round finished; `received` is cumulative.
    Received { received: u64, total: u64 },
    /// The drain is over and `read` messages are held in memory.
    Drained { read: usize },
    /// The filter kept `matched` messages and dropped `dropped`.
    Filtered {
        needle: String,
        matched: usize,
        dropped: usize,
    },
    /// Dispatch is starting with `total` messages.
    Sending { total: usize },
    /// A send round finished; `sent` is cumulative.
    Sent { sent: usize, total: usize },
}

/// Receives progress events. Implementations decide how to render them.
pub trait Reporter: Send + Sync {
    fn report(&self, event: Progress);
}

/// Discards every event.
impl Reporter for () {
    fn report(&self, _event: Progress) {}
}

/// Writes every event to the `log` facade at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: Progress) {
        match event {
            Progress::Estimated { total } => log::info!("Total count: {}", total),
            Progress::Received { received, total } => {
                log::info!("Reading messages.. {} / {}", received, total)
            }
            Progress::Drained { read } => log::info!("Read {} messages from queue", read),
            Progress::Filtered {
                needle,
                matched,
                dropped,
            } => log::info!(
                "{} of {} messages matched filter {:?} ({} dropped)",
                matched,
                matched + dropped,
                needle,
                dropped
            ),
            Progress::Sending { total } => log::info!("Sending {} messages", total),
            Progress::Sent { sent, total } => log::info!("Messages sent.. {}/{}", sent, total),
        }
    }
}
