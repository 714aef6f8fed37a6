use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use sqs_mover::{Progress, Reporter};

/// Draws the drain and dispatch as terminal progress bars.
///
/// Bars are hidden automatically when stderr is not a terminal; the plain
/// status lines are still printed to stdout.
#[derive(Default)]
pub struct BarReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarReporter {
    fn start(&self, len: u64, prefix: &'static str) {
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{prefix} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_prefix(prefix);
        if let Some(previous) = self.replace(Some(pb)) {
            previous.finish_and_clear();
        }
    }

    fn replace(&self, bar: Option<ProgressBar>) -> Option<ProgressBar> {
        match self.bar.lock() {
            Ok(mut guard) => std::mem::replace(&mut *guard, bar),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), bar),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = match self.bar.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(pb) = guard.as_ref() {
            f(pb);
        }
    }

    fn finish(&self) {
        if let Some(pb) = self.replace(None) {
            pb.finish_and_clear();
        }
    }
}

impl Reporter for BarReporter {
    fn report(&self, event: Progress) {
        match event {
            Progress::Estimated { total } => {
                println!("Total count: {}", total);
                self.start(total, "Reading messages..");
            }
            Progress::Received { received, total } => self.with_bar(|pb| {
                // the estimate is approximate, the drain may overshoot it
                pb.set_length(total.max(received));
                pb.set_position(received);
            }),
            Progress::Drained { read } => {
                self.finish();
                println!("Read {} messages from queue", read);
            }
            Progress::Filtered {
                needle,
                matched,
                dropped,
            } => println!(
                "{} of {} messages matched filter {:?} ({} dropped)",
                matched,
                matched + dropped,
                needle,
                dropped
            ),
            Progress::Sending { total } => {
                println!("Sending {} messages", total);
                // no Sent events follow an empty batch
                if total == 0 {
                    self.finish();
                } else {
                    self.start(total as u64, "Messages sent..");
                }
            }
            Progress::Sent { sent, total } => {
                self.with_bar(|pb| pb.set_position(sent as u64));
                if sent >= total {
                    self.finish();
                }
            }
        }
    }
}
