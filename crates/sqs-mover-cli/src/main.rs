mod progress;
mod prompt;

use std::num::{NonZeroU32, NonZeroUsize};
use std::process::ExitCode;

use anyhow::Context;
use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use clap::Parser;
use sqs_mover::{
    discover_queues, LogReporter, QueueRef, Reporter, SqsQueue, Transfer, TransferError,
    TransferOptions, TransferOutcome, MAX_WAIT_TIME_SECS,
};

use crate::progress::BarReporter;
use crate::prompt::{spawn_answer_reader, QueuePrompt};

/// Region used when neither `--region` nor the AWS environment names one.
const FALLBACK_REGION: &str = "eu-west-1";

pub fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start the async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let result = runtime.block_on(cli.run());
    // the stdin reader can still be parked on a blocking read
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[derive(Debug, Parser)]
#[command(name = "sqs-mover")]
#[command(about = "move every message from one AWS SQS queue to another", long_about = None)]
pub struct Cli {
    /// The level of concurrency used to process the messages
    #[arg(short, long, default_value = "10", env = "SQS_MOVER_CONCURRENCY")]
    concurrency: NonZeroUsize,

    /// The text a message needs to contain to be moved
    #[arg(short, long, env = "SQS_MOVER_FILTER")]
    filter: Option<String>,

    /// Source queue url (prompted for when omitted)
    #[arg(long)]
    from: Option<String>,

    /// Destination queue url (prompted for when omitted)
    #[arg(long)]
    to: Option<String>,

    /// AWS region
    #[arg(long)]
    region: Option<String>,

    /// Custom SQS endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Use LocalStack with static test credentials
    #[arg(long, action)]
    local: bool,

    /// Stop draining after this many rounds in a row receive nothing (0 never stops early)
    #[arg(long, default_value = "5")]
    max_empty_rounds: u32,

    /// Seconds each receive call waits for messages to arrive
    #[arg(long, default_value = "0", value_parser = clap::value_parser!(i32).range(0..=MAX_WAIT_TIME_SECS as i64))]
    wait_time: i32,

    /// Log progress instead of drawing progress bars
    #[arg(long, action)]
    no_progress: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.aws_config().await;
        let sqs = SqsQueue::from_config(config).with_wait_time_seconds(self.wait_time);

        let (source, destination) = self.resolve_queues(&sqs).await?;

        let options = TransferOptions {
            concurrency: self.concurrency,
            filter: self.filter.clone(),
            max_empty_rounds: NonZeroU32::new(self.max_empty_rounds),
        };

        let reporter: Box<dyn Reporter> = if self.no_progress {
            Box::new(LogReporter)
        } else {
            Box::new(BarReporter::default())
        };

        let outcome = Transfer::new(&sqs, options)
            .run(&source, &destination, reporter.as_ref())
            .await
            .with_context(|| format!("moving messages from {} to {}", source, destination))?;

        match outcome {
            TransferOutcome::NothingToMove => println!("No messages to move!"),
            TransferOutcome::Completed(summary) => {
                println!(
                    "\nAll messages sent! ({} of {} read messages sent to {})",
                    summary.sent, summary.read, destination
                );
            }
        }

        Ok(())
    }

    async fn aws_config(&self) -> SdkConfig {
        let region = RegionProviderChain::first_try(self.region.clone().map(Region::new))
            .or_default_provider()
            .or_else(Region::from_static(FALLBACK_REGION));

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);

        if self.local {
            loader = loader
                .credentials_provider(aws_sdk_sqs::config::Credentials::new(
                    "test", "test", None, None, "static",
                ))
                .endpoint_url(self.endpoint.as_deref().unwrap_or("http://localhost:4566"));
        } else if let Some(endpoint) = &self.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        loader.load().await
    }

    /// Uses `--from`/`--to` when given and prompts for the rest. Queues are
    /// only listed when a prompt is needed.
    async fn resolve_queues(&self, sqs: &SqsQueue) -> anyhow::Result<(QueueRef, QueueRef)> {
        let (source, destination) = match (&self.from, &self.to) {
            (Some(from), Some(to)) => (QueueRef::new(from), QueueRef::new(to)),
            (from, to) => {
                let queues = discover_queues(sqs).await.context("listing queues")?;

                let (_stdin_reader, answers) = spawn_answer_reader(tokio::io::stdin(), 1);
                let mut prompt = QueuePrompt::new(answers, std::io::stdout());

                match (from, to) {
                    (None, None) => {
                        let (source, destination) = prompt.select(&queues).await?;
                        (source.clone(), destination.clone())
                    }
                    (Some(from), _) => {
                        let destination = prompt
                            .choose("Choose the queue you want to move messages to", &queues)
                            .await?;
                        (QueueRef::new(from), destination.clone())
                    }
                    (None, Some(to)) => {
                        let source = prompt
                            .choose("Choose the queue you want to move messages from", &queues)
                            .await?;
                        (source.clone(), QueueRef::new(to))
                    }
                }
            }
        };

        if source.url == destination.url {
            return Err(TransferError::SameQueue { url: source.url }.into());
        }

        Ok((source, destination))
    }
}
