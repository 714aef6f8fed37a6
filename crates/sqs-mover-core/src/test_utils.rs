use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::{Progress, QueueClient, QueueRef, RawMessage, Reporter, SendReceipt, TransferError};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn queue(name: &str) -> QueueRef {
    QueueRef::new(format!(
        "http://sqs.us-east-1.localhost.localstack.cloud:4566/000000000000/{name}"
    ))
}

/// In-memory stand-in for SQS.
///
/// Messages are handed out at most [`crate::MAX_BATCH_SIZE`] per receive and
/// never come back. Every call yields once while "in flight" so that calls
/// issued together overlap, which makes the peak concurrency observable.
pub struct MockQueue {
    backlog: Mutex<VecDeque<RawMessage>>,
    estimate: Option<u64>,
    fail_receive_on: Option<usize>,
    fail_send_on: Option<usize>,
    queues: Vec<QueueRef>,
    receive_calls: AtomicUsize,
    send_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    sent: Mutex<Vec<(String, String)>>,
    visibility_timeouts: Mutex<Vec<Duration>>,
}

impl MockQueue {
    pub fn with_bodies<I, S>(bodies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backlog = bodies
            .into_iter()
            .enumerate()
            .map(|(i, body)| RawMessage::new(format!("msg-{i}"), body))
            .collect();

        Self {
            backlog: Mutex::new(backlog),
            estimate: None,
            fail_receive_on: None,
            fail_send_on: None,
            queues: Vec::new(),
            receive_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            visibility_timeouts: Mutex::new(Vec::new()),
        }
    }

    /// `count` messages with bodies `{"id":<n>}`.
    pub fn with_messages(count: usize) -> Self {
        Self::with_bodies((0..count).map(|i| format!(r#"{{"id":{i}}}"#)))
    }

    pub fn empty() -> Self {
        Self::with_bodies(Vec::<String>::new())
    }

    /// Reports `estimate` instead of the real backlog length.
    pub fn estimate(mut self, estimate: u64) -> Self {
        self.estimate = Some(estimate);
        self
    }

    /// The `n`th receive call (1-based) fails.
    pub fn fail_receive_on(mut self, n: usize) -> Self {
        self.fail_receive_on = Some(n);
        self
    }

    /// The `n`th send call (1-based) fails.
    pub fn fail_send_on(mut self, n: usize) -> Self {
        self.fail_send_on = Some(n);
        self
    }

    pub fn with_queues(mut self, queues: Vec<QueueRef>) -> Self {
        self.queues = queues;
        self
    }

    pub fn receive_calls(&self) -> usize {
        self.receive_calls.load(Ordering::SeqCst)
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// `(queue url, payload)` for every accepted send.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn visibility_timeouts(&self) -> Vec<Duration> {
        self.visibility_timeouts.lock().unwrap().clone()
    }

    async fn in_flight(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl QueueClient for MockQueue {
    async fn estimate_backlog(&self, _queue: &QueueRef) -> Result<u64, TransferError> {
        Ok(self
            .estimate
            .unwrap_or_else(|| self.backlog.lock().unwrap().len() as u64))
    }

    async fn receive_batch(
        &self,
        _queue: &QueueRef,
        visibility_timeout: Duration,
    ) -> Result<Vec<RawMessage>, TransferError> {
        let call = self.receive_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.visibility_timeouts
            .lock()
            .unwrap()
            .push(visibility_timeout);
        self.in_flight().await;

        if self.fail_receive_on == Some(call) {
            return Err(TransferError::service(
                "ReceiveMessage",
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
            ));
        }

        let mut backlog = self.backlog.lock().unwrap();
        let take = backlog.len().min(crate::MAX_BATCH_SIZE as usize);
        Ok(backlog.drain(..take).collect())
    }

    async fn send_one(
        &self,
        queue: &QueueRef,
        payload: String,
    ) -> Result<SendReceipt, TransferError> {
        let call = self.send_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.in_flight().await;

        if self.fail_send_on == Some(call) {
            return Err(TransferError::service(
                "SendMessage",
                std::io::Error::new(std::io::ErrorKind::Other, "throttled"),
            ));
        }

        self.sent.lock().unwrap().push((queue.url.clone(), payload));
        Ok(SendReceipt {
            message_id: Some(format!("sent-{call}")),
        })
    }

    async fn list_queues(&self) -> Result<Vec<String>, TransferError> {
        Ok(self.queues.iter().map(|q| q.url.clone()).collect())
    }

    async fn describe_tags(
        &self,
        queue_url: &str,
    ) -> Result<BTreeMap<String, String>, TransferError> {
        self.queues
            .iter()
            .find(|q| q.url == queue_url)
            .map(|q| q.tags.clone())
            .ok_or_else(|| {
                TransferError::service_msg("ListQueueTags", format!("no such queue {queue_url}"))
            })
    }
}

/// Collects every event it is given.
#[derive(Default)]
pub struct Recorder(Mutex<Vec<Progress>>);

impl Recorder {
    pub fn events(&self) -> Vec<Progress> {
        self.0.lock().unwrap().clone()
    }
}

impl Reporter for Recorder {
    fn report(&self, event: Progress) {
        self.0.lock().unwrap().push(event);
    }
}
