//! In-process job queue feeding the worker pool.
//!
//! FIFO, unbounded, backed by a crossbeam channel. Shutdown is one-way:
//! enqueue is refused immediately, while jobs accepted before shutdown stay
//! in the buffer and are still handed to workers. Queue contents do not
//! survive a process restart; pending work must be re-enqueued on startup.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender};

use crate::error::QueueError;

/// One unit of work: a pointer to a submission awaiting processing.
#[derive(Debug, Clone)]
pub struct Job {
    pub submission_id: String,
    /// 0 on first enqueue, incremented on each configured retry.
    pub attempt: u32,
    pub enqueued_at: DateTime<Utc>,
    /// Payload as it looked at enqueue time, for logs and diagnostics.
    /// The pipeline always re-reads the record; this is best effort only.
    pub payload_snapshot: Option<serde_json::Value>,
}

impl Job {
    pub fn new(submission_id: &str) -> Self {
        Self {
            submission_id: submission_id.to_string(),
            attempt: 0,
            enqueued_at: Utc::now(),
            payload_snapshot: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload_snapshot = Some(payload);
        self
    }

    /// The same job, one attempt later.
    pub fn retry(&self) -> Self {
        Self {
            submission_id: self.submission_id.clone(),
            attempt: self.attempt + 1,
            enqueued_at: Utc::now(),
            payload_snapshot: self.payload_snapshot.clone(),
        }
    }
}

/// Result of a blocking dequeue.
#[derive(Debug)]
pub enum Dequeued {
    Job(Job),
    /// The queue is shut down and drained; the worker should exit.
    Closed,
}

/// Thread-safe FIFO job queue.
///
/// The sender lives behind a `Mutex<Option<_>>` so shutdown can drop it:
/// once every sender is gone, blocked receivers drain the buffer and then
/// observe disconnection.
pub struct JobQueue {
    sender: Mutex<Option<Sender<Job>>>,
    receiver: Receiver<Job>,
    closed: AtomicBool,
}

impl JobQueue {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
            closed: AtomicBool::new(false),
        }
    }

    /// Appends a job. Fails with [`QueueError::Closed`] after shutdown.
    pub fn enqueue(&self, job: Job) -> Result<(), QueueError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(QueueError::Closed);
        }
        let guard = match self.sender.lock() {
            Ok(g) => g,
            Err(_) => return Err(QueueError::Closed),
        };
        match guard.as_ref() {
            Some(sender) => {
                log::debug!(
                    "Enqueued job for submission {} (attempt {})",
                    job.submission_id,
                    job.attempt
                );
                // Send on an unbounded channel only fails when disconnected.
                sender.send(job).map_err(|_| QueueError::Closed)
            }
            None => Err(QueueError::Closed),
        }
    }

    /// Blocks until a job is available or the queue is closed and drained.
    pub fn dequeue(&self) -> Dequeued {
        match self.receiver.recv() {
            Ok(job) => Dequeued::Job(job),
            Err(_) => Dequeued::Closed,
        }
    }

    /// Number of jobs currently buffered.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Shuts the queue down: new enqueues are refused, buffered jobs remain
    /// dequeuable until drained. Idempotent.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Ok(mut guard) = self.sender.lock() {
            guard.take();
        }
        log::info!("Job queue shut down ({} jobs still buffered)", self.len());
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
