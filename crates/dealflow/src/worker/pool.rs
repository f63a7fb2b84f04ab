use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::Utc;
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, error, info, warn};

use crate::broadcast::ProgressBroadcaster;
use crate::config::RetryConfig;
use crate::db::submission_repo;
use crate::pipeline::{
    BroadcastProgress, Pipeline, PipelineContext, PipelineDeps, ProgressEvent, ProgressReporter,
};
use crate::queue::{Dequeued, Job, JobQueue};
use crate::submission::{FailureKind, SubmissionStatus};
use crate::worker::job::JobResult;

/// Fixed-size pool of worker threads, each looping over the shared queue.
///
/// Workers exit when the queue reports closed-and-drained, so a graceful
/// shutdown is: `queue.shutdown()` (via [`WorkerPool::shutdown`]) followed by
/// [`WorkerPool::wait`]. Jobs accepted before shutdown still run to
/// completion.
pub struct WorkerPool {
    queue: Arc<JobQueue>,
    result_receiver: Receiver<JobResult>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `worker_count` threads immediately.
    ///
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn start(
        queue: Arc<JobQueue>,
        deps: PipelineDeps,
        retry: RetryConfig,
        broadcaster: ProgressBroadcaster,
        worker_count: usize,
    ) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let (result_sender, result_receiver) = unbounded::<JobResult>();

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let worker_queue = Arc::clone(&queue);
            let worker_deps = deps.clone();
            let worker_broadcaster = broadcaster.clone();
            let result_tx = result_sender.clone();
            let worker_retry = retry.clone();

            let handle = thread::spawn(move || {
                run_worker(
                    worker_id,
                    worker_queue,
                    worker_deps,
                    worker_retry,
                    worker_broadcaster,
                    result_tx,
                );
            });
            workers.push(handle);
        }

        info!("Started {} workers", worker_count);

        Self {
            queue,
            result_receiver,
            workers,
        }
    }

    /// Non-blocking result poll.
    pub fn try_recv_result(&self) -> Option<JobResult> {
        self.result_receiver.try_recv().ok()
    }

    /// Blocks for the next result. Returns None once all workers are gone.
    pub fn recv_result(&self) -> Option<JobResult> {
        self.result_receiver.recv().ok()
    }

    /// Stops intake. Buffered jobs are still processed.
    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.queue.shutdown();
    }

    /// Joins all worker threads. Call after [`WorkerPool::shutdown`].
    pub fn wait(self) {
        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }
        info!("All workers have stopped");
    }
}

fn run_worker(
    worker_id: usize,
    queue: Arc<JobQueue>,
    deps: PipelineDeps,
    retry: RetryConfig,
    broadcaster: ProgressBroadcaster,
    result_sender: Sender<JobResult>,
) {
    debug!("Worker {} started", worker_id);

    let db = deps.db.clone();
    let pipeline = Pipeline::new(deps);

    loop {
        match queue.dequeue() {
            Dequeued::Job(job) => {
                debug!(
                    "Worker {} processing submission {} (attempt {})",
                    worker_id, job.submission_id, job.attempt
                );

                let progress = BroadcastProgress::new(broadcaster.track(&job.submission_id));
                let ctx = PipelineContext::new(job);
                let (result, ctx) = pipeline.run(ctx, &progress);

                if !result.success {
                    handle_failure(&db, &queue, &retry, &result, &ctx.job, &progress);
                }

                if result_sender.send(result).is_err() {
                    // Nobody is listening anymore; keep draining regardless.
                    debug!("Worker {} result channel closed", worker_id);
                }
            }
            Dequeued::Closed => {
                debug!("Worker {} queue closed", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}

/// Decides between re-enqueueing a transient failure and writing the final
/// failed state.
fn handle_failure(
    db: &crate::db::Database,
    queue: &JobQueue,
    retry: &RetryConfig,
    result: &JobResult,
    job: &Job,
    progress: &dyn ProgressReporter,
) {
    let kind = result.failure_kind.unwrap_or(FailureKind::Permanent);
    let cause = result
        .error
        .clone()
        .unwrap_or_else(|| "unknown failure".to_string());

    if kind.is_transient() && result.attempt < retry.max_retries {
        let next = job.retry();
        let requeued = submission_repo::update_status(
            db,
            &result.submission_id,
            SubmissionStatus::Queued,
            None,
            Utc::now(),
        )
        .is_ok()
            && queue.enqueue(next).is_ok();

        if requeued {
            info!(
                "Retrying submission {} (attempt {} of {}): {}",
                result.submission_id,
                result.attempt + 1,
                retry.max_retries,
                cause
            );
            return;
        }
        warn!(
            "Could not re-enqueue submission {}; recording failure instead",
            result.submission_id
        );
    }

    if let Err(e) = submission_repo::mark_failed(db, &result.submission_id, &cause, kind, Utc::now())
    {
        error!(
            "Failed to record failure for submission {}: {}",
            result.submission_id, e
        );
    }
    progress.report(ProgressEvent::Failed { error: cause });
}
