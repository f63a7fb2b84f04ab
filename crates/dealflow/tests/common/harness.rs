//! Test harness for isolated integration tests.
//!
//! `TestHarness` wires a full in-process stack: in-memory database,
//! temp-dir asset store, job queue, broadcaster and the owner-facing
//! service. Worker pools are started per test so each test controls the
//! provider and retry policy.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use dealflow::adapter::AnalysisProvider;
use dealflow::config::RetryConfig;
use dealflow::pipeline::PipelineDeps;
use dealflow::submission::{AssetCategory, Submission, SubmissionStatus};
use dealflow::{
    AssetStore, Database, JobQueue, ProgressBroadcaster, SubmissionService, WorkerPool,
};

pub struct TestHarness {
    temp_dir: TempDir,
    pub db: Database,
    pub assets: Arc<AssetStore>,
    pub queue: Arc<JobQueue>,
    pub broadcaster: ProgressBroadcaster,
    pub service: SubmissionService,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        let assets = Arc::new(AssetStore::new(temp_dir.path().join("uploads")));
        let queue = Arc::new(JobQueue::new());
        let broadcaster = ProgressBroadcaster::default();
        let service = SubmissionService::new(db.clone(), Arc::clone(&assets), Arc::clone(&queue));

        Self {
            temp_dir,
            db,
            assets,
            queue,
            broadcaster,
            service,
        }
    }

    /// Starts a worker pool against this harness's queue and database.
    pub fn start_workers(
        &self,
        provider: Arc<dyn AnalysisProvider>,
        retry: RetryConfig,
        worker_count: usize,
    ) -> WorkerPool {
        WorkerPool::start(
            Arc::clone(&self.queue),
            PipelineDeps {
                db: self.db.clone(),
                assets: Arc::clone(&self.assets),
                provider,
            },
            retry,
            self.broadcaster.clone(),
            worker_count,
        )
    }

    /// Creates a submission with one pitch deck attached, ready to submit.
    pub fn draft_submission(&self, company: &str) -> Submission {
        let sub = self
            .service
            .create_submission("founder-1", serde_json::json!({ "startupName": company }))
            .expect("Failed to create submission");
        self.service
            .attach_asset(&sub.id, AssetCategory::PitchDeck, "deck.pdf", b"deck bytes")
            .expect("Failed to attach asset");
        self.service.get(&sub.id).expect("Failed to reload")
    }

    /// Creates, attaches and queues a submission in one step.
    pub fn queued_submission(&self, company: &str) -> Submission {
        let sub = self.draft_submission(company);
        self.service
            .submit_for_processing(&sub.id)
            .expect("Failed to submit");
        self.service.get(&sub.id).expect("Failed to reload")
    }

    /// Polls until the submission reaches a terminal status.
    pub fn wait_for_terminal(&self, id: &str, timeout: Duration) -> Submission {
        let deadline = Instant::now() + timeout;
        loop {
            let sub = self.service.get(id).expect("Failed to fetch submission");
            if sub.status.is_terminal() {
                return sub;
            }
            assert!(
                Instant::now() < deadline,
                "Submission {} still {} after {:?}",
                id,
                sub.status,
                timeout
            );
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    pub fn assert_completed(&self, id: &str) -> Submission {
        let sub = self.wait_for_terminal(id, Duration::from_secs(5));
        assert_eq!(
            sub.status,
            SubmissionStatus::Completed,
            "expected completion, got failure: {:?}",
            sub.failure_cause
        );
        sub
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
