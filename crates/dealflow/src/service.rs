//! Owner-facing submission service.
//!
//! Everything founders do before processing goes through here: creating a
//! submission, attaching and removing uploads, handing the submission to the
//! queue, and deleting it again. The pipeline never calls this module.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::assets::AssetStore;
use crate::db::{submission_repo, Database};
use crate::error::ServiceError;
use crate::queue::{Job, JobQueue};
use crate::submission::{AssetCategory, AssetRef, Submission, SubmissionStatus};

/// Point-in-time view of the processing backlog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub queued: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
    /// Jobs buffered in the in-process queue, not yet claimed by a worker.
    pub buffered: usize,
}

pub struct SubmissionService {
    db: Database,
    assets: Arc<AssetStore>,
    queue: Arc<JobQueue>,
}

impl SubmissionService {
    pub fn new(db: Database, assets: Arc<AssetStore>, queue: Arc<JobQueue>) -> Self {
        Self { db, assets, queue }
    }

    /// Creates a fresh submission for an owner.
    pub fn create_submission(
        &self,
        owner_id: &str,
        payload: serde_json::Value,
    ) -> Result<Submission, ServiceError> {
        let submission = Submission::new(owner_id, payload);
        submission_repo::insert(&self.db, &submission)?;
        log::info!(
            "Created submission {} for owner {}",
            submission.id,
            owner_id
        );
        Ok(submission)
    }

    pub fn get(&self, id: &str) -> Result<Submission, ServiceError> {
        submission_repo::find_by_id(&self.db, id)?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    pub fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Submission>, ServiceError> {
        Ok(submission_repo::list_by_owner(&self.db, owner_id)?)
    }

    /// Validates, stores and attaches one upload. Only allowed while the
    /// submission has not been handed to the queue.
    pub fn attach_asset(
        &self,
        id: &str,
        category: AssetCategory,
        declared_name: &str,
        content: &[u8],
    ) -> Result<AssetRef, ServiceError> {
        let mut submission = self.get(id)?;
        self.require_editable(&submission)?;

        let asset = self.assets.store(category, declared_name, content)?;
        submission.assets.push(asset.clone());
        let patch = submission_repo::SubmissionPatch {
            assets: Some(submission.assets),
            ..Default::default()
        };

        if let Err(e) = submission_repo::update_fields(&self.db, id, &patch, Utc::now()) {
            // Roll the orphaned file back; the reference was never persisted.
            if let Err(cleanup) = self.assets.delete(&asset.storage_key) {
                log::warn!(
                    "Orphaned asset {} left behind after failed attach: {}",
                    asset.storage_key,
                    cleanup
                );
            }
            return Err(e.into());
        }
        Ok(asset)
    }

    /// Detaches and deletes the asset at `index`.
    pub fn remove_asset(&self, id: &str, index: usize) -> Result<(), ServiceError> {
        let mut submission = self.get(id)?;
        self.require_editable(&submission)?;

        if index >= submission.assets.len() {
            return Err(ServiceError::AssetIndexOutOfRange {
                index,
                len: submission.assets.len(),
            });
        }

        let removed = submission.assets.remove(index);
        let patch = submission_repo::SubmissionPatch {
            assets: Some(submission.assets),
            ..Default::default()
        };
        submission_repo::update_fields(&self.db, id, &patch, Utc::now())?;
        self.assets.delete(&removed.storage_key)?;
        Ok(())
    }

    /// Freezes the submission and hands it to the queue.
    ///
    /// The status flips to `queued` before the enqueue; if the queue refuses
    /// the job the flip is rolled back so the owner can try again later.
    pub fn submit_for_processing(&self, id: &str) -> Result<(), ServiceError> {
        let submission = self.get(id)?;
        self.require_editable(&submission)?;

        if submission.assets.is_empty() {
            return Err(ServiceError::NoAssets);
        }

        submission_repo::update_status(
            &self.db,
            id,
            SubmissionStatus::Queued,
            None,
            Utc::now(),
        )?;

        let job = Job::new(id).with_payload(submission.payload);
        if let Err(queue_err) = self.queue.enqueue(job) {
            submission_repo::update_status(
                &self.db,
                id,
                SubmissionStatus::Submitted,
                None,
                Utc::now(),
            )?;
            return Err(queue_err.into());
        }

        log::info!("Submission {} queued for processing", id);
        Ok(())
    }

    /// Deletes a submission and every stored asset it references.
    ///
    /// Allowed in any state, including mid-flight: a worker still holding a
    /// job for this submission treats the vanished record as a no-op, and
    /// its repository writes match zero rows.
    pub fn delete_submission(&self, id: &str) -> Result<(), ServiceError> {
        let submission = self.get(id)?;

        for asset in &submission.assets {
            if let Err(e) = self.assets.delete(&asset.storage_key) {
                log::warn!(
                    "Could not delete asset {} for submission {}: {}",
                    asset.storage_key,
                    id,
                    e
                );
            }
        }
        submission_repo::delete(&self.db, id)?;
        log::info!("Deleted submission {}", id);
        Ok(())
    }

    pub fn queue_stats(&self) -> Result<QueueStats, ServiceError> {
        Ok(QueueStats {
            queued: submission_repo::count_by_status(&self.db, SubmissionStatus::Queued)?,
            processing: submission_repo::count_by_status(&self.db, SubmissionStatus::Processing)?,
            completed: submission_repo::count_by_status(&self.db, SubmissionStatus::Completed)?,
            failed: submission_repo::count_by_status(&self.db, SubmissionStatus::Failed)?,
            buffered: self.queue.len(),
        })
    }

    fn require_editable(&self, submission: &Submission) -> Result<(), ServiceError> {
        if submission.status != SubmissionStatus::Submitted {
            return Err(ServiceError::InvalidState {
                id: submission.id.clone(),
                status: submission.status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn service() -> (TempDir, SubmissionService, Arc<JobQueue>, Arc<AssetStore>) {
        let tmp = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        let assets = Arc::new(AssetStore::new(tmp.path()));
        let queue = Arc::new(JobQueue::new());
        let svc = SubmissionService::new(db, Arc::clone(&assets), Arc::clone(&queue));
        (tmp, svc, queue, assets)
    }

    #[test]
    fn test_create_and_get() {
        let (_tmp, svc, _queue, _assets) = service();
        let sub = svc
            .create_submission("founder-1", json!({"startupName": "Acme"}))
            .unwrap();

        let fetched = svc.get(&sub.id).unwrap();
        assert_eq!(fetched.id, sub.id);
        assert_eq!(fetched.status, SubmissionStatus::Submitted);
    }

    #[test]
    fn test_get_missing() {
        let (_tmp, svc, _queue, _assets) = service();
        assert!(matches!(svc.get("missing"), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_attach_and_remove_asset() {
        let (_tmp, svc, _queue, assets) = service();
        let sub = svc.create_submission("f", json!({})).unwrap();

        let asset = svc
            .attach_asset(&sub.id, AssetCategory::PitchDeck, "deck.pdf", b"bytes")
            .unwrap();
        assert_eq!(svc.get(&sub.id).unwrap().assets.len(), 1);
        assert!(assets.fetch(&asset.storage_key).is_ok());

        svc.remove_asset(&sub.id, 0).unwrap();
        assert!(svc.get(&sub.id).unwrap().assets.is_empty());
        assert!(assets.fetch(&asset.storage_key).is_err());
    }

    #[test]
    fn test_remove_asset_out_of_range() {
        let (_tmp, svc, _queue, _assets) = service();
        let sub = svc.create_submission("f", json!({})).unwrap();
        assert!(matches!(
            svc.remove_asset(&sub.id, 0),
            Err(ServiceError::AssetIndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_submit_requires_assets() {
        let (_tmp, svc, _queue, _assets) = service();
        let sub = svc.create_submission("f", json!({})).unwrap();
        assert!(matches!(
            svc.submit_for_processing(&sub.id),
            Err(ServiceError::NoAssets)
        ));
        assert_eq!(svc.get(&sub.id).unwrap().status, SubmissionStatus::Submitted);
    }

    #[test]
    fn test_submit_enqueues_and_freezes() {
        let (_tmp, svc, queue, _assets) = service();
        let sub = svc.create_submission("f", json!({})).unwrap();
        svc.attach_asset(&sub.id, AssetCategory::PitchDeck, "d.pdf", b"x")
            .unwrap();

        svc.submit_for_processing(&sub.id).unwrap();
        assert_eq!(svc.get(&sub.id).unwrap().status, SubmissionStatus::Queued);
        assert_eq!(queue.len(), 1);

        // Frozen: no more edits, no double submit.
        assert!(matches!(
            svc.attach_asset(&sub.id, AssetCategory::Image, "p.png", b"x"),
            Err(ServiceError::InvalidState { .. })
        ));
        assert!(matches!(
            svc.submit_for_processing(&sub.id),
            Err(ServiceError::InvalidState { .. })
        ));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_submit_rolls_back_when_queue_closed() {
        let (_tmp, svc, queue, _assets) = service();
        let sub = svc.create_submission("f", json!({})).unwrap();
        svc.attach_asset(&sub.id, AssetCategory::PitchDeck, "d.pdf", b"x")
            .unwrap();

        queue.shutdown();
        let err = svc.submit_for_processing(&sub.id).unwrap_err();
        assert!(matches!(err, ServiceError::Queue(_)));

        // Status rolled back so a later submit can succeed.
        assert_eq!(svc.get(&sub.id).unwrap().status, SubmissionStatus::Submitted);
    }

    #[test]
    fn test_delete_cascades_assets() {
        let (_tmp, svc, _queue, assets) = service();
        let sub = svc.create_submission("f", json!({})).unwrap();
        let asset = svc
            .attach_asset(&sub.id, AssetCategory::Document, "n.txt", b"x")
            .unwrap();

        svc.delete_submission(&sub.id).unwrap();
        assert!(matches!(svc.get(&sub.id), Err(ServiceError::NotFound(_))));
        assert!(assets.fetch(&asset.storage_key).is_err());
    }

    #[test]
    fn test_delete_allowed_while_queued() {
        let (_tmp, svc, queue, assets) = service();
        let sub = svc.create_submission("f", json!({})).unwrap();
        let asset = svc
            .attach_asset(&sub.id, AssetCategory::PitchDeck, "d.pdf", b"x")
            .unwrap();
        svc.submit_for_processing(&sub.id).unwrap();

        svc.delete_submission(&sub.id).unwrap();
        assert!(matches!(svc.get(&sub.id), Err(ServiceError::NotFound(_))));
        assert!(assets.fetch(&asset.storage_key).is_err());
        // The orphaned job stays buffered; a worker will skip it.
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_list_by_owner() {
        let (_tmp, svc, _queue, _assets) = service();
        let a = svc.create_submission("owner-a", json!({})).unwrap();
        let b = svc.create_submission("owner-a", json!({})).unwrap();
        svc.create_submission("owner-b", json!({})).unwrap();

        let listed = svc.list_by_owner("owner-a").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, a.id);
        assert_eq!(listed[1].id, b.id);
    }

    #[test]
    fn test_queue_stats() {
        let (_tmp, svc, _queue, _assets) = service();
        let sub = svc.create_submission("f", json!({})).unwrap();
        svc.attach_asset(&sub.id, AssetCategory::PitchDeck, "d.pdf", b"x")
            .unwrap();
        svc.submit_for_processing(&sub.id).unwrap();

        let stats = svc.queue_stats().unwrap();
        assert_eq!(stats.queued, 1);
        assert_eq!(stats.buffered, 1);
        assert_eq!(stats.completed, 0);
    }
}
