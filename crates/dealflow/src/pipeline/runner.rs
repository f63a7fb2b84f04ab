use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info_span, warn};

use crate::adapter::{AnalysisAsset, AnalysisProvider, AnalysisRequest};
use crate::assets::AssetStore;
use crate::db::{submission_repo, Database};
use crate::report::StructuredReport;
use crate::submission::ProcessingStage;
use crate::worker::job::JobResult;

use super::context::PipelineContext;
use super::error::PipelineError;
use super::progress::{ProgressEvent, ProgressReporter};

/// Shared collaborators every pipeline run needs.
#[derive(Clone)]
pub struct PipelineDeps {
    pub db: Database,
    pub assets: Arc<AssetStore>,
    pub provider: Arc<dyn AnalysisProvider>,
}

pub struct Pipeline {
    db: Database,
    assets: Arc<AssetStore>,
    provider: Arc<dyn AnalysisProvider>,
}

impl Pipeline {
    pub fn new(deps: PipelineDeps) -> Self {
        Self {
            db: deps.db,
            assets: deps.assets,
            provider: deps.provider,
        }
    }

    /// Run the full pipeline for a single submission.
    /// Returns a (JobResult, PipelineContext) pair.
    ///
    /// Failures are returned, not persisted — the worker pool owns the
    /// retry decision and the final failed-state write.
    pub fn run(
        &self,
        mut ctx: PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> (JobResult, PipelineContext) {
        let _pipeline_span = info_span!("pipeline",
            submission_id = %ctx.job.submission_id,
            attempt = ctx.job.attempt,
            provider = self.provider.name(),
        )
        .entered();

        // Pickup: load the submission and claim it.
        {
            let _step = info_span!("pickup").entered();
            match self.step_load(&mut ctx) {
                Ok(true) => {}
                Ok(false) => return (JobResult::skipped(&ctx.job), ctx),
                Err(e) => return self.fail(ctx, e),
            }
        }

        // Step 1: Resolve assets
        {
            let _step = info_span!("ingestion").entered();
            progress.report(ProgressEvent::Stage {
                stage: ProcessingStage::Ingestion,
                message: "Resolving uploaded assets...".to_string(),
            });
            if let Err(e) = self.step_ingest(&mut ctx) {
                return self.fail(ctx, e);
            }
        }

        // Step 2: AI analysis
        {
            let _step = info_span!("ai_analysis").entered();
            progress.report(ProgressEvent::Stage {
                stage: ProcessingStage::AiAnalysis,
                message: "Running AI evaluation...".to_string(),
            });
            if let Err(e) = self.step_analyze(&mut ctx) {
                return self.fail(ctx, e);
            }
        }

        // Step 3: Report generation
        {
            let _step = info_span!("report_generation").entered();
            progress.report(ProgressEvent::Stage {
                stage: ProcessingStage::ReportGeneration,
                message: "Assembling structured report...".to_string(),
            });
            if let Err(e) = self.step_generate_report(&mut ctx) {
                return self.fail(ctx, e);
            }
        }

        // Step 4: Atomic completion
        {
            let _step = info_span!("completion").entered();
            if let Err(e) = self.step_complete(&mut ctx) {
                return self.fail(ctx, e);
            }
        }

        progress.report(ProgressEvent::Completed);
        (JobResult::success(&ctx.job), ctx)
    }

    /// Loads the submission and marks it processing. Returns Ok(false) when
    /// the job should be skipped: the row is gone or already terminal.
    fn step_load(&self, ctx: &mut PipelineContext) -> Result<bool, PipelineError> {
        let submission = match submission_repo::find_by_id(&self.db, &ctx.job.submission_id)? {
            Some(sub) => sub,
            None => {
                warn!(
                    "Submission {} no longer exists; dropping job",
                    ctx.job.submission_id
                );
                return Ok(false);
            }
        };

        if submission.status.is_terminal() {
            debug!(
                "Submission {} already {}; nothing to do",
                submission.id, submission.status
            );
            return Ok(false);
        }

        submission_repo::update_status(
            &self.db,
            &submission.id,
            crate::submission::SubmissionStatus::Processing,
            Some(ProcessingStage::Ingestion),
            Utc::now(),
        )?;

        ctx.submission = Some(submission);
        Ok(true)
    }

    fn step_ingest(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let submission = ctx.submission.as_ref().expect("pickup completed");
        let mut resolved = Vec::with_capacity(submission.assets.len());
        for asset in &submission.assets {
            let bytes = self
                .assets
                .fetch(&asset.storage_key)
                .map_err(PipelineError::AssetResolution)?;
            resolved.push(AnalysisAsset {
                category: asset.category,
                declared_name: asset.declared_name.clone(),
                content_type: asset.content_type.clone(),
                bytes,
            });
        }
        ctx.assets = resolved;
        Ok(())
    }

    fn step_analyze(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let submission = ctx.submission.as_ref().expect("pickup completed");
        submission_repo::update_status(
            &self.db,
            &submission.id,
            crate::submission::SubmissionStatus::Processing,
            Some(ProcessingStage::AiAnalysis),
            Utc::now(),
        )?;

        let request = AnalysisRequest {
            submission_id: submission.id.clone(),
            company_name: submission.company_name().map(str::to_string),
            payload: submission.payload.clone(),
            assets: std::mem::take(&mut ctx.assets),
        };

        let output = self.provider.analyze(&request)?;
        ctx.analysis = Some(output);
        Ok(())
    }

    fn step_generate_report(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let submission = ctx.submission.as_ref().expect("pickup completed");
        submission_repo::update_status(
            &self.db,
            &submission.id,
            crate::submission::SubmissionStatus::Processing,
            Some(ProcessingStage::ReportGeneration),
            Utc::now(),
        )?;

        let analysis = ctx.analysis.take().expect("analysis completed");
        let report = StructuredReport::finalize(
            &submission.id,
            submission.company_name(),
            analysis.scores,
            analysis.insights,
            analysis.extra,
        );
        ctx.report = Some(report);
        Ok(())
    }

    fn step_complete(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let submission = ctx.submission.as_ref().expect("pickup completed");
        let report = ctx.report.as_ref().expect("report generated");

        submission_repo::complete_with_report(&self.db, &submission.id, report, Utc::now())?;

        debug!(
            "Completed submission {} (overall score {:.1})",
            submission.id, report.scores.overall_score
        );
        Ok(())
    }

    /// Failure outcomes are not persisted or broadcast here: the worker
    /// pool decides between a retry and the final failed-state write.
    fn fail(&self, ctx: PipelineContext, error: PipelineError) -> (JobResult, PipelineContext) {
        let message = error.to_string();
        let kind = error.failure_kind();
        warn!(
            "Pipeline failed for submission {} ({}): {}",
            ctx.job.submission_id,
            kind.as_str(),
            message
        );
        (JobResult::failure(&ctx.job, message, kind), ctx)
    }
}
