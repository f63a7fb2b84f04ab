use crate::adapter::{AnalysisAsset, AnalysisOutput};
use crate::queue::Job;
use crate::report::StructuredReport;
use crate::submission::Submission;

pub struct PipelineContext {
    // Input
    pub job: Job,

    // Pickup result — guaranteed Some after step_load
    pub submission: Option<Submission>,

    // Ingestion result
    pub assets: Vec<AnalysisAsset>,

    // Analysis result — guaranteed Some after step_analyze
    pub analysis: Option<AnalysisOutput>,

    // Report generation result — guaranteed Some after step_generate_report
    pub report: Option<StructuredReport>,
}

impl PipelineContext {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            submission: None,
            assets: Vec::new(),
            analysis: None,
            report: None,
        }
    }
}
