//! Deterministic stub provider for offline and test use.
//!
//! Produces a plausible report without any network access. Scores are
//! derived from a stable hash of the submission id, so repeated runs over
//! the same submission produce identical output.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde_json::{json, Map};

use super::{AdapterError, AnalysisOutput, AnalysisProvider, AnalysisRequest};
use crate::report::{Insights, Scores};

pub struct StubAdapter;

impl StubAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StubAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a hash and a lane index into a score between 5.0 and 9.0.
fn derived_score(seed: u64, lane: u64) -> f64 {
    let mut hasher = DefaultHasher::new();
    (seed, lane).hash(&mut hasher);
    5.0 + (hasher.finish() % 41) as f64 / 10.0
}

impl AnalysisProvider for StubAdapter {
    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutput, AdapterError> {
        let mut hasher = DefaultHasher::new();
        request.submission_id.hash(&mut hasher);
        let seed = hasher.finish();

        let scores = Scores {
            founder_market_fit: derived_score(seed, 0),
            product_differentiation: derived_score(seed, 1),
            go_to_market_strategy: derived_score(seed, 2),
            traction: derived_score(seed, 3),
            financial_health: derived_score(seed, 4),
            team_quality: derived_score(seed, 5),
            market_potential: derived_score(seed, 6),
            risk_adjusted_score: derived_score(seed, 7),
            overall_score: derived_score(seed, 8),
        };

        let company = request.company_name.as_deref().unwrap_or("The startup");
        let insights = Insights {
            summary: format!(
                "{} shows a credible early-stage profile based on {} submitted asset(s). \
                 Generated without external analysis.",
                company,
                request.assets.len()
            ),
            key_differentiators: vec![
                "Founder-led product development".to_string(),
                "Early customer validation".to_string(),
            ],
            flagged_risks: vec!["Limited financial history provided".to_string()],
            investment_readiness: "Needs further diligence".to_string(),
            recommended_next_step: "Schedule a founder call".to_string(),
            confidence_score: 0.3,
        };

        let mut extra = Map::new();
        extra.insert("analysisMode".to_string(), json!("stub"));

        log::debug!(
            "Stub analysis for submission {} (overall {:.1})",
            request.submission_id,
            scores.overall_score
        );

        Ok(AnalysisOutput {
            scores,
            insights,
            extra,
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
