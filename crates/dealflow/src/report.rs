//! Versioned structured evaluation report.
//!
//! The AI service produces loosely structured JSON. Everything the platform
//! depends on is modeled as typed fields; unknown keys are kept in an opaque
//! pass-through bag instead of being dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema version written into every report. Readers branch on this when the
/// shape evolves.
pub const REPORT_SCHEMA_VERSION: &str = "1.1";

/// Named evaluation scores, each bounded to 0–10.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Scores {
    pub founder_market_fit: f64,
    pub product_differentiation: f64,
    pub go_to_market_strategy: f64,
    pub traction: f64,
    pub financial_health: f64,
    pub team_quality: f64,
    pub market_potential: f64,
    pub risk_adjusted_score: f64,
    pub overall_score: f64,
}

impl Scores {
    /// Clamps every score into the 0–10 range the schema promises.
    pub fn clamped(mut self) -> Self {
        for score in [
            &mut self.founder_market_fit,
            &mut self.product_differentiation,
            &mut self.go_to_market_strategy,
            &mut self.traction,
            &mut self.financial_health,
            &mut self.team_quality,
            &mut self.market_potential,
            &mut self.risk_adjusted_score,
            &mut self.overall_score,
        ] {
            *score = score.clamp(0.0, 10.0);
        }
        self
    }
}

impl Default for Scores {
    fn default() -> Self {
        Self {
            founder_market_fit: 5.0,
            product_differentiation: 5.0,
            go_to_market_strategy: 5.0,
            traction: 5.0,
            financial_health: 5.0,
            team_quality: 5.0,
            market_potential: 5.0,
            risk_adjusted_score: 5.0,
            overall_score: 5.0,
        }
    }
}

/// Free-form narrative sections generated by the AI analyst.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub summary: String,
    #[serde(default)]
    pub key_differentiators: Vec<String>,
    #[serde(default)]
    pub flagged_risks: Vec<String>,
    #[serde(default)]
    pub investment_readiness: String,
    #[serde(default)]
    pub recommended_next_step: String,
    #[serde(default)]
    pub confidence_score: f64,
}

/// Persisted evaluation report, written exactly once per completed
/// submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructuredReport {
    pub submission_id: String,
    /// Company name echoed from the submission payload, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub scores: Scores,
    pub insights: Insights,
    pub generated_at: DateTime<Utc>,
    pub version: String,
    /// Adapter-defined fields outside the known set. Preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StructuredReport {
    /// Builds a report from adapter output, stamping the generation time and
    /// the fixed schema version and clamping scores into range.
    pub fn finalize(
        submission_id: &str,
        company_name: Option<&str>,
        scores: Scores,
        insights: Insights,
        extra: Map<String, Value>,
    ) -> Self {
        Self {
            submission_id: submission_id.to_string(),
            company_name: company_name.map(str::to_string),
            scores: scores.clamped(),
            insights,
            generated_at: Utc::now(),
            version: REPORT_SCHEMA_VERSION.to_string(),
            extra,
        }
    }
}
