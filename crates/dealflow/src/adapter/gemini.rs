//! Gemini-backed analysis provider.
//!
//! Calls the `generateContent` REST endpoint with the founder payload as a
//! text part and every resolved asset inlined as base64. The model is asked
//! for a single JSON object; responses wrapped in markdown fences are
//! unwrapped before parsing.

use std::time::Duration;

use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{AdapterError, AnalysisOutput, AnalysisProvider, AnalysisRequest};
use crate::config::AdapterConfig;
use crate::report::{Insights, Scores};

pub struct GeminiAdapter {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiAdapter {
    pub fn from_config(config: &AdapterConfig, api_key: String) -> Result<Self, AdapterError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AdapterError::Permanent(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn build_parts(&self, request: &AnalysisRequest) -> Result<Vec<Value>, AdapterError> {
        let payload_text = serde_json::to_string_pretty(&request.payload)
            .map_err(|e| AdapterError::InvalidInput(format!("unserializable payload: {e}")))?;

        let mut parts = vec![json!({ "text": build_prompt(request, &payload_text) })];
        for asset in &request.assets {
            parts.push(json!({
                "inline_data": {
                    "mime_type": asset.content_type,
                    "data": base64::engine::general_purpose::STANDARD.encode(&asset.bytes),
                }
            }));
        }
        Ok(parts)
    }
}

impl AnalysisProvider for GeminiAdapter {
    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutput, AdapterError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.endpoint, self.model
        );
        let body = json!({ "contents": [{ "parts": self.build_parts(request)? }] });

        log::info!(
            "Requesting analysis for submission {} ({} assets, model {})",
            request.submission_id,
            request.assets.len(),
            self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            let message = format!("upstream returned {status}: {detail}");
            return if status.as_u16() == 429 || status.is_server_error() {
                Err(AdapterError::Transient(message))
            } else {
                Err(AdapterError::Permanent(message))
            };
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| AdapterError::Permanent(format!("undecodable response body: {e}")))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().find_map(|p| p.text))
            .ok_or_else(|| AdapterError::Permanent("response contained no text".to_string()))?;

        parse_analysis_output(&text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

fn classify_request_error(e: reqwest::Error) -> AdapterError {
    if e.is_timeout() || e.is_connect() {
        AdapterError::Transient(format!("request failed: {e}"))
    } else if e.is_builder() || e.is_request() {
        AdapterError::Permanent(format!("request failed: {e}"))
    } else {
        AdapterError::Transient(format!("request failed: {e}"))
    }
}

fn build_prompt(request: &AnalysisRequest, payload_text: &str) -> String {
    let company = request.company_name.as_deref().unwrap_or("the startup");
    let asset_lines: Vec<String> = request
        .assets
        .iter()
        .map(|a| format!("- {} ({}, {} bytes)", a.declared_name, a.category, a.bytes.len()))
        .collect();

    format!(
        "You are an experienced venture analyst evaluating {company} for early-stage \
investment. The founder-submitted data follows, along with {count} attached files.\n\n\
Submission data:\n{payload}\n\nAttached files:\n{assets}\n\n\
Respond with a single JSON object and nothing else. It must contain:\n\
- \"scores\": an object with numeric fields FounderMarketFit, ProductDifferentiation, \
GoToMarketStrategy, Traction, FinancialHealth, TeamQuality, MarketPotential, \
RiskAdjustedScore and OverallScore, each between 0 and 10\n\
- \"insights\": an object with \"summary\", \"keyDifferentiators\" (array of strings), \
\"flaggedRisks\" (array of strings), \"investmentReadiness\", \"recommendedNextStep\" \
and \"confidenceScore\" (0 to 1)\n\
You may include additional top-level fields with supporting analysis.",
        company = company,
        count = request.assets.len(),
        payload = payload_text,
        assets = asset_lines.join("\n"),
    )
}

/// Pulls the JSON object out of the model's text reply. Accepts a bare
/// object, or one wrapped in a ``` / ```json fence.
fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if let Some(fence_start) = trimmed.find("```") {
        let after = &trimmed[fence_start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        if let Some(fence_end) = after.find("```") {
            let inner = after[..fence_end].trim();
            if inner.starts_with('{') {
                return Some(inner);
            }
        }
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end > start {
        Some(&trimmed[start..=end])
    } else {
        None
    }
}

/// Splits a model reply into typed scores/insights plus the pass-through bag.
fn parse_analysis_output(text: &str) -> Result<AnalysisOutput, AdapterError> {
    let raw = extract_json(text)
        .ok_or_else(|| AdapterError::Permanent("no JSON object in response".to_string()))?;
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| AdapterError::Permanent(format!("unparsable analyst output: {e}")))?;

    let mut object = match value {
        Value::Object(map) => map,
        other => {
            return Err(AdapterError::Permanent(format!(
                "expected JSON object, got {other}"
            )))
        }
    };

    let scores: Scores = object
        .remove("scores")
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| AdapterError::Permanent(format!("malformed scores: {e}")))?
        .ok_or_else(|| AdapterError::Permanent("response missing scores".to_string()))?;

    let insights: Insights = match object.remove("insights") {
        Some(v) => serde_json::from_value(v)
            .map_err(|e| AdapterError::Permanent(format!("malformed insights: {e}")))?,
        None => Insights::default(),
    };

    Ok(AnalysisOutput {
        scores: scores.clamped(),
        insights,
        extra: strip_reserved(object),
    })
}

/// Removes keys the report stamps itself, so the bag cannot shadow them.
fn strip_reserved(mut extra: Map<String, Value>) -> Map<String, Value> {
    for key in ["submissionId", "companyName", "generatedAt", "version"] {
        extra.remove(key);
    }
    extra
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}
