//! Google AI Studio (Gemini) backend
//!
//! Sends analysis and chat requests to the `generateContent` endpoint.
//! Analysis asks for a JSON object and normalizes whatever comes back:
//! the score is clamped and segments are reconciled against the submitted
//! text, so callers always receive a valid partition.

use super::{
    extract_json, render_context, validate_analysis_input, validate_chat_input, BackendError,
    ReviewBackend, ReviewError,
};
use crate::document::{clamp_score, reconcile_segments, AnalysisResult, HighlightType, HighlightedSegment};
use crate::language::find_language;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

const ANALYSIS_INSTRUCTION: &str = "You are a contract review assistant. Analyze the document the user provides and respond with a single JSON object with these keys:
- \"riskScore\": integer from 0 (no risk) to 10 (extreme risk) for the party receiving the document
- \"riskExplanation\": short paragraph explaining the score
- \"suggestions\": array of concrete negotiation suggestions
- \"highlightedContent\": array of {\"text\", \"type\"} objects covering the WHOLE document in order. Each \"text\" must be copied verbatim from the document, consecutive pieces must not overlap or skip text, and \"type\" is one of RISKY, PAYMENT, DEADLINE, CONFIDENTIALITY, NORMAL.
Do not add any text outside the JSON object.";

const CHAT_INSTRUCTION: &str = "You are a legal document assistant. Answer the user's question using only the document below. Each line is a clause prefixed with its category tag. Quote clauses when useful. If the document does not cover the question, say so.";

/// Connection settings for `GeminiBackend`
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
    pub temperature: f32,
}

impl GeminiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            timeout: Duration::from_secs(60),
            temperature: 0.2,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Instruction<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Instruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Analysis object as the model writes it, before normalization
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    risk_score: f64,
    #[serde(default)]
    risk_explanation: String,
    #[serde(default)]
    suggestions: Vec<String>,
    #[serde(default)]
    highlighted_content: Vec<RawSegment>,
}

#[derive(Debug, Deserialize)]
struct RawSegment {
    #[serde(default)]
    text: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl RawSegment {
    fn into_segment(self) -> HighlightedSegment {
        let kind = self
            .kind
            .as_deref()
            .and_then(|k| k.parse::<HighlightType>().ok())
            .unwrap_or(HighlightType::Normal);
        HighlightedSegment::new(self.text, kind)
    }
}

/// Turn model output into a normalized `AnalysisResult`.
fn parse_analysis(response_text: &str, document_text: &str) -> Result<AnalysisResult, BackendError> {
    let value = extract_json(response_text).ok_or_else(|| {
        BackendError::Parse(format!(
            "no JSON object in model response: {}",
            response_text.chars().take(200).collect::<String>()
        ))
    })?;
    let raw: RawAnalysis =
        serde_json::from_value(value).map_err(|e| BackendError::Parse(e.to_string()))?;

    let proposed: Vec<HighlightedSegment> = raw
        .highlighted_content
        .into_iter()
        .map(RawSegment::into_segment)
        .collect();
    let segments = reconcile_segments(document_text, proposed);
    let suggestions = raw
        .suggestions
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    Ok(AnalysisResult::new(
        clamp_score(raw.risk_score) as i64,
        raw.risk_explanation.trim(),
        suggestions,
        segments,
    ))
}

/// Gemini-backed `ReviewBackend`
pub struct GeminiBackend {
    settings: GeminiSettings,
    client: Client,
}

impl GeminiBackend {
    pub fn new(settings: GeminiSettings) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| BackendError::Unavailable(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &GeminiSettings {
        &self.settings
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn map_reqwest(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.settings.timeout)
        } else if e.is_decode() {
            BackendError::Parse(e.to_string())
        } else {
            BackendError::Http(e.to_string())
        }
    }

    /// One `generateContent` round trip; returns the concatenated text parts.
    async fn generate(
        &self,
        instruction: &str,
        prompt: &str,
        json_output: bool,
    ) -> Result<String, BackendError> {
        let body = GenerateRequest {
            system_instruction: Instruction {
                parts: vec![Part { text: instruction }],
            },
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                response_mime_type: json_output.then_some("application/json"),
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.settings.api_key.trim())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| self.map_reqwest(e))?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(BackendError::Parse("empty response from Gemini".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl ReviewBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn analyze(
        &self,
        document_text: &str,
        output_language: &str,
    ) -> Result<AnalysisResult, ReviewError> {
        validate_analysis_input(document_text, output_language)?;
        let language = find_language(output_language)
            .map(|l| l.name)
            .unwrap_or(output_language);

        let prompt = format!(
            "Write riskExplanation and suggestions in {}. Keep highlightedContent text in the document's original language.\n\nDOCUMENT:\n{}",
            language, document_text
        );
        debug!(model = %self.settings.model, len = document_text.len(), "gemini analysis request");

        let text = self
            .generate(ANALYSIS_INSTRUCTION, &prompt, true)
            .await
            .map_err(|e| {
                warn!(error = %e, "gemini analysis failed");
                e.into_analysis()
            })?;

        parse_analysis(&text, document_text).map_err(|e| {
            warn!(error = %e, "gemini analysis response unusable");
            e.into_analysis()
        })
    }

    async fn chat(
        &self,
        message: &str,
        context: &[HighlightedSegment],
    ) -> Result<String, ReviewError> {
        validate_chat_input(message)?;
        let prompt = format!(
            "DOCUMENT:\n{}\n\nQUESTION:\n{}",
            render_context(context),
            message.trim()
        );
        debug!(model = %self.settings.model, segments = context.len(), "gemini chat request");

        let text = self
            .generate(CHAT_INSTRUCTION, &prompt, false)
            .await
            .map_err(|e| {
                warn!(error = %e, "gemini chat failed");
                e.into_chat()
            })?;
        Ok(text.trim().to_string())
    }
}
