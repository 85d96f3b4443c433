//! Analysis/chat backends, the boundary the review session depends on
//!
//! Defines the `ReviewBackend` capability trait and its error taxonomy.
//! Two implementations:
//! - `GeminiBackend`: calls the Gemini `generateContent` API over HTTPS (production)
//! - `MockBackend`: offline heuristics with configurable delays and failures (testing, demos)
//!
//! Backends are stateless from the transcript's point of view: every chat
//! call carries the full highlighted document as grounding context.

mod gemini;
mod json;
mod mock;

pub use gemini::{GeminiBackend, GeminiSettings, DEFAULT_GEMINI_API_BASE, DEFAULT_GEMINI_MODEL};
pub use json::extract_json;
pub use mock::{ChatIntent, MockBackend};

use crate::document::{AnalysisResult, HighlightedSegment};
use crate::language::is_supported;
use async_trait::async_trait;
use std::time::Duration;

/// User-facing text for a failed analysis
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to analyze the document. Please try again.";

/// Assistant reply appended when a chat turn fails
pub const CHAT_FALLBACK_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Inline message for rejected uploads
pub const UNSUPPORTED_FILE_MESSAGE: &str = "Unsupported file type. Please upload PDF, DOCX, or TXT.";

/// Failures visible at the review boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    #[error("analysis failed: {0}")]
    AnalysisFailed(String),
    #[error("chat failed: {0}")]
    ChatFailed(String),
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
}

impl ReviewError {
    /// The generic text a front end shows instead of the raw error.
    pub fn user_message(&self) -> &'static str {
        match self {
            ReviewError::AnalysisFailed(_) => ANALYSIS_FAILED_MESSAGE,
            ReviewError::ChatFailed(_) => CHAT_FALLBACK_MESSAGE,
            ReviewError::UnsupportedFileType(_) => UNSUPPORTED_FILE_MESSAGE,
        }
    }
}

/// Transport-level failures inside a backend.
///
/// Never crosses the trait boundary; mapped to `ReviewError` by the
/// operation that hit it.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend not available: {0}")]
    Unavailable(String),
    #[error("request failed: {0}")]
    Http(String),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response parse error: {0}")]
    Parse(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl BackendError {
    pub fn into_analysis(self) -> ReviewError {
        ReviewError::AnalysisFailed(self.to_string())
    }

    pub fn into_chat(self) -> ReviewError {
        ReviewError::ChatFailed(self.to_string())
    }
}

/// Capability interface for document analysis and grounded chat.
///
/// The presentation layer holds an `Arc<dyn ReviewBackend>` and never a
/// concrete client, so tests can substitute `MockBackend`.
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Analyze a document and produce a fully populated result.
    ///
    /// The returned `highlighted_content` partitions `document_text`.
    async fn analyze(
        &self,
        document_text: &str,
        output_language: &str,
    ) -> Result<AnalysisResult, ReviewError>;

    /// Answer one user message grounded in the highlighted document.
    async fn chat(
        &self,
        message: &str,
        context: &[HighlightedSegment],
    ) -> Result<String, ReviewError>;
}

/// Shared input checks for `ReviewBackend::analyze`.
pub fn validate_analysis_input(document_text: &str, output_language: &str) -> Result<(), ReviewError> {
    if document_text.trim().is_empty() {
        return Err(ReviewError::AnalysisFailed("document text is empty".to_string()));
    }
    if !is_supported(output_language) {
        return Err(ReviewError::AnalysisFailed(format!(
            "unsupported output language: {}",
            output_language
        )));
    }
    Ok(())
}

/// Shared input checks for `ReviewBackend::chat`.
pub fn validate_chat_input(message: &str) -> Result<(), ReviewError> {
    if message.trim().is_empty() {
        return Err(ReviewError::ChatFailed("message is empty".to_string()));
    }
    Ok(())
}

/// Render segments as `[TAG] text` lines for prompts.
pub fn render_context(context: &[HighlightedSegment]) -> String {
    context
        .iter()
        .filter(|s| !s.text.trim().is_empty())
        .map(|s| format!("[{}] {}", s.kind.tag(), s.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::HighlightType;

    #[test]
    fn empty_document_is_rejected() {
        let err = validate_analysis_input("   \n", "en").unwrap_err();
        assert!(matches!(err, ReviewError::AnalysisFailed(_)));
    }

    #[test]
    fn unknown_language_is_rejected() {
        let err = validate_analysis_input("Some text", "klingon").unwrap_err();
        assert!(matches!(err, ReviewError::AnalysisFailed(msg) if msg.contains("klingon")));
    }

    #[test]
    fn blank_message_is_rejected() {
        assert!(validate_chat_input(" \t").is_err());
        assert!(validate_chat_input("hello").is_ok());
    }

    #[test]
    fn user_messages_hide_details() {
        let err = BackendError::Status {
            status: 503,
            body: "overloaded".to_string(),
        }
        .into_analysis();
        assert_eq!(err.user_message(), ANALYSIS_FAILED_MESSAGE);
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn context_renders_tagged_lines() {
        let context = vec![
            HighlightedSegment::new("Pay on time. ", HighlightType::Payment),
            HighlightedSegment::normal("  "),
            HighlightedSegment::new("Keep it secret.", HighlightType::Confidentiality),
        ];
        assert_eq!(
            render_context(&context),
            "[PAYMENT] Pay on time.\n[CONFIDENTIALITY] Keep it secret."
        );
    }
}
