//! MCP tool parameter structs with schemars-derived JSON schemas.

use schemars::JsonSchema;
use serde::Deserialize;

// ── Analysis params ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AnalyzeDocumentParams {
    #[schemars(description = "Path to a PDF, DOCX or TXT file to analyze")]
    pub path: Option<String>,
    #[schemars(description = "Document text to analyze (used when no path is given)")]
    pub text: Option<String>,
    #[schemars(description = "Display name for inline text (default: 'Document')")]
    pub file_name: Option<String>,
    #[schemars(description = "Output language code, e.g. 'en' or 'hi'")]
    pub language: Option<String>,
    #[schemars(description = "Session name (default: 'default')")]
    pub session: Option<String>,
}

// ── Chat params ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ChatParams {
    #[schemars(description = "Question about the analyzed document")]
    pub message: String,
    #[schemars(description = "Session name (default: 'default')")]
    pub session: Option<String>,
}

// ── Session params ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SessionParams {
    #[schemars(description = "Session name (default: 'default')")]
    pub session: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExportReportParams {
    #[schemars(description = "Session name (default: 'default')")]
    pub session: Option<String>,
    #[schemars(description = "Directory to write the report into; the report text is returned when omitted")]
    pub output_dir: Option<String>,
}
