//! MCP server for LegAI. Exposes document analysis and document chat
//! via the Model Context Protocol.
//!
//! Tools: analyze_document, chat, get_analysis, get_transcript,
//! export_report, list_languages, list_sessions.

pub mod params;

use params::*;
use crate::backend::ReviewError;
use crate::config::ReviewConfig;
use crate::intake;
use crate::language::{find_language, SUPPORTED_LANGUAGES};
use crate::session::{ReviewSession, SessionError, SessionRegistry};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

const DEFAULT_SESSION: &str = "default";
const DEFAULT_FILE_NAME: &str = "Document";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ok_text(text: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn err_text(msg: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg)]))
}

fn ok_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(text) => ok_text(text),
        Err(e) => Err(McpError::internal_error(e.to_string(), None)),
    }
}

/// Text shown to the client for a session failure; backend details stay in the log.
fn session_error_text(e: &SessionError) -> String {
    match e {
        SessionError::Review(review) => review.user_message().to_string(),
        other => other.to_string(),
    }
}

fn session_name(name: Option<&str>) -> &str {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_SESSION)
}

// ---------------------------------------------------------------------------
// LegaiMcpServer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct LegaiMcpServer {
    registry: Arc<SessionRegistry>,
    default_language: String,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl LegaiMcpServer {
    pub fn new(registry: Arc<SessionRegistry>, default_language: impl Into<String>) -> Self {
        Self {
            registry,
            default_language: default_language.into(),
            tool_router: Self::tool_router(),
        }
    }

    fn existing_session(&self, name: Option<&str>) -> Result<Arc<ReviewSession>, String> {
        let name = session_name(name);
        self.registry
            .get(name)
            .ok_or_else(|| format!("session '{}' has no document yet", name))
    }

    // ── Analysis tools ──────────────────────────────────────────────────

    #[tool(description = "Analyze a contract: risk score, explanation, suggestions and highlighted clauses. Starts a fresh conversation.")]
    async fn analyze_document(
        &self,
        Parameters(p): Parameters<AnalyzeDocumentParams>,
    ) -> Result<CallToolResult, McpError> {
        let language = p.language.unwrap_or_else(|| self.default_language.clone());
        if find_language(&language).is_none() {
            return err_text(format!("unsupported language '{}'", language));
        }

        let (upload_name, document) = match (p.path, p.text) {
            (Some(path), _) => {
                let path = PathBuf::from(path);
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string());
                (name, intake::load_path(&path))
            }
            (None, Some(text)) => {
                let name = p.file_name.unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
                let document = intake::load_bytes(&name, Some("text/plain"), text.as_bytes());
                (name, document)
            }
            (None, None) => return err_text("either 'path' or 'text' is required".to_string()),
        };
        let session_key = session_name(p.session.as_deref());
        let document = match document {
            Ok(doc) => doc,
            Err(e @ ReviewError::UnsupportedFileType(_)) => return err_text(e.user_message().to_string()),
            Err(e) => {
                error!(error = %e, "document intake failed");
                let session = self.registry.get_or_create(session_key);
                if let Err(busy) = session.fail_intake(&upload_name, &e) {
                    return err_text(session_error_text(&busy));
                }
                return err_text(e.user_message().to_string());
            }
        };

        let session = self.registry.get_or_create(session_key);
        match session.submit(&document, &language).await {
            Ok(result) => ok_json(&serde_json::json!({
                "fileName": document.file_name,
                "riskLevel": result.risk_level().label(),
                "analysis": &*result,
                "greeting": session.transcript().first().map(|m| m.text.clone()),
            })),
            Err(e) => err_text(session_error_text(&e)),
        }
    }

    #[tool(description = "Show the current analysis of a session")]
    fn get_analysis(
        &self,
        Parameters(p): Parameters<SessionParams>,
    ) -> Result<CallToolResult, McpError> {
        let session = match self.existing_session(p.session.as_deref()) {
            Ok(s) => s,
            Err(msg) => return err_text(msg),
        };
        match session.analysis() {
            Some(result) => ok_json(&serde_json::json!({
                "fileName": session.file_name(),
                "riskLevel": result.risk_level().label(),
                "analysis": &*result,
            })),
            None => ok_json(&serde_json::json!({
                "fileName": session.file_name(),
                "intake": session.intake_state(),
            })),
        }
    }

    #[tool(description = "Render the plain-text analysis report, optionally writing it to a directory")]
    fn export_report(
        &self,
        Parameters(p): Parameters<ExportReportParams>,
    ) -> Result<CallToolResult, McpError> {
        let session = match self.existing_session(p.session.as_deref()) {
            Ok(s) => s,
            Err(msg) => return err_text(msg),
        };
        let Some((file_name, report)) = session.export_report() else {
            return err_text("no analysis to export".to_string());
        };

        match p.output_dir {
            None => ok_text(report),
            Some(dir) => {
                let path = PathBuf::from(dir).join(&file_name);
                match std::fs::write(&path, report) {
                    Ok(()) => ok_text(format!("wrote {}", path.display())),
                    Err(e) => err_text(format!("cannot write '{}': {}", path.display(), e)),
                }
            }
        }
    }

    // ── Chat tools ──────────────────────────────────────────────────────

    #[tool(description = "Ask a question about the analyzed document")]
    async fn chat(&self, Parameters(p): Parameters<ChatParams>) -> Result<CallToolResult, McpError> {
        let session = match self.existing_session(p.session.as_deref()) {
            Ok(s) => s,
            Err(msg) => return err_text(msg),
        };
        match session.send_message(&p.message).await {
            Ok(turn) => ok_text(turn.reply.text),
            Err(e) => err_text(session_error_text(&e)),
        }
    }

    #[tool(description = "Show the conversation transcript of a session")]
    fn get_transcript(
        &self,
        Parameters(p): Parameters<SessionParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.existing_session(p.session.as_deref()) {
            Ok(session) => ok_json(&session.transcript()),
            Err(msg) => err_text(msg),
        }
    }

    // ── Reference tools ─────────────────────────────────────────────────

    #[tool(description = "List the supported output languages")]
    fn list_languages(&self) -> Result<CallToolResult, McpError> {
        ok_json(&SUPPORTED_LANGUAGES)
    }

    #[tool(description = "List session names")]
    fn list_sessions(&self) -> Result<CallToolResult, McpError> {
        ok_json(&self.registry.names())
    }
}

#[tool_handler]
impl ServerHandler for LegaiMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "LegAI MCP server: contract risk analysis and grounded document chat".into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run_mcp_server(config: ReviewConfig) -> i32 {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    rt.block_on(async {
        let backend = match config.build_backend() {
            Ok(b) => b,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        };
        let registry = Arc::new(SessionRegistry::new(backend, config.request_timeout()));
        let server = LegaiMcpServer::new(registry, config.default_language.clone());

        info!(backend = ?config.backend, "legai mcp server starting on stdio");

        let service = match server.serve(rmcp::transport::stdio()).await {
            Ok(s) => s,
            Err(e) => {
                eprintln!("failed to start MCP server: {}", e);
                return 1;
            }
        };

        if let Err(e) = service.waiting().await {
            eprintln!("MCP server error: {}", e);
            return 1;
        }

        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use std::time::Duration;

    const DOC: &str = "Rent is due monthly. A 30% penalty applies after 5 days.";

    fn server() -> LegaiMcpServer {
        let registry = Arc::new(SessionRegistry::new(
            Arc::new(MockBackend::new()),
            Duration::from_secs(5),
        ));
        LegaiMcpServer::new(registry, "en")
    }

    fn text_of(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(|t| t.text.clone()))
            .collect()
    }

    fn analyze_params(text: Option<&str>, path: Option<&str>) -> Parameters<AnalyzeDocumentParams> {
        Parameters(AnalyzeDocumentParams {
            path: path.map(String::from),
            text: text.map(String::from),
            file_name: Some("lease.txt".to_string()),
            language: None,
            session: None,
        })
    }

    #[tokio::test]
    async fn analyze_then_chat() {
        let server = server();

        let result = server.analyze_document(analyze_params(Some(DOC), None)).await.unwrap();
        assert_ne!(result.is_error, Some(true));
        assert!(text_of(&result).contains("\"riskScore\""));

        let reply = server
            .chat(Parameters(ChatParams {
                message: "what is the penalty?".to_string(),
                session: None,
            }))
            .await
            .unwrap();
        assert!(text_of(&reply).contains("30%"));

        let transcript = server
            .get_transcript(Parameters(SessionParams { session: None }))
            .unwrap();
        let entries: Vec<serde_json::Value> = serde_json::from_str(&text_of(&transcript)).unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[tokio::test]
    async fn unsupported_file_is_rejected_inline() {
        let server = server();
        let result = server
            .analyze_document(analyze_params(None, Some("/tmp/scan.png")))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("Unsupported file type"));
        assert!(server.registry.is_empty());
    }

    #[tokio::test]
    async fn chat_without_document_is_an_error() {
        let server = server();
        let result = server
            .chat(Parameters(ChatParams {
                message: "hello".to_string(),
                session: Some("nobody".to_string()),
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn export_returns_report_text() {
        let server = server();
        server.analyze_document(analyze_params(Some(DOC), None)).await.unwrap();

        let result = server
            .export_report(Parameters(ExportReportParams {
                session: None,
                output_dir: None,
            }))
            .unwrap();
        assert!(text_of(&result).contains("RISK SCORE:"));
    }

    #[tokio::test]
    async fn unreadable_upload_replaces_previous_analysis() {
        let server = server();
        server.analyze_document(analyze_params(Some(DOC), None)).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let docx = dir.path().join("second.docx");
        std::fs::write(&docx, b"PK\x03\x04").unwrap();
        let result = server
            .analyze_document(analyze_params(None, docx.to_str()))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("Failed to analyze the document"));

        let shown = server
            .get_analysis(Parameters(SessionParams { session: None }))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text_of(&shown)).unwrap();
        assert_eq!(value["fileName"], "second.docx");
        assert_eq!(value["intake"]["state"], "failed");
        assert!(value.get("analysis").is_none());

        let transcript = server
            .get_transcript(Parameters(SessionParams { session: None }))
            .unwrap();
        assert_eq!(text_of(&transcript), "[]");
    }

    #[tokio::test]
    async fn inline_text_defaults_to_document_name() {
        let server = server();
        let mut params = analyze_params(Some(DOC), None);
        params.0.file_name = None;
        server.analyze_document(params).await.unwrap();

        let session = server.registry.get("default").unwrap();
        assert_eq!(session.file_name().as_deref(), Some("Document"));
    }

    #[test]
    fn list_languages_includes_english() {
        let result = server().list_languages().unwrap();
        assert!(text_of(&result).contains("\"English\""));
    }
}
