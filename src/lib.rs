//! LegAI: Contract Review Assistant
//!
//! Analyzes contract-like documents for risk and lets the user ask
//! questions about the result.
//!
//! # Core Concepts
//!
//! - **Backends**: `ReviewBackend` implementations that analyze a document and
//!   answer questions grounded in it (`GeminiBackend`, `MockBackend`)
//! - **Segments**: the document split into typed highlight spans that always
//!   concatenate back to the original text
//! - **Sessions**: `ReviewSession` holds one user's analysis and transcript and
//!   enforces one pending request at a time
//!
//! # Example
//!
//! ```
//! use legai::{MockBackend, ReviewSession};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let session = ReviewSession::new(Arc::new(MockBackend::new()));
//! let result = session
//!     .submit_document("lease.txt", "A 30% penalty applies to late rent.", "en")
//!     .await
//!     .unwrap();
//! assert!(result.risk_score() <= 10);
//! # });
//! ```

pub mod backend;
pub mod config;
mod document;
pub mod export;
pub mod intake;
pub mod language;
pub mod mcp;
pub mod session;

pub use backend::{
    BackendError, GeminiBackend, GeminiSettings, MockBackend, ReviewBackend, ReviewError,
};
pub use config::{BackendKind, ConfigError, ReviewConfig};
pub use document::{
    is_partition_of, reconcile_segments, reconstruct, AnalysisResult, HighlightType,
    HighlightedSegment, RiskLevel, MAX_RISK_SCORE,
};
pub use export::{export_file_name, render_report};
pub use intake::{Document, FileKind};
pub use language::{SupportedLanguage, SUPPORTED_LANGUAGES};
pub use session::{
    ChatMessage, ChatTurn, IntakeState, ReviewSession, Sender, SessionError, SessionRegistry,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
