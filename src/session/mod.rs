//! Review session: the state a front end holds for one user
//!
//! A session owns the current analysis and the chat transcript and
//! sequences calls to its backend through two state machines:
//!
//! - intake: `Idle → Analyzing → {Analyzed | Failed}`
//! - chat (once analyzed): `Idle → Sending → Idle`
//!
//! Methods take `&self`; state sits behind a mutex that is released before
//! every backend await, so a second request issued while one is pending
//! observes the in-flight state and is rejected with `SessionError::Busy`.

mod registry;
mod transcript;

pub use registry::SessionRegistry;
pub use transcript::{greeting, ChatMessage, Sender};

use crate::backend::{ReviewBackend, ReviewError, CHAT_FALLBACK_MESSAGE};
use crate::document::{is_partition_of, AnalysisResult};
use crate::export::{export_file_name, render_report};
use crate::intake::Document;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Unique identifier for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Document intake progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IntakeState {
    Idle,
    Analyzing,
    Analyzed,
    Failed { message: String },
}

/// Requests the session refuses to start
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a request is already in progress")]
    Busy,
    #[error("no analyzed document in this session")]
    NoAnalysis,
    #[error("message is empty")]
    EmptyMessage,
    #[error("a new document was submitted while this request was pending")]
    Superseded,
    #[error(transparent)]
    Review(#[from] ReviewError),
}

/// Result of one chat turn.
///
/// A failed backend call still produces a reply (the fallback message);
/// `error` carries the cause for logging.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub reply: ChatMessage,
    pub error: Option<ReviewError>,
}

impl ChatTurn {
    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug)]
struct SessionState {
    intake: IntakeState,
    file_name: Option<String>,
    analysis: Option<Arc<AnalysisResult>>,
    transcript: Vec<ChatMessage>,
    sending: bool,
    /// Bumped on every submission; pending chat replies from an older
    /// generation are discarded.
    generation: u64,
}

impl SessionState {
    fn new() -> Self {
        Self {
            intake: IntakeState::Idle,
            file_name: None,
            analysis: None,
            transcript: Vec::new(),
            sending: false,
            generation: 0,
        }
    }
}

/// Session-scoped review state over a `ReviewBackend`
pub struct ReviewSession {
    id: SessionId,
    backend: Arc<dyn ReviewBackend>,
    timeout: Duration,
    state: Mutex<SessionState>,
}

impl ReviewSession {
    pub fn new(backend: Arc<dyn ReviewBackend>) -> Self {
        Self {
            id: SessionId::new(),
            backend,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            state: Mutex::new(SessionState::new()),
        }
    }

    /// Upper bound on each backend call; expiry counts as a failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear the previous document and start a new generation.
    fn reset_for(&self, st: &mut SessionState, file_name: &str) {
        st.file_name = Some(file_name.to_string());
        st.analysis = None;
        st.transcript.clear();
        st.sending = false;
        st.generation += 1;
    }

    /// Record an upload that failed before it reached the backend
    /// (unreadable file, no extractable text).
    ///
    /// The previous analysis and transcript are discarded as for any new
    /// upload. Rejected file types should not be recorded here; they leave
    /// the session untouched.
    pub fn fail_intake(&self, file_name: &str, error: &ReviewError) -> Result<(), SessionError> {
        let mut st = self.state();
        if st.intake == IntakeState::Analyzing {
            return Err(SessionError::Busy);
        }
        self.reset_for(&mut st, file_name);
        st.intake = IntakeState::Failed {
            message: error.user_message().to_string(),
        };
        warn!(session = %self.id, file_name, error = %error, "document intake failed");
        Ok(())
    }

    /// Analyze a validated upload.
    pub async fn submit(
        &self,
        document: &Document,
        language: &str,
    ) -> Result<Arc<AnalysisResult>, SessionError> {
        self.submit_document(&document.file_name, &document.text, language)
            .await
    }

    /// Start a new analysis, discarding the previous analysis and transcript.
    ///
    /// On success the transcript holds exactly one assistant greeting naming
    /// the file. On failure no partial result is kept and the intake state
    /// carries the generic retry message.
    pub async fn submit_document(
        &self,
        file_name: &str,
        document_text: &str,
        language: &str,
    ) -> Result<Arc<AnalysisResult>, SessionError> {
        let generation = {
            let mut st = self.state();
            if st.intake == IntakeState::Analyzing {
                return Err(SessionError::Busy);
            }
            self.reset_for(&mut st, file_name);
            st.intake = IntakeState::Analyzing;
            st.generation
        };
        let _pending = InFlight {
            session: self,
            generation,
            kind: InFlightKind::Analysis,
        };

        info!(session = %self.id, file_name, language, backend = self.backend.name(), "analyzing document");

        let outcome = match tokio::time::timeout(
            self.timeout,
            self.backend.analyze(document_text, language),
        )
        .await
        {
            Ok(Ok(result)) if !is_partition_of(result.highlighted_content(), document_text) => {
                Err(ReviewError::AnalysisFailed(
                    "highlighted segments do not reproduce the document".to_string(),
                ))
            }
            Ok(result) => result,
            Err(_) => Err(ReviewError::AnalysisFailed(format!(
                "timed out after {:?}",
                self.timeout
            ))),
        };

        let mut st = self.state();
        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                st.analysis = Some(Arc::clone(&result));
                st.transcript.push(ChatMessage::ai(greeting(file_name)));
                st.intake = IntakeState::Analyzed;
                info!(session = %self.id, risk_score = result.risk_score(), "analysis complete");
                Ok(result)
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "analysis failed");
                st.intake = IntakeState::Failed {
                    message: e.user_message().to_string(),
                };
                Err(SessionError::Review(e))
            }
        }
    }

    /// Send one user message and append the reply.
    ///
    /// The user message is recorded before the backend is called. A backend
    /// failure appends the fallback assistant message instead of an error.
    pub async fn send_message(&self, message: &str) -> Result<ChatTurn, SessionError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let (analysis, generation) = {
            let mut st = self.state();
            let analysis = st.analysis.clone().ok_or(SessionError::NoAnalysis)?;
            if st.sending {
                return Err(SessionError::Busy);
            }
            st.transcript.push(ChatMessage::user(message));
            st.sending = true;
            (analysis, st.generation)
        };
        let _pending = InFlight {
            session: self,
            generation,
            kind: InFlightKind::Chat,
        };

        let outcome = match tokio::time::timeout(
            self.timeout,
            self.backend.chat(message, analysis.highlighted_content()),
        )
        .await
        {
            Ok(reply) => reply,
            Err(_) => Err(ReviewError::ChatFailed(format!(
                "timed out after {:?}",
                self.timeout
            ))),
        };

        let mut st = self.state();
        if st.generation != generation {
            return Err(SessionError::Superseded);
        }
        st.sending = false;

        let turn = match outcome {
            Ok(text) => ChatTurn {
                reply: ChatMessage::ai(text),
                error: None,
            },
            Err(e) => {
                warn!(session = %self.id, error = %e, "chat turn failed");
                ChatTurn {
                    reply: ChatMessage::ai(CHAT_FALLBACK_MESSAGE),
                    error: Some(e),
                }
            }
        };
        st.transcript.push(turn.reply.clone());
        Ok(turn)
    }

    pub fn intake_state(&self) -> IntakeState {
        self.state().intake.clone()
    }

    pub fn analysis(&self) -> Option<Arc<AnalysisResult>> {
        self.state().analysis.clone()
    }

    pub fn file_name(&self) -> Option<String> {
        self.state().file_name.clone()
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.state().transcript.clone()
    }

    pub fn is_sending(&self) -> bool {
        self.state().sending
    }

    /// User-facing error text of a failed intake
    pub fn error_message(&self) -> Option<String> {
        match &self.state().intake {
            IntakeState::Failed { message } => Some(message.clone()),
            _ => None,
        }
    }

    /// Export name and report text for the current analysis.
    pub fn export_report(&self) -> Option<(String, String)> {
        let st = self.state();
        let analysis = st.analysis.as_ref()?;
        let file_name = st.file_name.as_deref().unwrap_or("Document");
        Some((export_file_name(file_name), render_report(analysis, file_name)))
    }
}

enum InFlightKind {
    Analysis,
    Chat,
}

/// Releases the in-flight flag of a request whose future is dropped
/// before the backend answers.
///
/// Completed requests have already moved the state on, and a newer
/// generation owns the flags, so both cases are left alone.
struct InFlight<'a> {
    session: &'a ReviewSession,
    generation: u64,
    kind: InFlightKind,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut st = self.session.state();
        if st.generation != self.generation {
            return;
        }
        match self.kind {
            InFlightKind::Analysis if st.intake == IntakeState::Analyzing => {
                debug!(session = %self.session.id, "analysis cancelled");
                st.intake = IntakeState::Idle;
                st.file_name = None;
            }
            InFlightKind::Chat if st.sending => {
                debug!(session = %self.session.id, "chat turn cancelled");
                st.sending = false;
            }
            _ => {}
        }
    }
}
