//! Offline backend: keyword heuristics, configurable latency and failures
//!
//! Used as the test double for `ReviewBackend` and as the default backend
//! when no API key is configured. Analysis classifies each sentence of the
//! submitted document; chat routes the message to an intent and answers
//! from the supplied context rather than from canned text.

use super::{validate_analysis_input, validate_chat_input, ReviewBackend, ReviewError};
use crate::document::{
    clamp_score, reconcile_segments, AnalysisResult, HighlightType, HighlightedSegment, RiskLevel,
};
use async_trait::async_trait;
use regex_lite::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

const HELP_REPLY: &str = "I'm here to help you with this legal document. You can ask me to summarize clauses, explain risks, or clarify specific terms.";

/// What a chat message is asking about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatIntent {
    Penalty,
    Summary,
    Termination,
    Help,
}

impl ChatIntent {
    /// Route a message by keyword. First match wins.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("penalty") || lower.contains("late fee") || lower.contains("late payment") {
            ChatIntent::Penalty
        } else if ["summary", "summarize", "summarise", "overview"]
            .iter()
            .any(|k| lower.contains(k))
        {
            ChatIntent::Summary
        } else if lower.contains("terminat") {
            ChatIntent::Termination
        } else {
            ChatIntent::Help
        }
    }
}

/// Sentence classifier used for offline analysis.
struct ClauseClassifier {
    risky: Regex,
    confidentiality: Regex,
    payment: Regex,
    deadline: Regex,
    percent: Regex,
}

impl ClauseClassifier {
    fn new() -> Self {
        let compile = |pattern: &str| Regex::new(pattern).expect("classifier pattern is valid");
        Self {
            risky: compile(
                r"(?i)\b(penalty|penalties|terminate|termination|forfeit\w*|indemnif\w*|sole discretion|non-refundable|waive\w*|without (prior )?notice|at any time|for any reason)\b",
            ),
            confidentiality: compile(r"(?i)\b(confidential\w*|non-disclosure|proprietary)\b"),
            payment: compile(
                r"(?i)(\b(rent|pay\w*|fees?|deposit|invoice\w*|salary|compensation|price)\b|[₹$€£])",
            ),
            deadline: compile(
                r"(?i)\b(within|days|weeks|months|deadline|renew\w*|expir\w*|no later than|due date|notice period|before the end)\b",
            ),
            percent: compile(r"(\d+(?:\.\d+)?)\s?%"),
        }
    }

    fn classify(&self, sentence: &str) -> HighlightType {
        if self.risky.is_match(sentence) {
            HighlightType::Risky
        } else if self.confidentiality.is_match(sentence) {
            HighlightType::Confidentiality
        } else if self.payment.is_match(sentence) {
            HighlightType::Payment
        } else if self.deadline.is_match(sentence) {
            HighlightType::Deadline
        } else {
            HighlightType::Normal
        }
    }

    /// First percentage in `text`, without the `%` sign.
    fn percentage<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.percent
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }
}

/// Split text into sentences, keeping terminators and trailing whitespace
/// so the pieces concatenate back to the input.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let terminator = matches!(c, '.' | '!' | '?');
        if !terminator && c != '\n' {
            continue;
        }
        if terminator {
            if let Some(&(_, next)) = chars.peek() {
                if !next.is_whitespace() {
                    continue;
                }
            }
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if !next.is_whitespace() {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }
        out.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

/// Heuristic score: one point of baseline, three per risky clause, one if
/// any deadline needs tracking.
fn score_segments(segments: &[HighlightedSegment]) -> u8 {
    let risky = segments.iter().filter(|s| s.kind == HighlightType::Risky).count();
    let has_deadline = segments.iter().any(|s| s.kind == HighlightType::Deadline);
    let raw = 1 + 3 * risky + usize::from(has_deadline);
    clamp_score(raw as f64)
}

fn find_clause<'a>(
    context: &'a [HighlightedSegment],
    needle: &str,
) -> Option<&'a HighlightedSegment> {
    context
        .iter()
        .find(|s| s.text.to_lowercase().contains(needle))
}

/// Offline `ReviewBackend` with injectable latency and failures.
pub struct MockBackend {
    available: bool,
    fail_chat: bool,
    fixed_analysis: Option<AnalysisResult>,
    analysis_delay: Duration,
    chat_delay: Duration,
    classifier: ClauseClassifier,
    analyze_calls: AtomicUsize,
    chat_calls: AtomicUsize,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// An available backend with no artificial delay.
    pub fn new() -> Self {
        Self {
            available: true,
            fail_chat: false,
            fixed_analysis: None,
            analysis_delay: Duration::ZERO,
            chat_delay: Duration::ZERO,
            classifier: ClauseClassifier::new(),
            analyze_calls: AtomicUsize::new(0),
            chat_calls: AtomicUsize::new(0),
        }
    }

    /// A backend whose every call fails as if the service were down.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Analysis works, chat calls fail.
    pub fn failing_chat(mut self) -> Self {
        self.fail_chat = true;
        self
    }

    /// Simulated network latency for each operation.
    pub fn with_delays(mut self, analysis: Duration, chat: Duration) -> Self {
        self.analysis_delay = analysis;
        self.chat_delay = chat;
        self
    }

    /// Return this result (re-segmented against the submitted text)
    /// instead of classifying sentences.
    pub fn with_analysis(mut self, analysis: AnalysisResult) -> Self {
        self.fixed_analysis = Some(analysis);
        self
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    fn classify_document(&self, document: &str) -> AnalysisResult {
        let proposed: Vec<HighlightedSegment> = split_sentences(document)
            .into_iter()
            .map(|sentence| HighlightedSegment::new(sentence, self.classifier.classify(sentence)))
            .collect();
        let segments = reconcile_segments(document, proposed);

        let score = score_segments(&segments);
        let risky: Vec<&str> = segments
            .iter()
            .filter(|s| s.kind == HighlightType::Risky)
            .map(|s| s.text.trim())
            .collect();

        let explanation = match risky.first() {
            None => "No clauses were flagged as risky. The document reads as broadly balanced."
                .to_string(),
            Some(first) => format!(
                "Found {} risky clause(s). The most significant: \"{}\"",
                risky.len(),
                first
            ),
        };

        let suggestions = self.suggestions_for(&segments);
        AnalysisResult::new(score as i64, explanation, suggestions, segments)
    }

    fn suggestions_for(&self, segments: &[HighlightedSegment]) -> Vec<String> {
        let mut suggestions = Vec::new();
        let risky_text: String = segments
            .iter()
            .filter(|s| s.kind == HighlightType::Risky)
            .map(|s| s.text.to_lowercase())
            .collect();

        if risky_text.contains("terminat") {
            suggestions.push("Negotiate to add a 30-day notice period for termination.".to_string());
        }
        if risky_text.contains("penalt") {
            suggestions.push("Propose a more standard late payment penalty, such as 5-10%.".to_string());
        }
        if segments.iter().any(|s| s.kind == HighlightType::Confidentiality) {
            suggestions.push(
                "Clarify the confidentiality terms to specify what information is covered."
                    .to_string(),
            );
        }
        if segments.iter().any(|s| s.kind == HighlightType::Deadline) {
            suggestions.push("Record every notice deadline so renewals are not missed.".to_string());
        }
        if suggestions.is_empty() {
            suggestions.push("Have a qualified lawyer review the document before signing.".to_string());
        }
        suggestions
    }

    fn penalty_reply(&self, context: &[HighlightedSegment]) -> String {
        let Some(clause) = find_clause(context, "penalt") else {
            return "I couldn't find a late payment penalty in this document.".to_string();
        };
        match self.classifier.percentage(&clause.text) {
            Some(rate) => {
                let assessment = match rate.parse::<f64>() {
                    Ok(r) if r > 10.0 => "which is considered very high",
                    _ => "which is within the usual range",
                };
                format!(
                    "The penalty for late payment is {}%, {}. The clause reads: \"{}\" A standard rate is around 5-10%.",
                    rate,
                    assessment,
                    clause.text.trim()
                )
            }
            None => format!(
                "The document imposes a late payment penalty: \"{}\"",
                clause.text.trim()
            ),
        }
    }

    fn summary_reply(&self, context: &[HighlightedSegment]) -> String {
        let score = match &self.fixed_analysis {
            Some(analysis) => analysis.risk_score(),
            None => score_segments(context),
        };
        let level = RiskLevel::from_score(score);
        let risky: Vec<&str> = context
            .iter()
            .filter(|s| s.kind == HighlightType::Risky)
            .map(|s| s.text.trim())
            .collect();
        let flagged = context.iter().filter(|s| s.kind.is_flagged()).count();

        let mut reply = format!(
            "This document has a risk score of {}/10 ({}). {} of {} clauses are highlighted.",
            score,
            level.label(),
            flagged,
            context.len()
        );
        if risky.is_empty() {
            reply.push_str(" No clauses were flagged as risky.");
        } else {
            reply.push_str(" Key risks: ");
            reply.push_str(&risky.join(" "));
            reply.push_str(" It's recommended to revise these terms.");
        }
        reply
    }

    fn termination_reply(&self, context: &[HighlightedSegment]) -> String {
        match find_clause(context, "terminat") {
            Some(clause) if clause.kind == HighlightType::Risky => format!(
                "The termination clause is highly risky. It states: \"{}\" You should consider negotiating for a minimum notice period, such as 30 or 60 days.",
                clause.text.trim()
            ),
            Some(clause) => format!("The termination clause states: \"{}\"", clause.text.trim()),
            None => "I couldn't find a termination clause in this document.".to_string(),
        }
    }
}

#[async_trait]
impl ReviewBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn analyze(
        &self,
        document_text: &str,
        output_language: &str,
    ) -> Result<AnalysisResult, ReviewError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        validate_analysis_input(document_text, output_language)?;
        debug!(
            len = document_text.len(),
            language = output_language,
            "mock analysis"
        );

        if !self.analysis_delay.is_zero() {
            tokio::time::sleep(self.analysis_delay).await;
        }
        if !self.available {
            return Err(ReviewError::AnalysisFailed(
                "mock backend configured as unavailable".to_string(),
            ));
        }

        Ok(match &self.fixed_analysis {
            Some(fixed) => AnalysisResult::new(
                fixed.risk_score() as i64,
                fixed.risk_explanation(),
                fixed.suggestions().to_vec(),
                reconcile_segments(document_text, fixed.highlighted_content().to_vec()),
            ),
            None => self.classify_document(document_text),
        })
    }

    async fn chat(
        &self,
        message: &str,
        context: &[HighlightedSegment],
    ) -> Result<String, ReviewError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        validate_chat_input(message)?;

        if !self.chat_delay.is_zero() {
            tokio::time::sleep(self.chat_delay).await;
        }
        if !self.available || self.fail_chat {
            return Err(ReviewError::ChatFailed(
                "mock backend configured to fail chat".to_string(),
            ));
        }

        let intent = ChatIntent::classify(message);
        debug!(?intent, "mock chat");
        Ok(match intent {
            ChatIntent::Penalty => self.penalty_reply(context),
            ChatIntent::Summary => self.summary_reply(context),
            ChatIntent::Termination => self.termination_reply(context),
            ChatIntent::Help => HELP_REPLY.to_string(),
        })
    }
}
