//! Analysis data model: highlight categories, segments and results

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound of the risk scale (inclusive)
pub const MAX_RISK_SCORE: u8 = 10;

/// Semantic category of a document segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HighlightType {
    #[serde(rename = "RISKY", alias = "risky", alias = "Risky")]
    Risky,
    #[serde(rename = "PAYMENT", alias = "payment", alias = "Payment")]
    Payment,
    #[serde(rename = "DEADLINE", alias = "deadline", alias = "Deadline")]
    Deadline,
    #[serde(
        rename = "CONFIDENTIALITY",
        alias = "confidentiality",
        alias = "Confidentiality"
    )]
    Confidentiality,
    #[serde(rename = "NORMAL", alias = "normal", alias = "Normal")]
    Normal,
}

impl HighlightType {
    pub const ALL: [HighlightType; 5] = [
        HighlightType::Risky,
        HighlightType::Payment,
        HighlightType::Deadline,
        HighlightType::Confidentiality,
        HighlightType::Normal,
    ];

    /// Upper-case tag used in exports and prompts (e.g. `RISKY`)
    pub fn tag(&self) -> &'static str {
        match self {
            HighlightType::Risky => "RISKY",
            HighlightType::Payment => "PAYMENT",
            HighlightType::Deadline => "DEADLINE",
            HighlightType::Confidentiality => "CONFIDENTIALITY",
            HighlightType::Normal => "NORMAL",
        }
    }

    /// Legend label shown next to the highlight colour.
    ///
    /// `Normal` text is not highlighted and has no legend entry.
    pub fn legend(&self) -> Option<&'static str> {
        match self {
            HighlightType::Risky => Some("Risky Clauses"),
            HighlightType::Payment => Some("Payment Terms"),
            HighlightType::Deadline => Some("Deadlines & Dates"),
            HighlightType::Confidentiality => Some("Confidentiality"),
            HighlightType::Normal => None,
        }
    }

    pub fn is_flagged(&self) -> bool {
        *self != HighlightType::Normal
    }
}

impl fmt::Display for HighlightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for HighlightType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        HighlightType::ALL
            .into_iter()
            .find(|t| t.tag() == upper)
            .ok_or_else(|| format!("unknown highlight type: {}", s))
    }
}

/// A contiguous slice of the analyzed document tagged with a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightedSegment {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: HighlightType,
}

impl HighlightedSegment {
    pub fn new(text: impl Into<String>, kind: HighlightType) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn normal(text: impl Into<String>) -> Self {
        Self::new(text, HighlightType::Normal)
    }
}

/// Three-tier label derived from a risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 8 => RiskLevel::High,
            s if s >= 5 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::High => "High Risk",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Clamp an arbitrary model-provided score into `[0, MAX_RISK_SCORE]`.
pub fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, MAX_RISK_SCORE as f64) as u8
}

fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(clamp_score(raw))
}

/// The outcome of analyzing one document.
///
/// Created once per submission and never mutated afterwards; the accessors
/// are the only way to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(deserialize_with = "deserialize_score")]
    risk_score: u8,
    risk_explanation: String,
    suggestions: Vec<String>,
    highlighted_content: Vec<HighlightedSegment>,
}

impl AnalysisResult {
    /// Build a result, clamping the score into range.
    pub fn new(
        risk_score: i64,
        risk_explanation: impl Into<String>,
        suggestions: Vec<String>,
        highlighted_content: Vec<HighlightedSegment>,
    ) -> Self {
        Self {
            risk_score: clamp_score(risk_score as f64),
            risk_explanation: risk_explanation.into(),
            suggestions,
            highlighted_content,
        }
    }

    pub fn risk_score(&self) -> u8 {
        self.risk_score
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }

    pub fn risk_explanation(&self) -> &str {
        &self.risk_explanation
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn highlighted_content(&self) -> &[HighlightedSegment] {
        &self.highlighted_content
    }

    /// Segments carrying any category other than `Normal`
    pub fn flagged_segments(&self) -> impl Iterator<Item = &HighlightedSegment> {
        self.highlighted_content.iter().filter(|s| s.kind.is_flagged())
    }

    /// Number of segments of the given category
    pub fn count_of(&self, kind: HighlightType) -> usize {
        self.highlighted_content
            .iter()
            .filter(|s| s.kind == kind)
            .count()
    }
}
