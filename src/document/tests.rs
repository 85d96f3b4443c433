//! Serialization tests against the wire shape the front end consumes

use super::*;
use serde_json::{json, Value};

/// Fixture: analysis payload as the presentation layer receives it
fn analysis_fixture() -> Value {
    json!({
        "riskScore": 8,
        "riskExplanation": "Termination is one-sided.",
        "suggestions": ["Add a notice period."],
        "highlightedContent": [
            { "text": "Rent is due monthly. ", "type": "PAYMENT" },
            { "text": "Landlord may terminate at any time.", "type": "RISKY" }
        ]
    })
}

#[test]
fn analysis_deserializes_from_camel_case_fixture() {
    let result: AnalysisResult = serde_json::from_value(analysis_fixture()).unwrap();

    assert_eq!(result.risk_score(), 8);
    assert_eq!(result.risk_explanation(), "Termination is one-sided.");
    assert_eq!(result.suggestions().to_vec(), vec!["Add a notice period.".to_string()]);
    assert_eq!(result.highlighted_content().len(), 2);
    assert_eq!(result.highlighted_content()[1].kind, HighlightType::Risky);
}

#[test]
fn analysis_serializes_back_to_same_shape() {
    let result: AnalysisResult = serde_json::from_value(analysis_fixture()).unwrap();
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value, analysis_fixture());
}

#[test]
fn out_of_range_scores_are_clamped_on_deserialize() {
    let mut fixture = analysis_fixture();
    fixture["riskScore"] = json!(14);
    let high: AnalysisResult = serde_json::from_value(fixture.clone()).unwrap();
    assert_eq!(high.risk_score(), 10);

    fixture["riskScore"] = json!(-3);
    let low: AnalysisResult = serde_json::from_value(fixture.clone()).unwrap();
    assert_eq!(low.risk_score(), 0);

    fixture["riskScore"] = json!(6.6);
    let fractional: AnalysisResult = serde_json::from_value(fixture).unwrap();
    assert_eq!(fractional.risk_score(), 7);
}

#[test]
fn constructor_clamps_score() {
    let result = AnalysisResult::new(42, "x", vec![], vec![]);
    assert_eq!(result.risk_score(), MAX_RISK_SCORE);
    let result = AnalysisResult::new(-1, "x", vec![], vec![]);
    assert_eq!(result.risk_score(), 0);
}

#[test]
fn highlight_type_accepts_any_case() {
    let lower: HighlightType = serde_json::from_value(json!("deadline")).unwrap();
    let title: HighlightType = serde_json::from_value(json!("Confidentiality")).unwrap();
    assert_eq!(lower, HighlightType::Deadline);
    assert_eq!(title, HighlightType::Confidentiality);
    assert_eq!("  payment ".parse::<HighlightType>().unwrap(), HighlightType::Payment);
    assert!("urgent".parse::<HighlightType>().is_err());
}

#[test]
fn risk_label_mapping_is_tiered() {
    let labels: Vec<&str> = (0..=10u8)
        .map(|score| RiskLevel::from_score(score).label())
        .collect();

    assert!(labels[..5].iter().all(|l| *l == "Low Risk"));
    assert!(labels[5..8].iter().all(|l| *l == "Medium Risk"));
    assert!(labels[8..].iter().all(|l| *l == "High Risk"));
}

#[test]
fn normal_segments_have_no_legend() {
    assert_eq!(HighlightType::Normal.legend(), None);
    assert_eq!(HighlightType::Deadline.legend(), Some("Deadlines & Dates"));
    assert!(!HighlightType::Normal.is_flagged());
}

#[test]
fn flagged_segments_skip_normal_text() {
    let result: AnalysisResult = serde_json::from_value(json!({
        "riskScore": 3,
        "riskExplanation": "",
        "suggestions": [],
        "highlightedContent": [
            { "text": "a", "type": "NORMAL" },
            { "text": "b", "type": "RISKY" },
            { "text": "c", "type": "RISKY" }
        ]
    }))
    .unwrap();

    assert_eq!(result.flagged_segments().count(), 2);
    assert_eq!(result.count_of(HighlightType::Risky), 2);
    assert_eq!(result.risk_level(), RiskLevel::Low);
}
