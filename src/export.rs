//! Plain-text export of an analysis

use crate::document::AnalysisResult;
use std::fmt::Write;

const RULE: &str = "========================";

/// Render the downloadable report for `result`.
pub fn render_report(result: &AnalysisResult, file_name: &str) -> String {
    let mut out = String::new();
    let _ = write_report(&mut out, result, file_name);
    out
}

fn write_report(out: &mut String, result: &AnalysisResult, file_name: &str) -> std::fmt::Result {
    writeln!(out, "Analysis for: {}\n", file_name)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "  RISK ANALYSIS SUMMARY ")?;
    writeln!(out, "{}\n", RULE)?;
    writeln!(out, "RISK SCORE: {}/10", result.risk_score())?;
    writeln!(out, "EXPLANATION: {}\n", result.risk_explanation())?;

    let suggestions: Vec<String> = result
        .suggestions()
        .iter()
        .map(|s| format!("  - {}", s))
        .collect();
    writeln!(out, "SMART SUGGESTIONS:\n{}\n", suggestions.join("\n"))?;

    writeln!(out, "{}", RULE)?;
    writeln!(out, "   HIGHLIGHTED DOCUMENT   ")?;
    writeln!(out, "{}\n", RULE)?;

    for segment in result.highlighted_content() {
        writeln!(out, "[{}]\n{}\n", segment.kind.tag(), segment.text.trim())?;
    }
    Ok(())
}

/// Download name for a report: `analysis-<name without last extension>.txt`.
pub fn export_file_name(file_name: &str) -> String {
    let base = match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    };
    format!("analysis-{}.txt", base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{HighlightType, HighlightedSegment};

    fn sample() -> AnalysisResult {
        AnalysisResult::new(
            8,
            "Termination is one-sided.",
            vec!["Add a 30-day notice period.".to_string()],
            vec![
                HighlightedSegment::new("Rent is ₹10,00,000. ", HighlightType::Payment),
                HighlightedSegment::new("Landlord may terminate at any time.", HighlightType::Risky),
            ],
        )
    }

    #[test]
    fn report_contains_score_and_tagged_segments() {
        let report = render_report(&sample(), "lease.pdf");

        assert!(report.starts_with("Analysis for: lease.pdf\n\n"));
        assert!(report.contains("RISK SCORE: 8/10"));
        assert!(report.contains("EXPLANATION: Termination is one-sided.\n"));
        assert!(report.contains("SMART SUGGESTIONS:\n  - Add a 30-day notice period.\n\n"));
        assert!(report.contains("[PAYMENT]\nRent is ₹10,00,000.\n\n"));
        assert!(report.contains("[RISKY]\nLandlord may terminate at any time.\n\n"));
    }

    #[test]
    fn report_section_order() {
        let report = render_report(&sample(), "lease.pdf");
        let summary = report.find("RISK ANALYSIS SUMMARY").unwrap();
        let highlighted = report.find("HIGHLIGHTED DOCUMENT").unwrap();
        let payment = report.find("[PAYMENT]").unwrap();
        let risky = report.find("[RISKY]").unwrap();
        assert!(summary < highlighted && highlighted < payment && payment < risky);
    }

    #[test]
    fn export_name_drops_last_extension() {
        assert_eq!(export_file_name("lease.pdf"), "analysis-lease.txt");
        assert_eq!(export_file_name("lease.v2.docx"), "analysis-lease.v2.txt");
        assert_eq!(export_file_name("lease"), "analysis-lease.txt");
        assert_eq!(export_file_name(".env"), "analysis-.env.txt");
    }
}
