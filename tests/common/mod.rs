//! Common test utilities for review-flow integration tests
//!
//! Provides a sample rental agreement, the canned analysis a front end
//! would see for it, and helpers for building sessions over the mock
//! backend.

#![allow(dead_code)]

use legai::{AnalysisResult, HighlightType, HighlightedSegment, MockBackend, ReviewSession};
use std::sync::Arc;

pub const AGREEMENT: &str = "This Rental Agreement is made and entered into on this 1st day of January, 2024, by and between Landlord, and Tenant. \
The Tenant agrees to pay a monthly rent of ₹10,00,000. Payment is due on the 1st of each month. \
Failure to pay within 5 days of the due date will result in a 30% penalty. \
This agreement will automatically renew unless notice is given by the tenant 60 days before the end of the term. \
The Landlord reserves the right to terminate this agreement at any time, for any reason, without prior notice. \
All terms of this agreement, including financial details, shall be kept confidential by both parties. \
The Tenant is responsible for all repairs and maintenance of the property.";

/// Score-8 analysis of `AGREEMENT` with one segment of every flagged type.
pub fn rental_analysis() -> AnalysisResult {
    AnalysisResult::new(
        8,
        "The agreement heavily favors the landlord. The termination clause allows eviction without notice and the late payment penalty is excessive.",
        vec![
            "Negotiate to add a 30-day notice period for termination.".to_string(),
            "Propose a more standard late payment penalty, such as 5-10%.".to_string(),
            "Clarify the confidentiality terms to specify what information is covered."
                .to_string(),
        ],
        vec![
            HighlightedSegment::new(
                "The Tenant agrees to pay a monthly rent of ₹10,00,000.",
                HighlightType::Payment,
            ),
            HighlightedSegment::new(
                "Failure to pay within 5 days of the due date will result in a 30% penalty.",
                HighlightType::Risky,
            ),
            HighlightedSegment::new(
                "This agreement will automatically renew unless notice is given by the tenant 60 days before the end of the term.",
                HighlightType::Deadline,
            ),
            HighlightedSegment::new(
                "The Landlord reserves the right to terminate this agreement at any time, for any reason, without prior notice.",
                HighlightType::Risky,
            ),
            HighlightedSegment::new(
                "All terms of this agreement, including financial details, shall be kept confidential by both parties.",
                HighlightType::Confidentiality,
            ),
        ],
    )
}

/// A session over `backend`, returning the backend for call-count assertions.
pub fn session_over(backend: MockBackend) -> (Arc<MockBackend>, ReviewSession) {
    let backend = Arc::new(backend);
    let session = ReviewSession::new(backend.clone());
    (backend, session)
}
