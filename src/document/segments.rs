//! Segment partition checks and repair
//!
//! A valid segmentation is a partition of the source text: concatenating the
//! segment texts in order reproduces the document byte for byte. Model output
//! rarely honours that exactly (trimmed whitespace, skipped sentences,
//! paraphrased spans), so backends run their segments through
//! [`reconcile_segments`] before handing a result to the caller.

use super::types::{HighlightType, HighlightedSegment};
use tracing::debug;

/// Concatenate segment texts in order.
pub fn reconstruct(segments: &[HighlightedSegment]) -> String {
    segments.iter().map(|s| s.text.as_str()).collect()
}

/// Whether `segments` partitions `document` with no gaps or overlap.
pub fn is_partition_of(segments: &[HighlightedSegment], document: &str) -> bool {
    let mut rest = document;
    for segment in segments {
        match rest.strip_prefix(segment.text.as_str()) {
            Some(tail) => rest = tail,
            None => return false,
        }
    }
    rest.is_empty()
}

/// Repair a proposed segmentation so it partitions `document`.
///
/// Segments are located in document order starting from a cursor:
/// - an exact match (or, failing that, a match of the trimmed text) claims
///   that span; the text before it becomes a gap;
/// - whitespace-only gaps are folded into the preceding segment, other gaps
///   become `Normal` segments;
/// - segments that cannot be found after the cursor are dropped;
/// - whatever follows the last match becomes a trailing `Normal` segment.
///
/// Adjacent `Normal` segments are merged and empty segments removed.
pub fn reconcile_segments(
    document: &str,
    proposed: Vec<HighlightedSegment>,
) -> Vec<HighlightedSegment> {
    let mut out: Vec<HighlightedSegment> = Vec::with_capacity(proposed.len() + 2);
    let mut cursor = 0usize;
    let mut dropped = 0usize;

    for segment in proposed {
        let Some((start, end)) = locate(document, cursor, &segment.text) else {
            if !segment.text.trim().is_empty() {
                dropped += 1;
            }
            continue;
        };

        push_gap(&mut out, &document[cursor..start]);
        out.push(HighlightedSegment::new(&document[start..end], segment.kind));
        cursor = end;
    }

    push_gap(&mut out, &document[cursor..]);

    if dropped > 0 {
        debug!(dropped, "dropped segments not found in document");
    }

    merge_normal_runs(out)
}

/// Find `text` in `document[cursor..]`, returning absolute byte bounds.
fn locate(document: &str, cursor: usize, text: &str) -> Option<(usize, usize)> {
    let haystack = &document[cursor..];
    for needle in [text, text.trim()] {
        if needle.is_empty() {
            continue;
        }
        if let Some(pos) = haystack.find(needle) {
            let start = cursor + pos;
            return Some((start, start + needle.len()));
        }
    }
    None
}

fn push_gap(out: &mut Vec<HighlightedSegment>, gap: &str) {
    if gap.is_empty() {
        return;
    }
    match out.last_mut() {
        Some(prev) if gap.trim().is_empty() => prev.text.push_str(gap),
        _ => out.push(HighlightedSegment::normal(gap)),
    }
}

fn merge_normal_runs(segments: Vec<HighlightedSegment>) -> Vec<HighlightedSegment> {
    let mut merged: Vec<HighlightedSegment> = Vec::with_capacity(segments.len());
    for segment in segments {
        if segment.text.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(prev)
                if prev.kind == HighlightType::Normal && segment.kind == HighlightType::Normal =>
            {
                prev.text.push_str(&segment.text);
            }
            _ => merged.push(segment),
        }
    }
    merged
}
