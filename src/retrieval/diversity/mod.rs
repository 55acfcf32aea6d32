//! Keyword-based diversity filtering over retrieved documents.


use crate::retrieval::DocumentMatch;

/// Default title markers for generic recruiting content that should rank
/// behind substantive articles.
pub const DEFAULT_EXCLUDED_MARKERS: [&str; 5] =
    ["career", "team", "culture", "life at", "meet the engineers"];

/// Reorders and truncates matches so generic titles only appear when
/// substantive ones cannot fill `target_count`.
///
/// Pass 1 takes matches whose lowercased title contains none of the excluded
/// markers; pass 2 fills any remaining slots from the original order. Input
/// order is preserved within each pass.
#[inline]
pub fn filter_diverse(
    matches: &[DocumentMatch],
    target_count: usize,
    excluded_markers: &[String],
) -> Vec<DocumentMatch> {
    // Markers come from config, so case is not guaranteed there either.
    let markers: Vec<String> = excluded_markers.iter().map(|m| m.to_lowercase()).collect();
    let mut selected: Vec<DocumentMatch> = Vec::with_capacity(target_count.min(matches.len()));

    for candidate in matches {
        if selected.len() >= target_count {
            return selected;
        }
        let title = candidate.title.to_lowercase();
        if !markers.iter().any(|marker| title.contains(marker)) {
            selected.push(candidate.clone());
        }
    }

    for candidate in matches {
        if selected.len() >= target_count {
            break;
        }
        if !selected.iter().any(|m| m.document_id == candidate.document_id) {
            selected.push(candidate.clone());
        }
    }

    selected
}
