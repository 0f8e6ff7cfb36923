//! Partial (substring-tolerant) similarity scoring.
//!
//! [`partial_ratio`] slides the query across the text and keeps the best
//! normalized Levenshtein similarity of any equal-length window, so a
//! short query can score perfectly inside a long field. Windows are
//! compared directly as char slices; nothing is allocated per window.
//!
//! The metric is directional: only the text is windowed. When the text is
//! shorter than the query the two are compared whole, so a score of 100
//! always means "the query occurs in the text".

/// Levenshtein distance between two char slices (two-row DP).
fn levenshtein_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Normalized similarity in `[0.0, 1.0]`.
fn similarity(a: &[char], b: &[char]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein_chars(a, b) as f64 / max_len as f64
}

/// Best partial match of `query` inside `text`, as a score in `[0, 100]`.
///
/// Case-insensitive. Empty query or empty text scores 0.
///
/// ```
/// use reimbursement_finder_core::fuzz::partial_ratio;
/// assert_eq!(partial_ratio("knee", "Total Knee Replacement"), 100.0);
/// ```
#[must_use]
pub fn partial_ratio(query: &str, text: &str) -> f64 {
    let needle: Vec<char> = query.to_lowercase().chars().collect();
    let hay: Vec<char> = text.to_lowercase().chars().collect();

    if needle.is_empty() || hay.is_empty() {
        return 0.0;
    }

    if hay.len() <= needle.len() {
        return similarity(&needle, &hay) * 100.0;
    }

    let mut best = 0.0f64;
    for window in hay.windows(needle.len()) {
        best = best.max(similarity(&needle, window));
        if best == 1.0 {
            break;
        }
    }
    best * 100.0
}
