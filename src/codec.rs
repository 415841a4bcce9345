//! Numeric ↔ categorical codec for qualitative factor scores.
//!
//! Qualitative classifications share the quantitative factors' single
//! numeric score column: an option list of size `n` is mapped linearly onto
//! [-1.0, +1.0], first option at -1.0, last at +1.0, evenly spaced. Reading
//! snaps the stored value back to the nearest option index.
//!
//! The mapping is recomputed from the current option list on every call, so
//! reordering options after scores were cached would decode old rows to
//! different labels. Such rows are unreachable through the cache (any factor
//! edit changes the config hash); only raw SQL readers can observe them.

/// Convert a classification label to its numeric storage form.
///
/// A label not present in `options` falls back to 0.0 (neutral) rather than
/// failing; callers that need to distinguish "unknown label" from a genuine
/// midpoint must check membership first.
pub fn label_to_score(options: &[String], label: &str) -> f64 {
    let index = match options.iter().position(|o| o == label) {
        Some(i) => i,
        None => return 0.0,
    };

    (index as f64 / (options.len() - 1).max(1) as f64) * 2.0 - 1.0
}

/// Convert a stored numeric score back to its classification label.
///
/// Values outside [-1.0, +1.0] are clamped by index, so slightly
/// out-of-range inputs still resolve to the first or last option. Returns
/// an empty string for an empty option list.
pub fn score_to_label<'a>(options: &'a [String], score: f64) -> &'a str {
    if options.is_empty() {
        return "";
    }

    let span = (options.len() - 1).max(1) as f64;
    let index = ((score + 1.0) / 2.0 * span).round();
    let index = (index as i64).clamp(0, options.len() as i64 - 1) as usize;

    &options[index]
}
