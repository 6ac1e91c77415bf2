//! Thought/output extraction for raw model replies.
//!
//! Replies may embed reasoning inside `<think>…</think>` or
//! `<thought>…</thought>` segments (one convention, two accepted tag names,
//! case-insensitive, segments may span lines). Extraction strips every
//! delimited segment, collects the trimmed interiors in order of
//! appearance, and returns the trimmed remainder as the final output. Pairs
//! match non-greedily left-to-right; an unterminated opening tag has no
//! pair and is left in place untouched.

use once_cell::sync::Lazy;
use regex::Regex;

/// Substituted when stripping leaves nothing but whitespace.
pub const NO_FINAL_OUTPUT: &str = "No final output provided.";

static THOUGHT_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:think|thought)>(.*?)</(?:think|thought)>").expect("thought tag pattern")
});

/// Result of splitting a raw reply into final output and thought segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extraction {
    /// Reply text with every thought segment removed, trimmed; the
    /// [`NO_FINAL_OUTPUT`] placeholder if nothing remains.
    pub final_output: String,
    /// Trimmed interior of each segment, in order of appearance.
    pub thoughts: Vec<String>,
}

/// Splits `raw` into visible output and extracted thought segments.
///
/// Pure text transform, no side effects.
///
/// # Examples
/// ```
/// use convograph::thoughts::extract;
///
/// let e = extract("<think>foo</think>bar");
/// assert_eq!(e.final_output, "bar");
/// assert_eq!(e.thoughts, vec!["foo".to_string()]);
/// ```
#[must_use]
pub fn extract(raw: &str) -> Extraction {
    let thoughts: Vec<String> = THOUGHT_SEGMENT
        .captures_iter(raw)
        .map(|caps| caps[1].trim().to_string())
        .collect();

    let remainder = THOUGHT_SEGMENT.replace_all(raw, "");
    let trimmed = remainder.trim();
    let final_output = if trimmed.is_empty() {
        NO_FINAL_OUTPUT.to_string()
    } else {
        trimmed.to_string()
    };

    Extraction {
        final_output,
        thoughts,
    }
}
