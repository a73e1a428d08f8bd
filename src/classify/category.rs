//! Label taxonomy for aggregation.
//!
//! Classifier labels are free-form strings; reports bucket them into a fixed
//! four-way taxonomy so category counts stay comparable across model versions.

use serde::{Deserialize, Serialize};

/// Fixed category taxonomy for aggregated reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Live human face
    Benign,
    /// Spoof attempt using a printed photo
    PrintAttack,
    /// Spoof attempt replaying recorded media on a screen
    ReplayAttack,
    /// Anything the taxonomy does not recognize
    Unknown,
}

/// Labels mapped to [`Category::Benign`] after lower-casing.
const BENIGN_LABELS: [&str; 3] = ["real", "benign", "live"];

/// Map a raw classifier label to its category.
///
/// Comparison is lower-cased. Rules are evaluated top to bottom and the
/// first match wins: a label containing both "print" and "replay" is a
/// [`Category::PrintAttack`]. Unrecognized labels are never rejected; they
/// land in [`Category::Unknown`].
pub fn categorize(label: &str) -> Category {
    let normalized = label.to_lowercase();

    if BENIGN_LABELS.contains(&normalized.as_str()) {
        Category::Benign
    } else if normalized.contains("print") {
        Category::PrintAttack
    } else if normalized.contains("replay") {
        Category::ReplayAttack
    } else {
        Category::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benign_labels() {
        assert_eq!(categorize("real"), Category::Benign);
        assert_eq!(categorize("benign"), Category::Benign);
        assert_eq!(categorize("live"), Category::Benign);
        assert_eq!(categorize("REAL"), Category::Benign);
    }

    #[test]
    fn test_attack_substrings() {
        assert_eq!(categorize("print"), Category::PrintAttack);
        assert_eq!(categorize("print_attack"), Category::PrintAttack);
        assert_eq!(categorize("Replay"), Category::ReplayAttack);
        assert_eq!(categorize("screen-replay"), Category::ReplayAttack);
    }

    #[test]
    fn categorize_prefers_print_when_both_substrings_match() {
        assert_eq!(categorize("replay_of_print"), Category::PrintAttack);
        assert_eq!(categorize("print-replay"), Category::PrintAttack);
    }

    #[test]
    fn test_unknown_fallthrough() {
        assert_eq!(categorize("mask"), Category::Unknown);
        assert_eq!(categorize(""), Category::Unknown);
        assert_eq!(categorize("realistic"), Category::Unknown);
    }
}
