//! Classification result types delivered by the external inference service.
//!
//! Events arrive on the wire as `{"className": "<label>", "confidence": <f64>}`;
//! the label vocabulary is owned by the producer (`real`, `replay`, `print`
//! in the reference deployment) and is never validated here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label the decider treats as benign. Exact, case-sensitive match: this is
/// the producer contract, not a normalization rule (see [`crate::classify::categorize`]
/// for the lenient taxonomy used at aggregation time).
pub const BENIGN_LABEL: &str = "real";

/// A single per-frame classification result.
///
/// Immutable once created. Confidence is assumed pre-validated by the
/// producer and is carried as-is, without clamping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationEvent {
    /// Predicted class label as emitted by the model
    #[serde(alias = "className")]
    pub label: String,
    /// Model confidence in `[0, 1]`
    pub confidence: f64,
    /// Timestamp when the result was produced (or received, if the
    /// producer omits it)
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ClassificationEvent {
    /// Create a new event stamped with the current time.
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
            timestamp: Utc::now(),
        }
    }

    /// Whether the label is the benign one, under the strict producer contract.
    pub fn is_benign(&self) -> bool {
        self.label == BENIGN_LABEL
    }
}
