//! Sliding-window majority vote over recent classification labels.
//!
//! Per-frame classifier output flickers; the decider only commits to a
//! liveness or spoof call once one side reaches a fixed count threshold
//! within the most recent `window_size` labels.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::classify::BENIGN_LABEL;
use crate::config::ConfigError;

/// Default number of recent labels the decider votes over.
pub const DEFAULT_WINDOW_SIZE: usize = 7;

/// Default count either side needs to win the vote.
pub const DEFAULT_REAL_THRESHOLD: usize = 4;

/// Tri-state outcome of the sliding-window vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Not enough evidence either way (cold start, post-reset, or a split window)
    Uncertain,
    /// At least `real_threshold` of the window is benign
    LivenessConfirmed,
    /// At least `real_threshold` of the window is non-benign
    SpoofDetected,
}

/// Majority-vote decider over a bounded FIFO of recent labels.
///
/// The window holds at most `window_size` entries; pushing past capacity
/// evicts the oldest in the same operation. Requires
/// `real_threshold > window_size / 2` so the two confirmed outcomes are
/// mutually exclusive; construction fails otherwise.
#[derive(Debug)]
pub struct SlidingWindowDecider {
    /// Benign flag per label, oldest first
    window: VecDeque<bool>,
    window_size: usize,
    real_threshold: usize,
}

impl SlidingWindowDecider {
    /// Create a decider with explicit window size and vote threshold.
    pub fn new(window_size: usize, real_threshold: usize) -> Result<Self, ConfigError> {
        if window_size == 0 {
            return Err(ConfigError::InvalidDeciderParams(
                "window size must be at least 1".to_string(),
            ));
        }
        if real_threshold <= window_size / 2 || real_threshold > window_size {
            return Err(ConfigError::InvalidDeciderParams(format!(
                "threshold {real_threshold} must exceed half the window size {window_size} \
                 and not exceed it"
            )));
        }

        Ok(Self {
            window: VecDeque::with_capacity(window_size),
            window_size,
            real_threshold,
        })
    }

    /// Push a label into the window, evicting the oldest entry past capacity.
    ///
    /// Any string is accepted; only exact equality with `"real"` counts as
    /// benign (case-sensitive producer contract). Everything else is a vote
    /// for the spoof side.
    pub fn add_event(&mut self, label: &str) {
        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(label == BENIGN_LABEL);
    }

    /// Derive the decision from the current window contents.
    pub fn decide(&self) -> Decision {
        if self.window.len() < self.window_size {
            return Decision::Uncertain;
        }

        let real_count = self.window.iter().filter(|&&is_real| is_real).count();
        let spoof_count = self.window_size - real_count;

        if real_count >= self.real_threshold {
            Decision::LivenessConfirmed
        } else if spoof_count >= self.real_threshold {
            Decision::SpoofDetected
        } else {
            Decision::Uncertain
        }
    }

    /// Clear the window back to the cold-start state.
    pub fn reset(&mut self) {
        self.window.clear();
    }

    /// Number of labels currently held.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Configured window capacity.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Configured vote threshold.
    pub fn real_threshold(&self) -> usize {
        self.real_threshold
    }
}

impl Default for SlidingWindowDecider {
    fn default() -> Self {
        // Defaults satisfy the threshold invariant
        Self::new(DEFAULT_WINDOW_SIZE, DEFAULT_REAL_THRESHOLD)
            .expect("default decider parameters are valid")
    }
}
