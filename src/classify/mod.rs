//! Classification event model for the Facelive Decision Agent.
//!
//! This module defines the data unit pushed in by the external inference
//! service and the fixed taxonomy used when aggregating those events.

pub mod category;
pub mod types;

// Re-export commonly used types
pub use category::{categorize, Category};
pub use types::{ClassificationEvent, BENIGN_LABEL};
