//! Audit module for the Facelive Decision Agent.
//!
//! Exposes what the agent has processed (event and session counts,
//! conclusion tallies) without retaining any event payloads.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, AuditLog, AuditStats, SharedAuditLog,
};
