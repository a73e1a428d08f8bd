//! Facelive Decision Agent - stabilized liveness decisions from noisy
//! classifier streams.
//!
//! An external face anti-spoofing model emits one classification result per
//! frame (`real`, `print`, `replay`, ... with a confidence score). Frame-level
//! output flickers; this library turns it into two stable signals:
//!
//! - a real-time tri-state decision from a sliding-window majority vote
//! - a timed collection session that aggregates a fixed-duration episode
//!   into category counts and a single liveness/spoofing conclusion
//!
//! The core is a deterministic function of the event sequence it is fed.
//! Frame capture, the model itself, result transport and rendering are all
//! external collaborators; the crate only ships thin adapters for them (a
//! JSONL replay CLI, an optional HTTP ingest server).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Facelive Decision Agent                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌──────────────┐   ┌─────────────┐      │
//! │  │  Classifier │──▶│   Sliding    │──▶│  Decision   │      │
//! │  │   results   │   │   window     │   │ (tri-state) │      │
//! │  └─────────────┘   └──────────────┘   └─────────────┘      │
//! │         │                                                   │
//! │         ▼                                                   │
//! │  ┌─────────────┐   ┌──────────────┐   ┌─────────────┐      │
//! │  │ Collection  │──▶│  Category    │──▶│   Report    │      │
//! │  │  session    │   │  tallies     │   │ (verdict)   │      │
//! │  └─────────────┘   └──────────────┘   └─────────────┘      │
//! │         ▲                                                   │
//! │  ┌─────────────┐                                            │
//! │  │  Scheduler  │  deadline + countdown tick (cancelable)    │
//! │  └─────────────┘                                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use facelive_decision_agent::{
//!     classify::ClassificationEvent,
//!     config::Config,
//!     core::{Decision, ManualScheduler},
//!     engine::LivenessEngine,
//! };
//!
//! let scheduler = Arc::new(ManualScheduler::new());
//! let engine = LivenessEngine::new(&Config::default(), scheduler).unwrap();
//!
//! engine.start_session(10);
//! for _ in 0..7 {
//!     engine.on_event(ClassificationEvent::new("real", 0.97));
//! }
//! assert_eq!(engine.decision(), Decision::LivenessConfirmed);
//!
//! engine.stop_session();
//! let report = engine.report().unwrap();
//! assert_eq!(report.benign_count, 7);
//! ```

pub mod audit;
pub mod classify;
pub mod config;
pub mod core;
pub mod engine;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use audit::{AuditLog, AuditStats, SharedAuditLog};
pub use classify::{categorize, Category, ClassificationEvent};
pub use config::{Config, ConfigError};
pub use core::{
    CollectionReport, CollectionSession, Conclusion, Decision, ManualScheduler, Scheduler,
    SessionState, SlidingWindowDecider, TaskHandle, ThreadScheduler,
};
pub use engine::LivenessEngine;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
