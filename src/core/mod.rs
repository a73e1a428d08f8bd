//! Core decision logic for the Facelive Decision Agent.
//!
//! This module contains:
//! - The sliding-window majority-vote decider for real-time decisions
//! - The timed collection session and its aggregate report
//! - The cancelable-timer abstraction the session schedules through

pub mod decider;
pub mod scheduler;
pub mod session;

// Re-export commonly used types
pub use decider::{Decision, SlidingWindowDecider, DEFAULT_REAL_THRESHOLD, DEFAULT_WINDOW_SIZE};
pub use scheduler::{ManualScheduler, Scheduler, TaskHandle, ThreadScheduler};
pub use session::{
    CollectionReport, CollectionSession, CompletionHandler, Conclusion, SessionState, TickHandler,
};
