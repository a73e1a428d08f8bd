//! Engine facade tying the decider, the collection session and the audit
//! log behind the single control surface a host integrates against.
//!
//! One `on_event` call fans a classification result out to everything that
//! consumes it; everything else is queries and session control. The engine
//! uses interior mutability throughout so a single value can be shared with
//! timer threads and, under the `server` feature, HTTP handlers.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::audit::{AuditLog, AuditStats, SharedAuditLog};
use crate::classify::ClassificationEvent;
use crate::config::{Config, ConfigError};
use crate::core::decider::{Decision, SlidingWindowDecider};
use crate::core::scheduler::Scheduler;
use crate::core::session::{CollectionReport, CollectionSession, SessionState};

/// Liveness decision engine.
pub struct LivenessEngine {
    decider: Mutex<SlidingWindowDecider>,
    session: CollectionSession,
    audit: SharedAuditLog,
    default_session_secs: u64,
}

impl LivenessEngine {
    /// Build an engine from a validated configuration.
    pub fn new(config: &Config, scheduler: Arc<dyn Scheduler>) -> Result<Self, ConfigError> {
        Self::with_audit(config, scheduler, Arc::new(AuditLog::new()))
    }

    /// Build an engine that persists audit counters under the config's data path.
    pub fn with_persistence(
        config: &Config,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self, ConfigError> {
        let audit = Arc::new(AuditLog::with_persistence(
            config.data_path.join("audit.json"),
        ));
        Self::with_audit(config, scheduler, audit)
    }

    fn with_audit(
        config: &Config,
        scheduler: Arc<dyn Scheduler>,
        audit: SharedAuditLog,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let decider = SlidingWindowDecider::new(config.window_size, config.real_threshold)?;

        let session = CollectionSession::new(scheduler);
        // Completion runs on both the stop and the deadline-expiry path
        let completion_audit = audit.clone();
        session.set_completion_handler(move |report| {
            completion_audit.record_session_completed(report.conclusion);
        });

        Ok(Self {
            decider: Mutex::new(decider),
            session,
            audit,
            default_session_secs: config.session_duration_secs,
        })
    }

    fn decider(&self) -> MutexGuard<'_, SlidingWindowDecider> {
        self.decider
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Push entry point: feed one classification result to the audit
    /// counters, the sliding-window decider and (when collecting) the
    /// session.
    pub fn on_event(&self, event: ClassificationEvent) {
        self.audit.record_event(&event.label);
        self.decider().add_event(&event.label);
        self.session.on_event(event);
    }

    /// Current sliding-window decision.
    pub fn decision(&self) -> Decision {
        self.decider().decide()
    }

    /// How many labels the decision window currently holds.
    pub fn window_fill(&self) -> usize {
        self.decider().len()
    }

    /// Start a collection session with the given duration.
    pub fn start_session(&self, duration_secs: u64) {
        self.audit.record_session_started();
        self.session.start(duration_secs);
    }

    /// Start a collection session with the configured default duration.
    pub fn start_default_session(&self) {
        self.start_session(self.default_session_secs);
    }

    /// Stop the running session. Idempotent; completion accounting happens
    /// in the session's completion handler.
    pub fn stop_session(&self) {
        self.session.stop();
    }

    /// Abandon the running session without a report.
    pub fn cancel_session(&self) {
        self.session.cancel();
    }

    /// Lifecycle state of the collection session.
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Report of the most recently completed session, if any.
    pub fn report(&self) -> Option<CollectionReport> {
        self.session.report()
    }

    /// Whole seconds left in the running session.
    pub fn remaining_secs(&self) -> Option<u64> {
        self.session.remaining_secs()
    }

    /// Clear the decision window back to cold start.
    pub fn reset_decider(&self) {
        self.decider().reset();
    }

    /// Register a countdown listener on the session.
    pub fn set_tick_handler(&self, handler: impl Fn(u64) + Send + Sync + 'static) {
        self.session.set_tick_handler(handler);
    }

    /// Register a completion listener. The engine's audit accounting stays
    /// in front of it, so hosts can observe reports without re-wiring it.
    pub fn set_completion_handler(
        &self,
        handler: impl Fn(CollectionReport) + Send + Sync + 'static,
    ) {
        let audit = self.audit.clone();
        self.session.set_completion_handler(move |report| {
            audit.record_session_completed(report.conclusion);
            handler(report);
        });
    }

    /// Snapshot of the audit counters.
    pub fn audit_stats(&self) -> AuditStats {
        self.audit.stats()
    }

    /// Shared handle to the audit log (for persistence at shutdown).
    pub fn audit(&self) -> SharedAuditLog {
        self.audit.clone()
    }

    /// Direct access to the session, for hosts that drive it themselves.
    pub fn session(&self) -> &CollectionSession {
        &self.session
    }
}
