//! Timed collection session: a bounded-duration episode that aggregates raw
//! classifier results into category counts and a single conclusion.
//!
//! The session is a three-state machine (Idle → Collecting → Completed,
//! restartable from Completed). Leaving Collecting, by explicit stop or by
//! deadline expiry, runs one shared finalize path, so the report is computed
//! exactly once no matter how the episode ends.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use uuid::Uuid;

use crate::classify::{categorize, Category, ClassificationEvent};
use crate::core::scheduler::{Scheduler, TaskHandle};

/// Interval of the presentational countdown tick.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Collecting,
    Completed,
}

/// Binary verdict of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Liveness,
    Spoofing,
}

/// Aggregate of one completed collection episode.
///
/// Category counts always sum to `total`. An empty session concludes
/// `Spoofing`: absence of evidence is a failure to confirm liveness, not
/// liveness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionReport {
    /// Identifier of the episode this report summarizes
    pub session_id: Uuid,
    /// When the episode started
    pub started_at: DateTime<Utc>,
    /// When the episode was finalized
    pub completed_at: DateTime<Utc>,
    /// Number of events collected
    pub total: usize,
    pub benign_count: usize,
    pub print_attack_count: usize,
    pub replay_attack_count: usize,
    pub unknown_count: usize,
    /// Arithmetic mean of event confidences (0 for an empty session)
    pub mean_confidence: f64,
    pub conclusion: Conclusion,
}

impl CollectionReport {
    /// Aggregate a sequence of events into a report.
    pub fn from_events(
        events: &[ClassificationEvent],
        session_id: Uuid,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let total = events.len();

        if total == 0 {
            // Fail-safe default: no data never reads as liveness
            return Self {
                session_id,
                started_at,
                completed_at,
                total: 0,
                benign_count: 0,
                print_attack_count: 0,
                replay_attack_count: 0,
                unknown_count: 0,
                mean_confidence: 0.0,
                conclusion: Conclusion::Spoofing,
            };
        }

        let mut benign_count = 0;
        let mut print_attack_count = 0;
        let mut replay_attack_count = 0;
        let mut unknown_count = 0;

        for event in events {
            match categorize(&event.label) {
                Category::Benign => benign_count += 1,
                Category::PrintAttack => print_attack_count += 1,
                Category::ReplayAttack => replay_attack_count += 1,
                Category::Unknown => unknown_count += 1,
            }
        }

        let mean_confidence = events.iter().map(|e| e.confidence).mean();

        // Strict benign majority over the combined spoof categories;
        // Unknown is visible in the breakdown but votes for neither side.
        let conclusion = if benign_count > print_attack_count + replay_attack_count {
            Conclusion::Liveness
        } else {
            Conclusion::Spoofing
        };

        Self {
            session_id,
            started_at,
            completed_at,
            total,
            benign_count,
            print_attack_count,
            replay_attack_count,
            unknown_count,
            mean_confidence,
            conclusion,
        }
    }
}

/// Callback invoked once per second with the remaining whole seconds.
pub type TickHandler = Arc<dyn Fn(u64) + Send + Sync>;

/// Callback invoked with the report when an episode completes, whether by
/// explicit stop or deadline expiry.
pub type CompletionHandler = Arc<dyn Fn(CollectionReport) + Send + Sync>;

struct SessionInner {
    state: SessionState,
    events: Vec<ClassificationEvent>,
    session_id: Uuid,
    started_at: Option<DateTime<Utc>>,
    duration_secs: u64,
    report: Option<CollectionReport>,
    /// Bumped on every start; timers carry the epoch they were scheduled
    /// under and are inert once it no longer matches.
    epoch: u64,
    deadline_task: Option<Box<dyn TaskHandle>>,
    tick_task: Option<Box<dyn TaskHandle>>,
    tick_handler: Option<TickHandler>,
    completion_handler: Option<CompletionHandler>,
}

impl SessionInner {
    /// The single exit path from Collecting that produces a report.
    /// Idempotent: a second stop or a late deadline finds state != Collecting
    /// and returns None. The caller invokes the completion handler outside
    /// the lock.
    fn finalize(&mut self) -> Option<CollectionReport> {
        if self.state != SessionState::Collecting {
            return None;
        }

        // Dropping the handles cancels both timers
        self.deadline_task.take();
        self.tick_task.take();

        let completed_at = Utc::now();
        let started_at = self.started_at.unwrap_or(completed_at);
        let report = CollectionReport::from_events(
            &self.events,
            self.session_id,
            started_at,
            completed_at,
        );
        self.report = Some(report.clone());
        self.state = SessionState::Completed;
        Some(report)
    }

    fn remaining_secs(&self) -> Option<u64> {
        if self.state != SessionState::Collecting {
            return None;
        }
        let started = self.started_at?;
        let elapsed = (Utc::now() - started).num_seconds().max(0) as u64;
        Some(self.duration_secs.saturating_sub(elapsed))
    }

    fn elapsed_secs(&self) -> Option<u64> {
        if self.state != SessionState::Collecting {
            return None;
        }
        let started = self.started_at?;
        Some((Utc::now() - started).num_seconds().max(0) as u64)
    }
}

/// Timed aggregation episode over the classification event stream.
///
/// All episode state lives behind one lock, so event appends, state
/// transitions and timer callbacks never interleave into a half-updated
/// episode, including when the scheduler fires from another thread.
pub struct CollectionSession {
    inner: Arc<Mutex<SessionInner>>,
    scheduler: Arc<dyn Scheduler>,
}

impl CollectionSession {
    /// Create an idle session bound to a scheduler.
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                state: SessionState::Idle,
                events: Vec::new(),
                session_id: Uuid::new_v4(),
                started_at: None,
                duration_secs: 0,
                report: None,
                epoch: 0,
                deadline_task: None,
                tick_task: None,
                tick_handler: None,
                completion_handler: None,
            })),
            scheduler,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register a countdown listener. Presentational only; the decision
    /// contract does not depend on it.
    pub fn set_tick_handler(&self, handler: impl Fn(u64) + Send + Sync + 'static) {
        self.lock().tick_handler = Some(Arc::new(handler));
    }

    /// Register a listener for completed episodes. Runs on both the stop
    /// and the deadline-expiry path, after the report is committed.
    pub fn set_completion_handler(
        &self,
        handler: impl Fn(CollectionReport) + Send + Sync + 'static,
    ) {
        self.lock().completion_handler = Some(Arc::new(handler));
    }

    /// Begin a fresh collection episode of `duration_secs` seconds.
    ///
    /// Clears the previous episode's events and report and replaces both
    /// timer handles, which cancels any tasks still pending from an earlier
    /// episode. Calling `start` while already collecting restarts: the
    /// partial episode is discarded without a report.
    pub fn start(&self, duration_secs: u64) {
        let mut inner = self.lock();

        inner.epoch += 1;
        let epoch = inner.epoch;

        inner.events.clear();
        inner.report = None;
        inner.session_id = Uuid::new_v4();
        inner.started_at = Some(Utc::now());
        inner.duration_secs = duration_secs;
        inner.state = SessionState::Collecting;

        let deadline_ref: Weak<Mutex<SessionInner>> = Arc::downgrade(&self.inner);
        let deadline = self.scheduler.schedule_once(
            Duration::from_secs(duration_secs),
            Box::new(move || {
                let Some(inner) = deadline_ref.upgrade() else {
                    return;
                };
                let completed = {
                    let mut inner = inner
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    if inner.epoch != epoch {
                        return;
                    }
                    inner
                        .finalize()
                        .map(|report| (inner.completion_handler.clone(), report))
                };
                if let Some((Some(handler), report)) = completed {
                    handler(report);
                }
            }),
        );

        let tick_ref: Weak<Mutex<SessionInner>> = Arc::downgrade(&self.inner);
        let ticker = self.scheduler.schedule_repeating(
            TICK_INTERVAL,
            Box::new(move || {
                let Some(inner) = tick_ref.upgrade() else {
                    return;
                };
                // Read under the lock, invoke the handler outside it
                let snapshot = {
                    let inner = inner
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    if inner.epoch != epoch {
                        return;
                    }
                    inner
                        .remaining_secs()
                        .map(|remaining| (inner.tick_handler.clone(), remaining))
                };
                if let Some((Some(handler), remaining)) = snapshot {
                    handler(remaining);
                }
            }),
        );

        inner.deadline_task = Some(deadline);
        inner.tick_task = Some(ticker);
    }

    /// Append an event to the current episode. No-op unless collecting.
    /// Events are stored unfiltered; categorization happens at aggregation.
    pub fn on_event(&self, event: ClassificationEvent) {
        let mut inner = self.lock();
        if inner.state == SessionState::Collecting {
            inner.events.push(event);
        }
    }

    /// End the episode and compute its report. Idempotent; a deadline that
    /// already fired (or a second stop) finds nothing left to do.
    pub fn stop(&self) {
        let completed = {
            let mut inner = self.lock();
            inner
                .finalize()
                .map(|report| (inner.completion_handler.clone(), report))
        };
        if let Some((Some(handler), report)) = completed {
            handler(report);
        }
    }

    /// Abandon the episode without a report (external cancellation, e.g.
    /// capture was disabled). Returns to Idle.
    pub fn cancel(&self) {
        let mut inner = self.lock();
        if inner.state != SessionState::Collecting {
            return;
        }
        inner.deadline_task.take();
        inner.tick_task.take();
        inner.events.clear();
        inner.started_at = None;
        inner.state = SessionState::Idle;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Report of the most recently completed episode, if any.
    pub fn report(&self) -> Option<CollectionReport> {
        self.lock().report.clone()
    }

    /// Whole seconds left in the running episode.
    pub fn remaining_secs(&self) -> Option<u64> {
        self.lock().remaining_secs()
    }

    /// Whole seconds since the running episode started.
    pub fn elapsed_secs(&self) -> Option<u64> {
        self.lock().elapsed_secs()
    }

    /// Number of events collected so far in the running episode.
    pub fn event_count(&self) -> usize {
        self.lock().events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scheduler::ManualScheduler;

    fn session() -> (Arc<ManualScheduler>, CollectionSession) {
        let scheduler = Arc::new(ManualScheduler::new());
        let session = CollectionSession::new(scheduler.clone());
        (scheduler, session)
    }

    fn event(label: &str, confidence: f64) -> ClassificationEvent {
        ClassificationEvent::new(label, confidence)
    }

    #[test]
    fn test_initial_state_is_idle() {
        let (_, session) = session();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.report().is_none());
        assert!(session.remaining_secs().is_none());
    }

    #[test]
    fn test_events_ignored_unless_collecting() {
        let (scheduler, session) = session();

        session.on_event(event("real", 0.9));
        assert_eq!(session.event_count(), 0);

        session.start(10);
        session.on_event(event("real", 0.9));
        assert_eq!(session.event_count(), 1);

        scheduler.fire_once_tasks();
        session.on_event(event("real", 0.9));
        assert_eq!(session.report().map(|r| r.total), Some(1));
    }

    #[test]
    fn test_stop_produces_one_report_and_is_idempotent() {
        let (_, session) = session();
        session.start(10);
        session.on_event(event("real", 0.8));
        session.on_event(event("print", 0.6));

        session.stop();
        assert_eq!(session.state(), SessionState::Completed);
        let first = session.report().expect("report after stop");

        session.stop();
        let second = session.report().expect("report after double stop");
        assert_eq!(first, second);
    }

    #[test]
    fn test_deadline_expiry_matches_manual_stop() {
        let (scheduler, session) = session();
        session.start(10);
        for _ in 0..6 {
            session.on_event(event("real", 0.9));
        }
        for _ in 0..2 {
            session.on_event(event("print", 0.7));
        }
        for _ in 0..2 {
            session.on_event(event("replay", 0.7));
        }

        assert_eq!(scheduler.fire_once_tasks(), 1);
        assert_eq!(session.state(), SessionState::Completed);

        let report = session.report().expect("report after expiry");
        assert_eq!(report.total, 10);
        assert_eq!(report.benign_count, 6);
        assert_eq!(report.print_attack_count, 2);
        assert_eq!(report.replay_attack_count, 2);
        assert_eq!(report.conclusion, Conclusion::Liveness);

        // A stop after expiry must not aggregate a second time
        session.stop();
        assert_eq!(session.report().expect("stable report"), report);
    }

    #[test]
    fn test_mean_confidence_is_arithmetic_mean() {
        let (_, session) = session();
        session.start(10);
        session.on_event(event("real", 0.5));
        session.on_event(event("real", 0.7));
        session.on_event(event("print", 0.9));
        session.stop();

        let report = session.report().unwrap();
        assert!((report.mean_confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_empty_session_fails_safe() {
        let (scheduler, session) = session();
        session.start(5);
        scheduler.fire_once_tasks();

        let report = session.report().expect("empty report");
        assert_eq!(report.total, 0);
        assert_eq!(report.benign_count, 0);
        assert_eq!(report.mean_confidence, 0.0);
        assert_eq!(report.conclusion, Conclusion::Spoofing);
    }

    #[test]
    fn test_counts_always_sum_to_total() {
        let (_, session) = session();
        session.start(10);
        for label in ["real", "mask", "print", "replay", "live", "???", "Real"] {
            session.on_event(event(label, 0.5));
        }
        session.stop();

        let report = session.report().unwrap();
        assert_eq!(
            report.benign_count
                + report.print_attack_count
                + report.replay_attack_count
                + report.unknown_count,
            report.total
        );
        assert_eq!(report.total, 7);
    }

    #[test]
    fn test_unknown_excluded_from_conclusion() {
        let (_, session) = session();
        session.start(10);
        // 2 benign vs 1 print; 4 unknowns must not tip the vote
        for label in ["real", "live", "print", "a", "b", "c", "d"] {
            session.on_event(event(label, 0.5));
        }
        session.stop();

        let report = session.report().unwrap();
        assert_eq!(report.unknown_count, 4);
        assert_eq!(report.conclusion, Conclusion::Liveness);
    }

    #[test]
    fn test_tie_concludes_spoofing() {
        let (_, session) = session();
        session.start(10);
        for label in ["real", "real", "print", "replay"] {
            session.on_event(event(label, 0.5));
        }
        session.stop();

        // Strict majority required: 2 benign vs 2 spoof is not liveness
        assert_eq!(session.report().unwrap().conclusion, Conclusion::Spoofing);
    }

    #[test]
    fn test_restart_from_completed_clears_previous_episode() {
        let (scheduler, session) = session();
        session.start(10);
        session.on_event(event("print", 0.9));
        session.stop();
        assert!(session.report().is_some());

        session.start(10);
        assert_eq!(session.state(), SessionState::Collecting);
        assert_eq!(session.event_count(), 0);
        assert!(session.report().is_none());

        session.on_event(event("real", 0.9));
        scheduler.fire_once_tasks();
        let report = session.report().unwrap();
        assert_eq!(report.total, 1);
        assert_eq!(report.conclusion, Conclusion::Liveness);
    }

    #[test]
    fn test_stale_deadline_from_previous_episode_is_inert() {
        let (scheduler, session) = session();
        session.start(10);
        session.on_event(event("print", 0.9));

        // Restart before the first deadline fires
        session.start(10);
        session.on_event(event("real", 0.9));

        // Both queued deadline tasks fire; the first was cancelled by handle
        // replacement, and its epoch no longer matches either way
        scheduler.fire_once_tasks();

        let report = session.report().expect("second episode report");
        assert_eq!(report.total, 1);
        assert_eq!(report.benign_count, 1);
    }

    #[test]
    fn test_cancel_discards_without_report() {
        let (scheduler, session) = session();
        session.start(10);
        session.on_event(event("real", 0.9));

        session.cancel();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.report().is_none());
        assert_eq!(session.event_count(), 0);

        // The cancelled episode's timers are dead
        assert_eq!(scheduler.fire_once_tasks(), 0);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_tick_handler_reads_remaining() {
        let (scheduler, session) = session();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        session.set_tick_handler(move |remaining| {
            sink.lock().unwrap().push(remaining);
        });

        session.start(30);
        scheduler.fire_tick();
        scheduler.fire_tick();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        for remaining in seen.iter() {
            assert!(*remaining <= 30);
        }
    }

    #[test]
    fn test_tick_stops_after_completion() {
        let (scheduler, session) = session();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        session.set_tick_handler(move |remaining| {
            sink.lock().unwrap().push(remaining);
        });

        session.start(30);
        session.stop();

        assert_eq!(scheduler.fire_tick(), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_completion_handler_runs_once_per_episode() {
        let (scheduler, session) = session();
        let completions = Arc::new(Mutex::new(Vec::new()));
        let sink = completions.clone();
        session.set_completion_handler(move |report| {
            sink.lock().unwrap().push(report.total);
        });

        session.start(10);
        session.on_event(event("real", 0.9));
        session.stop();
        session.stop();
        scheduler.fire_once_tasks();

        let completions = completions.lock().unwrap();
        assert_eq!(completions.as_slice(), &[1]);
    }

    #[test]
    fn test_completion_handler_runs_on_expiry() {
        let (scheduler, session) = session();
        let completions = Arc::new(Mutex::new(Vec::new()));
        let sink = completions.clone();
        session.set_completion_handler(move |report| {
            sink.lock().unwrap().push(report.conclusion);
        });

        session.start(10);
        scheduler.fire_once_tasks();

        assert_eq!(
            completions.lock().unwrap().as_slice(),
            &[Conclusion::Spoofing]
        );
    }

    #[test]
    fn test_reports_get_fresh_session_ids() {
        let (_, session) = session();
        session.start(10);
        session.stop();
        let first = session.report().unwrap().session_id;

        session.start(10);
        session.stop();
        let second = session.report().unwrap().session_id;
        assert_ne!(first, second);
    }
}
