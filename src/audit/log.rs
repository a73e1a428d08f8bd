//! Audit log of what the agent has processed.
//!
//! Tracks counts of events per category, session activity and report
//! outcomes without retaining any event payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::classify::{categorize, Category};
use crate::core::session::Conclusion;

/// Audit counters for the agent's lifetime.
#[derive(Debug)]
pub struct AuditLog {
    /// Number of classification events received
    events_received: AtomicU64,
    /// Events categorized as benign
    benign_events: AtomicU64,
    /// Events categorized as print attacks
    print_attack_events: AtomicU64,
    /// Events categorized as replay attacks
    replay_attack_events: AtomicU64,
    /// Events outside the known taxonomy
    unknown_events: AtomicU64,
    /// Number of collection sessions started
    sessions_started: AtomicU64,
    /// Number of collection sessions that produced a report
    sessions_completed: AtomicU64,
    /// Completed sessions that concluded liveness
    liveness_conclusions: AtomicU64,
    /// Completed sessions that concluded spoofing
    spoofing_conclusions: AtomicU64,
    /// Agent start time
    agent_start: DateTime<Utc>,
    /// Path for persisting counters
    persist_path: Option<PathBuf>,
}

impl AuditLog {
    /// Create a new audit log.
    pub fn new() -> Self {
        Self {
            events_received: AtomicU64::new(0),
            benign_events: AtomicU64::new(0),
            print_attack_events: AtomicU64::new(0),
            replay_attack_events: AtomicU64::new(0),
            unknown_events: AtomicU64::new(0),
            sessions_started: AtomicU64::new(0),
            sessions_completed: AtomicU64::new(0),
            liveness_conclusions: AtomicU64::new(0),
            spoofing_conclusions: AtomicU64::new(0),
            agent_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create an audit log with persistence.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        // Try to load existing counters
        if let Err(e) = log.load() {
            eprintln!("Note: Could not load previous audit counters: {e}");
        }

        log
    }

    /// Record a received event under its category.
    pub fn record_event(&self, label: &str) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
        match categorize(label) {
            Category::Benign => self.benign_events.fetch_add(1, Ordering::Relaxed),
            Category::PrintAttack => self.print_attack_events.fetch_add(1, Ordering::Relaxed),
            Category::ReplayAttack => self.replay_attack_events.fetch_add(1, Ordering::Relaxed),
            Category::Unknown => self.unknown_events.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Record a session start.
    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed session and its conclusion.
    pub fn record_session_completed(&self, conclusion: Conclusion) {
        self.sessions_completed.fetch_add(1, Ordering::Relaxed);
        match conclusion {
            Conclusion::Liveness => self.liveness_conclusions.fetch_add(1, Ordering::Relaxed),
            Conclusion::Spoofing => self.spoofing_conclusions.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Get the current counters.
    pub fn stats(&self) -> AuditStats {
        AuditStats {
            events_received: self.events_received.load(Ordering::Relaxed),
            benign_events: self.benign_events.load(Ordering::Relaxed),
            print_attack_events: self.print_attack_events.load(Ordering::Relaxed),
            replay_attack_events: self.replay_attack_events.load(Ordering::Relaxed),
            unknown_events: self.unknown_events.load(Ordering::Relaxed),
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            sessions_completed: self.sessions_completed.load(Ordering::Relaxed),
            liveness_conclusions: self.liveness_conclusions.load(Ordering::Relaxed),
            spoofing_conclusions: self.spoofing_conclusions.load(Ordering::Relaxed),
            agent_start: self.agent_start,
            uptime_secs: (Utc::now() - self.agent_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Agent Statistics:\n\
             - Events received: {}\n\
             - Benign: {} | Print: {} | Replay: {} | Unknown: {}\n\
             - Sessions started: {}\n\
             - Sessions completed: {}\n\
             - Conclusions: {} liveness, {} spoofing\n\
             - Uptime: {} seconds",
            stats.events_received,
            stats.benign_events,
            stats.print_attack_events,
            stats.replay_attack_events,
            stats.unknown_events,
            stats.sessions_started,
            stats.sessions_completed,
            stats.liveness_conclusions,
            stats.spoofing_conclusions,
            stats.uptime_secs
        )
    }

    /// Save counters to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedCounters {
                events_received: stats.events_received,
                benign_events: stats.benign_events,
                print_attack_events: stats.print_attack_events,
                replay_attack_events: stats.replay_attack_events,
                unknown_events: stats.unknown_events,
                sessions_started: stats.sessions_started,
                sessions_completed: stats.sessions_completed,
                liveness_conclusions: stats.liveness_conclusions,
                spoofing_conclusions: stats.spoofing_conclusions,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load counters from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedCounters =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.events_received
                    .store(persisted.events_received, Ordering::Relaxed);
                self.benign_events
                    .store(persisted.benign_events, Ordering::Relaxed);
                self.print_attack_events
                    .store(persisted.print_attack_events, Ordering::Relaxed);
                self.replay_attack_events
                    .store(persisted.replay_attack_events, Ordering::Relaxed);
                self.unknown_events
                    .store(persisted.unknown_events, Ordering::Relaxed);
                self.sessions_started
                    .store(persisted.sessions_started, Ordering::Relaxed);
                self.sessions_completed
                    .store(persisted.sessions_completed, Ordering::Relaxed);
                self.liveness_conclusions
                    .store(persisted.liveness_conclusions, Ordering::Relaxed);
                self.spoofing_conclusions
                    .store(persisted.spoofing_conclusions, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.events_received.store(0, Ordering::Relaxed);
        self.benign_events.store(0, Ordering::Relaxed);
        self.print_attack_events.store(0, Ordering::Relaxed);
        self.replay_attack_events.store(0, Ordering::Relaxed);
        self.unknown_events.store(0, Ordering::Relaxed);
        self.sessions_started.store(0, Ordering::Relaxed);
        self.sessions_completed.store(0, Ordering::Relaxed);
        self.liveness_conclusions.store(0, Ordering::Relaxed);
        self.spoofing_conclusions.store(0, Ordering::Relaxed);
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of audit counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub events_received: u64,
    pub benign_events: u64,
    pub print_attack_events: u64,
    pub replay_attack_events: u64,
    pub unknown_events: u64,
    pub sessions_started: u64,
    pub sessions_completed: u64,
    pub liveness_conclusions: u64,
    pub spoofing_conclusions: u64,
    pub agent_start: DateTime<Utc>,
    pub uptime_secs: u64,
}

/// Counter format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedCounters {
    events_received: u64,
    benign_events: u64,
    print_attack_events: u64,
    replay_attack_events: u64,
    unknown_events: u64,
    sessions_started: u64,
    sessions_completed: u64,
    liveness_conclusions: u64,
    spoofing_conclusions: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared audit log.
pub type SharedAuditLog = Arc<AuditLog>;

/// Create a new shared audit log.
pub fn create_shared_log() -> SharedAuditLog {
    Arc::new(AuditLog::new())
}

/// Create a new shared audit log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedAuditLog {
    Arc::new(AuditLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_counting_by_category() {
        let log = AuditLog::new();

        log.record_event("real");
        log.record_event("live");
        log.record_event("print");
        log.record_event("replay");
        log.record_event("mask");

        let stats = log.stats();
        assert_eq!(stats.events_received, 5);
        assert_eq!(stats.benign_events, 2);
        assert_eq!(stats.print_attack_events, 1);
        assert_eq!(stats.replay_attack_events, 1);
        assert_eq!(stats.unknown_events, 1);
    }

    #[test]
    fn test_session_counters() {
        let log = AuditLog::new();

        log.record_session_started();
        log.record_session_started();
        log.record_session_completed(Conclusion::Liveness);
        log.record_session_completed(Conclusion::Spoofing);

        let stats = log.stats();
        assert_eq!(stats.sessions_started, 2);
        assert_eq!(stats.sessions_completed, 2);
        assert_eq!(stats.liveness_conclusions, 1);
        assert_eq!(stats.spoofing_conclusions, 1);
    }

    #[test]
    fn test_reset() {
        let log = AuditLog::new();
        log.record_event("real");
        log.record_session_started();
        log.reset();

        let stats = log.stats();
        assert_eq!(stats.events_received, 0);
        assert_eq!(stats.sessions_started, 0);
    }

    #[test]
    fn test_summary_format() {
        let log = AuditLog::new();
        log.record_event("print");
        let summary = log.summary();

        assert!(summary.contains("Events received: 1"));
        assert!(summary.contains("Sessions started"));
        assert!(summary.contains("Conclusions"));
    }
}
