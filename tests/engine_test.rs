//! Integration tests for the decision engine driven through its public API.

use std::sync::Arc;

use facelive_decision_agent::{
    classify::ClassificationEvent,
    config::Config,
    core::{Conclusion, Decision, ManualScheduler, SessionState},
    engine::LivenessEngine,
};

fn engine() -> (Arc<ManualScheduler>, LivenessEngine) {
    let scheduler = Arc::new(ManualScheduler::new());
    let engine =
        LivenessEngine::new(&Config::default(), scheduler.clone()).expect("valid default config");
    (scheduler, engine)
}

fn feed(engine: &LivenessEngine, labels: &[&str], confidence: f64) {
    for label in labels {
        engine.on_event(ClassificationEvent::new(*label, confidence));
    }
}

#[test]
fn test_decision_stabilizes_over_majority() {
    let (_, engine) = engine();

    feed(
        &engine,
        &["real", "real", "real", "real", "print", "print", "print"],
        0.9,
    );
    assert_eq!(engine.decision(), Decision::LivenessConfirmed);

    engine.reset_decider();
    feed(
        &engine,
        &["print", "print", "print", "print", "real", "real", "real"],
        0.9,
    );
    assert_eq!(engine.decision(), Decision::SpoofDetected);
}

#[test]
fn test_partial_window_stays_uncertain() {
    let (_, engine) = engine();
    feed(&engine, &["real"; 6], 0.99);
    assert_eq!(engine.decision(), Decision::Uncertain);
}

#[test]
fn test_deadline_and_manual_stop_produce_equivalent_reports() {
    let labels = [
        "real", "real", "real", "real", "real", "real", "print", "print", "replay", "replay",
    ];

    let (_, stopped) = engine();
    stopped.start_session(30);
    feed(&stopped, &labels, 0.8);
    stopped.stop_session();
    let manual = stopped.report().expect("manual report");

    let (scheduler, expired) = engine();
    expired.start_session(30);
    feed(&expired, &labels, 0.8);
    assert_eq!(scheduler.fire_once_tasks(), 1);
    let by_deadline = expired.report().expect("deadline report");

    // Identical accumulated events must aggregate identically regardless of
    // how the episode ended
    assert_eq!(manual.total, by_deadline.total);
    assert_eq!(manual.benign_count, by_deadline.benign_count);
    assert_eq!(manual.print_attack_count, by_deadline.print_attack_count);
    assert_eq!(manual.replay_attack_count, by_deadline.replay_attack_count);
    assert_eq!(manual.unknown_count, by_deadline.unknown_count);
    assert_eq!(manual.mean_confidence, by_deadline.mean_confidence);
    assert_eq!(manual.conclusion, by_deadline.conclusion);

    assert_eq!(manual.total, 10);
    assert_eq!(manual.benign_count, 6);
    assert_eq!(manual.conclusion, Conclusion::Liveness);
}

#[test]
fn test_double_stop_yields_one_stable_report() {
    let (_, engine) = engine();
    engine.start_session(10);
    feed(&engine, &["real", "print"], 0.7);

    engine.stop_session();
    let first = engine.report().expect("first read");
    engine.stop_session();
    let second = engine.report().expect("second read");

    assert_eq!(first, second);
    assert_eq!(engine.audit_stats().sessions_completed, 1);
}

#[test]
fn test_empty_session_concludes_spoofing() {
    let (scheduler, engine) = engine();
    engine.start_session(5);
    scheduler.fire_once_tasks();

    let report = engine.report().expect("report");
    assert_eq!(report.total, 0);
    assert_eq!(report.mean_confidence, 0.0);
    assert_eq!(report.conclusion, Conclusion::Spoofing);
}

#[test]
fn test_category_counts_sum_to_total() {
    let (_, engine) = engine();
    engine.start_session(10);
    feed(
        &engine,
        &["real", "live", "benign", "print", "printout", "replay", "mask", "???"],
        0.5,
    );
    engine.stop_session();

    let report = engine.report().expect("report");
    assert_eq!(report.total, 8);
    assert_eq!(
        report.benign_count
            + report.print_attack_count
            + report.replay_attack_count
            + report.unknown_count,
        report.total
    );
    assert_eq!(report.benign_count, 3);
    assert_eq!(report.print_attack_count, 2);
    assert_eq!(report.replay_attack_count, 1);
    assert_eq!(report.unknown_count, 2);
}

#[test]
fn test_decider_and_session_consume_the_same_feed_independently() {
    let (_, engine) = engine();

    // Window fills before any session exists
    feed(&engine, &["print"; 7], 0.9);
    assert_eq!(engine.decision(), Decision::SpoofDetected);
    assert_eq!(engine.session_state(), SessionState::Idle);

    // Session only sees events delivered while collecting
    engine.start_session(10);
    feed(&engine, &["real"; 3], 0.9);
    engine.stop_session();

    let report = engine.report().expect("report");
    assert_eq!(report.total, 3);
    assert_eq!(report.benign_count, 3);
    // The decider window still reflects the whole feed
    assert_eq!(engine.window_fill(), 7);
}

#[test]
fn test_restart_discards_stale_episode() {
    let (scheduler, engine) = engine();

    engine.start_session(10);
    feed(&engine, &["print"; 4], 0.9);

    // Restart before the first deadline; the stale timer must not finalize
    // the new episode with old events
    engine.start_session(10);
    feed(&engine, &["real"; 2], 0.9);
    scheduler.fire_once_tasks();

    let report = engine.report().expect("report");
    assert_eq!(report.total, 2);
    assert_eq!(report.benign_count, 2);
    assert_eq!(report.conclusion, Conclusion::Liveness);
}
