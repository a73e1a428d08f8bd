//! Demonstration of the Facelive Decision Agent pipeline.
//!
//! This example shows how to:
//! 1. Build an engine from configuration
//! 2. Start a timed collection session
//! 3. Push a synthetic classifier result stream
//! 4. Watch the sliding-window decision stabilize
//! 5. Read the final session report
//!
//! Run with: cargo run --example replay_demo

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use facelive_decision_agent::{
    classify::ClassificationEvent,
    config::Config,
    core::ThreadScheduler,
    engine::LivenessEngine,
    VERSION,
};

fn main() {
    println!("Facelive Decision Agent - Replay Demo");
    println!("=====================================");
    println!("Version: {VERSION}");
    println!();

    let config = Config::default();
    let scheduler = Arc::new(ThreadScheduler::new());
    let engine = match LivenessEngine::new(&config, scheduler) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error building engine: {e}");
            return;
        }
    };

    engine.set_tick_handler(|remaining| {
        println!("  countdown: {remaining}s remaining");
    });

    // A genuine user in front of the camera, with occasional misreads,
    // followed by a print attack held up mid-session
    let stream: &[(&str, f64)] = &[
        ("real", 0.96),
        ("real", 0.94),
        ("print", 0.51),
        ("real", 0.97),
        ("real", 0.92),
        ("real", 0.95),
        ("real", 0.93),
        ("real", 0.96),
        ("print", 0.88),
        ("print", 0.91),
        ("print", 0.86),
        ("print", 0.90),
        ("print", 0.87),
        ("replay", 0.64),
    ];

    println!("Starting a 3 second collection session...");
    println!();
    engine.start_session(3);

    for &(label, confidence) in stream {
        engine.on_event(ClassificationEvent::new(label, confidence));
        println!(
            "  {label:>7} ({confidence:.2}) -> decision: {:?}",
            engine.decision()
        );
        // Roughly the observed producer rate
        thread::sleep(Duration::from_millis(200));
    }

    // Let the deadline fire
    thread::sleep(Duration::from_millis(500));

    println!();
    match engine.report() {
        Some(report) => {
            println!("=== Session Report ===");
            println!("  Events: {}", report.total);
            println!(
                "  Benign: {} | Print: {} | Replay: {} | Unknown: {}",
                report.benign_count,
                report.print_attack_count,
                report.replay_attack_count,
                report.unknown_count
            );
            println!("  Mean confidence: {:.3}", report.mean_confidence);
            println!("  Conclusion: {:?}", report.conclusion);
        }
        None => println!("Session still running (unexpected)"),
    }

    println!();
    println!("{}", engine.audit().summary());
    println!();
    println!("Demo complete!");
}
