//! Facelive Decision Agent CLI
//!
//! Turns a stream of per-frame anti-spoofing classifier results into
//! stabilized liveness decisions and timed session verdicts.

use clap::{Parser, Subcommand};
use facelive_decision_agent::{
    classify::ClassificationEvent,
    config::Config,
    core::{Decision, ThreadScheduler},
    engine::LivenessEngine,
    VERSION,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "facelive-agent")]
#[command(author = "Facelive")]
#[command(version = VERSION)]
#[command(about = "Stabilized liveness decisions from classifier result streams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed a JSONL stream of classifier results through the engine
    Run {
        /// Input file with one result per line (stdin when omitted)
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Collection session length in seconds (config default when omitted)
        #[arg(long)]
        duration: Option<u64>,

        /// Override the decision window size
        #[arg(long)]
        window_size: Option<usize>,

        /// Override the vote threshold
        #[arg(long)]
        threshold: Option<usize>,

        /// Delay between replayed events in milliseconds (0 = no pacing)
        #[arg(long, default_value = "0")]
        interval_ms: u64,

        /// Only run the sliding-window decider, no collection session
        #[arg(long)]
        no_session: bool,
    },

    /// Serve the HTTP ingest and control API (requires the server feature)
    Serve {
        /// Port to bind to
        #[arg(long, default_value = "8787")]
        port: u16,
    },

    /// Show cumulative agent statistics
    Status,

    /// Show configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            duration,
            window_size,
            threshold,
            interval_ms,
            no_session,
        } => {
            cmd_run(input, duration, window_size, threshold, interval_ms, no_session);
        }
        Commands::Serve { port } => {
            cmd_serve(port);
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

fn cmd_run(
    input: Option<PathBuf>,
    duration: Option<u64>,
    window_size: Option<usize>,
    threshold: Option<usize>,
    interval_ms: u64,
    no_session: bool,
) {
    println!("Facelive Decision Agent v{VERSION}");
    println!();

    // Load configuration and apply overrides
    let mut config = Config::load().unwrap_or_default();
    if let Some(size) = window_size {
        config.window_size = size;
    }
    if let Some(t) = threshold {
        config.real_threshold = t;
    }
    if let Some(secs) = duration {
        config.session_duration_secs = secs;
    }
    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    println!("Starting decision engine...");
    println!("  Window size: {}", config.window_size);
    println!("  Vote threshold: {}", config.real_threshold);
    if no_session {
        println!("  Collection session: disabled");
    } else {
        println!("  Session duration: {}s", config.session_duration_secs);
    }
    println!();

    let scheduler = Arc::new(ThreadScheduler::new());
    let engine = match LivenessEngine::with_persistence(&config, scheduler) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            eprintln!("Error building engine: {e}");
            std::process::exit(1);
        }
    };

    engine.set_tick_handler(|remaining| {
        println!("  ... {remaining}s remaining");
    });
    engine.set_completion_handler(|report| {
        println!();
        println!("=== Session Report ===");
        println!("  Session: {}", report.session_id);
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
        println!();
    });

    // Reader thread pushes parsed events over a channel, matching the
    // push-style delivery the engine is built for
    let (event_tx, event_rx) = crossbeam_channel::unbounded::<ClassificationEvent>();
    // Detached: a reader blocked on interactive stdin dies with the process
    thread::spawn(move || {
        let source: Box<dyn BufRead> = match input {
            Some(path) => match std::fs::File::open(&path) {
                Ok(file) => Box::new(std::io::BufReader::new(file)),
                Err(e) => {
                    eprintln!("Error opening {path:?}: {e}");
                    return;
                }
            },
            None => Box::new(std::io::BufReader::new(std::io::stdin())),
        };

        for line in source.lines() {
            let Ok(line) = line else { break };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<ClassificationEvent>(trimmed) {
                Ok(event) => {
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    eprintln!("Warning: skipping malformed result line: {e}");
                }
            }
            if interval_ms > 0 {
                thread::sleep(Duration::from_millis(interval_ms));
            }
        }
    });

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    if !no_session {
        engine.start_default_session();
        println!(
            "Collecting for {}s (Ctrl+C to stop early)",
            config.session_duration_secs
        );
        println!();
    }

    // Main event loop
    let mut last_decision = engine.decision();
    let mut event_count = 0u64;

    while running.load(Ordering::SeqCst) {
        match event_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                event_count += 1;
                engine.on_event(event);

                let decision = engine.decision();
                if decision != last_decision {
                    let marker = match decision {
                        Decision::LivenessConfirmed => "LIVE ",
                        Decision::SpoofDetected => "SPOOF",
                        Decision::Uncertain => "  ?  ",
                    };
                    println!("[{marker}] after {event_count} events");
                    last_decision = decision;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                // Input exhausted
                break;
            }
        }
    }

    // Close out the session if the input ended before the deadline
    engine.stop_session();

    println!(
        "Processed {event_count} events, final decision: {:?}",
        engine.decision()
    );

    // Persist audit counters
    if let Err(e) = engine.audit().save() {
        eprintln!("Warning: Could not save audit counters: {e}");
    }

    println!();
    println!("{}", engine.audit().summary());
}

#[cfg(feature = "server")]
fn cmd_serve(port: u16) {
    use facelive_decision_agent::server::{run, ServerConfig};

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::load().unwrap_or_default();
    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let result: anyhow::Result<()> = (|| {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(async {
            let (addr, shutdown_tx) = run(ServerConfig::new(port, config)).await?;
            println!("Facelive Decision Agent v{VERSION}");
            println!("Listening on http://{addr}");
            println!("Press Ctrl+C to stop");

            tokio::signal::ctrl_c().await?;
            let _ = shutdown_tx.send(());
            Ok(())
        })
    })();

    if let Err(e) = result {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "server"))]
fn cmd_serve(_port: u16) {
    eprintln!("Error: the serve command requires the server feature.");
    eprintln!("Rebuild with: cargo build --features server");
    std::process::exit(1);
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Facelive Decision Agent Status");
    println!("==============================");
    println!();

    println!("Configuration:");
    println!("  Window size: {}", config.window_size);
    println!("  Vote threshold: {}", config.real_threshold);
    println!("  Session duration: {}s", config.session_duration_secs);
    println!();

    // Load and show audit counters if available
    let audit_path = config.data_path.join("audit.json");
    if audit_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&audit_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                if let Some(events) = stats.get("events_received") {
                    println!("  Events received: {events}");
                }
                if let Some(benign) = stats.get("benign_events") {
                    println!("  Benign events: {benign}");
                }
                if let Some(print) = stats.get("print_attack_events") {
                    println!("  Print attack events: {print}");
                }
                if let Some(replay) = stats.get("replay_attack_events") {
                    println!("  Replay attack events: {replay}");
                }
                if let Some(unknown) = stats.get("unknown_events") {
                    println!("  Unknown events: {unknown}");
                }
                if let Some(sessions) = stats.get("sessions_completed") {
                    println!("  Sessions completed: {sessions}");
                }
            }
        }
    } else {
        println!("No previous agent data found.");
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
