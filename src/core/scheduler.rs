//! Cancelable timer abstraction for session deadlines and countdown ticks.
//!
//! The session never talks to a clock directly; it schedules its deadline
//! and its 1-second display tick through a [`Scheduler`] and holds on to the
//! returned handles. Dropping a handle cancels the task, so replacing a
//! session's handles is all it takes to silence timers from a previous
//! episode.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{after, bounded, select, tick, Sender};

/// Handle to a scheduled task. The task will not fire after `cancel()`
/// returns or after the handle is dropped.
pub trait TaskHandle: Send {
    fn cancel(&mut self);
}

/// Source of cancelable single-shot and repeating timers.
pub trait Scheduler: Send + Sync {
    /// Run `task` once after `delay`, unless the handle is cancelled first.
    fn schedule_once(
        &self,
        delay: Duration,
        task: Box<dyn FnOnce() + Send>,
    ) -> Box<dyn TaskHandle>;

    /// Run `task` every `interval` until the handle is cancelled.
    fn schedule_repeating(
        &self,
        interval: Duration,
        task: Box<dyn FnMut() + Send>,
    ) -> Box<dyn TaskHandle>;
}

// ----------------------------------------------------------------------------
// Thread-backed scheduler
// ----------------------------------------------------------------------------

/// Scheduler that runs each task on its own thread, racing a
/// `crossbeam_channel` timer against a cancel channel.
#[derive(Debug, Default)]
pub struct ThreadScheduler;

impl ThreadScheduler {
    pub fn new() -> Self {
        Self
    }
}

/// Cancel channel sender wrapped as a handle. Dropping the sender
/// disconnects the channel, which the timer thread treats as a cancel.
struct ThreadTaskHandle {
    cancel_tx: Option<Sender<()>>,
}

impl TaskHandle for ThreadTaskHandle {
    fn cancel(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.try_send(());
        }
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule_once(
        &self,
        delay: Duration,
        task: Box<dyn FnOnce() + Send>,
    ) -> Box<dyn TaskHandle> {
        let (cancel_tx, cancel_rx) = bounded::<()>(1);

        thread::spawn(move || {
            let deadline = after(delay);
            select! {
                recv(deadline) -> _ => task(),
                // Ok(()) is an explicit cancel; Err means the handle was dropped
                recv(cancel_rx) -> _ => {}
            }
        });

        Box::new(ThreadTaskHandle {
            cancel_tx: Some(cancel_tx),
        })
    }

    fn schedule_repeating(
        &self,
        interval: Duration,
        mut task: Box<dyn FnMut() + Send>,
    ) -> Box<dyn TaskHandle> {
        let (cancel_tx, cancel_rx) = bounded::<()>(1);

        thread::spawn(move || {
            let ticker = tick(interval);
            loop {
                select! {
                    recv(ticker) -> _ => task(),
                    recv(cancel_rx) -> _ => return,
                }
            }
        });

        Box::new(ThreadTaskHandle {
            cancel_tx: Some(cancel_tx),
        })
    }
}

// ----------------------------------------------------------------------------
// Manually driven scheduler
// ----------------------------------------------------------------------------

/// Scheduler whose time is advanced by the host.
///
/// Scheduled tasks are queued instead of armed; the host (a test, or a
/// single-threaded event loop that wants full control) fires them with
/// [`ManualScheduler::fire_once_tasks`] and [`ManualScheduler::fire_tick`].
#[derive(Default)]
pub struct ManualScheduler {
    inner: Mutex<ManualInner>,
}

#[derive(Default)]
struct ManualInner {
    once: Vec<ManualOnce>,
    repeating: Vec<ManualRepeating>,
}

struct ManualOnce {
    task: Box<dyn FnOnce() + Send>,
    cancelled: Arc<AtomicBool>,
}

struct ManualRepeating {
    task: Box<dyn FnMut() + Send>,
    cancelled: Arc<AtomicBool>,
}

/// Shared cancel flag; set on cancel and on drop.
struct ManualTaskHandle {
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle for ManualTaskHandle {
    fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl Drop for ManualTaskHandle {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Fire every pending single-shot task that has not been cancelled.
    /// Returns the number of tasks that ran.
    pub fn fire_once_tasks(&self) -> usize {
        // Take the queue before running so a task can schedule new work
        let pending = std::mem::take(&mut self.lock().once);

        let mut fired = 0;
        for entry in pending {
            if !entry.cancelled.load(Ordering::SeqCst) {
                (entry.task)();
                fired += 1;
            }
        }
        fired
    }

    /// Run every live repeating task once. Returns the number that ran.
    pub fn fire_tick(&self) -> usize {
        let mut pending = std::mem::take(&mut self.lock().repeating);

        let mut fired = 0;
        for entry in &mut pending {
            if !entry.cancelled.load(Ordering::SeqCst) {
                (entry.task)();
                fired += 1;
            }
        }

        // Keep live tasks registered for the next tick
        pending.retain(|entry| !entry.cancelled.load(Ordering::SeqCst));
        self.lock().repeating.extend(pending);
        fired
    }

    /// Number of live (uncancelled) single-shot tasks.
    pub fn pending_once(&self) -> usize {
        self.lock()
            .once
            .iter()
            .filter(|entry| !entry.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Number of live (uncancelled) repeating tasks.
    pub fn pending_repeating(&self) -> usize {
        self.lock()
            .repeating
            .iter()
            .filter(|entry| !entry.cancelled.load(Ordering::SeqCst))
            .count()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(
        &self,
        _delay: Duration,
        task: Box<dyn FnOnce() + Send>,
    ) -> Box<dyn TaskHandle> {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.lock().once.push(ManualOnce {
            task,
            cancelled: cancelled.clone(),
        });
        Box::new(ManualTaskHandle { cancelled })
    }

    fn schedule_repeating(
        &self,
        _interval: Duration,
        task: Box<dyn FnMut() + Send>,
    ) -> Box<dyn TaskHandle> {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.lock().repeating.push(ManualRepeating {
            task,
            cancelled: cancelled.clone(),
        });
        Box::new(ManualTaskHandle { cancelled })
    }
}
