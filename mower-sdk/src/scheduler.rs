//! Adaptive poll scheduling
//!
//! One timer per device. Rearming replaces the pending deadline instead of
//! stacking timers, so a burst of writes (each requesting a quick
//! follow-up poll) still produces exactly one poll. The interval policy is
//! a pure function so it can be tested without threads.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, warn};

// ============================================================================
// Interval policy
// ============================================================================

/// Everything the interval policy looks at, captured at decision time
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalInputs {
    /// A map backup or recovery is running on the device
    pub map_transfer: bool,
    /// Time since the most recent poll failure, while unrecovered
    pub since_failure: Option<Duration>,
    /// Time since the last local write or accepted action
    pub since_change: Option<Duration>,
    pub active: bool,
    pub started: bool,
    pub running: bool,
}

/// Pick the delay until the next poll
///
/// Tightest first: map transfers are short-lived and their progress is
/// the only signal the device gives, failures back off in tiers, recent
/// local changes poll fast to pick up their effects, and an idle device
/// settles at a slow steady rate.
pub fn next_interval(inputs: &IntervalInputs) -> Duration {
    if inputs.map_transfer {
        return Duration::from_secs(2);
    }
    if let Some(since_failure) = inputs.since_failure {
        return if since_failure <= Duration::from_secs(60) {
            Duration::from_secs(5)
        } else if since_failure <= Duration::from_secs(300) {
            Duration::from_secs(10)
        } else {
            Duration::from_secs(30)
        };
    }
    if matches!(inputs.since_change, Some(d) if d <= Duration::from_secs(60)) {
        return if inputs.active {
            Duration::from_secs(3)
        } else {
            Duration::from_secs(5)
        };
    }
    if inputs.active || inputs.started {
        return if inputs.running {
            Duration::from_secs(3)
        } else {
            Duration::from_secs(5)
        };
    }
    Duration::from_secs(10)
}

// ============================================================================
// Poll health
// ============================================================================

/// Consecutive failures tolerated before the device is marked unavailable
pub const FAILURE_THRESHOLD: u32 = 3;

/// Availability transition produced by recording a poll result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Unchanged,
    BecameAvailable,
    BecameUnavailable,
}

/// Consecutive-failure tracking and availability state
#[derive(Debug)]
pub struct PollHealth {
    fail_count: u32,
    last_failure: Option<Instant>,
    available: bool,
}

impl Default for PollHealth {
    fn default() -> Self {
        Self { fail_count: 0, last_failure: None, available: false }
    }
}

impl PollHealth {
    pub fn available(&self) -> bool {
        self.available
    }

    /// Time since the failure streak began, while one is ongoing
    pub fn since_failure(&self, now: Instant) -> Option<Duration> {
        self.last_failure.map(|at| now.duration_since(at))
    }

    /// Record a successful poll cycle
    pub fn record_success(&mut self) -> Availability {
        self.fail_count = 0;
        self.last_failure = None;
        if self.available {
            Availability::Unchanged
        } else {
            self.available = true;
            Availability::BecameAvailable
        }
    }

    /// Record a failed poll cycle
    ///
    /// The failure clock starts on the first failure of a streak; a
    /// single transient failure never flips availability.
    pub fn record_failure(&mut self, now: Instant) -> Availability {
        self.fail_count += 1;
        if self.available {
            if self.last_failure.is_none() {
                self.last_failure = Some(now);
            }
            if self.fail_count > FAILURE_THRESHOLD {
                warn!(failures = self.fail_count, "marking device unavailable");
                self.available = false;
                return Availability::BecameUnavailable;
            }
            debug!(failures = self.fail_count, "poll failed, retrying");
        }
        Availability::Unchanged
    }
}

// ============================================================================
// Poll timer
// ============================================================================

enum TimerCommand {
    Arm(Instant),
    Disarm,
    Shutdown,
}

/// Single rearmable timer driving the poll loop
///
/// The callback runs on the timer's own thread. Arming while a deadline
/// is pending replaces it; arming while the callback is running schedules
/// the next fire normally.
pub struct PollTimer {
    tx: Sender<TimerCommand>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PollTimer {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<TimerCommand>();
        let handle = thread::Builder::new()
            .name("mower-poll".into())
            .spawn(move || {
                let mut deadline: Option<Instant> = None;
                loop {
                    let command = match deadline {
                        Some(at) => {
                            let now = Instant::now();
                            if at <= now {
                                deadline = None;
                                callback();
                                continue;
                            }
                            match rx.recv_timeout(at - now) {
                                Ok(command) => command,
                                Err(RecvTimeoutError::Timeout) => {
                                    deadline = None;
                                    callback();
                                    continue;
                                }
                                Err(RecvTimeoutError::Disconnected) => break,
                            }
                        }
                        None => match rx.recv() {
                            Ok(command) => command,
                            Err(_) => break,
                        },
                    };
                    match command {
                        TimerCommand::Arm(at) => deadline = Some(at),
                        TimerCommand::Disarm => deadline = None,
                        TimerCommand::Shutdown => break,
                    }
                }
            });
        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(error) => {
                warn!(%error, "failed to spawn poll timer thread");
                None
            }
        };
        Self { tx, handle: Mutex::new(handle) }
    }

    /// Arm (or rearm) the timer to fire after `delay`
    pub fn schedule(&self, delay: Duration) {
        let _ = self.tx.send(TimerCommand::Arm(Instant::now() + delay));
    }

    /// Drop the pending deadline without firing
    pub fn cancel(&self) {
        let _ = self.tx.send(TimerCommand::Disarm);
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        let _ = self.tx.send(TimerCommand::Shutdown);
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for PollTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollTimer").finish_non_exhaustive()
    }
}
