//! Labelled stopwatch used around the timed kernel sections.

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

/// Opaque token returned by [`Timer::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Wrap a raw interval id, for [`Timer`] implementations outside this crate.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Errors from the timer service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("timer handle {0} was never started or has already been stopped")]
    UnknownHandle(u64),
}

/// Stopwatch contract used by the pass driver.
pub trait Timer {
    /// Start a new interval.
    fn start(&mut self) -> TimerHandle;

    /// Stop the interval and return its length in seconds.
    fn stop(&mut self, handle: TimerHandle, label: &str) -> Result<f64, TimerError>;
}

/// One completed interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingRecord {
    pub label: String,
    pub seconds: f64,
}

/// Monotonic-clock [`Timer`] that remembers every stopped interval.
#[derive(Debug, Default)]
pub struct TimerService {
    next_id: u64,
    running: HashMap<u64, Instant>,
    timings: Vec<TimingRecord>,
}

impl TimerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every interval stopped so far, in stop order.
    pub fn timings(&self) -> &[TimingRecord] {
        &self.timings
    }

    /// Number of intervals started but not yet stopped.
    pub fn running(&self) -> usize {
        self.running.len()
    }

    /// Total seconds recorded under `label`.
    pub fn total_for(&self, label: &str) -> f64 {
        self.timings.iter().filter(|t| t.label == label).map(|t| t.seconds).sum()
    }
}

impl Timer for TimerService {
    fn start(&mut self) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.running.insert(id, Instant::now());
        TimerHandle(id)
    }

    fn stop(&mut self, handle: TimerHandle, label: &str) -> Result<f64, TimerError> {
        let started = self.running.remove(&handle.0).ok_or(TimerError::UnknownHandle(handle.0))?;
        let seconds = started.elapsed().as_secs_f64();
        self.timings.push(TimingRecord { label: label.to_string(), seconds });
        Ok(seconds)
    }
}
