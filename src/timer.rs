use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::{HarnessError, Result};

// ---------------------------------------------------------------------------
// TimerRegistry – named, restartable wall-clock timers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct TimerRecord {
    running_since: Option<Instant>,
    /// Length of the most recent completed interval.
    accumulated: Duration,
    /// Set once the timer has been stopped at least once.
    completed: bool,
}

/// One line of a timing summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerSummary {
    pub name: String,
    pub seconds: f64,
}

/// Named timers for one benchmark run.
///
/// Stopping a timer records the length of the interval since its last
/// start. Restarting and stopping again replaces that value with the new
/// interval; intervals do not add up.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    timers: HashMap<String, TimerRecord>,
    /// Names in first-start order, for stable reports.
    order: Vec<String>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `name`. Fails with `TimerState` if it is already running.
    pub fn start(&mut self, name: &str) -> Result<()> {
        let now = Instant::now();
        match self.timers.get_mut(name) {
            Some(record) if record.running_since.is_some() => {
                Err(HarnessError::TimerState(name.to_string()))
            }
            Some(record) => {
                record.running_since = Some(now);
                Ok(())
            }
            None => {
                self.order.push(name.to_string());
                self.timers.insert(
                    name.to_string(),
                    TimerRecord {
                        running_since: Some(now),
                        ..TimerRecord::default()
                    },
                );
                Ok(())
            }
        }
    }

    /// Stop `name` and record the interval since its last start.
    pub fn stop(&mut self, name: &str) -> Result<Duration> {
        let now = Instant::now();
        let record = self
            .timers
            .get_mut(name)
            .ok_or_else(|| HarnessError::UnknownTimer(name.to_string()))?;
        let since = record
            .running_since
            .take()
            .ok_or_else(|| HarnessError::TimerState(name.to_string()))?;
        record.accumulated = now.saturating_duration_since(since);
        record.completed = true;
        Ok(record.accumulated)
    }

    /// Recorded time for `name`. While running, the length of the current
    /// interval so far.
    pub fn elapsed(&self, name: &str) -> Result<Duration> {
        let record = self
            .timers
            .get(name)
            .ok_or_else(|| HarnessError::UnknownTimer(name.to_string()))?;
        Ok(match record.running_since {
            Some(since) => since.elapsed(),
            None => record.accumulated,
        })
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.timers
            .get(name)
            .is_some_and(|r| r.running_since.is_some())
    }

    /// `"<name>: <seconds>s"` with microsecond resolution.
    pub fn report(&self, name: &str) -> Result<String> {
        let elapsed = self.elapsed(name)?;
        Ok(format!("{name}: {:.6}s", elapsed.as_secs_f64()))
    }

    /// Every timer stopped at least once, in the order first started.
    pub fn summaries(&self) -> Vec<TimerSummary> {
        self.order
            .iter()
            .filter_map(|name| {
                let record = self.timers.get(name)?;
                record.completed.then(|| TimerSummary {
                    name: name.clone(),
                    seconds: record.accumulated.as_secs_f64(),
                })
            })
            .collect()
    }
}
