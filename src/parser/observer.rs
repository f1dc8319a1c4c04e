//! Progress observers for the explode pipeline.

use super::report::{Step, StepOutcome};

/// Receives progress notifications while a document is exploded.
///
/// All methods have empty defaults; implement only what you need.
pub trait ExplodeObserver {
    /// A step is about to run.
    fn step_started(&mut self, _step: Step) {}

    /// A step finished (successfully or not).
    fn step_finished(&mut self, _step: Step, _outcome: &StepOutcome) {}

    /// One page of the pages step finished (0-based index).
    fn page_finished(&mut self, _index: u32, _total: u32) {}
}

/// Observer that emits `log` records.
///
/// Step summaries go out at the configured level, failures as warnings and
/// page progress at debug level.
#[derive(Debug, Clone)]
pub struct LogObserver {
    level: log::Level,
}

impl LogObserver {
    /// Create an observer logging step summaries at `level`.
    pub fn new(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new(log::Level::Info)
    }
}

impl ExplodeObserver for LogObserver {
    fn step_started(&mut self, step: Step) {
        log::debug!("Extracting {}", step);
    }

    fn step_finished(&mut self, step: Step, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Failed(msg) => log::warn!("Step '{}' failed: {}", step, msg),
            other => log::log!(self.level, "{}: {}", step, other),
        }
    }

    fn page_finished(&mut self, index: u32, total: u32) {
        log::debug!("Page {}/{} exploded", index + 1, total);
    }
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl ExplodeObserver for NullObserver {}
