// SPDX-License-Identifier: MIT

//! Step instrumentation hooks invoked by the orchestrator around every step

use std::time::Duration;

use super::step::{Step, Transition};
use crate::fable::error::StoryError;

/// Observer notified before and after each step runs
pub trait StepObserver: Send + Sync {
    fn on_enter(&self, _session_id: &str, _step: Step) {}

    fn on_exit(
        &self,
        _session_id: &str,
        _step: Step,
        _elapsed: Duration,
        _result: Result<&Transition, &StoryError>,
    ) {
    }
}

/// Logs step entry and exit with elapsed time
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl StepObserver for LoggingObserver {
    fn on_enter(&self, session_id: &str, step: Step) {
        log::info!("[{}] ENTER: {}", session_id, step);
    }

    fn on_exit(
        &self,
        session_id: &str,
        step: Step,
        elapsed: Duration,
        result: Result<&Transition, &StoryError>,
    ) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        match result {
            Ok(Transition::Goto(next)) => {
                log::info!("[{}] EXIT: {} -> {} ({:.0}ms)", session_id, step, next, ms)
            }
            Ok(Transition::Suspend) => {
                log::info!("[{}] SUSPEND: {} ({:.0}ms)", session_id, step, ms)
            }
            Err(e) => log::error!("[{}] FAILED: {} ({:.0}ms): {}", session_id, step, ms, e),
        }
    }
}

/// Discards all notifications
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StepObserver for NoopObserver {}
