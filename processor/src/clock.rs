//! Per-block elapsed-time tracking (§4.2). Each [`crate::block::Block`] that
//! needs duration bookkeeping — timers, round spans, history entries — owns
//! one `Clock`. Start/stop are idempotent so behaviors can call them from
//! hooks without tracking whether the clock is already in the state they
//! want.

use std::time::Instant;

use wodscript_core::TimeSpan;

#[derive(Debug, Default)]
pub struct Clock {
    spans: Vec<TimeSpan>,
}

impl Clock {
    pub fn new() -> Self {
        Clock::default()
    }

    /// Opens a new span. A no-op if the clock is already running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.spans.push(TimeSpan::open(Instant::now()));
    }

    /// Closes the current span. A no-op if the clock isn't running.
    pub fn stop(&mut self) {
        if let Some(span) = self.spans.last_mut() {
            span.close(Instant::now());
        }
    }

    pub fn is_running(&self) -> bool {
        self.spans.last().is_some_and(TimeSpan::is_open)
    }

    /// Total elapsed time across every span, including the open one if the
    /// clock is currently running.
    pub fn elapsed_ms(&self) -> i64 {
        let now = Instant::now();
        self.spans.iter().map(|s| s.elapsed(now).as_millis() as i64).sum()
    }

    pub fn spans(&self) -> &[TimeSpan] {
        &self.spans
    }

    pub fn reset(&mut self) {
        self.spans.clear();
    }
}
