//! Runtime configuration (expansion: ambient "config" concern). A plain
//! struct passed by value into [`crate::runtime::ScriptRuntime::new`] rather
//! than a global — mirrors the teacher's explicit `ExecutionOptions`-style
//! config object over implicit global state.

#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Bounds total action-pipeline work per `handle` call (§4.4, §5).
    pub max_iterations: usize,
    /// When set, popped blocks' final clock/metric snapshot is retained in
    /// `ScriptRuntime::history` for inspection instead of only being logged.
    pub debug: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        RuntimeOptions { max_iterations: 100, debug: false }
    }
}

impl RuntimeOptions {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
