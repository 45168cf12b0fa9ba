//! Error architecture.
//!
//! Two tiers, mirroring how compile-time and run-time failures are handled
//! very differently (see §7 of the design notes):
//!
//! - [`CompileError`] is raised once, at JIT compile time, and is meant to
//!   escape all the way to the caller — a script that doesn't compile should
//!   never reach the stack.
//! - Everything that can go wrong *after* a block is mounted is local by
//!   default: it is caught at the block boundary, turned into a
//!   [`RecordedError`], pushed onto [`crate::runtime::ScriptRuntime::errors`],
//!   and execution continues. Only [`RuntimeError::PipelineOverflow`] escapes
//!   `handle` once the engine is running.

use std::fmt;

use thiserror::Error;
use wodscript_core::StatementId;

use crate::key::BlockKey;

/// Failures raised while turning statements into a block tree. These never
/// reach the stack: the caller is expected to reject the script.
#[derive(Debug, Error, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Validation(#[from] wodscript_core::CompileError),
    #[error("no strategy matched statement {0}")]
    StrategyNotFound(StatementId),
    #[error("statement {0} has an empty sibling group")]
    EmptyGroup(StatementId),
}

/// Errors that escape a running [`crate::runtime::ScriptRuntime`]. Everything
/// else is recorded in `errors` and swallowed so the engine keeps running.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("action pipeline exceeded {0} iterations without quiescing")]
    PipelineOverflow(usize),
    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// A non-fatal failure recorded during execution. Surfaced through
/// [`crate::runtime::ScriptRuntime::errors`] and, for behavior failures, as a
/// `"behavior:error"` event so external observers can react without the
/// engine unwinding.
#[derive(Debug, Clone)]
pub enum RecordedError {
    /// `next` was called against a stack that was too shallow for the
    /// requested operation. The action that triggered it becomes a no-op.
    StackState { detail: String },
    /// A behavior hook raised an error. Caught at the block boundary; sibling
    /// behaviors still run.
    Behavior { block: BlockKey, hook: &'static str, detail: String },
    /// The JIT could find no strategy for a statement encountered while
    /// compiling a loop body or child group at runtime (as opposed to initial
    /// script compilation, which instead raises [`CompileError`]).
    Strategy { detail: String },
    /// An event handler returned an error. Sibling handlers for the same
    /// event still run (spec.md §8 "handler failure is local"). `owner` is
    /// `None` for a handler registered by an external driver rather than a
    /// block.
    EventHandler { owner: Option<BlockKey>, event: String, detail: String },
}

impl fmt::Display for RecordedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordedError::StackState { detail } => write!(f, "stack state error: {detail}"),
            RecordedError::Behavior { block, hook, detail } => {
                write!(f, "behavior error in {hook} on {block}: {detail}")
            }
            RecordedError::Strategy { detail } => write!(f, "strategy error: {detail}"),
            RecordedError::EventHandler { owner, event, detail } => match owner {
                Some(owner) => write!(f, "handler for {event} on {owner} failed: {detail}"),
                None => write!(f, "external handler for {event} failed: {detail}"),
            },
        }
    }
}
