//! Data model shared between the script parser (external) and the wodscript
//! runtime engine: statements, fragments, and the normalized metric values
//! the JIT compiler derives from them.
//!
//! This crate has no knowledge of execution — it only describes the shapes
//! that cross the boundary between a parsed workout script and the engine
//! that runs it.

mod error;
mod fragment;
mod metric;
mod statement;

pub use error::CompileError;
pub use fragment::{Fragment, LapMode, RoundsValue, TimerDirection};
pub use metric::{MetricKind, MetricValue, MetricValues, RuntimeMetric, TimeSpan, Unit};
pub use statement::{SourceLocation, Statement, StatementId};
