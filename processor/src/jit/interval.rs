use wodscript_core::Statement;

use super::{CompileHints, Script, Strategy};
use crate::behavior::{Behavior, LoopConfig, LoopCoordinatorBehavior, RoundSpanBehavior, SpanType, TimerBehavior};
use crate::block::Block;
use crate::errors::CompileError;
use crate::key::{BlockKey, KeyGenerator};

const DEFAULT_INTERVAL_MS: i64 = 60_000;

/// Priority 2: EMOM — has `Timer` and an `Action("EMOM")` fragment. One
/// fresh child per interval boundary, `totalRounds = duration / interval`.
pub struct IntervalStrategy;

impl Strategy for IntervalStrategy {
    fn name(&self) -> &'static str {
        "interval"
    }

    fn matches(&self, statements: &[&Statement]) -> bool {
        let fragments = &statements[0].fragments;
        fragments.iter().any(|f| f.is_timer()) && fragments.iter().any(|f| f.action_is("EMOM"))
    }

    fn compile(
        &self,
        statements: &[&Statement],
        _script: &Script,
        keys: &mut KeyGenerator,
        parent: Option<BlockKey>,
        _hints: CompileHints,
    ) -> Result<Block, CompileError> {
        let first = statements[0];
        let (duration_ms, _) =
            first.fragments.iter().find_map(|f| f.as_timer()).ok_or(CompileError::StrategyNotFound(first.id))?;
        let duration_ms = duration_ms.abs();
        let interval_ms = DEFAULT_INTERVAL_MS;
        let total_rounds = (duration_ms / interval_ms).max(1);
        let key = keys.next();
        let block = Block::new(key, first.id, parent)
            .with_child_groups(first.children.clone())
            .with_behaviors(vec![
                Behavior::Timer(TimerBehavior::new(wodscript_core::TimerDirection::Down, Some(duration_ms))),
                Behavior::LoopCoordinator(LoopCoordinatorBehavior::new(LoopConfig::interval(
                    interval_ms,
                    total_rounds,
                )?)),
                Behavior::RoundSpan(RoundSpanBehavior::new(SpanType::Interval)),
            ]);
        Ok(block)
    }
}
