use wodscript_core::{Statement, TimerDirection};

use super::{CompileHints, Script, Strategy};
use crate::behavior::{
    Behavior, CompletionBehavior, LoopConfig, LoopCoordinatorBehavior, RoundSpanBehavior, SpanType, TimerBehavior,
};
use crate::block::Block;
use crate::errors::CompileError;
use crate::key::{BlockKey, KeyGenerator};

/// Highest precedence (§4.8 table, priority 1): AMRAP — a countdown timer
/// wrapping an uncapped (`TimeBound`) round loop. The loop never
/// self-terminates; a `CompletionBehavior` watching for `timer:complete`
/// pops the block once the clock runs out.
pub struct TimeBoundRoundsStrategy;

impl Strategy for TimeBoundRoundsStrategy {
    fn name(&self) -> &'static str {
        "time_bound_rounds"
    }

    fn matches(&self, statements: &[&Statement]) -> bool {
        let fragments = &statements[0].fragments;
        fragments.iter().any(|f| f.is_timer())
            && (fragments.iter().any(|f| f.is_rounds()) || fragments.iter().any(|f| f.action_is("AMRAP")))
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
        let key = keys.next();
        let block = Block::new(key, first.id, parent)
            .with_child_groups(first.children.clone())
            .with_behaviors(vec![
                Behavior::Timer(TimerBehavior::new(TimerDirection::Down, Some(duration_ms.abs()))),
                Behavior::LoopCoordinator(LoopCoordinatorBehavior::new(LoopConfig::TimeBound)),
                Behavior::Completion(CompletionBehavior::new(
                    |_| true,
                    vec!["timer:complete".to_string()],
                    false,
                )),
                Behavior::RoundSpan(RoundSpanBehavior::new(SpanType::Rounds)),
            ]);
        Ok(block)
    }
}
