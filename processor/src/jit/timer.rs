use wodscript_core::{Statement, TimerDirection};

use super::{CompileHints, Script, Strategy};
use crate::behavior::{
    ActionLayerBehavior, Behavior, LoopConfig, LoopCoordinatorBehavior, RoundSpanBehavior, SpanType, TimerBehavior,
};
use crate::block::Block;
use crate::errors::CompileError;
use crate::key::{BlockKey, KeyGenerator};

/// Priority 3: has a `Timer` fragment and wasn't claimed by the more
/// specific AMRAP/EMOM strategies above it. A leaf countdown/count-up, or
/// (if the statement has children) a timer wrapping a one-shot child group.
pub struct TimerStrategy;

impl Strategy for TimerStrategy {
    fn name(&self) -> &'static str {
        "timer"
    }

    fn matches(&self, statements: &[&Statement]) -> bool {
        statements[0].fragments.iter().any(|f| f.is_timer())
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
        let (duration_ms, direction) =
            first.fragments.iter().find_map(|f| f.as_timer()).ok_or(CompileError::StrategyNotFound(first.id))?;
        let direction = direction.unwrap_or(if duration_ms < 0 { TimerDirection::Down } else { TimerDirection::Up });
        let duration = if direction == TimerDirection::Down { Some(duration_ms.abs()) } else { None };
        let key = keys.next();
        let mut behaviors = vec![Behavior::Timer(TimerBehavior::new(direction, duration))];
        if first.has_children() {
            behaviors.push(Behavior::LoopCoordinator(LoopCoordinatorBehavior::new(LoopConfig::fixed(1)?)));
            behaviors.push(Behavior::RoundSpan(RoundSpanBehavior::new(SpanType::Rounds)));
        } else {
            behaviors.push(Behavior::ActionLayer(ActionLayerBehavior::new(vec![
                "next".to_string(),
                "pause".to_string(),
            ])));
        }
        let block =
            Block::new(key, first.id, parent).with_child_groups(first.children.clone()).with_behaviors(behaviors);
        Ok(block)
    }
}
