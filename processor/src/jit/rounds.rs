use wodscript_core::{RoundsValue, Statement};

use super::{CompileHints, Script, Strategy};
use crate::behavior::{Behavior, LoopConfig, LoopCoordinatorBehavior, RoundSpanBehavior, SpanType};
use crate::block::Block;
use crate::errors::CompileError;
use crate::key::{BlockKey, KeyGenerator};

/// Priority 4: has a `Rounds` fragment and no `Timer`. A list payload
/// becomes a rep scheme; a bare count becomes a fixed round count.
pub struct RoundsStrategy;

impl Strategy for RoundsStrategy {
    fn name(&self) -> &'static str {
        "rounds"
    }

    fn matches(&self, statements: &[&Statement]) -> bool {
        let fragments = &statements[0].fragments;
        fragments.iter().any(|f| f.is_rounds()) && !fragments.iter().any(|f| f.is_timer())
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
        let rounds_fragment = first
            .fragments
            .iter()
            .find_map(|f| f.as_rounds())
            .ok_or(CompileError::StrategyNotFound(first.id))?;
        let loop_config = match rounds_fragment {
            RoundsValue::Scheme(reps) => LoopConfig::rep_scheme(reps.clone())?,
            RoundsValue::Count(n) => LoopConfig::fixed(*n as i64)?,
        };
        let key = keys.next();
        let block = Block::new(key, first.id, parent).with_child_groups(first.children.clone()).with_behaviors(
            vec![
                Behavior::LoopCoordinator(LoopCoordinatorBehavior::new(loop_config)),
                Behavior::RoundSpan(RoundSpanBehavior::new(SpanType::Rounds)),
            ],
        );
        Ok(block)
    }
}
