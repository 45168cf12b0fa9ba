use wodscript_core::Statement;

use super::{CompileHints, Script, Strategy};
use crate::behavior::{Behavior, LoopConfig, LoopCoordinatorBehavior, RoundSpanBehavior, SpanType};
use crate::block::Block;
use crate::errors::CompileError;
use crate::key::{BlockKey, KeyGenerator};

/// Priority 5: a plain container — non-empty children, no timer or rounds of
/// its own. Wraps its children in a `Fixed{1}` loop so they push exactly
/// once, in order, then self-terminates.
pub struct GroupStrategy;

impl Strategy for GroupStrategy {
    fn name(&self) -> &'static str {
        "group"
    }

    fn matches(&self, statements: &[&Statement]) -> bool {
        let first = statements[0];
        let fragments = &first.fragments;
        first.has_children()
            && !fragments.iter().any(|f| f.is_timer())
            && !fragments.iter().any(|f| f.is_rounds())
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
        let key = keys.next();
        let loop_config = LoopConfig::fixed(1)?;
        let block = Block::new(key, first.id, parent).with_child_groups(first.children.clone()).with_behaviors(
            vec![
                Behavior::LoopCoordinator(LoopCoordinatorBehavior::new(loop_config)),
                Behavior::RoundSpan(RoundSpanBehavior::new(SpanType::Rounds)),
            ],
        );
        Ok(block)
    }
}
