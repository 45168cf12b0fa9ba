use wodscript_core::Statement;

use super::{compile_fragments, exercise_id, inherit_reps_if_absent, CompileHints, Script, Strategy};
use crate::behavior::{ActionLayerBehavior, Behavior, CompletionBehavior};
use crate::block::Block;
use crate::errors::CompileError;
use crate::key::{BlockKey, KeyGenerator};

/// Lowest precedence (§4.8 table, priority 6): a leaf exercise with no timer
/// and no rounds. Completes as soon as an external `next` reaches it.
pub struct EffortStrategy;

impl Strategy for EffortStrategy {
    fn name(&self) -> &'static str {
        "effort"
    }

    fn matches(&self, statements: &[&Statement]) -> bool {
        let fragments = &statements[0].fragments;
        !fragments.iter().any(|f| f.is_timer()) && !fragments.iter().any(|f| f.is_rounds())
    }

    fn compile(
        &self,
        statements: &[&Statement],
        _script: &Script,
        keys: &mut KeyGenerator,
        parent: Option<BlockKey>,
        hints: CompileHints,
    ) -> Result<Block, CompileError> {
        let first = statements[0];
        let mut values = compile_fragments(&first.fragments);
        values = inherit_reps_if_absent(values, hints.inherited_reps);
        let key = keys.next();
        let mut block = Block::new(key, first.id, parent);
        block.metric.values = values;
        block.metric.exercise_id = exercise_id(&first.fragments);
        block.behaviors = vec![
            Behavior::Completion(CompletionBehavior::on_next_only(|_| true)),
            Behavior::ActionLayer(ActionLayerBehavior::new(vec!["next".to_string()])),
        ];
        Ok(block)
    }
}
