//! The JIT compiler and its strategy table (§4.8). Children are compiled
//! lazily — only the statements that make up one compile unit at a time are
//! turned into a [`crate::block::Block`], never the whole script up front.

mod effort;
mod fragment_compiler;
mod group;
mod inheritance;
mod interval;
mod rounds;
mod time_bound_rounds;
mod timer;

pub use fragment_compiler::{compile_fragments, exercise_id};
pub use inheritance::{apply_rules, inherit_reps_if_absent, InheritanceRule};

use indexmap::IndexMap;
use wodscript_core::{Statement, StatementId};

use crate::behavior::{Behavior, HistoryBehavior};
use crate::block::Block;
use crate::errors::CompileError;
use crate::key::{BlockKey, KeyGenerator};

/// The (external) parser's output: every statement in the script, keyed by
/// id, plus the root compile unit.
#[derive(Debug, Default)]
pub struct Script {
    pub statements: IndexMap<StatementId, Statement>,
    pub root: Vec<StatementId>,
}

impl Script {
    pub fn new(statements: Vec<Statement>, root: Vec<StatementId>) -> Self {
        Script { statements: statements.into_iter().map(|s| (s.id, s)).collect(), root }
    }

    pub fn resolve(&self, ids: &[StatementId]) -> Result<Vec<&Statement>, CompileError> {
        ids.iter()
            .map(|id| self.statements.get(id).ok_or(CompileError::EmptyGroup(*id)))
            .collect()
    }
}

/// Extra context threaded through compile calls: the inherited `reps` value
/// visible to child statements via public memory search, per §4.8's
/// metric-inheritance example. Strategies that don't care about inheritance
/// ignore it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileHints {
    pub inherited_reps: Option<u32>,
}

pub trait Strategy {
    fn name(&self) -> &'static str;
    fn matches(&self, statements: &[&Statement]) -> bool;
    fn compile(
        &self,
        statements: &[&Statement],
        script: &Script,
        keys: &mut KeyGenerator,
        parent: Option<BlockKey>,
        hints: CompileHints,
    ) -> Result<Block, CompileError>;
}

/// Holds strategies in insertion order; [`JitCompiler::compile`] iterates in
/// reverse, so the last-registered strategy wins ties (§4.8 "last added =
/// highest priority"). Registered lowest-precedence first so the default
/// table ends up in the priority order from the spec's table.
pub struct JitCompiler {
    strategies: Vec<Box<dyn Strategy>>,
    keys: KeyGenerator,
}

impl JitCompiler {
    /// The canonical strategy set, registered in reverse-precedence order.
    pub fn with_default_strategies() -> Self {
        let mut compiler = JitCompiler { strategies: Vec::new(), keys: KeyGenerator::new() };
        compiler.register(Box::new(effort::EffortStrategy));
        compiler.register(Box::new(group::GroupStrategy));
        compiler.register(Box::new(rounds::RoundsStrategy));
        compiler.register(Box::new(timer::TimerStrategy));
        compiler.register(Box::new(interval::IntervalStrategy));
        compiler.register(Box::new(time_bound_rounds::TimeBoundRoundsStrategy));
        compiler
    }

    pub fn register(&mut self, strategy: Box<dyn Strategy>) {
        self.strategies.push(strategy);
    }

    /// Compiles the statement group `ids` (one inner array of the `children:
    /// int[][]` shape — statements that execute together as one unit) into a
    /// block. Iterates strategies in reverse insertion order; the first
    /// match wins.
    pub fn compile(
        &mut self,
        ids: &[StatementId],
        script: &Script,
        parent: Option<BlockKey>,
        hints: CompileHints,
    ) -> Result<Block, CompileError> {
        let statements = script.resolve(ids)?;
        let first = *statements.first().ok_or_else(|| {
            CompileError::EmptyGroup(ids.first().copied().unwrap_or(StatementId(0)))
        })?;
        for strategy in self.strategies.iter().rev() {
            if strategy.matches(&statements) {
                tracing::trace!(strategy = strategy.name(), statement = %first.id, "strategy matched");
                let mut block = strategy.compile(&statements, script, &mut self.keys, parent, hints)?;
                let label = exercise_id(&first.fragments).unwrap_or_else(|| first.id.to_string());
                block.behaviors.push(Behavior::History(HistoryBehavior::new(label)));
                return Ok(block);
            }
        }
        Err(CompileError::StrategyNotFound(first.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wodscript_core::Fragment;

    fn statement(id: u32, fragments: Vec<Fragment>) -> Statement {
        Statement::new(id, fragments)
    }

    #[test]
    fn strategy_selection_is_deterministic_for_a_given_table() {
        let mut compiler = JitCompiler::with_default_strategies();
        let script = Script::new(
            vec![statement(1, vec![Fragment::Effort { name: "Pullups".into() }])],
            vec![StatementId(1)],
        );
        let first = compiler.compile(&[StatementId(1)], &script, None, CompileHints::default()).unwrap();
        let mut compiler2 = JitCompiler::with_default_strategies();
        let second = compiler2.compile(&[StatementId(1)], &script, None, CompileHints::default()).unwrap();
        assert_eq!(first.behaviors.len(), second.behaviors.len());
    }

    #[test]
    fn unresolvable_statement_id_is_a_compile_error() {
        let mut compiler = JitCompiler::with_default_strategies();
        let script = Script::new(Vec::new(), Vec::new());
        let err = compiler.compile(&[StatementId(99)], &script, None, CompileHints::default());
        assert!(err.is_err());
    }
}
