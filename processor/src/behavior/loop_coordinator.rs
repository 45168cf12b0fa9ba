use wodscript_core::{CompileError, MetricValue};

use super::{BehaviorContext, Hooks};
use crate::action::{Action, StackOp};
use crate::event::Event;
use crate::memory::{MemoryRef, Owner, Visibility};

/// The four loop shapes spec.md §4.5 unifies under one coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopConfig {
    Fixed { total_rounds: u32 },
    RepScheme { reps: Vec<u32> },
    TimeBound,
    Interval { interval_duration_ms: i64, total_rounds: u32 },
}

impl LoopConfig {
    pub fn fixed(total_rounds: i64) -> Result<Self, CompileError> {
        if total_rounds < 1 {
            return Err(CompileError::NonPositiveRoundsCount(total_rounds));
        }
        Ok(LoopConfig::Fixed { total_rounds: total_rounds as u32 })
    }

    pub fn rep_scheme(reps: Vec<u32>) -> Result<Self, CompileError> {
        if reps.is_empty() {
            return Err(CompileError::EmptyRepScheme);
        }
        if let Some(&bad) = reps.iter().find(|&&r| r == 0) {
            return Err(CompileError::NonPositiveRepSchemeEntry(bad));
        }
        Ok(LoopConfig::RepScheme { reps })
    }

    pub fn interval(interval_duration_ms: i64, total_rounds: i64) -> Result<Self, CompileError> {
        if interval_duration_ms <= 0 {
            return Err(CompileError::NonPositiveIntervalDuration(interval_duration_ms));
        }
        if total_rounds < 1 {
            return Err(CompileError::NonPositiveRoundsCount(total_rounds));
        }
        Ok(LoopConfig::Interval { interval_duration_ms, total_rounds: total_rounds as u32 })
    }

    fn total_rounds(&self) -> Option<u32> {
        match self {
            LoopConfig::Fixed { total_rounds } => Some(*total_rounds),
            LoopConfig::RepScheme { reps } => Some(reps.len() as u32),
            LoopConfig::TimeBound => None,
            LoopConfig::Interval { total_rounds, .. } => Some(*total_rounds),
        }
    }
}

/// The state machine itself: `index` starts at -1 (pre-first-advance).
/// `position = index mod group_count`, `rounds = index div group_count`.
pub struct LoopCoordinatorBehavior {
    config: LoopConfig,
    index: i64,
    reps_ref: Option<MemoryRef<u32>>,
    /// Published so `RoundSpanBehavior` can tell when a round actually
    /// changed without caring whether the trigger was `next` or `tick`.
    round_ref: Option<MemoryRef<i64>>,
}

impl LoopCoordinatorBehavior {
    pub fn new(config: LoopConfig) -> Self {
        LoopCoordinatorBehavior { config, index: -1, reps_ref: None, round_ref: None }
    }

    pub fn index(&self) -> i64 {
        self.index
    }

    fn position(&self, group_count: usize) -> i64 {
        self.index.rem_euclid(group_count as i64)
    }

    fn rounds(&self, group_count: usize) -> i64 {
        self.index.div_euclid(group_count as i64)
    }

    /// True once the loop has exhausted its configured round count. Always
    /// false for `TimeBound`, which relies on an owning timer to stop it.
    fn is_complete(&self, group_count: usize) -> bool {
        match self.config.total_rounds() {
            Some(total) => self.rounds(group_count) >= total as i64,
            None => false,
        }
    }

    fn current_reps(&self, group_count: usize) -> Option<u32> {
        match &self.config {
            LoopConfig::RepScheme { reps } => {
                let round = self.rounds(group_count).max(0) as usize;
                reps.get(round % reps.len()).copied()
            }
            _ => None,
        }
    }

    /// `Interval`'s configured boundary in ms, or `None` for the other three
    /// shapes — they advance on `next`, not on elapsed time.
    fn interval_duration_ms(&self) -> Option<i64> {
        match &self.config {
            LoopConfig::Interval { interval_duration_ms, .. } => Some(*interval_duration_ms),
            _ => None,
        }
    }

    /// Advances as many rounds as the clock has actually crossed boundaries
    /// for — normally one, but catches up if a `tick` arrived late. No-op for
    /// anything but `Interval`, and once the round cap is reached.
    fn advance_on_tick(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        let Some(interval_ms) = self.interval_duration_ms() else {
            return Vec::new();
        };
        let mut actions = Vec::new();
        loop {
            let group_count = ctx.child_group_count.max(1);
            if self.is_complete(group_count) {
                break;
            }
            let next_boundary = (self.rounds(group_count) + 1) * interval_ms;
            if ctx.clock.elapsed_ms() < next_boundary {
                break;
            }
            actions.extend(self.advance(ctx));
        }
        actions
    }

    fn advance(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        let group_count = ctx.child_group_count.max(1);
        let previous_round = self.rounds(group_count);
        self.index += 1;
        if self.is_complete(group_count) {
            // Fixed/RepScheme/Interval loops self-terminate once their round
            // cap is reached; TimeBound has no cap and relies on an owning
            // timer's CompletionBehavior to pop it instead.
            return vec![
                Action::Emit(Event::new("rounds:complete")),
                Action::Stack(StackOp::Pop { target: ctx.key }),
            ];
        }
        let mut actions = Vec::new();
        let new_round = self.rounds(group_count);
        if new_round != previous_round {
            actions.push(Action::Emit(Event::new("rounds:changed")));
            if let (Some(reps), Some(r)) = (self.current_reps(group_count), &self.reps_ref) {
                ctx.memory.set(r, reps);
                ctx.metric.set_value(MetricValue::repetitions(reps));
            }
            if let Some(r) = &self.round_ref {
                ctx.memory.set(r, new_round);
            }
        }
        actions.push(Action::Stack(StackOp::PushChild {
            parent: ctx.key,
            group_index: self.position(group_count) as usize,
        }));
        actions
    }
}

impl Hooks for LoopCoordinatorBehavior {
    fn on_mount(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        let group_count = ctx.child_group_count.max(1);
        if let Some(reps) = self.current_reps(group_count) {
            self.reps_ref = Some(ctx.memory.allocate(
                "metric:reps",
                Owner::Block(ctx.key),
                reps,
                Visibility::Public,
            ));
        }
        self.round_ref = Some(ctx.memory.allocate(
            "loop:round_index",
            Owner::Block(ctx.key),
            self.rounds(group_count),
            Visibility::Public,
        ));
        self.advance(ctx)
    }

    fn on_next(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        match (ctx.event_name, self.interval_duration_ms()) {
            // `Interval` rounds are paced by elapsed time, not by a child
            // finishing early: only a `tick` crossing the next boundary
            // pushes a fresh one.
            (Some("tick"), Some(_)) => self.advance_on_tick(ctx),
            (_, Some(_)) => Vec::new(),
            // The other three shapes advance on a generic `next` (explicit
            // advance, or a Requeue after a child pops). Any other named
            // event reaching this block is a targeted redelivery meant for a
            // different behavior (e.g. a sibling CompletionBehavior watching
            // "timer:complete"), not a cue to advance the loop itself.
            (None, None) | (Some("next"), None) => self.advance(ctx),
            (Some(_), None) => Vec::new(),
        }
    }

    fn on_dispose(&mut self, ctx: &mut BehaviorContext) {
        if let Some(r) = self.reps_ref.take() {
            ctx.memory.release(&r);
        }
        if let Some(r) = self.round_ref.take() {
            ctx.memory.release(&r);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_position_rounds_formula_matches_spec() {
        // |childGroups| = 2: after k calls to `next`, index = k-1.
        let group_count = 2usize;
        let mut lc = LoopCoordinatorBehavior::new(LoopConfig::fixed(10).unwrap());
        for k in 1..=5i64 {
            lc.index = k - 1;
            assert_eq!(lc.index, k - 1);
            assert_eq!(lc.position(group_count), (k - 1).rem_euclid(2));
            assert_eq!(lc.rounds(group_count), (k - 1).div_euclid(2));
        }
    }

    #[test]
    fn rep_scheme_cycles_by_round_not_call() {
        let lc = LoopCoordinatorBehavior::new(LoopConfig::rep_scheme(vec![21, 15, 9]).unwrap());
        let mut lc = lc;
        // 2 child groups, reps [21,15,9]: calls 1..6 see 21,21,15,15,9,9 (spec §8).
        let group_count = 2usize;
        let expected = [21, 21, 15, 15, 9, 9];
        for (k, want) in (1..=6).zip(expected) {
            lc.index = k - 1;
            let round = lc.rounds(group_count) as usize;
            if let LoopConfig::RepScheme { reps } = &lc.config {
                assert_eq!(reps[round % reps.len()], want);
            }
        }
    }

    #[test]
    fn empty_rep_scheme_is_rejected() {
        assert_eq!(LoopConfig::rep_scheme(vec![]), Err(CompileError::EmptyRepScheme));
    }

    #[test]
    fn fixed_rounds_below_one_is_rejected() {
        assert!(LoopConfig::fixed(0).is_err());
    }

    #[test]
    fn interval_ignores_next_and_only_advances_once_the_boundary_is_crossed() {
        use std::thread::sleep;
        use std::time::Duration;

        use crate::clock::Clock;
        use crate::key::KeyGenerator;
        use crate::memory::MemoryStore;

        let key = KeyGenerator::new().next();
        let mut memory = MemoryStore::new();
        let mut clock = Clock::new();
        let mut metric = wodscript_core::RuntimeMetric::new(wodscript_core::StatementId(0));
        clock.start();

        let mut lc = LoopCoordinatorBehavior::new(LoopConfig::interval(20, 3).unwrap());
        let mut ctx = BehaviorContext {
            key,
            parent: None,
            memory: &mut memory,
            clock: &mut clock,
            metric: &mut metric,
            child_group_count: 1,
            event_name: None,
        };
        lc.on_mount(&mut ctx);
        assert_eq!(lc.index, 0, "mount starts round 0 immediately");

        ctx.event_name = Some("next");
        lc.on_next(&mut ctx);
        assert_eq!(lc.index, 0, "a child finishing early must not start the next round");

        ctx.event_name = Some("tick");
        lc.on_next(&mut ctx);
        assert_eq!(lc.index, 0, "a tick before the boundary must not advance either");

        sleep(Duration::from_millis(25));
        lc.on_next(&mut ctx);
        assert_eq!(lc.index, 1, "a tick past round*interval_duration_ms advances exactly one round");
    }
}
