use wodscript_core::TimerDirection;

use super::{BehaviorContext, Hooks};
use crate::action::Action;
use crate::event::Event;
use crate::memory::{MemoryRef, Owner, Visibility};

/// Mirrors `spec.md` §4.5 TimerBehavior: counts up or down, publishing
/// `isRunning`/elapsed through public memory so children and UI can read it.
pub struct TimerBehavior {
    direction: TimerDirection,
    duration_ms: Option<i64>,
    running_ref: Option<MemoryRef<bool>>,
    elapsed_ref: Option<MemoryRef<i64>>,
    completed: bool,
}

impl TimerBehavior {
    pub fn new(direction: TimerDirection, duration_ms: Option<i64>) -> Self {
        TimerBehavior { direction, duration_ms, running_ref: None, elapsed_ref: None, completed: false }
    }

    /// Rounds elapsed time to the nearest 0.1s, per spec's `getDisplayTime()`.
    pub fn display_time_ms(elapsed_ms: i64) -> i64 {
        ((elapsed_ms as f64 / 100.0).round() * 100.0) as i64
    }

    fn remaining_ms(&self, elapsed_ms: i64) -> Option<i64> {
        self.duration_ms.map(|d| (d - elapsed_ms).max(0))
    }

    fn owner(&self, ctx: &BehaviorContext) -> Owner {
        Owner::Block(ctx.key)
    }
}

impl Hooks for TimerBehavior {
    fn on_mount(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        ctx.clock.start();
        let owner = self.owner(ctx);
        self.running_ref = Some(ctx.memory.allocate("timer:is_running", owner, true, Visibility::Public));
        self.elapsed_ref = Some(ctx.memory.allocate("timer:elapsed_ms", owner, 0i64, Visibility::Public));
        vec![Action::Emit(Event::new("timer:start"))]
    }

    fn on_next(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        if self.completed {
            return Vec::new();
        }
        let elapsed = ctx.clock.elapsed_ms();
        if let Some(r) = &self.elapsed_ref {
            ctx.memory.set(r, elapsed);
        }
        match self.direction {
            TimerDirection::Up => Vec::new(),
            TimerDirection::Down => {
                let remaining = self.remaining_ms(elapsed).unwrap_or(0);
                if remaining == 0 && !self.completed {
                    self.completed = true;
                    return vec![Action::Emit(Event::targeted("timer:complete", ctx.key))];
                }
                Vec::new()
            }
        }
    }

    fn on_unmount(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        ctx.clock.stop();
        if let Some(r) = &self.running_ref {
            ctx.memory.set(r, false);
        }
        vec![Action::Emit(Event::new("timer:stop"))]
    }

    fn on_dispose(&mut self, ctx: &mut BehaviorContext) {
        if let Some(r) = self.running_ref.take() {
            ctx.memory.release(&r);
        }
        if let Some(r) = self.elapsed_ref.take() {
            ctx.memory.release(&r);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_time_rounds_to_nearest_tenth_of_a_second() {
        assert_eq!(TimerBehavior::display_time_ms(1049), 1000);
        assert_eq!(TimerBehavior::display_time_ms(1050), 1100);
    }

    #[test]
    fn countdown_remaining_never_goes_negative() {
        let timer = TimerBehavior::new(TimerDirection::Down, Some(1000));
        assert_eq!(timer.remaining_ms(1500), Some(0));
        assert_eq!(timer.remaining_ms(0), Some(1000));
    }
}
