//! Time-slice budgets consulted by the work loop.
//!
//! The loop asks [`Deadline::should_yield`] once after every fiber visit. A
//! visit is never split, so any budget allows at least one visit per slice.

use crate::platform::Clock;

/// Remaining budget of the current slice.
pub trait Deadline {
    /// Called after each fiber visit; `true` ends the slice.
    fn should_yield(&mut self) -> bool;
}

/// Never yields. Used by [`crate::FiberRoot::flush`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn should_yield(&mut self) -> bool {
        false
    }
}

/// Allows a fixed number of fiber visits per slice.
#[derive(Debug, Clone, Copy)]
pub struct StepBudget {
    remaining: usize,
}

impl StepBudget {
    pub fn new(steps: usize) -> Self {
        Self { remaining: steps }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl Deadline for StepBudget {
    fn should_yield(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

/// Wall-clock budget measured with a [`Clock`]. Yields once less than one
/// millisecond of the budget remains, the same threshold an idle callback
/// uses.
pub struct TimeBudget<C: Clock> {
    clock: C,
    started: C::Instant,
    budget_millis: u64,
}

impl<C: Clock> TimeBudget<C> {
    pub fn new(clock: C, budget_millis: u64) -> Self {
        let started = clock.now();
        Self {
            clock,
            started,
            budget_millis,
        }
    }

    pub fn time_remaining(&self) -> u64 {
        self.budget_millis
            .saturating_sub(self.clock.elapsed_millis(self.started))
    }
}

impl<C: Clock> Deadline for TimeBudget<C> {
    fn should_yield(&mut self) -> bool {
        self.time_remaining() < 1
    }
}

impl<C: Clock> std::fmt::Debug for TimeBudget<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeBudget")
            .field("budget_millis", &self.budget_millis)
            .field("time_remaining", &self.time_remaining())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use super::*;

    #[derive(Clone, Default)]
    struct ManualClock {
        now: Arc<AtomicU64>,
    }

    impl ManualClock {
        fn advance(&self, millis: u64) {
            self.now.fetch_add(millis, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            self.now.load(Ordering::SeqCst)
        }

        fn elapsed_millis(&self, since: u64) -> u64 {
            self.now().saturating_sub(since)
        }
    }

    #[test]
    fn step_budget_counts_visits() {
        let mut budget = StepBudget::new(3);
        assert!(!budget.should_yield());
        assert!(!budget.should_yield());
        assert!(budget.should_yield());
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn empty_step_budget_still_allows_one_visit() {
        let mut budget = StepBudget::new(0);
        assert!(budget.should_yield());
    }

    #[test]
    fn time_budget_yields_below_one_millisecond() {
        let clock = ManualClock::default();
        let mut budget = TimeBudget::new(clock.clone(), 5);

        clock.advance(3);
        assert!(!budget.should_yield());
        assert_eq!(budget.time_remaining(), 2);

        clock.advance(1);
        assert!(!budget.should_yield());

        clock.advance(1);
        assert!(budget.should_yield());
    }

    #[test]
    fn unbounded_never_yields() {
        let mut deadline = Unbounded;
        assert!((0..1_000).all(|_| !deadline.should_yield()));
    }
}
