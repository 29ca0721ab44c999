//! Standard runtime services backed by Rust's `std` library.
//!
//! Applications construct a [`StdRuntime`], hand its [`Runtime`] to
//! [`trellis_core::FiberRoot`] and call [`StdRuntime::pump`] whenever the
//! registered slice waker fires. Each slice gets a fresh wall-clock budget.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use trellis_core::{
    Clock, CommitReport, FiberRoot, HostAdapter, ReconcileError, Runtime, RuntimeScheduler,
    SliceOutcome, TimeBudget,
};

type SliceWaker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Records slice requests in a flag and forwards them to an optional waker,
/// typically one that posts to an event loop.
#[derive(Default)]
struct StdScheduler {
    slice_requested: AtomicBool,
    waker: RwLock<Option<SliceWaker>>,
}

impl StdScheduler {
    fn take_request(&self) -> bool {
        self.slice_requested.swap(false, Ordering::SeqCst)
    }

    fn set_waker(&self, waker: SliceWaker) {
        *self.waker.write().unwrap_or_else(PoisonError::into_inner) = Some(waker);
    }
}

impl RuntimeScheduler for StdScheduler {
    fn schedule_slice(&self) {
        self.slice_requested.store(true, Ordering::SeqCst);
        let waker = self
            .waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

/// Clock implementation backed by [`std::time::Instant`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn elapsed_millis(&self, since: Self::Instant) -> u64 {
        u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// What one [`StdRuntime::pump`] call did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpSummary {
    /// Slices run, including ones that found nothing to do.
    pub slices: usize,
    /// Slices that ran out of budget with work left.
    pub yielded: usize,
    pub commits: usize,
    pub last_commit: Option<CommitReport>,
}

impl PumpSummary {
    fn record(&mut self, outcome: SliceOutcome) {
        self.slices += 1;
        match outcome {
            SliceOutcome::Idle => {}
            SliceOutcome::Yielded => self.yielded += 1,
            SliceOutcome::Committed(report) => {
                self.commits += 1;
                self.last_commit = Some(report);
            }
        }
    }
}

/// Scheduler, clock and core runtime wired together.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    runtime: Runtime,
}

impl StdRuntime {
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self { scheduler, runtime }
    }

    /// The [`trellis_core::Runtime`] to build a `FiberRoot` with.
    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    /// Registers `waker`, called every time the work loop asks for another
    /// slice. It may run on whichever thread posted the request.
    pub fn set_slice_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_waker(Arc::new(waker));
    }

    /// Whether a slice was requested and no pump has served it yet.
    pub fn has_slice_request(&self) -> bool {
        self.scheduler.slice_requested.load(Ordering::SeqCst)
    }

    /// Starts a wall-clock budget of `budget_millis` for one slice.
    pub fn deadline(&self, budget_millis: u64) -> TimeBudget<StdClock> {
        TimeBudget::new(StdClock, budget_millis)
    }

    /// Serves slice requests until none is left, giving each slice a fresh
    /// `budget_millis` deadline.
    pub fn pump<H: HostAdapter>(
        &self,
        root: &mut FiberRoot<H>,
        budget_millis: u64,
    ) -> Result<PumpSummary, ReconcileError> {
        let started = StdClock.now();
        let mut summary = PumpSummary::default();
        while self.scheduler.take_request() {
            summary.record(root.run_slice(&mut self.deadline(budget_millis))?);
        }
        log::debug!(
            "pump ran {} slices ({} yielded, {} commits) in {} ms",
            summary.slices,
            summary.yielded,
            summary.commits,
            StdClock.elapsed_millis(started)
        );
        Ok(summary)
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("slice_requested", &self.has_slice_request())
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use trellis_core::{Element, FiberRoot, Hooks, MemoryHost, Props};

    use super::{PumpSummary, StdRuntime};

    fn counter(hooks: &mut Hooks<'_>, _: &Props) -> Element {
        let (count, set_count) = hooks.use_state(0u32);
        Element::host("button")
            .on("Click", move |_| set_count.update(|count| count + 1))
            .child(format!("Clicked {count} times"))
    }

    #[test]
    fn state_change_wakes_and_pump_rerenders() {
        let runtime = StdRuntime::new();
        let wakes = Arc::new(AtomicUsize::new(0));
        let wake_counter = Arc::clone(&wakes);
        runtime.set_slice_waker(move || {
            wake_counter.fetch_add(1, Ordering::SeqCst);
        });
        let mut host = MemoryHost::new();
        let container = host.create_container("app");
        let mut root = FiberRoot::with_runtime(host, runtime.runtime());

        root.render(Element::component("Counter", counter), container);
        assert!(runtime.has_slice_request());
        let mounted = runtime.pump(&mut root, 16).expect("initial render");
        assert_eq!(mounted.commits, 1);
        assert_eq!(mounted.last_commit.map(|report| report.placements), Some(2));
        assert!(!runtime.has_slice_request());

        let button = root
            .host()
            .find_by_text(container, "Clicked 0 times")
            .expect("button rendered");
        root.host().dispatch(button, "click").expect("dispatch");

        assert!(wakes.load(Ordering::SeqCst) >= 2);
        let clicked = runtime.pump(&mut root, 16).expect("rerender");
        assert_eq!(clicked.commits, 1);
        assert_eq!(root.host().text_content(container), "Clicked 1 times");
    }

    #[test]
    fn pump_without_requests_runs_nothing() {
        let runtime = StdRuntime::new();
        let mut root = FiberRoot::with_runtime(MemoryHost::new(), runtime.runtime());

        assert_eq!(
            runtime.pump(&mut root, 16).expect("pump"),
            PumpSummary::default()
        );
    }

    #[test]
    fn std_deadline_has_budget_at_start() {
        let runtime = StdRuntime::new();
        let deadline = runtime.deadline(10_000);
        assert!(deadline.time_remaining() > 9_000);
    }
}
