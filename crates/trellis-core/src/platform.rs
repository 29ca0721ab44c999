//! Platform abstraction traits for the Trellis work loop.
//!
//! The reconciler never asks the environment for time or for another turn
//! directly. A host wires these traits to whatever it has: an idle callback,
//! a timer, or a plain event loop.

/// Asks the environment to run another work slice.
///
/// Implementations must be safe to share across threads even though the
/// reconciler itself stays on one thread.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host invoke [`crate::FiberRoot::run_slice`] again
    /// soon.
    fn schedule_slice(&self);
}

/// Provides timing information for slice deadlines.
pub trait Clock: Send + Sync {
    /// Instant type produced by this clock implementation.
    type Instant: Copy + Send + Sync;

    /// Returns the current instant.
    fn now(&self) -> Self::Instant;

    /// Returns the number of milliseconds elapsed since `since`.
    fn elapsed_millis(&self, since: Self::Instant) -> u64;
}
