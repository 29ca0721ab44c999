#![doc = r"Incremental UI-tree reconciler: elements, fibers, a resumable work loop and local state."]

pub mod commit;
pub mod deadline;
pub mod element;
pub mod error;
pub mod fiber;
pub mod hooks;
pub mod host;
pub mod memory_host;
pub mod platform;
mod reconcile;
pub mod root;
pub mod runtime;
pub mod scheduler;

pub use commit::CommitReport;
pub use deadline::{Deadline, StepBudget, TimeBudget, Unbounded};
pub use element::{
    build, build_text, Child, Component, Element, ElementType, Event, Listener, PropValue, Props,
    RenderFnPtr, CHILDREN, NODE_VALUE,
};
pub use error::{HostError, ReconcileError};
pub use fiber::{EffectTag, Fiber, FiberId, FiberTree};
pub use hooks::{Hooks, StateSetter};
pub use host::{classify, prop_changes, HostAdapter, PropChange, PropKind};
pub use memory_host::{MemoryHost, NodeId, SurfaceOp};
pub use platform::{Clock, RuntimeScheduler};
pub use root::FiberRoot;
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};
pub use scheduler::SliceOutcome;
