use thiserror::Error;

use crate::fiber::FiberId;

/// Failure reported by a host surface.
///
/// Node handles are carried in their `Debug` rendering so the error stays
/// independent of the adapter's handle type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("host node {node} missing")]
    MissingNode { node: String },
    #[error("host rejected `{key}` on node {node}")]
    Rejected { node: String, key: String },
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: String, child: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("root container `{0}` not found")]
    MissingContainer(String),
    #[error("component `{component}` broke hook order at index {index}: {detail}")]
    HookOrder {
        component: String,
        index: usize,
        detail: String,
    },
    #[error("fiber {0:?} is no longer alive")]
    MissingFiber(FiberId),
    #[error("fiber {0:?} has no ancestor owning a host node")]
    DetachedFiber(FiberId),
}
