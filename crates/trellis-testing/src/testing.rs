use thiserror::Error;
use trellis_core::{
    CommitReport, Element, FiberRoot, HostError, MemoryHost, NodeId, ReconcileError, Runtime,
    RuntimeHandle, SliceOutcome, StepBudget, SurfaceOp,
};

/// Id of the container every [`FiberTestRule`] mounts into.
pub const ROOT_CONTAINER: &str = "root";

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("no element with text {0:?}")]
    TextNotFound(String),
    #[error("no content installed")]
    NoContent,
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Headless harness for exercising fiber trees in tests.
///
/// `FiberTestRule` owns an in-memory host with a single root container and
/// exposes helpers for rendering content, driving the work loop either in
/// one go or in budgeted slices, and poking at the resulting surface.
pub struct FiberTestRule {
    root: FiberRoot<MemoryHost>,
    container: NodeId,
    content: Option<Box<dyn Fn() -> Element>>,
    last_report: Option<CommitReport>,
}

impl FiberTestRule {
    pub fn new() -> Self {
        let mut host = MemoryHost::new();
        let container = host.create_container(ROOT_CONTAINER);
        Self::from_parts(FiberRoot::new(host), container)
    }

    /// Like [`FiberTestRule::new`], with a caller-supplied runtime so tests
    /// can observe slice requests.
    pub fn with_runtime(runtime: Runtime) -> Self {
        let mut host = MemoryHost::new();
        let container = host.create_container(ROOT_CONTAINER);
        Self::from_parts(FiberRoot::with_runtime(host, runtime), container)
    }

    fn from_parts(root: FiberRoot<MemoryHost>, container: NodeId) -> Self {
        Self {
            root,
            container,
            content: None,
            last_report: None,
        }
    }

    /// Installs `content` and renders it until idle.
    pub fn set_content(
        &mut self,
        content: impl Fn() -> Element + 'static,
    ) -> Result<Option<CommitReport>, RuleError> {
        self.content = Some(Box::new(content));
        self.rerender()
    }

    /// Renders the installed content again from scratch.
    pub fn rerender(&mut self) -> Result<Option<CommitReport>, RuleError> {
        self.schedule_content()?;
        self.pump_until_idle()
    }

    /// Installs `content` and schedules it without running any work, for
    /// tests that drive slices themselves.
    pub fn load_content(
        &mut self,
        content: impl Fn() -> Element + 'static,
    ) -> Result<(), RuleError> {
        self.content = Some(Box::new(content));
        self.schedule_content()
    }

    /// Schedules the installed content without running any work.
    pub fn schedule_content(&mut self) -> Result<(), RuleError> {
        let content = self.content.as_ref().ok_or(RuleError::NoContent)?;
        self.root.render(content(), self.container);
        Ok(())
    }

    /// Runs the work loop until no render pass or state update is pending.
    pub fn pump_until_idle(&mut self) -> Result<Option<CommitReport>, RuleError> {
        let report = self.root.flush()?;
        if report.is_some() {
            self.last_report = report;
        }
        Ok(report)
    }

    /// Runs slices of at most `steps` fiber visits each until the work is
    /// done, returning every slice outcome.
    pub fn run_slices_with_budget(
        &mut self,
        steps: usize,
    ) -> Result<Vec<SliceOutcome>, RuleError> {
        let mut outcomes = Vec::new();
        loop {
            let outcome = self.root.run_slice(&mut StepBudget::new(steps))?;
            if let SliceOutcome::Committed(report) = outcome {
                self.last_report = Some(report);
            }
            outcomes.push(outcome);
            if outcome.is_done() {
                return Ok(outcomes);
            }
        }
    }

    /// Clicks the innermost element whose text is `text` and pumps until
    /// idle.
    pub fn click_text(&mut self, text: &str) -> Result<Option<CommitReport>, RuleError> {
        let node = self.find_text(text)?;
        self.root.host().dispatch(node, "click")?;
        self.pump_until_idle()
    }

    pub fn find_text(&self, text: &str) -> Result<NodeId, RuleError> {
        self.host()
            .find_by_text(self.container, text)
            .ok_or_else(|| RuleError::TextNotFound(text.to_owned()))
    }

    /// Drains the surface operation log.
    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        self.root.host_mut().take_ops()
    }

    pub fn host(&self) -> &MemoryHost {
        self.root.host()
    }

    pub fn host_mut(&mut self) -> &mut MemoryHost {
        self.root.host_mut()
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn text_content(&self) -> String {
        self.host().text_content(self.container)
    }

    pub fn dump_tree(&self) -> String {
        self.host().dump_tree(self.container)
    }

    /// Report of the most recent commit driven through this rule.
    pub fn last_report(&self) -> Option<CommitReport> {
        self.last_report
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.root.runtime_handle()
    }

    /// Gain mutable access to the fiber root for advanced scenarios.
    pub fn root(&mut self) -> &mut FiberRoot<MemoryHost> {
        &mut self.root
    }
}

impl Default for FiberTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `FiberTestRule`.
pub fn run_test_fibers<R>(f: impl FnOnce(&mut FiberTestRule) -> R) -> R {
    let mut rule = FiberTestRule::new();
    f(&mut rule)
}
