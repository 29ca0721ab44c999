use std::sync::Arc;

use super::*;
use crate::runtime::{Runtime, TestScheduler};
use crate::{EffectTag, MemoryHost, NodeId, StepBudget, SurfaceOp};

fn mount() -> (FiberRoot<MemoryHost>, NodeId) {
    let mut host = MemoryHost::new();
    let container = host.create_container("root");
    (FiberRoot::new(host), container)
}

fn tree() -> Element {
    Element::host("div")
        .attr("id", "foo")
        .child(Element::host("a").child("bar"))
        .child(Element::host("b"))
}

fn drive_with_steps(root: &mut FiberRoot<MemoryHost>, steps: usize) -> Vec<SliceOutcome> {
    let mut outcomes = Vec::new();
    loop {
        let outcome = root
            .run_slice(&mut StepBudget::new(steps))
            .expect("slice succeeds");
        outcomes.push(outcome);
        if outcome.is_done() {
            return outcomes;
        }
    }
}

#[test]
fn idle_root_reports_idle() {
    let (mut root, _) = mount();
    assert_eq!(root.run_slice(&mut Unbounded).unwrap(), SliceOutcome::Idle);
    assert_eq!(root.flush().unwrap(), None);
}

#[test]
fn one_visit_per_slice_yields_until_commit() {
    let (mut root, container) = mount();
    root.render(tree(), container);

    let outcomes = drive_with_steps(&mut root, 1);

    // root, div, a, "bar", b
    assert_eq!(outcomes.len(), 5);
    assert!(outcomes[..4]
        .iter()
        .all(|outcome| *outcome == SliceOutcome::Yielded));
    assert!(matches!(
        outcomes[4],
        SliceOutcome::Committed(report) if report.placements == 4
    ));
}

#[test]
fn surface_is_untouched_until_the_pass_completes() {
    let (mut root, container) = mount();
    root.render(tree(), container);

    for _ in 0..4 {
        assert_eq!(
            root.run_slice(&mut StepBudget::new(1)).unwrap(),
            SliceOutcome::Yielded
        );
    }
    assert!(root.host().children(container).is_empty());
    assert!(!root
        .host()
        .ops()
        .iter()
        .any(|op| matches!(op, SurfaceOp::AppendChild { .. })));
    assert!(root.current_root().is_none());

    assert!(root.run_slice(&mut StepBudget::new(1)).unwrap().is_done());
    assert_eq!(root.host().text_content(container), "bar");
}

#[test]
fn step_budget_matches_unbounded_result() {
    let (mut sliced, sliced_container) = mount();
    let (mut eager, eager_container) = mount();

    sliced.render(tree(), sliced_container);
    drive_with_steps(&mut sliced, 1);
    eager.render(tree(), eager_container);
    eager.flush().unwrap();

    assert_eq!(
        sliced.host().dump_tree(sliced_container),
        eager.host().dump_tree(eager_container)
    );
    assert_eq!(sliced.host().ops(), eager.host().ops());
}

#[test]
fn pending_effects_reflect_the_pass_in_flight() {
    let (mut root, container) = mount();
    root.render(tree(), container);
    root.run_slice(&mut StepBudget::new(3)).unwrap();

    let effects: Vec<EffectTag> = root
        .pending_effects()
        .into_iter()
        .map(|(_, effect)| effect)
        .collect();
    // div and a are visited; a's text child and b are reconciled but not yet visited.
    assert_eq!(effects, vec![EffectTag::Placement; 4]);
}

#[test]
fn new_render_discards_unfinished_pass_and_its_nodes() {
    let (mut root, container) = mount();
    root.render(tree(), container);
    root.run_slice(&mut StepBudget::new(3)).unwrap();
    assert_eq!(root.host().len(), 3);

    root.render(Element::host("p"), container);

    assert!(root.host().ops().contains(&SurfaceOp::Dispose { id: 1 }));
    assert!(root.host().ops().contains(&SurfaceOp::Dispose { id: 2 }));
    assert_eq!(root.host().len(), 1);

    root.flush().unwrap();
    assert_eq!(root.host().children(container), &[3]);
    assert_eq!(root.host().tag(3), Some("p"));
    let current = root.current_root().expect("committed");
    assert_eq!(root.tree().len(), root.tree().subtree(current).len());
}

#[test]
fn failed_initial_sync_fails_the_pass() {
    let (mut root, container) = mount();
    root.host_mut().reject_attribute("href");
    root.render(Element::host("div").child(Element::host("a").attr("href", "#")), container);

    let err = root.flush().expect_err("href is rejected");

    assert!(matches!(err, ReconcileError::Host(_)));
    assert!(!root.has_pending_work());
    assert!(root.tree().is_empty());
    // The div was created and then thrown away along with the pass; the
    // rejected anchor never made it into a fiber.
    assert_eq!(root.host().len(), 1);
}

#[test]
fn render_into_resolves_container_by_id() {
    let (mut root, container) = mount();

    root.render_into(Element::host("main"), "root").unwrap();
    root.flush().unwrap();

    assert_eq!(root.host().tag(root.host().children(container)[0]), Some("main"));
}

#[test]
fn render_into_missing_container_schedules_nothing() {
    let (mut root, _) = mount();

    let err = root.render_into(Element::host("main"), "nowhere").unwrap_err();

    assert_eq!(err, ReconcileError::MissingContainer("nowhere".into()));
    assert!(!root.has_pending_work());
    assert!(!root.runtime().needs_slice());
}

#[test]
fn environment_is_asked_for_more_slices() {
    let scheduler = Arc::new(TestScheduler::default());
    let mut host = MemoryHost::new();
    let container = host.create_container("root");
    let mut root = FiberRoot::with_runtime(host, Runtime::new(scheduler.clone()));

    root.render(tree(), container);
    assert_eq!(scheduler.slices(), 1);
    assert!(root.runtime().needs_slice());

    root.run_slice(&mut StepBudget::new(1)).unwrap();
    assert_eq!(scheduler.slices(), 2);

    root.flush().unwrap();
    assert!(!root.runtime().needs_slice());
}
