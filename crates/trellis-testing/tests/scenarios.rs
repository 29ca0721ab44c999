use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use trellis_core::{
    build, children, Element, ElementType, Hooks, Props, Runtime, RuntimeScheduler, SliceOutcome,
    SurfaceOp,
};
use trellis_testing::{FiberTestRule, RuleError};

fn labelled_counter(hooks: &mut Hooks<'_>, props: &Props) -> Element {
    let label = props
        .get("label")
        .and_then(|value| value.as_str())
        .unwrap_or("Count")
        .to_owned();
    let (count, set_count) = hooks.use_state(1i64);
    Element::host("button")
        .on("Click", move |_| set_count.update(|count| count + 1))
        .child(format!("{label}: {count}"))
}

fn todo_list(hooks: &mut Hooks<'_>, _: &Props) -> Element {
    let (items, set_items) = hooks.use_state(Vec::<String>::new());
    let add = set_items.clone();
    Element::host("div")
        .child(
            Element::host("button")
                .on("Click", move |_| {
                    add.update(|items| {
                        let mut next = items.clone();
                        next.push(format!("Task {}", items.len() + 1));
                        next
                    })
                })
                .child("Add"),
        )
        .child(
            Element::host("button")
                .on("Click", move |_| set_items.set(Vec::new()))
                .child("Clear"),
        )
        .child(
            Element::host("ul")
                .children_from(items.iter().map(|item| Element::host("li").child(item.as_str()))),
        )
}

fn scenario() -> Element {
    build(
        ElementType::host("div"),
        Props::new().with("id", "foo"),
        children![
            build(ElementType::host("a"), Props::new(), children!["bar"]),
            Element::host("b"),
        ],
    )
}

fn count(ops: &[SurfaceOp], predicate: impl Fn(&SurfaceOp) -> bool) -> usize {
    ops.iter().filter(|op| predicate(op)).count()
}

#[test]
fn static_tree_mounts_once_and_then_stays_put() {
    let mut rule = FiberTestRule::new();
    let container = rule.container();

    rule.set_content(scenario).expect("first render");
    let ops = rule.take_ops();

    assert_eq!(count(&ops, |op| matches!(op, SurfaceOp::CreateNode { .. })), 3);
    assert_eq!(count(&ops, |op| matches!(op, SurfaceOp::CreateText { .. })), 1);
    let sets_id = |op: &SurfaceOp| {
        matches!(op, SurfaceOp::SetAttribute { key, value, .. } if key == "id" && value == "foo")
    };
    assert_eq!(count(&ops, sets_id), 1);
    let appends_inside = |op: &SurfaceOp| {
        matches!(op, SurfaceOp::AppendChild { parent, .. } if *parent != container)
    };
    assert_eq!(count(&ops, appends_inside), 3);
    let mounts = |op: &SurfaceOp| {
        matches!(op, SurfaceOp::AppendChild { parent, .. } if *parent == container)
    };
    assert_eq!(count(&ops, mounts), 1);

    let report = rule.rerender().expect("second render").expect("commit");
    assert!(report.is_noop());
    assert!(rule.take_ops().is_empty());
    assert_eq!(
        rule.dump_tree(),
        "<#container id=\"root\">\n  <div id=\"foo\">\n    <a>\n      \"bar\"\n    <b>\n"
    );
}

#[test]
fn counter_click_changes_exactly_one_text() {
    let mut rule = FiberTestRule::new();
    rule.set_content(|| Element::component("Counter", labelled_counter))
        .expect("render");
    rule.take_ops();

    let report = rule.click_text("Count: 1").expect("click").expect("commit");

    let ops = rule.take_ops();
    let texts: Vec<&str> = ops
        .iter()
        .filter_map(|op| match op {
            SurfaceOp::SetText { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, ["Count: 2"]);
    assert!(ops.iter().all(|op| !matches!(
        op,
        SurfaceOp::CreateNode { .. } | SurfaceOp::CreateText { .. } | SurfaceOp::RemoveChild { .. }
    )));
    assert_eq!(report.placements, 0);
    assert_eq!(report.deletions, 0);
}

#[test]
fn sibling_components_keep_separate_state() {
    let mut rule = FiberTestRule::new();
    rule.set_content(|| {
        Element::host("div")
            .child(Element::component("Counter", labelled_counter).attr("label", "A"))
            .child(Element::component("Counter", labelled_counter).attr("label", "B"))
    })
    .expect("render");

    rule.click_text("A: 1").expect("click A");
    rule.click_text("A: 2").expect("click A again");
    rule.click_text("B: 1").expect("click B");

    assert_eq!(rule.text_content(), "A: 3B: 2");
}

#[test]
fn list_grows_and_clears_through_state() {
    let mut rule = FiberTestRule::new();
    rule.set_content(|| Element::component("Todos", todo_list))
        .expect("render");

    let first = rule.click_text("Add").expect("add").expect("commit");
    assert_eq!(first.placements, 2);
    rule.click_text("Add").expect("add again");
    assert_eq!(rule.text_content(), "AddClearTask 1Task 2");

    let cleared = rule.click_text("Clear").expect("clear").expect("commit");
    assert_eq!(cleared.deletions, 2);
    assert_eq!(rule.text_content(), "AddClear");
}

#[test]
fn swapping_component_type_resets_its_state() {
    let mut rule = FiberTestRule::new();
    let show_list = std::rc::Rc::new(std::cell::Cell::new(false));
    let toggle = std::rc::Rc::clone(&show_list);
    rule.set_content(move || {
        if toggle.get() {
            Element::component("Todos", todo_list)
        } else {
            Element::component("Counter", labelled_counter)
        }
    })
    .expect("render");
    rule.click_text("Count: 1").expect("click");

    show_list.set(true);
    let report = rule.rerender().expect("swap").expect("commit");
    assert_eq!(report.deletions, 1);
    assert_eq!(rule.text_content(), "AddClear");

    show_list.set(false);
    rule.rerender().expect("swap back");
    assert_eq!(rule.text_content(), "Count: 1");
}

#[test]
fn sliced_rendering_matches_one_shot_rendering() {
    let content = || {
        Element::host("section")
            .child(Element::component("Todos", todo_list))
            .child(Element::component("Counter", labelled_counter))
    };
    let mut eager = FiberTestRule::new();
    eager.set_content(content).expect("eager render");

    let mut sliced = FiberTestRule::new();
    sliced.load_content(content).expect("schedule");
    let outcomes = sliced.run_slices_with_budget(1).expect("slices");

    assert!(outcomes.len() > 1);
    assert!(outcomes[..outcomes.len() - 1]
        .iter()
        .all(|outcome| *outcome == SliceOutcome::Yielded));
    assert!(matches!(outcomes.last(), Some(SliceOutcome::Committed(_))));
    assert_eq!(sliced.dump_tree(), eager.dump_tree());
    assert_eq!(sliced.take_ops(), eager.take_ops());
}

#[derive(Default)]
struct CountingScheduler(AtomicUsize);

impl CountingScheduler {
    fn slices(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl RuntimeScheduler for CountingScheduler {
    fn schedule_slice(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn each_click_asks_the_environment_for_one_slice() {
    let scheduler = Arc::new(CountingScheduler::default());
    let runtime = Runtime::new(scheduler.clone());
    let mut rule = FiberTestRule::with_runtime(runtime.clone());

    rule.set_content(|| Element::component("Counter", labelled_counter))
        .expect("render");
    assert_eq!(scheduler.slices(), 1);
    assert_eq!(runtime.render_requests(), 0);

    rule.click_text("Count: 1").expect("first click");
    rule.click_text("Count: 2").expect("second click");

    assert_eq!(scheduler.slices(), 3);
    assert_eq!(runtime.render_requests(), 2);
    assert!(!rule.root().has_pending_work());
    assert_eq!(rule.text_content(), "Count: 3");
}

#[test]
fn clicking_missing_text_reports_it() {
    let mut rule = FiberTestRule::new();
    rule.set_content(|| Element::component("Counter", labelled_counter))
        .expect("render");

    let err = rule.click_text("Count: 7").unwrap_err();

    assert!(matches!(err, RuleError::TextNotFound(_)));
    assert_eq!(err.to_string(), "no element with text \"Count: 7\"");
}
