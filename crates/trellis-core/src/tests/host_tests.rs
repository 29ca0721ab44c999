use std::rc::Rc;

use super::*;
use crate::element::Event;

#[test]
fn classify_follows_key_conventions() {
    assert_eq!(classify("children"), PropKind::Children);
    assert_eq!(classify("onClick"), PropKind::Listener("click".into()));
    assert_eq!(classify("onMouseDown"), PropKind::Listener("mousedown".into()));
    assert_eq!(classify("id"), PropKind::Attribute);
    assert_eq!(classify("one"), PropKind::Attribute);
    assert_eq!(classify("on"), PropKind::Attribute);
}

#[test]
fn equal_props_need_no_changes() {
    let listener: Listener = Rc::new(|_: &Event| {});
    let props = Props::new()
        .with("id", "a")
        .with("onClick", PropValue::Listener(listener));

    assert!(prop_changes(&props, &props.clone()).is_empty());
}

#[test]
fn changes_come_out_in_surface_order() {
    let old_listener: Listener = Rc::new(|_: &Event| {});
    let new_listener: Listener = Rc::new(|_: &Event| {});
    let prev = Props::new()
        .with("id", "a")
        .with("title", "gone")
        .with("onClick", PropValue::Listener(old_listener));
    let next = Props::new()
        .with("id", "b")
        .with("lang", "en")
        .with("onClick", PropValue::Listener(new_listener));

    let summary: Vec<String> = prop_changes(&prev, &next)
        .iter()
        .map(|change| format!("{change:?}"))
        .collect();

    assert_eq!(
        summary,
        ["-on:click", "-title", "id=\"b\"", "lang=\"en\"", "+on:click"]
    );
}

#[test]
fn listener_key_without_a_listener_is_skipped() {
    let next = Props::new().with("onClick", "not a function");

    assert!(prop_changes(&Props::new(), &next).is_empty());
}
