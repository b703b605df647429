//! Create / open / close / destroy transitions and the DOM they leave behind.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use a11y_dialog::{Dialog, DialogOptions, Dom, DomEvent, Hooks, Listener, NodeId};
use common::{attr, page};

fn options() -> DialogOptions {
    DialogOptions::default()
        .opening("#open")
        .closing("[data-close]")
}

fn snapshot(dom: &a11y_dialog::HeadlessDom, nodes: &[NodeId]) -> Vec<Vec<Option<String>>> {
    let names = [
        "role",
        "tabindex",
        "aria-hidden",
        "aria-modal",
        "aria-haspopup",
        "class",
    ];
    nodes
        .iter()
        .map(|node| names.iter().map(|name| attr(dom, *node, name)).collect())
        .collect()
}

#[test]
fn open_and_escape_round_trip() {
    let p = page();
    let mut dialog = Dialog::new(p.dom.host(), "#d", options().deferred());

    dialog.create();
    assert_eq!(attr(&p.dom, p.dialog, "aria-hidden").as_deref(), Some("true"));
    assert_eq!(attr(&p.dom, p.open, "aria-haspopup").as_deref(), Some("dialog"));

    p.dom.dispatch(&mut [&mut dialog], &DomEvent::click(p.open));
    assert!(dialog.is_open());
    assert_eq!(attr(&p.dom, p.dialog, "aria-hidden").as_deref(), Some("false"));
    assert_eq!(attr(&p.dom, p.dialog, "aria-modal").as_deref(), Some("true"));
    assert_eq!(dialog.opening_trigger(), Some(&p.open));

    let disposition = p
        .dom
        .dispatch(&mut [&mut dialog], &DomEvent::key("Escape", p.dialog));
    assert!(disposition.stop_propagation);
    assert!(!dialog.is_open());
    assert_eq!(attr(&p.dom, p.dialog, "aria-hidden").as_deref(), Some("true"));
}

#[test]
fn create_and_destroy_are_idempotent() {
    let p = page();
    let nodes = [p.dialog, p.open];
    let mut dialog = Dialog::new(p.dom.host(), "#d", options().deferred());

    dialog.create();
    let once = snapshot(&p.dom, &nodes);
    let listeners = dialog.listeners().to_vec();
    dialog.create();
    assert_eq!(snapshot(&p.dom, &nodes), once);
    assert_eq!(dialog.listeners(), listeners.as_slice());

    dialog.destroy();
    let once = snapshot(&p.dom, &nodes);
    dialog.destroy();
    assert_eq!(snapshot(&p.dom, &nodes), once);
    assert!(!dialog.is_created());
}

#[test]
fn destroy_strips_attributes_and_listeners() {
    let p = page();
    let options = DialogOptions {
        labelledby: Some("title".into()),
        ..options()
    };
    let mut dialog = Dialog::new(p.dom.host(), "#d", options);
    let html = p.dom.document_element();
    p.dom.dispatch(&mut [&mut dialog], &DomEvent::click(p.open));
    assert!(dialog.is_open());
    assert!(p.dom.has_class(&html, "is-disabled"));

    dialog.destroy();

    assert!(!dialog.is_open());
    assert!(!dialog.is_created());
    assert!(!p.dom.has_class(&html, "is-disabled"));
    for name in [
        "role",
        "tabindex",
        "aria-hidden",
        "aria-modal",
        "aria-labelledby",
    ] {
        assert_eq!(attr(&p.dom, p.dialog, name), None, "{} left behind", name);
    }
    assert_eq!(attr(&p.dom, p.open, "aria-haspopup"), None);
    assert!(!p.dom.has_class(&p.open, "is-active"));
    assert!(dialog.listeners().is_empty());
    assert!(dialog.dom().listeners().is_empty());

    // A destroyed dialog ignores its old triggers.
    p.dom.dispatch(&mut [&mut dialog], &DomEvent::click(p.open));
    assert!(!dialog.is_open());
}

#[test]
fn destroyed_dialog_can_be_created_again() {
    let p = page();
    let mut dialog = Dialog::new(p.dom.host(), "#d", options());

    dialog.destroy();
    dialog.create();
    p.dom.dispatch(&mut [&mut dialog], &DomEvent::click(p.open));

    assert!(dialog.is_open());
    assert_eq!(attr(&p.dom, p.dialog, "role").as_deref(), Some("dialog"));
}

#[test]
fn listeners_follow_the_open_state() {
    let p = page();
    let mut dialog = Dialog::new(p.dom.host(), "#d", options());

    assert!(dialog.listeners().contains(&Listener::TriggerClick));
    assert!(dialog.listeners().contains(&Listener::Mutations(p.dialog)));
    assert!(!dialog.listeners().contains(&Listener::DismissClick));

    dialog.open();
    assert!(dialog.listeners().contains(&Listener::DismissClick));
    assert!(dialog.listeners().contains(&Listener::DialogKeydown(p.dialog)));
    assert!(dialog.listeners().contains(&Listener::ClosingClick(p.close)));
    assert!(dialog.dom().is_listening(&Listener::ClosingClick(p.close)));

    dialog.close();
    assert!(!dialog.listeners().contains(&Listener::DismissClick));
    assert!(!dialog.listeners().contains(&Listener::DialogKeydown(p.dialog)));
    assert!(!dialog.dom().is_listening(&Listener::ClosingClick(p.close)));
    assert!(dialog.listeners().contains(&Listener::TriggerClick));
}

#[test]
fn hooks_see_the_dialog_and_its_trigger() {
    let p = page();
    let calls: Rc<RefCell<Vec<(&'static str, NodeId, Option<NodeId>)>>> = Rc::default();

    let opened = Rc::clone(&calls);
    let closed = Rc::clone(&calls);
    let hooks = Hooks::new()
        .on_open(move |dialog: &NodeId, trigger: Option<&NodeId>| {
            opened.borrow_mut().push(("open", *dialog, trigger.copied()));
        })
        .on_close(move |dialog: &NodeId, trigger: Option<&NodeId>| {
            closed.borrow_mut().push(("close", *dialog, trigger.copied()));
        });
    let mut dialog = Dialog::with_hooks(p.dom.host(), "#d", options(), hooks);

    dialog.open();
    dialog.open();
    dialog.close();
    dialog.close();
    p.dom.dispatch(&mut [&mut dialog], &DomEvent::click(p.open));

    assert_eq!(
        *calls.borrow(),
        vec![
            ("open", p.dialog, None),
            ("close", p.dialog, None),
            ("open", p.dialog, Some(p.open)),
        ]
    );
}

#[test]
fn closing_controls_close_from_nested_targets() {
    let p = page();
    let icon = p.dom.append(p.close, "span");
    let mut dialog = Dialog::new(p.dom.host(), "#d", options());

    dialog.open();
    p.dom.dispatch(&mut [&mut dialog], &DomEvent::click(p.middle));
    assert!(dialog.is_open());

    p.dom.dispatch(&mut [&mut dialog], &DomEvent::click(icon));
    assert!(!dialog.is_open());
}

#[test]
fn closing_selector_is_scoped_to_the_dialog() {
    let p = page();
    let outside = p
        .dom
        .append_with(p.dom.body(), "button", &[("data-close", "")]);
    let mut dialog = Dialog::new(p.dom.host(), "#d", options());

    dialog.open();
    p.dom.dispatch(&mut [&mut dialog], &DomEvent::click(outside));

    assert!(dialog.is_open());
}

#[test]
fn triggers_added_after_creation_open_the_dialog() {
    let p = page();
    let mut dialog = Dialog::new(
        p.dom.host(),
        "#d",
        DialogOptions::default().opening(".js-open"),
    );

    let late = p
        .dom
        .append_with(p.dom.body(), "button", &[("class", "js-open")]);
    let label = p.dom.append(late, "span");
    assert_eq!(attr(&p.dom, late, "aria-haspopup"), None);

    p.dom.dispatch(&mut [&mut dialog], &DomEvent::click(label));

    assert!(dialog.is_open());
    assert_eq!(dialog.opening_trigger(), Some(&late));
    assert_eq!(attr(&p.dom, late, "aria-haspopup").as_deref(), Some("dialog"));
    assert!(p.dom.has_class(&late, "is-active"));

    // Rediscovered triggers lose the attribute on destroy like the rest.
    dialog.destroy();
    assert_eq!(attr(&p.dom, late, "aria-haspopup"), None);
}

#[test]
fn trigger_click_toggles_an_open_dialog_closed() {
    let p = page();
    let mut dialog = Dialog::new(p.dom.host(), "#d", options());

    p.dom.dispatch(&mut [&mut dialog], &DomEvent::click(p.open));
    assert!(p.dom.has_class(&p.open, "is-active"));

    p.dom.dispatch(&mut [&mut dialog], &DomEvent::click(p.open));
    assert!(!dialog.is_open());
    assert!(!p.dom.has_class(&p.open, "is-active"));
}

#[test]
fn helpers_mirror_the_open_state() {
    let p = page();
    let helper = p
        .dom
        .append_with(p.dom.body(), "div", &[("class", "js-helper")]);
    let mut dialog = Dialog::new(p.dom.host(), "#d", options().helpers(".js-helper"));

    dialog.open();
    assert!(p.dom.has_class(&helper, "is-active"));
    dialog.close();
    assert!(!p.dom.has_class(&helper, "is-active"));

    dialog.open();
    dialog.destroy();
    assert!(!p.dom.has_class(&helper, "is-active"));
}

#[test]
fn instance_active_class_overrides_the_default() {
    let p = page();
    let options = DialogOptions {
        opening_trigger_active_class: Some("is-pressed".into()),
        ..options()
    };
    let mut dialog = Dialog::new(p.dom.host(), "#d", options);

    p.dom.dispatch(&mut [&mut dialog], &DomEvent::click(p.open));

    assert!(p.dom.has_class(&p.open, "is-pressed"));
    assert!(!p.dom.has_class(&p.open, "is-active"));
}

#[test]
fn mutations_refresh_the_focus_trap_while_created() {
    let p = page();
    let mut dialog = Dialog::new(p.dom.host(), "#d", options());
    assert_eq!(dialog.focusable_elements().len(), 4);

    let extra = p.dom.append(p.dialog, "textarea");
    assert_eq!(dialog.focusable_elements().len(), 4);
    p.dom.dispatch(&mut [&mut dialog], &DomEvent::Mutation(extra));
    assert_eq!(dialog.last_focusable_element(), Some(&extra));

    // Mutations elsewhere in the page are not observed.
    let unrelated = p.dom.append(p.dom.body(), "textarea");
    p.dom.dispatch(&mut [&mut dialog], &DomEvent::Mutation(unrelated));
    assert_eq!(dialog.focusable_elements().len(), 5);

    dialog.destroy();
    p.dom.remove(extra);
    p.dom.dispatch(&mut [&mut dialog], &DomEvent::Mutation(p.dialog));
    assert_eq!(dialog.focusable_elements().len(), 5);
}
