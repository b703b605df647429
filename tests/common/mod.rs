//! Shared page fixtures for the integration tests.

#![allow(dead_code)]

use a11y_dialog::{Dom, HeadlessDom, NodeId};

/// `#open` trigger, `#d` dialog with three buttons and a `[data-close]`
/// control, and an unrelated `#elsewhere` button.
pub struct Page {
    pub dom: HeadlessDom,
    pub open: NodeId,
    pub dialog: NodeId,
    pub first: NodeId,
    pub middle: NodeId,
    pub last: NodeId,
    pub close: NodeId,
    pub elsewhere: NodeId,
}

pub fn page() -> Page {
    let dom = HeadlessDom::new();
    let body = dom.body();

    let open = dom.append_with(body, "button", &[("id", "open")]);
    let dialog = dom.append_with(body, "div", &[("id", "d")]);
    let first = dom.append_with(dialog, "button", &[("id", "first")]);
    let middle = dom.append_with(dialog, "button", &[("id", "middle")]);
    let close = dom.append_with(dialog, "button", &[("id", "close"), ("data-close", "")]);
    let last = dom.append_with(dialog, "a", &[("id", "last"), ("href", "#")]);
    let elsewhere = dom.append_with(body, "button", &[("id", "elsewhere")]);

    Page {
        dom,
        open,
        dialog,
        first,
        middle,
        last,
        close,
        elsewhere,
    }
}

pub fn attr(dom: &HeadlessDom, node: NodeId, name: &str) -> Option<String> {
    dom.attribute(&node, name)
}
