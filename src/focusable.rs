//! Which elements inside a dialog take part in its focus trap.

use crate::dom::Dom;

/// Keyboard focusable elements.  Negative `tabindex` opts out, radios only
/// count when checked (the browser tabs to the checked one of a group).
pub const FOCUSABLE_SELECTORS: [&str; 8] = [
    "[href]:not([tabindex^=\"-\"])",
    "input:not([disabled]):not([type=\"hidden\"]):not([tabindex^=\"-\"]):not([type=\"radio\"])",
    "input[type=\"radio\"]:checked",
    "select:not([disabled]):not([tabindex^=\"-\"])",
    "textarea:not([disabled]):not([tabindex^=\"-\"])",
    "button:not([disabled]):not([tabindex^=\"-\"])",
    "[tabindex]:not([tabindex^=\"-\"])",
    "[contenteditable=\"true\"]:not([tabindex^=\"-\"])",
];

/// Marks a nested dialog region.
pub const NESTED_DIALOG_SELECTOR: &str = "[role=\"dialog\"]";

/// The selector list as a single comma-separated string.
pub fn focusable_selector() -> String {
    FOCUSABLE_SELECTORS.join(", ")
}

/// Keep elements with a non-zero width or height.
pub fn visible_elements<D: Dom>(dom: &D, elements: Vec<D::Node>) -> Vec<D::Node> {
    elements
        .into_iter()
        .filter(|element| dom.size(element).is_rendered())
        .collect()
}

/// Drop elements that live inside a region matching `selector` below
/// `context`.
pub fn without_nested<D: Dom>(
    dom: &D,
    context: &D::Node,
    selector: &str,
    elements: Vec<D::Node>,
) -> Vec<D::Node> {
    let nested = dom.query_all(Some(context), selector);
    if nested.is_empty() {
        return elements;
    }

    elements
        .into_iter()
        .filter(|element| !nested.iter().any(|region| dom.contains(region, element)))
        .collect()
}

/// Ordered focus-trap members of `root`.  Never empty: a dialog without any
/// qualifying descendant traps focus on itself.
pub fn focusable_elements<D: Dom>(dom: &D, root: &D::Node) -> Vec<D::Node> {
    let candidates = dom.query_all(Some(root), &focusable_selector());
    let visible = visible_elements(dom, candidates);
    let filtered = without_nested(dom, root, NESTED_DIALOG_SELECTOR, visible);

    if filtered.is_empty() {
        vec![root.clone()]
    } else {
        filtered
    }
}

#[cfg(all(test, feature = "headless"))]
mod tests {
    use super::*;
    use crate::headless::HeadlessDom;

    #[test]
    fn native_focusables_are_collected_in_document_order() {
        let dom = HeadlessDom::new();
        let root = dom.append_with(dom.body(), "div", &[("id", "d")]);
        let link = dom.append_with(root, "a", &[("href", "#")]);
        let input = dom.append(root, "input");
        let select = dom.append(root, "select");
        let textarea = dom.append(root, "textarea");
        let button = dom.append(root, "button");
        let custom = dom.append_with(root, "div", &[("tabindex", "0")]);
        let editable = dom.append_with(root, "p", &[("contenteditable", "true")]);

        assert_eq!(
            focusable_elements(&dom, &root),
            vec![link, input, select, textarea, button, custom, editable]
        );
    }

    #[test]
    fn opted_out_elements_are_skipped() {
        let dom = HeadlessDom::new();
        let root = dom.append(dom.body(), "div");
        dom.append_with(root, "button", &[("disabled", "")]);
        dom.append_with(root, "input", &[("type", "hidden")]);
        dom.append_with(root, "a", &[("href", "#"), ("tabindex", "-1")]);
        dom.append_with(root, "input", &[("type", "radio"), ("name", "r")]);
        let checked = dom.append_with(
            root,
            "input",
            &[("type", "radio"), ("name", "r"), ("checked", "")],
        );
        dom.append_with(root, "p", &[("contenteditable", "false")]);

        assert_eq!(focusable_elements(&dom, &root), vec![checked]);
    }

    #[test]
    fn zero_sized_elements_are_not_visible() {
        let dom = HeadlessDom::new();
        let root = dom.append(dom.body(), "div");
        let hidden = dom.append(root, "button");
        let shown = dom.append(root, "button");
        let thin = dom.append(root, "button");
        dom.set_size(hidden, 0.0, 0.0);
        dom.set_size(thin, 0.0, 12.0);

        assert_eq!(focusable_elements(&dom, &root), vec![shown, thin]);
    }

    #[test]
    fn nested_dialog_content_is_excluded() {
        let dom = HeadlessDom::new();
        let outer = dom.append_with(dom.body(), "div", &[("role", "dialog")]);
        let own = dom.append(outer, "button");
        let nested = dom.append_with(outer, "section", &[("role", "dialog")]);
        dom.append(nested, "button");
        let deep = dom.append(nested, "div");
        dom.append_with(deep, "a", &[("href", "#")]);
        let after = dom.append(outer, "textarea");

        assert_eq!(focusable_elements(&dom, &outer), vec![own, after]);
    }

    #[test]
    fn empty_dialog_falls_back_to_its_root() {
        let dom = HeadlessDom::new();
        let root = dom.append(dom.body(), "div");
        dom.append(root, "p");
        let nested = dom.append_with(root, "div", &[("role", "dialog")]);
        dom.append(nested, "button");

        assert_eq!(focusable_elements(&dom, &root), vec![root]);
    }
}
