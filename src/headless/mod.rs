//! headless – an in-memory document implementing [`Dom`].
//!
//! Lets the whole dialog state machine run without a browser: an element
//! arena with attributes and rendered sizes, a selector matcher, focus
//! tracking and a virtual clock for deferred focus.  [`HeadlessDom::dispatch`]
//! delivers clicks, key presses and mutations through the listeners each
//! dialog holds, the way a browser would.

mod events;
mod selector;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::dom::{Dom, Listener, Size};
use crate::warn_log;

pub use events::DomEvent;
pub use selector::SelectorList;

/// Rendered size given to new elements.
const DEFAULT_SIZE: Size = Size {
    width: 10.0,
    height: 10.0,
};

/// Handle to an element of a [`HeadlessDom`].  Stays valid after removal.
/// A handle from another document reads as a detached element with no tag,
/// attributes or size; writes through it are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    size: Size,
}

#[derive(Debug)]
struct PendingFocus {
    id: u64,
    due: u64,
    target: NodeId,
}

#[derive(Debug, Default)]
struct Tree {
    elements: Vec<Element>,
    active: Option<NodeId>,
    clock: u64,
    next_timer: u64,
    timers: Vec<PendingFocus>,
}

const ROOT: NodeId = NodeId(0);
const BODY: NodeId = NodeId(1);

impl Tree {
    fn new() -> Self {
        let mut tree = Tree::default();
        tree.insert(None, "html");
        tree.insert(Some(ROOT), "body");
        tree
    }

    fn insert(&mut self, parent: Option<NodeId>, tag: &str) -> NodeId {
        let id = NodeId(self.elements.len());
        let parent = parent.filter(|parent| parent.0 < self.elements.len());
        self.elements.push(Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            parent,
            children: Vec::new(),
            size: DEFAULT_SIZE,
        });
        if let Some(parent) = parent {
            self.elements[parent.0].children.push(id);
        }
        id
    }

    fn element(&self, node: NodeId) -> Option<&Element> {
        self.elements.get(node.0)
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.elements.get_mut(node.0)
    }

    fn tag(&self, node: NodeId) -> &str {
        self.element(node).map_or("", |element| element.tag.as_str())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.element(node)?.parent
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.element(node)
            .map_or(&[], |element| element.children.as_slice())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(element) = self.element_mut(node) else {
            return;
        };
        match element.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => element.attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(element) = self.element_mut(node) {
            element.attributes.retain(|(key, _)| key != name);
        }
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Descendants of `scope` in document (pre-)order, `scope` excluded.
    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut ordered = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            ordered.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        ordered
    }

    fn candidates(&self, scope: Option<NodeId>) -> Vec<NodeId> {
        match scope {
            Some(scope) => self.descendants(scope),
            None => {
                let mut all = vec![ROOT];
                all.extend(self.descendants(ROOT));
                all
            }
        }
    }
}

/// Deferred focus created by [`HeadlessDom::defer_focus`].  Dropping it
/// before the clock reaches its due time cancels it.
#[derive(Debug)]
pub struct HeadlessTimer {
    id: u64,
    tree: Weak<RefCell<Tree>>,
}

impl Drop for HeadlessTimer {
    fn drop(&mut self) {
        if let Some(tree) = self.tree.upgrade() {
            if let Ok(mut tree) = tree.try_borrow_mut() {
                tree.timers.retain(|timer| timer.id != self.id);
            }
        }
    }
}

/// In-memory document.  Clones share the tree and the listener registry;
/// [`HeadlessDom::host`] shares only the tree.
#[derive(Debug, Clone)]
pub struct HeadlessDom {
    tree: Rc<RefCell<Tree>>,
    listeners: Rc<RefCell<Vec<Listener<NodeId>>>>,
}

impl Default for HeadlessDom {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDom {
    /// A document holding `<html><body></body></html>`.
    pub fn new() -> Self {
        Self {
            tree: Rc::new(RefCell::new(Tree::new())),
            listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Another host on the same document with its own listener registry.
    /// Give one to each dialog.
    pub fn host(&self) -> Self {
        Self {
            tree: Rc::clone(&self.tree),
            listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn body(&self) -> NodeId {
        BODY
    }

    pub fn append(&self, parent: NodeId, tag: &str) -> NodeId {
        self.tree.borrow_mut().insert(Some(parent), tag)
    }

    pub fn append_with(&self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let mut tree = self.tree.borrow_mut();
        let node = tree.insert(Some(parent), tag);
        for (name, value) in attributes {
            tree.set_attribute(node, name, value);
        }
        node
    }

    /// Detach `node` (and its subtree) from the document.
    pub fn remove(&self, node: NodeId) {
        let mut tree = self.tree.borrow_mut();
        let Some(parent) = tree.element_mut(node).and_then(|element| element.parent.take()) else {
            return;
        };
        if let Some(parent) = tree.element_mut(parent) {
            parent.children.retain(|child| *child != node);
        }
    }

    pub fn set_size(&self, node: NodeId, width: f64, height: f64) {
        if let Some(element) = self.tree.borrow_mut().element_mut(node) {
            element.size = Size::new(width, height);
        }
    }

    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        let tree = self.tree.borrow();
        tree.candidates(None)
            .into_iter()
            .find(|node| tree.attribute(*node, "id") == Some(id))
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.tree.borrow().active
    }

    /// Milliseconds elapsed on the virtual clock.
    pub fn now(&self) -> u64 {
        self.tree.borrow().clock
    }

    pub fn pending_focus_count(&self) -> usize {
        self.tree.borrow().timers.len()
    }

    /// Move the virtual clock forward, running deferred focus moves that
    /// fall due in order.  A target no longer in the document is skipped.
    pub fn advance(&self, ms: u64) {
        let mut tree = self.tree.borrow_mut();
        let deadline = tree.clock + ms;
        loop {
            let next = tree
                .timers
                .iter()
                .enumerate()
                .filter(|(_, timer)| timer.due <= deadline)
                .min_by_key(|(_, timer)| (timer.due, timer.id))
                .map(|(index, _)| index);
            let Some(index) = next else {
                break;
            };
            let timer = tree.timers.remove(index);
            tree.clock = timer.due;
            if tree.contains(ROOT, timer.target) {
                tree.active = Some(timer.target);
            } else {
                warn_log!("Deferred focus target {:?} left the document", timer.target);
            }
        }
        tree.clock = deadline;
    }

    /// Listeners registered through this host.
    pub fn listeners(&self) -> Vec<Listener<NodeId>> {
        self.listeners.borrow().clone()
    }

    pub fn is_listening(&self, listener: &Listener<NodeId>) -> bool {
        self.listeners.borrow().contains(listener)
    }

    fn matching(&self, scope: Option<NodeId>, selector: &str) -> Vec<NodeId> {
        let list = match SelectorList::try_from(selector) {
            Ok(list) => list,
            Err(e) => {
                warn_log!("Ignoring selector: {}", e);
                return Vec::new();
            }
        };
        let tree = self.tree.borrow();
        tree.candidates(scope)
            .into_iter()
            .filter(|node| list.matches(&tree, *node))
            .collect()
    }
}

impl Dom for HeadlessDom {
    type Node = NodeId;
    type Timer = HeadlessTimer;

    fn document_element(&self) -> NodeId {
        ROOT
    }

    fn query(&self, scope: Option<&NodeId>, selector: &str) -> Option<NodeId> {
        self.matching(scope.copied(), selector).into_iter().next()
    }

    fn query_all(&self, scope: Option<&NodeId>, selector: &str) -> Vec<NodeId> {
        self.matching(scope.copied(), selector)
    }

    fn closest(&self, node: &NodeId, selector: &str) -> Option<NodeId> {
        let list = SelectorList::try_from(selector).ok()?;
        let tree = self.tree.borrow();
        let mut cursor = Some(*node);
        while let Some(current) = cursor {
            if list.matches(&tree, current) {
                return Some(current);
            }
            cursor = tree.parent(current);
        }
        None
    }

    fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        self.tree.borrow().contains(*ancestor, *node)
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.tree.borrow().attribute(*node, name).map(str::to_string)
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        self.tree.borrow_mut().set_attribute(*node, name, value);
    }

    fn remove_attribute(&self, node: &NodeId, name: &str) {
        self.tree.borrow_mut().remove_attribute(*node, name);
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.tree
            .borrow()
            .attribute(*node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let mut tree = self.tree.borrow_mut();
        let classes = match tree.attribute(*node, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        tree.set_attribute(*node, "class", &classes);
    }

    fn remove_class(&self, node: &NodeId, class: &str) {
        let mut tree = self.tree.borrow_mut();
        let remaining = match tree.attribute(*node, "class") {
            Some(existing) => existing
                .split_whitespace()
                .filter(|c| *c != class)
                .collect::<Vec<_>>()
                .join(" "),
            None => return,
        };
        tree.set_attribute(*node, "class", &remaining);
    }

    fn size(&self, node: &NodeId) -> Size {
        self.tree
            .borrow()
            .element(*node)
            .map_or(Size::default(), |element| element.size)
    }

    fn focus(&self, node: &NodeId) {
        self.tree.borrow_mut().active = Some(*node);
    }

    fn defer_focus(&self, node: &NodeId, delay_ms: u32) -> HeadlessTimer {
        let mut tree = self.tree.borrow_mut();
        let id = tree.next_timer;
        tree.next_timer += 1;
        let due = tree.clock + u64::from(delay_ms);
        tree.timers.push(PendingFocus {
            id,
            due,
            target: *node,
        });
        HeadlessTimer {
            id,
            tree: Rc::downgrade(&self.tree),
        }
    }

    fn attach(&self, listener: &Listener<NodeId>) {
        let mut listeners = self.listeners.borrow_mut();
        if !listeners.contains(listener) {
            listeners.push(listener.clone());
        }
    }

    fn detach(&self, listener: &Listener<NodeId>) {
        self.listeners.borrow_mut().retain(|l| l != listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_follow_document_order_and_scope() {
        let dom = HeadlessDom::new();
        let first = dom.append_with(dom.body(), "section", &[("class", "x")]);
        let nested = dom.append_with(first, "p", &[("class", "x")]);
        let second = dom.append_with(dom.body(), "p", &[("class", "x")]);

        assert_eq!(dom.query_all(None, ".x"), vec![first, nested, second]);
        assert_eq!(dom.query_all(Some(&first), ".x"), vec![nested]);
        assert_eq!(dom.query(None, "p"), Some(nested));
        assert_eq!(dom.query(None, "html"), Some(dom.document_element()));
    }

    #[test]
    fn closest_and_contains_are_inclusive() {
        let dom = HeadlessDom::new();
        let dialog = dom.append_with(dom.body(), "div", &[("id", "d")]);
        let button = dom.append(dialog, "button");

        assert_eq!(dom.closest(&button, "#d"), Some(dialog));
        assert_eq!(dom.closest(&dialog, "#d"), Some(dialog));
        assert_eq!(dom.closest(&button, "#nope"), None);
        assert!(dom.contains(&dialog, &dialog));
        assert!(dom.contains(&dialog, &button));
        assert!(!dom.contains(&button, &dialog));
    }

    #[test]
    fn removed_nodes_leave_the_document() {
        let dom = HeadlessDom::new();
        let node = dom.append_with(dom.body(), "button", &[("id", "b")]);
        dom.remove(node);

        assert_eq!(dom.by_id("b"), None);
        assert!(!dom.contains(&dom.document_element(), &node));
    }

    #[test]
    fn class_helpers_edit_the_class_attribute() {
        let dom = HeadlessDom::new();
        let node = dom.append_with(dom.body(), "div", &[("class", "a")]);

        dom.add_class(&node, "b");
        dom.add_class(&node, "b");
        assert_eq!(dom.attribute(&node, "class").as_deref(), Some("a b"));

        dom.remove_class(&node, "a");
        assert!(!dom.has_class(&node, "a"));
        assert!(dom.has_class(&node, "b"));
    }

    #[test]
    fn deferred_focus_runs_when_due_and_cancels_on_drop() {
        let dom = HeadlessDom::new();
        let a = dom.append(dom.body(), "button");
        let b = dom.append(dom.body(), "button");

        let _kept = dom.defer_focus(&a, 100);
        let dropped = dom.defer_focus(&b, 50);
        drop(dropped);
        assert_eq!(dom.pending_focus_count(), 1);

        dom.advance(99);
        assert_eq!(dom.active_element(), None);
        dom.advance(1);
        assert_eq!(dom.active_element(), Some(a));
        assert_eq!(dom.now(), 100);
    }

    #[test]
    fn deferred_focus_skips_a_removed_target() {
        let dom = HeadlessDom::new();
        let dialog = dom.append(dom.body(), "div");
        let button = dom.append(dialog, "button");

        let _timer = dom.defer_focus(&button, 100);
        dom.remove(dialog);
        dom.advance(100);

        assert_eq!(dom.active_element(), None);
        assert_eq!(dom.pending_focus_count(), 0);
    }

    #[test]
    fn foreign_handles_read_as_detached_elements() {
        let big = HeadlessDom::new();
        let mut foreign = big.body();
        for _ in 0..5 {
            foreign = big.append(foreign, "div");
        }
        let dom = HeadlessDom::new();

        assert_eq!(dom.attribute(&foreign, "id"), None);
        assert_eq!(dom.size(&foreign), Size::default());
        assert!(!dom.contains(&dom.document_element(), &foreign));
        assert_eq!(dom.closest(&foreign, "div"), None);

        dom.set_attribute(&foreign, "id", "x");
        dom.add_class(&foreign, "x");
        dom.set_size(foreign, 1.0, 1.0);
        dom.remove(foreign);
        let child = dom.append(foreign, "p");

        assert_eq!(dom.by_id("x"), None);
        assert!(!dom.contains(&dom.body(), &child));
        assert!(dom.query_all(Some(&foreign), "*").is_empty());
    }

    #[test]
    fn hosts_share_the_tree_but_not_listeners() {
        let dom = HeadlessDom::new();
        let other = dom.host();
        let node = other.append(other.body(), "div");

        dom.attach(&Listener::TriggerClick);
        assert!(dom.is_listening(&Listener::TriggerClick));
        assert!(!other.is_listening(&Listener::TriggerClick));
        assert!(dom.contains(&dom.body(), &node));
    }
}
