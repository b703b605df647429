//! dom.rs – the contract between the dialog state machine and whatever owns
//! the document.
//!
//! The dialog never touches `web_sys` directly.  It queries, writes
//! attributes, moves focus and (un)subscribes through [`Dom`], and the host
//! routes native events back into the `Dialog::on_*` handlers.  The browser
//! host lives in [`crate::web`], an in-memory one in `crate::headless`.

use std::fmt;

use crate::constants::{KEY_ESCAPE, KEY_F6, KEY_TAB};

/// Rendered bounding box of an element, in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Zero-sized boxes are treated as hidden.
    pub fn is_rendered(&self) -> bool {
        self.width > 0.0 || self.height > 0.0
    }
}

/// Every subscription a dialog can hold.  Hosts map each variant to a native
/// listener and call the matching `Dialog::on_*` handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Listener<N> {
    /// Document-level capture click that finds opening triggers by selector,
    /// including triggers added after the dialog was created.
    TriggerClick,
    /// Document-level capture click for outside-click and backdrop dismissal.
    DismissClick,
    /// `keydown` on the dialog node (Escape, F6, Tab).
    DialogKeydown(N),
    /// `click` on a dismiss control inside the dialog.
    ClosingClick(N),
    /// `keydown` on the opening trigger; F6 sends focus back into the dialog.
    TriggerKeydown(N),
    /// Subtree mutation observer on the dialog node.
    Mutations(N),
}

/// Native event category, as far as the dismissal policy cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Click,
    Keydown,
    Other,
}

impl From<&str> for EventKind {
    fn from(value: &str) -> Self {
        match value {
            "click" => EventKind::Click,
            "keydown" => EventKind::Keydown,
            _ => EventKind::Other,
        }
    }
}

/// Keys the dialog reacts to; everything else is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Tab,
    F6,
    Other(String),
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        match value {
            KEY_ESCAPE => Key::Escape,
            KEY_TAB => Key::Tab,
            KEY_F6 => Key::F6,
            other => Key::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Escape => f.write_str(KEY_ESCAPE),
            Key::Tab => f.write_str(KEY_TAB),
            Key::F6 => f.write_str(KEY_F6),
            Key::Other(key) => f.write_str(key),
        }
    }
}

/// A click, reduced to its target.
#[derive(Debug, Clone, PartialEq)]
pub struct Click<N> {
    pub target: N,
}

impl<N> Click<N> {
    pub fn on(target: N) -> Self {
        Self { target }
    }
}

/// A `keydown`, reduced to what the keyboard policy reads.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPress<N> {
    pub key: Key,
    pub shift_key: bool,
    pub target: N,
}

impl<N> KeyPress<N> {
    pub fn new(key: impl Into<Key>, target: N) -> Self {
        Self {
            key: key.into(),
            shift_key: false,
            target,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift_key = true;
        self
    }
}

/// What the host should do with the native event after a handler ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Disposition {
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

impl Disposition {
    pub fn merge(self, other: Disposition) -> Disposition {
        Disposition {
            prevent_default: self.prevent_default || other.prevent_default,
            stop_propagation: self.stop_propagation || other.stop_propagation,
        }
    }
}

/// Document access needed by a dialog.
///
/// Mutating calls are infallible from the caller's point of view: a host
/// that can fail (the browser) reports and swallows the failure itself.
pub trait Dom {
    /// Handle to an element.  Cheap to clone; equality is identity.
    type Node: Clone + PartialEq + fmt::Debug + 'static;
    /// Pending deferred focus.  Dropping it cancels the focus move.
    type Timer;

    /// The `<html>` element.
    fn document_element(&self) -> Self::Node;

    /// First match in document order.  `scope` limits the search to its
    /// descendants; `None` searches the whole document.
    fn query(&self, scope: Option<&Self::Node>, selector: &str) -> Option<Self::Node>;

    /// All matches in document order, descendants of `scope` only.
    fn query_all(&self, scope: Option<&Self::Node>, selector: &str) -> Vec<Self::Node>;

    /// Nearest inclusive ancestor matching `selector`.
    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node>;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);
    fn remove_attribute(&self, node: &Self::Node, name: &str);

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    fn add_class(&self, node: &Self::Node, class: &str);
    fn remove_class(&self, node: &Self::Node, class: &str);

    fn size(&self, node: &Self::Node) -> Size;

    /// Move focus right away.
    fn focus(&self, node: &Self::Node);

    /// Move focus after `delay_ms`, unless the returned timer is dropped first.
    fn defer_focus(&self, node: &Self::Node, delay_ms: u32) -> Self::Timer;

    fn attach(&self, listener: &Listener<Self::Node>);
    fn detach(&self, listener: &Listener<Self::Node>);
}
