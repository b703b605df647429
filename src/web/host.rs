//! `WebDom`: the browser implementation of [`Dom`].
//!
//! Every [`Listener`] becomes a real `Closure` on a real target.  The
//! closures only hold a `Weak` handle to the dialog that owns this host, so a
//! dropped dialog simply stops reacting instead of leaking.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    AddEventListenerOptions, Document, Element, Event, EventTarget, HtmlElement, KeyboardEvent,
    MutationObserver, MutationObserverInit,
};

use crate::config::{DialogOptions, Hooks};
use crate::dialog::Dialog;
use crate::dom::{Click, Disposition, Dom, KeyPress, Listener, Size};
use crate::warn_log;

/// A dialog shared between the JS wrapper and its own event callbacks.
pub type SharedDialog = Rc<RefCell<Dialog<WebDom>>>;

type Owner = Weak<RefCell<Dialog<WebDom>>>;

/// One native subscription.  Dropping it unsubscribes.
enum Binding {
    Event {
        target: EventTarget,
        kind: &'static str,
        capture: bool,
        callback: Closure<dyn FnMut(Event)>,
    },
    Observer {
        observer: MutationObserver,
        _callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
    },
}

impl Drop for Binding {
    fn drop(&mut self) {
        match self {
            Binding::Event {
                target,
                kind,
                capture,
                callback,
            } => {
                let removed = target.remove_event_listener_with_callback_and_bool(
                    kind,
                    callback.as_ref().unchecked_ref(),
                    *capture,
                );
                if let Err(e) = removed {
                    warn_log!("Failed to remove {} listener: {:?}", kind, e);
                }
            }
            Binding::Observer { observer, .. } => observer.disconnect(),
        }
    }
}

/// Browser document host.  One per dialog.
pub struct WebDom {
    document: Document,
    root: Element,
    owner: RefCell<Owner>,
    bindings: RefCell<Vec<(Listener<Element>, Binding)>>,
}

impl WebDom {
    pub fn new() -> Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document available"))?;
        let root = document
            .document_element()
            .ok_or_else(|| JsValue::from_str("document has no root element"))?;

        Ok(Self {
            document,
            root,
            owner: RefCell::new(Weak::new()),
            bindings: RefCell::new(Vec::new()),
        })
    }

    /// Point event callbacks at `owner`.  Listeners attached before this
    /// call do nothing.
    pub fn set_owner(&self, owner: Owner) {
        *self.owner.borrow_mut() = owner;
    }

    fn listen(
        &self,
        target: EventTarget,
        kind: &'static str,
        capture: bool,
        handle: fn(&mut Dialog<WebDom>, &Event) -> Disposition,
    ) -> Option<Binding> {
        let owner = self.owner.borrow().clone();
        let callback = Closure::wrap(Box::new(move |event: Event| {
            route(&owner, &event, handle);
        }) as Box<dyn FnMut(Event)>);

        let added = if capture {
            let options = AddEventListenerOptions::new();
            options.set_capture(true);
            target.add_event_listener_with_callback_and_add_event_listener_options(
                kind,
                callback.as_ref().unchecked_ref(),
                &options,
            )
        } else {
            target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
        };

        match added {
            Ok(()) => Some(Binding::Event {
                target,
                kind,
                capture,
                callback,
            }),
            Err(e) => {
                warn_log!("Failed to add {} listener: {:?}", kind, e);
                None
            }
        }
    }

    fn observe(&self, node: &Element) -> Option<Binding> {
        let owner = self.owner.borrow().clone();
        let callback = Closure::wrap(Box::new(move |_: js_sys::Array, _: MutationObserver| {
            let Some(dialog) = owner.upgrade() else {
                return;
            };
            match dialog.try_borrow_mut() {
                Ok(mut dialog) => dialog.refresh_focusable_elements(),
                Err(_) => warn_log!("Dialog busy, skipping focus trap refresh"),
            };
        }) as Box<dyn FnMut(js_sys::Array, MutationObserver)>);

        let observer = match MutationObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(e) => {
                warn_log!("Failed to create MutationObserver: {:?}", e);
                return None;
            }
        };

        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_attributes(true);
        init.set_subtree(true);
        if let Err(e) = observer.observe_with_options(node, &init) {
            warn_log!("Failed to observe dialog: {:?}", e);
            return None;
        }

        Some(Binding::Observer {
            observer,
            _callback: callback,
        })
    }

    fn matching(&self, scope: Option<&Element>, selector: &str) -> Vec<Element> {
        let found = match scope {
            Some(scope) => scope.query_selector_all(selector),
            None => self.document.query_selector_all(selector),
        };
        let list = match found {
            Ok(list) => list,
            Err(e) => {
                warn_log!("Invalid selector '{}': {:?}", selector, e);
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }
}

/// Hand `event` to the owning dialog, then apply what the handler asked for.
fn route(owner: &Owner, event: &Event, handle: fn(&mut Dialog<WebDom>, &Event) -> Disposition) {
    let Some(dialog) = owner.upgrade() else {
        return;
    };
    let disposition = match dialog.try_borrow_mut() {
        Ok(mut dialog) => handle(&mut dialog, event),
        Err(_) => {
            warn_log!("Dialog busy, ignoring nested {} event", event.type_());
            return;
        }
    };

    if disposition.prevent_default {
        event.prevent_default();
    }
    if disposition.stop_propagation {
        event.stop_propagation();
    }
}

fn event_target(event: &Event) -> Option<Element> {
    event.target().and_then(|t| t.dyn_into::<Element>().ok())
}

fn key_press(event: &Event) -> Option<KeyPress<Element>> {
    let keyboard = event.dyn_ref::<KeyboardEvent>()?;
    let target = event_target(event)?;
    let press = KeyPress::new(keyboard.key().as_str(), target);
    Some(if keyboard.shift_key() {
        press.with_shift()
    } else {
        press
    })
}

fn on_trigger_click(dialog: &mut Dialog<WebDom>, event: &Event) -> Disposition {
    if let Some(target) = event_target(event) {
        dialog.on_trigger_click(&Click::on(target));
    }
    Disposition::default()
}

fn on_dismiss_click(dialog: &mut Dialog<WebDom>, event: &Event) -> Disposition {
    if let Some(target) = event_target(event) {
        dialog.on_dismiss_click(&Click::on(target));
    }
    Disposition::default()
}

fn on_dialog_keydown(dialog: &mut Dialog<WebDom>, event: &Event) -> Disposition {
    key_press(event)
        .map(|key| dialog.on_dialog_keydown(&key))
        .unwrap_or_default()
}

fn on_closing_click(dialog: &mut Dialog<WebDom>, _: &Event) -> Disposition {
    dialog.on_closing_click();
    Disposition::default()
}

fn on_trigger_keydown(dialog: &mut Dialog<WebDom>, event: &Event) -> Disposition {
    if let Some(key) = key_press(event) {
        dialog.on_trigger_keydown(&key);
    }
    Disposition::default()
}

impl Dom for WebDom {
    type Node = Element;
    type Timer = Timeout;

    fn document_element(&self) -> Element {
        self.root.clone()
    }

    fn query(&self, scope: Option<&Element>, selector: &str) -> Option<Element> {
        let found = match scope {
            Some(scope) => scope.query_selector(selector),
            None => self.document.query_selector(selector),
        };
        found.unwrap_or_else(|e| {
            warn_log!("Invalid selector '{}': {:?}", selector, e);
            None
        })
    }

    fn query_all(&self, scope: Option<&Element>, selector: &str) -> Vec<Element> {
        self.matching(scope, selector)
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(selector).unwrap_or_else(|e| {
            warn_log!("Invalid selector '{}': {:?}", selector, e);
            None
        })
    }

    fn contains(&self, ancestor: &Element, node: &Element) -> bool {
        ancestor.contains(Some(&**node))
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        if let Err(e) = node.set_attribute(name, value) {
            warn_log!("Failed to set {}: {:?}", name, e);
        }
    }

    fn remove_attribute(&self, node: &Element, name: &str) {
        if let Err(e) = node.remove_attribute(name) {
            warn_log!("Failed to remove {}: {:?}", name, e);
        }
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn add_class(&self, node: &Element, class: &str) {
        if let Err(e) = node.class_list().add_1(class) {
            warn_log!("Failed to add class {}: {:?}", class, e);
        }
    }

    fn remove_class(&self, node: &Element, class: &str) {
        if let Err(e) = node.class_list().remove_1(class) {
            warn_log!("Failed to remove class {}: {:?}", class, e);
        }
    }

    fn size(&self, node: &Element) -> Size {
        let rect = node.get_bounding_client_rect();
        Size::new(rect.width(), rect.height())
    }

    fn focus(&self, node: &Element) {
        match node.dyn_ref::<HtmlElement>() {
            Some(element) => {
                if let Err(e) = element.focus() {
                    warn_log!("Failed to focus element: {:?}", e);
                }
            }
            None => warn_log!("Element <{}> cannot take focus", node.tag_name()),
        }
    }

    fn defer_focus(&self, node: &Element, delay_ms: u32) -> Timeout {
        let node = node.clone();
        let root = self.root.clone();
        Timeout::new(delay_ms, move || {
            if let Some(element) = node.dyn_ref::<HtmlElement>() {
                if root.contains(Some(&*node)) {
                    if let Err(e) = element.focus() {
                        warn_log!("Failed to focus element: {:?}", e);
                    }
                }
            }
        })
    }

    fn attach(&self, listener: &Listener<Element>) {
        if self.bindings.borrow().iter().any(|(l, _)| l == listener) {
            return;
        }

        let document: EventTarget = self.document.clone().into();
        let binding = match listener {
            Listener::TriggerClick => self.listen(document, "click", true, on_trigger_click),
            Listener::DismissClick => self.listen(document, "click", true, on_dismiss_click),
            Listener::DialogKeydown(node) => {
                self.listen(node.clone().into(), "keydown", false, on_dialog_keydown)
            }
            Listener::ClosingClick(node) => {
                self.listen(node.clone().into(), "click", false, on_closing_click)
            }
            Listener::TriggerKeydown(node) => {
                self.listen(node.clone().into(), "keydown", false, on_trigger_keydown)
            }
            Listener::Mutations(node) => self.observe(node),
        };

        if let Some(binding) = binding {
            self.bindings.borrow_mut().push((listener.clone(), binding));
        }
    }

    fn detach(&self, listener: &Listener<Element>) {
        let released = {
            let mut bindings = self.bindings.borrow_mut();
            let (released, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut *bindings)
                .into_iter()
                .partition(|(l, _)| l == listener);
            *bindings = kept;
            released
        };
        drop(released);
    }
}

/// Build a dialog living in the browser.  Creation is held back until the
/// shared handle exists, so listeners attached by `create` can reach it.
pub fn mount(
    selector: &str,
    options: DialogOptions,
    hooks: Hooks<Element>,
) -> Result<SharedDialog, JsValue> {
    let create = options.is_created;
    let dom = WebDom::new()?;
    let dialog = Rc::new(RefCell::new(Dialog::with_hooks(
        dom,
        selector,
        options.deferred(),
        hooks,
    )));

    dialog.borrow().dom().set_owner(Rc::downgrade(&dialog));
    if create {
        dialog.borrow_mut().create();
    }
    Ok(dialog)
}
