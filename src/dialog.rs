//! The dialog state machine: lifecycle, ARIA synchronisation, focus
//! containment and dismissal.
//!
//! A [`Dialog`] owns no DOM.  It resolves its nodes once at construction and
//! drives everything else through a [`Dom`] host: attribute writes, focus
//! moves and listener (un)registration.  The host calls back into the
//! `on_*` handlers when a listener fires.
//!
//! ```text
//!  Uninitialized ──(selector matched)──► Created&Closed ◄──► Created&Open
//!                                              │                 │
//!                                              └──── destroy ────┘──► not created
//! ```
//!
//! Every transition is guarded; calling one in the wrong state does nothing.

use std::fmt;

use crate::config::{Defaults, DialogConfig, DialogOptions, Hooks};
use crate::constants::{
    ATTR_ARIA_DESCRIBEDBY, ATTR_ARIA_HASPOPUP, ATTR_ARIA_HIDDEN, ATTR_ARIA_LABELLEDBY,
    ATTR_ARIA_MODAL, ATTR_ROLE, ATTR_TABINDEX, DOCUMENT_ELEMENT_SELECTOR, ROLE_DIALOG,
};
use crate::debug_log;
use crate::dom::{Click, Disposition, Dom, EventKind, Key, KeyPress, Listener};
use crate::focusable;

/// DOM nodes a dialog works with, resolved once at construction.
#[derive(Debug, Clone)]
struct Region<N> {
    dialog: N,
    /// Receives the scroll-lock class.
    document: N,
    /// Grows when a delegated click discovers a trigger added later.
    opening_triggers: Vec<N>,
    closing_triggers: Vec<N>,
    backdrop: Option<N>,
    helpers: Vec<N>,
    /// `dialog, opening` selector list: clicks inside it are not outside
    /// clicks for a tooltip.
    area: String,
}

impl<N: Clone + PartialEq> Region<N> {
    fn resolve<D: Dom<Node = N>>(dom: &D, config: &DialogConfig) -> Option<Self> {
        let dialog = dom.query(None, &config.dialog_selector)?;

        let all = |scope: Option<&N>, selector: &Option<String>| -> Vec<N> {
            selector
                .as_deref()
                .map(|selector| dom.query_all(scope, selector))
                .unwrap_or_default()
        };

        let opening_triggers = all(None, &config.opening_selector);
        let closing_triggers = all(Some(&dialog), &config.closing_selector);
        let helpers = all(None, &config.helper_selector);
        let backdrop = config
            .backdrop_selector
            .as_deref()
            .and_then(|selector| dom.query(None, selector));
        let document = dom
            .query(None, &config.document_selector)
            .or_else(|| dom.query(None, DOCUMENT_ELEMENT_SELECTOR))
            .unwrap_or_else(|| dom.document_element());
        let area = match config.opening_selector.as_deref() {
            Some(opening) => format!("{}, {}", config.dialog_selector, opening),
            None => config.dialog_selector.clone(),
        };

        Some(Self {
            dialog,
            document,
            opening_triggers,
            closing_triggers,
            backdrop,
            helpers,
            area,
        })
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// One managed dialog region.
pub struct Dialog<D: Dom> {
    dom: D,
    config: DialogConfig,
    hooks: Hooks<D::Node>,
    /// `None` when the dialog selector matched nothing: the instance is inert.
    region: Option<Region<D::Node>>,
    /// Focus-trap members in document order; never empty once created.
    focusable_elements: Vec<D::Node>,
    /// Last trigger that toggled the dialog; focus goes back there on close.
    opening_trigger: Option<D::Node>,
    /// Whether the scroll lock was already on when this dialog opened.
    document_is_already_disabled: bool,
    is_created: bool,
    is_open: bool,
    listeners: Vec<Listener<D::Node>>,
    /// At most one deferred focus move is pending; replacing it cancels it.
    pending_focus: Option<D::Timer>,
}

impl<D: Dom> Dialog<D> {
    /// Resolve `dialog_selector` and, unless `options.is_created` is false,
    /// create the dialog right away.
    pub fn new(dom: D, dialog_selector: &str, options: DialogOptions) -> Self {
        Self::with_hooks(dom, dialog_selector, options, Hooks::default())
    }

    pub fn with_hooks(
        dom: D,
        dialog_selector: &str,
        options: DialogOptions,
        hooks: Hooks<D::Node>,
    ) -> Self {
        let config = DialogConfig::resolve(dialog_selector, options, &Defaults::current());
        let region = Region::resolve(&dom, &config);
        if region.is_none() {
            debug_log!("dialog `{}` not found, instance stays inert", dialog_selector);
        }

        let mut dialog = Self {
            dom,
            config,
            hooks,
            region,
            focusable_elements: Vec::new(),
            opening_trigger: None,
            document_is_already_disabled: false,
            is_created: false,
            is_open: false,
            listeners: Vec::new(),
            pending_focus: None,
        };

        if dialog.config.is_created {
            dialog.create();
        }
        dialog
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// False when the dialog selector matched nothing.
    pub fn is_initialized(&self) -> bool {
        self.region.is_some()
    }

    pub fn is_created(&self) -> bool {
        self.is_created
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn dialog(&self) -> Option<&D::Node> {
        self.region.as_ref().map(|region| &region.dialog)
    }

    pub fn focusable_elements(&self) -> &[D::Node] {
        &self.focusable_elements
    }

    pub fn first_focusable_element(&self) -> Option<&D::Node> {
        self.focusable_elements.first()
    }

    pub fn last_focusable_element(&self) -> Option<&D::Node> {
        self.focusable_elements.last()
    }

    pub fn opening_trigger(&self) -> Option<&D::Node> {
        self.opening_trigger.as_ref()
    }

    pub fn document_is_already_disabled(&self) -> bool {
        self.document_is_already_disabled
    }

    pub fn config(&self) -> &DialogConfig {
        &self.config
    }

    /// Listeners currently attached through the host.
    pub fn listeners(&self) -> &[Listener<D::Node>] {
        &self.listeners
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Write the ARIA scaffolding, compute the focus trap and start
    /// listening.  Opens immediately when configured with `is_open`.
    pub fn create(&mut self) {
        if self.is_created {
            return;
        }
        let Some(dialog) = self.region.as_ref().map(|region| region.dialog.clone()) else {
            return;
        };

        self.is_created = true;

        self.add_attributes();
        self.refresh_focusable_elements();
        self.listen(Listener::Mutations(dialog));

        if self.config.is_open {
            self.open();
        }

        if self.config.opening_selector.is_some() {
            self.listen(Listener::TriggerClick);
        }

        debug_log!("dialog `{}` created", self.config.dialog_selector);
    }

    /// Close if needed, strip every attribute and listener.
    pub fn destroy(&mut self) {
        if !self.is_created {
            return;
        }

        self.close();

        self.is_created = false;

        self.remove_attributes();
        for listener in std::mem::take(&mut self.listeners) {
            self.dom.detach(&listener);
        }

        debug_log!("dialog `{}` destroyed", self.config.dialog_selector);
    }

    pub fn open(&mut self) {
        if !self.is_created || self.is_open {
            return;
        }
        let Some(region) = self.region.as_ref() else {
            return;
        };

        self.is_open = true;
        self.document_is_already_disabled = self
            .dom
            .has_class(&region.document, &self.config.document_disabled_class);

        self.sync_attributes();
        self.add_event_listeners();
        if self.config.enable_auto_focus {
            self.set_focus();
        }

        debug_log!("dialog `{}` opened", self.config.dialog_selector);

        if let Some(region) = self.region.as_ref() {
            (self.hooks.on_open)(&region.dialog, self.opening_trigger.as_ref());
        }
    }

    /// Close without a triggering event.
    pub fn close(&mut self) {
        self.close_with(None);
    }

    /// Close on behalf of a native event of kind `cause`.  A tooltip closed by
    /// a click does not take focus back: the pointer already moved it.
    pub fn close_from(&mut self, cause: EventKind) {
        self.close_with(Some(cause));
    }

    pub fn toggle(&mut self) {
        self.toggle_from(None, None);
    }

    /// Toggle on behalf of `trigger`, which becomes the element focus returns
    /// to on close.
    pub fn toggle_from(&mut self, trigger: Option<D::Node>, cause: Option<EventKind>) {
        if !self.is_created {
            return;
        }

        if let Some(trigger) = trigger {
            self.opening_trigger = Some(trigger);
        }

        if self.is_open {
            self.close_with(cause);
        } else {
            self.open();
        }
    }

    /// Recompute the focus trap.  Hosts call this whenever the dialog's
    /// subtree changes.
    pub fn refresh_focusable_elements(&mut self) {
        if let Some(region) = self.region.as_ref() {
            self.focusable_elements = focusable::focusable_elements(&self.dom, &region.dialog);
        }
    }

    // ---------------------------------------------------------------------
    // Event handlers
    // ---------------------------------------------------------------------

    /// Delegated opening-trigger click.
    pub fn on_trigger_click(&mut self, click: &Click<D::Node>) {
        if !self.is_created {
            return;
        }
        let Some(selector) = self.config.opening_selector.as_deref() else {
            return;
        };
        let Some(trigger) = self.dom.closest(&click.target, selector) else {
            return;
        };

        if let Some(region) = self.region.as_mut() {
            if !region.opening_triggers.contains(&trigger) {
                self.dom.set_attribute(&trigger, ATTR_ARIA_HASPOPUP, ROLE_DIALOG);
                region.opening_triggers.push(trigger.clone());
            }
        }

        self.toggle_from(Some(trigger), Some(EventKind::Click));
    }

    /// Outside-click (tooltips) and backdrop dismissal.
    pub fn on_dismiss_click(&mut self, click: &Click<D::Node>) {
        if !self.is_open {
            return;
        }
        let Some(region) = self.region.as_ref() else {
            return;
        };

        let outside =
            self.config.is_tooltip && self.dom.closest(&click.target, &region.area).is_none();
        let on_backdrop = region.backdrop.as_ref() == Some(&click.target);

        if outside || on_backdrop {
            self.close_with(Some(EventKind::Click));
        }
    }

    /// Escape closes, F6 leaves a non-modal dialog, Tab wraps around.
    pub fn on_dialog_keydown(&mut self, key: &KeyPress<D::Node>) -> Disposition {
        if !self.is_open {
            return Disposition::default();
        }

        match key.key {
            Key::Escape => {
                self.close_with(Some(EventKind::Keydown));
                // Keep an enclosing dialog from closing too.
                Disposition {
                    stop_propagation: true,
                    ..Disposition::default()
                }
            }
            Key::F6 => {
                if !self.config.is_modal {
                    if self.config.is_tooltip {
                        self.close_with(Some(EventKind::Keydown));
                    } else {
                        self.restore_focus();
                    }
                }
                Disposition::default()
            }
            Key::Tab => self.maintain_focus(key),
            Key::Other(_) => Disposition::default(),
        }
    }

    pub fn on_closing_click(&mut self) {
        self.close_with(Some(EventKind::Click));
    }

    /// F6 on the opening trigger sends focus back into the open dialog.
    pub fn on_trigger_keydown(&mut self, key: &KeyPress<D::Node>) {
        if key.key != Key::F6 || !self.is_open {
            return;
        }
        self.disarm_trigger_keydown();
        self.set_focus();
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn close_with(&mut self, cause: Option<EventKind>) {
        if !self.is_created || !self.is_open {
            return;
        }

        self.is_open = false;

        self.sync_attributes();
        self.remove_event_listeners();
        self.pending_focus = None;

        let restores_focus = if self.config.is_tooltip {
            matches!(cause, Some(kind) if kind != EventKind::Click)
        } else {
            true
        };
        if self.opening_trigger.is_some() && restores_focus && self.config.enable_auto_focus {
            self.restore_focus();
        }

        debug_log!("dialog `{}` closed", self.config.dialog_selector);

        if let Some(region) = self.region.as_ref() {
            (self.hooks.on_close)(&region.dialog, self.opening_trigger.as_ref());
        }
    }

    fn listen(&mut self, listener: Listener<D::Node>) {
        if self.listeners.contains(&listener) {
            return;
        }
        self.dom.attach(&listener);
        self.listeners.push(listener);
    }

    fn unlisten(&mut self, listener: &Listener<D::Node>) {
        if let Some(index) = self.listeners.iter().position(|l| l == listener) {
            let listener = self.listeners.remove(index);
            self.dom.detach(&listener);
        }
    }

    fn disarm_trigger_keydown(&mut self) {
        let armed: Vec<_> = self
            .listeners
            .iter()
            .filter(|listener| matches!(listener, Listener::TriggerKeydown(_)))
            .cloned()
            .collect();
        for listener in &armed {
            self.unlisten(listener);
        }
    }

    fn add_event_listeners(&mut self) {
        let Some(region) = self.region.as_ref() else {
            return;
        };
        let dialog = region.dialog.clone();
        let closing_triggers = region.closing_triggers.clone();

        self.listen(Listener::DismissClick);
        self.listen(Listener::DialogKeydown(dialog));
        for trigger in closing_triggers {
            self.listen(Listener::ClosingClick(trigger));
        }
    }

    fn remove_event_listeners(&mut self) {
        let Some(region) = self.region.as_ref() else {
            return;
        };
        let dialog = region.dialog.clone();
        let closing_triggers = region.closing_triggers.clone();

        self.unlisten(&Listener::DismissClick);
        self.unlisten(&Listener::DialogKeydown(dialog));
        for trigger in closing_triggers {
            self.unlisten(&Listener::ClosingClick(trigger));
        }
        self.disarm_trigger_keydown();
    }

    fn add_attributes(&self) {
        let Some(region) = self.region.as_ref() else {
            return;
        };
        let dom = &self.dom;

        dom.set_attribute(&region.dialog, ATTR_ROLE, ROLE_DIALOG);
        dom.set_attribute(&region.dialog, ATTR_TABINDEX, "-1");
        dom.set_attribute(&region.dialog, ATTR_ARIA_HIDDEN, flag(true));

        if let Some(labelledby) = &self.config.labelledby {
            dom.set_attribute(&region.dialog, ATTR_ARIA_LABELLEDBY, labelledby);
        }
        if let Some(describedby) = &self.config.describedby {
            dom.set_attribute(&region.dialog, ATTR_ARIA_DESCRIBEDBY, describedby);
        }
        if self.config.is_modal {
            dom.set_attribute(&region.dialog, ATTR_ARIA_MODAL, flag(true));
        }

        for trigger in &region.opening_triggers {
            dom.set_attribute(trigger, ATTR_ARIA_HASPOPUP, ROLE_DIALOG);
        }
    }

    fn remove_attributes(&self) {
        let Some(region) = self.region.as_ref() else {
            return;
        };
        let dom = &self.dom;
        let active = &self.config.opening_trigger_active_class;

        for name in [
            ATTR_ROLE,
            ATTR_TABINDEX,
            ATTR_ARIA_HIDDEN,
            ATTR_ARIA_LABELLEDBY,
            ATTR_ARIA_DESCRIBEDBY,
            ATTR_ARIA_MODAL,
        ] {
            dom.remove_attribute(&region.dialog, name);
        }

        for trigger in &region.opening_triggers {
            dom.remove_attribute(trigger, ATTR_ARIA_HASPOPUP);
        }
        if let Some(trigger) = &self.opening_trigger {
            dom.remove_class(trigger, active);
        }
        for helper in &region.helpers {
            dom.remove_class(helper, active);
        }
    }

    /// Derive `aria-hidden`, the scroll lock and the active classes from
    /// `is_open`.
    fn sync_attributes(&self) {
        let Some(region) = self.region.as_ref() else {
            return;
        };
        let dom = &self.dom;
        let active = &self.config.opening_trigger_active_class;

        dom.set_attribute(&region.dialog, ATTR_ARIA_HIDDEN, flag(!self.is_open));

        // A dialog that found the lock already on leaves it to its owner.
        if self.config.disable_scroll && !self.document_is_already_disabled {
            if self.is_open {
                dom.add_class(&region.document, &self.config.document_disabled_class);
            } else {
                dom.remove_class(&region.document, &self.config.document_disabled_class);
            }
        }

        if let Some(trigger) = &self.opening_trigger {
            if self.is_open {
                dom.add_class(trigger, active);
            } else {
                for opening_trigger in &region.opening_triggers {
                    dom.remove_class(opening_trigger, active);
                }
                dom.remove_class(trigger, active);
            }
        }

        for helper in &region.helpers {
            if self.is_open {
                dom.add_class(helper, active);
            } else {
                dom.remove_class(helper, active);
            }
        }
    }

    fn set_focus(&mut self) {
        if let Some(first) = self.focusable_elements.first().cloned() {
            self.schedule_focus(&first);
        }
    }

    /// Send focus back to the opening trigger.  While still open, arm F6 on
    /// the trigger so the user can bounce back into the dialog.
    fn restore_focus(&mut self) {
        let Some(trigger) = self.opening_trigger.clone() else {
            return;
        };

        self.schedule_focus(&trigger);

        if self.is_open {
            self.listen(Listener::TriggerKeydown(trigger));
        }
    }

    fn schedule_focus(&mut self, target: &D::Node) {
        self.pending_focus = Some(self.dom.defer_focus(target, self.config.delay));
    }

    fn maintain_focus(&self, key: &KeyPress<D::Node>) -> Disposition {
        let (Some(first), Some(last)) = (
            self.focusable_elements.first(),
            self.focusable_elements.last(),
        ) else {
            return Disposition::default();
        };

        let mut disposition = Disposition::default();

        if key.shift_key && key.target == *first {
            disposition.prevent_default = true;
            self.dom.focus(last);
        }

        if !key.shift_key && key.target == *last {
            disposition.prevent_default = true;
            self.dom.focus(first);
        }

        disposition
    }
}

impl<D: Dom> fmt::Debug for Dialog<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialog")
            .field("selector", &self.config.dialog_selector)
            .field("is_initialized", &self.is_initialized())
            .field("is_created", &self.is_created)
            .field("is_open", &self.is_open)
            .field("focusable_elements", &self.focusable_elements)
            .field("opening_trigger", &self.opening_trigger)
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, feature = "headless"))]
mod tests {
    use super::*;
    use crate::headless::HeadlessDom;

    fn page() -> HeadlessDom {
        let dom = HeadlessDom::new();
        let dialog = dom.append_with(dom.body(), "div", &[("id", "d")]);
        dom.append_with(dialog, "button", &[("id", "ok")]);
        dom
    }

    #[test]
    fn unresolved_selector_makes_an_inert_instance() {
        let dom = page();
        let mut dialog = Dialog::new(dom.host(), "#missing", DialogOptions::default());

        assert!(!dialog.is_initialized());
        dialog.create();
        dialog.open();
        dialog.toggle();
        dialog.close();
        dialog.destroy();

        assert!(!dialog.is_created());
        assert!(!dialog.is_open());
        assert!(dialog.listeners().is_empty());
        assert!(dialog.focusable_elements().is_empty());
    }

    #[test]
    fn deferred_creation_leaves_the_page_untouched() {
        let dom = page();
        let dialog = Dialog::new(dom.host(), "#d", DialogOptions::default().deferred());
        let node = *dialog.dialog().unwrap();

        assert!(dialog.is_initialized());
        assert!(!dialog.is_created());
        assert_eq!(dom.attribute(&node, "role"), None);
        assert!(dialog.listeners().is_empty());
    }

    #[test]
    fn open_before_create_is_ignored() {
        let dom = page();
        let mut dialog = Dialog::new(dom.host(), "#d", DialogOptions::default().deferred());

        dialog.open();
        assert!(!dialog.is_open());

        dialog.create();
        dialog.open();
        assert!(dialog.is_open());
    }

    #[test]
    fn create_writes_the_aria_scaffolding() {
        let dom = page();
        let options = DialogOptions {
            labelledby: Some("title".into()),
            describedby: Some("desc".into()),
            ..DialogOptions::default()
        };
        let dialog = Dialog::new(dom.host(), "#d", options);
        let node = *dialog.dialog().unwrap();

        assert_eq!(dom.attribute(&node, "role").as_deref(), Some("dialog"));
        assert_eq!(dom.attribute(&node, "tabindex").as_deref(), Some("-1"));
        assert_eq!(dom.attribute(&node, "aria-hidden").as_deref(), Some("true"));
        assert_eq!(dom.attribute(&node, "aria-modal").as_deref(), Some("true"));
        assert_eq!(dom.attribute(&node, "aria-labelledby").as_deref(), Some("title"));
        assert_eq!(dom.attribute(&node, "aria-describedby").as_deref(), Some("desc"));
    }

    #[test]
    fn non_modal_dialogs_do_not_claim_aria_modal() {
        let dom = page();
        let dialog = Dialog::new(dom.host(), "#d", DialogOptions::default().non_modal());
        let node = *dialog.dialog().unwrap();

        assert_eq!(dom.attribute(&node, "aria-modal"), None);
    }

    #[test]
    fn is_open_option_opens_on_create() {
        let dom = page();
        let options = DialogOptions {
            is_open: true,
            ..DialogOptions::default()
        };
        let dialog = Dialog::new(dom.host(), "#d", options);
        let node = *dialog.dialog().unwrap();

        assert!(dialog.is_open());
        assert_eq!(dom.attribute(&node, "aria-hidden").as_deref(), Some("false"));
    }
}
