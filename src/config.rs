//! Dialog configuration: per-instance options, lifecycle hooks and the
//! process-wide defaults every new instance snapshots.

use std::cell::RefCell;
use std::fmt;

use serde::Deserialize;

use crate::constants::{
    DEFAULT_DELAY_MS, DEFAULT_DOCUMENT_DISABLED_CLASS, DEFAULT_DOCUMENT_SELECTOR,
    DEFAULT_OPENING_TRIGGER_ACTIVE_CLASS,
};

/// Settings shared by every dialog constructed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    /// Element that receives the scroll-lock class.
    pub document_selector: String,
    /// Scroll-lock class.
    pub document_disabled_class: String,
    /// Class put on the opening trigger and helpers while open.
    pub opening_trigger_active_class: String,
    pub delay: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            document_selector: DEFAULT_DOCUMENT_SELECTOR.to_string(),
            document_disabled_class: DEFAULT_DOCUMENT_DISABLED_CLASS.to_string(),
            opening_trigger_active_class: DEFAULT_OPENING_TRIGGER_ACTIVE_CLASS.to_string(),
            delay: DEFAULT_DELAY_MS,
        }
    }
}

// We use thread_local because WASM runs in a single thread.
thread_local! {
    static DEFAULTS: RefCell<Defaults> = RefCell::new(Defaults::default());
}

impl Defaults {
    /// Snapshot of the current process-wide defaults.
    pub fn current() -> Defaults {
        DEFAULTS.with(|defaults| defaults.borrow().clone())
    }
}

/// Partial update for [`set_defaults`]; `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DefaultsUpdate {
    pub document_selector: Option<String>,
    pub document_disabled_class: Option<String>,
    #[serde(alias = "triggerActiveClass")]
    pub opening_trigger_active_class: Option<String>,
    #[serde(alias = "transitionDuration")]
    pub delay: Option<u32>,
}

/// Update the process-wide defaults.  Call before constructing dialogs:
/// instances already built keep the values they were created with.
pub fn set_defaults(update: DefaultsUpdate) {
    DEFAULTS.with(|defaults| {
        let mut defaults = defaults.borrow_mut();
        if let Some(selector) = update.document_selector {
            defaults.document_selector = selector;
        }
        if let Some(class) = update.document_disabled_class {
            defaults.document_disabled_class = class;
        }
        if let Some(class) = update.opening_trigger_active_class {
            defaults.opening_trigger_active_class = class;
        }
        if let Some(delay) = update.delay {
            defaults.delay = delay;
        }
    });
}

/// Per-instance options.  Keys follow the JS option object; the names used by
/// the first release of the component are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DialogOptions {
    #[serde(alias = "openTrigger")]
    pub opening_selector: Option<String>,
    /// Scoped to the dialog.
    #[serde(alias = "closeTrigger")]
    pub closing_selector: Option<String>,
    #[serde(alias = "backdropTrigger")]
    pub backdrop_selector: Option<String>,
    pub helper_selector: Option<String>,
    pub labelledby: Option<String>,
    pub describedby: Option<String>,
    #[serde(alias = "modal")]
    pub is_modal: bool,
    #[serde(alias = "tooltip")]
    pub is_tooltip: bool,
    pub is_open: bool,
    pub is_created: bool,
    pub disable_scroll: bool,
    pub enable_auto_focus: bool,
    #[serde(alias = "triggerActiveClass")]
    pub opening_trigger_active_class: Option<String>,
    #[serde(alias = "transitionDuration")]
    pub delay: Option<u32>,
}

impl Default for DialogOptions {
    fn default() -> Self {
        Self {
            opening_selector: None,
            closing_selector: None,
            backdrop_selector: None,
            helper_selector: None,
            labelledby: None,
            describedby: None,
            is_modal: true,
            is_tooltip: false,
            is_open: false,
            is_created: true,
            disable_scroll: true,
            enable_auto_focus: true,
            opening_trigger_active_class: None,
            delay: None,
        }
    }
}

impl DialogOptions {
    pub fn opening(mut self, selector: &str) -> Self {
        self.opening_selector = Some(selector.to_string());
        self
    }

    pub fn closing(mut self, selector: &str) -> Self {
        self.closing_selector = Some(selector.to_string());
        self
    }

    pub fn backdrop(mut self, selector: &str) -> Self {
        self.backdrop_selector = Some(selector.to_string());
        self
    }

    pub fn helpers(mut self, selector: &str) -> Self {
        self.helper_selector = Some(selector.to_string());
        self
    }

    pub fn non_modal(mut self) -> Self {
        self.is_modal = false;
        self
    }

    /// Tooltips are never modal.
    pub fn tooltip(mut self) -> Self {
        self.is_tooltip = true;
        self.is_modal = false;
        self
    }

    pub fn deferred(mut self) -> Self {
        self.is_created = false;
        self
    }
}

/// Immutable settings of one dialog, resolved at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogConfig {
    pub dialog_selector: String,
    pub opening_selector: Option<String>,
    pub closing_selector: Option<String>,
    pub backdrop_selector: Option<String>,
    pub helper_selector: Option<String>,
    pub labelledby: Option<String>,
    pub describedby: Option<String>,
    pub is_modal: bool,
    pub is_tooltip: bool,
    pub is_open: bool,
    pub is_created: bool,
    pub disable_scroll: bool,
    pub enable_auto_focus: bool,
    pub document_selector: String,
    pub document_disabled_class: String,
    pub opening_trigger_active_class: String,
    pub delay: u32,
}

impl DialogConfig {
    /// Merge `options` over a defaults snapshot.  Per-instance
    /// `openingTriggerActiveClass` and `delay` win over the defaults.
    pub fn resolve(dialog_selector: &str, options: DialogOptions, defaults: &Defaults) -> Self {
        Self {
            dialog_selector: dialog_selector.to_string(),
            opening_selector: options.opening_selector,
            closing_selector: options.closing_selector,
            backdrop_selector: options.backdrop_selector,
            helper_selector: options.helper_selector,
            labelledby: options.labelledby,
            describedby: options.describedby,
            is_modal: options.is_modal,
            is_tooltip: options.is_tooltip,
            is_open: options.is_open,
            is_created: options.is_created,
            disable_scroll: options.disable_scroll,
            enable_auto_focus: options.enable_auto_focus,
            document_selector: defaults.document_selector.clone(),
            document_disabled_class: defaults.document_disabled_class.clone(),
            opening_trigger_active_class: options
                .opening_trigger_active_class
                .unwrap_or_else(|| defaults.opening_trigger_active_class.clone()),
            delay: options.delay.unwrap_or(defaults.delay),
        }
    }
}

type Hook<N> = Box<dyn FnMut(&N, Option<&N>)>;

/// Consumer callbacks, called with the dialog node and the last opening
/// trigger (if any).
pub struct Hooks<N> {
    pub(crate) on_open: Hook<N>,
    pub(crate) on_close: Hook<N>,
}

impl<N: 'static> Default for Hooks<N> {
    fn default() -> Self {
        Self {
            on_open: Box::new(|_: &N, _: Option<&N>| {}),
            on_close: Box::new(|_: &N, _: Option<&N>| {}),
        }
    }
}

impl<N: 'static> Hooks<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_open(mut self, hook: impl FnMut(&N, Option<&N>) + 'static) -> Self {
        self.on_open = Box::new(hook);
        self
    }

    pub fn on_close(mut self, hook: impl FnMut(&N, Option<&N>) + 'static) -> Self {
        self.on_close = Box::new(hook);
        self
    }
}

impl<N> fmt::Debug for Hooks<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}
