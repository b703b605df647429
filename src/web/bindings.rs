//! The JS surface: `new Dialog(selector, options)` and `setDefaults(update)`.

use std::rc::Rc;

use gloo_timers::callback::Timeout;
use js_sys::{Function, Object, Reflect};
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event};

use crate::config::{self, DefaultsUpdate, DialogOptions, Hooks};
use crate::dialog::Dialog;
use crate::dom::EventKind;
use crate::{debug_log, warn_log};

use super::host::{self, SharedDialog, WebDom};

/// Copy of `options` without function-valued keys, ready for serde.
fn plain_options(options: &JsValue) -> Result<JsValue, JsValue> {
    let plain = Object::new();
    let Some(source) = options.dyn_ref::<Object>() else {
        return Ok(plain.into());
    };
    for entry in Object::entries(source).iter() {
        let key = Reflect::get_u32(&entry, 0)?;
        let value = Reflect::get_u32(&entry, 1)?;
        if !value.is_function() {
            Reflect::set(&plain, &key, &value)?;
        }
    }
    Ok(plain.into())
}

fn callback(options: &JsValue, name: &str) -> Option<Function> {
    if !options.is_object() {
        return None;
    }
    Reflect::get(options, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
}

/// Wrap a JS function as a hook called with `(dialog, openingTrigger)`.
fn hook(function: Function, name: &'static str) -> impl FnMut(&Element, Option<&Element>) + 'static {
    move |dialog: &Element, trigger: Option<&Element>| {
        let trigger = trigger
            .map(|trigger| JsValue::from(trigger.clone()))
            .unwrap_or(JsValue::NULL);
        if let Err(e) = function.call2(&JsValue::NULL, &JsValue::from(dialog.clone()), &trigger) {
            warn_log!("{} callback threw: {:?}", name, e);
        }
    }
}

fn hooks_from(options: &JsValue) -> Hooks<Element> {
    let mut hooks = Hooks::new();
    if let Some(on_open) = callback(options, "onOpen") {
        hooks = hooks.on_open(hook(on_open, "onOpen"));
    }
    if let Some(on_close) = callback(options, "onClose") {
        hooks = hooks.on_close(hook(on_close, "onClose"));
    }
    hooks
}

/// An accessible dialog bound to the element matching `selector`.
///
/// Methods called from an `onOpen` or `onClose` hook on the same instance
/// are queued and run right after the call that fired the hook returns.
#[wasm_bindgen(js_name = Dialog)]
pub struct JsDialog {
    inner: SharedDialog,
}

impl JsDialog {
    fn with(&self, action: &'static str, f: impl FnOnce(&mut Dialog<WebDom>) + 'static) {
        match self.inner.try_borrow_mut() {
            Ok(mut dialog) => f(&mut dialog),
            Err(_) => {
                debug_log!("Queueing nested {}() on a busy dialog", action);
                let inner = Rc::clone(&self.inner);
                let _ = Timeout::new(0, move || match inner.try_borrow_mut() {
                    Ok(mut dialog) => f(&mut dialog),
                    Err(_) => warn_log!("Dropping {}() on a dialog that stayed busy", action),
                })
                .forget();
            }
        };
    }
}

#[wasm_bindgen(js_class = Dialog)]
impl JsDialog {
    #[wasm_bindgen(constructor)]
    pub fn new(selector: &str, options: JsValue) -> Result<JsDialog, JsValue> {
        let parsed: DialogOptions = if options.is_undefined() || options.is_null() {
            DialogOptions::default()
        } else {
            serde_wasm_bindgen::from_value(plain_options(&options)?)?
        };
        let inner = host::mount(selector, parsed, hooks_from(&options))?;
        Ok(JsDialog { inner })
    }

    pub fn open(&self) {
        self.with("open", |dialog| dialog.open());
    }

    pub fn close(&self, event: Option<Event>) {
        self.with("close", |dialog| match event {
            Some(event) => dialog.close_from(EventKind::from(event.type_().as_str())),
            None => dialog.close(),
        });
    }

    pub fn toggle(&self, event: Option<Event>) {
        self.with("toggle", |dialog| match event {
            Some(event) => {
                let trigger = event
                    .current_target()
                    .and_then(|target| target.dyn_into::<Element>().ok());
                let cause = EventKind::from(event.type_().as_str());
                dialog.toggle_from(trigger, Some(cause));
            }
            None => dialog.toggle(),
        });
    }

    pub fn create(&self) {
        self.with("create", |dialog| dialog.create());
    }

    pub fn destroy(&self) {
        self.with("destroy", |dialog| dialog.destroy());
    }

    #[wasm_bindgen(js_name = refreshFocusableElements)]
    pub fn refresh_focusable_elements(&self) {
        self.with("refreshFocusableElements", |dialog| {
            dialog.refresh_focusable_elements()
        });
    }

    #[wasm_bindgen(getter = isOpen)]
    pub fn is_open(&self) -> bool {
        self.inner.try_borrow().map(|d| d.is_open()).unwrap_or(false)
    }

    #[wasm_bindgen(getter = isCreated)]
    pub fn is_created(&self) -> bool {
        self.inner.try_borrow().map(|d| d.is_created()).unwrap_or(false)
    }

    #[wasm_bindgen(getter = isInitialized)]
    pub fn is_initialized(&self) -> bool {
        self.inner
            .try_borrow()
            .map(|d| d.is_initialized())
            .unwrap_or(false)
    }

    #[wasm_bindgen(getter)]
    pub fn dialog(&self) -> Option<Element> {
        self.inner.try_borrow().ok()?.dialog().cloned()
    }
}

/// Change the defaults used by dialogs constructed from now on.
#[wasm_bindgen(js_name = setDefaults)]
pub fn set_defaults(update: JsValue) -> Result<(), JsValue> {
    let update: DefaultsUpdate = serde_wasm_bindgen::from_value(update)?;
    config::set_defaults(update);
    Ok(())
}
