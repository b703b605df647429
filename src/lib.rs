//! Accessible dialogs for the browser: modal windows, non-modal panels and
//! tooltips.
//!
//! The state machine in [`dialog`] is written against the [`dom::Dom`]
//! trait.  [`web`] runs it on the real document and exports the `Dialog` JS
//! class; `headless`, behind the feature of that name, runs it on an
//! in-memory document for tests.

use wasm_bindgen::prelude::*;

mod macros;

mod constants;

pub mod config;
pub mod dialog;
pub mod dom;
pub mod focusable;
#[cfg(feature = "headless")]
pub mod headless;
pub mod web;

pub use config::{set_defaults, Defaults, DefaultsUpdate, DialogConfig, DialogOptions, Hooks};
pub use dialog::Dialog;
pub use dom::{Click, Disposition, Dom, EventKind, Key, KeyPress, Listener, Size};
#[cfg(feature = "headless")]
pub use headless::{DomEvent, HeadlessDom, NodeId};

#[wasm_bindgen(start)]
pub fn start() {
    // Initialize better panic messages
    console_error_panic_hook::set_once();
}
