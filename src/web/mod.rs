//! web – the browser host and the JS-facing `Dialog` class.

mod bindings;
mod host;

pub use bindings::{set_defaults, JsDialog};
pub use host::{mount, SharedDialog, WebDom};
