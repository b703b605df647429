// Default values for the process-wide configuration - these are the single
// source of truth for defaults.
pub const DEFAULT_DOCUMENT_SELECTOR: &str = ".js-document";
pub const DEFAULT_DOCUMENT_DISABLED_CLASS: &str = "is-disabled";
pub const DEFAULT_OPENING_TRIGGER_ACTIVE_CLASS: &str = "is-active";
/// Milliseconds to wait before moving focus, so a CSS transition can make the
/// target focusable first.
pub const DEFAULT_DELAY_MS: u32 = 200;

/// Fallback when `documentSelector` matches nothing.
pub const DOCUMENT_ELEMENT_SELECTOR: &str = "html";

// Attributes written on the dialog and its triggers.
pub const ATTR_ROLE: &str = "role";
pub const ATTR_TABINDEX: &str = "tabindex";
pub const ATTR_ARIA_HIDDEN: &str = "aria-hidden";
pub const ATTR_ARIA_MODAL: &str = "aria-modal";
pub const ATTR_ARIA_LABELLEDBY: &str = "aria-labelledby";
pub const ATTR_ARIA_DESCRIBEDBY: &str = "aria-describedby";
pub const ATTR_ARIA_HASPOPUP: &str = "aria-haspopup";

pub const ROLE_DIALOG: &str = "dialog";

// `KeyboardEvent.key` values the dialog reacts to.
pub const KEY_ESCAPE: &str = "Escape";
pub const KEY_TAB: &str = "Tab";
pub const KEY_F6: &str = "F6";
