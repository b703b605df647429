//! Small crate-wide logging macros.
//!
//! Both forward to the browser console on `wasm32`.  On native targets the
//! arguments are still type-checked but nothing is printed, so the headless
//! test-suite stays quiet.

/// Debug-level trace of state transitions.  Compiled out of release builds.
///
/// ```rust,ignore
/// debug_log!("dialog `{}` opened", selector);
/// ```
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {{
        #[cfg(all(target_arch = "wasm32", debug_assertions))]
        {
            ::web_sys::console::debug_1(&format!($($arg)*).into());
        }
        #[cfg(not(all(target_arch = "wasm32", debug_assertions)))]
        {
            if false {
                let _ = format!($($arg)*);
            }
        }
    }};
}

/// Report a failure at the DOM boundary that we chose to swallow.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {{
        #[cfg(target_arch = "wasm32")]
        {
            ::web_sys::console::warn_1(&format!($($arg)*).into());
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            if false {
                let _ = format!($($arg)*);
            }
        }
    }};
}
