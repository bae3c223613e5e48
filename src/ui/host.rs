// Host window blocking while a picker dialog is modal
//
// The helper's dialog is a separate top-level window, so the host has to stop
// its own main window from taking input or closing until the dialog returns.
// All toggles happen under the host's UI lock, held only for the toggle itself.

use std::sync::{Arc, Mutex, PoisonError};

/// The host's main UI mutual-exclusion primitive
pub type UiLock = Arc<Mutex<()>>;

/// Create a fresh UI lock for hosts that do not already have one
pub fn new_ui_lock() -> UiLock {
    Arc::new(Mutex::new(()))
}

/// The host window a picker dialog is shown on top of
#[cfg_attr(test, mockall::automock)]
pub trait HostWindow: Send + Sync {
    /// Native window id used to make the dialog transient for this window
    fn native_handle(&self) -> Option<u64>;

    /// Enable or disable user input on the window
    fn set_input_enabled(&self, enabled: bool);

    /// Block or allow closing the window
    fn set_close_blocked(&self, blocked: bool);
}

/// Keeps a host window disabled while alive; re-enables it on drop.
///
/// Dropping restores the window on every exit path, including early returns
/// on protocol errors and unwinding.
pub struct WindowBlock {
    window: Arc<dyn HostWindow>,
    ui_lock: UiLock,
}

impl WindowBlock {
    /// Disable input and closing on `window`
    pub fn engage(window: Arc<dyn HostWindow>, ui_lock: UiLock) -> Self {
        {
            let _guard = ui_lock.lock().unwrap_or_else(PoisonError::into_inner);
            window.set_input_enabled(false);
            window.set_close_blocked(true);
        }
        tracing::debug!("Host window blocked for modal picker");

        Self { window, ui_lock }
    }
}

impl Drop for WindowBlock {
    fn drop(&mut self) {
        let _guard = self.ui_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.window.set_input_enabled(true);
        self.window.set_close_blocked(false);
        tracing::debug!("Host window restored");
    }
}
