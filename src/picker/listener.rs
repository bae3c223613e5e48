use crate::models::ControlId;
use std::sync::Arc;

/// Receives change notifications from a picker.
///
/// Notifications are delivered on the thread that made the picker call which
/// caused them, after that call has completed.
#[cfg_attr(test, mockall::automock)]
pub trait FilePickerListener: Send + Sync {
    /// The dialog was accepted with a new selection
    fn file_selection_changed(&self);

    /// A control changed state; filter changes report [`ControlId::LISTBOX_FILTER`]
    fn control_state_changed(&self, control: ControlId);
}

/// The one listener a picker notifies. Registering another replaces it.
#[derive(Clone, Default)]
pub struct ListenerSlot {
    listener: Option<Arc<dyn FilePickerListener>>,
}

impl ListenerSlot {
    pub fn set(&mut self, listener: Arc<dyn FilePickerListener>) {
        if self.listener.replace(listener).is_some() {
            tracing::debug!("Replacing registered picker listener");
        }
    }

    pub fn clear(&mut self) {
        self.listener = None;
    }

    pub fn is_set(&self) -> bool {
        self.listener.is_some()
    }

    pub fn filter_changed(&self) {
        if let Some(listener) = &self.listener {
            listener.control_state_changed(ControlId::LISTBOX_FILTER);
        }
    }

    pub fn selection_changed(&self) {
        if let Some(listener) = &self.listener {
            listener.file_selection_changed();
        }
    }
}
