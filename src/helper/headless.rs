use super::{DialogBackend, DialogModel};
use std::time::Duration;

/// A dialog without any UI.
///
/// `run_modal` waits for the configured delay, then accepts or cancels as
/// scripted. Used for tests, CI and hosts running without a display.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    model: DialogModel,
    accept: bool,
    selection: Vec<String>,
    delay: Duration,
}

impl HeadlessBackend {
    pub fn new(accept: bool, selection: Vec<String>, delay: Duration) -> Self {
        Self {
            model: DialogModel::new(),
            accept,
            selection,
            delay,
        }
    }

    /// What an accepted dialog returns when no selection was scripted
    fn default_selection(&self) -> Vec<String> {
        let name = &self.model.default_name;
        if name.is_empty() {
            return Vec::new();
        }
        let dir = self.model.display_directory.trim_end_matches('/');
        if dir.is_empty() {
            vec![name.clone()]
        } else {
            vec![format!("{}/{}", dir, name)]
        }
    }
}

impl DialogBackend for HeadlessBackend {
    fn model(&self) -> &DialogModel {
        &self.model
    }

    fn model_mut(&mut self) -> &mut DialogModel {
        &mut self.model
    }

    fn run_modal(&mut self) -> bool {
        tracing::info!(
            "Headless dialog {:?} ({} filters, save: {})",
            self.model.title,
            self.model.filters().len(),
            self.model.save_dialog
        );
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        if !self.accept {
            self.model.selected_files.clear();
            return false;
        }

        let mut selection = if self.selection.is_empty() {
            self.default_selection()
        } else {
            self.selection.clone()
        };
        if !self.model.multi_selection || self.model.save_dialog {
            selection.truncate(1);
        }
        self.model.selected_files = selection;
        true
    }
}
