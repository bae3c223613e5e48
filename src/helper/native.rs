use super::{DialogBackend, DialogModel, Filter};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::path::PathBuf;
use url::Url;

/// The platform file dialog, through `rfd`.
///
/// The dialog is created from the model on every `run_modal`; the filter the
/// host marked current is offered first.
pub struct NativeBackend {
    model: DialogModel,
    /// Matches `*.ext` globs in a filter pattern
    extension_pattern: Regex,
}

impl NativeBackend {
    pub fn new() -> Self {
        Self {
            model: DialogModel::new(),
            extension_pattern: Regex::new(r"\*\.([A-Za-z0-9_+~-]+)")
                .expect("Invalid extension regex"),
        }
    }

    /// Extensions named by a normalised pattern, without the leading `*.`
    pub fn extensions(&self, pattern: &str) -> Vec<String> {
        self.extension_pattern
            .captures_iter(pattern)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }

    /// Filters in presentation order: the current one first
    fn ordered_filters(&self) -> Vec<&Filter> {
        let current = self.model.current_filter_entry();
        let mut filters: Vec<&Filter> = current.into_iter().collect();
        filters.extend(
            self.model
                .filters()
                .iter()
                .filter(|f| Some(*f) != current),
        );
        filters
    }

    fn build_dialog(&self) -> rfd::FileDialog {
        let mut dialog = rfd::FileDialog::new();

        if !self.model.title.is_empty() {
            dialog = dialog.set_title(&self.model.title);
        }
        if let Some(dir) = file_url_to_path(&self.model.display_directory) {
            dialog = dialog.set_directory(dir.as_std_path());
        }
        if !self.model.default_name.is_empty() {
            dialog = dialog.set_file_name(&self.model.default_name);
        }

        for filter in self.ordered_filters() {
            let extensions = self.extensions(&filter.pattern);
            if extensions.is_empty() {
                // `*` and friends: rfd shows all files when no filter matches
                continue;
            }
            dialog = dialog.add_filter(filter.descriptor(), extensions.as_slice());
        }

        dialog
    }
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogBackend for NativeBackend {
    fn model(&self) -> &DialogModel {
        &self.model
    }

    fn model_mut(&mut self) -> &mut DialogModel {
        &mut self.model
    }

    fn run_modal(&mut self) -> bool {
        let dialog = self.build_dialog();
        tracing::info!(
            "Showing native {} dialog",
            if self.model.save_dialog { "save" } else { "open" }
        );

        let picked: Vec<PathBuf> = if self.model.save_dialog {
            dialog.save_file().into_iter().collect()
        } else if self.model.multi_selection {
            dialog.pick_files().unwrap_or_default()
        } else {
            dialog.pick_file().into_iter().collect()
        };

        self.model.selected_files = picked
            .into_iter()
            .filter_map(|path| {
                Utf8PathBuf::try_from(path)
                    .map_err(|e| {
                        tracing::error!("Failed to convert path to UTF-8: {}", e);
                        e
                    })
                    .ok()
            })
            .filter_map(|path| path_to_file_url(&path))
            .collect();

        tracing::debug!("Dialog returned {} files", self.model.selected_files.len());
        !self.model.selected_files.is_empty()
    }
}

/// `file://` URL for an absolute path; `None` for a relative one
pub fn path_to_file_url(path: &Utf8Path) -> Option<String> {
    Url::from_file_path(path.as_std_path())
        .map(String::from)
        .map_err(|()| tracing::warn!("Cannot express {} as a file URL", path))
        .ok()
}

/// Local path named by a `file://` URL; `None` for anything else
pub fn file_url_to_path(url: &str) -> Option<Utf8PathBuf> {
    let url = Url::parse(url).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    // An escaped separator would split one segment into two path components
    if url
        .path_segments()?
        .any(|segment| segment.to_ascii_lowercase().contains("%2f"))
    {
        return None;
    }
    let path = url.to_file_path().ok()?;
    Utf8PathBuf::try_from(path).ok()
}
