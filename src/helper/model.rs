use crate::models::ControlKind;
use indexmap::IndexMap;

/// A filter as the dialog shows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Title with `/` escaped
    pub title: String,
    /// Space-separated glob list
    pub pattern: String,
}

impl Filter {
    fn new(title: &str, pattern: &str) -> Self {
        Self {
            title: title.replace('/', "\\/"),
            pattern: pattern.replace(';', " ").replace("*.*", "*"),
        }
    }

    /// The title as the host spelled it
    pub fn descriptor(&self) -> String {
        self.title.replace("\\/", "/")
    }
}

/// A widget added to the dialog on the host's request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomControl {
    pub kind: ControlKind,
    pub label: String,
    pub hidden: bool,
    pub enabled: bool,
    pub checked: bool,
}

/// Everything the host has configured on the dialog, plus the outcome of the
/// last run.
#[derive(Debug, Clone, Default)]
pub struct DialogModel {
    pub title: String,
    pub parent_window: Option<u64>,
    pub multi_selection: bool,
    pub default_name: String,
    /// Directory URL the dialog opens in
    pub display_directory: String,
    pub save_dialog: bool,
    pub selected_files: Vec<String>,
    filters: Vec<Filter>,
    current_filter: Option<String>,
    controls: IndexMap<i16, CustomControl>,
}

impl DialogModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_filter(&mut self, title: &str, pattern: &str) {
        let filter = Filter::new(title, pattern);
        tracing::debug!("Filter added: {} ({})", filter.title, filter.pattern);
        self.filters.push(filter);
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn set_current_filter(&mut self, title: &str) {
        self.current_filter = Some(title.to_string());
    }

    /// The selected filter's title, falling back to the first filter
    pub fn current_filter(&self) -> String {
        if let Some(title) = &self.current_filter {
            return title.clone();
        }
        self.filters
            .first()
            .map(Filter::descriptor)
            .unwrap_or_default()
    }

    /// The filter matching the current title, if it was appended
    pub fn current_filter_entry(&self) -> Option<&Filter> {
        let current = self.current_filter();
        self.filters.iter().find(|f| f.descriptor() == current)
    }

    pub fn add_check_box(&mut self, control: i16, hidden: bool, label: &str) {
        tracing::debug!("Check box {} added (hidden: {})", control, hidden);
        self.controls.insert(
            control,
            CustomControl {
                kind: ControlKind::CheckBox,
                label: label.to_string(),
                hidden,
                enabled: true,
                checked: false,
            },
        );
    }

    pub fn controls(&self) -> impl Iterator<Item = (i16, &CustomControl)> {
        self.controls.iter().map(|(id, control)| (*id, control))
    }

    pub fn control(&self, control: i16) -> Option<&CustomControl> {
        self.controls.get(&control)
    }

    fn check_box_mut(&mut self, control: i16, operation: &str) -> Option<&mut CustomControl> {
        match self.controls.get_mut(&control) {
            Some(entry) if entry.kind == ControlKind::CheckBox => Some(entry),
            Some(_) => None,
            None => {
                tracing::debug!("{} on unknown control {}", operation, control);
                None
            }
        }
    }

    pub fn set_value(&mut self, control: i16, _action: i16, value: bool) {
        if let Some(check_box) = self.check_box_mut(control, "Set value") {
            check_box.checked = value;
        }
    }

    pub fn value(&self, control: i16, _action: i16) -> bool {
        match self.controls.get(&control) {
            Some(entry) if entry.kind == ControlKind::CheckBox => entry.checked,
            Some(_) => false,
            None => {
                tracing::debug!("Get value on unknown control {}", control);
                false
            }
        }
    }

    pub fn enable_control(&mut self, control: i16, enable: bool) {
        match self.controls.get_mut(&control) {
            Some(entry) => entry.enabled = enable,
            None => tracing::debug!("Enable on unknown control {}", control),
        }
    }

    pub fn set_label(&mut self, control: i16, label: &str) {
        if let Some(check_box) = self.check_box_mut(control, "Set label") {
            check_box.label = label.to_string();
        }
    }

    pub fn label(&self, control: i16) -> String {
        match self.controls.get(&control) {
            Some(entry) if entry.kind == ControlKind::CheckBox => entry.label.clone(),
            Some(_) => String::new(),
            None => {
                tracing::debug!("Get label on unknown control {}", control);
                String::new()
            }
        }
    }

    /// Enter open or save mode, dropping filters from any earlier setup
    pub fn initialize(&mut self, save_dialog: bool) {
        self.save_dialog = save_dialog;
        self.filters.clear();
        self.current_filter = None;
    }
}
