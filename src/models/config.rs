use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Default name of the helper executable
pub const DEFAULT_HELPER_NAME: &str = "fpicker-helper";

/// Picker configuration from fpicker.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickerConfig {
    /// Where the dialog runs
    #[serde(default)]
    pub transport: Transport,

    /// Which dialog implementation presents the picker
    #[serde(default)]
    pub dialog_backend: DialogBackendKind,

    #[serde(default)]
    pub helper: HelperSettings,

    /// How long the waiting thread sleeps between event pump slices
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long teardown waits for the helper to exit after Quit
    #[serde(default = "default_quit_grace_ms")]
    pub quit_grace_ms: u64,

    /// Disable the host window while the dialog is modal
    #[serde(default = "default_true")]
    pub block_parent_window: bool,

    #[serde(default)]
    pub debug_mode: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Dialog runs in the helper process, driven over pipes
    #[default]
    OutOfProcess,
    /// Dialog runs on a dedicated thread of the host process
    InProcess,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogBackendKind {
    /// Platform file dialog
    #[default]
    Native,
    /// Scripted dialog without any UI
    Headless,
}

/// How to find and launch the helper executable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelperSettings {
    #[serde(default = "default_helper_name")]
    pub name: String,

    /// Explicit path; skips the search when set
    #[serde(default)]
    pub path: Option<Utf8PathBuf>,

    /// Extra arguments passed to the helper
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            dialog_backend: DialogBackendKind::default(),
            helper: HelperSettings::default(),
            poll_interval_ms: default_poll_interval_ms(),
            quit_grace_ms: default_quit_grace_ms(),
            block_parent_window: true,
            debug_mode: false,
        }
    }
}

impl Default for HelperSettings {
    fn default() -> Self {
        Self {
            name: default_helper_name(),
            path: None,
            args: Vec::new(),
        }
    }
}

impl DialogBackendKind {
    /// Value accepted by the helper's `--backend` flag
    pub fn as_arg(&self) -> &'static str {
        match self {
            DialogBackendKind::Native => "native",
            DialogBackendKind::Headless => "headless",
        }
    }
}

fn default_helper_name() -> String {
    DEFAULT_HELPER_NAME.to_string()
}

fn default_poll_interval_ms() -> u64 {
    1
}

fn default_quit_grace_ms() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picker_config_defaults() {
        let config = PickerConfig::default();
        assert_eq!(config.transport, Transport::OutOfProcess);
        assert_eq!(config.dialog_backend, DialogBackendKind::Native);
        assert_eq!(config.poll_interval_ms, 1);
        assert_eq!(config.quit_grace_ms, 100);
        assert!(config.block_parent_window);
        assert_eq!(config.helper.name, "fpicker-helper");
        assert!(config.helper.path.is_none());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: PickerConfig = serde_yaml_ng::from_str("transport: in_process\n").unwrap();
        assert_eq!(config.transport, Transport::InProcess);
        assert_eq!(config.quit_grace_ms, 100);
        assert!(config.block_parent_window);
    }

    #[test]
    fn test_backend_arg() {
        assert_eq!(DialogBackendKind::Headless.as_arg(), "headless");
        assert_eq!(DialogBackendKind::Native.as_arg(), "native");
    }
}
