//! The file-picker facade.
//!
//! [`FilePicker`] is the dialog interface the host programs against. Two
//! implementations sit behind it:
//!
//! - [`IpcFilePicker`]: the dialog lives in the `fpicker-helper` child process
//!   and every call becomes one command exchange over its pipes
//! - [`LocalFilePicker`]: the dialog lives on a dedicated thread of the host
//!   process and every call is marshaled to it
//!
//! [`create_file_picker`] chooses between them from [`PickerConfig::transport`].

pub mod ipc;
pub mod listener;
pub mod local;
pub mod template;

pub use ipc::IpcFilePicker;
pub use listener::{FilePickerListener, ListenerSlot};
pub use local::LocalFilePicker;
pub use template::TemplateId;

use crate::helper::{DialogBackend, HeadlessBackend, NativeBackend};
use crate::metrics::Metrics;
use crate::models::{
    ControlId, ControlValue, DialogBackendKind, DialogResult, InitArgument, PickerConfig,
    Transport,
};
use crate::protocol::ProtocolError;
use crate::ui::{EventPump, HostWindow, SyncCallBridge, UiLock};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Service identifiers every picker answers to
const SERVICE_NAMES: &[&str] = &[
    "fpicker.FilePicker",
    "fpicker.SystemFilePicker",
    "fpicker.BridgedFilePicker",
];

/// The fixed set of service identifiers a picker supports
pub fn supported_service_names() -> &'static [&'static str] {
    SERVICE_NAMES
}

/// Errors surfaced by picker operations
#[derive(Error, Debug)]
pub enum PickerError {
    #[error("Picker helper not found: {0}")]
    HelperNotFound(String),

    #[error("Failed to start picker helper {program}: {source}")]
    Startup {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A previous failure left the session unusable
    #[error("Picker session is closed")]
    SessionClosed,
}

/// The dialog interface offered to the host.
///
/// Calls are strictly sequential: each one completes, reply included, before
/// the next starts. Controls are addressed by [`ControlId`].
pub trait FilePicker {
    fn set_title(&mut self, title: &str) -> Result<(), PickerError>;

    /// Run the dialog modally.
    ///
    /// Never fails: anything that goes wrong is logged and reported as
    /// [`DialogResult::Cancel`].
    fn execute(&mut self) -> DialogResult;

    /// A running dialog is only ever dismissed by the user, so this does nothing
    fn cancel(&mut self) {}

    fn set_multi_selection_mode(&mut self, enabled: bool) -> Result<(), PickerError>;

    fn set_default_name(&mut self, name: &str) -> Result<(), PickerError>;

    fn set_display_directory(&mut self, url: &str) -> Result<(), PickerError>;

    fn display_directory(&mut self) -> Result<String, PickerError>;

    /// The first selected file, if any
    fn files(&mut self) -> Result<Vec<String>, PickerError> {
        let mut files = self.selected_files()?;
        files.truncate(1);
        Ok(files)
    }

    fn selected_files(&mut self) -> Result<Vec<String>, PickerError>;

    fn append_filter(&mut self, title: &str, pattern: &str) -> Result<(), PickerError>;

    /// Append every `(title, pattern)` pair of a group in order
    fn append_filter_group(
        &mut self,
        group_title: &str,
        filters: &[(String, String)],
    ) -> Result<(), PickerError> {
        tracing::debug!("Appending filter group {:?} ({} filters)", group_title, filters.len());
        for (title, pattern) in filters {
            self.append_filter(title, pattern)?;
        }
        Ok(())
    }

    fn set_current_filter(&mut self, title: &str) -> Result<(), PickerError>;

    fn current_filter(&mut self) -> Result<String, PickerError>;

    /// Set a control value. Only boolean values reach the dialog.
    fn set_value(
        &mut self,
        control: ControlId,
        action: i16,
        value: &ControlValue,
    ) -> Result<(), PickerError>;

    fn value(&mut self, control: ControlId, action: i16) -> Result<bool, PickerError>;

    fn enable_control(&mut self, control: ControlId, enable: bool) -> Result<(), PickerError>;

    fn set_label(&mut self, control: ControlId, label: &str) -> Result<(), PickerError>;

    fn label(&mut self, control: ControlId) -> Result<String, PickerError>;

    /// Pick a template from the host's arguments and build the dialog for it
    fn initialize(&mut self, args: &[InitArgument]) -> Result<(), PickerError>;

    /// Register the listener told about filter and selection changes
    fn add_listener(&mut self, listener: Arc<dyn FilePickerListener>);

    fn remove_listener(&mut self);

    /// The host window the dialog is modal for
    fn set_parent_window(&mut self, window: Option<Arc<dyn HostWindow>>);

    fn implementation_name(&self) -> &'static str;

    fn supported_service_names(&self) -> &'static [&'static str] {
        supported_service_names()
    }

    fn supports_service(&self, name: &str) -> bool {
        self.supported_service_names().contains(&name)
    }
}

/// Build the picker selected by `config.transport`.
///
/// `pump` is re-entered while a call waits, so the host stays responsive
/// while the dialog is up. Fails fast when the helper cannot be found or
/// started.
pub fn create_file_picker(
    config: &PickerConfig,
    runtime: tokio::runtime::Handle,
    pump: Box<dyn EventPump>,
    ui_lock: UiLock,
    metrics: Arc<Metrics>,
) -> Result<Box<dyn FilePicker>, PickerError> {
    let bridge = SyncCallBridge::new(
        runtime,
        pump,
        Duration::from_millis(config.poll_interval_ms),
        metrics,
    );

    match config.transport {
        Transport::OutOfProcess => {
            tracing::info!("Creating out-of-process file picker");
            let picker = IpcFilePicker::launch(config, bridge, ui_lock)?;
            Ok(Box::new(picker))
        }
        Transport::InProcess => {
            tracing::info!("Creating in-process file picker");
            let backend: Box<dyn DialogBackend + Send> = match config.dialog_backend {
                DialogBackendKind::Native => Box::new(NativeBackend::new()),
                DialogBackendKind::Headless => Box::new(HeadlessBackend::default()),
            };
            let mut picker = LocalFilePicker::spawn(backend, bridge, ui_lock)?;
            picker.set_block_parent_window(config.block_parent_window);
            Ok(Box::new(picker))
        }
    }
}
