// fpicker-bridge - Native file picker driven through an out-of-process helper
//
// This is the library crate containing the protocol, the helper supervisor and
// the picker facade. The binaries are the host demo (main.rs) and the helper
// itself (bin/fpicker_helper.rs).

pub mod config;
pub mod helper;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod picker;
pub mod protocol;
pub mod services;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::Metrics;
pub use models::{ControlId, ControlValue, DialogResult, InitArgument, PickerConfig, Transport};
pub use picker::{
    FilePicker, FilePickerListener, PickerError, create_file_picker, supported_service_names,
};
pub use protocol::{Command, ProtocolError, Response};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
