//! Data models shared by the host facade, the helper and the configuration layer.
//!
//! - [`PickerConfig`]: transport, dialog backend and helper launch settings loaded from `fpicker.yaml`
//! - [`ControlId`]: custom control identifiers plus their kinds and default labels
//! - [`ControlValue`], [`InitArgument`], [`DialogResult`]: values crossing the picker interface

pub mod config;
pub mod controls;

pub use config::{DEFAULT_HELPER_NAME, DialogBackendKind, HelperSettings, PickerConfig, Transport};
pub use controls::{
    ControlId, ControlKind, ControlValue, DialogResult, InitArgument, control_action,
};
