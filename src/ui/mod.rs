// UI module - host-side plumbing around the picker dialog
//
// This module contains:
// - SyncCallBridge: waits for helper replies while re-entering the host event pump
// - WindowBlock: disables the host window while the dialog is modal

pub mod bridge;
pub mod host;

pub use bridge::{EventPump, NoopPump, SyncCallBridge};
pub use host::{HostWindow, UiLock, WindowBlock, new_ui_lock};
