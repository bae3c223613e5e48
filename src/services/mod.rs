//! Services module - process management for the picker helper.
//!
//! # Components
//!
//! - [`HelperProcess`]: owns the `fpicker-helper` child and its stdin/stdout pipes.
//!   Handles:
//!   - Launching with piped stdin/stdout and inherited stderr
//!   - Writing commands and lending the reply reader to the bridge
//!   - Marking the session broken on transport failures and killing the helper on desync
//!   - Bounded teardown: Quit, a short grace period, then kill
//!
//! - [`discover_helper`]: finds the helper executable next to the running program or on `PATH`
//!
//! The services layer has no UI dependencies. Waiting for replies without
//! freezing the host is the job of [`crate::ui::SyncCallBridge`].

pub mod supervisor;

pub use supervisor::{HelperProcess, ProcessState, discover_helper};
