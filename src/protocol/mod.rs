//! Wire protocol spoken between the host and the picker helper.
//!
//! - [`codec`]: length-prefixed, whitespace-delimited encoding of primitive values
//! - [`command`]: the [`Command`] set, each with a fixed argument list and a fixed
//!   [`ResponseKind`]
//! - [`error`]: [`ProtocolError`] (transport failures and stream desync)
//!
//! The channel is strictly half-duplex from the host's point of view: one command
//! is written, its reply (if any) is read in full, and only then is the next
//! command sent. There is no envelope around a command, so a reader that loses
//! its place cannot find the next boundary again. Desync is therefore fatal for
//! the helper session.

pub mod codec;
pub mod command;
pub mod error;

pub use codec::WireValue;
pub use command::{Command, Response, ResponseKind};
pub use error::ProtocolError;
