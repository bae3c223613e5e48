use thiserror::Error;

/// Errors raised while moving commands and responses across the helper pipes
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Pipe closed, short read or write failure
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The byte stream no longer lines up with the expected argument list
    #[error("Protocol desync: {0}")]
    Desync(String),

    /// The worker reading a response went away without delivering one
    #[error("Response worker terminated before delivering a value")]
    WorkerLost,
}

impl ProtocolError {
    /// True when the stream position is unknown and the session cannot continue
    pub fn is_desync(&self) -> bool {
        matches!(self, ProtocolError::Desync(_))
    }
}
