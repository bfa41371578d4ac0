use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Framing errors
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Protocol id mismatch in line '{line}'")]
    ProtocolIdMismatch { line: String },

    #[error("Frame too large: {size} bytes (max {max_size})")]
    FrameTooLarge { size: usize, max_size: usize },

    // Catalog errors
    #[error("Unknown message tag '{tag}' in line '{line}'")]
    UnknownTag { tag: String, line: String },

    #[error("Invalid {kind} message: '{line}'")]
    InvalidMessage { kind: String, line: String },

    // Session errors
    #[error("Message {kind} is prohibited in state {state}")]
    ProhibitedMessage { kind: String, state: String },

    #[error("Server reported a protocol violation: {0}")]
    ServerRejected(String),

    // User input errors
    #[error("Invalid nick '{0}': expected one non-empty word")]
    InvalidNick(String),

    #[error("Invalid IPv4 address '{0}'")]
    InvalidAddress(String),

    #[error("Invalid port '{0}': expected an integer between 0 and 65535")]
    InvalidPort(String),

    #[error("Invalid column {column}: expected 0..{columns}")]
    InvalidColumn { column: usize, columns: usize },

    #[error("Command rejected: {0}")]
    CommandRejected(String),

    // Transport errors
    #[error("Not connected to server")]
    NotConnected,

    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the server and client must be considered desynchronized.
    ///
    /// Framing, catalog and state violations are fatal, as is an
    /// `INVALID_PROTOCOL` notice from the server. Transport failures are
    /// recovered by reconnecting and never count as fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvalidFrame(_)
                | Error::ProtocolIdMismatch { .. }
                | Error::FrameTooLarge { .. }
                | Error::UnknownTag { .. }
                | Error::InvalidMessage { .. }
                | Error::ProhibitedMessage { .. }
                | Error::ServerRejected(_)
        )
    }

    /// Whether the error is a rejected user command that never reached the wire.
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidNick(_)
                | Error::InvalidAddress(_)
                | Error::InvalidPort(_)
                | Error::InvalidColumn { .. }
                | Error::CommandRejected(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
