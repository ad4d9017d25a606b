//! Error types for lunash.

use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for lunash operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Session (logical channel) errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Command batch errors
    #[error("Shell error: {0}")]
    Shell(#[from] ShellError),

    /// File transfer framing errors
    #[error("SCP error: {0}")]
    Scp(#[from] ScpError),

    /// Configuration file errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// The line is down: a read, write or connection failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// The remote spoke a dialect we don't understand.
    pub fn is_framing(&self) -> bool {
        matches!(self, Error::Scp(_))
    }

    /// At least one command ran but reported a non-success status.
    pub fn is_command_failure(&self) -> bool {
        matches!(self, Error::Shell(ShellError::CommandsFailed { .. }))
    }

    /// The session could not be released.
    pub fn is_release(&self) -> bool {
        matches!(self, Error::Channel(ChannelError::CloseFailed { .. }))
    }

    /// Shorthand for a session I/O failure at `step`.
    pub(crate) fn io(step: impl Into<String>, source: io::Error) -> Self {
        TransportError::Io {
            step: step.into(),
            source,
        }
        .into()
    }
}

/// Transport layer errors (SSH connection, authentication, session I/O).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host key does not match the pinned fingerprint
    #[error("Bad host key for {host}: fingerprint {fingerprint}")]
    HostKeyMismatch { host: String, fingerprint: String },

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Session read or write failed
    #[error("{step}: {source}")]
    Io {
        step: String,
        #[source]
        source: io::Error,
    },
}

/// Session-level errors (open, PTY, remote process start, release).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Failed to open a session on the connection
    #[error("Error opening session: {0}")]
    OpenFailed(#[source] russh::Error),

    /// The remote refused the PTY request
    #[error("Error requesting PTY")]
    PtyRequestFailed,

    /// The remote refused to start a login shell
    #[error("Error starting login shell")]
    ShellRequestFailed,

    /// The remote refused to start a command
    #[error("Error starting command '{command}'")]
    ExecFailed { command: String },

    /// SSH protocol error while driving the session
    #[error("Channel SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Failed to release the session
    #[error("Error closing session: {source}")]
    CloseFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Command batch errors.
#[derive(Error, Debug)]
pub enum ShellError {
    /// One or more commands returned a non-success status line
    #[error("Non-success return code while running {}", quote_all(.commands))]
    CommandsFailed { commands: Vec<String> },

    /// Login was requested but no appliance credential is configured
    #[error("'hsm login' requested without an appliance password")]
    MissingCredential,
}

fn quote_all(commands: &[String]) -> String {
    commands
        .iter()
        .map(|c| format!("'{}'", c.trim_end()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// File transfer framing errors.
#[derive(Error, Debug)]
pub enum ScpError {
    /// Metadata line did not have the `<mode> <length> <path>` shape
    #[error("Bad metadata from SCP: {metadata:?}")]
    BadMetadata { metadata: String },

    /// Length field was not a decimal integer
    #[error("Error parsing SCP metadata length {field:?}: {source}")]
    BadLength {
        field: String,
        #[source]
        source: ParseIntError,
    },

    /// Fewer payload bytes arrived than the metadata declared
    #[error("Read incomplete file: expected {expected} bytes, got {received}")]
    IncompleteFile { expected: u64, received: u64 },

    /// The remote side reported an error instead of acknowledging
    #[error("Remote SCP error: {message}")]
    Remote { message: String },
}

/// Configuration file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Error reading config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Config file is not a JSON list of appliances
    #[error("Error parsing config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No appliance matches the requested name
    #[error("No appliance named '{name}' in config")]
    UnknownAppliance { name: String },
}

/// Result type alias using lunash's Error.
pub type Result<T> = std::result::Result<T, Error>;
