//! Single-file SCP push and pull over a plain session.
//!
//! Only the subset the appliance needs: one regular file per session, no
//! directories, no timestamps. Each step of the exchange is a zero-byte
//! acknowledgement or the `C<mode> <length> <path>` header followed by
//! exactly `length` payload bytes.

pub mod get;
mod metadata;
pub mod put;

pub use metadata::{FileMetadata, PUT_MODE, remote_error};

use std::sync::Arc;

use crate::error::Result;
use crate::session::{Session, SessionFactory, with_session};
use crate::steplog::{Quiet, StepLog, step};

/// Remote program that implements the transfer.
pub const DEFAULT_PROGRAM: &str = "scp";

/// File transfer client.
pub struct Scp {
    program: String,
    log: Arc<dyn StepLog>,
}

impl Default for Scp {
    fn default() -> Self {
        Self::new()
    }
}

impl Scp {
    /// Create a transfer client using `scp` with quiet step logging.
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            log: Arc::new(Quiet),
        }
    }

    /// Set the remote transfer program.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the step log.
    pub fn with_log(mut self, log: Arc<dyn StepLog>) -> Self {
        self.log = log;
        self
    }

    /// Pull the file at `path`.
    pub async fn get_file<F: SessionFactory>(&self, factory: &F, path: &str) -> Result<Vec<u8>> {
        step!(self.log, "GetFile: {}", path);
        with_session(factory, async |session| {
            self.start(session, &format!("{} -f {}", self.program, path))
                .await?;
            get::receive(session, self.log.as_ref()).await
        })
        .await
    }

    /// Push `data` to `path`.
    pub async fn put_file<F: SessionFactory>(
        &self,
        factory: &F,
        path: &str,
        data: &[u8],
    ) -> Result<()> {
        step!(self.log, "PutFile: {} ({} bytes)", path, data.len());
        with_session(factory, async |session| {
            self.start(session, &format!("{} -t {}", self.program, path))
                .await?;
            put::send(session, path, data, self.log.as_ref()).await
        })
        .await
    }

    async fn start<S: Session>(&self, session: &mut S, command: &str) -> Result<()> {
        step!(self.log, "Running command: '{}'", command);
        session.exec(command).await
    }
}
