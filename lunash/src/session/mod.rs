//! Logical sessions on an established channel.
//!
//! The protocols in this crate only need three things from the transport:
//! a way to open a session ([`SessionFactory`]), a way to configure and
//! start it ([`Session`]), and an ordered byte stream to talk over
//! ([`SessionIo`]). [`SshTransport`](crate::transport::SshTransport) is the
//! production implementation.

#[cfg(test)]
pub(crate) mod mock;
mod pty;
mod scope;

pub use pty::PtyConfig;
pub use scope::with_session;

use std::future::Future;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::Result;

/// Ordered duplex byte stream of an open session.
pub trait SessionIo: Send {
    /// Write all of `data`, in order.
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Read whatever is available into `buf`, at least one byte.
    ///
    /// Returns `Ok(0)` once the remote has closed its side.
    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;
}

/// A logical sub-channel that must be closed exactly once.
pub trait Session: SessionIo {
    /// Request a pseudo-terminal.
    fn request_pty(&mut self, pty: &PtyConfig) -> impl Future<Output = Result<()>> + Send;

    /// Start the remote login shell.
    fn request_shell(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Start a remote command without waiting for it to exit.
    fn exec(&mut self, command: &str) -> impl Future<Output = Result<()>> + Send;

    /// Release the session.
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens sessions on an established channel.
pub trait SessionFactory: Sync {
    /// Session type produced by this factory.
    type Session: Session;

    /// Open a new session.
    fn open_session(&self) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// Adapts any tokio byte stream to [`SessionIo`].
#[derive(Debug)]
pub struct StreamIo<T>(pub T);

impl<T> SessionIo for StreamIo<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.0.write_all(data).await?;
        self.0.flush().await
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf).await
    }
}

/// Read until end of stream is a transport failure at `step`.
pub(crate) async fn read_some<I: SessionIo>(
    io: &mut I,
    buf: &mut [u8],
    step: &str,
) -> Result<usize> {
    match io.read(buf).await {
        Ok(0) if !buf.is_empty() => Err(unexpected_eof(step)),
        Ok(n) => Ok(n),
        Err(e) => Err(crate::Error::io(step, e)),
    }
}

/// The transport error for a remote that hung up during `step`.
pub(crate) fn unexpected_eof(step: &str) -> crate::Error {
    crate::Error::io(
        step,
        io::Error::new(io::ErrorKind::UnexpectedEof, "remote closed the session"),
    )
}

/// Write `data` or fail with a transport error at `step`.
pub(crate) async fn write_step<I: SessionIo>(io: &mut I, data: &[u8], step: &str) -> Result<()> {
    io.write_all(data)
        .await
        .map_err(|e| crate::Error::io(step, e))
}
