//! Pushing a file to a remote `scp -t`.

use super::metadata::{FileMetadata, remote_error};
use crate::error::Result;
use crate::session::{SessionIo, read_some, write_step};
use crate::steplog::{StepLog, step};

/// Size of each acknowledgement read.
pub const ACK_BUF: usize = 1024;

/// Run the sending side of a single-file transfer on a started `scp -t`.
///
/// Acknowledgement reads drain whatever the remote sent, up to
/// [`ACK_BUF`] bytes; only an error marker in the first byte is acted on.
pub async fn send<I: SessionIo>(
    io: &mut I,
    path: &str,
    data: &[u8],
    log: &dyn StepLog,
) -> Result<()> {
    let mut ack = [0u8; ACK_BUF];

    step!(log, "Reading ready byte");
    drain_ack(io, &mut ack, "Error reading SCP ready byte").await?;

    let header = FileMetadata::put_header(data.len(), path);
    step!(log, "Writing header {:?}", header);
    write_step(io, header.as_bytes(), "Error writing SCP header").await?;

    step!(log, "Writing file: {} bytes", data.len());
    write_step(io, data, "Error writing SCP payload").await?;

    step!(log, "Reading payload ack");
    drain_ack(io, &mut ack, "Error reading SCP payload ack").await?;

    step!(log, "Writing null byte");
    write_step(io, &[0], "Error writing SCP end of transfer").await?;

    step!(log, "Reading final ack");
    drain_ack(io, &mut ack, "Error reading SCP final ack").await?;

    Ok(())
}

async fn drain_ack<I: SessionIo>(io: &mut I, buf: &mut [u8], step: &str) -> Result<()> {
    let n = read_some(io, buf, step).await?;
    match remote_error(&buf[..n]) {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
