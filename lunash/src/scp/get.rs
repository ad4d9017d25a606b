//! Pulling a file from a remote `scp -f`.

use memchr::memchr;

use super::metadata::{FileMetadata, remote_error};
use crate::error::{Error, Result, ScpError};
use crate::session::{SessionIo, unexpected_eof, write_step};
use crate::steplog::{StepLog, step};

/// Largest metadata line accepted.
pub const METADATA_LIMIT: usize = 1024;

/// Largest single payload read.
pub const PAYLOAD_CHUNK: usize = 16 * 1024;

/// Run the receiving side of a single-file transfer on a started `scp -f`.
pub async fn receive<I: SessionIo>(io: &mut I, log: &dyn StepLog) -> Result<Vec<u8>> {
    step!(log, "Writing null byte");
    write_step(io, &[0], "Error requesting SCP metadata").await?;

    step!(log, "Reading file metadata");
    let line = read_metadata(io).await?;
    step!(log, "Got metadata: {:?}", line);
    let metadata = FileMetadata::parse(&line)?;

    step!(log, "Writing null byte");
    write_step(io, &[0], "Error acknowledging SCP metadata").await?;

    step!(log, "Reading file: {} bytes", metadata.length);
    let file = read_payload(io, metadata.length).await?;

    step!(log, "Writing null byte");
    write_step(io, &[0], "Error acknowledging SCP payload").await?;

    Ok(file)
}

/// Read the metadata line, or up to [`METADATA_LIMIT`] bytes of it.
///
/// A reply starting with a warning or error byte is reported as a remote
/// error even if the remote hangs up before finishing the line.
async fn read_metadata<I: SessionIo>(io: &mut I) -> Result<String> {
    let mut buf = [0u8; METADATA_LIMIT];
    let mut filled = 0;

    while filled < buf.len() && memchr(b'\n', &buf[..filled]).is_none() {
        match io.read(&mut buf[filled..]).await {
            Ok(0) => {
                if let Some(err) = remote_error(&buf[..filled]) {
                    return Err(err.into());
                }
                return Err(unexpected_eof("Error reading SCP metadata"));
            }
            Ok(n) => filled += n,
            Err(e) => return Err(Error::io("Error reading SCP metadata", e)),
        }
    }

    if let Some(err) = remote_error(&buf[..filled]) {
        return Err(err.into());
    }
    Ok(String::from_utf8_lossy(&buf[..filled]).into_owned())
}

/// Read exactly `length` bytes, accumulating across reads.
///
/// The buffer grows with the data actually received, so a declared length
/// is never allocated up front. End of stream before `length` bytes is an
/// incomplete file.
async fn read_payload<I: SessionIo>(io: &mut I, length: u64) -> Result<Vec<u8>> {
    let mut file = Vec::with_capacity(length.min(PAYLOAD_CHUNK as u64) as usize);
    let mut chunk = vec![0u8; PAYLOAD_CHUNK];

    while (file.len() as u64) < length {
        let want = (length - file.len() as u64).min(PAYLOAD_CHUNK as u64) as usize;
        match io.read(&mut chunk[..want]).await {
            Ok(0) => break,
            Ok(n) => file.extend_from_slice(&chunk[..n]),
            Err(e) => return Err(Error::io("Error reading SCP payload", e)),
        }
    }

    if file.len() as u64 != length {
        return Err(ScpError::IncompleteFile {
            expected: length,
            received: file.len() as u64,
        }
        .into());
    }

    Ok(file)
}
