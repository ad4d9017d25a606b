//! Transcript accumulation up to the shell prompt, and line splitting.
//!
//! The shell stream has no framing: a reply ends when the accumulated bytes
//! end with the prompt. The prompt occupies the last line of the
//! transcript, possibly preceded by whitespace, so the whole last line is
//! removed rather than just the prompt text.

use bytes::BytesMut;
use memchr::{memchr, memrchr};

use crate::error::Result;
use crate::session::{SessionIo, read_some};

/// Size of each read from the session.
pub const CHUNK_SIZE: usize = 1024;

/// Buffer for accumulating shell output until the prompt arrives.
#[derive(Debug)]
pub struct TranscriptBuffer {
    /// The accumulated output.
    buffer: BytesMut,

    /// Prompt the output must end with.
    prompt: Vec<u8>,
}

impl TranscriptBuffer {
    /// Create an empty transcript that completes on `prompt`.
    pub fn new(prompt: &str) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            prompt: prompt.as_bytes().to_vec(),
        }
    }

    /// Append newly read bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Whether the buffer ends exactly with the prompt.
    ///
    /// A prompt followed by anything else does not count.
    pub fn ends_with_prompt(&self) -> bool {
        !self.prompt.is_empty() && self.buffer.ends_with(&self.prompt)
    }

    /// Consume the buffer as text (lossy UTF-8).
    pub fn into_text(self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }
}

/// Read from `io` until the output ends with `prompt`.
///
/// Returns everything before the prompt's line. A failed or closed read is
/// returned immediately as a transport error naming `step`; nothing read so
/// far is returned.
pub async fn read_until_prompt<I: SessionIo>(
    io: &mut I,
    prompt: &str,
    step: &str,
) -> Result<String> {
    let mut transcript = TranscriptBuffer::new(prompt);
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let n = read_some(io, &mut chunk, step).await?;
        transcript.extend(&chunk[..n]);
        if transcript.ends_with_prompt() {
            break;
        }
    }

    let text = transcript.into_text();
    let (_, without_prompt) = last_line(&text);
    Ok(without_prompt.to_string())
}

/// Split off the first line.
///
/// Returns the line with one trailing `\r` removed, and the text after its
/// newline (empty when there is none).
pub fn first_line(text: &str) -> (&str, &str) {
    match memchr(b'\n', text.as_bytes()) {
        Some(pos) => (trim_cr(&text[..pos]), &text[pos + 1..]),
        None => (trim_cr(text), ""),
    }
}

/// Split off the last line.
///
/// Returns the line with one trailing `\r` removed, and the text before its
/// newline (empty when there is none).
pub fn last_line(text: &str) -> (&str, &str) {
    match memrchr(b'\n', text.as_bytes()) {
        Some(pos) => (trim_cr(&text[pos + 1..]), &text[..pos]),
        None => (trim_cr(text), ""),
    }
}

fn trim_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}
