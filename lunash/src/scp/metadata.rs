//! The `C<mode> <length> <path>` line that precedes a file payload.

use crate::error::ScpError;

/// Permission mode sent with every uploaded file.
pub const PUT_MODE: &str = "C0644";

/// Parsed file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Mode token as sent, e.g. `C0644`.
    pub mode: String,

    /// Payload length in bytes.
    pub length: u64,

    /// Remote file name.
    pub path: String,
}

impl FileMetadata {
    /// Parse a header line.
    ///
    /// The line is split at the first two spaces only, so the path may
    /// contain spaces. One trailing newline is dropped from the path.
    ///
    /// ```
    /// use lunash::scp::FileMetadata;
    ///
    /// let meta = FileMetadata::parse("C0644 1192 server.pem\n").unwrap();
    /// assert_eq!(meta.length, 1192);
    /// assert_eq!(meta.path, "server.pem");
    /// ```
    pub fn parse(line: &str) -> Result<Self, ScpError> {
        let mut parts = line.splitn(3, ' ');
        let (Some(mode), Some(length), Some(path)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ScpError::BadMetadata {
                metadata: line.to_string(),
            });
        };

        let length = length.parse::<u64>().map_err(|source| ScpError::BadLength {
            field: length.to_string(),
            source,
        })?;

        let path = path.strip_suffix('\n').unwrap_or(path);
        let path = path.strip_suffix('\r').unwrap_or(path);

        Ok(Self {
            mode: mode.to_string(),
            length,
            path: path.to_string(),
        })
    }

    /// Header line for uploading `length` bytes to `path`.
    pub fn put_header(length: usize, path: &str) -> String {
        format!("{PUT_MODE} {length} {path}\n")
    }
}

/// Error text when `reply` starts with an SCP warning (1) or error (2) byte.
pub fn remote_error(reply: &[u8]) -> Option<ScpError> {
    match reply.first() {
        Some(1) | Some(2) => Some(ScpError::Remote {
            message: String::from_utf8_lossy(&reply[1..]).trim_end().to_string(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_spaces_in_path() {
        let meta = FileMetadata::parse("C0600 42 my cert.pem\n").unwrap();
        assert_eq!(
            meta,
            FileMetadata {
                mode: "C0600".into(),
                length: 42,
                path: "my cert.pem".into(),
            }
        );
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        for line in ["C0644", "C0644 12", ""] {
            assert!(
                matches!(FileMetadata::parse(line), Err(ScpError::BadMetadata { .. })),
                "{line:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_bad_length() {
        for line in ["C0644 twelve file\n", "C0644 -1 file\n", "C0644  file\n"] {
            assert!(
                matches!(FileMetadata::parse(line), Err(ScpError::BadLength { .. })),
                "{line:?}"
            );
        }
    }

    #[test]
    fn test_put_header() {
        assert_eq!(
            FileMetadata::put_header(1192, "server.pem"),
            "C0644 1192 server.pem\n"
        );
        assert_eq!(FileMetadata::put_header(0, "empty"), "C0644 0 empty\n");
    }

    #[test]
    fn test_remote_error() {
        let err = remote_error(b"\x01scp: nope: No such file or directory\n").unwrap();
        assert!(matches!(err, ScpError::Remote { ref message } if message == "scp: nope: No such file or directory"));
        assert!(remote_error(b"\x00").is_none());
        assert!(remote_error(b"").is_none());
    }
}
