//! Pseudo-terminal request parameters.

use russh::Pty;

/// Parameters for a session's PTY request.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Terminal type (`TERM`).
    pub term: String,

    /// Terminal height in rows.
    pub rows: u32,

    /// Terminal width in columns.
    pub cols: u32,

    /// Encoded terminal modes.
    pub modes: Vec<(Pty, u32)>,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            term: "xterm".to_string(),
            rows: 40,
            cols: 80,
            modes: vec![
                // the appliance echoes commands itself
                (Pty::ECHO, 0),
                (Pty::TTY_OP_ISPEED, 14400),
                (Pty::TTY_OP_OSPEED, 14400),
            ],
        }
    }
}

impl PtyConfig {
    /// Set terminal dimensions.
    pub fn with_size(mut self, rows: u32, cols: u32) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// Set the terminal type.
    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = term.into();
        self
    }

    /// Whether local echo is requested off.
    pub fn echo_disabled(&self) -> bool {
        self.modes
            .iter()
            .any(|(mode, v)| matches!(mode, Pty::ECHO) && *v == 0)
    }
}
