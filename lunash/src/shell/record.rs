//! Per-command results of a shell batch.

use std::time::Duration;

use crate::error::{Error, Result};

/// Result of one command in a batch.
#[derive(Debug, Clone)]
pub struct CommandRecord {
    /// The command as given (before newline normalization).
    pub command: String,

    /// Output between the echoed command and the status line.
    pub output: String,

    /// The trailing status line reported by the appliance.
    pub status: String,

    /// Whether `status` matched the success sentinel.
    pub success: bool,

    /// Time from sending the command to seeing the prompt.
    pub elapsed: Duration,
}

impl CommandRecord {
    /// Check if the command reported success.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get the output lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.output.lines()
    }

    /// Check if the output contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.output.contains(pattern)
    }
}

impl std::fmt::Display for CommandRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.output)
    }
}

/// Everything a batch produced, plus the error that ended or marred it.
///
/// `records` is complete and in input order unless a transport error cut
/// the batch short; with a command failure, every command still has a
/// record.
#[derive(Debug)]
pub struct RunOutcome {
    /// One record per command that completed.
    pub records: Vec<CommandRecord>,

    /// Transport, session, command or release error, if any.
    pub error: Option<Error>,
}

impl RunOutcome {
    /// Outputs in command order.
    pub fn outputs(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.output.as_str()).collect()
    }

    /// No error at all.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Drop the partial records if anything went wrong.
    pub fn into_result(self) -> Result<Vec<CommandRecord>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.records),
        }
    }
}
