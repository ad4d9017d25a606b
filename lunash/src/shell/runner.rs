//! Command batches in an interactive `lunash` shell.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use secrecy::{ExposeSecret, SecretString};

use super::record::{CommandRecord, RunOutcome};
use super::transcript::{first_line, last_line, read_until_prompt};
use crate::error::{Result, ShellError};
use crate::session::{PtyConfig, Session, SessionFactory, SessionIo, with_session, write_step};
use crate::steplog::{Quiet, StepLog, step};

/// Prompt the appliance shell prints when ready for input.
pub const PROMPT: &str = "lunash:>";

/// Status line of a successful command.
pub const SUCCESS_STATUS: &str = "Command Result : 0 (Success)";

/// Command that unlocks the HSM partition for the rest of the session.
pub const LOGIN_COMMAND: &str = "hsm login -p";

/// Runs command batches in a PTY-backed shell session.
///
/// Each [`run`](Self::run) opens its own session, waits for the banner,
/// optionally logs in, then sends the commands one at a time. Replies are
/// split into echo, output and status line; a status other than
/// [`SUCCESS_STATUS`] marks the command failed without stopping the batch.
pub struct Shell {
    prompt: String,
    success_status: String,
    pty: PtyConfig,
    password: Option<SecretString>,
    log: Arc<dyn StepLog>,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    /// Create a shell runner with the appliance defaults and quiet step logging.
    pub fn new() -> Self {
        Self {
            prompt: PROMPT.to_string(),
            success_status: SUCCESS_STATUS.to_string(),
            pty: PtyConfig::default(),
            password: None,
            log: Arc::new(Quiet),
        }
    }

    /// Set the credential used by the login step.
    pub fn with_password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    /// Set the PTY request parameters.
    pub fn with_pty(mut self, pty: PtyConfig) -> Self {
        self.pty = pty;
        self
    }

    /// Set the step log.
    pub fn with_log(mut self, log: Arc<dyn StepLog>) -> Self {
        self.log = log;
        self
    }

    /// Set the prompt that ends each reply.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the status line that marks success.
    pub fn with_success_status(mut self, status: impl Into<String>) -> Self {
        self.success_status = status.into();
        self
    }

    /// Run `commands` in a fresh shell session, logging in first if `login`.
    ///
    /// The session is always closed. The outcome holds every record
    /// completed before any transport error, plus the highest-priority
    /// error seen.
    pub async fn run<F, S>(&self, factory: &F, commands: &[S], login: bool) -> RunOutcome
    where
        F: SessionFactory,
        S: AsRef<str>,
    {
        let mut records = Vec::with_capacity(commands.len());

        let credential = match (login, &self.password) {
            (false, _) => None,
            (true, Some(password)) => Some(password),
            (true, None) => {
                return RunOutcome {
                    records,
                    error: Some(ShellError::MissingCredential.into()),
                };
            }
        };

        let result = with_session(factory, async |session| {
            self.start(session).await?;
            self.run_batch(session, commands, credential, &mut records)
                .await
        })
        .await;

        RunOutcome {
            records,
            error: result.err(),
        }
    }

    /// Request the PTY and start the login shell.
    async fn start<T: Session>(&self, session: &mut T) -> Result<()> {
        step!(
            self.log,
            "Requesting PTY {} {}x{}",
            self.pty.term,
            self.pty.rows,
            self.pty.cols
        );
        session.request_pty(&self.pty).await?;
        step!(self.log, "Starting login shell");
        session.request_shell().await
    }

    /// Drive an already started shell.
    ///
    /// Appends one record per command to `records` as it completes, so a
    /// caller keeps everything done before a transport error.
    pub async fn run_batch<I, S>(
        &self,
        io: &mut I,
        commands: &[S],
        credential: Option<&SecretString>,
        records: &mut Vec<CommandRecord>,
    ) -> Result<()>
    where
        I: SessionIo,
        S: AsRef<str>,
    {
        step!(self.log, "Reading shell banner");
        read_until_prompt(io, &self.prompt, "Error reading shell banner").await?;

        if let Some(password) = credential {
            self.login(io, password).await?;
        }

        let mut failed = Vec::new();

        for command in commands {
            let command = command.as_ref();
            let record = self.send_command(io, command).await?;
            if !record.success {
                warn!(
                    "command {:?} returned status {:?}",
                    command.trim_end(),
                    record.status
                );
                failed.push(command.to_string());
            }
            records.push(record);
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(ShellError::CommandsFailed { commands: failed }.into())
        }
    }

    /// Send the login command. Its reply is read but not checked.
    async fn login<I: SessionIo>(&self, io: &mut I, password: &SecretString) -> Result<()> {
        step!(self.log, "Writing '{} ********'", LOGIN_COMMAND);
        let line = format!("{} {}\n", LOGIN_COMMAND, password.expose_secret());
        write_step(io, line.as_bytes(), "Error running 'hsm login'").await?;

        read_until_prompt(
            io,
            &self.prompt,
            "Error reading command output for 'hsm login'",
        )
        .await?;
        debug!("hsm login reply received");
        Ok(())
    }

    /// Send one command and split its reply.
    async fn send_command<I: SessionIo>(
        &self,
        io: &mut I,
        command: &str,
    ) -> Result<CommandRecord> {
        let line = normalize(command);
        let start = Instant::now();

        step!(self.log, "Writing command {:?}", line);
        write_step(
            io,
            line.as_bytes(),
            &format!("Error sending command '{}'", command.trim_end()),
        )
        .await?;

        let transcript = read_until_prompt(
            io,
            &self.prompt,
            &format!("Error reading command output for '{}'", command.trim_end()),
        )
        .await?;
        step!(self.log, "Got transcript {:?}", transcript);

        // the first line is the appliance echoing the command back
        let (_, reply) = first_line(&transcript);
        let (status, output) = last_line(reply);
        let success = status == self.success_status;

        Ok(CommandRecord {
            command: command.to_string(),
            output: output.to_string(),
            status: status.to_string(),
            success,
            elapsed: start.elapsed(),
        })
    }
}

/// Terminate `command` with exactly one newline of its own.
fn normalize(command: &str) -> std::borrow::Cow<'_, str> {
    if command.ends_with('\n') {
        command.into()
    } else {
        format!("{command}\n").into()
    }
}
