//! Interactive command protocol over the appliance's `lunash` shell.
//!
//! The shell runs in a PTY; every reply is the echoed command, the output,
//! a status line and finally the prompt.

mod record;
mod runner;
pub mod transcript;

pub use record::{CommandRecord, RunOutcome};
pub use runner::{LOGIN_COMMAND, PROMPT, SUCCESS_STATUS, Shell};
pub use transcript::{read_until_prompt, TranscriptBuffer};
