//! SSH transport layer wrapping russh.
//!
//! Connection setup, host key pinning and password authentication, plus
//! the russh-backed [`SessionFactory`](crate::session::SessionFactory).

pub mod config;
mod ssh;

pub use config::SshConfig;
pub use ssh::{SshSession, SshTransport};
