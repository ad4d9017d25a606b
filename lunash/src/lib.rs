//! # lunash
//!
//! Async SSH client for Luna HSM appliances.
//!
//! The appliance exposes a restricted `lunash` shell and an `scp` helper.
//! Neither has message framing of its own: shell replies end at the
//! `lunash:>` prompt, and file payloads are sized by a text header.
//!
//! ## Features
//!
//! - Async SSH connections via russh, with pinned host key fingerprints
//! - Command batches with per-command success detection
//! - Single-file SCP push and pull
//! - JSON appliance inventory
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lunash::{Client, config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), lunash::Error> {
//!     let appliance = config::load_one("./lunash.json", "hsm1")?;
//!     let client = Client::connect(&appliance).await?;
//!
//!     let outcome = client.run(&["hsm show"], true).await;
//!     for record in &outcome.records {
//!         println!("{} -> {}", record.command, record.output);
//!     }
//!
//!     let cert = client.scp_get("server.pem").await?;
//!     println!("{} bytes", cert.len());
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod scp;
pub mod session;
pub mod shell;
pub mod steplog;
pub mod transport;

// Re-export main types for convenience
pub use client::Client;
pub use config::ApplianceConfig;
pub use error::Error;
pub use scp::Scp;
pub use session::{PtyConfig, Session, SessionFactory, SessionIo, StreamIo, with_session};
pub use shell::{CommandRecord, RunOutcome, Shell};
pub use steplog::{Quiet, StepLog, Verbose};
pub use transport::{SshConfig, SshTransport};
