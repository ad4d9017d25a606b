//! Per-step protocol logging.
//!
//! Protocol components take a [`StepLog`] at construction and report every
//! step through it. Use [`Verbose`] to surface the steps via `log::debug!`
//! or [`Quiet`] to drop them.

use std::fmt;
use std::sync::Arc;

/// Log target used by [`Verbose`].
pub const PROTOCOL_TARGET: &str = "lunash::protocol";

/// Sink for protocol step messages.
pub trait StepLog: Send + Sync {
    /// Record one protocol step.
    fn step(&self, args: fmt::Arguments<'_>);
}

/// Forwards every step to the `log` facade at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbose;

impl StepLog for Verbose {
    fn step(&self, args: fmt::Arguments<'_>) {
        log::debug!(target: PROTOCOL_TARGET, "{}", args);
    }
}

/// Discards every step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quiet;

impl StepLog for Quiet {
    fn step(&self, _args: fmt::Arguments<'_>) {}
}

/// Pick a step log from a verbosity switch.
pub fn from_flag(verbose: bool) -> Arc<dyn StepLog> {
    if verbose {
        Arc::new(Verbose)
    } else {
        Arc::new(Quiet)
    }
}

/// `step!(log, "fmt", args...)`
macro_rules! step {
    ($log:expr, $($arg:tt)*) => {
        $log.step(format_args!($($arg)*))
    };
}
pub(crate) use step;

#[cfg(test)]
pub(crate) mod recorder {
    use std::sync::Mutex;

    use super::*;

    /// Collects steps so tests can assert on them.
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub(crate) lines: Mutex<Vec<String>>,
    }

    impl Recorder {
        pub(crate) fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl StepLog for Recorder {
        fn step(&self, args: fmt::Arguments<'_>) {
            self.lines.lock().unwrap().push(args.to_string());
        }
    }
}
