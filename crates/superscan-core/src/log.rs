//! Logging capability threaded through every core operation.
//!
//! The core never reaches for a global logger. Callers pass a `&dyn Logger`;
//! the CLI uses [`TracingLogger`] and tests use [`NullLogger`].

/// Minimal logging interface consumed by builders, the mirror engine and the sampler.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards messages to the `tracing` macros under the `superscan` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "superscan", "{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "superscan", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "superscan", "{message}");
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}
