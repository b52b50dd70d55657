//! Failure reporting hook
//!
//! Channels never decide how a failure is surfaced, only that it is.
//! Every transport error ends in exactly one `Reporter::report` call.

use super::entry::FailureReport;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::error;

/// Sink for transport failures
///
/// Implementations must not panic and must not block indefinitely.
pub trait Reporter: Send + Sync {
    fn report(&self, component: &str, message: &str);
}

/// Emits a structured `error!` event through the installed tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, component: &str, message: &str) {
        error!(component, "EXCEPTION in {}, {}", component, message);
    }
}

/// Writes one human-readable line per failure to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, component: &str, message: &str) {
        eprintln!("{}", FailureReport::new(component, message));
    }
}

/// Keeps every failure in memory
///
/// Useful for callers that poll for failures instead of reading logs.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    entries: Mutex<Vec<FailureReport>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded failures, oldest first
    pub fn entries(&self) -> Vec<FailureReport> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Remove and return all recorded failures
    pub fn drain(&self) -> Vec<FailureReport> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, component: &str, message: &str) {
        self.entries.lock().push(FailureReport::new(component, message));
    }
}

/// Structured sink when a tracing subscriber is installed, console otherwise
pub fn default_reporter() -> Arc<dyn Reporter> {
    if tracing::dispatcher::has_been_set() {
        Arc::new(TracingReporter)
    } else {
        Arc::new(ConsoleReporter)
    }
}
