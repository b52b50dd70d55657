//! Logging and failure reporting
//!
//! - `init_tracing` - Internal tracing output for the library and CLI
//! - `Reporter` - Hook invoked by channels on every transport failure
//! - `FailureReport` - Recorded failure entries (see `MemoryReporter`)

pub mod entry;
pub mod report;

pub use entry::FailureReport;
pub use report::{default_reporter, ConsoleReporter, MemoryReporter, Reporter, TracingReporter};

/// Initialize internal tracing
///
/// Call early in main() before any logging occurs.
/// Set `verbose` to true for debug-level output.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = if verbose { "debug" } else { "warn" };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(false)
                .compact(),
        )
        .with(tracing_subscriber::EnvFilter::new(level))
        .try_init();
}
