//! Failure entry type

use std::fmt;

/// One reported transport failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub timestamp: String, // HH:MM:SS.mmm
    /// Component that failed (e.g. `SerialChannel`)
    pub component: String,
    /// `<Operation>: <error>, <context>`
    pub message: String,
}

impl FailureReport {
    /// Current timestamp as HH:MM:SS.mmm
    #[inline]
    fn now() -> String {
        chrono::Local::now().format("%H:%M:%S%.3f").to_string()
    }

    pub fn new(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Self::now(),
            component: component.into(),
            message: message.into(),
        }
    }

    /// Operation prefix of the message (`Connect`, `Send`, `Receive`, `Clear`)
    pub fn operation(&self) -> &str {
        self.message
            .split_once(':')
            .map(|(op, _)| op)
            .unwrap_or(&self.message)
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EXCEPTION in {}", self.component)?;
        if !self.message.is_empty() {
            write!(f, ", {}", self.message)?;
        }
        Ok(())
    }
}
