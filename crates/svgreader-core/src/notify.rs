//! Diagnostics sink.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// Receives user-facing messages: density guesses, optimization statistics, and per-element
/// errors that were recovered from.
pub trait Notifier {
    fn notify(&mut self, severity: Severity, message: &str);
}

impl<F> Notifier for F
where
    F: FnMut(Severity, &str),
{
    fn notify(&mut self, severity: Severity, message: &str) {
        self(severity, message)
    }
}

/// Forwards messages to `tracing` under the `svgreader` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&mut self, severity: Severity, message: &str) {
        match severity {
            Severity::Notice => tracing::info!(target: "svgreader", "{message}"),
            Severity::Warning => tracing::warn!(target: "svgreader", "{message}"),
            Severity::Error => tracing::error!(target: "svgreader", "{message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Collects messages in order.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    pub messages: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.messages.iter().filter(move |d| d.severity == severity)
    }

    pub fn has_errors(&self) -> bool {
        self.with_severity(Severity::Error).next().is_some()
    }
}

impl Notifier for Diagnostics {
    fn notify(&mut self, severity: Severity, message: &str) {
        self.messages.push(Diagnostic {
            severity,
            message: message.to_string(),
        });
    }
}
