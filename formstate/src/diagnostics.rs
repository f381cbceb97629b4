//! Warning channel for recoverable conditions.
//!
//! Resolution never aborts on an ambiguous `oneOf` dependency or on unknown
//! names in a property order list; it reports them here and carries on. The
//! sink is passed in through [`SchemaContext`](crate::SchemaContext), so the
//! core holds no global state and tests can capture what was reported.

/// Receiver of recoverable warnings.
///
/// Any `Fn(&str)` closure is a sink:
///
/// ```rust
/// use std::sync::Mutex;
/// use formstate::Diagnostics;
///
/// let seen = Mutex::new(Vec::new());
/// let sink = |msg: &str| seen.lock().unwrap().push(msg.to_string());
/// sink.warn("something odd");
/// assert_eq!(seen.lock().unwrap().len(), 1);
/// ```
pub trait Diagnostics: Send + Sync {
    /// Report a recoverable condition.
    fn warn(&self, message: &str);
}

/// Forwards warnings to the `log` facade.
///
/// Without an installed logger this discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn warn(&self, message: &str) {
        warn!("{message}");
    }
}

/// Discards every warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn warn(&self, _message: &str) {}
}

impl<F> Diagnostics for F
where
    F: Fn(&str) + Send + Sync,
{
    fn warn(&self, message: &str) {
        self(message)
    }
}
