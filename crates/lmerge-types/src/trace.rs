use std::fmt;
use std::sync::{Arc, Mutex};

/// Write-only destination for per-line diagnostics.
///
/// Sinks are handed explicitly to the components that report through them.
/// Leaving one out only removes diagnostics, never changes behaviour.
pub trait TraceSink: Send + Sync {
    fn record(&self, message: fmt::Arguments<'_>);
}

/// Shared handle to a trace sink.
pub type SharedTraceSink = Arc<dyn TraceSink>;

/// Record a formatted message on an optional sink.
#[macro_export]
macro_rules! trace_to {
    ($sink:expr, $($arg:tt)+) => {
        if let Some(sink) = $sink.as_ref() {
            $crate::TraceSink::record(&**sink, format_args!($($arg)+));
        }
    };
}

/// Forwards every message to `tracing` at TRACE level.
#[derive(Clone, Debug)]
pub struct TracingSink {
    label: &'static str,
}

impl TracingSink {
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }

    pub fn shared(label: &'static str) -> SharedTraceSink {
        Arc::new(Self::new(label))
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new("lmerge")
    }
}

impl TraceSink for TracingSink {
    fn record(&self, message: fmt::Arguments<'_>) {
        tracing::trace!(component = self.label, "{message}");
    }
}

/// Keeps every message in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of the messages recorded so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TraceSink for MemorySink {
    fn record(&self, message: fmt::Arguments<'_>) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
