use std::fmt;
use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Errors produced while reading or releasing line readers.
///
/// End-of-stream is not an error: readers report it as `Ok(None)`.
/// Errors are cheap to clone so a merger can keep handing out the same
/// pending failure until its consumer stops reading.
#[derive(Debug, Clone, Error)]
pub enum MergeError {
    /// An async reader was asked to wrap a source that does not exist.
    #[error("no byte source to read from")]
    MissingSource,

    /// Reading from the underlying byte source failed.
    #[error("transport error: {0}")]
    Transport(#[source] Arc<io::Error>),

    /// A line was not valid UTF-8.
    #[error("line {line} is not valid UTF-8")]
    InvalidUtf8 { line: u64 },

    /// One or more failures while releasing resources.
    #[error("{0}")]
    Close(CloseErrors),

    /// The operating system refused to start a reader's worker thread.
    #[error("failed to spawn reader worker: {0}")]
    Spawn(#[source] Arc<io::Error>),

    /// The reader's worker thread panicked before it could report.
    #[error("reader worker panicked")]
    WorkerPanicked,

    /// A reader or merge setting was rejected before any work started.
    #[error("configuration error: {0}")]
    Config(String),
}

impl MergeError {
    /// Wrap an I/O failure as a transport error.
    pub fn transport(err: io::Error) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Returns `true` for failures that came from the byte source itself.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<io::Error> for MergeError {
    fn from(err: io::Error) -> Self {
        Self::transport(err)
    }
}

/// Failures collected while closing a reader or a whole merge tree.
#[derive(Debug, Clone, Default)]
pub struct CloseErrors {
    errors: Vec<MergeError>,
}

impl CloseErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one release step; successes are ignored.
    pub fn record(&mut self, outcome: Result<()>) {
        if let Err(err) = outcome {
            match err {
                // Flatten nested composites so trees report a single list.
                MergeError::Close(nested) => self.errors.extend(nested.errors),
                other => self.errors.push(other),
            }
        }
    }

    pub fn push(&mut self, err: MergeError) {
        self.record(Err(err));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[MergeError] {
        &self.errors
    }

    /// Collapse into a result: no failures is `Ok`, a single failure is
    /// returned unchanged, several become one [`MergeError::Close`].
    pub fn into_result(mut self) -> Result<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(MergeError::Close(self)),
        }
    }
}

impl fmt::Display for CloseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "multiple errors while closing: [")?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{err}")?;
        }
        write!(f, "]")
    }
}

/// Convenience alias used throughout the lmerge crates.
pub type Result<T> = std::result::Result<T, MergeError>;
