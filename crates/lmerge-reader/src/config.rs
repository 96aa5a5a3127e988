use serde::{Deserialize, Serialize};

use lmerge_types::{MergeError, Result};

/// Configuration for an [`AsyncLineReader`](crate::AsyncLineReader).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Size of each raw read from the byte source, in bytes.
    pub chunk_size: usize,
    /// Name given to the background worker thread.
    pub thread_name: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
            thread_name: "lmerge-reader".into(),
        }
    }
}

impl ReaderConfig {
    /// Override the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Reject settings the worker cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(MergeError::Config("chunk_size must be greater than zero".into()));
        }
        Ok(())
    }
}
