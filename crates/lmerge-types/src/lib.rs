//! Foundation types for lmerge, a streaming k-way merge of sorted line sources.
//!
//! Every other lmerge crate depends on `lmerge-types`.
//!
//! # Key Types
//!
//! - [`LineReader`] — Pull interface: next line, end-of-stream, or error
//! - [`BoxedReader`] — Type-erased reader used as a merge tree node
//! - [`MergeError`] — Transport, construction, and close failures
//! - [`CloseErrors`] — Aggregate of failures collected while releasing readers
//! - [`TraceSink`] — Injected, write-only diagnostics destination

pub mod error;
pub mod reader;
pub mod trace;

pub use error::{CloseErrors, MergeError, Result};
pub use reader::{BoxedReader, LineReader, LineReaderExt, Lines};
pub use trace::{MemorySink, SharedTraceSink, TraceSink, TracingSink};
