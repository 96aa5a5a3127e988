//! Leaf readers for lmerge.
//!
//! Leaves are the inputs of a merge tree: each one yields an already sorted
//! sequence of lines.
//!
//! # Architecture
//!
//! - **ArrayReader**: lines held in memory, for fixed or test inputs
//! - **EofReader**: permanently at end-of-stream
//! - **ByteSource**: chunked raw input with an explicit close
//! - **AsyncLineReader**: a worker thread that turns a byte source into lines,
//!   handing them over through a rendezvous channel for backpressure

pub mod array;
pub mod async_reader;
pub mod config;
pub mod source;

pub use array::{ArrayReader, EofReader};
pub use async_reader::AsyncLineReader;
pub use config::ReaderConfig;
pub use source::{ByteSource, IoSource};
