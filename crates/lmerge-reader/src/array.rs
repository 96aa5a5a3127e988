use std::collections::VecDeque;

use lmerge_types::{LineReader, Result};

/// Reads lines from a sequence captured at construction.
#[derive(Clone, Debug, Default)]
pub struct ArrayReader {
    lines: VecDeque<String>,
}

impl ArrayReader {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of lines not yet read.
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl From<Vec<String>> for ArrayReader {
    fn from(lines: Vec<String>) -> Self {
        Self {
            lines: lines.into(),
        }
    }
}

impl LineReader for ArrayReader {
    fn read_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }

    fn close(&mut self) -> Result<()> {
        self.lines.clear();
        Ok(())
    }
}

/// A reader that is permanently at end-of-stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct EofReader;

impl LineReader for EofReader {
    fn read_line(&mut self) -> Result<Option<String>> {
        Ok(None)
    }
}
