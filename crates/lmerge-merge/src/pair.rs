use lmerge_types::{trace_to, CloseErrors, LineReader, Result, SharedTraceSink};

use crate::order::LessThan;

/// Lazily interleaves two sorted readers into one sorted reader.
///
/// Each side holds exactly one pending result, read ahead from its
/// upstream. A side is only advanced right after its pending line has been
/// emitted, so a merge step does constant work and keeps one line of
/// lookahead per side.
///
/// When neither pending line is less than the other, the left one is
/// emitted first. Merging is therefore stable: equal lines keep
/// left-before-right order.
pub struct MergePair<L, R> {
    left: L,
    right: R,
    left_pending: Result<Option<String>>,
    right_pending: Result<Option<String>>,
    less: LessThan,
    trace: Option<SharedTraceSink>,
}

impl<L: LineReader, R: LineReader> MergePair<L, R> {
    /// Take ownership of both sides and pre-fetch their first lines.
    ///
    /// Blocks until both upstreams have produced something.
    pub fn new(mut left: L, mut right: R, less: LessThan) -> Self {
        let left_pending = left.read_line();
        let right_pending = right.read_line();
        Self {
            left,
            right,
            left_pending,
            right_pending,
            less,
            trace: None,
        }
    }

    /// Record merge decisions on `trace`.
    pub fn with_trace(mut self, trace: SharedTraceSink) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Returns `true` once both sides have reached end-of-stream.
    pub fn is_exhausted(&self) -> bool {
        matches!((&self.left_pending, &self.right_pending), (Ok(None), Ok(None)))
    }
}

impl<L: LineReader, R: LineReader> LineReader for MergePair<L, R> {
    fn read_line(&mut self) -> Result<Option<String>> {
        trace_to!(
            self.trace,
            "merge state: left={:?} right={:?}",
            self.left_pending,
            self.right_pending
        );

        // An errored side is never advanced, so the error repeats until the
        // consumer gives up on this merge.
        let (left, right) = match (&self.left_pending, &self.right_pending) {
            (Err(e), _) | (_, Err(e)) => return Err(e.clone()),
            (Ok(left), Ok(right)) => (left, right),
        };

        let take_left = match (left, right) {
            (None, None) => return Ok(None),
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some(l), Some(r)) => !(self.less)(r.as_str(), l.as_str()),
        };

        let emitted = if take_left {
            let next = self.left.read_line();
            std::mem::replace(&mut self.left_pending, next)
        } else {
            let next = self.right.read_line();
            std::mem::replace(&mut self.right_pending, next)
        };

        trace_to!(
            self.trace,
            "merge emit from {}: {:?}",
            if take_left { "left" } else { "right" },
            emitted
        );
        emitted
    }

    fn close(&mut self) -> Result<()> {
        let mut errors = CloseErrors::new();
        errors.record(self.left.close());
        errors.record(self.right.close());
        errors.into_result()
    }
}
