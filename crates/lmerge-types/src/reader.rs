use crate::error::{MergeError, Result};

/// Pull interface shared by every line source and merger.
///
/// `read_line` returns:
/// - `Ok(Some(line))` for the next line, without its terminator
/// - `Ok(None)` at end-of-stream; every later call returns `Ok(None)` again
/// - `Err(e)` when the source failed
///
/// Readers are single-consumer and sequential. Calling `read_line` from
/// several threads at once is prevented by the `&mut self` receiver.
pub trait LineReader: Send {
    fn read_line(&mut self) -> Result<Option<String>>;

    /// Release whatever the reader holds (files, worker threads, upstream
    /// readers). Readers without resources keep the default no-op.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A type-erased reader, the unit merge trees are built from.
pub type BoxedReader = Box<dyn LineReader>;

impl<R: LineReader + ?Sized> LineReader for Box<R> {
    fn read_line(&mut self) -> Result<Option<String>> {
        (**self).read_line()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<R: LineReader + ?Sized> LineReader for &mut R {
    fn read_line(&mut self) -> Result<Option<String>> {
        (**self).read_line()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Adapters available on every [`LineReader`].
pub trait LineReaderExt: LineReader + Sized {
    /// Iterate over the remaining lines.
    ///
    /// The iterator stops at end-of-stream, or right after yielding the
    /// first error.
    fn lines(self) -> Lines<Self> {
        Lines {
            reader: self,
            done: false,
        }
    }

    /// Erase the concrete reader type.
    fn boxed(self) -> BoxedReader
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<R: LineReader> LineReaderExt for R {}

/// Iterator returned by [`LineReaderExt::lines`].
pub struct Lines<R> {
    reader: R,
    done: bool,
}

impl<R: LineReader> Lines<R> {
    /// Give the reader back, e.g. to close it.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: LineReader> Iterator for Lines<R> {
    type Item = std::result::Result<String, MergeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<R: LineReader> std::iter::FusedIterator for Lines<R> {}
