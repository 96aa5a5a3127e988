use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Raw bytes behind an [`AsyncLineReader`](crate::AsyncLineReader).
///
/// Once wrapped, the source belongs to the reader's worker thread and
/// nothing else touches it.
pub trait ByteSource: Send + 'static {
    /// Fill `buf` with the next chunk. `Ok(0)` means the source is exhausted.
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Release the source. Called exactly once by the owning worker.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteSource for Box<dyn ByteSource> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_chunk(buf)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Adapts any [`Read`] implementation into a [`ByteSource`].
///
/// Closing drops the inner reader; later reads report exhaustion.
#[derive(Debug)]
pub struct IoSource<R> {
    inner: Option<R>,
}

impl<R: Read + Send + 'static> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner: Some(inner) }
    }
}

impl IoSource<File> {
    /// Open a file for reading.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read + Send + 'static> ByteSource for IoSource<R> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.as_mut() {
            Some(inner) => inner.read(buf),
            None => Ok(0),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.take();
        Ok(())
    }
}
