use std::io;
use std::thread::{self, JoinHandle};

use flume::{Receiver, Sender};
use tracing::{debug, warn};

use lmerge_types::{trace_to, CloseErrors, LineReader, MergeError, Result, SharedTraceSink};

use crate::config::ReaderConfig;
use crate::source::ByteSource;

/// What the worker hands to the consumer: a line, end-of-stream, or an error.
type Published = Result<Option<String>>;

/// Reads lines from a [`ByteSource`] on a dedicated worker thread.
///
/// The worker splits raw chunks into lines and passes them through a
/// rendezvous channel, so it is never more than one line ahead of the
/// consumer. Trailing `\r` and `\n` are stripped from each line; a final
/// line without a terminator is still delivered.
///
/// Call [`close`](LineReader::close) to release the source and join the
/// worker. Dropping the reader without closing detaches the worker, which
/// releases the source the next time it tries to publish.
pub struct AsyncLineReader {
    receiver: Option<Receiver<Published>>,
    worker: Option<JoinHandle<io::Result<()>>>,
    name: String,
}

impl AsyncLineReader {
    /// Start a reader with the default [`ReaderConfig`].
    ///
    /// Fails with [`MergeError::MissingSource`] when `source` is `None`;
    /// no worker is started in that case.
    pub fn spawn<S: ByteSource>(source: Option<S>, trace: Option<SharedTraceSink>) -> Result<Self> {
        Self::with_config(source, trace, ReaderConfig::default())
    }

    pub fn with_config<S: ByteSource>(
        source: Option<S>,
        trace: Option<SharedTraceSink>,
        config: ReaderConfig,
    ) -> Result<Self> {
        let source = source.ok_or(MergeError::MissingSource)?;
        config.validate()?;

        let (sender, receiver) = flume::bounded(0);
        let worker = Worker {
            source,
            sender,
            trace,
            chunk_size: config.chunk_size,
            pending: Vec::new(),
            scanned: 0,
            line_no: 0,
        };

        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || worker.run())
            .map_err(|e| MergeError::Spawn(e.into()))?;

        debug!(worker = %config.thread_name, chunk_size = config.chunk_size, "line reader started");

        Ok(Self {
            receiver: Some(receiver),
            worker: Some(handle),
            name: config.thread_name,
        })
    }

    /// Returns `true` once [`close`](LineReader::close) has run.
    pub fn is_closed(&self) -> bool {
        self.receiver.is_none() && self.worker.is_none()
    }
}

impl LineReader for AsyncLineReader {
    fn read_line(&mut self) -> Result<Option<String>> {
        match &self.receiver {
            Some(receiver) => match receiver.recv() {
                Ok(published) => published,
                // Worker finished and hung up: nothing more will arrive.
                Err(_) => Ok(None),
            },
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<()> {
        // Hanging up first unblocks a worker parked on publish.
        self.receiver.take();

        let Some(handle) = self.worker.take() else {
            return Ok(());
        };

        let mut errors = CloseErrors::new();
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => errors.push(MergeError::transport(e)),
            Err(_) => errors.push(MergeError::WorkerPanicked),
        }

        let result = errors.into_result();
        match &result {
            Ok(()) => debug!(worker = %self.name, "line reader closed"),
            Err(e) => warn!(worker = %self.name, error = %e, "line reader closed with errors"),
        }
        result
    }
}

impl Drop for AsyncLineReader {
    fn drop(&mut self) {
        if self.worker.is_some() {
            debug!(worker = %self.name, "line reader dropped without close; detaching worker");
        }
    }
}

impl std::fmt::Debug for AsyncLineReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncLineReader")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Background half of an [`AsyncLineReader`]. Owns the source exclusively.
struct Worker<S> {
    source: S,
    sender: Sender<Published>,
    trace: Option<SharedTraceSink>,
    chunk_size: usize,
    /// Bytes read but not yet published as a complete line.
    pending: Vec<u8>,
    /// Prefix of `pending` already known to hold no `\n`.
    scanned: usize,
    line_no: u64,
}

impl<S: ByteSource> Worker<S> {
    /// Pump lines until the source ends, fails, or the consumer hangs up,
    /// then release the source. The close result is what `join` sees.
    fn run(mut self) -> io::Result<()> {
        self.pump();
        let closed = self.source.close();
        if let Err(e) = &closed {
            trace_to!(self.trace, "closing source failed: {e}");
        }
        debug!(lines = self.line_no, "line reader worker exiting");
        closed
    }

    fn pump(&mut self) {
        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            let n = match self.source.read_chunk(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    trace_to!(self.trace, "read failed after {} lines: {e}", self.line_no);
                    self.publish(Err(MergeError::transport(e)));
                    return;
                }
            };
            if n == 0 {
                break;
            }
            trace_to!(self.trace, "read chunk of {n} bytes");
            self.pending.extend_from_slice(&chunk[..n]);
            if !self.publish_complete_lines() {
                return;
            }
        }

        // An unterminated fragment is still a line, surfaced exactly once.
        if !self.pending.is_empty() {
            self.line_no += 1;
            let tail = decode_line(&self.pending, self.line_no);
            self.pending.clear();
            self.scanned = 0;
            match tail {
                Ok(line) if line.is_empty() => {}
                Ok(line) => {
                    if !self.publish(Ok(Some(line))) {
                        return;
                    }
                }
                Err(e) => {
                    self.publish(Err(e));
                    return;
                }
            }
        }
        self.publish(Ok(None));
    }

    /// Publish every complete line in `pending`, keeping the unterminated
    /// remainder. Bytes are searched for `\n` only once, however many chunks
    /// a long line spans. Returns `false` when the worker should stop.
    fn publish_complete_lines(&mut self) -> bool {
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.pending[from..].iter().position(|&b| b == b'\n') {
            let end = from + offset + 1;
            self.line_no += 1;
            let line = decode_line(&self.pending[start..end], self.line_no);
            start = end;
            from = end;
            let failed = line.is_err();
            if !self.publish(line.map(Some)) || failed {
                return false;
            }
        }
        self.pending.drain(..start);
        self.scanned = self.pending.len();
        true
    }

    /// Blocks until the consumer takes the value. Returns `false` once the
    /// consumer has hung up.
    fn publish(&self, value: Published) -> bool {
        trace_to!(self.trace, "publish {value:?}");
        self.sender.send(value).is_ok()
    }
}

/// Strip trailing line terminators and decode as UTF-8.
fn decode_line(raw: &[u8], line: u64) -> Result<String> {
    let end = raw
        .iter()
        .rposition(|&b| b != b'\n' && b != b'\r')
        .map_or(0, |p| p + 1);
    String::from_utf8(raw[..end].to_vec()).map_err(|_| MergeError::InvalidUtf8 { line })
}
