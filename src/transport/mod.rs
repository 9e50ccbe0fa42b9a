//! Byte sources feeding the frame reader
//!
//! A [`ByteSource`] is a blocking reader with a bounded wait: every call either
//! returns what arrived before the transport timeout (possibly nothing), reports
//! that the stream is closed, or fails with a [`TransportError`].
//!
//! - [`ReadSource`] adapts anything implementing [`std::io::Read`]
//! - [`serial::SerialSource`] opens a serial port by path

pub mod serial;

pub use serial::{SerialSettings, SerialSource};

use std::io::{ErrorKind, Read};
use tracing::{debug, trace};

/// Fatal transport failures. Timeouts are not errors and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("I/O error on byte source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// Blocking source of raw bytes with timeout-bounded reads
pub trait ByteSource {
    /// Reads up to `max_len` bytes.
    ///
    /// Returns `Ok(Some(bytes))` with `0..=max_len` bytes; fewer than requested
    /// means the transport timed out. Returns `Ok(None)` once the stream is
    /// closed and nothing more will arrive.
    fn read(&mut self, max_len: usize) -> Result<Option<Vec<u8>>, TransportError>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read(&mut self, max_len: usize) -> Result<Option<Vec<u8>>, TransportError> {
        (**self).read(max_len)
    }
}

/// Wraps a [`Read`] implementation.
///
/// Keeps reading until `max_len` bytes arrived, the reader hits end of stream,
/// or it reports `TimedOut`/`WouldBlock`. Bytes read before end of stream are
/// still handed out; the following call then reports the stream as closed.
pub struct ReadSource<R: Read> {
    inner: R,
    eof: bool,
}

impl<R: Read> ReadSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, eof: false }
    }
}

impl<R: Read> ByteSource for ReadSource<R> {
    fn read(&mut self, max_len: usize) -> Result<Option<Vec<u8>>, TransportError> {
        if self.eof {
            return Ok(None);
        }

        let mut buf = vec![0u8; max_len];
        let mut filled = 0;

        while filled < max_len {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    debug!("Byte source reached end of stream");
                    self.eof = true;
                    if filled == 0 {
                        return Ok(None);
                    }
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    trace!("Read timed out after {} of {} bytes", filled, max_len);
                    break;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::Io(e)),
            }
        }

        buf.truncate(filled);
        Ok(Some(buf))
    }
}
