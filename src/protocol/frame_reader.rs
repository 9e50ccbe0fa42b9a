//! Frame synchronization on a raw byte stream
//!
//! The reader waits for the sync marker one byte at a time. After a marker it
//! asks for exactly three payload bytes; a short read throws the partial data
//! away and the hunt for the next marker starts over. Nothing is buffered
//! between attempts.

use crate::protocol::{decode, Frame, PAYLOAD_LEN, SYNC_MARKER};
use crate::transport::{ByteSource, TransportError};
use tracing::{debug, trace};

/// Why a synchronization attempt produced no frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The byte at the read position was not the sync marker
    NotSyncByte(u8),
    /// The marker was followed by fewer than three payload bytes
    ShortPayload(usize),
}

/// Outcome of a single synchronization attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncAttempt {
    Frame(Frame),
    Skipped(SkipReason),
    /// The transport timed out without delivering a byte
    Idle,
    /// The source is closed, no more frames will follow
    Closed,
}

/// Counters collected while reading
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub frames: u64,
    pub skipped_bytes: u64,
    pub short_frames: u64,
    pub idle_reads: u64,
}

/// Cuts validated frames out of a [`ByteSource`]
pub struct FrameReader<S: ByteSource> {
    source: S,
    stats: ReaderStats,
    finished: bool,
}

impl<S: ByteSource> FrameReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            stats: ReaderStats::default(),
            finished: false,
        }
    }

    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    /// True once the source was closed or failed
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Performs one synchronization attempt.
    ///
    /// Blocks at most for two transport timeouts: one for the sync byte and
    /// one for the payload.
    pub fn poll_frame(&mut self) -> Result<SyncAttempt, TransportError> {
        if self.finished {
            return Ok(SyncAttempt::Closed);
        }

        let sync = match self.read_or_finish(1)? {
            Some(bytes) => bytes,
            None => return Ok(SyncAttempt::Closed),
        };

        let Some(&byte) = sync.first() else {
            self.stats.idle_reads += 1;
            return Ok(SyncAttempt::Idle);
        };

        if byte != SYNC_MARKER {
            trace!("Discarding byte {:#04x} while waiting for sync", byte);
            self.stats.skipped_bytes += 1;
            return Ok(SyncAttempt::Skipped(SkipReason::NotSyncByte(byte)));
        }

        let payload = match self.read_or_finish(PAYLOAD_LEN)? {
            Some(bytes) => bytes,
            None => {
                self.stats.short_frames += 1;
                return Ok(SyncAttempt::Closed);
            }
        };

        match <[u8; PAYLOAD_LEN]>::try_from(payload.as_slice()) {
            Ok(payload) => {
                let frame = decode(payload);
                self.stats.frames += 1;
                debug!("Received frame: {}", frame);
                Ok(SyncAttempt::Frame(frame))
            }
            Err(_) => {
                trace!(
                    "Dropping partial frame ({} of {} payload bytes)",
                    payload.len(),
                    PAYLOAD_LEN
                );
                self.stats.short_frames += 1;
                Ok(SyncAttempt::Skipped(SkipReason::ShortPayload(payload.len())))
            }
        }
    }

    fn read_or_finish(&mut self, len: usize) -> Result<Option<Vec<u8>>, TransportError> {
        match self.source.read(len) {
            Ok(Some(bytes)) => Ok(Some(bytes)),
            Ok(None) => {
                self.finished = true;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }
}

impl<S: ByteSource> Iterator for FrameReader<S> {
    type Item = Result<Frame, TransportError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.poll_frame() {
                Ok(SyncAttempt::Frame(frame)) => return Some(Ok(frame)),
                Ok(SyncAttempt::Closed) => return None,
                Ok(SyncAttempt::Skipped(_)) | Ok(SyncAttempt::Idle) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<S: ByteSource> std::iter::FusedIterator for FrameReader<S> {}
