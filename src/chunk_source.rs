use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::codec::{MAX_RECORD_LEN, RECORD_DELIMITER};
use crate::error::CountError;
use crate::shared_types::{ByteCount, Fill};

/// Fixed-capacity byte buffer whose valid prefix ends on a record boundary.
#[derive(Debug)]
pub(crate) struct Chunk {
    buf: BytesMut,
    len: usize,
}

impl Chunk {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::zeroed(capacity),
            len: 0,
        }
    }

    /// The whole records currently held.
    pub(crate) fn records(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Splits a byte stream into chunks that never cut a record in half.
///
/// The partial record at the end of each read is held back and becomes the
/// prefix of the next chunk, whichever buffer that chunk lands in.
pub(crate) struct ChunkSource<R> {
    reader: R,
    carry: [u8; MAX_RECORD_LEN],
    carry_len: usize,
    exhausted: bool,
    bytes_read: ByteCount,
}

impl<R: AsyncRead + Unpin> ChunkSource<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            carry: [0; MAX_RECORD_LEN],
            carry_len: 0,
            exhausted: false,
            bytes_read: 0,
        }
    }

    pub(crate) fn bytes_read(&self) -> ByteCount {
        self.bytes_read
    }

    pub(crate) async fn next_chunk(&mut self, chunk: &mut Chunk) -> Result<Fill, CountError> {
        let buf = &mut chunk.buf[..];
        buf[..self.carry_len].copy_from_slice(&self.carry[..self.carry_len]);
        let mut filled = self.carry_len;
        self.carry_len = 0;

        while filled < buf.len() && !self.exhausted {
            match self.reader.read(&mut buf[filled..]).await {
                Ok(0) => self.exhausted = true,
                Ok(n) => {
                    filled += n;
                    self.bytes_read += n as ByteCount;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(CountError::SourceRead(e)),
            }
        }

        let len = buf[..filled]
            .iter()
            .rposition(|&b| b == RECORD_DELIMITER)
            .map_or(0, |pos| pos + 1);
        let tail = filled - len;
        if tail >= MAX_RECORD_LEN {
            return Err(CountError::CapacityExceeded {
                len: tail + 1,
                max: MAX_RECORD_LEN,
            });
        }
        chunk.len = len;

        if self.exhausted {
            if tail > 0 {
                warn!("dropping {tail} trailing bytes with no record delimiter");
            }
            return Ok(Fill { len, more: false });
        }

        self.carry[..tail].copy_from_slice(&buf[len..filled]);
        self.carry_len = tail;
        Ok(Fill { len, more: true })
    }
}
