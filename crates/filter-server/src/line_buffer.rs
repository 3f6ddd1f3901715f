//! Per-connection receive buffer
//!
//! Bytes accumulate until a newline arrives; each call yields one line and
//! keeps the remainder for the next one. Buffers are never shared between
//! connections.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::LineError;

/// Longest accepted line, newline excluded
pub const MAX_LINE_LEN: usize = 8 * 1024;

const INITIAL_CAPACITY: usize = 1024;

#[derive(Debug)]
pub struct LineBuffer {
    buf: BytesMut,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Append received bytes
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes buffered but not yet returned as a line
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Take the next complete line out of the buffer
    ///
    /// A trailing `\r` is stripped and invalid UTF-8 is replaced.
    pub fn next_line(&mut self) -> Result<Option<String>, LineError> {
        let Some(pos) = self.buf.iter().position(|b| *b == b'\n') else {
            if self.buf.len() > MAX_LINE_LEN {
                return Err(LineError::TooLong { max: MAX_LINE_LEN });
            }
            return Ok(None);
        };

        let mut line = self.buf.split_to(pos + 1);
        line.truncate(pos);
        if line.last() == Some(&b'\r') {
            line.truncate(pos - 1);
        }
        if line.len() > MAX_LINE_LEN {
            return Err(LineError::TooLong { max: MAX_LINE_LEN });
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    /// Read from `reader` until a full line is buffered
    ///
    /// Returns `Ok(None)` once the peer has closed the connection; a partial
    /// trailing line is discarded.
    pub async fn read_line<R>(&mut self, reader: &mut R) -> Result<Option<String>, LineError>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            if let Some(line) = self.next_line()? {
                return Ok(Some(line));
            }
            if reader.read_buf(&mut self.buf).await? == 0 {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yields_lines_and_keeps_remainder() {
        let mut buffer = LineBuffer::new();
        buffer.extend(b"POST http://www.a.com\nGET http");

        assert_eq!(
            buffer.next_line().unwrap().as_deref(),
            Some("POST http://www.a.com")
        );
        assert_eq!(buffer.next_line().unwrap(), None);
        assert_eq!(buffer.pending(), 8);

        buffer.extend(b"://www.a.com\r\n");
        assert_eq!(
            buffer.next_line().unwrap().as_deref(),
            Some("GET http://www.a.com")
        );
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn test_empty_line() {
        let mut buffer = LineBuffer::new();
        buffer.extend(b"\n\r\n");
        assert_eq!(buffer.next_line().unwrap().as_deref(), Some(""));
        assert_eq!(buffer.next_line().unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_rejects_overlong_line() {
        let mut buffer = LineBuffer::new();
        buffer.extend(&vec![b'a'; MAX_LINE_LEN + 1]);
        assert!(matches!(
            buffer.next_line(),
            Err(LineError::TooLong { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_line_across_chunks() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let writer = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            client.write_all(b"DELETE www.").await.unwrap();
            client.write_all(b"example.com0\nGET x\n").await.unwrap();
        });

        let mut buffer = LineBuffer::new();
        assert_eq!(
            buffer.read_line(&mut server).await.unwrap().as_deref(),
            Some("DELETE www.example.com0")
        );
        assert_eq!(
            buffer.read_line(&mut server).await.unwrap().as_deref(),
            Some("GET x")
        );
        writer.await.unwrap();

        // Writer dropped: end of stream
        assert_eq!(buffer.read_line(&mut server).await.unwrap(), None);
    }
}
