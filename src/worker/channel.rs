//! Channel: where requests come from and replies go to.
//!
//! The transport is newline-delimited JSON over any byte stream:
//! stdin/stdout by default, or a Unix socket the host is listening on.

use std::io::{self, BufRead, BufReader, BufWriter, Stdin, Stdout, Write};

use crate::error::{WorkerError, WorkerResult};

use super::protocol::{RequestEnvelope, ResponseEnvelope, decode_request, encode_response};

/// A framed, ordered, bidirectional message channel.
pub trait Channel {
    /// Block until the next request arrives.
    ///
    /// `Ok(None)` means the peer closed the channel.
    fn receive(&mut self) -> WorkerResult<Option<RequestEnvelope>>;

    /// Send one reply. Must be on the wire when this returns.
    fn send(&mut self, reply: &ResponseEnvelope) -> WorkerResult<()>;
}

/// NDJSON over a reader/writer pair.
pub struct LineChannel<R, W> {
    reader: R,
    writer: W,
    line: String,
}

impl<R: BufRead, W: Write> LineChannel<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            line: String::new(),
        }
    }

    /// Give back the writer (tests inspect what was sent).
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl LineChannel<BufReader<Stdin>, BufWriter<Stdout>> {
    /// The process's own stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), BufWriter::new(io::stdout()))
    }
}

#[cfg(unix)]
impl
    LineChannel<
        BufReader<std::os::unix::net::UnixStream>,
        BufWriter<std::os::unix::net::UnixStream>,
    >
{
    /// Connect to a host listening on a Unix-domain socket.
    pub fn connect_unix(path: &std::path::Path) -> WorkerResult<Self> {
        use std::os::unix::net::UnixStream;

        let connect_failed = |source| WorkerError::ConnectFailed {
            path: path.display().to_string(),
            source,
        };

        let stream = UnixStream::connect(path).map_err(connect_failed)?;
        let read_half = stream.try_clone().map_err(connect_failed)?;
        Ok(Self::new(BufReader::new(read_half), BufWriter::new(stream)))
    }
}

impl<R: BufRead, W: Write> Channel for LineChannel<R, W> {
    fn receive(&mut self) -> WorkerResult<Option<RequestEnvelope>> {
        loop {
            self.line.clear();
            let n = self
                .reader
                .read_line(&mut self.line)
                .map_err(WorkerError::ReadFailed)?;
            if n == 0 {
                return Ok(None);
            }

            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                // Keep-alive / stray newline: not a message.
                continue;
            }

            return Ok(Some(decode_request(trimmed)));
        }
    }

    fn send(&mut self, reply: &ResponseEnvelope) -> WorkerResult<()> {
        let line = encode_response(reply)?;
        self.writer
            .write_all(line.as_bytes())
            .and_then(|()| self.writer.write_all(b"\n"))
            .and_then(|()| self.writer.flush())
            .map_err(WorkerError::WriteFailed)
    }
}
