//! Newline-delimited transport over any `BufRead`/`Write` pair.

use crate::codec::{self, Command};
use crate::error::{ProtocolError, TransportError};
use crate::Transport;
use std::io::{self, BufRead, StdinLock, StdoutLock, Write};
use tracing::trace;

/// What the next read from the host produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A well-formed command
    Command(Command),
    /// A line that failed to decode. The raw text is kept for diagnostics.
    Malformed { line: String, error: ProtocolError },
    /// The host closed the input stream
    Eof,
}

/// Line transport: one command per line in, one flushed line per command out.
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
    buf: Vec<u8>,
    lines_read: u64,
    lines_written: u64,
}

/// Transport bound to the process' standard input and output
pub type StdioTransport = LineTransport<StdinLock<'static>, StdoutLock<'static>>;

impl StdioTransport {
    /// Lock stdin/stdout for the lifetime of the transport.
    pub fn stdio() -> Self {
        LineTransport::new(io::stdin().lock(), io::stdout().lock())
    }
}

impl<R: BufRead, W: Write> LineTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            buf: Vec::with_capacity(128),
            lines_read: 0,
            lines_written: 0,
        }
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Consume the transport and hand back the output sink.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<R: BufRead, W: Write> Transport for LineTransport<R, W> {
    fn read_command(&mut self) -> Result<Incoming, TransportError> {
        self.buf.clear();
        let n = self.reader.read_until(b'\n', &mut self.buf)?;
        if n == 0 {
            trace!("in: EOF");
            return Ok(Incoming::Eof);
        }
        self.lines_read += 1;

        match codec::decode(&self.buf) {
            Ok(cmd) => {
                trace!("in: {cmd}");
                Ok(Incoming::Command(cmd))
            }
            Err(error) => {
                let line = String::from_utf8_lossy(&self.buf).trim_end().to_string();
                trace!("in (malformed): {line:?}: {error}");
                Ok(Incoming::Malformed { line, error })
            }
        }
    }

    fn send_command(&mut self, fields: &[&str]) -> Result<(), TransportError> {
        let line = codec::encode(fields);
        trace!("out: {line}");
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        // The host reads synchronously; an unflushed reply stalls it.
        self.writer.flush()?;
        self.lines_written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn transport(input: &str) -> LineTransport<Cursor<Vec<u8>>, Vec<u8>> {
        LineTransport::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_read_until_eof() {
        let mut t = transport("begin run\nframe\n");
        let first = t.read_command().unwrap();
        assert_eq!(
            first,
            Incoming::Command(Command::new("begin", Some("run".into()), None))
        );
        assert!(matches!(t.read_command().unwrap(), Incoming::Command(c) if c.verb() == "frame"));
        assert_eq!(t.read_command().unwrap(), Incoming::Eof);
        // EOF is sticky
        assert_eq!(t.read_command().unwrap(), Incoming::Eof);
        assert_eq!(t.lines_read(), 2);
    }

    #[test]
    fn test_last_line_without_newline() {
        let mut t = transport("end run");
        assert!(matches!(t.read_command().unwrap(), Incoming::Command(c) if c.is("end", "run")));
        assert_eq!(t.read_command().unwrap(), Incoming::Eof);
    }

    #[test]
    fn test_malformed_line_is_reported_not_raised() {
        let mut t = transport("key %zz 0,0\nstart\n");
        match t.read_command().unwrap() {
            Incoming::Malformed { line, error } => {
                assert_eq!(line, "key %zz 0,0");
                assert!(matches!(error, ProtocolError::InvalidEscape { .. }));
            }
            other => panic!("expected malformed, got {other:?}"),
        }
        assert!(matches!(t.read_command().unwrap(), Incoming::Command(c) if c.verb() == "start"));
    }

    #[test]
    fn test_raw_invalid_utf8_is_malformed() {
        let mut t = LineTransport::new(Cursor::new(b"key \xff\xfe 1,1\n".to_vec()), Vec::new());
        assert!(matches!(
            t.read_command().unwrap(),
            Incoming::Malformed {
                error: ProtocolError::InvalidUtf8 { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_send_writes_encoded_line() {
        let mut t = transport("");
        t.send_command(&["begin", "frame"]).unwrap();
        t.send_command(&["argb", "left shift", "ff00ff00"]).unwrap();
        assert_eq!(t.lines_written(), 2);
        let out = String::from_utf8(t.into_writer()).unwrap();
        assert_eq!(out, "begin frame\nargb left%20shift ff00ff00\n");
    }
}
