//! The per-connection read/dispatch/reply loop

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

use log::{debug, error, trace};

use crate::error::MailError;
use crate::reply::{Reply, write_reply};

/// A line-oriented protocol session driven by [`run_session`]
pub trait Protocol {
    type Reply: Reply;

    /// The unsolicited reply sent as soon as the client connects
    fn greeting(&mut self) -> Self::Reply;

    /// Consume one line, terminator included.
    ///
    /// Returns `None` while a multi-line payload is still being collected.
    fn process_line(&mut self, line: &str) -> Option<Self::Reply>;

    /// Whether the session has reached its terminal state
    fn is_closed(&self) -> bool;
}

/// Frames a byte stream into `\n`-terminated lines
pub struct LineReader<R> {
    inner: R,
    buffer: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: Vec::with_capacity(128),
        }
    }

    /// Read the next line with its terminator, or `None` once the peer has
    /// closed the connection.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn read_line(&mut self) -> Result<Option<String>, MailError> {
        self.buffer.clear();
        if self.inner.read_until(b'\n', &mut self.buffer)? == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&self.buffer).into_owned()))
    }
}

/// Greet the client, then feed it lines until the session closes or the
/// peer goes away.
pub fn run_session<P, R, W>(protocol: &mut P, reader: R, writer: &mut W) -> Result<(), MailError>
where
    P: Protocol,
    R: BufRead,
    W: Write,
{
    write_reply(writer, &protocol.greeting())?;

    let mut lines = LineReader::new(reader);
    while !protocol.is_closed() {
        let Some(line) = lines.read_line()? else {
            debug!("Peer closed the connection");
            break;
        };
        trace!("< {}", line.trim_end());

        if let Some(reply) = protocol.process_line(&line) {
            write_reply(writer, &reply)?;
        }
    }

    Ok(())
}

/// Serve one accepted socket to completion, logging any I/O failure
pub fn serve_connection<P: Protocol>(stream: TcpStream, mut protocol: P) {
    let remote = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_owned());
    debug!("New connection from {remote}");

    let result = match stream.try_clone() {
        Ok(read_half) => {
            let mut write_half = stream;
            run_session(&mut protocol, BufReader::new(read_half), &mut write_half)
        }
        Err(err) => Err(err.into()),
    };

    match result {
        Ok(()) => debug!("({remote}) Connection closed"),
        Err(err) => error!("({remote}) {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Echo {
        closed: bool,
    }

    struct Line(String);

    impl Reply for Line {
        fn format(&self) -> String {
            format!("{}\r\n", self.0)
        }
    }

    impl Protocol for Echo {
        type Reply = Line;

        fn greeting(&mut self) -> Line {
            Line("hello".to_owned())
        }

        fn process_line(&mut self, line: &str) -> Option<Line> {
            match line.trim_end() {
                "skip" => None,
                "bye" => {
                    self.closed = true;
                    Some(Line("bye".to_owned()))
                }
                other => Some(Line(other.to_uppercase())),
            }
        }

        fn is_closed(&self) -> bool {
            self.closed
        }
    }

    #[test]
    fn test_line_reader_keeps_terminators() {
        let mut reader = LineReader::new(Cursor::new("one\r\ntwo\nthree"));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("one\r\n"));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("two\n"));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("three"));
        assert_eq!(reader.read_line().unwrap(), None);
    }

    #[test]
    fn test_line_reader_replaces_invalid_utf8() {
        let mut reader = LineReader::new(Cursor::new(b"a\xffb\r\n".to_vec()));
        assert_eq!(
            reader.read_line().unwrap().as_deref(),
            Some("a\u{fffd}b\r\n")
        );
    }

    #[test]
    fn test_run_session_stops_when_closed() {
        let mut protocol = Echo { closed: false };
        let mut out = Vec::new();
        let input = Cursor::new("abc\r\nskip\r\nbye\r\nignored\r\n");

        run_session(&mut protocol, input, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "hello\r\nABC\r\nbye\r\n"
        );
    }

    #[test]
    fn test_run_session_stops_at_eof() {
        let mut protocol = Echo { closed: false };
        let mut out = Vec::new();

        run_session(&mut protocol, Cursor::new("abc\r\n"), &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "hello\r\nABC\r\n");
        assert!(!protocol.is_closed());
    }
}
