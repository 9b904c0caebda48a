//! Writing protocol replies to a client

use std::io::Write;

use log::trace;

use crate::error::MailError;

/// A reply that knows its own wire encoding
pub trait Reply {
    /// Format the reply for sending over the wire, CRLF line endings included
    fn format(&self) -> String;
}

/// Write a reply and flush it immediately
pub fn write_reply<W, R>(writer: &mut W, reply: &R) -> Result<(), MailError>
where
    W: Write + ?Sized,
    R: Reply + ?Sized,
{
    let formatted = reply.format();
    for line in formatted.lines() {
        trace!("> {line}");
    }
    writer.write_all(formatted.as_bytes())?;
    writer.flush()?;
    Ok(())
}
