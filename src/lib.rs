//! # Mailpost
//!
//! Mailpost is a pair of embedded mail servers: an SMTP server that accepts
//! submitted messages and a POP3 server that lets clients retrieve them.
//!
//! ## Quick Start
//!
//! ```rust
//! use mailpost::{Credentials, Pop3Server, SmtpServer};
//! use std::sync::mpsc;
//! use std::thread;
//! use std::time::Duration;
//!
//! let credentials = Credentials::new().with_user("test", "test");
//!
//! // Accepted messages arrive on this channel
//! let (tx, rx) = mpsc::channel();
//! let smtp = SmtpServer::new("test.local").with_auth(credentials.clone());
//! thread::spawn(move || {
//!     smtp.start("127.0.0.1:2525", tx).unwrap();
//! });
//!
//! // Retrieval clients see whatever is in the mailbox
//! let pop3 = Pop3Server::new("test.local", credentials);
//! let mailbox = pop3.mailbox();
//! thread::spawn(move || {
//!     pop3.start("127.0.0.1:1110").unwrap();
//! });
//!
//! if let Ok(envelope) = rx.recv_timeout(Duration::from_millis(100)) {
//!     mailbox.append(envelope);
//! }
//! ```
//!
//! ## Supported SMTP commands
//!
//! - `HELO` / `EHLO` - Identify the client, EHLO advertises `AUTH PLAIN` when enabled
//! - `AUTH PLAIN` - Authenticate with an initial response
//! - `MAIL FROM` - Specify the sender's address
//! - `RCPT TO` - Specify the destination (multiple destinations are supported)
//! - `DATA` - Send the message text
//! - `RSET` - Reset the current transaction
//! - `NOOP` - Do nothing
//! - `QUIT` - Close connection
//!
//! ## Supported POP3 commands
//!
//! - `USER` / `PASS` - Log in
//! - `STAT` - Message count and total size
//! - `LIST` - Size of every message, or of one message
//! - `RETR` - Fetch a message
//! - `DELE` - Delete a message
//! - `NOOP`, `RSET`, `QUIT`
//!
//! ## Notes
//!
//! - Runs in-memory only. Message persistence is not supported.
//! - SSL/TLS connections and STARTTLS are not supported.
//! - Mail relay is not supported.
//! - Every connection is served on its own thread.
//! - Deleting a message never renumbers the others.

mod auth;
mod command;
mod connection;
mod envelope;
mod error;
mod pop3;
mod reply;
mod smtp;

pub use auth::Credentials;
pub use command::Command;
pub use connection::{LineReader, Protocol, run_session};
pub use envelope::Envelope;
pub use error::{Limits, MailError};
pub use pop3::{Mailbox, Pop3CommandHandler, Pop3Response, Pop3Server, Pop3Session, Pop3State};
pub use reply::{Reply, write_reply};
pub use smtp::{SmtpCommandHandler, SmtpResponse, SmtpServer, SmtpSession, SmtpState};
