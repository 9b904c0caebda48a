//! POP3 server implementation

use crate::auth::Credentials;
use crate::command::Command;
use crate::connection::{Protocol, serve_connection};
use crate::error::MailError;
use crate::pop3::commands::Pop3CommandHandler;
use crate::pop3::mailbox::Mailbox;
use crate::pop3::response::Pop3Response;
use crate::pop3::session::Pop3Session;

use log::{error, info};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

/// POP3 server giving authenticated clients access to a shared mailbox
#[derive(Debug, Clone)]
pub struct Pop3Server {
    hostname: String,
    credentials: Arc<Credentials>,
    mailbox: Arc<Mailbox>,
}

impl Pop3Server {
    /// Create a new POP3 server with an empty mailbox
    pub fn new(hostname: &str, credentials: Credentials) -> Self {
        Self {
            hostname: hostname.to_owned(),
            credentials: Arc::new(credentials),
            mailbox: Arc::new(Mailbox::new()),
        }
    }

    /// Serve an existing mailbox, possibly shared with other components
    pub fn with_mailbox(mut self, mailbox: Arc<Mailbox>) -> Self {
        self.mailbox = mailbox;
        self
    }

    pub fn mailbox(&self) -> Arc<Mailbox> {
        Arc::clone(&self.mailbox)
    }

    /// Start the server on the specified address (blocking)
    pub fn start(&self, addr: &str) -> Result<(), MailError> {
        let listener = TcpListener::bind(addr)?;
        self.start_with_listener(listener)
    }

    /// Start the server with an existing listener (blocking)
    pub fn start_with_listener(&self, listener: TcpListener) -> Result<(), MailError> {
        info!(
            "{} POP3 started on {}",
            self.hostname,
            listener.local_addr()?
        );

        let handler = Arc::new(Pop3CommandHandler::new(
            &self.hostname,
            Arc::clone(&self.credentials),
            Arc::clone(&self.mailbox),
        ));

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let connection = Pop3Connection::new(Arc::clone(&handler));
                    let spawned = thread::Builder::new()
                        .name("pop3-session".to_owned())
                        .spawn(move || serve_connection(stream, connection));
                    if let Err(e) = spawned {
                        error!("Cannot spawn POP3 session: {e}");
                    }
                }
                Err(e) => {
                    error!("Error accepting connection: {e}");
                }
            }
        }

        Ok(())
    }
}

/// One client's POP3 session bound to the shared command handler
pub(crate) struct Pop3Connection {
    handler: Arc<Pop3CommandHandler>,
    session: Pop3Session,
}

impl Pop3Connection {
    pub(crate) fn new(handler: Arc<Pop3CommandHandler>) -> Self {
        Self {
            handler,
            session: Pop3Session::new(),
        }
    }
}

impl Protocol for Pop3Connection {
    type Reply = Pop3Response;

    fn greeting(&mut self) -> Pop3Response {
        Pop3Response::greeting(self.handler.hostname())
    }

    fn process_line(&mut self, line: &str) -> Option<Pop3Response> {
        let response = Command::parse(line)
            .and_then(|command| self.handler.process_command(&command, &mut self.session))
            .unwrap_or_else(|e| Pop3Response::error(&e));
        Some(response)
    }

    fn is_closed(&self) -> bool {
        self.session.is_closed()
    }
}
