//! SMTP server implementation

use crate::auth::Credentials;
use crate::command::Command;
use crate::connection::{Protocol, serve_connection};
use crate::envelope::Envelope;
use crate::error::{Limits, MailError};
use crate::smtp::commands::SmtpCommandHandler;
use crate::smtp::response::SmtpResponse;
use crate::smtp::session::{SmtpSession, SmtpState};

use log::{error, info};
use std::net::TcpListener;
use std::sync::{Arc, mpsc};
use std::thread;

/// SMTP server that accepts mail and sends each message to a channel
#[derive(Debug, Clone)]
pub struct SmtpServer {
    /// Server hostname
    hostname: String,
    /// Accounts for AUTH PLAIN, `None` when authentication is disabled
    credentials: Option<Arc<Credentials>>,
}

impl SmtpServer {
    /// Create a new SMTP server
    pub fn new(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_owned(),
            credentials: None,
        }
    }

    /// Enable AUTH PLAIN against the given accounts
    pub fn with_auth(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(Arc::new(credentials));
        self
    }

    /// Start the server on the specified address (blocking)
    /// Messages will be sent to the provided channel as they are accepted
    pub fn start(&self, addr: &str, delivery: mpsc::Sender<Envelope>) -> Result<(), MailError> {
        let listener = TcpListener::bind(addr)?;
        self.start_with_listener(listener, delivery)
    }

    /// Start the server with an existing listener (blocking)
    /// Messages will be sent to the provided channel as they are accepted
    pub fn start_with_listener(
        &self,
        listener: TcpListener,
        delivery: mpsc::Sender<Envelope>,
    ) -> Result<(), MailError> {
        info!(
            "{} SMTP started on {}",
            self.hostname,
            listener.local_addr()?
        );

        let handler = Arc::new(SmtpCommandHandler::new(
            &self.hostname,
            self.credentials.clone(),
        ));

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let connection = SmtpConnection::new(Arc::clone(&handler), delivery.clone());
                    let spawned = thread::Builder::new()
                        .name("smtp-session".to_owned())
                        .spawn(move || serve_connection(stream, connection));
                    if let Err(e) = spawned {
                        error!("Cannot spawn SMTP session: {e}");
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

/// One client's SMTP session bound to the shared command handler
pub(crate) struct SmtpConnection {
    handler: Arc<SmtpCommandHandler>,
    session: SmtpSession,
    delivery: mpsc::Sender<Envelope>,
}

impl SmtpConnection {
    pub(crate) fn new(handler: Arc<SmtpCommandHandler>, delivery: mpsc::Sender<Envelope>) -> Self {
        Self {
            handler,
            session: SmtpSession::new(),
            delivery,
        }
    }

    /// Handle a line of data during DATA mode
    fn handle_data_line(&mut self, line: &str) -> Option<SmtpResponse> {
        let content = line.trim_end_matches(['\r', '\n']);
        if content != "." {
            // Transparency: a leading dot was doubled by the client
            let line = line.strip_prefix('.').unwrap_or(line);
            self.session.add_data_line(line);
            return None;
        }

        match self.session.finish_data_collection() {
            Ok(envelope) => {
                info!(
                    "Accepted message from {} for {:?} ({} bytes)",
                    envelope.from,
                    envelope.to,
                    envelope.size()
                );
                // Errors when there are no listeners.
                // We ignore these errors for now.
                let _ = self.delivery.send(envelope);
                Some(SmtpResponse::ok())
            }
            Err(e) => Some(SmtpResponse::error(&e)),
        }
    }
}

impl Protocol for SmtpConnection {
    type Reply = SmtpResponse;

    fn greeting(&mut self) -> SmtpResponse {
        self.session.greeted();
        SmtpResponse::greeting(self.handler.hostname())
    }

    fn process_line(&mut self, line: &str) -> Option<SmtpResponse> {
        if self.session.state == SmtpState::AwaitingData {
            return self.handle_data_line(line);
        }

        if line.len() > Limits::COMMAND_LINE_MAX_LENGTH {
            return Some(SmtpResponse::error(&MailError::LineTooLong {
                max: Limits::COMMAND_LINE_MAX_LENGTH,
            }));
        }

        let response = Command::parse(line)
            .and_then(|command| self.handler.process_command(&command, &mut self.session))
            .unwrap_or_else(|e| SmtpResponse::error(&e));
        Some(response)
    }

    fn is_closed(&self) -> bool {
        self.session.is_closed()
    }
}
