//! Implementation of POP3 commands

use std::sync::Arc;

use log::debug;

use crate::auth::Credentials;
use crate::command::Command;
use crate::error::MailError;
use crate::pop3::mailbox::Mailbox;
use crate::pop3::response::Pop3Response;
use crate::pop3::session::{Pop3Session, Pop3State};

/// Handles POP3 commands against the shared mailbox
#[derive(Debug)]
pub struct Pop3CommandHandler {
    hostname: String,
    credentials: Arc<Credentials>,
    mailbox: Arc<Mailbox>,
}

fn not_authenticated() -> MailError {
    MailError::Sequence("not authenticated".to_owned())
}

impl Pop3CommandHandler {
    pub fn new(hostname: &str, credentials: Arc<Credentials>, mailbox: Arc<Mailbox>) -> Self {
        Self {
            hostname: hostname.to_owned(),
            credentials,
            mailbox,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Process a parsed command and return a response
    pub fn process_command(
        &self,
        command: &Command,
        session: &mut Pop3Session,
    ) -> Result<Pop3Response, MailError> {
        use Pop3State::*;

        match (session.state, command.verb.as_str()) {
            (Closed, _) => Err(MailError::Sequence("session closed".to_owned())),
            (_, "NOOP") => Ok(Pop3Response::ok("")),
            (_, "QUIT") => {
                session.close();
                Ok(Pop3Response::ok("Bye"))
            }
            (_, "RSET") => self.handle_rset(session),
            (Unauthenticated | Authenticating, "USER") => self.handle_user(command, session),
            (Authenticated, "USER") => {
                Err(MailError::Sequence("already authenticated".to_owned()))
            }
            (Authenticating, "PASS") => self.handle_pass(command, session),
            (Unauthenticated, "PASS") => Err(MailError::Sequence("USER required first".to_owned())),
            (Authenticated, "PASS") => Ok(Pop3Response::ok("Already authenticated")),
            (Authenticated, "STAT") => Ok(self.handle_stat()),
            (Authenticated, "LIST") => self.handle_list(command),
            (Authenticated, "RETR") => self.handle_retr(command),
            (Authenticated, "DELE") => self.handle_dele(command),
            (Unauthenticated | Authenticating, "STAT" | "LIST" | "RETR" | "DELE") => {
                Err(not_authenticated())
            }
            (_, _) => Err(MailError::UnknownCommand),
        }
    }

    fn handle_user(
        &self,
        command: &Command,
        session: &mut Pop3Session,
    ) -> Result<Pop3Response, MailError> {
        let username = command
            .arg()
            .ok_or_else(|| MailError::Syntax("missing username".to_owned()))?;

        session.set_username(username.to_owned());
        Ok(Pop3Response::ok("User accepted"))
    }

    fn handle_pass(
        &self,
        command: &Command,
        session: &mut Pop3Session,
    ) -> Result<Pop3Response, MailError> {
        let password = command.joined_args();
        if password.is_empty() {
            return Err(MailError::Syntax("missing password".to_owned()));
        }

        let username = session.username.as_deref().unwrap_or_default();
        if let Err(err) = self.credentials.verify(username, &password) {
            // The username is kept so PASS can be retried
            debug!("POP3 login failed for {username}");
            return Err(err);
        }

        debug!("POP3 login for {username}");
        session.authenticate();
        Ok(Pop3Response::ok("Authenticated"))
    }

    fn handle_stat(&self) -> Pop3Response {
        let (count, size) = self.mailbox.stat();
        Pop3Response::ok(&format!("{count} {size}"))
    }

    fn handle_list(&self, command: &Command) -> Result<Pop3Response, MailError> {
        if command.arg().is_some() {
            let number = message_number(command)?;
            let envelope = self.mailbox.get(number)?;
            return Ok(Pop3Response::ok(&format!("{number} {}", envelope.size())));
        }

        let listing = self.mailbox.list();
        let count = listing.len();
        let lines = listing
            .into_iter()
            .map(|(number, size)| format!("{number} {size}"))
            .collect();
        Ok(Pop3Response::multiline(&format!("{count} messages"), lines))
    }

    fn handle_retr(&self, command: &Command) -> Result<Pop3Response, MailError> {
        let number = message_number(command)?;
        let envelope = self.mailbox.get(number)?;

        let text = envelope.to_string();
        let lines = text.lines().map(str::to_owned).collect();
        Ok(Pop3Response::multiline(&envelope.size().to_string(), lines))
    }

    fn handle_dele(&self, command: &Command) -> Result<Pop3Response, MailError> {
        let number = message_number(command)?;
        self.mailbox.remove(number)?;

        debug!("Deleted message {number}");
        Ok(Pop3Response::ok("Message deleted"))
    }

    /// Always resets the session, but only an authenticated session gets `+OK`
    fn handle_rset(&self, session: &mut Pop3Session) -> Result<Pop3Response, MailError> {
        let was_authenticated = session.is_authenticated();
        session.reset();

        if was_authenticated {
            Ok(Pop3Response::ok("Session reset"))
        } else {
            Err(not_authenticated())
        }
    }
}

/// The message number argument of RETR, DELE and LIST
fn message_number(command: &Command) -> Result<usize, MailError> {
    let arg = command
        .arg()
        .ok_or_else(|| MailError::Syntax("message number required".to_owned()))?;
    arg.parse()
        .map_err(|_| MailError::Syntax(format!("invalid message number {arg}")))
}
