//! Implementation of SMTP commands

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::debug;

use crate::auth::Credentials;
use crate::command::Command;
use crate::error::MailError;
use crate::smtp::response::SmtpResponse;
use crate::smtp::session::{SmtpSession, SmtpState};

/// Handles SMTP commands and returns appropriate responses
#[derive(Debug)]
pub struct SmtpCommandHandler {
    hostname: String,
    /// Accounts accepted by AUTH PLAIN; `Some` also makes EHLO advertise it
    credentials: Option<Arc<Credentials>>,
}

impl SmtpCommandHandler {
    /// Create a new command handler
    pub fn new(hostname: &str, credentials: Option<Arc<Credentials>>) -> Self {
        Self {
            hostname: hostname.to_owned(),
            credentials,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Process a parsed command and return a response
    pub fn process_command(
        &self,
        command: &Command,
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, MailError> {
        use SmtpState::*;

        match (session.state, command.verb.as_str()) {
            (Idle, "HELO") => self.handle_helo(command, session),
            (Idle, "EHLO") => self.handle_ehlo(command, session),
            (Idle, "AUTH") => self.handle_auth(command, session),
            (Idle, "MAIL") => self.handle_mail(command, session),
            (Idle, "RCPT") => self.handle_rcpt(command, session),
            (Idle, "DATA") => self.handle_data(command, session),
            (Idle, "RSET") => self.handle_rset(session),
            (Idle, "NOOP") => Ok(SmtpResponse::ok()),
            (Idle, "QUIT") => {
                session.close();
                Ok(SmtpResponse::quit())
            }
            (Idle, _) => Err(MailError::UnknownCommand),
            (Greeting | AwaitingData | Closed, _) => Err(MailError::Sequence(format!(
                "{} not allowed now",
                command.verb
            ))),
        }
    }

    /// Handle HELO command
    fn handle_helo(
        &self,
        command: &Command,
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, MailError> {
        session.set_client_domain(command.arg().map(str::to_owned));
        Ok(SmtpResponse::helo(
            &self.hostname,
            session.client_domain.as_deref(),
        ))
    }

    /// Handle EHLO command
    fn handle_ehlo(
        &self,
        command: &Command,
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, MailError> {
        session.set_client_domain(command.arg().map(str::to_owned));
        Ok(SmtpResponse::ehlo(
            &self.hostname,
            session.client_domain.as_deref(),
            self.credentials.is_some(),
        ))
    }

    /// Handle AUTH PLAIN with an initial response
    fn handle_auth(
        &self,
        command: &Command,
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, MailError> {
        let mechanism = command
            .arg()
            .ok_or_else(|| MailError::Syntax("AUTH requires a mechanism".to_owned()))?;
        if !mechanism.eq_ignore_ascii_case("PLAIN") {
            return Err(MailError::Syntax(format!(
                "unsupported mechanism {mechanism}"
            )));
        }

        let initial = command.args.get(1).ok_or(MailError::MalformedAuth)?;
        let (username, password) = decode_sasl_plain(initial)?;

        let accepted = match self.credentials {
            Some(ref credentials) => credentials.verify(&username, &password),
            None => Err(MailError::Authentication),
        };
        if let Err(err) = accepted {
            debug!("AUTH PLAIN rejected for {username}");
            return Err(err);
        }

        debug!("AUTH PLAIN accepted for {username}");
        session.authenticated_user = Some(username);
        Ok(SmtpResponse::auth_success())
    }

    /// Handle MAIL command
    fn handle_mail(
        &self,
        command: &Command,
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, MailError> {
        let addr = parse_path(&command.joined_args(), "FROM:")
            .ok_or_else(|| MailError::Syntax("MAIL command must be 'MAIL FROM:<address>'".to_owned()))?;

        session.set_sender(addr);
        Ok(SmtpResponse::ok())
    }

    /// Handle RCPT command
    fn handle_rcpt(
        &self,
        command: &Command,
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, MailError> {
        let addr = parse_path(&command.joined_args(), "TO:")
            .ok_or_else(|| MailError::Syntax("RCPT command must be 'RCPT TO:<address>'".to_owned()))?;

        session.add_recipient(addr)?;
        Ok(SmtpResponse::ok())
    }

    /// Handle DATA command
    fn handle_data(
        &self,
        command: &Command,
        session: &mut SmtpSession,
    ) -> Result<SmtpResponse, MailError> {
        if !command.args.is_empty() {
            return Err(MailError::Syntax(
                "DATA command takes no arguments".to_owned(),
            ));
        }

        session.start_data_mode()?;
        Ok(SmtpResponse::data_start())
    }

    /// Handle RSET command
    fn handle_rset(&self, session: &mut SmtpSession) -> Result<SmtpResponse, MailError> {
        session.reset();
        Ok(SmtpResponse::ok())
    }
}

/// Extract the address from `FROM:<addr>` or `TO:<addr>`.
///
/// The keyword is matched case-insensitively, angle brackets are optional
/// and anything after the path (ESMTP parameters) is ignored.
fn parse_path(arg: &str, keyword: &str) -> Option<String> {
    let prefix = arg.get(..keyword.len())?;
    if !prefix.eq_ignore_ascii_case(keyword) {
        return None;
    }

    let path = arg[keyword.len()..].trim_start();
    let addr = match path.strip_prefix('<') {
        Some(inner) => &inner[..inner.find('>')?],
        None => path.split_whitespace().next()?,
    };

    let addr = addr.trim();
    if addr.is_empty() {
        None
    } else {
        Some(addr.to_owned())
    }
}

/// Decode an AUTH PLAIN response into a username and password.
///
/// The authorization identity in the first field is ignored.
fn decode_sasl_plain(encoded: &str) -> Result<(String, String), MailError> {
    let decoded = STANDARD
        .decode(encoded)
        .map_err(|_| MailError::MalformedAuth)?;
    let decoded = String::from_utf8(decoded).map_err(|_| MailError::MalformedAuth)?;

    let fields: Vec<&str> = decoded.split('\0').collect();
    if fields.len() < 3 {
        return Err(MailError::MalformedAuth);
    }

    Ok((fields[1].to_owned(), fields[2].to_owned()))
}
