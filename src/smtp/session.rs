//! SMTP session state management

use std::mem;

use crate::envelope::Envelope;
use crate::error::{Limits, MailError};

/// Represents the current state of an SMTP session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpState {
    /// Connected, greeting not yet sent
    Greeting,
    /// Ready for commands
    Idle,
    /// DATA accepted - collecting message text
    AwaitingData,
    /// QUIT received
    Closed,
}

/// Manages the state and data for a single SMTP session
#[derive(Debug)]
pub struct SmtpSession {
    /// Current state of the session
    pub state: SmtpState,
    /// The message being built; holds the sender and recipients
    pub envelope: Envelope,
    /// Raw message text collected during DATA, line terminators included
    pub data: String,
    /// Client domain from HELO/EHLO
    pub client_domain: Option<String>,
    /// User authenticated through AUTH PLAIN
    pub authenticated_user: Option<String>,
    /// Set when message data went past the size limit
    data_overflow: bool,
}

impl Default for SmtpSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SmtpSession {
    /// Create a new SMTP session
    pub fn new() -> Self {
        Self {
            state: SmtpState::Greeting,
            envelope: Envelope::new(),
            data: String::new(),
            client_domain: None,
            authenticated_user: None,
            data_overflow: false,
        }
    }

    /// Move past the greeting once it has been sent
    pub fn greeted(&mut self) {
        if self.state == SmtpState::Greeting {
            self.state = SmtpState::Idle;
        }
    }

    /// Clear the transaction: sender, recipients and data go together
    pub fn reset(&mut self) {
        self.envelope = Envelope::new();
        self.data.clear();
        self.data_overflow = false;
        if self.state == SmtpState::AwaitingData {
            self.state = SmtpState::Idle;
        }
        // Keep client_domain and authenticated_user, they outlive transactions
    }

    pub fn close(&mut self) {
        self.state = SmtpState::Closed;
    }

    pub fn is_closed(&self) -> bool {
        self.state == SmtpState::Closed
    }

    /// The sender address, if MAIL has been accepted
    pub fn sender(&self) -> Option<&str> {
        if self.envelope.from.is_empty() {
            None
        } else {
            Some(&self.envelope.from)
        }
    }

    pub fn recipients(&self) -> &[String] {
        &self.envelope.to
    }

    /// Set the sender address
    pub fn set_sender(&mut self, sender: String) {
        self.envelope.from = sender;
    }

    /// Add a recipient address
    pub fn add_recipient(&mut self, recipient: String) -> Result<(), MailError> {
        if self.envelope.to.len() >= Limits::MAX_RECIPIENTS {
            return Err(MailError::TooManyRecipients {
                max: Limits::MAX_RECIPIENTS,
            });
        }

        self.envelope.to.push(recipient);
        Ok(())
    }

    /// Start data collection mode
    pub fn start_data_mode(&mut self) -> Result<(), MailError> {
        if self.sender().is_none() || self.recipients().is_empty() {
            return Err(MailError::Sequence(
                "DATA requires MAIL and RCPT first".to_owned(),
            ));
        }

        self.data.clear();
        self.data_overflow = false;
        self.state = SmtpState::AwaitingData;
        Ok(())
    }

    /// Add a line of data during data collection.
    ///
    /// Data beyond the size limit is dropped and reported when the
    /// terminator arrives.
    pub fn add_data_line(&mut self, line: &str) {
        if self.data_overflow {
            return;
        }
        if self.data.len() + line.len() > Limits::MAX_DATA_SIZE {
            self.data_overflow = true;
            self.data.clear();
            return;
        }
        self.data.push_str(line);
    }

    /// Finish data collection and hand back the completed envelope.
    ///
    /// The session is left idle with a fresh envelope either way.
    pub fn finish_data_collection(&mut self) -> Result<Envelope, MailError> {
        if self.state != SmtpState::AwaitingData {
            return Err(MailError::Sequence(
                "Not in data collection mode".to_owned(),
            ));
        }

        let overflow = self.data_overflow;
        let mut envelope = mem::take(&mut self.envelope);
        let data = mem::take(&mut self.data);
        self.reset();

        if overflow {
            return Err(MailError::TooMuchData {
                max: Limits::MAX_DATA_SIZE,
            });
        }

        envelope.parse_data(&data);
        Ok(envelope)
    }

    /// Set the client domain from HELO/EHLO, abandoning any transaction
    pub fn set_client_domain(&mut self, domain: Option<String>) {
        self.client_domain = domain;
        self.reset();
    }
}
