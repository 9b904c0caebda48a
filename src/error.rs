//! Error types shared by the SMTP and POP3 servers

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Syntax error, empty command")]
    EmptyCommand,

    #[error("Syntax error, command unrecognized")]
    UnknownCommand,

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Malformed AUTH PLAIN response")]
    MalformedAuth,

    #[error("Bad sequence of commands: {0}")]
    Sequence(String),

    #[error("Invalid credentials")]
    Authentication,

    #[error("No such message")]
    NotFound,

    #[error("Line too long (max {max} characters)")]
    LineTooLong { max: usize },

    #[error("Too many recipients (max {max})")]
    TooManyRecipients { max: usize },

    #[error("Too much mail data (max {max} bytes)")]
    TooMuchData { max: usize },
}

/// Size limits as defined in RFC 821
pub struct Limits;

impl Limits {
    /// Maximum length of a command line including CRLF
    pub const COMMAND_LINE_MAX_LENGTH: usize = 512;

    /// Maximum number of recipients per message
    pub const MAX_RECIPIENTS: usize = 100;

    /// Maximum total size of message data held in memory
    pub const MAX_DATA_SIZE: usize = 10 * 1024 * 1024; // 10MB
}

impl MailError {
    /// The SMTP reply code used when this error is reported to a client
    pub fn smtp_code(&self) -> u16 {
        match self {
            MailError::Io(_) => 421,
            MailError::EmptyCommand => 500,
            MailError::UnknownCommand => 500,
            MailError::Syntax(_) => 501,
            MailError::MalformedAuth => 501,
            MailError::Sequence(_) => 503,
            MailError::Authentication => 501,
            MailError::NotFound => 550,
            MailError::LineTooLong { .. } => 500,
            MailError::TooManyRecipients { .. } => 552,
            MailError::TooMuchData { .. } => 552,
        }
    }
}
