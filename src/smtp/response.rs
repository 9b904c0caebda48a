//! SMTP response handling

use crate::error::MailError;
use crate::reply::Reply;

/// Represents an SMTP response that can be sent to a client
#[derive(Debug, Clone)]
pub struct SmtpResponse {
    /// The SMTP response code (e.g. 250, 354, 500)
    pub code: u16,
    /// The human-readable message
    pub message: String,
    /// Continuation lines, used by EHLO to list capabilities
    pub multiline: Option<Vec<String>>,
}

impl SmtpResponse {
    /// Create a new SMTP response
    pub fn new(code: u16, message: &str) -> Self {
        Self {
            code,
            message: message.to_owned(),
            multiline: None,
        }
    }

    /// Create a new multiline SMTP response
    pub fn new_multiline(code: u16, message: &str, lines: Vec<String>) -> Self {
        Self {
            code,
            message: message.to_owned(),
            multiline: Some(lines),
        }
    }

    /// Create a success response (250 OK)
    pub fn ok() -> Self {
        Self::new(250, "OK")
    }

    /// Create a greeting response (220)
    pub fn greeting(hostname: &str) -> Self {
        Self::new(220, &format!("{hostname} Service ready"))
    }

    /// Create a HELO response (250)
    pub fn helo(hostname: &str, client_domain: Option<&str>) -> Self {
        match client_domain {
            Some(domain) => Self::new(250, &format!("{hostname} Hello {domain}")),
            None => Self::new(250, &format!("{hostname} Hello")),
        }
    }

    /// Create an EHLO response (250), advertising AUTH PLAIN when enabled
    pub fn ehlo(hostname: &str, client_domain: Option<&str>, auth: bool) -> Self {
        let greeting = Self::helo(hostname, client_domain);
        if auth {
            Self::new_multiline(250, &greeting.message, vec!["AUTH PLAIN".to_owned()])
        } else {
            greeting
        }
    }

    /// Create an authentication success response (235)
    pub fn auth_success() -> Self {
        Self::new(235, "Authentication successful")
    }

    /// Create a DATA intermediate response (354)
    pub fn data_start() -> Self {
        Self::new(354, "End data with <CR><LF>.<CR><LF>")
    }

    /// Create a QUIT response (221)
    pub fn quit() -> Self {
        Self::new(221, "Bye")
    }

    /// Create an error response from an error
    pub fn error(err: &MailError) -> Self {
        Self::new(err.smtp_code(), &err.to_string())
    }

    /// Check if this is a success response (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// Check if this is an error response (4xx or 5xx)
    pub fn is_error(&self) -> bool {
        (400..600).contains(&self.code)
    }
}

impl Reply for SmtpResponse {
    fn format(&self) -> String {
        match self.multiline {
            Some(ref lines) if !lines.is_empty() => {
                let mut result = format!("{}-{}\r\n", self.code, self.message);
                for (i, line) in lines.iter().enumerate() {
                    // Last line uses space instead of dash
                    let separator = if i == lines.len() - 1 { ' ' } else { '-' };
                    result.push_str(&format!("{}{}{}\r\n", self.code, separator, line));
                }
                result
            }
            _ => format!("{} {}\r\n", self.code, self.message),
        }
    }
}
