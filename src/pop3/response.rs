//! POP3 response handling

use crate::error::MailError;
use crate::reply::Reply;

/// Represents a POP3 response that can be sent to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pop3Response {
    /// `+OK` when true, `-ERR` otherwise
    pub ok: bool,
    /// Text following the status indicator, may be empty
    pub message: String,
    /// Body of a multi-line response, sent before the terminating `.`
    pub multiline: Option<Vec<String>>,
}

impl Pop3Response {
    pub fn ok(message: &str) -> Self {
        Self {
            ok: true,
            message: message.to_owned(),
            multiline: None,
        }
    }

    pub fn err(message: &str) -> Self {
        Self {
            ok: false,
            message: message.to_owned(),
            multiline: None,
        }
    }

    /// A `+OK` line followed by `lines` and the terminating `.`
    pub fn multiline(message: &str, lines: Vec<String>) -> Self {
        Self {
            ok: true,
            message: message.to_owned(),
            multiline: Some(lines),
        }
    }

    /// Create a greeting response
    pub fn greeting(hostname: &str) -> Self {
        Self::ok(&format!("{hostname} POP3 server ready"))
    }

    /// Create an error response from an error
    pub fn error(err: &MailError) -> Self {
        Self::err(&err.to_string())
    }
}

impl Reply for Pop3Response {
    fn format(&self) -> String {
        let status = if self.ok { "+OK" } else { "-ERR" };
        let mut result = if self.message.is_empty() {
            format!("{status}\r\n")
        } else {
            format!("{status} {}\r\n", self.message)
        };

        if let Some(ref lines) = self.multiline {
            for line in lines {
                // Byte-stuff lines that would read as the terminator
                if line.starts_with('.') {
                    result.push('.');
                }
                result.push_str(line);
                result.push_str("\r\n");
            }
            result.push_str(".\r\n");
        }
        result
    }
}
