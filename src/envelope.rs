//! Mail envelope shared by submission and retrieval

use std::collections::BTreeMap;
use std::fmt;

/// Headers written ahead of the others when an envelope is serialized
const LEADING_HEADERS: [&str; 3] = ["From", "To", "Subject"];

/// A message together with its routing information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// The reverse-path, empty until set
    pub from: String,

    /// Forward-paths in the order they were given
    pub to: Vec<String>,

    /// Message headers, keys are case-sensitive
    pub headers: BTreeMap<String, String>,

    /// Everything after the blank line that ends the header block
    pub body: String,
}

impl Envelope {
    /// Create an empty envelope
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_from(mut self, from: &str) -> Self {
        self.from = from.to_owned();
        self
    }

    pub fn with_recipient(mut self, to: &str) -> Self {
        self.to.push(to.to_owned());
        self
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_owned();
        self
    }

    /// Check if this envelope is addressed to a specific recipient
    pub fn has_recipient(&self, recipient: &str) -> bool {
        self.to.iter().any(|addr| addr == recipient)
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn subject(&self) -> Option<&str> {
        self.header("Subject")
    }

    /// Size in bytes as reported by STAT, LIST and RETR.
    ///
    /// Counts the sender, every recipient, every header key and value and
    /// the body. A `From` header is counted in addition to `from`.
    pub fn size(&self) -> usize {
        let headers: usize = self.headers.iter().map(|(k, v)| k.len() + v.len()).sum();
        let recipients: usize = self.to.iter().map(String::len).sum();
        self.from.len() + recipients + headers + self.body.len()
    }

    /// Fill headers and body from the text collected during DATA.
    ///
    /// The header block ends at the first blank line. A line that is neither
    /// a header nor a folded continuation starts the body early.
    pub fn parse_data(&mut self, data: &str) {
        let mut rest = data;
        let mut last_key: Option<String> = None;

        while !rest.is_empty() {
            let (line, tail) = match rest.find('\n') {
                Some(end) => rest.split_at(end + 1),
                None => (rest, ""),
            };
            let content = line.trim_end_matches(['\r', '\n']);

            if content.is_empty() {
                self.body = tail.to_owned();
                return;
            }

            if content.starts_with([' ', '\t']) {
                if let Some(value) = last_key.as_ref().and_then(|k| self.headers.get_mut(k)) {
                    value.push(' ');
                    value.push_str(content.trim());
                    rest = tail;
                    continue;
                }
            } else if let Some((key, value)) = content.split_once(':') {
                self.headers.insert(key.to_owned(), value.trim().to_owned());
                last_key = Some(key.to_owned());
                rest = tail;
                continue;
            }

            self.body = rest.to_owned();
            return;
        }
    }
}

/// The wire form sent by RETR: headers, a blank line, then the body
impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in LEADING_HEADERS {
            if let Some(value) = self.headers.get(key) {
                write!(f, "{key}: {value}\r\n")?;
            }
        }
        for (key, value) in &self.headers {
            if !LEADING_HEADERS.contains(&key.as_str()) {
                write!(f, "{key}: {value}\r\n")?;
            }
        }
        write!(f, "\r\n{}", self.body)
    }
}
