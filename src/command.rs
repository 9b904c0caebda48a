//! Command line tokenizer shared by both protocols

use crate::error::MailError;

/// A single command line split into a verb and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// The command verb, upper-cased
    pub verb: String,
    /// Remaining whitespace-separated tokens
    pub args: Vec<String>,
}

impl Command {
    /// Split a line on runs of whitespace.
    ///
    /// Unknown verbs are not rejected here; that is left to the session.
    pub fn parse(line: &str) -> Result<Self, MailError> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or(MailError::EmptyCommand)?;

        Ok(Self {
            verb: verb.to_uppercase(),
            args: parts.map(str::to_owned).collect(),
        })
    }

    /// The first argument, if any
    pub fn arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// All arguments joined back together with single spaces
    pub fn joined_args(&self) -> String {
        self.args.join(" ")
    }
}
