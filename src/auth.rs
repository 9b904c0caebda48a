//! Username and password lookup used by AUTH PLAIN and USER/PASS

use std::collections::HashMap;

use crate::error::MailError;

/// A read-only table of accounts
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    users: HashMap<String, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account, replacing any existing password for `username`
    pub fn with_user(mut self, username: &str, password: &str) -> Self {
        self.insert(username, password);
        self
    }

    pub fn insert(&mut self, username: &str, password: &str) {
        self.users.insert(username.to_owned(), password.to_owned());
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Check a username/password pair.
    ///
    /// An unknown user and a wrong password produce the same error.
    pub fn verify(&self, username: &str, password: &str) -> Result<(), MailError> {
        match self.users.get(username) {
            Some(expected) if expected == password => Ok(()),
            _ => Err(MailError::Authentication),
        }
    }
}
