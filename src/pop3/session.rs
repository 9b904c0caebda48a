//! POP3 session state

/// Represents the current state of a POP3 session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pop3State {
    /// Waiting for USER
    Unauthenticated,
    /// USER given, waiting for PASS
    Authenticating,
    /// PASS accepted - mailbox commands allowed
    Authenticated,
    /// QUIT received
    Closed,
}

/// Per-connection POP3 state
#[derive(Debug)]
pub struct Pop3Session {
    pub state: Pop3State,
    /// Name given by the last USER command
    pub username: Option<String>,
}

impl Default for Pop3Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Pop3Session {
    pub fn new() -> Self {
        Self {
            state: Pop3State::Unauthenticated,
            username: None,
        }
    }

    /// Credentials are only checked when PASS is accepted, never again
    pub fn is_authenticated(&self) -> bool {
        self.state == Pop3State::Authenticated
    }

    pub fn set_username(&mut self, username: String) {
        self.username = Some(username);
        self.state = Pop3State::Authenticating;
    }

    pub fn authenticate(&mut self) {
        if self.username.is_some() {
            self.state = Pop3State::Authenticated;
        }
    }

    /// Back to the values of a fresh connection
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn close(&mut self) {
        self.state = Pop3State::Closed;
    }

    pub fn is_closed(&self) -> bool {
        self.state == Pop3State::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_flow() {
        let mut session = Pop3Session::new();
        assert!(!session.is_authenticated());

        session.authenticate();
        assert!(!session.is_authenticated());

        session.set_username("bob".to_owned());
        assert_eq!(session.state, Pop3State::Authenticating);

        session.authenticate();
        assert!(session.is_authenticated());
        assert_eq!(session.username.as_deref(), Some("bob"));
    }

    #[test]
    fn test_reset() {
        let mut session = Pop3Session::new();
        session.set_username("bob".to_owned());
        session.authenticate();

        session.reset();

        assert_eq!(session.state, Pop3State::Unauthenticated);
        assert!(session.username.is_none());
    }
}
