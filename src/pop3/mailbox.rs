//! The shared message store served over POP3

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::envelope::Envelope;
use crate::error::MailError;

/// An ordered, mutex-guarded collection of envelopes.
///
/// Message numbers are 1-based and stable: deleting a message leaves an
/// empty slot, so the messages after it keep their numbers.
#[derive(Debug, Default)]
pub struct Mailbox {
    slots: Mutex<Vec<Option<Envelope>>>,
}

impl Mailbox {
    /// Create an empty mailbox
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailbox holding three sample messages
    pub fn with_samples() -> Self {
        let mailbox = Self::new();
        for (n, to, date) in [
            (1, "agus@example.com", "2020-01-01"),
            (2, "agus@example.com", "2020-01-02"),
            (3, "acep@example.com", "2020-01-03"),
        ] {
            mailbox.append(
                Envelope::new()
                    .with_from("raden@example.com")
                    .with_recipient(to)
                    .with_header("From", "raden@example.com")
                    .with_header("To", to)
                    .with_header("Subject", &format!("Sample mail {n}"))
                    .with_header("Date", date)
                    .with_body(&format!("This is a sample mail {n}\r\n")),
            );
        }
        mailbox
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Option<Envelope>>> {
        // A panicking session cannot leave a slot half-written
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a message, returning its message number
    pub fn append(&self, envelope: Envelope) -> usize {
        let mut slots = self.lock();
        slots.push(Some(envelope));
        slots.len()
    }

    /// Number of messages not deleted
    pub fn len(&self) -> usize {
        self.lock().iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Message count and total size, as reported by STAT
    pub fn stat(&self) -> (usize, usize) {
        self.lock()
            .iter()
            .flatten()
            .fold((0, 0), |(count, size), envelope| {
                (count + 1, size + envelope.size())
            })
    }

    /// Message number and size of every message not deleted
    pub fn list(&self) -> Vec<(usize, usize)> {
        self.lock()
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|envelope| (i + 1, envelope.size())))
            .collect()
    }

    /// A copy of message `number`
    pub fn get(&self, number: usize) -> Result<Envelope, MailError> {
        let slots = self.lock();
        let index = number.checked_sub(1).ok_or(MailError::NotFound)?;
        slots
            .get(index)
            .and_then(Option::clone)
            .ok_or(MailError::NotFound)
    }

    /// Delete message `number`, leaving its slot empty
    pub fn remove(&self, number: usize) -> Result<Envelope, MailError> {
        let mut slots = self.lock();
        let index = number.checked_sub(1).ok_or(MailError::NotFound)?;
        slots
            .get_mut(index)
            .and_then(Option::take)
            .ok_or(MailError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn sized(size: usize) -> Envelope {
        Envelope::new().with_body(&"x".repeat(size))
    }

    fn mailbox_of(sizes: &[usize]) -> Mailbox {
        let mailbox = Mailbox::new();
        for &size in sizes {
            mailbox.append(sized(size));
        }
        mailbox
    }

    #[test]
    fn test_stat_and_list() {
        let mailbox = mailbox_of(&[10, 20, 30]);

        assert_eq!(mailbox.stat(), (3, 60));
        assert_eq!(mailbox.list(), vec![(1, 10), (2, 20), (3, 30)]);
    }

    #[test]
    fn test_get() {
        let mailbox = mailbox_of(&[10, 20]);

        assert_eq!(mailbox.get(2).unwrap().size(), 20);
        assert!(matches!(mailbox.get(0), Err(MailError::NotFound)));
        assert!(matches!(mailbox.get(3), Err(MailError::NotFound)));
    }

    #[test]
    fn test_remove_keeps_numbers() {
        let mailbox = mailbox_of(&[10, 20, 30]);

        assert_eq!(mailbox.remove(2).unwrap().size(), 20);

        assert_eq!(mailbox.list(), vec![(1, 10), (3, 30)]);
        assert_eq!(mailbox.stat(), (2, 40));
        assert_eq!(mailbox.len(), 2);
        assert!(matches!(mailbox.get(2), Err(MailError::NotFound)));
        assert!(matches!(mailbox.remove(2), Err(MailError::NotFound)));
        assert_eq!(mailbox.get(3).unwrap().size(), 30);
    }

    #[test]
    fn test_append_after_remove() {
        let mailbox = mailbox_of(&[10]);
        mailbox.remove(1).unwrap();
        assert!(mailbox.is_empty());

        assert_eq!(mailbox.append(sized(5)), 2);
        assert_eq!(mailbox.list(), vec![(2, 5)]);
    }

    #[test]
    fn test_samples() {
        let mailbox = Mailbox::with_samples();
        assert_eq!(mailbox.len(), 3);
        assert_eq!(mailbox.get(3).unwrap().subject(), Some("Sample mail 3"));
    }

    #[test]
    fn test_concurrent_removal() {
        let mailbox = Arc::new(mailbox_of(&[1; 64]));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let mailbox = Arc::clone(&mailbox);
                thread::spawn(move || (1..=64).filter(|&n| mailbox.remove(n).is_ok()).count())
            })
            .collect();

        let removed: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();
        assert_eq!(removed, 64);
        assert!(mailbox.is_empty());
    }
}
