use log::debug;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Result of trying to pair a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pairing {
    /// The caller was matched with `opponent`, who had been waiting.
    Matched { opponent: String },
    /// No opponent available. `already_queued` is set when the only waiting
    /// entry was the caller's own.
    Waiting { already_queued: bool },
}

/// FIFO of usernames waiting for an opponent.
///
/// A username is queued at most once. Pairing is eager, so apart from
/// restored entries the queue holds at most one distinct user; it grows on
/// demand and never blocks.
#[derive(Default)]
pub struct MatchQueue {
    entries: Mutex<VecDeque<String>>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes the longest-waiting user other than `caller`, or queues the caller.
    ///
    /// When a match is found the caller's own entry, if any, is removed too.
    pub fn pair_next(&self, caller: &str) -> Pairing {
        let mut entries = self.entries();

        if let Some(pos) = entries.iter().position(|waiting| waiting != caller) {
            let opponent = entries.remove(pos).unwrap_or_default();
            entries.retain(|waiting| waiting != caller);
            debug!("Paired {} with {} ({} still waiting)", caller, opponent, entries.len());
            return Pairing::Matched { opponent };
        }

        if entries.iter().any(|waiting| waiting == caller) {
            return Pairing::Waiting { already_queued: true };
        }
        entries.push_back(caller.to_string());
        debug!("{} is waiting ({} in queue)", caller, entries.len());
        Pairing::Waiting { already_queued: false }
    }

    /// Puts a user back at the head of the queue, e.g. after a pairing that
    /// could not be completed.
    pub fn restore_front(&self, username: &str) {
        let mut entries = self.entries();
        if !entries.iter().any(|waiting| waiting == username) {
            entries.push_front(username.to_string());
        }
    }

    /// Removes every entry of `username`, keeping the order of the others.
    /// Returns how many entries were removed.
    pub fn leave(&self, username: &str) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        let kept: VecDeque<String> = entries.drain(..).filter(|waiting| waiting != username).collect();
        *entries = kept;
        before - entries.len()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.entries().iter().any(|waiting| waiting == username)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Waiting usernames, head first.
    pub fn waiting(&self) -> Vec<String> {
        self.entries().iter().cloned().collect()
    }
}
