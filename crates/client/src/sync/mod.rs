//! Client-side message synchronization over a poll-only transport

mod engine;

pub use engine::{SyncEngine, SyncExit};

/// Count of messages already observed in a session.
///
/// Only ever moves forward: a shorter list than the cursor (which the server
/// should never return) leaves it where it is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor(usize);

impl Cursor {
    pub fn at(position: usize) -> Self {
        Self(position)
    }

    pub fn position(&self) -> usize {
        self.0
    }

    /// The suffix of `list` past the cursor.
    pub fn unseen<'a, T>(&self, list: &'a [T]) -> &'a [T] {
        list.get(self.0..).unwrap_or(&[])
    }

    pub fn advance_to(&mut self, len: usize) {
        if len > self.0 {
            self.0 = len;
        }
    }
}
