//! Presentation session
//!
//! This module defines the trait through which the round controller talks
//! to whatever renders the round: a terminal, a web socket or a test
//! recorder.

use super::{SyncMessage, UpdateMessage};

/// Trait for sending messages to the presentation layer
pub trait Tunnel {
    /// Sends an update message
    ///
    /// Update messages are sent after every transition of the round and
    /// describe only what changed.
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to send
    fn send_message(&self, message: &UpdateMessage);

    /// Sends a full state snapshot
    ///
    /// Sync messages let a presenter that (re)connects mid-round rebuild
    /// its whole view.
    ///
    /// # Arguments
    ///
    /// * `state` - The synchronization message to send
    fn send_state(&self, state: &SyncMessage);
}

impl<T: Tunnel + ?Sized> Tunnel for &T {
    fn send_message(&self, message: &UpdateMessage) {
        (**self).send_message(message);
    }

    fn send_state(&self, state: &SyncMessage) {
        (**self).send_state(state);
    }
}
