//! # Trivia Round Library
//!
//! This library provides the core logic of a classroom trivia game: a room
//! plays a timed sequence of multiple-choice questions against simulated
//! opponents, with a live scoreboard and a final ranking.
//!
//! The [`game::RoundController`] is the state machine of a round. It never
//! sleeps and never spawns: time enters through alarms scheduled by the
//! caller, and every change leaves through a [`session::Tunnel`]. The
//! [`runtime`] module wires both to tokio for callers that want the round
//! to run on its own.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
use derive_where::derive_where;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub mod constants;

pub mod error;
pub mod game;
pub mod names;
pub mod player;
pub mod quiz;
pub mod room;
pub mod runtime;
pub mod scoreboard;
pub mod session;

pub use error::Error;

/// Snapshots sent to a presenter that (re)connects
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum SyncMessage {
    /// Round-level snapshots
    Game(game::SyncMessage),
    /// Snapshots of the current question
    MultipleChoice(quiz::multiple_choice::SyncMessage),
}

impl SyncMessage {
    /// Converts the sync message to a JSON string
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Changes sent to the presenter after each transition
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum UpdateMessage {
    /// Round-level updates
    Game(game::UpdateMessage),
    /// Updates of the current question
    MultipleChoice(quiz::multiple_choice::UpdateMessage),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Delayed events the caller's scheduler hands back to the controller
#[derive(Debug, Clone, derive_more::From, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Round-level alarms
    Game(game::AlarmMessage),
    /// Countdown ticks
    MultipleChoice(quiz::multiple_choice::AlarmMessage),
}

/// A list cut to a display limit that remembers how long it really was
#[derive(Debug, Clone, Serialize)]
#[derive_where(Default)]
pub struct TruncatedVec<T> {
    exact_count: usize,
    items: Vec<T>,
}

impl<T: Clone> TruncatedVec<T> {
    /// Takes at most `limit` items from `list`
    pub fn new<I: Iterator<Item = T>>(list: I, limit: usize, exact_count: usize) -> Self {
        let items = list.take(limit).collect_vec();
        Self { exact_count, items }
    }

    /// Maps every kept item, preserving the exact count
    pub fn map<F, U>(self, f: F) -> TruncatedVec<U>
    where
        F: Fn(T) -> U,
    {
        TruncatedVec {
            exact_count: self.exact_count,
            items: self.items.into_iter().map(f).collect_vec(),
        }
    }

    /// Length of the list before truncation
    pub fn exact_count(&self) -> usize {
        self.exact_count
    }

    /// Items kept for display
    pub fn items(&self) -> &[T] {
        &self.items
    }
}
