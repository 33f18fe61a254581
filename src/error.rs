//! Errors raised while configuring or starting a round

use thiserror::Error;

use crate::quiz::subject::Subject;

/// Configuration errors that keep a round from starting
///
/// None of these are raised once a round is under way: double submissions
/// and stale timer alarms are ignored instead of reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The room configuration failed validation
    #[error("invalid room configuration: {0}")]
    Config(String),
    /// The requested subject is not one of the known subjects
    #[error("unknown subject `{0}`")]
    UnknownSubject(String),
    /// The question source has no questions for the subject
    #[error("no questions available for {0}")]
    EmptyBank(Subject),
    /// More seats were requested than the room allows
    #[error("room holds {cap} players but {seats} were seated")]
    RoomFull {
        /// Number of seats requested
        seats: usize,
        /// Room player cap
        cap: usize,
    },
    /// The roster has no local player
    #[error("roster has no local player")]
    NoLocalPlayer,
    /// A display name was rejected
    #[error(transparent)]
    Name(#[from] crate::names::Error),
}

impl From<garde::Report> for Error {
    fn from(report: garde::Report) -> Self {
        Self::Config(report.to_string())
    }
}
