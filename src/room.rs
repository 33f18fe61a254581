//! Room metadata and simulation settings
//!
//! A room tells the round controller what to play: subject, grade, seat
//! cap, time budget per question, number of questions and game mode.
//! [`Settings`] carries the knobs of the simulation itself, such as how
//! often bots answer correctly.

use std::time::Duration;

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{bots, room, timing},
    names::NameStyle,
    quiz::subject::Subject,
};

type ValidationResult = garde::Result;

/// Validates that a duration falls within `[MIN_MILLIS, MAX_MILLIS]`
fn validate_duration<const MIN_MILLIS: u64, const MAX_MILLIS: u64>(
    field: &'static str,
    val: &Duration,
) -> ValidationResult {
    let millis = u64::try_from(val.as_millis()).unwrap_or(u64::MAX);
    if (MIN_MILLIS..=MAX_MILLIS).contains(&millis) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "{field} is outside of the bounds [{MIN_MILLIS}ms,{MAX_MILLIS}ms]",
        )))
    }
}

fn validate_time_limit(val: &Duration) -> ValidationResult {
    validate_duration::<{ timing::MIN_TIME_LIMIT * 1000 }, { timing::MAX_TIME_LIMIT * 1000 }>(
        "time_limit",
        val,
    )
}

fn validate_reveal_delay(val: &Duration) -> ValidationResult {
    validate_duration::<0, { timing::MAX_REVEAL_DELAY_MILLIS }>("reveal_delay", val)
}

/// How seats are filled when the round starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    /// The local player against simulated opponents filling every seat
    #[default]
    Versus,
    /// The local player alone
    Solo,
}

impl GameMode {
    /// Number of seats occupied for a room with `max_players` seats
    pub fn seat_count(self, max_players: usize) -> usize {
        match self {
            Self::Versus => max_players,
            Self::Solo => 1,
        }
    }
}

/// Round configuration supplied by the room
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RoomConfig {
    /// Subject the questions are drawn from
    #[garde(skip)]
    pub subject: Subject,
    /// School grade the room targets
    #[garde(range(min = room::MIN_GRADE_LEVEL, max = room::MAX_GRADE_LEVEL))]
    pub grade_level: u8,
    /// Seat cap, local player included
    #[garde(range(min = room::MIN_PLAYERS, max = room::MAX_PLAYERS))]
    pub max_players: usize,
    /// Time budget for each question
    #[garde(custom(|v, _| validate_time_limit(v)))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub time_limit: Duration,
    /// Number of questions in a round
    #[garde(range(min = room::MIN_TOTAL_QUESTIONS, max = room::MAX_TOTAL_QUESTIONS))]
    pub total_questions: usize,
    /// How seats are filled
    #[garde(skip)]
    pub game_mode: GameMode,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            subject: Subject::default(),
            grade_level: room::DEFAULT_GRADE_LEVEL,
            max_players: room::DEFAULT_MAX_PLAYERS,
            time_limit: Duration::from_secs(timing::DEFAULT_TIME_LIMIT),
            total_questions: room::DEFAULT_TOTAL_QUESTIONS,
            game_mode: GameMode::default(),
        }
    }
}

impl RoomConfig {
    /// Sets the subject from its name, keeping the default for unknown names
    #[must_use]
    pub fn with_subject_name(mut self, name: &str) -> Self {
        match name.parse() {
            Ok(subject) => self.subject = subject,
            Err(error) => {
                tracing::warn!(%error, fallback = %Subject::default(), "unknown subject");
                self.subject = Subject::default();
            }
        }
        self
    }

    /// Replaces every invalid field by its default
    ///
    /// A round is never started from an invalid room; callers that receive
    /// configuration from outside use this to fall back instead of failing.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if let Err(report) = self.validate() {
            tracing::warn!(%report, "room configuration invalid, using defaults for bad fields");

            let defaults = Self::default();
            if !(room::MIN_GRADE_LEVEL..=room::MAX_GRADE_LEVEL).contains(&self.grade_level) {
                self.grade_level = defaults.grade_level;
            }
            if !(room::MIN_PLAYERS..=room::MAX_PLAYERS).contains(&self.max_players) {
                self.max_players = defaults.max_players;
            }
            if validate_time_limit(&self.time_limit).is_err() {
                self.time_limit = defaults.time_limit;
            }
            if !(room::MIN_TOTAL_QUESTIONS..=room::MAX_TOTAL_QUESTIONS)
                .contains(&self.total_questions)
            {
                self.total_questions = defaults.total_questions;
            }
        }
        self
    }

    /// Number of occupied seats for this room
    pub fn seat_count(&self) -> usize {
        self.game_mode.seat_count(self.max_players)
    }
}

/// Knobs of the simulation that do not come from the room
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    /// Probability that a bot answers any question correctly
    #[garde(range(min = 0.0, max = 1.0))]
    pub bot_accuracy: f64,
    /// How long the answer feedback stays up before the next question
    #[garde(custom(|v, _| validate_reveal_delay(v)))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub reveal_delay: Duration,
    /// Style of generated bot names
    #[garde(dive)]
    pub bot_names: NameStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_accuracy: bots::DEFAULT_ACCURACY,
            reveal_delay: Duration::from_millis(timing::DEFAULT_REVEAL_DELAY_MILLIS),
            bot_names: NameStyle::default(),
        }
    }
}
