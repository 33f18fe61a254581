//! Configuration constants for the trivia round simulator
//!
//! This module contains the limits and defaults used throughout the crate
//! to validate room configuration, question content and player names.

/// Room configuration limits
pub mod room {
    /// Minimum number of questions in a round
    pub const MIN_TOTAL_QUESTIONS: usize = 1;
    /// Maximum number of questions in a round
    pub const MAX_TOTAL_QUESTIONS: usize = 50;
    /// Number of questions played when the room does not say otherwise
    pub const DEFAULT_TOTAL_QUESTIONS: usize = 10;
    /// Minimum seats in a room
    pub const MIN_PLAYERS: usize = 1;
    /// Maximum seats in a room
    pub const MAX_PLAYERS: usize = 8;
    /// Seats offered when the room does not say otherwise
    pub const DEFAULT_MAX_PLAYERS: usize = 4;
    /// Lowest school grade a room can target
    pub const MIN_GRADE_LEVEL: u8 = 1;
    /// Highest school grade a room can target
    pub const MAX_GRADE_LEVEL: u8 = 12;
    /// Grade used when the room does not say otherwise
    pub const DEFAULT_GRADE_LEVEL: u8 = 5;
}

/// Countdown and pacing constants
pub mod timing {
    /// Minimum time limit in seconds for answering a question
    pub const MIN_TIME_LIMIT: u64 = 5;
    /// Maximum time limit in seconds for answering a question
    pub const MAX_TIME_LIMIT: u64 = 240;
    /// Time limit in seconds when the room does not say otherwise
    pub const DEFAULT_TIME_LIMIT: u64 = 30;
    /// Interval in milliseconds between two countdown ticks
    pub const TICK_MILLIS: u64 = 1000;
    /// Milliseconds the answer feedback stays on screen before advancing
    pub const DEFAULT_REVEAL_DELAY_MILLIS: u64 = 3000;
    /// Upper bound in milliseconds for the reveal delay
    pub const MAX_REVEAL_DELAY_MILLIS: u64 = 30_000;
}

/// Question content constants
pub mod question {
    /// Number of answer options every question carries
    pub const OPTION_COUNT: usize = 4;
    /// Largest valid index of the correct option
    pub const MAX_CORRECT_INDEX: usize = OPTION_COUNT - 1;
    /// Maximum length of a question prompt in characters
    pub const MAX_PROMPT_LENGTH: usize = 300;
    /// Maximum length of a single answer option in characters
    pub const MAX_OPTION_LENGTH: usize = 120;
    /// Maximum length of the explanation shown after the reveal
    pub const MAX_EXPLANATION_LENGTH: usize = 400;
}

/// Simulated opponent constants
pub mod bots {
    /// Probability that a bot answers a question correctly
    pub const DEFAULT_ACCURACY: f64 = 0.6;
}

/// Player name constants
pub mod names {
    /// Maximum length of a display name in characters, after trimming
    pub const MAX_LENGTH: usize = 30;
    /// Smallest numeric display tag
    pub const MIN_TAG: u16 = 1000;
    /// Largest numeric display tag (exclusive)
    pub const MAX_TAG: u16 = 10_000;
}

/// Scoreboard display constants
pub mod scoreboard {
    /// Maximum number of standings sent to the presentation layer
    pub const DISPLAY_LIMIT: usize = 50;
}
