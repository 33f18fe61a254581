//! School subjects a question bank is organised by

use std::{fmt::Display, str::FromStr};

use enum_map::Enum;
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::error::Error;

/// One of the fixed subjects a room can be about
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Enum,
    Default,
    DeserializeFromStr,
    SerializeDisplay,
)]
pub enum Subject {
    /// Arithmetic, geometry and friends
    #[default]
    Mathematics,
    /// Reading, grammar and spelling
    Language,
    /// Natural sciences
    Science,
    /// History, geography and civics
    SocialStudies,
}

impl Subject {
    /// Every subject in declaration order
    pub const ALL: [Subject; 4] = [
        Subject::Mathematics,
        Subject::Language,
        Subject::Science,
        Subject::SocialStudies,
    ];

    /// Canonical kebab-case name used in configuration and messages
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mathematics => "mathematics",
            Self::Language => "language",
            Self::Science => "science",
            Self::SocialStudies => "social-studies",
        }
    }

    /// Glyph shown next to the subject name in room headers
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Mathematics => "📐",
            Self::Language => "📚",
            Self::Science => "⚗️",
            Self::SocialStudies => "🗺️",
        }
    }
}

impl Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = Error;

    /// Parses a subject from its canonical name, a snake/space variant,
    /// or the Spanish room keys (`matematicas`, `lengua`, `ciencias`, `sociales`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "mathematics" | "math" | "matematicas" | "matemáticas" => Ok(Self::Mathematics),
            "language" | "lengua" => Ok(Self::Language),
            "science" | "ciencias" => Ok(Self::Science),
            "social-studies" | "sociales" => Ok(Self::SocialStudies),
            _ => Err(Error::UnknownSubject(s.to_owned())),
        }
    }
}

/// Glyph used for a subject name that is not recognised
pub const UNKNOWN_GLYPH: &str = "📖";

/// Looks up the header glyph for a raw subject name
pub fn glyph_for(name: &str) -> &'static str {
    Subject::from_str(name).map_or(UNKNOWN_GLYPH, Subject::glyph)
}
