//! Display name generation and validation
//!
//! This module validates the local player's chosen display name, keeps the
//! names of a roster unique, and generates names for simulated opponents.

use std::collections::{HashMap, HashSet, hash_map::Entry};

use heck::ToTitleCase;
use rustrict::CensorStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::player::Id;

/// Style of automatically generated bot names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, garde::Validate)]
pub enum NameStyle {
    /// Roman-style names (praenomen + nomen, optionally + cognomen)
    Roman(#[garde(range(min = 2, max = 3))] usize),
    /// Pet-style names (adjective + animal combinations)
    Petname(#[garde(range(min = 2, max = 3))] usize),
}

impl Default for NameStyle {
    fn default() -> Self {
        Self::Petname(2)
    }
}

impl NameStyle {
    /// Generates a random name according to this style
    ///
    /// # Returns
    ///
    /// A randomly generated, title-cased name.
    pub fn get_name(&self) -> String {
        match self {
            Self::Roman(count) => romanname::romanname(romanname::NameConfig {
                praenomen: *count > 2,
            }),
            Self::Petname(count) => petname::petname(*count as u8, " ").unwrap_or_default(),
        }
        .to_title_case()
    }
}

/// Errors that can occur while validating a display name
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The requested name is already used by another seat
    #[error("name already in-use")]
    Used,
    /// The seat already has a name
    #[error("player has an existing name")]
    Assigned,
    /// The name is empty or contains only whitespace
    #[error("name cannot be empty")]
    Empty,
    /// The name contains inappropriate content
    #[error("name is inappropriate")]
    Sinful,
    /// The name exceeds the maximum allowed length
    #[error("name is too long")]
    TooLong,
}

/// Keeps the display names of a roster unique and clean
#[derive(Debug, Default, Clone)]
pub struct Names {
    mapping: HashMap<Id, String>,
    existing: HashSet<String>,
}

impl Names {
    #[cfg(test)]
    fn get_name(&self, id: &Id) -> Option<&str> {
        self.mapping.get(id).map(String::as_str)
    }

    /// Validates and claims a name for a seat
    ///
    /// # Returns
    ///
    /// The trimmed name that was claimed.
    ///
    /// # Errors
    ///
    /// * `Error::TooLong` - Name exceeds the configured maximum length
    /// * `Error::Empty` - Name is empty after trimming whitespace
    /// * `Error::Sinful` - Name contains inappropriate content
    /// * `Error::Used` - Name is already taken by another seat
    /// * `Error::Assigned` - Seat already has a name
    pub fn set_name(&mut self, id: Id, name: &str) -> Result<String, Error> {
        let name = rustrict::trim_whitespace(name);
        if name.is_empty() {
            return Err(Error::Empty);
        }
        if name.chars().count() > crate::constants::names::MAX_LENGTH {
            return Err(Error::TooLong);
        }
        if name.is_inappropriate() {
            return Err(Error::Sinful);
        }
        if self.existing.contains(name) {
            return Err(Error::Used);
        }
        match self.mapping.entry(id) {
            Entry::Occupied(_) => Err(Error::Assigned),
            Entry::Vacant(v) => {
                v.insert(name.to_owned());
                self.existing.insert(name.to_owned());
                Ok(name.to_owned())
            }
        }
    }

    /// Claims a freshly generated name for a bot seat
    ///
    /// Generated names are retried until one passes validation.
    pub fn generate_name(&mut self, id: Id, style: NameStyle) -> String {
        loop {
            if let Ok(name) = self.set_name(id, &style.get_name()) {
                return name;
            }
        }
    }
}
