//! Seats, players and rosters
//!
//! Every participant of a round occupies a seat: the local user or a
//! simulated opponent. A [`Roster`] is the ordered list of seats; seat order
//! is the tie-break of the scoreboard.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use uuid::Uuid;

use crate::{
    constants,
    error::Error,
    names::{NameStyle, Names},
    room::RoomConfig,
};

/// A unique identifier for a seat
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random seat ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Avatar glyphs offered by the character customizer
pub const AVATARS: [&str; 10] = ["👤", "👾", "🤖", "👽", "🚀", "🎮", "🏆", "⭐", "🔥", "⚡"];

/// Color a seat is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Color {
    /// `#a855f7`
    Purple,
    /// `#ec4899`
    Pink,
    /// `#22d3ee`
    Cyan,
    /// `#facc15`
    Yellow,
    /// `#4ade80`
    Green,
    /// `#fb923c`
    Orange,
    /// `#f87171`
    Red,
    /// `#60a5fa`
    Blue,
}

impl Color {
    /// Palette in seat order
    pub const PALETTE: [Color; 8] = [
        Color::Purple,
        Color::Pink,
        Color::Cyan,
        Color::Yellow,
        Color::Green,
        Color::Orange,
        Color::Red,
        Color::Blue,
    ];

    /// Color for the seat at `index`, cycling through the palette
    pub fn for_seat(index: usize) -> Self {
        Self::PALETTE[index % Self::PALETTE.len()]
    }

    /// CSS hex code
    pub fn hex(self) -> &'static str {
        match self {
            Self::Purple => "#a855f7",
            Self::Pink => "#ec4899",
            Self::Cyan => "#22d3ee",
            Self::Yellow => "#facc15",
            Self::Green => "#4ade80",
            Self::Orange => "#fb923c",
            Self::Red => "#f87171",
            Self::Blue => "#60a5fa",
        }
    }
}

/// One participant of a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    id: Id,
    name: String,
    tag: String,
    avatar: String,
    color: Color,
    score: u64,
    is_local: bool,
}

impl Player {
    fn new(
        id: Id,
        name: String,
        avatar: String,
        color: Color,
        is_local: bool,
        rng: &mut fastrand::Rng,
    ) -> Self {
        Self {
            id,
            name,
            tag: format!(
                "#{}",
                rng.u16(constants::names::MIN_TAG..constants::names::MAX_TAG)
            ),
            avatar,
            color,
            score: 0,
            is_local,
        }
    }

    /// Seat identifier
    pub fn id(&self) -> Id {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Disambiguator shown after the name, such as `#4821`
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Avatar glyph
    pub fn avatar(&self) -> &str {
        &self.avatar
    }

    /// Seat color
    pub fn color(&self) -> Color {
        self.color
    }

    /// Correct answers so far in the current round
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Whether this seat belongs to the local user
    pub fn is_local(&self) -> bool {
        self.is_local
    }

    pub(crate) fn award_point(&mut self) {
        self.score += 1;
    }

    pub(crate) fn reset_score(&mut self) {
        self.score = 0;
    }
}

/// Ordered seats of a round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    /// Seats the local user and fills the room according to its game mode
    ///
    /// # Errors
    ///
    /// * `Error::Name` - The local name was rejected
    pub fn for_room(
        local_name: &str,
        local_avatar: &str,
        config: &RoomConfig,
        bot_names: NameStyle,
        rng: &mut fastrand::Rng,
    ) -> Result<Self, Error> {
        let mut names = Names::default();

        let local_id = Id::new();
        let name = names.set_name(local_id, local_name)?;
        let mut players = vec![Player::new(
            local_id,
            name,
            local_avatar.to_owned(),
            Color::for_seat(0),
            true,
            rng,
        )];

        for seat in 1..config.seat_count() {
            let id = Id::new();
            let name = names.generate_name(id, bot_names);
            let avatar = rng.choice(AVATARS).unwrap_or(AVATARS[0]).to_owned();
            players.push(Player::new(
                id,
                name,
                avatar,
                Color::for_seat(seat),
                false,
                rng,
            ));
        }

        tracing::debug!(
            seats = players.len(),
            bots = players.len() - 1,
            "roster seated"
        );

        Ok(Self { players })
    }

    /// Builds a roster from explicit seats, in seat order
    ///
    /// # Errors
    ///
    /// * `Error::NoLocalPlayer` - No seat is marked local
    /// * `Error::Config` - More than one seat is marked local
    /// * `Error::Name` - A name is invalid or used twice
    pub fn from_seats(
        seats: impl IntoIterator<Item = (String, String, bool)>,
        rng: &mut fastrand::Rng,
    ) -> Result<Self, Error> {
        let mut names = Names::default();
        let mut players = Vec::new();
        for (index, (name, avatar, is_local)) in seats.into_iter().enumerate() {
            let id = Id::new();
            let name = names.set_name(id, &name)?;
            players.push(Player::new(
                id,
                name,
                avatar,
                Color::for_seat(index),
                is_local,
                rng,
            ));
        }

        match players.iter().filter(|player| player.is_local).count() {
            0 => return Err(Error::NoLocalPlayer),
            1 => {}
            locals => {
                return Err(Error::Config(format!(
                    "a roster seats one local player, found {locals}"
                )));
            }
        }

        Ok(Self { players })
    }

    /// Checks the roster against the room's seat cap
    ///
    /// # Errors
    ///
    /// * `Error::RoomFull` - More seats than the room allows
    pub fn check_capacity(&self, config: &RoomConfig) -> Result<(), Error> {
        if self.players.len() > config.max_players {
            return Err(Error::RoomFull {
                seats: self.players.len(),
                cap: config.max_players,
            });
        }
        Ok(())
    }

    /// Seats in seat order
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Mutable access to the seats, in seat order
    pub(crate) fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    /// Seat of the local user
    pub fn local(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_local)
    }

    /// Looks up a seat by ID
    pub fn get(&self, id: Id) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Number of seats
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the roster has no seats
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
