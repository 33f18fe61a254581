//! Scoreboard and final results
//!
//! This module keeps the points every seat earned on each question of a
//! round, the current and previous standings, and the end-of-round
//! statistics. Standings are sorted by descending score; ties keep seat
//! order.

use std::{cmp::Reverse, collections::HashMap};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{TruncatedVec, constants, player::Id};

/// Per-question statistics and per-seat breakdowns of a finished round
#[derive(Debug, Clone)]
struct FinalSummary {
    /// For each question, (seats that answered correctly, seats that did not)
    stats: Vec<(usize, usize)>,
    /// For each seat, the points earned on each question
    mapping: HashMap<Id, Vec<u64>>,
}

#[derive(Deserialize)]
struct ScoreboardSerde {
    seats: Vec<Id>,
    points_earned: Vec<Vec<(Id, u64)>>,
}

/// Tracks points earned across the questions of a round
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(from = "ScoreboardSerde")]
pub struct Scoreboard {
    /// Seats in seat order
    seats: Vec<Id>,
    /// Points earned by every seat, one entry per revealed question
    points_earned: Vec<Vec<(Id, u64)>>,

    #[serde(skip)]
    previous_standings: Vec<(Id, u64)>,
    #[serde(skip)]
    standings: Vec<(Id, u64)>,
    #[serde(skip)]
    score_and_position: HashMap<Id, (u64, usize)>,
    #[serde(skip)]
    final_summary: once_cell_serde::sync::OnceCell<FinalSummary>,
}

impl From<ScoreboardSerde> for Scoreboard {
    fn from(serde: ScoreboardSerde) -> Self {
        let mut scoreboard = Scoreboard::new(serde.seats);
        for scores in serde.points_earned {
            scoreboard.add_scores(&scores);
        }
        scoreboard
    }
}

/// Score of one seat together with its place in the standings
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ScoreMessage {
    /// Total points earned by the seat
    pub points: u64,
    /// Position in the standings (0-indexed)
    pub position: usize,
}

impl Scoreboard {
    /// Creates an empty scoreboard for the given seats, in seat order
    pub fn new(seats: impl IntoIterator<Item = Id>) -> Self {
        let seats = seats.into_iter().collect_vec();
        let standings = seats.iter().map(|id| (*id, 0)).collect_vec();
        let score_and_position = standings
            .iter()
            .enumerate()
            .map(|(position, (id, points))| (*id, (*points, position)))
            .collect();

        Self {
            seats,
            points_earned: Vec::new(),
            previous_standings: standings.clone(),
            standings,
            score_and_position,
            final_summary: once_cell_serde::sync::OnceCell::new(),
        }
    }

    /// Records the points of one revealed question and re-sorts the standings
    ///
    /// Seats missing from `scores` earn nothing on this question. Identifiers
    /// that do not belong to a seat are dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trivia::player::Id;
    /// use trivia::scoreboard::Scoreboard;
    ///
    /// let (ana, bruno) = (Id::new(), Id::new());
    /// let mut scoreboard = Scoreboard::new([ana, bruno]);
    /// scoreboard.add_scores(&[(bruno, 1)]);
    ///
    /// assert_eq!(scoreboard.standings(), &[(bruno, 1), (ana, 0)]);
    /// ```
    pub fn add_scores(&mut self, scores: &[(Id, u64)]) {
        let earned: HashMap<Id, u64> = scores.iter().copied().collect();

        let round = self
            .seats
            .iter()
            .map(|id| (*id, earned.get(id).copied().unwrap_or(0)))
            .collect_vec();

        let standings = round
            .iter()
            .map(|(id, points)| {
                let total = self
                    .score_and_position
                    .get(id)
                    .map_or(0, |(total, _)| *total);
                (*id, total + points)
            })
            .sorted_by_key(|(_, total)| Reverse(*total))
            .collect_vec();

        self.score_and_position = standings
            .iter()
            .enumerate()
            .map(|(position, (id, points))| (*id, (*points, position)))
            .collect();

        self.points_earned.push(round);
        self.previous_standings = std::mem::replace(&mut self.standings, standings);
        self.final_summary = once_cell_serde::sync::OnceCell::new();
    }

    /// Current standings, best first
    pub fn standings(&self) -> &[(Id, u64)] {
        &self.standings
    }

    /// Standings before the last revealed question, best first
    pub fn previous_standings(&self) -> &[(Id, u64)] {
        &self.previous_standings
    }

    /// Current and previous standings, truncated for display
    pub fn last_two_standings(&self) -> [TruncatedVec<(Id, u64)>; 2] {
        const LIMIT: usize = constants::scoreboard::DISPLAY_LIMIT;

        [
            TruncatedVec::new(
                self.standings.iter().copied(),
                LIMIT,
                self.standings.len(),
            ),
            TruncatedVec::new(
                self.previous_standings.iter().copied(),
                LIMIT,
                self.previous_standings.len(),
            ),
        ]
    }

    /// Number of questions recorded so far
    pub fn question_count(&self) -> usize {
        self.points_earned.len()
    }

    /// Seat in first place, if any seat exists
    pub fn winner(&self) -> Option<Id> {
        self.standings.first().map(|(id, _)| *id)
    }

    /// Current score and position of a seat
    pub fn score(&self, id: Id) -> Option<ScoreMessage> {
        let (points, position) = self.score_and_position.get(&id)?;
        Some(ScoreMessage {
            points: *points,
            position: *position,
        })
    }

    fn compute_final_summary(&self) -> FinalSummary {
        FinalSummary {
            stats: self
                .points_earned
                .iter()
                .map(|points_earned| {
                    let correct = points_earned
                        .iter()
                        .filter(|(_, earned)| *earned > 0)
                        .count();

                    (correct, points_earned.len() - correct)
                })
                .collect(),
            mapping: self
                .points_earned
                .iter()
                .flatten()
                .copied()
                .into_group_map(),
        }
    }

    fn final_summary(&self) -> &FinalSummary {
        self.final_summary
            .get_or_init(|| self.compute_final_summary())
    }

    /// For each question, how many seats answered correctly and how many did not
    pub fn question_stats(&self) -> Vec<(usize, usize)> {
        self.final_summary().stats.clone()
    }

    /// Points a seat earned on each question, in question order
    pub fn player_summary(&self, id: Id) -> Vec<u64> {
        self.final_summary()
            .mapping
            .get(&id)
            .map_or_else(|| vec![0; self.points_earned.len()], Clone::clone)
    }
}
