//! Per-question countdown
//!
//! The countdown is driven by a single repeating one-second tick; the last
//! tick is cut short so a budget of 5.5 s expires after 5.5 s. Every
//! arming mints a fresh [`TimerToken`]; a tick carrying any other token is
//! stale and has no effect, so a tick that was already in flight when the
//! question was left can never expire a later question.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::timing;

/// Interval between two ticks
pub const TICK: Duration = Duration::from_millis(timing::TICK_MILLIS);

/// Identifies one arming of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(transparent)]
pub struct TimerToken(u64);

/// Result of delivering a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The token is not the live one; nothing changed
    Stale,
    /// Time is left; the next tick should be scheduled
    Running(Duration),
    /// The countdown just reached zero and is now disarmed
    Expired,
}

/// Countdown shared by every question of a controller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Countdown {
    epoch: u64,
    live: Option<TimerToken>,
    budget: Duration,
    remaining: Duration,
}

impl Countdown {
    /// Arms the countdown with a fresh token, invalidating every earlier one
    pub fn arm(&mut self, budget: Duration) -> TimerToken {
        self.epoch += 1;
        let token = TimerToken(self.epoch);
        self.live = Some(token);
        self.budget = budget;
        self.remaining = budget;
        token
    }

    /// Disarms the countdown; ticks already scheduled become stale
    pub fn cancel(&mut self) {
        self.live = None;
    }

    /// Applies a tick and reports what the caller should do next
    pub fn tick(&mut self, token: TimerToken) -> Tick {
        if self.live != Some(token) {
            return Tick::Stale;
        }

        self.remaining = self.remaining.saturating_sub(self.next_delay());
        if self.remaining.is_zero() {
            self.live = None;
            Tick::Expired
        } else {
            Tick::Running(self.remaining)
        }
    }

    /// Delay until the next tick; the last tick is shortened to the time left
    pub fn next_delay(&self) -> Duration {
        self.remaining.min(TICK)
    }

    /// Whether a tick is expected
    pub fn is_armed(&self) -> bool {
        self.live.is_some()
    }

    /// Time left on the countdown
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Time spent since the countdown was last armed
    pub fn elapsed(&self) -> Duration {
        self.budget.saturating_sub(self.remaining)
    }
}
