//! Round controller
//!
//! This module drives one complete trivia round: drawing the questions,
//! running each question's countdown, scoring the local player and the
//! simulated opponents, keeping the scoreboard sorted, and finishing on a
//! final ranking. The controller is single-threaded and `&mut`-driven; it
//! is fed by three event sources:
//!
//! * [`RoundController::start`], the explicit start action
//! * [`RoundController::submit_answer`], the local player's selection
//! * [`RoundController::receive_alarm`], alarms fired by the scheduler the
//!   caller supplies
//!
//! Every outgoing change goes through a [`Tunnel`].

use std::{fmt::Debug, time::Duration};

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;
use web_time::SystemTime;

use crate::{
    TruncatedVec,
    error::Error,
    player::{Color, Id, Player, Roster},
    quiz::{
        bank::{self, QuestionSource},
        countdown::Countdown,
        multiple_choice::{self, AnswerOutcome, Choice},
        question::Question,
        subject::Subject,
    },
    room::{RoomConfig, Settings},
    scoreboard::{ScoreMessage, Scoreboard},
    session::Tunnel,
};

/// Phase of the round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No round has been started yet
    #[default]
    Idle,
    /// A question is shown and its countdown is running
    AwaitingAnswer,
    /// The answer is locked in and the outcome is shown
    Revealed,
    /// Every question has been played
    Finished,
}

/// Identifier of one played round
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct SessionId(Uuid);

/// Questions and progress of the round being played
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundSession {
    id: SessionId,
    started_at: SystemTime,
    questions: Vec<Question>,
    index: usize,
    current: multiple_choice::State,
}

impl RoundSession {
    /// Identifier of this round
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The drawn questions, in play order
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Index of the current question
    pub fn index(&self) -> usize {
        self.index
    }

    /// State of the current question
    pub fn current(&self) -> &multiple_choice::State {
        &self.current
    }
}

/// Alarm messages owned by the round itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Leaves the reveal of question `index` of round `round`
    Advance {
        /// Round counter when the alarm was scheduled
        round: u64,
        /// Question the reveal belongs to
        index: usize,
    },
}

/// How a seat is shown on the scoreboard
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Standing {
    /// Display name
    pub name: String,
    /// Display tag
    pub tag: String,
    /// Avatar glyph
    pub avatar: String,
    /// Seat color
    pub color: Color,
    /// Correct answers so far
    pub score: u64,
    /// Whether this is the local user
    pub is_local: bool,
}

/// One row of the final ranking
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Place in the ranking (0-indexed)
    pub position: usize,
    /// The seat and its final score
    #[serde(flatten)]
    pub standing: Standing,
    /// Number of questions played in the round
    pub total_questions: usize,
}

/// Current and previous standings for display
#[derive(Debug, Serialize, Clone)]
pub struct ScoreboardMessage {
    /// Standings after the last reveal
    pub current: TruncatedVec<Standing>,
    /// Standings before the last reveal
    pub prior: TruncatedVec<Standing>,
}

/// Final ranking and statistics of a finished round
#[serde_with::serde_as]
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone)]
pub struct SummaryMessage {
    /// Round that finished
    pub session: SessionId,
    /// Subject that was played
    pub subject: Subject,
    /// First place, if any seat played
    pub winner: Option<Standing>,
    /// One-line result, such as "Mateo wins with 4 points"
    pub headline: String,
    /// Every seat, best first
    pub results: Vec<Placement>,
    /// For each question, (seats that answered correctly, seats that did not)
    pub stats: Vec<(usize, usize)>,
    /// Points the local player earned on each question
    pub points: Vec<u64>,
    /// Wall-clock duration of the round
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub elapsed: Duration,
}

/// Update messages about the round as a whole
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// Standings after a reveal
    Scoreboard {
        /// Current and prior standings
        scoreboard: ScoreboardMessage,
        /// Score of the local player
        score: Option<ScoreMessage>,
    },
    /// Final ranking
    Summary(SummaryMessage),
}

/// Sync messages about the round as a whole
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone)]
pub enum SyncMessage {
    /// Seats waiting for the round to start
    Lobby(TruncatedVec<Standing>),
    /// Standings while a question is being played
    Scoreboard {
        /// Index of the current question
        index: usize,
        /// Number of questions in the round
        count: usize,
        /// Current and prior standings
        scoreboard: ScoreboardMessage,
        /// Score of the local player
        score: Option<ScoreMessage>,
    },
    /// Final ranking
    Summary(SummaryMessage),
}

/// Drives trivia rounds for one room
pub struct RoundController {
    config: RoomConfig,
    settings: Settings,
    roster: Roster,
    scoreboard: Scoreboard,
    countdown: Countdown,
    session: Option<RoundSession>,
    phase: Phase,
    round: u64,
    rng: fastrand::Rng,
}

impl Debug for RoundController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundController")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("round", &self.round)
            .finish_non_exhaustive()
    }
}

// Convenience methods
impl RoundController {
    fn opponents(&self) -> Vec<Id> {
        self.roster
            .players()
            .iter()
            .filter(|player| !player.is_local())
            .map(Player::id)
            .collect_vec()
    }

    fn standing(&self, id: Id, score: u64) -> Standing {
        match self.roster.get(id) {
            Some(player) => Standing {
                name: player.name().to_owned(),
                tag: player.tag().to_owned(),
                avatar: player.avatar().to_owned(),
                color: player.color(),
                score,
                is_local: player.is_local(),
            },
            None => Standing {
                name: "Unknown".to_owned(),
                tag: String::new(),
                avatar: crate::player::AVATARS[0].to_owned(),
                color: Color::for_seat(0),
                score,
                is_local: false,
            },
        }
    }

    fn scoreboard_message(&self) -> ScoreboardMessage {
        let [current, prior] = self.scoreboard.last_two_standings();

        ScoreboardMessage {
            current: current.map(|(id, score)| self.standing(id, score)),
            prior: prior.map(|(id, score)| self.standing(id, score)),
        }
    }

    fn lobby(&self) -> TruncatedVec<Standing> {
        TruncatedVec::new(
            self.roster
                .players()
                .iter()
                .map(|player| self.standing(player.id(), player.score())),
            crate::constants::scoreboard::DISPLAY_LIMIT,
            self.roster.len(),
        )
    }

    fn summary_message(&self) -> Option<SummaryMessage> {
        let session = self.session.as_ref()?;
        let total_questions = session.questions.len();

        let results = self
            .scoreboard
            .standings()
            .iter()
            .enumerate()
            .map(|(position, (id, score))| Placement {
                position,
                standing: self.standing(*id, *score),
                total_questions,
            })
            .collect_vec();

        let winner = results.first().map(|placement| placement.standing.clone());
        let headline = match &winner {
            Some(winner) => format!(
                "{} wins with {}",
                winner.name,
                pluralizer::pluralize("point", winner.score as isize, true)
            ),
            None => "Nobody played".to_owned(),
        };

        Some(SummaryMessage {
            session: session.id,
            subject: self.config.subject,
            winner,
            headline,
            results,
            stats: self.scoreboard.question_stats(),
            points: self
                .roster
                .local()
                .map(|local| self.scoreboard.player_summary(local.id()))
                .unwrap_or_default(),
            elapsed: session.started_at.elapsed().unwrap_or_default(),
        })
    }
}

impl RoundController {
    /// Creates a controller for a room and its seated roster
    ///
    /// # Errors
    ///
    /// * `Error::Config` - The room or the settings fail validation
    /// * `Error::RoomFull` - The roster has more seats than the room allows
    /// * `Error::NoLocalPlayer` - No seat belongs to the local user
    pub fn new(config: RoomConfig, settings: Settings, roster: Roster) -> Result<Self, Error> {
        config.validate()?;
        settings.validate()?;
        roster.check_capacity(&config)?;
        if roster.local().is_none() {
            return Err(Error::NoLocalPlayer);
        }

        let scoreboard = Scoreboard::new(roster.players().iter().map(Player::id));

        Ok(Self {
            config,
            settings,
            roster,
            scoreboard,
            countdown: Countdown::default(),
            session: None,
            phase: Phase::Idle,
            round: 0,
            rng: fastrand::Rng::new(),
        })
    }

    /// Seats the local user, fills the room with opponents and creates the
    /// controller
    ///
    /// # Errors
    ///
    /// * `Error::Name` - The local name was rejected
    /// * any error of [`RoundController::new`]
    pub fn for_room(
        local_name: &str,
        local_avatar: &str,
        config: RoomConfig,
        settings: Settings,
    ) -> Result<Self, Error> {
        let mut rng = fastrand::Rng::new();
        let roster = Roster::for_room(
            local_name,
            local_avatar,
            &config,
            settings.bot_names,
            &mut rng,
        )?;
        Ok(Self::new(config, settings, roster)?.with_rng(rng))
    }

    /// Replaces the random source, making draws and opponents reproducible
    #[must_use]
    pub fn with_rng(mut self, rng: fastrand::Rng) -> Self {
        self.rng = rng;
        self
    }

    /// Starts a round, or a new round after the previous one finished
    ///
    /// Draws and shuffles the questions, resets every score and arms the
    /// countdown of the first question. Ignored while a round is under way.
    ///
    /// # Errors
    ///
    /// * `Error::EmptyBank` - The source has no question for the subject;
    ///   the controller stays in its current phase
    ///
    /// # Type Parameters
    ///
    /// * `Q` - Source of questions
    /// * `T` - Type implementing the Tunnel trait for the presentation layer
    /// * `S` - Function type for scheduling alarm messages
    pub fn start<Q: QuestionSource, T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        source: &Q,
        schedule_message: S,
        tunnel: &T,
    ) -> Result<(), Error> {
        if !matches!(self.phase, Phase::Idle | Phase::Finished) {
            tracing::trace!(phase = ?self.phase, "start ignored while a round is under way");
            return Ok(());
        }

        let subject = self.config.subject;
        let questions = bank::draw(
            source.questions(subject),
            self.config.total_questions,
            &mut self.rng,
        );
        let Some(first) = questions.first().cloned() else {
            return Err(Error::EmptyBank(subject));
        };
        if questions.len() < self.config.total_questions {
            tracing::debug!(
                %subject,
                requested = self.config.total_questions,
                available = questions.len(),
                "bank smaller than requested, using all of it"
            );
        }

        for player in self.roster.players_mut() {
            player.reset_score();
        }
        self.scoreboard = Scoreboard::new(self.roster.players().iter().map(Player::id));
        self.round += 1;

        let count = questions.len();
        let mut current = multiple_choice::State::new(first, subject, self.config.time_limit);
        current.play(&mut self.countdown, tunnel, schedule_message, 0, count);

        let id = SessionId(Uuid::new_v4());
        self.session = Some(RoundSession {
            id,
            started_at: SystemTime::now(),
            questions,
            index: 0,
            current,
        });
        self.phase = Phase::AwaitingAnswer;

        tracing::info!(
            session = %id,
            %subject,
            questions = count,
            seats = self.roster.len(),
            "round started"
        );

        Ok(())
    }

    /// Submits the local player's answer for the current question
    ///
    /// Ignored unless a question is open, and ignored for an index that
    /// names no option.
    ///
    /// # Type Parameters
    ///
    /// * `T` - Type implementing the Tunnel trait for the presentation layer
    /// * `S` - Function type for scheduling alarm messages
    pub fn submit_answer<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        index: usize,
        schedule_message: S,
        tunnel: &T,
    ) {
        if self.phase != Phase::AwaitingAnswer {
            tracing::trace!(index, phase = ?self.phase, "answer ignored");
            return;
        }
        let Some(session) = &self.session else {
            return;
        };
        if !session.current.question().has_option(index) {
            tracing::debug!(index, "answer ignored, no such option");
            return;
        }

        self.lock_in(Choice::Picked(index), schedule_message, tunnel);
    }

    /// Handles a scheduled alarm
    ///
    /// Alarms that belong to a question or a reveal the round has already
    /// left are dropped.
    ///
    /// # Type Parameters
    ///
    /// * `T` - Type implementing the Tunnel trait for the presentation layer
    /// * `S` - Function type for scheduling alarm messages
    pub fn receive_alarm<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        message: &crate::AlarmMessage,
        mut schedule_message: S,
        tunnel: &T,
    ) {
        match message {
            crate::AlarmMessage::MultipleChoice(alarm) => {
                if self.phase != Phase::AwaitingAnswer {
                    tracing::trace!(?alarm, phase = ?self.phase, "stale tick ignored");
                    return;
                }
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                if let Some(choice) = session.current.receive_alarm(
                    &mut self.countdown,
                    tunnel,
                    &mut schedule_message,
                    alarm,
                ) {
                    self.lock_in(choice, schedule_message, tunnel);
                }
            }
            crate::AlarmMessage::Game(AlarmMessage::Advance { round, index }) => {
                let current = self.session.as_ref().map(|session| session.index);
                if self.phase == Phase::Revealed
                    && *round == self.round
                    && current == Some(*index)
                {
                    self.advance(schedule_message, tunnel);
                } else {
                    tracing::trace!(round, index, "stale advance ignored");
                }
            }
        }
    }

    fn lock_in<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        choice: Choice,
        mut schedule_message: S,
        tunnel: &T,
    ) {
        let opponents = self.opponents();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.current.lock_in(
            choice,
            &mut self.countdown,
            &opponents,
            self.settings.bot_accuracy,
            &mut self.rng,
        ) {
            tracing::trace!(?choice, "duplicate answer ignored");
            return;
        }

        self.phase = Phase::Revealed;
        let index = session.index;
        let current = &session.current;
        let local_correct = current.outcome().is_some_and(|outcome| outcome.correct);

        let scores = self
            .roster
            .players()
            .iter()
            .map(|player| {
                let correct = if player.is_local() {
                    local_correct
                } else {
                    current.opponent_correct(player.id())
                };
                (player.id(), u64::from(correct))
            })
            .collect_vec();

        for (player, (_, points)) in self.roster.players_mut().iter_mut().zip(&scores) {
            if *points > 0 {
                player.award_point();
            }
        }
        self.scoreboard.add_scores(&scores);

        current.send_answer_result(tunnel);
        tunnel.send_message(
            &UpdateMessage::Scoreboard {
                scoreboard: self.scoreboard_message(),
                score: self.local_score(),
            }
            .into(),
        );

        tracing::debug!(index, local_correct, "question revealed");

        schedule_message(
            AlarmMessage::Advance {
                round: self.round,
                index,
            }
            .into(),
            self.settings.reveal_delay,
        );
    }

    fn advance<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        schedule_message: S,
        tunnel: &T,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let next = session.index + 1;
        let Some(question) = session.questions.get(next).cloned() else {
            self.finish(tunnel);
            return;
        };

        let count = session.questions.len();
        session.index = next;
        session.current =
            multiple_choice::State::new(question, self.config.subject, self.config.time_limit);
        session
            .current
            .play(&mut self.countdown, tunnel, schedule_message, next, count);
        self.phase = Phase::AwaitingAnswer;

        tracing::debug!(index = next, count, "next question");
    }

    fn finish<T: Tunnel>(&mut self, tunnel: &T) {
        self.phase = Phase::Finished;
        self.countdown.cancel();

        if let Some(summary) = self.summary_message() {
            tracing::info!(
                session = %summary.session,
                winner = summary.winner.as_ref().map(|winner| winner.name.as_str()),
                "round finished"
            );
            tunnel.send_message(&UpdateMessage::Summary(summary).into());
        }
    }

    /// Snapshot of the round for a presenter that (re)connects
    pub fn state_message(&self) -> crate::SyncMessage {
        match (self.phase, &self.session) {
            (Phase::AwaitingAnswer | Phase::Revealed, Some(session)) => session
                .current
                .state_message(&self.countdown, session.index, session.questions.len())
                .into(),
            (Phase::Finished, Some(_)) => match self.summary_message() {
                Some(summary) => SyncMessage::Summary(summary).into(),
                None => SyncMessage::Lobby(self.lobby()).into(),
            },
            _ => SyncMessage::Lobby(self.lobby()).into(),
        }
    }

    /// Sends every snapshot a (re)connecting presenter needs
    pub fn update_session<T: Tunnel>(&self, tunnel: &T) {
        tunnel.send_state(&self.state_message());

        if let (Phase::AwaitingAnswer | Phase::Revealed, Some(session)) =
            (self.phase, &self.session)
        {
            tunnel.send_state(
                &SyncMessage::Scoreboard {
                    index: session.index,
                    count: session.questions.len(),
                    scoreboard: self.scoreboard_message(),
                    score: self.local_score(),
                }
                .into(),
            );
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Room the controller plays
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Simulation settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Seats in seat order
    pub fn players(&self) -> &[Player] {
        self.roster.players()
    }

    /// Seats in scoreboard order, best first
    pub fn standings(&self) -> Vec<&Player> {
        self.scoreboard
            .standings()
            .iter()
            .filter_map(|(id, _)| self.roster.get(*id))
            .collect_vec()
    }

    /// Points history and standings of the current round
    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// The round being played, or the last one played
    pub fn session(&self) -> Option<&RoundSession> {
        self.session.as_ref()
    }

    /// Current question while a question is open or revealed
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::AwaitingAnswer | Phase::Revealed => self
                .session
                .as_ref()
                .map(|session| session.current.question()),
            Phase::Idle | Phase::Finished => None,
        }
    }

    /// Time left on the current question
    pub fn time_remaining(&self) -> Duration {
        match self.phase {
            Phase::AwaitingAnswer => self.countdown.remaining(),
            _ => Duration::ZERO,
        }
    }

    /// Outcome of the local player on the current question, once revealed
    pub fn last_outcome(&self) -> Option<&AnswerOutcome> {
        match self.phase {
            Phase::Revealed => self
                .session
                .as_ref()
                .and_then(|session| session.current.outcome()),
            _ => None,
        }
    }

    /// Score and position of the local player
    pub fn local_score(&self) -> Option<ScoreMessage> {
        self.scoreboard.score(self.roster.local()?.id())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::{
        cmp::Reverse,
        collections::{HashSet, VecDeque},
        sync::{Arc, Mutex},
    };

    use super::*;
    use crate::{
        quiz::{bank::QuestionBank, countdown::TICK, multiple_choice::SlideState},
        room::GameMode,
    };

    #[derive(Debug, Clone, Default)]
    struct MockTunnel {
        messages: Arc<Mutex<VecDeque<crate::UpdateMessage>>>,
        states: Arc<Mutex<VecDeque<crate::SyncMessage>>>,
    }

    impl Tunnel for MockTunnel {
        fn send_message(&self, message: &crate::UpdateMessage) {
            self.messages.lock().unwrap().push_back(message.clone());
        }

        fn send_state(&self, state: &crate::SyncMessage) {
            self.states.lock().unwrap().push_back(state.clone());
        }
    }

    impl MockTunnel {
        fn drain(&self) -> Vec<crate::UpdateMessage> {
            self.messages.lock().unwrap().drain(..).collect()
        }

        fn summaries(&self) -> Vec<SummaryMessage> {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .filter_map(|message| match message {
                    crate::UpdateMessage::Game(UpdateMessage::Summary(summary)) => {
                        Some(summary.clone())
                    }
                    _ => None,
                })
                .collect()
        }
    }

    type Alarms = Vec<(crate::AlarmMessage, Duration)>;

    fn bank(count: u32) -> QuestionBank {
        QuestionBank::new([(
            Subject::Mathematics,
            (1..=count)
                .map(|id| {
                    Question::new(
                        id,
                        format!("{id} + {id}?"),
                        ["0", "1", "2", "3"],
                        (id % 4) as usize,
                        "",
                    )
                })
                .collect(),
        )])
        .unwrap()
    }

    fn controller(total_questions: usize, opponents: usize, bot_accuracy: f64) -> RoundController {
        let names = ["Valentina", "Mateo", "Camila", "Santiago", "Lucia", "Diego"];
        let mut rng = fastrand::Rng::with_seed(17);
        let roster = Roster::from_seats(
            names
                .iter()
                .take(opponents + 1)
                .enumerate()
                .map(|(seat, name)| (name.to_string(), "👾".to_string(), seat == 0)),
            &mut rng,
        )
        .unwrap();

        let config = RoomConfig {
            subject: Subject::Mathematics,
            max_players: 6,
            time_limit: Duration::from_secs(30),
            total_questions,
            game_mode: GameMode::Versus,
            ..RoomConfig::default()
        };
        let settings = Settings {
            bot_accuracy,
            ..Settings::default()
        };

        RoundController::new(config, settings, roster)
            .unwrap()
            .with_rng(rng)
    }

    fn fire_last(controller: &mut RoundController, alarms: &mut Alarms, tunnel: &MockTunnel) {
        let (alarm, _) = alarms.pop().unwrap();
        alarms.clear();
        controller.receive_alarm(&alarm, |a, d| alarms.push((a, d)), tunnel);
    }

    fn answer_correctly(controller: &mut RoundController, alarms: &mut Alarms, tunnel: &MockTunnel) {
        let correct = controller.current_question().unwrap().correct_index();
        controller.submit_answer(correct, |a, d| alarms.push((a, d)), tunnel);
    }

    fn assert_sorted_by_score_then_seat(controller: &RoundController) {
        let seat_of = |id: Id| {
            controller
                .players()
                .iter()
                .position(|player| player.id() == id)
                .unwrap()
        };
        let standings = controller.scoreboard().standings().to_vec();
        let mut expected = standings.clone();
        expected.sort_by_key(|(id, score)| (Reverse(*score), seat_of(*id)));
        assert_eq!(standings, expected);
    }

    #[test]
    fn test_start_announces_first_question() {
        let mut controller = controller(5, 2, 0.6);
        let tunnel = MockTunnel::default();
        let mut alarms = Alarms::new();

        controller
            .start(&bank(5), |a, d| alarms.push((a, d)), &tunnel)
            .unwrap();

        assert_eq!(controller.phase(), Phase::AwaitingAnswer);
        assert_eq!(controller.time_remaining(), Duration::from_secs(30));
        assert!(controller.current_question().is_some());
        assert!(controller.last_outcome().is_none());
        assert!(matches!(
            alarms.as_slice(),
            [(crate::AlarmMessage::MultipleChoice(_), delay)] if *delay == TICK
        ));
        assert!(matches!(
            tunnel.drain().as_slice(),
            [crate::UpdateMessage::MultipleChoice(
                multiple_choice::UpdateMessage::QuestionAnnouncement { index: 0, count: 5, .. }
            )]
        ));
    }

    #[test]
    fn test_start_with_empty_bank_fails() {
        let mut controller = controller(5, 1, 0.6);
        let tunnel = MockTunnel::default();

        let result = controller.start(&QuestionBank::default(), |_, _| (), &tunnel);

        assert_eq!(result, Err(Error::EmptyBank(Subject::Mathematics)));
        assert_eq!(controller.phase(), Phase::Idle);
        assert!(tunnel.drain().is_empty());
    }

    #[test]
    fn test_start_while_running_is_ignored() {
        let mut controller = controller(3, 1, 0.6);
        let tunnel = MockTunnel::default();
        controller.start(&bank(5), |_, _| (), &tunnel).unwrap();
        let session = controller.session().unwrap().id();
        tunnel.drain();

        controller.start(&bank(5), |_, _| (), &tunnel).unwrap();

        assert_eq!(controller.session().unwrap().id(), session);
        assert!(tunnel.drain().is_empty());
    }

    #[test]
    fn test_full_round_plays_every_question_once() {
        let mut controller = controller(5, 2, 0.6);
        let tunnel = MockTunnel::default();
        let mut alarms = Alarms::new();

        controller
            .start(&bank(5), |a, d| alarms.push((a, d)), &tunnel)
            .unwrap();

        let mut played = Vec::new();
        while controller.phase() == Phase::AwaitingAnswer {
            played.push(controller.current_question().unwrap().id());
            answer_correctly(&mut controller, &mut alarms, &tunnel);
            assert_eq!(controller.phase(), Phase::Revealed);
            assert_sorted_by_score_then_seat(&controller);
            fire_last(&mut controller, &mut alarms, &tunnel);
        }

        assert_eq!(controller.phase(), Phase::Finished);
        assert_eq!(played.len(), 5);
        assert_eq!(played.iter().collect::<HashSet<_>>().len(), 5);
        assert!(controller.current_question().is_none());

        let local = controller.players().iter().find(|p| p.is_local()).unwrap();
        assert_eq!(local.score(), 5);
        for bot in controller.players().iter().filter(|p| !p.is_local()) {
            assert!(bot.score() <= played.len() as u64);
        }

        let summaries = tunnel.summaries();
        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.results.len(), 3);
        assert!(
            summary
                .results
                .windows(2)
                .all(|pair| pair[0].standing.score >= pair[1].standing.score)
        );
        assert!(summary.results.iter().all(|r| r.total_questions == 5));
        assert_eq!(summary.winner.as_ref().unwrap().name, "Valentina");
        assert_eq!(summary.points, vec![1; 5]);
        assert_eq!(summary.stats.len(), 5);
        assert_eq!(summary.headline, "Valentina wins with 5 points");
    }

    #[test]
    fn test_bank_smaller_than_total_is_used_in_full() {
        let mut controller = controller(10, 0, 0.6);
        let tunnel = MockTunnel::default();

        controller.start(&bank(4), |_, _| (), &tunnel).unwrap();

        let ids = controller
            .session()
            .unwrap()
            .questions()
            .iter()
            .map(Question::id)
            .collect::<HashSet<_>>();
        assert_eq!(ids.len(), 4);
        assert_eq!(controller.session().unwrap().questions().len(), 4);
    }

    #[test]
    fn test_local_correct_with_two_bots() {
        let mut controller = controller(5, 2, 0.6);
        let tunnel = MockTunnel::default();
        let mut alarms = Alarms::new();
        controller
            .start(&bank(5), |a, d| alarms.push((a, d)), &tunnel)
            .unwrap();

        answer_correctly(&mut controller, &mut alarms, &tunnel);

        for player in controller.players() {
            if player.is_local() {
                assert_eq!(player.score(), 1);
            } else {
                assert!(player.score() <= 1);
            }
        }
        assert!(controller.last_outcome().unwrap().correct);
        assert_eq!(controller.local_score().unwrap().points, 1);
    }

    #[test]
    fn test_countdown_times_out_exactly_once() {
        let mut controller = controller(2, 1, 0.6);
        let tunnel = MockTunnel::default();
        let mut alarms = Alarms::new();
        controller
            .start(&bank(5), |a, d| alarms.push((a, d)), &tunnel)
            .unwrap();

        let (tick, _) = alarms.pop().unwrap();
        for _ in 0..29 {
            let (next, _) = {
                controller.receive_alarm(&tick, |a, d| alarms.push((a, d)), &tunnel);
                alarms.pop().unwrap()
            };
            assert!(matches!(next, crate::AlarmMessage::MultipleChoice(_)));
            assert_eq!(controller.phase(), Phase::AwaitingAnswer);
        }
        assert_eq!(controller.time_remaining(), Duration::from_secs(1));

        controller.receive_alarm(&tick, |a, d| alarms.push((a, d)), &tunnel);
        assert_eq!(controller.phase(), Phase::Revealed);
        assert!(matches!(
            alarms.as_slice(),
            [(crate::AlarmMessage::Game(AlarmMessage::Advance { index: 0, .. }), _)]
        ));

        let outcome = controller.last_outcome().unwrap();
        assert_eq!(outcome.choice, Choice::TimedOut);
        assert!(!outcome.correct);
        let local = controller.players().iter().find(|p| p.is_local()).unwrap();
        assert_eq!(local.score(), 0);

        alarms.clear();
        controller.receive_alarm(&tick, |a, d| alarms.push((a, d)), &tunnel);
        assert!(alarms.is_empty());
        assert_eq!(controller.phase(), Phase::Revealed);
    }

    #[test]
    fn test_second_submission_has_no_effect() {
        let mut controller = controller(3, 1, 0.6);
        let tunnel = MockTunnel::default();
        let mut alarms = Alarms::new();
        controller
            .start(&bank(5), |a, d| alarms.push((a, d)), &tunnel)
            .unwrap();

        let correct = controller.current_question().unwrap().correct_index();
        let wrong = (correct + 1) % 4;
        controller.submit_answer(wrong, |a, d| alarms.push((a, d)), &tunnel);
        let standings = controller.scoreboard().standings().to_vec();
        let outcome = controller.last_outcome().cloned();
        tunnel.drain();
        alarms.clear();

        controller.submit_answer(correct, |a, d| alarms.push((a, d)), &tunnel);

        assert_eq!(controller.scoreboard().standings(), standings.as_slice());
        assert_eq!(controller.last_outcome().cloned(), outcome);
        assert!(alarms.is_empty());
        assert!(tunnel.drain().is_empty());
    }

    #[test]
    fn test_out_of_range_answer_is_ignored() {
        let mut controller = controller(3, 1, 0.6);
        let tunnel = MockTunnel::default();
        controller.start(&bank(5), |_, _| (), &tunnel).unwrap();
        tunnel.drain();

        controller.submit_answer(4, |_, _| (), &tunnel);

        assert_eq!(controller.phase(), Phase::AwaitingAnswer);
        assert!(tunnel.drain().is_empty());
    }

    #[test]
    fn test_tick_in_flight_after_answer_is_dropped() {
        let mut controller = controller(3, 1, 0.6);
        let tunnel = MockTunnel::default();
        let mut alarms = Alarms::new();
        controller
            .start(&bank(5), |a, d| alarms.push((a, d)), &tunnel)
            .unwrap();
        let (tick, _) = alarms.pop().unwrap();

        answer_correctly(&mut controller, &mut alarms, &tunnel);
        fire_last(&mut controller, &mut alarms, &tunnel);
        assert_eq!(controller.phase(), Phase::AwaitingAnswer);
        assert_eq!(controller.session().unwrap().index(), 1);
        alarms.clear();
        tunnel.drain();

        controller.receive_alarm(&tick, |a, d| alarms.push((a, d)), &tunnel);

        assert_eq!(controller.time_remaining(), Duration::from_secs(30));
        assert!(alarms.is_empty());
        assert!(tunnel.drain().is_empty());
        assert_eq!(
            controller.session().unwrap().current().state(),
            SlideState::Answers
        );
    }

    #[test]
    fn test_stale_advance_is_dropped() {
        let mut controller = controller(3, 1, 0.6);
        let tunnel = MockTunnel::default();
        controller.start(&bank(5), |_, _| (), &tunnel).unwrap();
        let mut alarms = Alarms::new();
        answer_correctly(&mut controller, &mut alarms, &tunnel);

        for stale in [
            AlarmMessage::Advance { round: 0, index: 0 },
            AlarmMessage::Advance { round: 1, index: 2 },
        ] {
            controller.receive_alarm(&stale.into(), |_, _| (), &tunnel);
            assert_eq!(controller.phase(), Phase::Revealed);
        }
    }

    #[test]
    fn test_restart_draws_fresh_round_and_resets_scores() {
        let mut controller = controller(2, 1, 1.0);
        let tunnel = MockTunnel::default();
        let mut alarms = Alarms::new();
        controller
            .start(&bank(5), |a, d| alarms.push((a, d)), &tunnel)
            .unwrap();
        while controller.phase() == Phase::AwaitingAnswer {
            answer_correctly(&mut controller, &mut alarms, &tunnel);
            fire_last(&mut controller, &mut alarms, &tunnel);
        }
        let first_session = controller.session().unwrap().id();
        assert!(controller.players().iter().all(|p| p.score() == 2));

        controller.start(&bank(5), |_, _| (), &tunnel).unwrap();

        assert_eq!(controller.phase(), Phase::AwaitingAnswer);
        assert_ne!(controller.session().unwrap().id(), first_session);
        assert!(controller.players().iter().all(|p| p.score() == 0));
        assert_eq!(controller.scoreboard().question_count(), 0);
    }

    #[test]
    fn test_new_rejects_invalid_setup() {
        let mut rng = fastrand::Rng::with_seed(1);
        let roster = Roster::from_seats(
            [
                ("Valentina".to_string(), "👾".to_string(), true),
                ("Mateo".to_string(), "🤖".to_string(), false),
            ],
            &mut rng,
        )
        .unwrap();

        let invalid = RoomConfig {
            total_questions: 0,
            ..RoomConfig::default()
        };
        assert!(matches!(
            RoundController::new(invalid, Settings::default(), roster.clone()),
            Err(Error::Config(_))
        ));

        let small = RoomConfig {
            max_players: 1,
            ..RoomConfig::default()
        };
        assert!(matches!(
            RoundController::new(small, Settings::default(), roster),
            Err(Error::RoomFull { seats: 2, cap: 1 })
        ));
    }

    #[test]
    fn test_for_room_seats_opponents() {
        let controller = RoundController::for_room(
            "Valentina",
            "🚀",
            RoomConfig {
                max_players: 3,
                ..RoomConfig::default()
            },
            Settings::default(),
        )
        .unwrap();

        assert_eq!(controller.players().len(), 3);
        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(controller.standings().len(), 3);
    }

    #[test]
    fn test_state_message_follows_phase() {
        let mut controller = controller(1, 1, 0.6);
        let tunnel = MockTunnel::default();
        let mut alarms = Alarms::new();

        assert!(matches!(
            controller.state_message(),
            crate::SyncMessage::Game(SyncMessage::Lobby(_))
        ));

        controller
            .start(&bank(5), |a, d| alarms.push((a, d)), &tunnel)
            .unwrap();
        assert!(matches!(
            controller.state_message(),
            crate::SyncMessage::MultipleChoice(
                multiple_choice::SyncMessage::QuestionAnnouncement { .. }
            )
        ));

        controller.update_session(&tunnel);
        assert_eq!(tunnel.states.lock().unwrap().len(), 2);

        answer_correctly(&mut controller, &mut alarms, &tunnel);
        assert!(matches!(
            controller.state_message(),
            crate::SyncMessage::MultipleChoice(multiple_choice::SyncMessage::AnswerResult { .. })
        ));

        fire_last(&mut controller, &mut alarms, &tunnel);
        assert_eq!(controller.phase(), Phase::Finished);
        assert!(matches!(
            controller.state_message(),
            crate::SyncMessage::Game(SyncMessage::Summary(_))
        ));
    }

    #[test]
    fn test_messages_serialize() {
        let mut controller = controller(1, 1, 0.6);
        let tunnel = MockTunnel::default();
        controller.start(&bank(5), |_, _| (), &tunnel).unwrap();

        for message in tunnel.drain() {
            let json = message.to_message();
            assert!(json.contains("QuestionAnnouncement"));
        }
        assert!(controller.state_message().to_message().contains("duration"));
    }
}
