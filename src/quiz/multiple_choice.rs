//! Multiple choice question flow
//!
//! This module runs a single question of a round: it announces the question,
//! drives the countdown ticks, locks in the local player's answer (or the
//! timeout), simulates every opponent's answer, and reveals the outcome.
//! The lock-in is the single convergence point of the submission path and
//! the expiry path; only the first caller is recorded.

use std::time::Duration;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::{
    countdown::{Countdown, Tick, TimerToken},
    question::Question,
    subject::Subject,
};
use crate::{player::Id, session::Tunnel};

/// Phase of the current question
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlideState {
    /// Created but not yet announced
    #[default]
    Unstarted,
    /// Question shown, countdown running
    Answers,
    /// Answer locked in, outcome shown
    AnswersResults,
}

/// What a seat answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Choice {
    /// An option index
    Picked(usize),
    /// No answer before the countdown reached zero
    TimedOut,
}

impl Choice {
    /// Option index, if one was picked
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Picked(index) => Some(index),
            Self::TimedOut => None,
        }
    }
}

/// Recorded result of the local player on one question
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    /// What was answered
    pub choice: Choice,
    /// Whether the answer was correct; always false for a timeout
    pub correct: bool,
    /// Index of the correct option
    pub correct_index: usize,
    /// Explanation of the correct answer
    pub explanation: String,
    /// Time taken before the answer was locked in
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub elapsed: Duration,
}

impl AnswerOutcome {
    fn new(question: &Question, choice: Choice, elapsed: Duration) -> Self {
        Self {
            choice,
            correct: choice.index() == Some(question.correct_index()),
            correct_index: question.correct_index(),
            explanation: question.explanation().to_owned(),
            elapsed,
        }
    }
}

/// Update messages sent while a question is being played
#[serde_with::serde_as]
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// Announces a new question and starts its countdown
    QuestionAnnouncement {
        /// Index of the question in the round (0-based)
        index: usize,
        /// Number of questions in the round
        count: usize,
        /// Subject of the round
        subject: Subject,
        /// Question text
        prompt: String,
        /// Answer options in display order
        options: Vec<String>,
        /// Time budget for answering
        #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
        duration: Duration,
    },
    /// One countdown tick
    TimeRemaining {
        /// Time left for the current question
        #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
        remaining: Duration,
    },
    /// Reveals the correct answer and the local player's outcome
    AnswerResult {
        /// Outcome of the local player
        outcome: AnswerOutcome,
        /// For each option, how many seats picked it
        counts: Vec<usize>,
    },
}

/// Alarm messages for the countdown of a question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// One countdown tick, valid only for the arming that minted `token`
    Tick {
        /// Arming this tick belongs to
        token: TimerToken,
    },
}

/// Snapshot of the current question for a presenter that (re)connects
#[serde_with::serde_as]
#[skip_serializing_none]
#[derive(Debug, Serialize, Clone)]
pub enum SyncMessage {
    /// The question is open for answers
    QuestionAnnouncement {
        /// Index of the question in the round (0-based)
        index: usize,
        /// Number of questions in the round
        count: usize,
        /// Subject of the round
        subject: Subject,
        /// Question text
        prompt: String,
        /// Answer options in display order
        options: Vec<String>,
        /// Time left for answering
        #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
        duration: Duration,
    },
    /// The answer has been revealed
    AnswerResult {
        /// Index of the question in the round (0-based)
        index: usize,
        /// Number of questions in the round
        count: usize,
        /// Subject of the round
        subject: Subject,
        /// Question text
        prompt: String,
        /// Answer options in display order
        options: Vec<String>,
        /// Outcome of the local player
        outcome: Option<AnswerOutcome>,
        /// For each option, how many seats picked it
        counts: Vec<usize>,
    },
}

/// Picks the option a simulated opponent answers
///
/// The correct option is picked with probability `accuracy`; otherwise one
/// of the wrong options is picked uniformly.
pub fn simulate_answer(question: &Question, accuracy: f64, rng: &mut fastrand::Rng) -> usize {
    let correct = question.correct_index();
    if rng.f64() < accuracy {
        return correct;
    }

    let wrong = (0..question.options().len())
        .filter(|index| *index != correct)
        .collect_vec();
    rng.choice(wrong).unwrap_or(correct)
}

/// Runtime state of one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    question: Question,
    subject: Subject,
    time_limit: Duration,

    // Runtime State
    outcome: Option<AnswerOutcome>,
    opponent_answers: Vec<(Id, usize)>,
    state: SlideState,
}

impl State {
    /// Creates the state of a question that has not been announced yet
    pub fn new(question: Question, subject: Subject, time_limit: Duration) -> Self {
        Self {
            question,
            subject,
            time_limit,
            outcome: None,
            opponent_answers: Vec::new(),
            state: SlideState::Unstarted,
        }
    }

    fn change_state(&mut self, before: SlideState, after: SlideState) -> bool {
        if self.state == before {
            self.state = after;

            true
        } else {
            false
        }
    }

    /// Current phase of the question
    pub fn state(&self) -> SlideState {
        self.state
    }

    /// The question being played
    pub fn question(&self) -> &Question {
        &self.question
    }

    /// Outcome of the local player, once locked in
    pub fn outcome(&self) -> Option<&AnswerOutcome> {
        self.outcome.as_ref()
    }

    /// Option picked by every opponent, once locked in
    pub fn opponent_answers(&self) -> &[(Id, usize)] {
        &self.opponent_answers
    }

    /// Announces the question and arms the countdown
    ///
    /// # Type Parameters
    ///
    /// * `T` - Type implementing the Tunnel trait for the presentation layer
    /// * `S` - Function type for scheduling alarm messages
    pub fn play<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        countdown: &mut Countdown,
        tunnel: &T,
        mut schedule_message: S,
        index: usize,
        count: usize,
    ) {
        if self.change_state(SlideState::Unstarted, SlideState::Answers) {
            let token = countdown.arm(self.time_limit);

            tunnel.send_message(
                &UpdateMessage::QuestionAnnouncement {
                    index,
                    count,
                    subject: self.subject,
                    prompt: self.question.prompt().to_owned(),
                    options: self.question.options().to_vec(),
                    duration: self.time_limit,
                }
                .into(),
            );

            schedule_message(AlarmMessage::Tick { token }.into(), countdown.next_delay());
        }
    }

    /// Records the first answer for this question
    ///
    /// The countdown is cancelled before anything else happens, then the
    /// local outcome is computed and every opponent answers independently.
    ///
    /// # Returns
    ///
    /// `true` if this call recorded the answer, `false` if an answer was
    /// already recorded or the question is not open
    pub fn lock_in(
        &mut self,
        choice: Choice,
        countdown: &mut Countdown,
        opponents: &[Id],
        accuracy: f64,
        rng: &mut fastrand::Rng,
    ) -> bool {
        if !self.change_state(SlideState::Answers, SlideState::AnswersResults) {
            return false;
        }

        countdown.cancel();

        let outcome = AnswerOutcome::new(&self.question, choice, countdown.elapsed());
        tracing::debug!(
            question = %self.question.id(),
            ?choice,
            correct = outcome.correct,
            "answer locked in"
        );
        self.outcome = Some(outcome);

        self.opponent_answers = opponents
            .iter()
            .map(|id| (*id, simulate_answer(&self.question, accuracy, rng)))
            .collect();

        true
    }

    /// Whether an opponent answered correctly
    pub fn opponent_correct(&self, id: Id) -> bool {
        self.opponent_answers
            .iter()
            .any(|(opponent, answer)| *opponent == id && *answer == self.question.correct_index())
    }

    fn answer_counts(&self) -> Vec<usize> {
        let counts = self
            .outcome
            .iter()
            .filter_map(|outcome| outcome.choice.index())
            .chain(self.opponent_answers.iter().map(|(_, answer)| *answer))
            .counts();

        (0..self.question.options().len())
            .map(|index| counts.get(&index).copied().unwrap_or(0))
            .collect_vec()
    }

    /// Sends the revealed outcome to the presentation layer
    pub fn send_answer_result<T: Tunnel>(&self, tunnel: &T) {
        if let Some(outcome) = &self.outcome {
            tunnel.send_message(
                &UpdateMessage::AnswerResult {
                    outcome: outcome.clone(),
                    counts: self.answer_counts(),
                }
                .into(),
            );
        }
    }

    /// Handles a countdown tick
    ///
    /// # Returns
    ///
    /// `Some(Choice::TimedOut)` when this tick expired the countdown; the
    /// caller locks it in like any other answer
    pub fn receive_alarm<T: Tunnel, S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        countdown: &mut Countdown,
        tunnel: &T,
        mut schedule_message: S,
        message: &AlarmMessage,
    ) -> Option<Choice> {
        let AlarmMessage::Tick { token } = message;

        if self.state != SlideState::Answers {
            tracing::trace!(%token, "tick after lock-in ignored");
            return None;
        }

        match countdown.tick(*token) {
            Tick::Stale => {
                tracing::trace!(%token, "stale tick ignored");
                None
            }
            Tick::Running(remaining) => {
                tunnel.send_message(&UpdateMessage::TimeRemaining { remaining }.into());
                schedule_message(
                    AlarmMessage::Tick { token: *token }.into(),
                    countdown.next_delay(),
                );
                None
            }
            Tick::Expired => {
                tunnel.send_message(
                    &UpdateMessage::TimeRemaining {
                        remaining: Duration::ZERO,
                    }
                    .into(),
                );
                Some(Choice::TimedOut)
            }
        }
    }

    /// Snapshot of this question for a presenter that (re)connects
    pub fn state_message(&self, countdown: &Countdown, index: usize, count: usize) -> SyncMessage {
        match self.state {
            SlideState::Unstarted | SlideState::Answers => SyncMessage::QuestionAnnouncement {
                index,
                count,
                subject: self.subject,
                prompt: self.question.prompt().to_owned(),
                options: self.question.options().to_vec(),
                duration: if self.state == SlideState::Unstarted {
                    self.time_limit
                } else {
                    countdown.remaining()
                },
            },
            SlideState::AnswersResults => SyncMessage::AnswerResult {
                index,
                count,
                subject: self.subject,
                prompt: self.question.prompt().to_owned(),
                options: self.question.options().to_vec(),
                outcome: self.outcome.clone(),
                counts: self.answer_counts(),
            },
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    use super::*;

    #[derive(Debug, Clone, Default)]
    struct MockTunnel {
        messages: Arc<Mutex<VecDeque<crate::UpdateMessage>>>,
    }

    impl Tunnel for MockTunnel {
        fn send_message(&self, message: &crate::UpdateMessage) {
            self.messages.lock().unwrap().push_back(message.clone());
        }

        fn send_state(&self, _state: &crate::SyncMessage) {}
    }

    impl MockTunnel {
        fn drain(&self) -> Vec<crate::UpdateMessage> {
            self.messages.lock().unwrap().drain(..).collect()
        }
    }

    fn question() -> Question {
        Question::new(
            1,
            "What is 7 x 8?",
            ["54", "56", "58", "64"],
            1,
            "7 x 8 = 56",
        )
    }

    fn started(countdown: &mut Countdown, tunnel: &MockTunnel) -> (State, TimerToken) {
        let mut state = State::new(question(), Subject::Mathematics, Duration::from_secs(3));
        let mut alarms = Vec::new();
        state.play(countdown, tunnel, |alarm, _| alarms.push(alarm), 0, 5);

        let Some(crate::AlarmMessage::MultipleChoice(AlarmMessage::Tick { token })) =
            alarms.pop()
        else {
            panic!("expected a tick to be scheduled");
        };
        (state, token)
    }

    #[test]
    fn test_play_announces_and_schedules_tick() {
        let tunnel = MockTunnel::default();
        let mut countdown = Countdown::default();
        let (state, _) = started(&mut countdown, &tunnel);

        assert_eq!(state.state(), SlideState::Answers);
        assert!(countdown.is_armed());
        assert!(matches!(
            tunnel.drain().as_slice(),
            [crate::UpdateMessage::MultipleChoice(
                UpdateMessage::QuestionAnnouncement { index: 0, count: 5, .. }
            )]
        ));
    }

    #[test]
    fn test_correct_answer() {
        let tunnel = MockTunnel::default();
        let mut countdown = Countdown::default();
        let (mut state, _) = started(&mut countdown, &tunnel);
        let mut rng = fastrand::Rng::with_seed(1);

        assert!(state.lock_in(Choice::Picked(1), &mut countdown, &[], 0.6, &mut rng));

        let outcome = state.outcome().unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.correct_index, 1);
        assert_eq!(outcome.explanation, "7 x 8 = 56");
        assert!(!countdown.is_armed());
    }

    #[test]
    fn test_second_lock_in_is_ignored() {
        let tunnel = MockTunnel::default();
        let mut countdown = Countdown::default();
        let (mut state, _) = started(&mut countdown, &tunnel);
        let mut rng = fastrand::Rng::with_seed(1);

        assert!(state.lock_in(Choice::Picked(0), &mut countdown, &[], 0.6, &mut rng));
        assert!(!state.lock_in(Choice::Picked(1), &mut countdown, &[], 0.6, &mut rng));
        assert!(!state.lock_in(Choice::TimedOut, &mut countdown, &[], 0.6, &mut rng));

        assert_eq!(state.outcome().unwrap().choice, Choice::Picked(0));
        assert!(!state.outcome().unwrap().correct);
    }

    #[test]
    fn test_lock_in_before_play_is_ignored() {
        let mut state = State::new(question(), Subject::Mathematics, Duration::from_secs(3));
        let mut countdown = Countdown::default();
        let mut rng = fastrand::Rng::with_seed(1);

        assert!(!state.lock_in(Choice::Picked(1), &mut countdown, &[], 0.6, &mut rng));
        assert!(state.outcome().is_none());
    }

    #[test]
    fn test_expiry_yields_timeout_once() {
        let tunnel = MockTunnel::default();
        let mut countdown = Countdown::default();
        let (mut state, token) = started(&mut countdown, &tunnel);
        let mut scheduled = 0;

        let message = AlarmMessage::Tick { token };
        assert_eq!(
            state.receive_alarm(&mut countdown, &tunnel, |_, _| scheduled += 1, &message),
            None
        );
        assert_eq!(
            state.receive_alarm(&mut countdown, &tunnel, |_, _| scheduled += 1, &message),
            None
        );
        assert_eq!(
            state.receive_alarm(&mut countdown, &tunnel, |_, _| scheduled += 1, &message),
            Some(Choice::TimedOut)
        );
        assert_eq!(scheduled, 2);
        assert_eq!(
            state.receive_alarm(&mut countdown, &tunnel, |_, _| scheduled += 1, &message),
            None
        );

        let mut rng = fastrand::Rng::with_seed(1);
        assert!(state.lock_in(Choice::TimedOut, &mut countdown, &[], 0.6, &mut rng));
        let outcome = state.outcome().unwrap();
        assert_eq!(outcome.choice, Choice::TimedOut);
        assert!(!outcome.correct);
        assert_eq!(outcome.elapsed, Duration::from_secs(3));
    }

    #[test]
    fn test_fractional_time_limit_schedules_short_last_tick() {
        let tunnel = MockTunnel::default();
        let mut countdown = Countdown::default();
        let mut state = State::new(
            question(),
            Subject::Mathematics,
            Duration::from_millis(2500),
        );
        let mut scheduled = Vec::new();
        state.play(&mut countdown, &tunnel, |alarm, delay| scheduled.push((alarm, delay)), 0, 5);
        let Some((crate::AlarmMessage::MultipleChoice(message), delay)) = scheduled.pop() else {
            panic!("expected a tick to be scheduled");
        };

        let mut delays = vec![delay];
        let mut expired = None;
        for _ in 0..10 {
            expired = state.receive_alarm(
                &mut countdown,
                &tunnel,
                |_, delay| delays.push(delay),
                &message,
            );
            if expired.is_some() {
                break;
            }
        }

        assert_eq!(expired, Some(Choice::TimedOut));
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(1),
                Duration::from_millis(500)
            ]
        );
        assert_eq!(delays.iter().sum::<Duration>(), Duration::from_millis(2500));
    }

    #[test]
    fn test_tick_after_answer_is_ignored() {
        let tunnel = MockTunnel::default();
        let mut countdown = Countdown::default();
        let (mut state, token) = started(&mut countdown, &tunnel);
        let mut rng = fastrand::Rng::with_seed(1);
        state.lock_in(Choice::Picked(1), &mut countdown, &[], 0.6, &mut rng);
        tunnel.drain();

        let mut scheduled = false;
        assert_eq!(
            state.receive_alarm(
                &mut countdown,
                &tunnel,
                |_, _| scheduled = true,
                &AlarmMessage::Tick { token }
            ),
            None
        );
        assert!(!scheduled);
        assert!(tunnel.drain().is_empty());
    }

    #[test]
    fn test_opponents_answer_and_counts() {
        let tunnel = MockTunnel::default();
        let mut countdown = Countdown::default();
        let (mut state, _) = started(&mut countdown, &tunnel);
        let opponents = [Id::new(), Id::new(), Id::new()];
        let mut rng = fastrand::Rng::with_seed(9);

        state.lock_in(Choice::Picked(1), &mut countdown, &opponents, 1.0, &mut rng);

        assert_eq!(state.opponent_answers().len(), 3);
        assert!(opponents.iter().all(|id| state.opponent_correct(*id)));
        assert_eq!(state.answer_counts(), vec![0, 4, 0, 0]);

        tunnel.drain();
        state.send_answer_result(&tunnel);
        assert!(matches!(
            tunnel.drain().as_slice(),
            [crate::UpdateMessage::MultipleChoice(UpdateMessage::AnswerResult { .. })]
        ));
    }

    #[test]
    fn test_simulated_answer_accuracy() {
        let question = question();
        let mut rng = fastrand::Rng::with_seed(5);

        for _ in 0..50 {
            assert_eq!(simulate_answer(&question, 1.0, &mut rng), 1);
            let wrong = simulate_answer(&question, 0.0, &mut rng);
            assert_ne!(wrong, 1);
            assert!(question.has_option(wrong));
        }
    }

    #[test]
    fn test_state_message_follows_phase() {
        let tunnel = MockTunnel::default();
        let mut countdown = Countdown::default();
        let (mut state, token) = started(&mut countdown, &tunnel);
        state.receive_alarm(&mut countdown, &tunnel, |_, _| (), &AlarmMessage::Tick { token });

        assert!(matches!(
            state.state_message(&countdown, 0, 5),
            SyncMessage::QuestionAnnouncement { duration, .. } if duration == Duration::from_secs(2)
        ));

        let mut rng = fastrand::Rng::with_seed(1);
        state.lock_in(Choice::Picked(3), &mut countdown, &[], 0.6, &mut rng);
        assert!(matches!(
            state.state_message(&countdown, 0, 5),
            SyncMessage::AnswerResult { outcome: Some(_), .. }
        ));
    }
}
