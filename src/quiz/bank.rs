//! Question banks and the question source seam
//!
//! A [`QuestionBank`] is a static, read-only table of questions keyed by
//! [`Subject`]. Rounds do not read banks directly: they go through the
//! [`QuestionSource`] trait so that a content service can stand in for the
//! embedded table.

use std::{collections::HashMap, sync::LazyLock};

use enum_map::EnumMap;
use garde::Validate;
use itertools::Itertools;
use serde::Deserialize;

use super::{question::Question, subject::Subject};
use crate::error::Error;

/// Read-only provider of questions for a subject
pub trait QuestionSource {
    /// Returns every question available for `subject`, in bank order
    fn questions(&self, subject: Subject) -> Vec<Question>;
}

impl<Q: QuestionSource + ?Sized> QuestionSource for &Q {
    fn questions(&self, subject: Subject) -> Vec<Question> {
        (**self).questions(subject)
    }
}

/// Static mapping from subject to its ordered questions
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(try_from = "HashMap<Subject, Vec<Question>>")]
pub struct QuestionBank {
    questions: EnumMap<Subject, Vec<Question>>,
}

static BUILTIN: LazyLock<QuestionBank> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../../data/questions.json"))
        .expect("embedded question bank is valid")
});

impl QuestionBank {
    /// Builds a bank after validating every question
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if any question fails validation or two
    /// questions of the bank share an identifier.
    pub fn new(entries: impl IntoIterator<Item = (Subject, Vec<Question>)>) -> Result<Self, Error> {
        let mut questions: EnumMap<Subject, Vec<Question>> = EnumMap::default();
        for (subject, mut list) in entries {
            questions[subject].append(&mut list);
        }

        for question in questions.values().flatten() {
            question.validate()?;
        }

        if let Some(duplicate) = questions
            .values()
            .flatten()
            .map(Question::id)
            .duplicates()
            .next()
        {
            return Err(Error::Config(format!("duplicate question id {duplicate}")));
        }

        Ok(Self { questions })
    }

    /// The question bank embedded in the crate
    pub fn builtin() -> &'static QuestionBank {
        &BUILTIN
    }

    /// Number of questions available for a subject
    pub fn len(&self, subject: Subject) -> usize {
        self.questions[subject].len()
    }

    /// Whether the bank has no questions at all
    pub fn is_empty(&self) -> bool {
        self.questions.values().all(Vec::is_empty)
    }
}

impl TryFrom<HashMap<Subject, Vec<Question>>> for QuestionBank {
    type Error = Error;

    fn try_from(value: HashMap<Subject, Vec<Question>>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl QuestionSource for QuestionBank {
    fn questions(&self, subject: Subject) -> Vec<Question> {
        self.questions[subject].clone()
    }
}

/// Draws the question subsequence of one round
///
/// Duplicated identifiers are dropped, the remainder is shuffled, and at
/// most `count` questions are kept. A bank smaller than `count` is used in
/// full rather than repeated.
pub fn draw(questions: Vec<Question>, count: usize, rng: &mut fastrand::Rng) -> Vec<Question> {
    let mut questions = questions
        .into_iter()
        .unique_by(Question::id)
        .collect_vec();
    rng.shuffle(&mut questions);
    questions.truncate(count);
    questions
}
