//! Multiple-choice question records
//!
//! A question carries exactly four answer options and the index of the
//! correct one. Questions are immutable once loaded into a bank.

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::constants::question::{
    MAX_CORRECT_INDEX, MAX_EXPLANATION_LENGTH, MAX_OPTION_LENGTH, MAX_PROMPT_LENGTH, OPTION_COUNT,
};

/// Identifier of a question, unique within its bank
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct QuestionId(u32);

/// A single multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Question {
    /// Bank-unique identifier
    #[garde(skip)]
    id: QuestionId,
    /// Text shown to players
    #[garde(length(min = 1, max = MAX_PROMPT_LENGTH))]
    prompt: String,
    /// Answer options in display order
    #[garde(length(equal = OPTION_COUNT), inner(length(min = 1, max = MAX_OPTION_LENGTH)))]
    options: Vec<String>,
    /// Index into `options` of the correct answer
    #[garde(range(max = MAX_CORRECT_INDEX))]
    correct: usize,
    /// Explanation revealed together with the correct answer
    #[garde(length(max = MAX_EXPLANATION_LENGTH))]
    #[serde(default)]
    explanation: String,
}

impl Question {
    /// Creates a question from its parts
    ///
    /// The result is not validated; banks validate every question they load.
    pub fn new(
        id: u32,
        prompt: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct: usize,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            id: QuestionId(id),
            prompt: prompt.into(),
            options: options.into_iter().map(Into::into).collect(),
            correct,
            explanation: explanation.into(),
        }
    }

    /// Bank-unique identifier
    pub fn id(&self) -> QuestionId {
        self.id
    }

    /// Text shown to players
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Answer options in display order
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Index of the correct option
    pub fn correct_index(&self) -> usize {
        self.correct
    }

    /// Explanation revealed with the answer
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Whether `index` names one of this question's options
    pub fn has_option(&self, index: usize) -> bool {
        index < self.options.len()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn sample() -> Question {
        Question::new(
            7,
            "How many sides does a hexagon have?",
            ["5", "6", "7", "8"],
            1,
            "Hexa means six.",
        )
    }

    #[test]
    fn test_valid_question() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_wrong_option_count() {
        let question = Question::new(1, "Pick one", ["a", "b", "c"], 0, "");
        assert!(question.validate().is_err());
    }

    #[test]
    fn test_correct_index_out_of_range() {
        let question = Question::new(1, "Pick one", ["a", "b", "c", "d"], OPTION_COUNT, "");
        assert!(question.validate().is_err());
    }

    #[test]
    fn test_empty_prompt() {
        let question = Question::new(1, "", ["a", "b", "c", "d"], 0, "");
        assert!(question.validate().is_err());
    }

    #[test]
    fn test_option_too_long() {
        let question = Question::new(
            1,
            "Pick one",
            ["a".repeat(MAX_OPTION_LENGTH + 1), "b".into(), "c".into(), "d".into()],
            0,
            "",
        );
        assert!(question.validate().is_err());
    }

    #[test]
    fn test_has_option() {
        let question = sample();
        assert!(question.has_option(3));
        assert!(!question.has_option(4));
    }

    #[test]
    fn test_explanation_defaults_when_missing() {
        let question: Question = serde_json::from_str(
            r#"{"id": 3, "prompt": "2 + 2?", "options": ["3", "4", "5", "6"], "correct": 1}"#,
        )
        .unwrap();

        assert_eq!(question.id(), QuestionId::from(3_u32));
        assert_eq!(question.explanation(), "");
        assert!(question.validate().is_ok());
    }
}
