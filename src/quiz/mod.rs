//! Questions, subjects and the flow of a single question
//!
//! This module groups the static content of a round (subjects, questions
//! and banks) with the per-question runtime: the countdown and the
//! multiple choice state machine.

pub mod bank;
pub mod countdown;
pub mod multiple_choice;
pub mod question;
pub mod subject;
