use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{AppError, AppResult};
use crate::models::domain::{Question, Quiz};

/// Lifecycle of one attempt.
///
/// `Active -> Submitting -> Completed` is the normal path and
/// `Active -> Expired` the timeout path. Nothing else is legal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    Active,
    Submitting,
    Completed,
    Expired,
}

impl AttemptStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptStatus::Completed | AttemptStatus::Expired)
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptStatus::Active => write!(f, "active"),
            AttemptStatus::Submitting => write!(f, "submitting"),
            AttemptStatus::Completed => write!(f, "completed"),
            AttemptStatus::Expired => write!(f, "expired"),
        }
    }
}

/// Result of feeding a timer signal into the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    /// This call moved the session to `Expired`; the caller owns the forced submit.
    Expired,
}

/// Result of `advance`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    Next(usize),
    /// The session entered `Submitting`; the mapping is the payload to send.
    Submit(BTreeMap<String, String>),
}

#[derive(Clone, Debug)]
pub struct AttemptSession {
    attempt_id: String,
    quiz_id: String,
    questions: Vec<Question>,
    selected_options: BTreeMap<String, String>,
    current_question_index: usize,
    elapsed_seconds: u32,
    time_limit_seconds: u32,
    remaining_seconds: Option<u32>,
    status: AttemptStatus,
}

impl AttemptSession {
    pub fn new(attempt_id: &str, quiz: &Quiz) -> AppResult<Self> {
        if attempt_id.trim().is_empty() {
            return Err(AppError::ValidationError(
                "attempt id must not be empty".to_string(),
            ));
        }
        quiz.validate()?;

        let time_limit_seconds = quiz.time_limit;
        Ok(Self {
            attempt_id: attempt_id.to_string(),
            quiz_id: quiz.id.clone(),
            questions: quiz.questions.clone(),
            selected_options: BTreeMap::new(),
            current_question_index: 0,
            elapsed_seconds: 0,
            time_limit_seconds,
            remaining_seconds: (time_limit_seconds > 0).then_some(time_limit_seconds),
            status: AttemptStatus::Active,
        })
    }

    pub fn attempt_id(&self) -> &str {
        &self.attempt_id
    }

    pub fn quiz_id(&self) -> &str {
        &self.quiz_id
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == AttemptStatus::Active
    }

    pub fn selected_options(&self) -> &BTreeMap<String, String> {
        &self.selected_options
    }

    pub fn selection_for(&self, question_id: &str) -> Option<&str> {
        self.selected_options.get(question_id).map(String::as_str)
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_question_index]
    }

    pub fn is_last_question(&self) -> bool {
        self.current_question_index + 1 == self.questions.len()
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn time_limit_seconds(&self) -> u32 {
        self.time_limit_seconds
    }

    /// `None` when the quiz has no time limit.
    pub fn remaining_seconds(&self) -> Option<u32> {
        self.remaining_seconds
    }

    fn ensure_active(&self, operation: &str) -> AppResult<()> {
        if self.status != AttemptStatus::Active {
            return Err(AppError::InvalidState(format!(
                "cannot {} attempt {} while {}",
                operation, self.attempt_id, self.status
            )));
        }
        Ok(())
    }

    pub fn select_option(&mut self, question_id: &str, option_id: &str) -> AppResult<()> {
        self.ensure_active("select an option for")?;

        let question = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| AppError::NotFound(format!("Question '{}'", question_id)))?;

        if !question.has_option(option_id) {
            return Err(AppError::NotFound(format!(
                "Option '{}' on question '{}'",
                option_id, question_id
            )));
        }

        self.selected_options
            .insert(question_id.to_string(), option_id.to_string());
        Ok(())
    }

    pub fn advance(&mut self) -> AppResult<Advance> {
        self.ensure_active("advance")?;

        let question_id = &self.questions[self.current_question_index].id;
        if !self.selected_options.contains_key(question_id) {
            return Err(AppError::MissingSelection(question_id.clone()));
        }

        if self.is_last_question() {
            self.status = AttemptStatus::Submitting;
            return Ok(Advance::Submit(self.selected_options.clone()));
        }

        self.current_question_index += 1;
        Ok(Advance::Next(self.current_question_index))
    }

    pub fn tick(&mut self) -> AppResult<Transition> {
        self.ensure_active("tick")?;

        self.elapsed_seconds += 1;
        if self.time_limit_seconds == 0 {
            return Ok(Transition::Unchanged);
        }

        let remaining = self.time_limit_seconds.saturating_sub(self.elapsed_seconds);
        self.remaining_seconds = Some(remaining);
        if remaining == 0 {
            return Ok(self.expire());
        }
        Ok(Transition::Unchanged)
    }

    pub fn reconcile_server_expiry(&mut self, expired: bool) -> AppResult<Transition> {
        self.ensure_active("reconcile server time for")?;

        if !expired {
            return Ok(Transition::Unchanged);
        }
        Ok(self.expire())
    }

    fn expire(&mut self) -> Transition {
        self.status = AttemptStatus::Expired;
        if self.time_limit_seconds > 0 {
            self.remaining_seconds = Some(0);
        }
        Transition::Expired
    }

    /// Records the server's acceptance of a normal submit.
    pub fn mark_completed(&mut self) -> AppResult<()> {
        if self.status != AttemptStatus::Submitting {
            return Err(AppError::InvalidState(format!(
                "cannot complete attempt {} while {}",
                self.attempt_id, self.status
            )));
        }
        self.status = AttemptStatus::Completed;
        Ok(())
    }
}
