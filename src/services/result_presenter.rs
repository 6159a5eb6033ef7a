use std::fmt;

use crate::models::domain::{AttemptOutcome, Question};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{}", letter)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultMessage {
    TimeExpired,
    Perfect,
    GoodJob,
    KeepLearning,
}

impl fmt::Display for ResultMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultMessage::TimeExpired => write!(f, "Time's up!"),
            ResultMessage::Perfect => write!(f, "Perfect!"),
            ResultMessage::GoodJob => write!(f, "Good job!"),
            ResultMessage::KeepLearning => write!(f, "Keep learning!"),
        }
    }
}

/// Colour band for the countdown badge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerUrgency {
    Normal,
    Warning,
    Danger,
}

impl TimerUrgency {
    pub fn from_remaining(remaining_seconds: u32) -> Self {
        match remaining_seconds {
            0..=59 => TimerUrgency::Danger,
            60..=179 => TimerUrgency::Warning,
            _ => TimerUrgency::Normal,
        }
    }
}

/// `m:ss`, negative values clamp to zero.
pub fn format_time(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerReview {
    pub question_id: String,
    pub question_text: String,
    pub selected_option_id: Option<String>,
    pub correct_option_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultSummary {
    pub attempt_id: String,
    pub score: u32,
    pub total_questions: usize,
    pub percentage: u32,
    pub grade: Grade,
    pub message: ResultMessage,
    pub time_expired: bool,
    pub time_spent_seconds: u32,
    pub time_limit_seconds: u32,
}

impl ResultSummary {
    pub fn from_outcome(outcome: &AttemptOutcome) -> Self {
        let score = outcome.score.value();
        let total = outcome.total_questions;
        let percentage = if total == 0 {
            0
        } else {
            ((score as usize * 100) / total) as u32
        };

        let message = if outcome.timed_out() {
            ResultMessage::TimeExpired
        } else if score as usize == total {
            ResultMessage::Perfect
        } else if score as usize * 2 >= total {
            ResultMessage::GoodJob
        } else {
            ResultMessage::KeepLearning
        };

        ResultSummary {
            attempt_id: outcome.attempt_id.clone(),
            score,
            total_questions: total,
            percentage,
            grade: Grade::from_percentage(percentage),
            message,
            time_expired: outcome.timed_out(),
            time_spent_seconds: outcome.elapsed_seconds,
            time_limit_seconds: outcome.time_limit_seconds,
        }
    }

    pub fn score_line(&self) -> String {
        format!("{}/{}", self.score, self.total_questions)
    }

    pub fn time_line(&self) -> String {
        if self.time_expired {
            format!(
                "Time limit of {} exceeded",
                format_time(self.time_limit_seconds as i64)
            )
        } else {
            format!("Total time: {}", format_time(self.time_spent_seconds as i64))
        }
    }
}

/// Per-question review, only for attempts the user actually finished.
///
/// `questions` must be the attempt's own content (`AttemptSession::questions`),
/// which may differ from the catalog copy. Correct answers appear only when
/// the server disclosed them.
pub fn review_answers(outcome: &AttemptOutcome, questions: &[Question]) -> Vec<AnswerReview> {
    if outcome.timed_out() {
        return Vec::new();
    }

    questions
        .iter()
        .map(|q| AnswerReview {
            question_id: q.id.clone(),
            question_text: q.text.clone(),
            selected_option_id: outcome.selected_options.get(&q.id).cloned(),
            correct_option_id: q.correct_option().map(|o| o.id.clone()),
        })
        .collect()
}
