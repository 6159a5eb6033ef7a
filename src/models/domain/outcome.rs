use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::{AttemptSession, AttemptStatus};

/// Score reported by the server for a finalized attempt.
///
/// A forced score is kept apart from a graded zero so a timed-out attempt is
/// never shown as "everything wrong".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Score {
    Graded(u32),
    Forced(u32),
}

impl Score {
    pub fn value(&self) -> u32 {
        match self {
            Score::Graded(v) | Score::Forced(v) => *v,
        }
    }

    pub fn is_forced(&self) -> bool {
        matches!(self, Score::Forced(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptOutcome {
    pub attempt_id: String,
    pub quiz_id: String,
    pub status: AttemptStatus,
    pub score: Score,
    pub total_questions: usize,
    pub elapsed_seconds: u32,
    pub time_limit_seconds: u32,
    pub selected_options: BTreeMap<String, String>,
    pub finalized_at: DateTime<Utc>,
}

impl AttemptOutcome {
    pub fn from_session(session: &AttemptSession, score: Score) -> Self {
        AttemptOutcome {
            attempt_id: session.attempt_id().to_string(),
            quiz_id: session.quiz_id().to_string(),
            status: session.status(),
            score,
            total_questions: session.questions().len(),
            elapsed_seconds: session.elapsed_seconds(),
            time_limit_seconds: session.time_limit_seconds(),
            selected_options: session.selected_options().clone(),
            finalized_at: Utc::now(),
        }
    }

    pub fn timed_out(&self) -> bool {
        self.status == AttemptStatus::Expired
    }
}

/// An attempt the user walked away from. Nothing was sent to the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbandonedAttempt {
    pub attempt_id: String,
    pub quiz_id: String,
    pub elapsed_seconds: u32,
    pub answered: usize,
}
