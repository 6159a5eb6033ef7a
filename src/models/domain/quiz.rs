use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::quiz_question::Question;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    #[validate(length(min = 1))]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professor: Option<Professor>,
    /// Seconds allowed for one attempt; 0 or missing means unlimited.
    #[serde(default)]
    pub time_limit: u32,
    #[serde(default)]
    #[validate(length(min = 1, message = "quiz has no questions"))]
    #[validate(nested)]
    pub questions: Vec<Question>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Professor {
    pub first_name: String,
    pub last_name: String,
}

impl Professor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Quiz {
    pub fn has_time_limit(&self) -> bool {
        self.time_limit > 0
    }
}
