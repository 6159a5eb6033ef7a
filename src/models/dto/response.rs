use serde::Deserialize;

use crate::models::domain::Quiz;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAttemptResponse {
    pub attempt_id: String,
    /// Some servers echo the quiz content back; absent means "use your copy".
    #[serde(default)]
    pub quiz: Option<Quiz>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckTimeResponse {
    pub time_exceeded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SubmitResponse {
    #[serde(rename = "correctAnswers", alias = "correctCount")]
    pub correct_count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct AutoSubmitResponse {
    #[serde(default)]
    pub score: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
