use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAttemptQuery {
    pub clerk_id: String,
    pub quiz_id: String,
}

/// Body of a normal submit: question id to chosen option id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubmitAnswersRequest {
    pub responses: BTreeMap<String, String>,
}

impl From<BTreeMap<String, String>> for SubmitAnswersRequest {
    fn from(responses: BTreeMap<String, String>) -> Self {
        SubmitAnswersRequest { responses }
    }
}
