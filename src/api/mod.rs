pub mod http_helpers;
pub mod quiz_api;

pub use quiz_api::{HttpQuizApi, QuizApi};

#[cfg(test)]
pub use quiz_api::MockQuizApi;
