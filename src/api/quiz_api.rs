use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;

use crate::{
    api::http_helpers::{endpoint, ensure_success},
    auth::AuthContext,
    config::Config,
    errors::AppResult,
    models::{
        domain::Quiz,
        dto::{
            request::{StartAttemptQuery, SubmitAnswersRequest},
            response::{AutoSubmitResponse, CheckTimeResponse, StartAttemptResponse, SubmitResponse},
        },
    },
};

/// The remote quiz/grading API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizApi: Send + Sync {
    async fn list_quizzes(&self) -> AppResult<Vec<Quiz>>;
    async fn start_attempt(&self, user_id: &str, quiz_id: &str) -> AppResult<StartAttemptResponse>;
    /// Side-effect free; safe to call on every poll.
    async fn check_time(&self, attempt_id: &str) -> AppResult<CheckTimeResponse>;
    async fn submit(
        &self,
        attempt_id: &str,
        answers: &SubmitAnswersRequest,
    ) -> AppResult<SubmitResponse>;
    async fn auto_submit(&self, attempt_id: &str) -> AppResult<AutoSubmitResponse>;
}

pub struct HttpQuizApi {
    client: Client,
    base_url: String,
    auth: AuthContext,
}

impl HttpQuizApi {
    pub fn new(config: &Config, auth: &AuthContext) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            auth: auth.clone(),
        })
    }

    /// The token is read on every request, so a sign-out stops it being sent.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, endpoint(&self.base_url, path));
        match self.auth.bearer_token() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> AppResult<T> {
        let response = ensure_success(builder.send().await?).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    async fn list_quizzes(&self) -> AppResult<Vec<Quiz>> {
        self.send_json(self.request(Method::GET, "quizzes")).await
    }

    async fn start_attempt(&self, user_id: &str, quiz_id: &str) -> AppResult<StartAttemptResponse> {
        let query = StartAttemptQuery {
            clerk_id: user_id.to_string(),
            quiz_id: quiz_id.to_string(),
        };
        let builder = self
            .request(Method::POST, "quiz-attempts/start")
            .query(&query);
        self.send_json(builder).await
    }

    async fn check_time(&self, attempt_id: &str) -> AppResult<CheckTimeResponse> {
        let path = format!("quiz-attempts/{}/check-time", attempt_id);
        self.send_json(self.request(Method::GET, &path)).await
    }

    async fn submit(
        &self,
        attempt_id: &str,
        answers: &SubmitAnswersRequest,
    ) -> AppResult<SubmitResponse> {
        let path = format!("quiz-attempts/{}/submit", attempt_id);
        let builder = self.request(Method::POST, &path).json(answers);
        self.send_json(builder).await
    }

    async fn auto_submit(&self, attempt_id: &str) -> AppResult<AutoSubmitResponse> {
        let path = format!("quiz-attempts/{}/auto-submit", attempt_id);
        let response = ensure_success(self.request(Method::POST, &path).send().await?).await?;

        // The server may answer with an empty body; that means a zero score.
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(AutoSubmitResponse::default());
        }
        Ok(serde_json::from_str(&body)?)
    }
}
