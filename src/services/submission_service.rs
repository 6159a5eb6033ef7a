use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use crate::{
    api::QuizApi,
    errors::{AppError, AppResult},
    models::dto::request::SubmitAnswersRequest,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalizationPath {
    /// User finished the last question.
    Normal,
    /// Time ran out.
    Forced,
}

const UNCLAIMED: u8 = 0;
const CLAIMED_NORMAL: u8 = 1;
const CLAIMED_FORCED: u8 = 2;

impl FinalizationPath {
    fn as_flag(self) -> u8 {
        match self {
            FinalizationPath::Normal => CLAIMED_NORMAL,
            FinalizationPath::Forced => CLAIMED_FORCED,
        }
    }

    fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            CLAIMED_NORMAL => Some(FinalizationPath::Normal),
            CLAIMED_FORCED => Some(FinalizationPath::Forced),
            _ => None,
        }
    }
}

/// Issues exactly one terminal call per attempt.
///
/// Both paths race for a single compare-and-set claim taken before the request
/// is sent. The loser is rejected without touching the network.
pub struct SubmissionCoordinator {
    api: Arc<dyn QuizApi>,
    attempt_id: String,
    claimed: AtomicU8,
    last_failed: AtomicBool,
}

impl SubmissionCoordinator {
    pub fn new(api: Arc<dyn QuizApi>, attempt_id: &str) -> Self {
        Self {
            api,
            attempt_id: attempt_id.to_string(),
            claimed: AtomicU8::new(UNCLAIMED),
            last_failed: AtomicBool::new(false),
        }
    }

    pub fn attempt_id(&self) -> &str {
        &self.attempt_id
    }

    /// Returns true if this call took the claim for `path`.
    pub fn claim(&self, path: FinalizationPath) -> bool {
        self.claimed
            .compare_exchange(
                UNCLAIMED,
                path.as_flag(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn claimed_path(&self) -> Option<FinalizationPath> {
        FinalizationPath::from_flag(self.claimed.load(Ordering::Acquire))
    }

    pub fn is_finalized(&self) -> bool {
        self.claimed_path().is_some()
    }

    /// Normal submit with the full selection mapping. Yields the correct count.
    pub async fn submit(&self, selections: &BTreeMap<String, String>) -> AppResult<u32> {
        if !self.claim(FinalizationPath::Normal) {
            return Err(self.already_finalized());
        }
        self.dispatch_submit(selections).await
    }

    /// Forced submit without an answer payload. Yields the server's forced score.
    pub async fn auto_submit(&self) -> AppResult<u32> {
        if !self.claim(FinalizationPath::Forced) {
            return Err(self.already_finalized());
        }
        self.dispatch_auto_submit().await
    }

    pub async fn retry_submit(&self, selections: &BTreeMap<String, String>) -> AppResult<u32> {
        self.begin_retry(FinalizationPath::Normal)?;
        self.dispatch_submit(selections).await
    }

    pub async fn retry_auto_submit(&self) -> AppResult<u32> {
        self.begin_retry(FinalizationPath::Forced)?;
        self.dispatch_auto_submit().await
    }

    fn already_finalized(&self) -> AppError {
        AppError::InvalidState(format!(
            "attempt {} is already finalized ({:?})",
            self.attempt_id,
            self.claimed_path()
        ))
    }

    fn begin_retry(&self, path: FinalizationPath) -> AppResult<()> {
        if self.claimed_path() != Some(path) {
            return Err(AppError::InvalidState(format!(
                "attempt {} was not finalized via {:?}",
                self.attempt_id, path
            )));
        }
        if !self.last_failed.swap(false, Ordering::AcqRel) {
            return Err(AppError::InvalidState(format!(
                "attempt {} has no failed submission to retry",
                self.attempt_id
            )));
        }
        Ok(())
    }

    async fn dispatch_submit(&self, selections: &BTreeMap<String, String>) -> AppResult<u32> {
        let request = SubmitAnswersRequest::from(selections.clone());
        match self.api.submit(&self.attempt_id, &request).await {
            Ok(response) => {
                log::info!(
                    "Submitted attempt {}: {} correct",
                    self.attempt_id,
                    response.correct_count
                );
                Ok(response.correct_count)
            }
            Err(e) => Err(self.failed(e)),
        }
    }

    async fn dispatch_auto_submit(&self) -> AppResult<u32> {
        match self.api.auto_submit(&self.attempt_id).await {
            Ok(response) => {
                log::info!(
                    "Auto-submitted expired attempt {} (score {})",
                    self.attempt_id,
                    response.score
                );
                Ok(response.score)
            }
            Err(e) => Err(self.failed(e)),
        }
    }

    fn failed(&self, cause: AppError) -> AppError {
        self.last_failed.store(true, Ordering::Release);
        let err = AppError::SubmissionFailed(cause.to_string());
        log::error!("{} (attempt {})", err, self.attempt_id);
        err
    }
}
