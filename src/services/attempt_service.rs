use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{
    mpsc::{self, UnboundedReceiver, UnboundedSender},
    watch,
};

use crate::{
    api::QuizApi,
    auth::{require_authenticated, require_role, AuthContext, UserRole},
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{
        AbandonedAttempt, Advance, AttemptOutcome, AttemptSession, AttemptStatus, Quiz, Score,
        Transition,
    },
    services::{
        clock::{spawn_clock, TimerEvent, TimerSet},
        poller::spawn_poller,
        submission_service::SubmissionCoordinator,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttemptTimings {
    pub tick_interval: Duration,
    pub poll_interval: Duration,
}

impl Default for AttemptTimings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            poll_interval: Duration::from_secs(10),
        }
    }
}

impl AttemptTimings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            poll_interval: config.poll_interval(),
        }
    }
}

pub struct AttemptService {
    api: Arc<dyn QuizApi>,
    timings: AttemptTimings,
}

impl AttemptService {
    pub fn new(api: Arc<dyn QuizApi>, timings: AttemptTimings) -> Self {
        Self { api, timings }
    }

    /// Opens an attempt on the server and starts its timers.
    pub async fn start(&self, auth: &AuthContext, quiz: &Quiz) -> AppResult<AttemptRunner> {
        let user_id = require_authenticated(auth)?;
        require_role(auth, UserRole::Student)?;

        let started = self.api.start_attempt(&user_id, &quiz.id).await?;
        let content = started.quiz.unwrap_or_else(|| quiz.clone());
        let session = AttemptSession::new(&started.attempt_id, &content)?;

        log::info!(
            "Started attempt {} on quiz {} for {} ({} questions, time limit {}s)",
            session.attempt_id(),
            session.quiz_id(),
            user_id,
            session.questions().len(),
            session.time_limit_seconds()
        );

        Ok(AttemptRunner::spawn(session, Arc::clone(&self.api), self.timings))
    }
}

/// What `advance` led to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Progress {
    Question(usize),
    Finished(AttemptOutcome),
}

/// Owns one attempt session and serializes every event that can touch it.
///
/// The clock and poller only send `TimerEvent`s; the runner applies them one
/// at a time, so local and server expiry can never both finalize the attempt.
pub struct AttemptRunner {
    session: AttemptSession,
    coordinator: SubmissionCoordinator,
    events_tx: UnboundedSender<TimerEvent>,
    events: UnboundedReceiver<TimerEvent>,
    status: watch::Sender<AttemptStatus>,
    timers: TimerSet,
    outcome: Option<AttemptOutcome>,
}

impl AttemptRunner {
    pub fn spawn(session: AttemptSession, api: Arc<dyn QuizApi>, timings: AttemptTimings) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (status, status_rx) = watch::channel(session.status());

        let clock = spawn_clock(timings.tick_interval, events_tx.clone());
        let poller = (session.time_limit_seconds() > 0).then(|| {
            spawn_poller(
                Arc::clone(&api),
                session.attempt_id().to_string(),
                timings.poll_interval,
                status_rx,
                events_tx.clone(),
            )
        });
        let coordinator = SubmissionCoordinator::new(api, session.attempt_id());

        Self {
            session,
            coordinator,
            events_tx,
            events,
            status,
            timers: TimerSet::new(clock, poller),
            outcome: None,
        }
    }

    pub fn session(&self) -> &AttemptSession {
        &self.session
    }

    pub fn outcome(&self) -> Option<&AttemptOutcome> {
        self.outcome.as_ref()
    }

    pub fn timers_running(&self) -> bool {
        self.timers.is_running()
    }

    /// Lets other detectors (e.g. an app-resume hook) feed the same queue.
    pub fn event_sender(&self) -> UnboundedSender<TimerEvent> {
        self.events_tx.clone()
    }

    pub fn select_option(&mut self, question_id: &str, option_id: &str) -> AppResult<()> {
        self.session
            .select_option(question_id, option_id)
            .inspect_err(|e| log::warn!("Rejected selection: {}", e))
    }

    pub async fn advance(&mut self) -> AppResult<Progress> {
        let advance = self
            .session
            .advance()
            .inspect_err(|e| log::warn!("Rejected advance: {}", e))?;

        match advance {
            Advance::Next(index) => Ok(Progress::Question(index)),
            Advance::Submit(_) => {
                self.stop_timers();
                self.finish_normal(false).await.map(Progress::Finished)
            }
        }
    }

    /// Next timer signal, or `None` once the attempt has left `Active`.
    pub async fn next_event(&mut self) -> Option<TimerEvent> {
        if !self.session.is_active() {
            return None;
        }
        self.events.recv().await
    }

    /// Applies one timer signal. Returns the outcome if it finalized the attempt.
    pub async fn handle_event(&mut self, event: TimerEvent) -> AppResult<Option<AttemptOutcome>> {
        if !self.session.is_active() {
            log::debug!(
                "Ignoring late {:?} for attempt {} ({})",
                event,
                self.session.attempt_id(),
                self.session.status()
            );
            return Ok(None);
        }

        let transition = match event {
            TimerEvent::Tick => self.session.tick()?,
            TimerEvent::ServerExpiry(expired) => self.session.reconcile_server_expiry(expired)?,
        };

        if transition != Transition::Expired {
            return Ok(None);
        }

        log::info!(
            "Attempt {} expired after {}s ({:?})",
            self.session.attempt_id(),
            self.session.elapsed_seconds(),
            event
        );
        self.stop_timers();
        self.finish_forced(false).await.map(Some)
    }

    /// Drives timer events until the attempt is finalized.
    pub async fn wait_for_outcome(&mut self) -> AppResult<AttemptOutcome> {
        loop {
            if let Some(outcome) = &self.outcome {
                return Ok(outcome.clone());
            }

            match self.next_event().await {
                Some(event) => {
                    if let Some(outcome) = self.handle_event(event).await? {
                        return Ok(outcome);
                    }
                }
                None => {
                    return Err(AppError::InvalidState(format!(
                        "attempt {} is {} and has no outcome yet",
                        self.session.attempt_id(),
                        self.session.status()
                    )))
                }
            }
        }
    }

    /// Re-sends the terminal call after a `SubmissionFailed`.
    pub async fn retry_submission(&mut self) -> AppResult<AttemptOutcome> {
        if self.outcome.is_some() {
            return Err(AppError::InvalidState(format!(
                "attempt {} is already finalized",
                self.session.attempt_id()
            )));
        }

        match self.session.status() {
            AttemptStatus::Submitting => self.finish_normal(true).await,
            AttemptStatus::Expired => self.finish_forced(true).await,
            other => Err(AppError::InvalidState(format!(
                "attempt {} has nothing to retry while {}",
                self.session.attempt_id(),
                other
            ))),
        }
    }

    /// Leaves the attempt without telling the server.
    pub fn quit(mut self) -> AppResult<AbandonedAttempt> {
        self.timers.cancel();

        if !self.session.is_active() {
            return Err(AppError::InvalidState(format!(
                "cannot quit attempt {} while {}",
                self.session.attempt_id(),
                self.session.status()
            )));
        }

        log::info!(
            "Attempt {} abandoned after {}s",
            self.session.attempt_id(),
            self.session.elapsed_seconds()
        );
        Ok(AbandonedAttempt {
            attempt_id: self.session.attempt_id().to_string(),
            quiz_id: self.session.quiz_id().to_string(),
            elapsed_seconds: self.session.elapsed_seconds(),
            answered: self.session.selected_options().len(),
        })
    }

    fn stop_timers(&mut self) {
        self.timers.cancel();
        self.status.send_replace(self.session.status());
    }

    async fn finish_normal(&mut self, retry: bool) -> AppResult<AttemptOutcome> {
        let selections = self.session.selected_options().clone();
        let correct_count = if retry {
            self.coordinator.retry_submit(&selections).await?
        } else {
            self.coordinator.submit(&selections).await?
        };

        self.session.mark_completed()?;
        Ok(self.record(Score::Graded(correct_count)))
    }

    async fn finish_forced(&mut self, retry: bool) -> AppResult<AttemptOutcome> {
        let score = if retry {
            self.coordinator.retry_auto_submit().await?
        } else {
            self.coordinator.auto_submit().await?
        };

        Ok(self.record(Score::Forced(score)))
    }

    fn record(&mut self, score: Score) -> AttemptOutcome {
        let outcome = AttemptOutcome::from_session(&self.session, score);
        self.status.send_replace(self.session.status());
        self.outcome = Some(outcome.clone());
        outcome
    }
}
