use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::{sync::RwLock, time};

use quiz_attempt_client::{
    api::QuizApi,
    app_state::AppState,
    auth::{AuthContext, UserRole},
    config::Config,
    errors::{AppError, AppResult},
    models::{
        domain::{AttemptStatus, Question, QuestionOption, Quiz, Score},
        dto::{
            request::SubmitAnswersRequest,
            response::{AutoSubmitResponse, CheckTimeResponse, StartAttemptResponse, SubmitResponse},
        },
    },
    services::{clock::TimerEvent, AttemptRunner, Progress},
};

struct InMemoryQuizApi {
    quizzes: Vec<Quiz>,
    answer_key: HashMap<String, String>,
    server_expired: AtomicBool,
    finalized: RwLock<HashSet<String>>,
    submits: RwLock<Vec<(String, BTreeMap<String, String>)>>,
    auto_submits: RwLock<Vec<String>>,
    time_checks: AtomicUsize,
}

impl InMemoryQuizApi {
    fn new(quizzes: Vec<Quiz>) -> Self {
        // Server-side key: the first option of every question is correct.
        let answer_key = quizzes
            .iter()
            .flat_map(|quiz| quiz.questions.iter())
            .map(|q| (q.id.clone(), q.options[0].id.clone()))
            .collect();

        Self {
            quizzes,
            answer_key,
            server_expired: AtomicBool::new(false),
            finalized: RwLock::new(HashSet::new()),
            submits: RwLock::new(Vec::new()),
            auto_submits: RwLock::new(Vec::new()),
            time_checks: AtomicUsize::new(0),
        }
    }

    fn report_expired(&self) {
        self.server_expired.store(true, Ordering::SeqCst);
    }

    async fn finalize(&self, attempt_id: &str) -> AppResult<()> {
        let mut finalized = self.finalized.write().await;
        if !finalized.insert(attempt_id.to_string()) {
            return Err(AppError::Http(format!(
                "Attempt '{}' is already finalized",
                attempt_id
            )));
        }
        Ok(())
    }

    async fn submit_count(&self) -> usize {
        self.submits.read().await.len()
    }

    async fn auto_submit_count(&self) -> usize {
        self.auto_submits.read().await.len()
    }
}

#[async_trait]
impl QuizApi for InMemoryQuizApi {
    async fn list_quizzes(&self) -> AppResult<Vec<Quiz>> {
        Ok(self.quizzes.clone())
    }

    async fn start_attempt(&self, _user_id: &str, quiz_id: &str) -> AppResult<StartAttemptResponse> {
        if !self.quizzes.iter().any(|q| q.id == quiz_id) {
            return Err(AppError::NotFound(format!("Quiz '{}'", quiz_id)));
        }
        Ok(StartAttemptResponse {
            attempt_id: uuid::Uuid::new_v4().to_string(),
            quiz: None,
        })
    }

    async fn check_time(&self, _attempt_id: &str) -> AppResult<CheckTimeResponse> {
        self.time_checks.fetch_add(1, Ordering::SeqCst);
        Ok(CheckTimeResponse {
            time_exceeded: self.server_expired.load(Ordering::SeqCst),
        })
    }

    async fn submit(
        &self,
        attempt_id: &str,
        answers: &SubmitAnswersRequest,
    ) -> AppResult<SubmitResponse> {
        self.finalize(attempt_id).await?;
        self.submits
            .write()
            .await
            .push((attempt_id.to_string(), answers.responses.clone()));

        let correct_count = answers
            .responses
            .iter()
            .filter(|(question, option)| self.answer_key.get(*question) == Some(*option))
            .count() as u32;
        Ok(SubmitResponse { correct_count })
    }

    async fn auto_submit(&self, attempt_id: &str) -> AppResult<AutoSubmitResponse> {
        self.finalize(attempt_id).await?;
        self.auto_submits.write().await.push(attempt_id.to_string());
        Ok(AutoSubmitResponse { score: 0 })
    }
}

fn quiz(id: &str, question_count: usize, time_limit: u32) -> Quiz {
    Quiz {
        id: id.to_string(),
        title: format!("Quiz {}", id),
        description: String::new(),
        category: None,
        difficulty: None,
        color: None,
        professor: None,
        time_limit,
        questions: (1..=question_count)
            .map(|i| Question {
                id: format!("q-{}", i),
                text: format!("Question {}", i),
                options: (1..=3)
                    .map(|j| QuestionOption {
                        id: format!("q-{}-opt-{}", i, j),
                        text: format!("Option {}", j),
                        is_correct: None,
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn config() -> Config {
    Config {
        api_base_url: "http://localhost:3000/api".to_string(),
        api_token: None,
        user_id: Some("user_1".to_string()),
        user_role: UserRole::Student,
        tick_interval_ms: 1000,
        poll_interval_secs: 10,
        request_timeout_secs: 5,
    }
}

fn state(api: Arc<InMemoryQuizApi>) -> AppState {
    let config = config();
    let auth = AuthContext::from_config(&config);
    AppState::with_api(config, auth, api)
}

async fn start(api: &Arc<InMemoryQuizApi>, quiz_id: &str) -> AttemptRunner {
    let state = state(Arc::clone(api));
    let quiz = state.catalog_service.get_quiz(quiz_id).await.unwrap();
    state.attempt_service.start(&state.auth, &quiz).await.unwrap()
}

async fn pump_ticks(runner: &mut AttemptRunner, count: usize) {
    for _ in 0..count {
        let event = runner.next_event().await.expect("attempt should be active");
        assert_eq!(event, TimerEvent::Tick);
        assert!(runner.handle_event(event).await.unwrap().is_none());
    }
}

#[tokio::test(start_paused = true)]
async fn untimed_quiz_completes_with_every_selection() {
    let api = Arc::new(InMemoryQuizApi::new(vec![quiz("untimed", 3, 0)]));
    let mut runner = start(&api, "untimed").await;

    pump_ticks(&mut runner, 3).await;
    runner.select_option("q-1", "q-1-opt-1").unwrap();
    runner.select_option("q-2", "q-2-opt-3").unwrap();
    runner.select_option("q-3", "q-3-opt-1").unwrap();

    assert_eq!(runner.advance().await, Ok(Progress::Question(1)));
    assert_eq!(runner.advance().await, Ok(Progress::Question(2)));
    let outcome = match runner.advance().await {
        Ok(Progress::Finished(outcome)) => outcome,
        other => panic!("expected a finished attempt, got {:?}", other),
    };

    assert_eq!(outcome.status, AttemptStatus::Completed);
    assert_eq!(outcome.score, Score::Graded(2));
    assert_eq!(outcome.elapsed_seconds, 3);

    let submits = api.submits.read().await.clone();
    assert_eq!(submits.len(), 1);
    assert_eq!(submits[0].1.len(), 3);
    assert_eq!(submits[0].1, outcome.selected_options);
    assert_eq!(api.auto_submit_count().await, 0);

    // Time keeps passing but the attempt is frozen.
    time::sleep(Duration::from_secs(5)).await;
    assert_eq!(runner.session().elapsed_seconds(), 3);
    assert!(!runner.timers_running());
}

#[tokio::test(start_paused = true)]
async fn idle_attempt_expires_at_limit_with_forced_score() {
    let api = Arc::new(InMemoryQuizApi::new(vec![quiz("timed", 2, 5)]));
    let mut runner = start(&api, "timed").await;

    let outcome = runner.wait_for_outcome().await.unwrap();

    assert_eq!(outcome.status, AttemptStatus::Expired);
    assert_eq!(outcome.score, Score::Forced(0));
    assert_ne!(outcome.score, Score::Graded(0));
    assert_eq!(outcome.elapsed_seconds, 5);
    assert_eq!(runner.session().remaining_seconds(), Some(0));
    assert_eq!(api.auto_submit_count().await, 1);
    assert_eq!(api.submit_count().await, 0);
    assert_eq!(api.time_checks.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn tick_then_server_expiry_finalizes_once() {
    let api = Arc::new(InMemoryQuizApi::new(vec![quiz("race", 1, 1)]));
    let mut runner = start(&api, "race").await;

    let first = runner.handle_event(TimerEvent::Tick).await.unwrap();
    let second = runner
        .handle_event(TimerEvent::ServerExpiry(true))
        .await
        .unwrap();

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(runner.session().status(), AttemptStatus::Expired);
    assert_eq!(api.auto_submit_count().await, 1);
    assert_eq!(api.submit_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn server_expiry_then_tick_finalizes_once() {
    let api = Arc::new(InMemoryQuizApi::new(vec![quiz("race", 1, 1)]));
    let mut runner = start(&api, "race").await;

    let first = runner
        .handle_event(TimerEvent::ServerExpiry(true))
        .await
        .unwrap();
    let second = runner.handle_event(TimerEvent::Tick).await.unwrap();

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(runner.session().elapsed_seconds(), 0);
    assert_eq!(api.auto_submit_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn queued_detectors_in_same_instant_finalize_once() {
    let api = Arc::new(InMemoryQuizApi::new(vec![quiz("race", 1, 1)]));
    let mut runner = start(&api, "race").await;

    let sender = runner.event_sender();
    sender.send(TimerEvent::ServerExpiry(true)).unwrap();
    sender.send(TimerEvent::Tick).unwrap();
    sender.send(TimerEvent::ServerExpiry(true)).unwrap();

    let outcome = runner.wait_for_outcome().await.unwrap();
    assert!(outcome.timed_out());

    // Whatever is still queued is discarded.
    for event in [TimerEvent::Tick, TimerEvent::ServerExpiry(true)] {
        assert!(runner.handle_event(event).await.unwrap().is_none());
    }
    assert_eq!(runner.next_event().await, None);
    assert_eq!(api.auto_submit_count().await, 1);
    assert_eq!(api.submit_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn server_poll_catches_expiry_before_local_clock() {
    let api = Arc::new(InMemoryQuizApi::new(vec![quiz("drift", 2, 60)]));
    api.report_expired();
    let mut runner = start(&api, "drift").await;

    let outcome = runner.wait_for_outcome().await.unwrap();

    assert!(outcome.timed_out());
    // The first poll lands at 10s, alongside the tenth tick.
    assert!((9..=10).contains(&outcome.elapsed_seconds));
    assert_eq!(api.time_checks.load(Ordering::SeqCst), 1);
    assert_eq!(api.auto_submit_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn server_saying_not_expired_leaves_local_clock_in_charge() {
    let api = Arc::new(InMemoryQuizApi::new(vec![quiz("slow", 1, 15)]));
    let mut runner = start(&api, "slow").await;

    let outcome = runner.wait_for_outcome().await.unwrap();

    assert_eq!(outcome.elapsed_seconds, 15);
    assert_eq!(api.time_checks.load(Ordering::SeqCst), 1);
    assert_eq!(api.auto_submit_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn finishing_as_the_timer_fires_submits_normally_once() {
    let api = Arc::new(InMemoryQuizApi::new(vec![quiz("close-call", 1, 2)]));
    let mut runner = start(&api, "close-call").await;

    pump_ticks(&mut runner, 1).await;
    runner.select_option("q-1", "q-1-opt-1").unwrap();

    // The last tick is already queued when the user hits finish.
    runner.event_sender().send(TimerEvent::Tick).unwrap();
    let outcome = match runner.advance().await.unwrap() {
        Progress::Finished(outcome) => outcome,
        other => panic!("expected a finished attempt, got {:?}", other),
    };

    assert_eq!(outcome.status, AttemptStatus::Completed);
    assert_eq!(outcome.score, Score::Graded(1));
    assert!(runner
        .handle_event(TimerEvent::Tick)
        .await
        .unwrap()
        .is_none());
    assert_eq!(runner.session().elapsed_seconds(), 1);
    assert_eq!(api.submit_count().await, 1);
    assert_eq!(api.auto_submit_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn quitting_never_calls_the_server() {
    let api = Arc::new(InMemoryQuizApi::new(vec![quiz("quit", 3, 30)]));
    let mut runner = start(&api, "quit").await;

    pump_ticks(&mut runner, 2).await;
    runner.select_option("q-1", "q-1-opt-2").unwrap();
    let abandoned = runner.quit().unwrap();

    assert_eq!(abandoned.elapsed_seconds, 2);
    assert_eq!(abandoned.answered, 1);

    time::sleep(Duration::from_secs(60)).await;
    assert_eq!(api.submit_count().await, 0);
    assert_eq!(api.auto_submit_count().await, 0);
    assert_eq!(api.time_checks.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn signed_out_user_cannot_start() {
    let api = Arc::new(InMemoryQuizApi::new(vec![quiz("locked", 1, 0)]));
    let app = state(Arc::clone(&api));
    app.auth.sign_out();

    let quiz = app.catalog_service.get_quiz("locked").await.unwrap();
    let result = app.attempt_service.start(&app.auth, &quiz).await;

    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test(start_paused = true)]
async fn unknown_quiz_is_not_found() {
    let api = Arc::new(InMemoryQuizApi::new(vec![quiz("only", 1, 0)]));
    let app = state(api);

    assert!(matches!(
        app.catalog_service.get_quiz("missing").await,
        Err(AppError::NotFound(_))
    ));
}
