use tokio::io::{AsyncBufReadExt, BufReader};

use quiz_attempt_client::{
    app_state::AppState,
    auth::AuthContext,
    config::Config,
    errors::AppResult,
    models::domain::{AttemptOutcome, Question, Quiz},
    services::{
        quiz_catalog_service::categories,
        result_presenter::{format_time, review_answers, TimerUrgency},
        AttemptRunner, Progress, QuizFilter, ResultSummary,
    },
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        log::error!("{}", e);
        eprintln!("error [{}]: {}", e.error_code(), e);
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let config = Config::from_env();
    let auth = AuthContext::from_config(&config);
    let state = AppState::new(config, auth)?;

    let Some(quiz_id) = std::env::args().nth(1) else {
        let quizzes = state
            .catalog_service
            .filtered_quizzes(&QuizFilter::default())
            .await?;
        print_catalog(&quizzes);
        return Ok(());
    };

    let quiz = state.catalog_service.get_quiz(&quiz_id).await?;
    let mut runner = state.attempt_service.start(&state.auth, &quiz).await?;

    match take_attempt(&mut runner).await? {
        Some(outcome) => print_results(&outcome, &quiz.title, runner.session().questions()),
        None => match runner.quit() {
            Ok(abandoned) => println!(
                "Quit after {} with {} answer(s). Nothing was submitted.",
                format_time(abandoned.elapsed_seconds as i64),
                abandoned.answered
            ),
            Err(e) => println!("Left without a confirmed result: {}", e),
        },
    }
    Ok(())
}

/// Runs the question loop. `None` means the user quit.
async fn take_attempt(runner: &mut AttemptRunner) -> AppResult<Option<AttemptOutcome>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_question(runner);

    loop {
        tokio::select! {
            Some(event) = runner.next_event(), if runner.session().is_active() => {
                match runner.handle_event(event).await {
                    Ok(Some(outcome)) => return Ok(Some(outcome)),
                    Ok(None) => {}
                    Err(e) if e.is_retryable() => {
                        println!("Time is up, but the attempt could not be submitted: {}", e);
                        println!("Type 'r' to retry.");
                    }
                    Err(e) => return Err(e),
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(None);
                };
                let input = line.trim();
                if input == "q" {
                    return Ok(None);
                }
                if let Some(outcome) = handle_input(runner, input).await? {
                    return Ok(Some(outcome));
                }
            }
        }
    }
}

async fn handle_input(runner: &mut AttemptRunner, input: &str) -> AppResult<Option<AttemptOutcome>> {
    match input {
        "r" => match runner.retry_submission().await {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                println!("{}", e);
                Ok(None)
            }
        },
        choice => {
            if !runner.session().is_active() {
                println!("The attempt is being finalized. Type 'r' to retry the submission.");
                return Ok(None);
            }

            let question = runner.session().current_question().clone();
            let option = choice
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| question.options.get(i));
            let Some(option) = option else {
                println!("Pick a number between 1 and {}, or 'q' to quit.", question.options.len());
                return Ok(None);
            };

            runner.select_option(&question.id, &option.id)?;
            match runner.advance().await {
                Ok(Progress::Question(_)) => {
                    print_question(runner);
                    Ok(None)
                }
                Ok(Progress::Finished(outcome)) => Ok(Some(outcome)),
                Err(e) if e.is_retryable() => {
                    println!("{}. Type 'r' to retry.", e);
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        }
    }
}

fn print_catalog(quizzes: &[Quiz]) {
    println!("Categories: {}", categories(quizzes).join(", "));
    for quiz in quizzes {
        let limit = if quiz.has_time_limit() {
            format_time(quiz.time_limit as i64)
        } else {
            "no limit".to_string()
        };
        println!(
            "{}  {} ({} questions, {})",
            quiz.id,
            quiz.title,
            quiz.questions.len(),
            limit
        );
    }
}

fn print_question(runner: &AttemptRunner) {
    let session = runner.session();
    let question = session.current_question();

    println!();
    print!(
        "Question {} of {}",
        session.current_question_index() + 1,
        session.questions().len()
    );
    if let Some(remaining) = session.remaining_seconds() {
        print!(
            "  [remaining {} {:?}]",
            format_time(remaining as i64),
            TimerUrgency::from_remaining(remaining)
        );
    }
    println!("  [elapsed {}]", format_time(session.elapsed_seconds() as i64));
    println!("{}", question.text);
    for (i, option) in question.options.iter().enumerate() {
        println!("  {}. {}", i + 1, option.text);
    }
}

fn print_results(outcome: &AttemptOutcome, title: &str, questions: &[Question]) {
    let summary = ResultSummary::from_outcome(outcome);

    println!();
    println!("{}  {}", title, summary.message);
    println!("Score: {} ({}%, grade {})", summary.score_line(), summary.percentage, summary.grade);
    println!("{}", summary.time_line());

    for review in review_answers(outcome, questions) {
        let correct = review
            .correct_option_id
            .map(|id| format!(" (correct: {})", id))
            .unwrap_or_default();
        println!(
            "  {}: {}{}",
            review.question_text,
            review.selected_option_id.unwrap_or_else(|| "-".to_string()),
            correct
        );
    }
}
