use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc::UnboundedSender, watch},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    api::QuizApi, errors::AppError, models::domain::AttemptStatus, services::clock::TimerEvent,
};

/// Asks the server whether the attempt's deadline has passed, once per period.
///
/// The status is read right before every query and the loop ends as soon as
/// the attempt is no longer active. Failed checks are logged and skipped.
pub fn spawn_poller(
    api: Arc<dyn QuizApi>,
    attempt_id: String,
    period: Duration,
    status: watch::Receiver<AttemptStatus>,
    events: UnboundedSender<TimerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let current = *status.borrow();
            if current != AttemptStatus::Active {
                log::debug!("Stopping time checks for attempt {} ({})", attempt_id, current);
                break;
            }

            match api.check_time(&attempt_id).await {
                Ok(response) => {
                    if events
                        .send(TimerEvent::ServerExpiry(response.time_exceeded))
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => {
                    let err = AppError::PollFailed(e.to_string());
                    log::warn!("{} (attempt {})", err, attempt_id);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockQuizApi;
    use crate::models::dto::response::CheckTimeResponse;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn poller_reports_server_answer_each_period() {
        let mut api = MockQuizApi::new();
        api.expect_check_time()
            .withf(|id| id == "attempt-1")
            .times(2)
            .returning(|_| {
                Ok(CheckTimeResponse {
                    time_exceeded: false,
                })
            });

        let (status_tx, status_rx) = watch::channel(AttemptStatus::Active);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let started = Instant::now();
        let poller = spawn_poller(
            Arc::new(api),
            "attempt-1".to_string(),
            Duration::from_secs(10),
            status_rx,
            tx,
        );

        assert_eq!(rx.recv().await, Some(TimerEvent::ServerExpiry(false)));
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        assert_eq!(rx.recv().await, Some(TimerEvent::ServerExpiry(false)));
        assert_eq!(started.elapsed(), Duration::from_secs(20));

        status_tx.send_replace(AttemptStatus::Expired);
        time::sleep(Duration::from_secs(11)).await;
        assert!(poller.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn poller_keeps_going_after_failures() {
        let mut api = MockQuizApi::new();
        let mut seq = mockall::Sequence::new();
        api.expect_check_time()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::Http("connection reset".to_string())));
        api.expect_check_time()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(CheckTimeResponse {
                    time_exceeded: true,
                })
            });

        let (_status_tx, status_rx) = watch::channel(AttemptStatus::Active);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let started = Instant::now();
        let poller = spawn_poller(
            Arc::new(api),
            "attempt-1".to_string(),
            Duration::from_secs(10),
            status_rx,
            tx,
        );

        assert_eq!(rx.recv().await, Some(TimerEvent::ServerExpiry(true)));
        assert_eq!(started.elapsed(), Duration::from_secs(30));
        poller.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn poller_never_queries_an_inactive_attempt() {
        let mut api = MockQuizApi::new();
        api.expect_check_time().never();

        let (_status_tx, status_rx) = watch::channel(AttemptStatus::Submitting);
        let (tx, _rx) = mpsc::unbounded_channel();
        let poller = spawn_poller(
            Arc::new(api),
            "attempt-1".to_string(),
            Duration::from_secs(10),
            status_rx,
            tx,
        );

        time::sleep(Duration::from_secs(11)).await;
        assert!(poller.is_finished());
    }
}
