use std::time::Duration;

use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

/// Signals the two periodic producers feed into an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick,
    ServerExpiry(bool),
}

/// Emits one `Tick` per period until the receiver goes away or the task is aborted.
pub fn spawn_clock(period: Duration, events: UnboundedSender<TimerEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if events.send(TimerEvent::Tick).is_err() {
                break;
            }
        }
    })
}

/// The clock and poller tasks of one attempt. Dropping the set aborts both.
#[derive(Debug, Default)]
pub struct TimerSet {
    clock: Option<JoinHandle<()>>,
    poller: Option<JoinHandle<()>>,
}

impl TimerSet {
    pub fn new(clock: JoinHandle<()>, poller: Option<JoinHandle<()>>) -> Self {
        Self {
            clock: Some(clock),
            poller,
        }
    }

    /// Aborts both tasks. Safe to call more than once.
    pub fn cancel(&mut self) {
        if let Some(clock) = self.clock.take() {
            clock.abort();
        }
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_some() || self.poller.is_some()
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.cancel();
    }
}
