//! Timer-driven bridge feeding scheduled messages into the service.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use crate::service::MessageService;

/// One recurring submission.
#[derive(Debug, Clone)]
pub struct ScheduledMessage {
    /// Target context id; empty selects the default context.
    pub context: String,
    /// Input text submitted on each tick.
    pub text: String,
    /// Tick interval.
    pub every: Duration,
}

/// Interval tasks that call [`MessageService::submit`] asynchronously
/// on a timer. The bridge carries no scheduling state of its own; it is
/// just another caller of the submission entry point.
pub struct SchedulerBridge {
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerBridge {
    /// Spawn one interval task per schedule entry. The first submission
    /// fires one full interval after spawn.
    #[must_use]
    pub fn spawn(service: Arc<MessageService>, schedule: Vec<ScheduledMessage>) -> Self {
        let tasks = schedule
            .into_iter()
            .map(|entry| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(entry.every);
                    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                    // interval fires immediately; swallow the first tick
                    ticker.tick().await;
                    loop {
                        ticker.tick().await;
                        match service.submit(&entry.context, &entry.text, false).await {
                            Ok(reply) => {
                                tracing::debug!(context = %reply.context, "scheduled message submitted");
                            }
                            Err(err) => {
                                tracing::warn!(context = %entry.context, error = %err, "scheduled submission failed");
                            }
                        }
                    }
                })
            })
            .collect();
        Self { tasks }
    }
}

// dropping the bridge stops all schedule tasks
impl Drop for SchedulerBridge {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
