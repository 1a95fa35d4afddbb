//! Per-context execution slot: serialized processing with a FIFO queue.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use agent_hub_core::{AgentError, AgentLoop, EntryKind, Log};
use tokio::sync::{mpsc, oneshot, watch};

struct Job {
    input: String,
    done: oneshot::Sender<Result<String, AgentError>>,
}

/// One-shot handle to the eventual outcome of a single submission.
pub struct ResultHandle {
    rx: oneshot::Receiver<Result<String, AgentError>>,
}

impl ResultHandle {
    /// Suspend until this submission's processing completes.
    ///
    /// # Errors
    /// Returns the agent loop's failure, or a synthetic failure if the
    /// slot went away before resolving.
    pub async fn wait(self) -> Result<String, AgentError> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(AgentError::new("execution slot closed before completion")),
        }
    }
}

/// Per-context concurrency guard.
///
/// A dedicated worker task drains submissions in arrival order, so at
/// most one is in flight per context while different contexts proceed
/// independently. The pause flag gates the idle-to-busy transition; it
/// never interrupts a submission already running.
pub struct ExecutionSlot {
    jobs: mpsc::UnboundedSender<Job>,
    busy: Arc<AtomicBool>,
    paused: watch::Sender<bool>,
}

impl ExecutionSlot {
    /// Create a slot and spawn its worker task.
    #[must_use]
    pub fn spawn(agent: Arc<dyn AgentLoop>, log: Arc<Log>) -> Self {
        let (jobs, rx) = mpsc::unbounded_channel();
        let busy = Arc::new(AtomicBool::new(false));
        let (paused, paused_rx) = watch::channel(false);
        tokio::spawn(run_worker(agent, log, rx, Arc::clone(&busy), paused_rx));
        Self { jobs, busy, paused }
    }

    /// Queue one submission, returning its result handle.
    ///
    /// Submissions to the same slot are processed strictly in arrival
    /// order; callers that drop the handle get fire-and-forget.
    #[must_use]
    pub fn submit(&self, input: impl Into<String>) -> ResultHandle {
        let (done, rx) = oneshot::channel();
        let job = Job {
            input: input.into(),
            done,
        };
        if let Err(failed) = self.jobs.send(job) {
            // worker gone; resolve immediately so callers are not stuck
            let _ = failed
                .0
                .done
                .send(Err(AgentError::new("execution slot is closed")));
        }
        ResultHandle { rx }
    }

    /// Whether a submission is currently being processed.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Gate or un-gate the idle-to-busy transition. Resuming wakes the
    /// worker so queued submissions proceed without a new submit.
    pub fn set_paused(&self, paused: bool) {
        self.paused.send_replace(paused);
    }

    /// Current pause flag.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }
}

async fn run_worker(
    agent: Arc<dyn AgentLoop>,
    log: Arc<Log>,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    busy: Arc<AtomicBool>,
    mut paused: watch::Receiver<bool>,
) {
    while let Some(job) = jobs.recv().await {
        // idle-to-busy gate: queued work waits here while paused
        while *paused.borrow() {
            if paused.changed().await.is_err() {
                let _ = job.done.send(Err(AgentError::new("execution slot is closed")));
                return;
            }
        }

        busy.store(true, Ordering::SeqCst);
        let result = agent.respond(Arc::clone(&log), job.input).await;
        busy.store(false, Ordering::SeqCst);

        if let Err(err) = &result {
            tracing::warn!(error = %err, "agent loop failed");
            log.append(
                EntryKind::Error,
                Some("Agent error".to_string()),
                err.to_string(),
            );
        }

        // receiver may be gone for fire-and-forget submissions
        let _ = job.done.send(result);
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use async_trait::async_trait;

    use super::*;

    /// Records processed inputs; fails on inputs starting with "fail".
    struct RecordingAgent {
        seen: Mutex<Vec<String>>,
    }

    impl RecordingAgent {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AgentLoop for RecordingAgent {
        async fn respond(&self, log: Arc<Log>, input: String) -> Result<String, AgentError> {
            // yield so queued submissions can pile up behind this one
            tokio::task::yield_now().await;
            if input.starts_with("fail") {
                return Err(AgentError::new("boom"));
            }
            self.seen.lock().unwrap().push(input.clone());
            log.append(EntryKind::Agent, None, format!("echo: {input}"));
            Ok(format!("echo: {input}"))
        }
    }

    #[tokio::test]
    async fn submissions_complete_in_fifo_order() {
        let agent = RecordingAgent::new();
        let log = Arc::new(Log::new());
        let slot = ExecutionSlot::spawn(agent.clone(), log);

        let handles: Vec<_> = (0..5).map(|i| slot.submit(format!("m{i}"))).collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.wait().await.unwrap(), format!("echo: m{i}"));
        }
        assert_eq!(
            *agent.seen.lock().unwrap(),
            vec!["m0", "m1", "m2", "m3", "m4"]
        );
    }

    #[tokio::test]
    async fn failure_resolves_handle_and_slot_recovers() {
        let agent = RecordingAgent::new();
        let log = Arc::new(Log::new());
        let slot = ExecutionSlot::spawn(agent, Arc::clone(&log));

        let err = slot.submit("fail now").wait().await.unwrap_err();
        assert_eq!(err.to_string(), "boom");

        // failure was logged and the slot is idle again
        let entries = log.since(0);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::Error);
        assert!(!slot.is_busy());

        // next submission is processed normally
        assert_eq!(slot.submit("ok").wait().await.unwrap(), "echo: ok");
    }

    #[tokio::test]
    async fn pause_gates_start_and_resume_wakes_queued_work() {
        let agent = RecordingAgent::new();
        let log = Arc::new(Log::new());
        let slot = ExecutionSlot::spawn(agent.clone(), Arc::clone(&log));

        slot.set_paused(true);
        let first = slot.submit("one");
        let second = slot.submit("two");

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(agent.seen.lock().unwrap().is_empty());
        assert!(log.since(0).is_empty());

        slot.set_paused(false);
        assert_eq!(first.wait().await.unwrap(), "echo: one");
        assert_eq!(second.wait().await.unwrap(), "echo: two");
        assert_eq!(*agent.seen.lock().unwrap(), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn dropped_slot_resolves_pending_handles() {
        let agent = RecordingAgent::new();
        let log = Arc::new(Log::new());
        let slot = ExecutionSlot::spawn(agent, log);

        slot.set_paused(true);
        let handle = slot.submit("never runs");
        drop(slot);

        let err = handle.wait().await.unwrap_err();
        assert!(err.to_string().contains("closed"));
    }
}
