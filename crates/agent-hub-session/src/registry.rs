//! Process-wide registry of live contexts.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use agent_hub_core::{AgentLoop, ChatRecord};
use uuid::Uuid;

use crate::context::{Context, ContextSummary};

struct Inner {
    contexts: HashMap<String, Arc<Context>>,
    next_no: u64,
}

/// Process-wide map of context id to live context.
///
/// The lock guards map mutations and snapshots only; it is never held
/// across a log or slot operation, so contention on one context cannot
/// serialize unrelated work.
pub struct ContextRegistry {
    agent: Arc<dyn AgentLoop>,
    inner: Mutex<Inner>,
}

impl ContextRegistry {
    /// Create an empty registry. New contexts run `agent` as their loop.
    #[must_use]
    pub fn new(agent: Arc<dyn AgentLoop>) -> Self {
        Self {
            agent,
            inner: Mutex::new(Inner {
                contexts: HashMap::new(),
                next_no: 0,
            }),
        }
    }

    /// Resolve a context id, creating on demand.
    ///
    /// An empty id resolves to the earliest-created context, or to a
    /// fresh context with a generated id when none exist. A non-empty
    /// unknown id creates a context with that exact id, which is what
    /// lets clients resume persisted sessions.
    #[must_use]
    pub fn get_or_create(&self, id: &str) -> Arc<Context> {
        let mut inner = self.inner.lock().unwrap();
        if id.is_empty() {
            if let Some(first) = inner.contexts.values().min_by_key(|c| c.no()) {
                return Arc::clone(first);
            }
            let generated = Uuid::new_v4().to_string();
            return Self::insert_new(&mut inner, generated, &self.agent);
        }
        if let Some(ctx) = inner.contexts.get(id) {
            return Arc::clone(ctx);
        }
        Self::insert_new(&mut inner, id.to_string(), &self.agent)
    }

    /// Pure lookup, no creation.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Context>> {
        self.inner.lock().unwrap().contexts.get(id).cloned()
    }

    /// Remove a context. Unknown ids are a no-op; returns the removed
    /// context if there was one.
    pub fn remove(&self, id: &str) -> Option<Arc<Context>> {
        self.inner.lock().unwrap().contexts.remove(id)
    }

    /// Register a restored chat, replacing any live context with the
    /// same id.
    pub fn insert_restored(&self, record: ChatRecord) -> Arc<Context> {
        let mut inner = self.inner.lock().unwrap();
        let no = inner.next_no;
        inner.next_no += 1;
        let ctx = Arc::new(Context::restore(record, no, Arc::clone(&self.agent)));
        inner.contexts.insert(ctx.id().to_string(), Arc::clone(&ctx));
        ctx
    }

    /// Roster snapshot for pollers, in creation order.
    ///
    /// Summaries are built after the registry lock drops; each one
    /// takes its own brief log read.
    #[must_use]
    pub fn list(&self) -> Vec<ContextSummary> {
        let contexts: Vec<Arc<Context>> = {
            let inner = self.inner.lock().unwrap();
            inner.contexts.values().cloned().collect()
        };
        let mut summaries: Vec<ContextSummary> = contexts.iter().map(|c| c.summary()).collect();
        summaries.sort_by_key(|s| s.no);
        summaries
    }

    fn insert_new(inner: &mut Inner, id: String, agent: &Arc<dyn AgentLoop>) -> Arc<Context> {
        let no = inner.next_no;
        inner.next_no += 1;
        let ctx = Arc::new(Context::new(id.clone(), no, Arc::clone(agent)));
        inner.contexts.insert(id, Arc::clone(&ctx));
        ctx
    }
}
