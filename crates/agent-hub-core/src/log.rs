//! Versioned, append-mostly log for one context's output.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LogError;

/// Category of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// User input.
    User,
    /// Agent output.
    Agent,
    /// Tool invocation or tool output.
    Tool,
    /// Hint shown to the user.
    Hint,
    /// Informational message.
    Info,
    /// Non-fatal warning.
    Warning,
    /// Error report.
    Error,
    /// Internal/diagnostic message.
    Util,
}

/// One entry in a context's log.
///
/// Entries may be revised in place after creation (streaming partial
/// output); each revision bumps both the entry's `update_id` and the
/// owning log's version counter, so pollers re-fetch revised entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position in the log. Assigned at append, never reused.
    pub no: usize,
    /// Entry category.
    pub kind: EntryKind,
    /// Optional short heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    /// Entry body.
    pub content: String,
    /// Log version at which this entry was last mutated.
    pub update_id: u64,
}

/// Cheap metadata snapshot used for registry listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogMeta {
    /// Identifier of the current log incarnation; changes on reset.
    pub guid: Uuid,
    /// Monotonic mutation counter.
    pub version: u64,
    /// Number of entries.
    pub len: usize,
}

/// Consistent read for pollers: metadata, entries from a position, and
/// the current progress line, all taken under one lock acquisition.
#[derive(Debug, Clone)]
pub struct PollView {
    /// Metadata at the time of the read.
    pub meta: LogMeta,
    /// Entries at or after the requested position, current content.
    pub entries: Vec<LogEntry>,
    /// Latest progress line.
    pub progress: String,
}

struct Inner {
    guid: Uuid,
    version: u64,
    entries: Vec<LogEntry>,
    progress: String,
}

impl Inner {
    fn fresh() -> Self {
        Self {
            guid: Uuid::new_v4(),
            version: 0,
            entries: Vec::new(),
            progress: String::new(),
        }
    }
}

/// Versioned, append-mostly record of a context's observable output.
///
/// All mutations bump a monotonic version counter and all multi-field
/// reads happen under a single lock acquisition, so readers polling at
/// arbitrary intervals never observe a torn state.
pub struct Log {
    inner: RwLock<Inner>,
}

impl Default for Log {
    fn default() -> Self {
        Self::new()
    }
}

impl Log {
    /// Create an empty log with a fresh guid.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::fresh()),
        }
    }

    /// Rebuild a log from persisted state.
    ///
    /// The version counter resumes from the persisted value, clamped to
    /// at least the highest `update_id` (records written before the
    /// counter was persisted carry zero), so it stays monotonic across
    /// a restore.
    #[must_use]
    pub fn from_parts(guid: Uuid, version: u64, entries: Vec<LogEntry>, progress: String) -> Self {
        let floor = entries.iter().map(|e| e.update_id).max().unwrap_or(0);
        Self {
            inner: RwLock::new(Inner {
                guid,
                version: version.max(floor),
                entries,
                progress,
            }),
        }
    }

    /// Append an entry at the next position, returning its number.
    pub fn append(
        &self,
        kind: EntryKind,
        heading: Option<String>,
        content: impl Into<String>,
    ) -> usize {
        let mut inner = self.inner.write().unwrap();
        inner.version += 1;
        let no = inner.entries.len();
        let update_id = inner.version;
        inner.entries.push(LogEntry {
            no,
            kind,
            heading,
            content: content.into(),
            update_id,
        });
        no
    }

    /// Revise an existing entry in place.
    ///
    /// The mutator sees the entry's current state; afterwards the
    /// entry's `update_id` is set to the freshly bumped version.
    ///
    /// # Errors
    /// Returns [`LogError::NotFound`] if no entry exists at `no`.
    pub fn update(&self, no: usize, mutate: impl FnOnce(&mut LogEntry)) -> Result<(), LogError> {
        let mut inner = self.inner.write().unwrap();
        if no >= inner.entries.len() {
            return Err(LogError::NotFound(no));
        }
        inner.version += 1;
        let version = inner.version;
        let entry = &mut inner.entries[no];
        mutate(entry);
        // position is immutable even if the mutator touched it
        entry.no = no;
        entry.update_id = version;
        Ok(())
    }

    /// Latest-wins status line.
    pub fn set_progress(&self, text: impl Into<String>) {
        let mut inner = self.inner.write().unwrap();
        inner.version += 1;
        inner.progress = text.into();
    }

    /// Current progress line.
    #[must_use]
    pub fn progress(&self) -> String {
        self.inner.read().unwrap().progress.clone()
    }

    /// Entries at or after `from`, with their current content.
    #[must_use]
    pub fn since(&self, from: usize) -> Vec<LogEntry> {
        let inner = self.inner.read().unwrap();
        inner.entries.get(from..).unwrap_or_default().to_vec()
    }

    /// Cheap metadata read for registry listings.
    #[must_use]
    pub fn snapshot_meta(&self) -> LogMeta {
        let inner = self.inner.read().unwrap();
        LogMeta {
            guid: inner.guid,
            version: inner.version,
            len: inner.entries.len(),
        }
    }

    /// Metadata, entries from `from`, and progress in one consistent
    /// read. `poll_view(0)` is the full snapshot used for export.
    #[must_use]
    pub fn poll_view(&self, from: usize) -> PollView {
        let inner = self.inner.read().unwrap();
        PollView {
            meta: LogMeta {
                guid: inner.guid,
                version: inner.version,
                len: inner.entries.len(),
            },
            entries: inner.entries.get(from..).unwrap_or_default().to_vec(),
            progress: inner.progress.clone(),
        }
    }

    /// Clear everything and assign a fresh guid; the version counter
    /// restarts at zero.
    pub fn reset(&self) {
        let mut inner = self.inner.write().unwrap();
        *inner = Inner::fresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_assigns_positions_and_versions() {
        let log = Log::new();
        assert_eq!(log.append(EntryKind::User, None, "one"), 0);
        assert_eq!(log.append(EntryKind::Agent, None, "two"), 1);

        let meta = log.snapshot_meta();
        assert_eq!(meta.len, 2);
        assert_eq!(meta.version, 2);

        let entries = log.since(0);
        assert_eq!(entries[0].update_id, 1);
        assert_eq!(entries[1].update_id, 2);
    }

    #[test]
    fn update_revises_in_place_and_bumps_version() {
        let log = Log::new();
        let no = log.append(EntryKind::Agent, None, "partial");
        log.update(no, |e| e.content.push_str(" output")).unwrap();

        let entries = log.since(0);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "partial output");
        assert_eq!(entries[0].update_id, 2);
        assert_eq!(log.snapshot_meta().version, 2);
    }

    #[test]
    fn update_unknown_position_fails_without_version_bump() {
        let log = Log::new();
        let err = log.update(5, |_| {}).unwrap_err();
        assert!(matches!(err, LogError::NotFound(5)));
        assert_eq!(log.snapshot_meta().version, 0);
    }

    #[test]
    fn update_cannot_move_an_entry() {
        let log = Log::new();
        let no = log.append(EntryKind::Agent, None, "x");
        log.update(no, |e| e.no = 42).unwrap();
        assert_eq!(log.since(0)[0].no, no);
    }

    #[test]
    fn since_returns_tail_from_position() {
        let log = Log::new();
        for i in 0..4 {
            log.append(EntryKind::Info, None, format!("{i}"));
        }
        let tail = log.since(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].no, 2);
        assert!(log.since(10).is_empty());
    }

    #[test]
    fn progress_is_latest_wins_and_counted() {
        let log = Log::new();
        log.set_progress("a");
        log.set_progress("b");
        assert_eq!(log.progress(), "b");
        assert_eq!(log.snapshot_meta().version, 2);
    }

    #[test]
    fn poll_view_is_self_consistent() {
        let log = Log::new();
        log.append(EntryKind::User, None, "hello");
        log.set_progress("working");

        let view = log.poll_view(0);
        assert_eq!(view.meta.version, 2);
        assert_eq!(view.meta.len, view.entries.len());
        assert_eq!(view.progress, "working");
    }

    #[test]
    fn reset_issues_fresh_guid_and_clears() {
        let log = Log::new();
        let before = log.snapshot_meta().guid;
        log.append(EntryKind::User, None, "hello");
        log.reset();

        let meta = log.snapshot_meta();
        assert_ne!(meta.guid, before);
        assert_eq!(meta.version, 0);
        assert_eq!(meta.len, 0);
        assert_eq!(log.progress(), "");
    }

    #[test]
    fn from_parts_resumes_version_counter() {
        let log = Log::new();
        log.append(EntryKind::User, None, "a");
        log.append(EntryKind::Agent, None, "b");
        let view = log.poll_view(0);

        let restored =
            Log::from_parts(view.meta.guid, view.meta.version, view.entries, view.progress);
        assert_eq!(restored.snapshot_meta().version, 2);

        restored.append(EntryKind::User, None, "c");
        assert_eq!(restored.since(2)[0].update_id, 3);
    }

    #[test]
    fn from_parts_keeps_progress_bumps_in_version() {
        // progress bumps don't leave an update_id behind; the persisted
        // counter must carry them so restored versions never regress
        let log = Log::new();
        log.append(EntryKind::User, None, "a");
        log.set_progress("working");
        let view = log.poll_view(0);
        assert_eq!(view.meta.version, 2);

        let restored =
            Log::from_parts(view.meta.guid, view.meta.version, view.entries, view.progress);
        assert_eq!(restored.snapshot_meta().version, 2);
    }

    #[test]
    fn from_parts_clamps_missing_version_to_entry_floor() {
        let log = Log::new();
        log.append(EntryKind::User, None, "a");
        log.append(EntryKind::Agent, None, "b");
        let view = log.poll_view(0);

        let restored = Log::from_parts(view.meta.guid, 0, view.entries, view.progress);
        assert_eq!(restored.snapshot_meta().version, 2);
    }

    #[test]
    fn entry_kind_serializes_snake_case() {
        let json = serde_json::to_string(&EntryKind::User).unwrap();
        assert_eq!(json, "\"user\"");
        let kind: EntryKind = serde_json::from_str("\"tool\"").unwrap();
        assert_eq!(kind, EntryKind::Tool);
    }
}
