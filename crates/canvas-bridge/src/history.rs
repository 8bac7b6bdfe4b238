use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Which outbound page capability produced an entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryKind {
    TextQuery,
    StateUpdate,
}

impl HistoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextQuery => "text-query",
            Self::StateUpdate => "state-update",
        }
    }
}

/// One observed outbound call. Appended only, never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: HistoryKind,
    pub label: String,
    pub at: DateTime<Utc>,
}

/// Append-only record of outbound calls, kept in insertion order.
///
/// Every append republishes the full snapshot to subscribers; display
/// layers may reverse for presentation but the stored order never changes.
pub struct HistoryLog {
    entries: Mutex<Vec<HistoryEntry>>,
    feed: broadcast::Sender<Vec<HistoryEntry>>,
}

impl HistoryLog {
    pub fn new(capacity: usize) -> Self {
        let (feed, _) = broadcast::channel(capacity.max(1));
        Self {
            entries: Mutex::new(Vec::new()),
            feed,
        }
    }

    /// Record one call and republish. Returns the snapshot after the append.
    pub fn append(&self, kind: HistoryKind, label: impl Into<String>) -> Vec<HistoryEntry> {
        let entry = HistoryEntry {
            kind,
            label: label.into(),
            at: Utc::now(),
        };
        let snapshot = {
            let mut entries = self.entries.lock();
            entries.push(entry);
            entries.clone()
        };
        let _ = self.feed.send(snapshot.clone());
        snapshot
    }

    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.lock().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Vec<HistoryEntry>> {
        self.feed.subscribe()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(16)
    }
}
