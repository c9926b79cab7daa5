use crate::catalog::ToolParams;
use crate::storage::{KeyValueStore, MemoryKeyValueStore};
use chrono::{Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Storage key the log is persisted under
pub const HISTORY_STORAGE_KEY: &str = "glider-mcp-history";

/// Maximum number of entries kept; older entries are evicted
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// Length of the compact "recent" view
pub const RECENT_HISTORY_LEN: usize = 20;

/// One completed tool invocation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub tool_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub params: ToolParams,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Milliseconds
    pub duration: u64,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Entry contents supplied by the caller; id and timestamp are assigned on insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
    pub tool_id: String,
    pub tool_name: String,
    pub params: ToolParams,
    pub success: bool,
    pub error: Option<String>,
    pub duration: u64,
}

impl HistoryEntry {
    fn from_new(entry: NewHistoryEntry) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tool_id: entry.tool_id,
            tool_name: entry.tool_name,
            params: entry.params,
            success: entry.success,
            error: entry.error,
            duration: entry.duration,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Aggregate counts over the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HistoryStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Bounded, most-recent-first record of tool invocations.
///
/// Every mutation is written through to the backing [`KeyValueStore`]. A
/// failed write is logged and the in-memory log stays authoritative.
pub struct HistoryLog {
    store: Arc<dyn KeyValueStore>,
    entries: RwLock<Vec<HistoryEntry>>,
}

impl HistoryLog {
    /// Load the log from `store`, starting empty if nothing usable is stored
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let entries = match store.get(HISTORY_STORAGE_KEY) {
            Ok(Some(raw)) => decode_history(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted history");
                Vec::new()
            }
        };

        tracing::debug!(entries = entries.len(), "History loaded");

        Self {
            store,
            entries: RwLock::new(entries),
        }
    }

    /// A log that is not persisted beyond the process
    pub fn in_memory() -> Self {
        Self::load(Arc::new(MemoryKeyValueStore::new()))
    }

    /// Record a completed invocation and return the stored entry
    pub fn add_entry(&self, entry: NewHistoryEntry) -> HistoryEntry {
        let entry = HistoryEntry::from_new(entry);

        let mut entries = self.write();
        entries.insert(0, entry.clone());
        entries.truncate(MAX_HISTORY_ENTRIES);
        self.persist(&entries);

        entry
    }

    /// Delete the entry with `id`. Returns whether anything was removed.
    pub fn remove_entry(&self, id: &str) -> bool {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|e| e.id != id);

        let removed = entries.len() != before;
        if removed {
            self.persist(&entries);
        }
        removed
    }

    pub fn clear(&self) {
        let mut entries = self.write();
        entries.clear();
        self.persist(&entries);
    }

    /// All entries, most recent first
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.read().clone()
    }

    pub fn recent(&self) -> Vec<HistoryEntry> {
        self.read().iter().take(RECENT_HISTORY_LEN).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.read().iter().filter(|e| e.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.read().iter().filter(|e| !e.success).count()
    }

    pub fn stats(&self) -> HistoryStats {
        let entries = self.read();
        let succeeded = entries.iter().filter(|e| e.success).count();
        HistoryStats {
            total: entries.len(),
            succeeded,
            failed: entries.len() - succeeded,
        }
    }

    pub fn get(&self, id: &str) -> Option<HistoryEntry> {
        self.read().iter().find(|e| e.id == id).cloned()
    }

    pub fn for_tool(&self, tool_id: &str) -> Vec<HistoryEntry> {
        self.read()
            .iter()
            .filter(|e| e.tool_id == tool_id)
            .cloned()
            .collect()
    }

    fn persist(&self, entries: &[HistoryEntry]) {
        let encoded = match serde_json::to_string(entries) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode history");
                return;
            }
        };

        if let Err(e) = self.store.set(HISTORY_STORAGE_KEY, &encoded) {
            tracing::warn!(error = %e, "Failed to persist history");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<HistoryEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<HistoryEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decode a persisted log. Anything unparseable decodes to an empty log.
pub fn decode_history(raw: &str) -> Vec<HistoryEntry> {
    match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable persisted history");
            Vec::new()
        }
    }
}

/// `850ms` below one second, `1.50s` otherwise
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.2}s", ms as f64 / 1000.0)
    }
}

/// Local wall-clock `HH:MM:SS` for an epoch-millisecond timestamp
pub fn format_timestamp(ts: i64) -> String {
    Local
        .timestamp_millis_opt(ts)
        .single()
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}
