use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One translated query kept in history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub query: String,
    pub command: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub risk_level: i64,
    #[serde(default)]
    pub is_favorite: bool,
}

/// Entries that share a calendar day, newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup<'a> {
    pub date: NaiveDate,
    pub entries: Vec<&'a HistoryEntry>,
}

/// Capacity-bounded command history, newest entry at the front.
///
/// The in-memory list is authoritative; the optional file is a best-effort
/// mirror and write failures are only logged.
#[derive(Debug)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
    path: Option<PathBuf>,
}

impl HistoryStore {
    /// In-memory history holding at most `limit` entries
    #[must_use]
    pub fn in_memory(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.min(64)),
            limit: limit.max(1),
            path: None,
        }
    }

    /// History mirrored to `path`, loading whatever is already there.
    ///
    /// A missing or unreadable file starts an empty history.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>, limit: usize) -> Self {
        let path = path.into();
        let mut store = Self::in_memory(limit);

        match load_entries(&path) {
            Ok(Some(mut entries)) => {
                entries.truncate(store.limit);
                debug!("Loaded {} history entries from {:?}", entries.len(), path);
                store.entries = entries.into();
            }
            Ok(None) => debug!("No history file at {:?}", path),
            Err(e) => warn!("Failed to load history from {:?}: {:#}", path, e),
        }

        store.path = Some(path);
        store
    }

    /// Add a new entry at the front, evicting the oldest beyond the limit
    pub fn record(&mut self, query: &str, command: &str, risk_level: i64) -> &HistoryEntry {
        self.record_at(query, command, risk_level, Utc::now())
    }

    /// [`record`](Self::record) with an explicit timestamp
    pub fn record_at(
        &mut self,
        query: &str,
        command: &str,
        risk_level: i64,
        timestamp: DateTime<Utc>,
    ) -> &HistoryEntry {
        self.entries.push_front(HistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            query: query.to_string(),
            command: command.to_string(),
            timestamp,
            risk_level,
            is_favorite: false,
        });
        self.entries.truncate(self.limit);
        self.persist();

        &self.entries[0]
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// Flag the most recent entry whose command matches. Returns whether one did.
    pub fn mark_favorite(&mut self, command: &str) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.command == command) else {
            return false;
        };
        entry.is_favorite = true;
        self.persist();
        true
    }

    /// Query text of an entry, for putting back into the input field
    #[must_use]
    pub fn reuse(&self, id: &str) -> Option<&str> {
        self.get(id).map(|e| e.query.as_str())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries newest first
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn nth(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Group by local calendar day
    #[must_use]
    pub fn grouped_by_day(&self) -> Vec<DayGroup<'_>> {
        self.grouped_by_day_in(&Local)
    }

    /// Group by calendar day in `tz`: newest day first, newest entry first
    /// within a day
    #[must_use]
    pub fn grouped_by_day_in<Tz: TimeZone>(&self, tz: &Tz) -> Vec<DayGroup<'_>> {
        let mut sorted: Vec<&HistoryEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let mut groups: Vec<DayGroup<'_>> = Vec::new();
        for entry in sorted {
            let date = entry.timestamp.with_timezone(tz).date_naive();
            match groups.last_mut() {
                Some(group) if group.date == date => group.entries.push(entry),
                _ => groups.push(DayGroup {
                    date,
                    entries: vec![entry],
                }),
            }
        }
        groups
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = save_entries(path, &self.entries) {
            warn!("Failed to save history to {:?}: {:#}", path, e);
        }
    }
}

fn load_entries(path: &Path) -> Result<Option<Vec<HistoryEntry>>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path).context("Failed to read history file")?;
    let entries = serde_json::from_str(&json).context("Failed to parse history file")?;
    Ok(Some(entries))
}

fn save_entries(path: &Path, entries: &VecDeque<HistoryEntry>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create history directory")?;
    }
    let json = serde_json::to_string(entries).context("Failed to serialize history")?;
    fs::write(path, json).context("Failed to write history file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};
    use tempfile::tempdir;

    #[test]
    fn test_record_prepends() {
        let mut store = HistoryStore::in_memory(10);
        store.record("list files", "ls", 0);
        store.record("disk usage", "df -h", 0);

        let commands: Vec<&str> = store.entries().map(|e| e.command.as_str()).collect();
        assert_eq!(commands, ["df -h", "ls"]);
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut store = HistoryStore::in_memory(3);
        for i in 0..5 {
            store.record(&format!("q{i}"), &format!("c{i}"), 0);
        }
        let queries: Vec<&str> = store.entries().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, ["q4", "q3", "q2"]);
    }

    #[test]
    fn test_mark_favorite_most_recent_match() {
        let mut store = HistoryStore::in_memory(10);
        store.record("first", "ls", 0);
        store.record("other", "pwd", 0);
        store.record("second", "ls", 0);

        assert!(store.mark_favorite("ls"));
        let flagged: Vec<&str> = store
            .entries()
            .filter(|e| e.is_favorite)
            .map(|e| e.query.as_str())
            .collect();
        assert_eq!(flagged, ["second"]);

        assert!(!store.mark_favorite("rm -rf /"));
    }

    #[test]
    fn test_reuse_returns_query() {
        let mut store = HistoryStore::in_memory(10);
        let id = store.record("show processes", "ps aux", 1).id.clone();
        assert_eq!(store.reuse(&id), Some("show processes"));
        assert_eq!(store.reuse("missing"), None);
    }

    #[test]
    fn test_persisted_round_trip_and_clear() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::open(&path, 50);
        store.record("list files", "ls -la", 0);
        store.mark_favorite("ls -la");

        let reloaded = HistoryStore::open(&path, 50);
        assert_eq!(reloaded.len(), 1);
        let entry = reloaded.nth(0).unwrap();
        assert_eq!(entry.command, "ls -la");
        assert!(entry.is_favorite);

        store.clear();
        let reloaded = HistoryStore::open(&path, 50);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_load_truncates_to_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::open(&path, 50);
        for i in 0..8 {
            store.record(&format!("q{i}"), "ls", 0);
        }

        let small = HistoryStore::open(&path, 5);
        assert_eq!(small.len(), 5);
        assert_eq!(small.nth(0).unwrap().query, "q7");
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{not json").unwrap();

        let store = HistoryStore::open(&path, 50);
        assert!(store.is_empty());
    }

    #[test]
    fn test_unwritable_path_keeps_memory() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();

        let mut store = HistoryStore::open(blocker.join("history.json"), 50);
        store.record("list files", "ls", 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_grouped_by_day() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let day1 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let day2 = day1 + Duration::days(1);

        let mut store = HistoryStore::in_memory(10);
        store.record_at("a", "ls", 0, day1);
        store.record_at("b", "pwd", 0, day1 + Duration::hours(2));
        store.record_at("c", "df", 0, day2);

        let groups = store.grouped_by_day_in(&utc);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, day2.date_naive());
        assert_eq!(groups[0].entries[0].query, "c");

        let day1_queries: Vec<&str> = groups[1].entries.iter().map(|e| e.query.as_str()).collect();
        assert_eq!(day1_queries, ["b", "a"]);
    }
}
