use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use nlcmd::history::HistoryStore;

proptest! {
    #[test]
    fn history_never_exceeds_limit(limit in 1usize..20, count in 0usize..60) {
        let mut store = HistoryStore::in_memory(limit);
        for i in 0..count {
            store.record(&format!("query {i}"), &format!("echo {i}"), 0);
        }

        prop_assert_eq!(store.len(), count.min(limit));
        // Newest first, oldest evicted
        for (pos, entry) in store.entries().enumerate() {
            prop_assert_eq!(&entry.command, &format!("echo {}", count - 1 - pos));
        }
    }

    #[test]
    fn reload_keeps_the_newest_entries(limit in 1usize..15, count in 1usize..30) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::open(&path, limit);
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        for i in 0..count {
            let at = base + Duration::minutes(i64::try_from(i).unwrap());
            store.record_at(&format!("q{i}"), &format!("c{i}"), 1, at);
        }

        let reloaded = HistoryStore::open(&path, limit);
        let before: Vec<_> = store.entries().cloned().collect();
        let after: Vec<_> = reloaded.entries().cloned().collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn grouping_preserves_every_entry(hours in proptest::collection::vec(0i64..240, 0..40)) {
        let mut store = HistoryStore::in_memory(100);
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        for (i, h) in hours.iter().enumerate() {
            store.record_at(&format!("q{i}"), "true", 0, base + Duration::hours(*h));
        }

        let groups = store.grouped_by_day_in(&Utc);
        let total: usize = groups.iter().map(|g| g.entries.len()).sum();
        prop_assert_eq!(total, hours.len());
        for pair in groups.windows(2) {
            prop_assert!(pair[0].date > pair[1].date);
        }
    }
}
