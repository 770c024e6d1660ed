//! Per-user weekly mood summary, computed in process from the user's own
//! embedded entries.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::MoodEntry;

/// Entries shown in the `recent` listing
const RECENT_LIMIT: usize = 7;

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyMoodReport {
    pub total_entries: usize,
    /// Mean mood level over the window, rounded to two decimals; 0 when empty
    pub average_level: f64,
    pub feeling_counts: BTreeMap<String, u32>,
    /// Newest-first, capped at [`RECENT_LIMIT`]
    pub recent: Vec<MoodEntry>,
}

/// Summarize the mood entries recorded during the 7 days before `now`
pub fn weekly_mood_summary(entries: &[MoodEntry], now: DateTime<Utc>) -> WeeklyMoodReport {
    let cutoff = now - Duration::days(7);

    let mut week: Vec<MoodEntry> = entries
        .iter()
        .filter(|e| e.recorded_at.to_chrono() >= cutoff)
        .cloned()
        .collect();

    let total_entries = week.len();

    let average_level = if total_entries > 0 {
        let sum: i64 = week.iter().map(|e| i64::from(e.level)).sum();
        let mean = sum as f64 / total_entries as f64;
        (mean * 100.0).round() / 100.0
    } else {
        0.0
    };

    let mut feeling_counts = BTreeMap::new();
    for entry in &week {
        *feeling_counts.entry(entry.feeling.clone()).or_insert(0) += 1;
    }

    week.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    week.truncate(RECENT_LIMIT);

    WeeklyMoodReport {
        total_entries,
        average_level,
        feeling_counts,
        recent: week,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::DateTime as BsonDateTime;

    fn entry_at(level: i32, feeling: &str, days_ago: i64, now: DateTime<Utc>) -> MoodEntry {
        let mut entry = MoodEntry::new(level, feeling, None).unwrap();
        entry.recorded_at = BsonDateTime::from_chrono(now - Duration::days(days_ago));
        entry
    }

    #[test]
    fn empty_entries_produce_zeroed_report() {
        let report = weekly_mood_summary(&[], Utc::now());
        assert_eq!(report.total_entries, 0);
        assert_eq!(report.average_level, 0.0);
        assert!(report.feeling_counts.is_empty());
        assert!(report.recent.is_empty());
    }

    #[test]
    fn entries_older_than_a_week_are_excluded() {
        let now = Utc::now();
        let entries = vec![
            entry_at(4, "calm", 1, now),
            entry_at(2, "tense", 3, now),
            entry_at(5, "great", 10, now),
        ];

        let report = weekly_mood_summary(&entries, now);
        assert_eq!(report.total_entries, 2);
        assert_eq!(report.average_level, 3.0);
        assert_eq!(report.feeling_counts.get("calm"), Some(&1));
        assert_eq!(report.feeling_counts.get("great"), None);
    }

    #[test]
    fn recent_listing_is_newest_first_and_capped() {
        let now = Utc::now();
        let entries: Vec<MoodEntry> = (0..9i64)
            .map(|i| entry_at(3, "steady", i % 7, now))
            .collect();

        let report = weekly_mood_summary(&entries, now);
        assert_eq!(report.recent.len(), 7);
        for pair in report.recent.windows(2) {
            assert!(pair[0].recorded_at >= pair[1].recorded_at);
        }
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        let now = Utc::now();
        let entries = vec![
            entry_at(5, "great", 0, now),
            entry_at(4, "good", 1, now),
            entry_at(4, "good", 2, now),
        ];

        let report = weekly_mood_summary(&entries, now);
        assert_eq!(report.average_level, 4.33);
    }
}
