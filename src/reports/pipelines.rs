//! Pipeline definitions for the four reports.
//!
//! Builders are pure: they only assemble stage documents, so the exact
//! shape of every pipeline is testable without a running store.

use bson::{doc, Document};

use crate::models::MEDITATION_COLLECTION;

/// Title substituted when a history entry references a meditation that no
/// longer exists. The join below is a left outer join precisely so these
/// rows survive.
pub const REMOVED_PLACEHOLDER: &str = "[removed]";

/// Report 1: meditations grouped by (category, kind) with count and mean
/// duration, sorted by category ascending then count descending.
pub fn meditations_by_category_kind() -> Vec<Document> {
    vec![
        doc! {
            "$group": {
                "_id": {
                    "category": "$category",
                    "kind": "$kind"
                },
                "total": { "$sum": 1 },
                "avg_duration": { "$avg": "$duration_minutes" }
            }
        },
        doc! {
            "$sort": { "_id.category": 1, "total": -1 }
        },
    ]
}

/// Report 2: every user's mood entries flattened and grouped by
/// (level, feeling), sorted by level descending then count descending.
pub fn mood_distribution() -> Vec<Document> {
    vec![
        doc! { "$unwind": "$mood_entries" },
        doc! {
            "$group": {
                "_id": {
                    "level": "$mood_entries.level",
                    "feeling": "$mood_entries.feeling"
                },
                "total": { "$sum": 1 }
            }
        },
        doc! { "$sort": { "_id.level": -1, "total": -1 } },
    ]
}

/// Report 3: flattened meditation history joined against the catalog.
/// Left-outer semantics: a dangling reference keeps its row and gets the
/// placeholder title instead of being dropped.
pub fn history_detail(limit: i64) -> Vec<Document> {
    vec![
        doc! { "$unwind": "$meditation_history" },
        doc! {
            "$lookup": {
                "from": MEDITATION_COLLECTION,
                "localField": "meditation_history.meditation_id",
                "foreignField": "_id",
                "as": "meditation"
            }
        },
        doc! {
            "$unwind": {
                "path": "$meditation",
                "preserveNullAndEmptyArrays": true
            }
        },
        doc! {
            "$project": {
                "_id": 0,
                "user_name": "$name",
                "user_email": "$email",
                "title": { "$ifNull": ["$meditation.title", REMOVED_PLACEHOLDER] },
                "kind": "$meditation.kind",
                "category": "$meditation.category",
                "planned_minutes": "$meditation.duration_minutes",
                "actual_minutes": "$meditation_history.actual_minutes",
                "completed_at": "$meditation_history.completed_at"
            }
        },
        doc! { "$sort": { "completed_at": -1 } },
        doc! { "$limit": limit },
    ]
}

/// Report 4: per-user activity counts derived with `$size` so the array
/// contents are never materialized, sorted by meditation count descending.
pub fn most_active_users(limit: i64) -> Vec<Document> {
    vec![
        doc! {
            "$project": {
                "name": 1,
                "email": 1,
                "total_meditations": { "$size": { "$ifNull": ["$meditation_history", []] } },
                "total_moods": { "$size": { "$ifNull": ["$mood_entries", []] } },
                "registered_at": 1
            }
        },
        doc! { "$sort": { "total_meditations": -1 } },
        doc! { "$limit": limit },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_kind_pipeline_groups_then_sorts() {
        let pipeline = meditations_by_category_kind();
        assert_eq!(pipeline.len(), 2);

        let group = pipeline[0].get_document("$group").unwrap();
        let key = group.get_document("_id").unwrap();
        assert_eq!(key.get_str("category").unwrap(), "$category");
        assert_eq!(key.get_str("kind").unwrap(), "$kind");
        assert!(group.contains_key("avg_duration"));

        let sort = pipeline[1].get_document("$sort").unwrap();
        assert_eq!(sort.get_i32("_id.category").unwrap(), 1);
        assert_eq!(sort.get_i32("total").unwrap(), -1);
    }

    #[test]
    fn mood_pipeline_unwinds_before_grouping() {
        let pipeline = mood_distribution();
        assert_eq!(pipeline[0].get_str("$unwind").unwrap(), "$mood_entries");

        let sort = pipeline[2].get_document("$sort").unwrap();
        assert_eq!(sort.get_i32("_id.level").unwrap(), -1);
    }

    #[test]
    fn history_pipeline_joins_with_outer_semantics() {
        let pipeline = history_detail(50);
        assert_eq!(pipeline.len(), 6);

        let lookup = pipeline[1].get_document("$lookup").unwrap();
        assert_eq!(lookup.get_str("from").unwrap(), MEDITATION_COLLECTION);
        assert_eq!(
            lookup.get_str("localField").unwrap(),
            "meditation_history.meditation_id"
        );
        assert_eq!(lookup.get_str("foreignField").unwrap(), "_id");

        // The lookup result unwind must preserve rows with no match,
        // otherwise dangling references would silently disappear
        let unwind = pipeline[2].get_document("$unwind").unwrap();
        assert!(unwind.get_bool("preserveNullAndEmptyArrays").unwrap());

        let project = pipeline[3].get_document("$project").unwrap();
        let title = project.get_document("title").unwrap();
        let fallback = title.get_array("$ifNull").unwrap();
        assert_eq!(fallback[1].as_str().unwrap(), REMOVED_PLACEHOLDER);

        assert_eq!(pipeline[5].get_i64("$limit").unwrap(), 50);
    }

    #[test]
    fn active_users_pipeline_never_materializes_arrays() {
        let pipeline = most_active_users(10);
        let project = pipeline[0].get_document("$project").unwrap();

        let meditations = project.get_document("total_meditations").unwrap();
        assert!(meditations.contains_key("$size"));
        let moods = project.get_document("total_moods").unwrap();
        assert!(moods.contains_key("$size"));

        let sort = pipeline[1].get_document("$sort").unwrap();
        assert_eq!(sort.get_i32("total_meditations").unwrap(), -1);
        assert_eq!(pipeline[2].get_i64("$limit").unwrap(), 10);
    }
}
