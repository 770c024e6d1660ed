//! Read-only reporting over the document model.
//!
//! The user document embeds its history and mood arrays for locality, while
//! meditations stay normalized in their own catalog collection. Any report
//! spanning both therefore reconstructs a normalized view on read with an
//! explicit join, and that join must be a left-outer one: history entries
//! hold weak references that may dangle after a meditation is deleted.

pub mod pipelines;
pub mod weekly;

pub use pipelines::REMOVED_PLACEHOLDER;
pub use weekly::{weekly_mood_summary, WeeklyMoodReport};

use bson::{oid::ObjectId, DateTime, Document};
use futures::TryStreamExt;
use mongodb::Collection;
use serde::{Deserialize, Serialize};

use crate::db::StoreGateway;
use crate::models::{MEDITATION_COLLECTION, USER_COLLECTION};
use crate::repository::RepoError;

/// Row of report 1: one (category, kind) group
#[derive(Debug, Clone, Serialize)]
pub struct CategoryKindRow {
    pub category: String,
    pub kind: String,
    pub total: i64,
    pub avg_duration: Option<f64>,
}

/// Row of report 2: one (level, feeling) group
#[derive(Debug, Clone, Serialize)]
pub struct MoodDistributionRow {
    pub level: i32,
    pub feeling: String,
    pub total: i64,
}

/// Row of report 3: one completed meditation with joined catalog detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryDetailRow {
    pub user_name: String,
    pub user_email: String,
    /// `REMOVED_PLACEHOLDER` when the referenced meditation no longer exists
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_minutes: Option<i64>,
    pub completed_at: DateTime,
}

/// Row of report 4: one user with derived activity counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveUserRow {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub total_meditations: i64,
    pub total_moods: i64,
    pub registered_at: DateTime,
}

// Wire shapes for the grouped reports: the group key arrives nested
// under `_id`.

#[derive(Debug, Deserialize)]
struct CategoryKindGroup {
    #[serde(rename = "_id")]
    key: CategoryKindKey,
    total: i64,
    avg_duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CategoryKindKey {
    category: Option<String>,
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MoodGroup {
    #[serde(rename = "_id")]
    key: MoodKey,
    total: i64,
}

#[derive(Debug, Deserialize)]
struct MoodKey {
    level: i32,
    feeling: Option<String>,
}

/// The aggregation engine. Holds raw collection handles obtained from the
/// gateway; every report is a pure function of current stored state.
#[derive(Clone)]
pub struct ReportEngine {
    users: Collection<Document>,
    meditations: Collection<Document>,
}

impl ReportEngine {
    pub fn new(gateway: &StoreGateway) -> Self {
        Self {
            users: gateway.collection(USER_COLLECTION),
            meditations: gateway.collection(MEDITATION_COLLECTION),
        }
    }

    /// Report 1: meditations by category and kind. An empty catalog yields
    /// an empty report.
    pub async fn meditations_by_category_kind(&self) -> Result<Vec<CategoryKindRow>, RepoError> {
        let docs = run(&self.meditations, pipelines::meditations_by_category_kind()).await?;

        let mut rows = Vec::with_capacity(docs.len());
        for doc in docs {
            let group: CategoryKindGroup = bson::from_document(doc)?;
            rows.push(CategoryKindRow {
                category: group.key.category.unwrap_or_else(|| "unknown".to_string()),
                kind: group.key.kind.unwrap_or_else(|| "unknown".to_string()),
                total: group.total,
                avg_duration: group.avg_duration,
            });
        }
        Ok(rows)
    }

    /// Report 2: mood distribution across every user's entries
    pub async fn mood_distribution(&self) -> Result<Vec<MoodDistributionRow>, RepoError> {
        let docs = run(&self.users, pipelines::mood_distribution()).await?;

        let mut rows = Vec::with_capacity(docs.len());
        for doc in docs {
            let group: MoodGroup = bson::from_document(doc)?;
            rows.push(MoodDistributionRow {
                level: group.key.level,
                feeling: group.key.feeling.unwrap_or_else(|| "unspecified".to_string()),
                total: group.total,
            });
        }
        Ok(rows)
    }

    /// Report 3: meditation history with joined catalog detail, newest
    /// completion first, capped at `limit`
    pub async fn history_detail(&self, limit: i64) -> Result<Vec<HistoryDetailRow>, RepoError> {
        let docs = run(&self.users, pipelines::history_detail(limit)).await?;

        docs.into_iter()
            .map(|doc| bson::from_document(doc).map_err(RepoError::from))
            .collect()
    }

    /// Report 4: most active users by meditation count, capped at `limit`
    pub async fn most_active_users(&self, limit: i64) -> Result<Vec<ActiveUserRow>, RepoError> {
        let docs = run(&self.users, pipelines::most_active_users(limit)).await?;

        docs.into_iter()
            .map(|doc| bson::from_document(doc).map_err(RepoError::from))
            .collect()
    }
}

async fn run(
    collection: &Collection<Document>,
    pipeline: Vec<Document>,
) -> Result<Vec<Document>, RepoError> {
    let docs = collection.aggregate(pipeline).await?.try_collect().await?;
    Ok(docs)
}
