//! Meditation catalog document.
//!
//! Meditations live in their own collection; user history points at them by
//! id without preventing deletion.

use std::fmt;
use std::str::FromStr;

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::IntoIndexes;
use crate::models::ModelError;

/// Collection name for meditations
pub const MEDITATION_COLLECTION: &str = "meditations";

/// Suggested values for the free-form `kind` field
pub const RECOMMENDED_KINDS: &[&str] = &[
    "breathing",
    "mindfulness",
    "body scan",
    "visualization",
    "mantra",
    "relaxation",
    "sleep",
];

/// Meditation document stored in MongoDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeditationDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Not unique; duplicate-title inserts require caller confirmation
    pub title: String,

    pub description: String,

    /// Positive minutes
    pub duration_minutes: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,

    /// Free string; see [`RECOMMENDED_KINDS`]
    pub kind: String,

    pub category: Category,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl MeditationDoc {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        duration_minutes: i64,
        kind: impl Into<String>,
        category: Category,
    ) -> Result<Self, ModelError> {
        if duration_minutes <= 0 {
            return Err(ModelError::NonPositiveDuration(duration_minutes));
        }
        Ok(Self {
            id: None,
            title: title.into(),
            description: description.into(),
            duration_minutes,
            audio_url: None,
            kind: kind.into(),
            category,
            cover_url: None,
        })
    }
}

impl IntoIndexes for MeditationDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Title lookups and duplicate detection; deliberately not unique
            (
                doc! { "title": 1 },
                Some(IndexOptions::builder().name("title_index".to_string()).build()),
            ),
            (
                doc! { "category": 1, "kind": 1 },
                Some(
                    IndexOptions::builder()
                        .name("category_kind_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

/// Closed difficulty enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Beginner,
    Intermediate,
    Advanced,
}

impl Category {
    pub const ALL: &'static [Category] =
        &[Category::Beginner, Category::Intermediate, Category::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Beginner => "beginner",
            Category::Intermediate => "intermediate",
            Category::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Category::Beginner),
            "intermediate" => Ok(Category::Intermediate),
            "advanced" => Ok(Category::Advanced),
            other => Err(ModelError::UnknownCategory(other.to_string())),
        }
    }
}

/// Projected subset returned by list-summary queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeditationSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub kind: String,
    pub category: Category,
    pub duration_minutes: i64,
}

/// Partial catalog update; `_id` can never reach the merge
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeditationPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<i64>,
    pub audio_url: Option<String>,
    pub kind: Option<String>,
    pub category: Option<Category>,
    pub cover_url: Option<String>,
}

impl MeditationPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.duration_minutes.is_none()
            && self.audio_url.is_none()
            && self.kind.is_none()
            && self.category.is_none()
            && self.cover_url.is_none()
    }

    pub fn into_update_document(self) -> Result<Document, ModelError> {
        let mut set = Document::new();
        if let Some(title) = self.title {
            set.insert("title", title);
        }
        if let Some(description) = self.description {
            set.insert("description", description);
        }
        if let Some(duration) = self.duration_minutes {
            if duration <= 0 {
                return Err(ModelError::NonPositiveDuration(duration));
            }
            set.insert("duration_minutes", duration);
        }
        if let Some(audio_url) = self.audio_url {
            set.insert("audio_url", audio_url);
        }
        if let Some(kind) = self.kind {
            set.insert("kind", kind);
        }
        if let Some(category) = self.category {
            set.insert("category", category.as_str());
        }
        if let Some(cover_url) = self.cover_url {
            set.insert("cover_url", cover_url);
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_duration() {
        let err = MeditationDoc::new("x", "y", 0, "breathing", Category::Beginner);
        assert!(matches!(err, Err(ModelError::NonPositiveDuration(0))));
        assert!(MeditationDoc::new("x", "y", 10, "breathing", Category::Beginner).is_ok());
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Beginner".parse::<Category>().unwrap(), Category::Beginner);
        assert_eq!(" advanced ".parse::<Category>().unwrap(), Category::Advanced);
        assert!(matches!(
            "expert".parse::<Category>(),
            Err(ModelError::UnknownCategory(_))
        ));
    }

    #[test]
    fn category_serializes_lowercase() {
        let m = MeditationDoc::new("Morning Calm", "d", 10, "mindfulness", Category::Beginner)
            .unwrap();
        let doc = bson::to_document(&m).unwrap();
        assert_eq!(doc.get_str("category").unwrap(), "beginner");
    }

    #[test]
    fn patch_validates_duration() {
        let patch = MeditationPatch {
            duration_minutes: Some(-5),
            ..Default::default()
        };
        assert!(patch.into_update_document().is_err());
    }
}
