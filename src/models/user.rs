//! User root document and its embedded sub-records.
//!
//! A user owns its embedded arrays exclusively; they grow by append only,
//! so insertion order is chronological with the newest entry last.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::IntoIndexes;
use crate::models::ModelError;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub name: String,

    /// Globally unique
    pub email: String,

    /// Argon2 PHC hash, never the raw secret
    pub password_hash: String,

    /// Globally unique when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// Free-form per-user settings
    #[serde(default)]
    pub settings: Document,

    pub registered_at: DateTime,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    #[serde(default)]
    pub mood_entries: Vec<MoodEntry>,

    #[serde(default)]
    pub meditation_history: Vec<HistoryEntry>,

    #[serde(default)]
    pub assessment_results: Vec<AssessmentResult>,

    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl UserDoc {
    pub fn new(name: impl Into<String>, email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            national_id: None,
            birth_date: None,
            blood_type: None,
            allergies: None,
            avatar_url: None,
            settings: Document::new(),
            registered_at: DateTime::now(),
            address: None,
            mood_entries: Vec::new(),
            meditation_history: Vec::new(),
            assessment_results: Vec::new(),
            notifications: Vec::new(),
        }
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("email_unique".to_string())
                        .build(),
                ),
            ),
            // Sparse: uniqueness only applies to users that carry a national id
            (
                doc! { "national_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .sparse(true)
                        .name("national_id_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

/// Embedded address, at most one per user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub country: String,
    pub state: String,
    pub city: String,
    pub street: String,
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// One mood log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodEntry {
    /// Always within [1, 5]
    pub level: i32,
    pub feeling: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub recorded_at: DateTime,
}

impl MoodEntry {
    /// Rejects out-of-range levels before anything is persisted
    pub fn new(level: i32, feeling: impl Into<String>, notes: Option<String>) -> Result<Self, ModelError> {
        if !(1..=5).contains(&level) {
            return Err(ModelError::MoodLevelOutOfRange(level));
        }
        Ok(Self {
            level,
            feeling: feeling.into(),
            notes,
            recorded_at: DateTime::now(),
        })
    }
}

/// One completed-meditation record. `meditation_id` is a weak reference:
/// the catalog entry may be deleted afterwards and the reference dangles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub meditation_id: ObjectId,
    pub completed_at: DateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_minutes: Option<i64>,
}

impl HistoryEntry {
    pub fn new(meditation_id: ObjectId, actual_minutes: Option<i64>) -> Self {
        Self {
            meditation_id,
            completed_at: DateTime::now(),
            actual_minutes,
        }
    }
}

/// One self-assessment result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub kind: AssessmentKind,
    #[serde(default)]
    pub answers: Document,
    pub score: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub taken_at: DateTime,
}

impl AssessmentResult {
    pub fn new(kind: AssessmentKind, answers: Document, score: i32, label: Option<String>) -> Self {
        Self {
            kind,
            answers,
            score,
            label,
            taken_at: DateTime::now(),
        }
    }
}

/// Assessment kinds, normalized at write time. Free-text input is matched
/// against the known kinds; anything unrecognized is kept as a lower-cased
/// passthrough category rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssessmentKind {
    Anxiety,
    Depression,
    Stress,
    Burnout,
    Other(String),
}

impl AssessmentKind {
    /// Classify free-text input into a canonical kind
    pub fn classify(input: &str) -> Self {
        let lower = input.trim().to_lowercase();
        if lower.contains("anxiety") {
            AssessmentKind::Anxiety
        } else if lower.contains("depress") {
            AssessmentKind::Depression
        } else if lower.contains("stress") {
            AssessmentKind::Stress
        } else if lower.contains("burnout") {
            AssessmentKind::Burnout
        } else {
            AssessmentKind::Other(lower)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AssessmentKind::Anxiety => "anxiety",
            AssessmentKind::Depression => "depression",
            AssessmentKind::Stress => "stress",
            AssessmentKind::Burnout => "burnout",
            AssessmentKind::Other(s) => s,
        }
    }
}

impl From<String> for AssessmentKind {
    fn from(value: String) -> Self {
        AssessmentKind::classify(&value)
    }
}

impl From<AssessmentKind> for String {
    fn from(kind: AssessmentKind) -> Self {
        kind.as_str().to_string()
    }
}

/// One notification delivered to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub sent_at: DateTime,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            sent_at: DateTime::now(),
            read: false,
        }
    }
}

/// Projected subset returned by list-summary queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    pub registered_at: DateTime,
}

/// Partial profile update. Known fields only: anything outside this struct
/// (including `_id`) never reaches the merge.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub national_id: Option<String>,
    pub birth_date: Option<chrono::DateTime<chrono::Utc>>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub avatar_url: Option<String>,
    pub settings: Option<Document>,
    pub address: Option<Address>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.national_id.is_none()
            && self.birth_date.is_none()
            && self.blood_type.is_none()
            && self.allergies.is_none()
            && self.avatar_url.is_none()
            && self.settings.is_none()
            && self.address.is_none()
    }

    /// Build the `$set` payload from the supplied fields only
    pub fn into_update_document(self) -> Document {
        let mut set = Document::new();
        if let Some(name) = self.name {
            set.insert("name", name);
        }
        if let Some(national_id) = self.national_id {
            set.insert("national_id", national_id);
        }
        if let Some(birth_date) = self.birth_date {
            set.insert("birth_date", DateTime::from_chrono(birth_date));
        }
        if let Some(blood_type) = self.blood_type {
            set.insert("blood_type", blood_type);
        }
        if let Some(allergies) = self.allergies {
            set.insert("allergies", allergies);
        }
        if let Some(avatar_url) = self.avatar_url {
            set.insert("avatar_url", avatar_url);
        }
        if let Some(settings) = self.settings {
            set.insert("settings", settings);
        }
        if let Some(address) = self.address {
            set.insert(
                "address",
                bson::to_bson(&address).unwrap_or(bson::Bson::Null),
            );
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_level_bounds_are_enforced() {
        assert!(MoodEntry::new(1, "calm", None).is_ok());
        assert!(MoodEntry::new(5, "great", None).is_ok());
        assert!(matches!(
            MoodEntry::new(0, "off", None),
            Err(ModelError::MoodLevelOutOfRange(0))
        ));
        assert!(matches!(
            MoodEntry::new(6, "too good", None),
            Err(ModelError::MoodLevelOutOfRange(6))
        ));
    }

    #[test]
    fn assessment_kind_classification() {
        assert_eq!(AssessmentKind::classify("Anxiety Assessment"), AssessmentKind::Anxiety);
        assert_eq!(AssessmentKind::classify("Depression Questionnaire"), AssessmentKind::Depression);
        assert_eq!(AssessmentKind::classify("weekly stress check"), AssessmentKind::Stress);
        assert_eq!(AssessmentKind::classify("BURNOUT"), AssessmentKind::Burnout);
        // Unrecognized input is kept as a lower-cased passthrough category
        assert_eq!(
            AssessmentKind::classify("Sleep Quality"),
            AssessmentKind::Other("sleep quality".to_string())
        );
    }

    #[test]
    fn assessment_kind_serializes_as_plain_string() {
        let bson = bson::to_bson(&AssessmentKind::Anxiety).unwrap();
        assert_eq!(bson, bson::Bson::String("anxiety".to_string()));

        let back: AssessmentKind = bson::from_bson(bson::Bson::String("burnout".into())).unwrap();
        assert_eq!(back, AssessmentKind::Burnout);
    }

    #[test]
    fn user_round_trip_preserves_embedded_array_order() {
        let mut user = UserDoc::new("Alice", "alice@example.com", "$argon2id$fake");
        for level in [3, 1, 5] {
            user.mood_entries
                .push(MoodEntry::new(level, format!("feeling-{level}"), None).unwrap());
        }
        user.meditation_history
            .push(HistoryEntry::new(ObjectId::new(), Some(12)));
        user.notifications.push(Notification::new("hi", "welcome"));

        let doc = bson::to_document(&user).unwrap();
        let back: UserDoc = bson::from_document(doc).unwrap();

        let levels: Vec<i32> = back.mood_entries.iter().map(|m| m.level).collect();
        assert_eq!(levels, vec![3, 1, 5]);
        assert_eq!(back.meditation_history.len(), 1);
        assert_eq!(
            back.meditation_history[0].meditation_id,
            user.meditation_history[0].meditation_id
        );
        assert_eq!(back.notifications[0].title, "hi");
        assert!(!back.notifications[0].read);
    }

    #[test]
    fn patch_only_carries_supplied_fields() {
        let patch = UserPatch {
            name: Some("Bob".to_string()),
            blood_type: Some("O+".to_string()),
            ..Default::default()
        };
        let set = patch.into_update_document();
        assert_eq!(set.get_str("name").unwrap(), "Bob");
        assert_eq!(set.get_str("blood_type").unwrap(), "O+");
        assert!(!set.contains_key("_id"));
        assert!(!set.contains_key("email"));
        assert!(!set.contains_key("allergies"));
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(UserPatch::default().is_empty());
    }
}
