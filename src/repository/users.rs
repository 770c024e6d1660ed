//! User repository: CRUD over the `users` collection plus atomic append
//! operations for the embedded sub-record arrays.

use bson::{doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::Collection;
use tracing::debug;

use crate::db::{StoreError, StoreGateway};
use crate::models::{
    AssessmentResult, HistoryEntry, MoodEntry, Notification, UserDoc, UserPatch, UserSummary,
    USER_COLLECTION,
};
use crate::repository::RepoError;

#[derive(Clone)]
pub struct UserRepository {
    collection: Collection<UserDoc>,
}

impl UserRepository {
    pub fn new(gateway: &StoreGateway) -> Self {
        Self {
            collection: gateway.collection(USER_COLLECTION),
        }
    }

    /// Insert a new user. Fails with a conflict if the email, or the
    /// national id when present, is already taken; nothing is written in
    /// that case.
    pub async fn insert(&self, user: UserDoc) -> Result<ObjectId, RepoError> {
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(RepoError::Conflict(format!(
                "email '{}' is already registered",
                user.email
            )));
        }

        if let Some(national_id) = &user.national_id {
            if self.find_by_national_id(national_id).await?.is_some() {
                return Err(RepoError::Conflict(format!(
                    "national id '{}' is already registered",
                    national_id
                )));
            }
        }

        let result = self.collection.insert_one(&user).await?;
        let id = result
            .inserted_id
            .as_object_id()
            .ok_or(StoreError::MissingInsertId)?;

        debug!("Inserted user '{}' as {}", user.email, id);
        Ok(id)
    }

    /// Fetch by id. A malformed hex identifier is treated as "not found"
    /// rather than a parse error.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<UserDoc>, RepoError> {
        let oid = match ObjectId::parse_str(id) {
            Ok(oid) => oid,
            Err(_) => {
                debug!("Malformed user id '{}'", id);
                return Ok(None);
            }
        };
        self.find_by_oid(oid).await
    }

    pub async fn find_by_oid(&self, id: ObjectId) -> Result<Option<UserDoc>, RepoError> {
        let user = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>, RepoError> {
        let user = self.collection.find_one(doc! { "email": email }).await?;
        Ok(user)
    }

    pub async fn find_by_national_id(
        &self,
        national_id: &str,
    ) -> Result<Option<UserDoc>, RepoError> {
        let user = self
            .collection
            .find_one(doc! { "national_id": national_id })
            .await?;
        Ok(user)
    }

    /// Newest registrations first
    pub async fn list(&self, limit: i64) -> Result<Vec<UserDoc>, RepoError> {
        let options = FindOptions::builder()
            .sort(doc! { "registered_at": -1 })
            .limit(limit)
            .build();

        let users = self
            .collection
            .find(doc! {})
            .with_options(options)
            .await?
            .try_collect()
            .await?;
        Ok(users)
    }

    /// Projected listing with only the main identity fields
    pub async fn list_summary(&self, limit: i64) -> Result<Vec<UserSummary>, RepoError> {
        let options = FindOptions::builder()
            .projection(doc! { "_id": 1, "name": 1, "email": 1, "national_id": 1, "registered_at": 1 })
            .sort(doc! { "registered_at": -1 })
            .limit(limit)
            .build();

        let summaries = self
            .collection
            .clone_with_type::<UserSummary>()
            .find(doc! {})
            .with_options(options)
            .await?
            .try_collect()
            .await?;
        Ok(summaries)
    }

    /// Apply a partial update. Only the patch's supplied fields are merged;
    /// the identifier is immutable by construction of [`UserPatch`].
    pub async fn update(&self, id: ObjectId, patch: UserPatch) -> Result<(), RepoError> {
        if self.find_by_oid(id).await?.is_none() {
            return Err(RepoError::NotFound(format!("user {} not found", id)));
        }

        let set = patch.into_update_document();
        self.collection
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;

        debug!("Updated user {}", id);
        Ok(())
    }

    /// Delete the account and everything embedded in it
    pub async fn delete(&self, id: ObjectId) -> Result<UserDoc, RepoError> {
        let user = self
            .find_by_oid(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("user {} not found", id)))?;

        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        if result.deleted_count == 0 {
            return Err(RepoError::NotFound(format!("user {} not found", id)));
        }

        debug!("Deleted user '{}'", user.email);
        Ok(user)
    }

    pub async fn count(&self) -> Result<u64, RepoError> {
        let count = self.collection.count_documents(doc! {}).await?;
        Ok(count)
    }

    // Embedded sub-record appends. Each is a single atomic `$push` on the
    // user document, so concurrent appends cannot lose entries.

    pub async fn add_mood_entry(&self, id: ObjectId, entry: MoodEntry) -> Result<(), RepoError> {
        self.push(id, "mood_entries", bson::to_bson(&entry)?).await
    }

    pub async fn add_history_entry(
        &self,
        id: ObjectId,
        entry: HistoryEntry,
    ) -> Result<(), RepoError> {
        self.push(id, "meditation_history", bson::to_bson(&entry)?)
            .await
    }

    pub async fn add_assessment_result(
        &self,
        id: ObjectId,
        result: AssessmentResult,
    ) -> Result<(), RepoError> {
        self.push(id, "assessment_results", bson::to_bson(&result)?)
            .await
    }

    pub async fn add_notification(
        &self,
        id: ObjectId,
        notification: Notification,
    ) -> Result<(), RepoError> {
        self.push(id, "notifications", bson::to_bson(&notification)?)
            .await
    }

    async fn push(&self, id: ObjectId, field: &str, value: bson::Bson) -> Result<(), RepoError> {
        let mut push = bson::Document::new();
        push.insert(field, value);

        let result = self
            .collection
            .update_one(doc! { "_id": id }, doc! { "$push": push })
            .await?;

        if result.matched_count == 0 {
            return Err(RepoError::NotFound(format!("user {} not found", id)));
        }
        Ok(())
    }
}
