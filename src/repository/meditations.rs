//! Meditation catalog repository, including the removal policy that decides
//! what happens to user history entries still pointing at a deleted
//! meditation.

use bson::{doc, oid::ObjectId, Document};
use futures::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::Collection;
use tracing::{debug, info};

use crate::db::{StoreError, StoreGateway};
use crate::models::{
    MeditationDoc, MeditationPatch, MeditationSummary, MEDITATION_COLLECTION, USER_COLLECTION,
};
use crate::repository::RepoError;

/// Caller's choice when removing a meditation that users still reference.
/// An unspecified choice cancels: there is no silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalDecision {
    /// Delete the meditation and leave the history references dangling
    KeepReferences,
    /// Delete the meditation and strip matching history entries from every
    /// referencing user in one bulk update (best effort, not transactional)
    StripReferences,
    #[default]
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed {
        title: String,
        /// Users whose history entries were stripped by the cascade
        stripped_users: u64,
    },
    Cancelled {
        referencing_users: u64,
    },
}

#[derive(Clone)]
pub struct MeditationRepository {
    collection: Collection<MeditationDoc>,
    /// Raw handle on the users collection for the reference check and the
    /// removal cascade
    users: Collection<Document>,
}

impl MeditationRepository {
    pub fn new(gateway: &StoreGateway) -> Self {
        Self {
            collection: gateway.collection(MEDITATION_COLLECTION),
            users: gateway.collection(USER_COLLECTION),
        }
    }

    /// Insert a catalog entry. Titles are not unique, but inserting a
    /// duplicate requires the caller to confirm by passing
    /// `allow_duplicate = true`; otherwise the insert is refused.
    pub async fn insert(
        &self,
        meditation: MeditationDoc,
        allow_duplicate: bool,
    ) -> Result<ObjectId, RepoError> {
        if !allow_duplicate && self.find_by_title(&meditation.title).await?.is_some() {
            return Err(RepoError::Conflict(format!(
                "a meditation titled '{}' already exists",
                meditation.title
            )));
        }

        let result = self.collection.insert_one(&meditation).await?;
        let id = result
            .inserted_id
            .as_object_id()
            .ok_or(StoreError::MissingInsertId)?;

        debug!("Inserted meditation '{}' as {}", meditation.title, id);
        Ok(id)
    }

    /// Fetch by id; malformed hex identifiers read as "not found"
    pub async fn find_by_id(&self, id: &str) -> Result<Option<MeditationDoc>, RepoError> {
        let oid = match ObjectId::parse_str(id) {
            Ok(oid) => oid,
            Err(_) => {
                debug!("Malformed meditation id '{}'", id);
                return Ok(None);
            }
        };
        self.find_by_oid(oid).await
    }

    pub async fn find_by_oid(&self, id: ObjectId) -> Result<Option<MeditationDoc>, RepoError> {
        let meditation = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(meditation)
    }

    /// First catalog entry with the given title
    pub async fn find_by_title(&self, title: &str) -> Result<Option<MeditationDoc>, RepoError> {
        let meditation = self.collection.find_one(doc! { "title": title }).await?;
        Ok(meditation)
    }

    pub async fn list(&self, limit: i64) -> Result<Vec<MeditationDoc>, RepoError> {
        self.find_sorted(doc! {}, doc! { "title": 1 }, limit).await
    }

    pub async fn list_summary(&self, limit: i64) -> Result<Vec<MeditationSummary>, RepoError> {
        let options = FindOptions::builder()
            .projection(doc! { "_id": 1, "title": 1, "kind": 1, "category": 1, "duration_minutes": 1 })
            .sort(doc! { "title": 1 })
            .limit(limit)
            .build();

        let summaries = self
            .collection
            .clone_with_type::<MeditationSummary>()
            .find(doc! {})
            .with_options(options)
            .await?
            .try_collect()
            .await?;
        Ok(summaries)
    }

    pub async fn find_by_category(
        &self,
        category: &str,
        limit: i64,
    ) -> Result<Vec<MeditationDoc>, RepoError> {
        self.find_sorted(doc! { "category": category }, doc! { "title": 1 }, limit)
            .await
    }

    pub async fn find_by_kind(&self, kind: &str, limit: i64) -> Result<Vec<MeditationDoc>, RepoError> {
        self.find_sorted(doc! { "kind": kind }, doc! { "title": 1 }, limit)
            .await
    }

    /// Catalog entries within [min, max] minutes, shortest first
    pub async fn find_by_duration(
        &self,
        min_minutes: i64,
        max_minutes: i64,
        limit: i64,
    ) -> Result<Vec<MeditationDoc>, RepoError> {
        self.find_sorted(
            doc! { "duration_minutes": { "$gte": min_minutes, "$lte": max_minutes } },
            doc! { "duration_minutes": 1 },
            limit,
        )
        .await
    }

    async fn find_sorted(
        &self,
        filter: Document,
        sort: Document,
        limit: i64,
    ) -> Result<Vec<MeditationDoc>, RepoError> {
        let options = FindOptions::builder().sort(sort).limit(limit).build();

        let meditations = self
            .collection
            .find(filter)
            .with_options(options)
            .await?
            .try_collect()
            .await?;
        Ok(meditations)
    }

    pub async fn update(&self, id: ObjectId, patch: MeditationPatch) -> Result<(), RepoError> {
        if self.find_by_oid(id).await?.is_none() {
            return Err(RepoError::NotFound(format!("meditation {} not found", id)));
        }

        let set = patch.into_update_document()?;
        self.collection
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;

        debug!("Updated meditation {}", id);
        Ok(())
    }

    pub async fn count(&self) -> Result<u64, RepoError> {
        let count = self.collection.count_documents(doc! {}).await?;
        Ok(count)
    }

    /// Count catalog entries per category, most numerous first
    pub async fn count_by_category(&self) -> Result<Vec<(String, i64)>, RepoError> {
        self.count_grouped("$category").await
    }

    /// Count catalog entries per kind, most numerous first
    pub async fn count_by_kind(&self) -> Result<Vec<(String, i64)>, RepoError> {
        self.count_grouped("$kind").await
    }

    async fn count_grouped(&self, key: &str) -> Result<Vec<(String, i64)>, RepoError> {
        let pipeline = vec![
            doc! { "$group": { "_id": key, "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1 } },
        ];

        let docs: Vec<Document> = self
            .collection
            .aggregate(pipeline)
            .await?
            .try_collect()
            .await?;

        let mut counts = Vec::with_capacity(docs.len());
        for doc in docs {
            let group = doc.get_str("_id").unwrap_or("unknown").to_string();
            let count = doc.get_i32("count").map(i64::from).or_else(|_| doc.get_i64("count")).unwrap_or(0);
            counts.push((group, count));
        }
        Ok(counts)
    }

    /// Number of users whose history references this meditation
    pub async fn count_references(&self, id: ObjectId) -> Result<u64, RepoError> {
        let count = self
            .users
            .count_documents(doc! { "meditation_history.meditation_id": id })
            .await?;
        Ok(count)
    }

    /// Remove a meditation under the removal policy:
    /// zero referencing users deletes directly; otherwise the caller's
    /// [`RemovalDecision`] picks between leaving the references dangling,
    /// stripping them in one bulk update, or cancelling.
    pub async fn remove(
        &self,
        id: ObjectId,
        decision: RemovalDecision,
    ) -> Result<RemovalOutcome, RepoError> {
        let meditation = self
            .find_by_oid(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("meditation {} not found", id)))?;

        let referencing_users = self.count_references(id).await?;

        let mut stripped_users = 0;
        if referencing_users > 0 {
            match decision {
                RemovalDecision::Cancel => {
                    info!(
                        "Removal of '{}' cancelled; {} user(s) reference it",
                        meditation.title, referencing_users
                    );
                    return Ok(RemovalOutcome::Cancelled { referencing_users });
                }
                RemovalDecision::KeepReferences => {
                    info!(
                        "Removing '{}' and leaving {} user reference(s) dangling",
                        meditation.title, referencing_users
                    );
                }
                RemovalDecision::StripReferences => {
                    let result = self
                        .users
                        .update_many(
                            doc! {},
                            doc! { "$pull": { "meditation_history": { "meditation_id": id } } },
                        )
                        .await?;
                    stripped_users = result.modified_count;
                    info!(
                        "Stripped history entries for '{}' from {} user(s)",
                        meditation.title, stripped_users
                    );
                }
            }
        }

        self.collection.delete_one(doc! { "_id": id }).await?;
        info!("Removed meditation '{}'", meditation.title);

        Ok(RemovalOutcome::Removed {
            title: meditation.title,
            stripped_users,
        })
    }
}
