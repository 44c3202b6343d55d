//! Metadata store
//!
//! Workflow metadata lives in a key-value document store keyed by
//! (id, type-partition). The store itself is an external collaborator, so
//! the core talks to a narrow `DocumentStore` trait; `MemoryStore` is the
//! in-process implementation backing tests and single-node deploys.
//!
//! Document replace carries an optimistic-concurrency check: every document
//! has a `version` token that must match the stored one and is incremented
//! on success. A mismatch surfaces as a conflict instead of a silent
//! last-writer-wins overwrite.

use crate::error::AppError;
use crate::models::{Feature, MergeRequest, Revision};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const FEATURE_PARTITION: &str = "feature";
pub const REVISION_PARTITION: &str = "revision";
pub const MERGE_PARTITION: &str = "merge";

/// Key-value document interface keyed by (id, type-partition).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read; `Ok(None)` when the document does not exist.
    async fn read(&self, partition: &str, id: &str) -> Result<Option<Value>, AppError>;

    /// Point create; conflict when the id is already taken.
    async fn create(&self, partition: &str, id: &str, doc: Value) -> Result<Value, AppError>;

    /// Full-document replace with a version precondition. The stored
    /// document's `version` must equal the incoming one; the replacement is
    /// persisted with the version incremented and returned.
    async fn replace(&self, partition: &str, id: &str, doc: Value) -> Result<Value, AppError>;

    /// Scan a whole partition. Callers filter by field predicate.
    async fn scan(&self, partition: &str) -> Result<Vec<Value>, AppError>;
}

/// Thread-safe in-memory document store
pub struct MemoryStore {
    documents: Arc<RwLock<HashMap<(String, String), Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn doc_version(doc: &Value) -> u64 {
    doc.get("version").and_then(Value::as_u64).unwrap_or(0)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, partition: &str, id: &str) -> Result<Option<Value>, AppError> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(&(partition.to_string(), id.to_string()))
            .cloned())
    }

    async fn create(&self, partition: &str, id: &str, doc: Value) -> Result<Value, AppError> {
        let mut documents = self.documents.write().await;
        let key = (partition.to_string(), id.to_string());
        if documents.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "A {} document with id {} already exists",
                partition, id
            )));
        }
        documents.insert(key, doc.clone());
        Ok(doc)
    }

    async fn replace(&self, partition: &str, id: &str, mut doc: Value) -> Result<Value, AppError> {
        let mut documents = self.documents.write().await;
        let key = (partition.to_string(), id.to_string());
        let stored = documents
            .get(&key)
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", partition, id)))?;

        let stored_version = doc_version(stored);
        if doc_version(&doc) != stored_version {
            return Err(AppError::Conflict(format!(
                "{} {} was modified concurrently (version {} expected)",
                partition, id, stored_version
            )));
        }
        doc["version"] = Value::from(stored_version + 1);
        documents.insert(key, doc.clone());
        Ok(doc)
    }

    async fn scan(&self, partition: &str) -> Result<Vec<Value>, AppError> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|((p, _), _)| p == partition)
            .map(|(_, doc)| doc.clone())
            .collect())
    }
}

/// Typed facade over the document store, one method per workflow lookup.
#[derive(Clone)]
pub struct MetadataStore {
    inner: Arc<dyn DocumentStore>,
}

impl MetadataStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self { inner }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    async fn read_typed<T: DeserializeOwned>(
        &self,
        partition: &str,
        id: &str,
    ) -> Result<Option<T>, AppError> {
        match self.inner.read(partition, id).await? {
            Some(doc) => serde_json::from_value(doc)
                .map(Some)
                .map_err(|e| AppError::Store(format!("corrupt {} document {}: {}", partition, id, e))),
            None => Ok(None),
        }
    }

    async fn create_typed<T: Serialize>(
        &self,
        partition: &str,
        id: &str,
        entity: &T,
    ) -> Result<(), AppError> {
        let doc = serde_json::to_value(entity)
            .map_err(|e| AppError::Store(format!("serialize {} {}: {}", partition, id, e)))?;
        self.inner.create(partition, id, doc).await?;
        Ok(())
    }

    async fn replace_typed<T: Serialize + DeserializeOwned>(
        &self,
        partition: &str,
        id: &str,
        entity: &T,
    ) -> Result<T, AppError> {
        let doc = serde_json::to_value(entity)
            .map_err(|e| AppError::Store(format!("serialize {} {}: {}", partition, id, e)))?;
        let stored = self.inner.replace(partition, id, doc).await?;
        serde_json::from_value(stored)
            .map_err(|e| AppError::Store(format!("corrupt {} document {}: {}", partition, id, e)))
    }

    async fn scan_typed<T: DeserializeOwned>(&self, partition: &str) -> Result<Vec<T>, AppError> {
        let docs = self.inner.scan(partition).await?;
        docs.into_iter()
            .map(|doc| {
                serde_json::from_value(doc)
                    .map_err(|e| AppError::Store(format!("corrupt {} document: {}", partition, e)))
            })
            .collect()
    }

    // ---- features ----

    pub async fn find_feature(&self, id: &str) -> Result<Option<Feature>, AppError> {
        self.read_typed(FEATURE_PARTITION, id).await
    }

    pub async fn get_feature(&self, id: &str) -> Result<Feature, AppError> {
        self.find_feature(id)
            .await?
            .ok_or_else(|| AppError::NotFound("No feature found with that name".to_string()))
    }

    pub async fn create_feature(&self, feature: &Feature) -> Result<(), AppError> {
        self.create_typed(FEATURE_PARTITION, &feature.id, feature).await
    }

    pub async fn replace_feature(&self, feature: &Feature) -> Result<Feature, AppError> {
        self.replace_typed(FEATURE_PARTITION, &feature.id, feature).await
    }

    pub async fn list_features(&self) -> Result<Vec<Feature>, AppError> {
        self.scan_typed(FEATURE_PARTITION).await
    }

    /// Filtered scan by owner GUID.
    pub async fn features_by_owner(&self, owner_guid: &str) -> Result<Vec<Feature>, AppError> {
        let features: Vec<Feature> = self.scan_typed(FEATURE_PARTITION).await?;
        Ok(features
            .into_iter()
            .filter(|f| f.owner.guid.as_deref() == Some(owner_guid))
            .collect())
    }

    // ---- revisions ----

    pub async fn find_revision(&self, id: &str) -> Result<Option<Revision>, AppError> {
        self.read_typed(REVISION_PARTITION, id).await
    }

    pub async fn get_revision(&self, id: &str) -> Result<Revision, AppError> {
        self.find_revision(id)
            .await?
            .ok_or_else(|| AppError::NotFound("No revision found with that name".to_string()))
    }

    pub async fn create_revision(&self, revision: &Revision) -> Result<(), AppError> {
        self.create_typed(REVISION_PARTITION, &revision.id, revision).await
    }

    pub async fn replace_revision(&self, revision: &Revision) -> Result<Revision, AppError> {
        self.replace_typed(REVISION_PARTITION, &revision.id, revision).await
    }

    /// Filtered scan of a feature's revisions.
    pub async fn revisions_for_feature(&self, feature_name: &str) -> Result<Vec<Revision>, AppError> {
        let revisions: Vec<Revision> = self.scan_typed(REVISION_PARTITION).await?;
        Ok(revisions
            .into_iter()
            .filter(|r| r.feature_name == feature_name)
            .collect())
    }

    // ---- merge requests ----

    pub async fn find_merge(&self, id: &str) -> Result<Option<MergeRequest>, AppError> {
        self.read_typed(MERGE_PARTITION, id).await
    }

    pub async fn get_merge(&self, id: &str) -> Result<MergeRequest, AppError> {
        self.find_merge(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Merge request {} not found", id)))
    }

    pub async fn create_merge(&self, merge: &MergeRequest) -> Result<(), AppError> {
        self.create_typed(MERGE_PARTITION, &merge.id, merge).await
    }

    pub async fn replace_merge(&self, merge: &MergeRequest) -> Result<MergeRequest, AppError> {
        self.replace_typed(MERGE_PARTITION, &merge.id, merge).await
    }

    /// Filtered scan of a feature's merge requests.
    pub async fn merges_for_feature(&self, feature_name: &str) -> Result<Vec<MergeRequest>, AppError> {
        let merges: Vec<MergeRequest> = self.scan_typed(MERGE_PARTITION).await?;
        Ok(merges
            .into_iter()
            .filter(|m| m.feature_name == feature_name)
            .collect())
    }

    // ---- existence guard ----

    /// True only when the feature document is present. A lookup error reads
    /// as absent; creation flows call the content host first, which rejects
    /// duplicates on its own.
    pub async fn feature_exists(&self, feature_id: &str) -> bool {
        matches!(self.find_feature(feature_id).await, Ok(Some(_)))
    }

    /// True only when the revision document is present. Same miss/error
    /// collapse as [`MetadataStore::feature_exists`].
    pub async fn revision_exists(&self, revision_id: &str) -> bool {
        matches!(self.find_revision(revision_id).await, Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn owner() -> User {
        User {
            guid: Some("u-1".to_string()),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    fn feature(id: &str) -> Feature {
        Feature::new(
            id.to_string(),
            id.to_string(),
            format!("https://raw.mapflow.io/{}/main/data.geojson", id),
            "desc".to_string(),
            owner(),
            vec![],
        )
    }

    /// Store double whose every call fails, for guard behavior.
    struct FailingStore;

    #[async_trait]
    impl DocumentStore for FailingStore {
        async fn read(&self, _: &str, _: &str) -> Result<Option<Value>, AppError> {
            Err(AppError::Store("store is down".to_string()))
        }
        async fn create(&self, _: &str, _: &str, _: Value) -> Result<Value, AppError> {
            Err(AppError::Store("store is down".to_string()))
        }
        async fn replace(&self, _: &str, _: &str, _: Value) -> Result<Value, AppError> {
            Err(AppError::Store("store is down".to_string()))
        }
        async fn scan(&self, _: &str) -> Result<Vec<Value>, AppError> {
            Err(AppError::Store("store is down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_create_then_get_roundtrips() {
        let store = MetadataStore::in_memory();
        store.create_feature(&feature("my-map")).await.unwrap();
        let loaded = store.get_feature("my-map").await.unwrap();
        assert_eq!(loaded.id, "my-map");
        assert_eq!(loaded.version, 0);
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let store = MetadataStore::in_memory();
        store.create_feature(&feature("my-map")).await.unwrap();
        let err = store.create_feature(&feature("my-map")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_duplicate_revision_create_conflicts() {
        let store = MetadataStore::in_memory();
        let revision = Revision::new(
            "my-mapdraft".to_string(),
            "my-map".to_string(),
            "draft".to_string(),
            "https://raw.mapflow.io/my-map/draft/data.geojson".to_string(),
            String::new(),
            owner(),
        );
        store.create_revision(&revision).await.unwrap();
        assert!(store.revision_exists("my-mapdraft").await);
        let err = store.create_revision(&revision).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_replace_bumps_version() {
        let store = MetadataStore::in_memory();
        store.create_feature(&feature("my-map")).await.unwrap();
        let mut loaded = store.get_feature("my-map").await.unwrap();
        loaded.description = "updated".to_string();
        let replaced = store.replace_feature(&loaded).await.unwrap();
        assert_eq!(replaced.version, 1);
        assert_eq!(replaced.description, "updated");
    }

    #[tokio::test]
    async fn test_stale_replace_conflicts() {
        let store = MetadataStore::in_memory();
        store.create_feature(&feature("my-map")).await.unwrap();

        // Two readers load version 0; the second writer must lose.
        let first = store.get_feature("my-map").await.unwrap();
        let second = store.get_feature("my-map").await.unwrap();
        store.replace_feature(&first).await.unwrap();
        let err = store.replace_feature(&second).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_replace_missing_is_not_found() {
        let store = MetadataStore::in_memory();
        let err = store.replace_feature(&feature("ghost")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_guard_miss_is_false() {
        let store = MetadataStore::in_memory();
        assert!(!store.feature_exists("nope").await);
        assert!(!store.revision_exists("nopedraft").await);
    }

    #[tokio::test]
    async fn test_guard_collapses_store_error_to_false() {
        let store = MetadataStore::new(Arc::new(FailingStore));
        assert!(!store.feature_exists("my-map").await);
        assert!(!store.revision_exists("my-mapdraft").await);
    }

    #[tokio::test]
    async fn test_features_by_owner_filters() {
        let store = MetadataStore::in_memory();
        store.create_feature(&feature("a")).await.unwrap();
        let mut other = feature("b");
        other.owner.guid = Some("u-2".to_string());
        store.create_feature(&other).await.unwrap();

        let mine = store.features_by_owner("u-1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "a");
    }
}
