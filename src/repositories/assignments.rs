use crate::services::assignment::StoredAssignment;
use crate::services::storage::{BlobStore, StorageError, StoredBlob, ASSIGNMENTS_NAMESPACE};

pub(crate) async fn find(
    store: &dyn BlobStore,
    id: &str,
) -> Result<Option<StoredAssignment>, StorageError> {
    let Some(content) = store.get(ASSIGNMENTS_NAMESPACE, id).await? else {
        return Ok(None);
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StorageError::InvalidJson { key: id.to_string(), source })
}

pub(crate) async fn exists(store: &dyn BlobStore, id: &str) -> Result<bool, StorageError> {
    store.exists(ASSIGNMENTS_NAMESPACE, id).await
}

pub(crate) async fn save(
    store: &dyn BlobStore,
    id: &str,
    assignment: &StoredAssignment,
) -> Result<StoredBlob, StorageError> {
    let content = serde_json::to_string(assignment)?;
    store.put(ASSIGNMENTS_NAMESPACE, id, content).await
}
