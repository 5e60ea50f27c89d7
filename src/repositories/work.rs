use serde_json::Value;

use crate::services::storage::{BlobStore, StorageError, StoredBlob, WORK_NAMESPACE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorkRef {
    pub(crate) assignment_id: String,
    pub(crate) ccid: String,
    pub(crate) work_key: String,
}

impl WorkRef {
    pub(crate) fn new(assignment_id: &str, ccid: &str, work_key: &str) -> Self {
        Self {
            assignment_id: assignment_id.to_string(),
            ccid: ccid.to_string(),
            work_key: work_key.to_string(),
        }
    }

    pub(crate) fn storage_key(&self) -> String {
        format!("{}/{}/{}", self.assignment_id, self.ccid, self.work_key)
    }

    fn from_storage_key(key: &str) -> Option<Self> {
        let mut parts = key.splitn(3, '/');
        let assignment_id = parts.next()?;
        let ccid = parts.next()?;
        let work_key = parts.next()?;
        if work_key.is_empty() || work_key.contains('/') {
            return None;
        }
        Some(Self::new(assignment_id, ccid, work_key))
    }
}

pub(crate) async fn find(
    store: &dyn BlobStore,
    work: &WorkRef,
) -> Result<Option<Value>, StorageError> {
    let key = work.storage_key();
    let Some(content) = store.get(WORK_NAMESPACE, &key).await? else {
        return Ok(None);
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StorageError::InvalidJson { key, source })
}

pub(crate) async fn save(
    store: &dyn BlobStore,
    work: &WorkRef,
    contents: &Value,
) -> Result<StoredBlob, StorageError> {
    let content = serde_json::to_string(contents)?;
    store.put(WORK_NAMESPACE, &work.storage_key(), content).await
}

pub(crate) async fn list_for_assignment(
    store: &dyn BlobStore,
    assignment_id: &str,
) -> Result<Vec<WorkRef>, StorageError> {
    let keys = store.list(WORK_NAMESPACE, &format!("{assignment_id}/")).await?;
    Ok(keys.iter().filter_map(|key| WorkRef::from_storage_key(key)).collect())
}
