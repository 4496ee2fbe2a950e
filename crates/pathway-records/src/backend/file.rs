//! JSON file record store
//!
//! Keeps the whole record state in memory and rewrites the file on every
//! bulk update. The in-memory state only changes once the write succeeded,
//! and writes are serialized by the state lock.

use super::{RecordState, StoreOptions};
use async_trait::async_trait;
use pathway_core::{
    Episode, EpisodeId, PathwayError, PathwayResult, Patient, RecordStore, SavePayload, User,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// File-backed record store
///
/// ## Example
///
/// ```rust,no_run
/// use pathway_records::{FileRecordStore, StoreOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = FileRecordStore::open("./data/records.json", StoreOptions::default()).await?;
/// println!("{} patients", store.patient_count().await);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FileRecordStore {
    /// Path to the JSON file
    path: PathBuf,
    state: Arc<RwLock<RecordState>>,
    options: StoreOptions,
}

impl FileRecordStore {
    /// Open the store at `path`
    ///
    /// Creates missing parent directories. An absent or empty file starts an
    /// empty store.
    pub async fn open(path: impl Into<PathBuf>, options: StoreOptions) -> PathwayResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    PathwayError::record(format!(
                        "Failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let state = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
                PathwayError::record(format!(
                    "Failed to read record file {}: {}",
                    path.display(),
                    e
                ))
            })?;

            if content.trim().is_empty() {
                RecordState::default()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    PathwayError::record(format!(
                        "Failed to parse record file {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
        } else {
            RecordState::default()
        };

        tracing::debug!(
            "Opened record store {} ({} patients)",
            path.display(),
            state.patient_count()
        );

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
            options,
        })
    }

    /// Write `state` to the file; callers hold the write lock
    async fn write_state(&self, state: &RecordState) -> PathwayResult<()> {
        let content = serde_json::to_string_pretty(state)
            .map_err(|e| PathwayError::record(format!("Failed to serialize records: {}", e)))?;

        tokio::fs::write(&self.path, content).await.map_err(|e| {
            PathwayError::record(format!(
                "Failed to write record file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub async fn snapshot(&self) -> RecordState {
        self.state.read().await.clone()
    }

    pub async fn patient_count(&self) -> usize {
        self.state.read().await.patient_count()
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn find_patient_by_hospital_number(
        &self,
        hospital_number: &str,
    ) -> PathwayResult<Option<Patient>> {
        Ok(self
            .state
            .read()
            .await
            .find_by_hospital_number(hospital_number))
    }

    async fn bulk_update(
        &self,
        patient: &mut Patient,
        data: &SavePayload,
        user: &User,
    ) -> PathwayResult<()> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let mut saved = patient.clone();
        next.bulk_update(&mut saved, data, user, &self.options)?;

        // The file and the cache only move together
        self.write_state(&next).await?;
        *state = next;
        *patient = saved;
        Ok(())
    }

    async fn get_episode(&self, id: EpisodeId) -> PathwayResult<Option<Episode>> {
        Ok(self
            .state
            .read()
            .await
            .episode(id)
            .map(|e| e.episode.clone()))
    }

    async fn episodes_for(&self, patient: &Patient) -> PathwayResult<Vec<Episode>> {
        Ok(match patient.id {
            Some(id) => self.state.read().await.episodes_of(id),
            None => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");
        let data = json!({
            "demographics": [{"hospital_number": "H1"}],
            "diagnosis": [{"condition": "Flu"}]
        });

        let patient = {
            let store = FileRecordStore::open(&path, StoreOptions::default())
                .await
                .unwrap();
            let mut patient = Patient::new();
            store
                .bulk_update(
                    &mut patient,
                    data.as_object().unwrap(),
                    &User::new("admin"),
                )
                .await
                .unwrap();
            patient
        };

        let store = FileRecordStore::open(&path, StoreOptions::default())
            .await
            .unwrap();
        assert_eq!(store.patient_count().await, 1);
        assert_eq!(
            store.find_patient_by_hospital_number("H1").await.unwrap(),
            Some(patient.clone())
        );
        assert_eq!(store.episodes_for(&patient).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("records.json");

        let store = FileRecordStore::open(&path, StoreOptions::default())
            .await
            .unwrap();
        let mut patient = Patient::new();
        store
            .bulk_update(&mut patient, &SavePayload::new(), &User::new("admin"))
            .await
            .unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_empty_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");
        std::fs::write(&path, "  \n").unwrap();

        let store = FileRecordStore::open(&path, StoreOptions::default())
            .await
            .unwrap();
        assert_eq!(store.patient_count().await, 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = FileRecordStore::open(&path, StoreOptions::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_failed_update_not_persisted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");
        let store = FileRecordStore::open(&path, StoreOptions::default())
            .await
            .unwrap();

        let mut patient = Patient::with_id(12);
        let result = store
            .bulk_update(&mut patient, &SavePayload::new(), &User::new("admin"))
            .await;

        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_store_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");
        let store = FileRecordStore::open(&path, StoreOptions::default())
            .await
            .unwrap();

        // A directory in place of the file makes every write fail
        std::fs::create_dir(&path).unwrap();

        let data = json!({"demographics": [{"hospital_number": "H7"}]});
        let mut patient = Patient::new();
        let result = store
            .bulk_update(&mut patient, data.as_object().unwrap(), &User::new("admin"))
            .await;

        assert!(result.is_err());
        assert!(patient.id.is_none());
        assert_eq!(store.patient_count().await, 0);
        assert!(store
            .find_patient_by_hospital_number("H7")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_concurrent_saves_all_reach_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.json");
        let store = FileRecordStore::open(&path, StoreOptions::default())
            .await
            .unwrap();

        let mut handles = Vec::new();
        for n in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let data = json!({"demographics": [{"hospital_number": format!("H{}", n)}]});
                let mut patient = Patient::new();
                store
                    .bulk_update(&mut patient, data.as_object().unwrap(), &User::new("admin"))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let reopened = FileRecordStore::open(&path, StoreOptions::default())
            .await
            .unwrap();
        assert_eq!(reopened.patient_count().await, 8);
    }
}
