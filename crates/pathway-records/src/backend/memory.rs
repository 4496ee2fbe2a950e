//! In-memory record store

use super::{PatientRecords, RecordState, StoreOptions};
use async_trait::async_trait;
use parking_lot::RwLock;
use pathway_core::{
    Episode, EpisodeId, PathwayResult, Patient, PatientId, RecordStore, SavePayload, User,
};
use std::sync::Arc;

/// Record store kept entirely in memory
///
/// Cloning shares the underlying state.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    state: Arc<RwLock<RecordState>>,
    options: StoreOptions,
}

impl InMemoryRecordStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            state: Arc::new(RwLock::new(RecordState::default())),
            options,
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Copy of everything stored so far
    pub fn snapshot(&self) -> RecordState {
        self.state.read().clone()
    }

    pub fn patient_records(&self, id: PatientId) -> Option<PatientRecords> {
        self.state.read().patient(id).cloned()
    }

    pub fn patient_count(&self) -> usize {
        self.state.read().patient_count()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_patient_by_hospital_number(
        &self,
        hospital_number: &str,
    ) -> PathwayResult<Option<Patient>> {
        Ok(self.state.read().find_by_hospital_number(hospital_number))
    }

    async fn bulk_update(
        &self,
        patient: &mut Patient,
        data: &SavePayload,
        user: &User,
    ) -> PathwayResult<()> {
        self.state
            .write()
            .bulk_update(patient, data, user, &self.options)
    }

    async fn get_episode(&self, id: EpisodeId) -> PathwayResult<Option<Episode>> {
        Ok(self.state.read().episode(id).map(|e| e.episode.clone()))
    }

    async fn episodes_for(&self, patient: &Patient) -> PathwayResult<Vec<Episode>> {
        Ok(match patient.id {
            Some(id) => self.state.read().episodes_of(id),
            None => Vec::new(),
        })
    }
}
