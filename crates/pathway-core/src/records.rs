// Pathways Core - External record system interface
//
// Patients, episodes and their records belong to the records system, not to
// pathways. This module defines the thin surface pathways need from it:
// lookup by hospital number, bulk update, and episode retrieval.

use crate::error::{PathwayError, PathwayResult};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type PatientId = u64;
pub type EpisodeId = u64;

/// Payload posted by a pathway form: record API name → list of records
pub type SavePayload = Map<String, Value>;

/// Payload section holding the patient's identifying details
pub const DEMOGRAPHICS: &str = "demographics";
/// Field inside demographics used to find an existing patient
pub const HOSPITAL_NUMBER: &str = "hospital_number";

/// Handle to a patient in the record store
///
/// A patient with no id has not been written yet; the store assigns one on
/// the first bulk update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Option<PatientId>,
}

impl Patient {
    /// A new, unsaved patient
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: PatientId) -> Self {
        Self { id: Some(id) }
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    pub fn require_id(&self) -> PathwayResult<PatientId> {
        self.id
            .ok_or_else(|| PathwayError::record("patient has not been saved"))
    }
}

/// An episode of care belonging to one patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    pub patient_id: PatientId,
    pub created: DateTime<Utc>,
}

/// The user performing a save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Persistence operations the pathway layer delegates to
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// First patient whose demographics carry this hospital number
    async fn find_patient_by_hospital_number(
        &self,
        hospital_number: &str,
    ) -> PathwayResult<Option<Patient>>;

    /// Apply a nested payload of records to a patient, creating it if unsaved
    async fn bulk_update(
        &self,
        patient: &mut Patient,
        data: &SavePayload,
        user: &User,
    ) -> PathwayResult<()>;

    async fn get_episode(&self, id: EpisodeId) -> PathwayResult<Option<Episode>>;

    /// Episodes of a patient, oldest first
    async fn episodes_for(&self, patient: &Patient) -> PathwayResult<Vec<Episode>>;
}

/// Records posted under one API name, as a list
///
/// Single objects are accepted as a list of one. Anything else is invalid.
pub fn records_in(data: &SavePayload, api_name: &str) -> PathwayResult<Vec<Map<String, Value>>> {
    match data.get(api_name) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(record)) => Ok(vec![record.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Object(record) => Ok(record.clone()),
                other => Err(PathwayError::payload(format!(
                    "'{}' records must be objects, got {}",
                    api_name, other
                ))),
            })
            .collect(),
        Some(other) => Err(PathwayError::payload(format!(
            "'{}' must be a list of records, got {}",
            api_name, other
        ))),
    }
}

/// Hospital number of the first demographics record, if the payload has a demographics section
pub fn hospital_number(data: &SavePayload) -> PathwayResult<Option<String>> {
    if !data.contains_key(DEMOGRAPHICS) {
        return Ok(None);
    }

    let records = records_in(data, DEMOGRAPHICS)?;
    let first = records
        .first()
        .ok_or_else(|| PathwayError::payload("demographics section is empty"))?;

    match first.get(HOSPITAL_NUMBER) {
        Some(Value::String(number)) => Ok(Some(number.clone())),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(PathwayError::payload(format!(
            "hospital_number must be a string, got {}",
            other
        ))),
        None => Err(PathwayError::payload(
            "demographics section has no hospital_number",
        )),
    }
}
