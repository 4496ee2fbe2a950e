//! Shared record state and bulk-update logic

pub mod file;
pub mod memory;

use chrono::Utc;
use pathway_core::records::{records_in, HOSPITAL_NUMBER, DEMOGRAPHICS};
use pathway_core::{
    Episode, EpisodeId, PathwayError, PathwayResult, PathwaysConfig, Patient, PatientId,
    SavePayload, User,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

pub type Record = Map<String, Value>;
pub type RecordsByModel = BTreeMap<String, Vec<Record>>;

/// Which models attach to patients and which hold a single record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub patient_models: HashSet<String>,
    pub singleton_models: HashSet<String>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        let demographics: HashSet<String> = [DEMOGRAPHICS.to_string()].into_iter().collect();
        Self {
            patient_models: demographics.clone(),
            singleton_models: demographics,
        }
    }
}

impl StoreOptions {
    pub fn from_config(config: &PathwaysConfig) -> Self {
        let mut patient_models: HashSet<String> =
            config.spec.patient_models.iter().cloned().collect();
        patient_models.insert(DEMOGRAPHICS.to_string());
        Self {
            patient_models,
            singleton_models: config.spec.singleton_models.iter().cloned().collect(),
        }
    }

    /// Demographics always belong to the patient; patients are matched on them
    pub fn is_patient_scoped(&self, api_name: &str) -> bool {
        api_name == DEMOGRAPHICS || self.patient_models.contains(api_name)
    }

    /// Add patient-scoped models, e.g. those a model catalog declares
    pub fn with_patient_models<'a>(mut self, models: impl IntoIterator<Item = &'a str>) -> Self {
        self.patient_models
            .extend(models.into_iter().map(str::to_string));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRecords {
    pub id: PatientId,
    #[serde(default)]
    pub records: RecordsByModel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecords {
    pub episode: Episode,
    #[serde(default)]
    pub records: RecordsByModel,
}

/// Everything a store holds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordState {
    #[serde(default)]
    next_patient_id: PatientId,
    #[serde(default)]
    next_episode_id: EpisodeId,
    #[serde(default)]
    next_record_id: u64,
    #[serde(default)]
    patients: BTreeMap<PatientId, PatientRecords>,
    #[serde(default)]
    episodes: BTreeMap<EpisodeId, EpisodeRecords>,
}

impl RecordState {
    pub fn patient(&self, id: PatientId) -> Option<&PatientRecords> {
        self.patients.get(&id)
    }

    pub fn episode(&self, id: EpisodeId) -> Option<&EpisodeRecords> {
        self.episodes.get(&id)
    }

    pub fn patient_count(&self) -> usize {
        self.patients.len()
    }

    pub fn episode_count(&self) -> usize {
        self.episodes.len()
    }

    /// Lowest-id patient with a demographics record carrying this hospital number
    pub fn find_by_hospital_number(&self, hospital_number: &str) -> Option<Patient> {
        self.patients
            .values()
            .find(|patient| {
                patient
                    .records
                    .get(DEMOGRAPHICS)
                    .map_or(false, |records| {
                        records
                            .iter()
                            .any(|r| matches_hospital_number(r, hospital_number))
                    })
            })
            .map(|patient| Patient::with_id(patient.id))
    }

    /// Episodes of a patient, oldest first
    pub fn episodes_of(&self, patient_id: PatientId) -> Vec<Episode> {
        self.episodes
            .values()
            .filter(|e| e.episode.patient_id == patient_id)
            .map(|e| e.episode.clone())
            .collect()
    }

    /// Apply a payload; either all of it lands or none of it does
    pub fn bulk_update(
        &mut self,
        patient: &mut Patient,
        data: &SavePayload,
        user: &User,
        options: &StoreOptions,
    ) -> PathwayResult<()> {
        let mut next = self.clone();
        let patient_id = next.apply(patient.id, data, user, options)?;
        *self = next;
        patient.id = Some(patient_id);
        Ok(())
    }

    fn apply(
        &mut self,
        patient_id: Option<PatientId>,
        data: &SavePayload,
        user: &User,
        options: &StoreOptions,
    ) -> PathwayResult<PatientId> {
        let patient_id = match patient_id {
            Some(id) if self.patients.contains_key(&id) => id,
            Some(id) => return Err(PathwayError::record(format!("unknown patient {}", id))),
            None => self.create_patient(),
        };

        let mut episode_id = None;
        for api_name in data.keys() {
            let records = records_in(data, api_name)?;
            if records.is_empty() {
                continue;
            }

            let singleton = options.singleton_models.contains(api_name);
            for record in records {
                let record = stamp(record, user);
                let next_record_id = &mut self.next_record_id;

                let target = if options.is_patient_scoped(api_name) {
                    self.patients
                        .get_mut(&patient_id)
                        .map(|p| p.records.entry(api_name.clone()).or_default())
                } else {
                    let id = match episode_id {
                        Some(id) => id,
                        None => {
                            let id = latest_or_new_episode(
                                &mut self.episodes,
                                &mut self.next_episode_id,
                                patient_id,
                            );
                            episode_id = Some(id);
                            id
                        }
                    };
                    self.episodes
                        .get_mut(&id)
                        .map(|e| e.records.entry(api_name.clone()).or_default())
                };

                let target = target.ok_or_else(|| {
                    PathwayError::record(format!("no owner for '{}' records", api_name))
                })?;
                upsert(target, record, api_name, singleton, next_record_id)?;
            }
        }

        Ok(patient_id)
    }

    fn create_patient(&mut self) -> PatientId {
        self.next_patient_id += 1;
        let id = self.next_patient_id;
        self.patients.insert(
            id,
            PatientRecords {
                id,
                records: RecordsByModel::new(),
            },
        );
        tracing::debug!("Created patient {}", id);
        id
    }
}

fn latest_or_new_episode(
    episodes: &mut BTreeMap<EpisodeId, EpisodeRecords>,
    next_episode_id: &mut EpisodeId,
    patient_id: PatientId,
) -> EpisodeId {
    if let Some(existing) = episodes
        .values()
        .filter(|e| e.episode.patient_id == patient_id)
        .map(|e| e.episode.id)
        .max()
    {
        return existing;
    }

    *next_episode_id += 1;
    let id = *next_episode_id;
    episodes.insert(
        id,
        EpisodeRecords {
            episode: Episode {
                id,
                patient_id,
                created: Utc::now(),
            },
            records: RecordsByModel::new(),
        },
    );
    tracing::debug!("Opened episode {} for patient {}", id, patient_id);
    id
}

fn stamp(mut record: Record, user: &User) -> Record {
    record.insert("updated".to_string(), Value::String(Utc::now().to_rfc3339()));
    record.insert("updated_by".to_string(), Value::String(user.username.clone()));
    record
}

fn upsert(
    records: &mut Vec<Record>,
    mut record: Record,
    api_name: &str,
    singleton: bool,
    next_record_id: &mut u64,
) -> PathwayResult<()> {
    match record.get("id") {
        Some(Value::Number(n)) => {
            let id = n.as_u64().ok_or_else(|| {
                PathwayError::payload(format!("'{}' record id must be a positive integer", api_name))
            })?;
            let existing = records
                .iter_mut()
                .find(|r| r.get("id").and_then(Value::as_u64) == Some(id))
                .ok_or_else(|| {
                    PathwayError::record(format!("{} record {} does not exist", api_name, id))
                })?;
            existing.extend(record);
        }
        Some(Value::Null) | None => {
            record.remove("id");
            if singleton && !records.is_empty() {
                records[0].extend(record);
            } else {
                *next_record_id += 1;
                record.insert("id".to_string(), Value::from(*next_record_id));
                records.push(record);
            }
        }
        Some(other) => {
            return Err(PathwayError::payload(format!(
                "'{}' record id must be a number, got {}",
                api_name, other
            )));
        }
    }
    Ok(())
}

fn matches_hospital_number(record: &Record, hospital_number: &str) -> bool {
    match record.get(HOSPITAL_NUMBER) {
        Some(Value::String(s)) => s == hospital_number,
        Some(Value::Number(n)) => n.to_string() == hospital_number,
        _ => false,
    }
}
