// Pathways Core - Pathway definitions and per-request handles
//
// A PathwayDefinition is the immutable description an app registers once:
// name, display name, serialization variant, redirect policy and the ordered
// steps. A Pathway is the short-lived handle a request works with; it pairs
// a shared definition with an optional episode id.

use crate::error::PathwayResult;
use crate::records::{
    hospital_number, Episode, EpisodeId, Patient, RecordStore, SavePayload, User,
};
use crate::routes::{RouteTable, PATHWAY_CREATE};
use crate::slug::slugify;
use crate::step::{PathwayStep, StepEntry};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Fallback template every pathway can render with
pub const DEFAULT_TEMPLATE: &str = "pathway/pathway_detail.html";

/// How a pathway is presented, which only changes its serialized shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathwayVariant {
    /// One form per step
    #[default]
    Standard,
    /// Opened in a modal by the front end; serialized like `Standard`
    Modal,
    /// All forms displayed at once rather than as a sequence
    Unrolled,
}

/// Where the front end goes after a successful save
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectPolicy {
    #[default]
    None,
    Patient,
    Episode,
}

#[derive(Debug, Clone)]
pub struct PathwayDefinition {
    name: String,
    slug: String,
    display_name: String,
    variant: PathwayVariant,
    redirect: RedirectPolicy,
    steps: Vec<StepEntry>,
}

impl PathwayDefinition {
    /// Start a definition; the slug is derived from `name`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            slug: slugify(&name),
            display_name: name.clone(),
            name,
            variant: PathwayVariant::default(),
            redirect: RedirectPolicy::default(),
            steps: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_variant(mut self, variant: PathwayVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn modal(self) -> Self {
        self.with_variant(PathwayVariant::Modal)
    }

    pub fn unrolled(self) -> Self {
        self.with_variant(PathwayVariant::Unrolled)
    }

    pub fn with_redirect(mut self, redirect: RedirectPolicy) -> Self {
        self.redirect = redirect;
        self
    }

    /// Append a step or a bare record model
    pub fn step(mut self, entry: impl Into<StepEntry>) -> Self {
        self.steps.push(entry.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn variant(&self) -> PathwayVariant {
        self.variant
    }

    pub fn redirect_policy(&self) -> RedirectPolicy {
        self.redirect
    }

    pub fn entries(&self) -> &[StepEntry] {
        &self.steps
    }

    /// Steps in order, with bare models wrapped
    pub fn steps(&self) -> Vec<Arc<dyn PathwayStep>> {
        self.steps.iter().map(StepEntry::as_step).collect()
    }

    /// Templates to try, most specific first
    pub fn template_names(&self) -> Vec<String> {
        let mut names = vec![DEFAULT_TEMPLATE.to_string()];
        if !self.slug.is_empty() {
            names.insert(0, format!("pathway/{}.html", self.slug));
        }
        names
    }
}

/// A pathway bound to one request
#[derive(Debug, Clone)]
pub struct Pathway {
    definition: Arc<PathwayDefinition>,
    episode_id: Option<EpisodeId>,
}

impl Pathway {
    pub fn new(definition: Arc<PathwayDefinition>, episode_id: Option<EpisodeId>) -> Self {
        Self {
            definition,
            episode_id,
        }
    }

    pub fn definition(&self) -> &PathwayDefinition {
        &self.definition
    }

    pub fn slug(&self) -> &str {
        self.definition.slug()
    }

    pub fn display_name(&self) -> &str {
        self.definition.display_name()
    }

    pub fn episode_id(&self) -> Option<EpisodeId> {
        self.episode_id
    }

    pub fn steps(&self) -> Vec<Arc<dyn PathwayStep>> {
        self.definition.steps()
    }

    pub fn template_names(&self) -> Vec<String> {
        self.definition.template_names()
    }

    /// The episode this request is bound to, if any
    pub async fn episode(&self, store: &dyn RecordStore) -> PathwayResult<Option<Episode>> {
        match self.episode_id {
            Some(id) => store.get_episode(id).await,
            None => Ok(None),
        }
    }

    pub fn save_url(&self, routes: &RouteTable) -> PathwayResult<String> {
        routes.reverse(PATHWAY_CREATE, &[("name", self.slug())])
    }

    /// Serialized form sent to the front end
    pub fn to_dict(&self, routes: &RouteTable) -> PathwayResult<Value> {
        let steps = self
            .steps()
            .iter()
            .map(|step| step.to_dict(routes).map(Value::Object))
            .collect::<PathwayResult<Vec<_>>>()?;

        let mut dict = Map::new();
        dict.insert("steps".to_string(), Value::Array(steps));
        dict.insert("title".to_string(), self.display_name().into());
        dict.insert("save_url".to_string(), self.save_url(routes)?.into());

        if self.definition.variant == PathwayVariant::Unrolled {
            dict.insert("unrolled".to_string(), Value::Bool(true));
        }

        Ok(Value::Object(dict))
    }

    /// Where to send the user after saving `patient`
    pub async fn redirect_url(
        &self,
        patient: &Patient,
        store: &dyn RecordStore,
    ) -> PathwayResult<Option<String>> {
        match self.definition.redirect {
            RedirectPolicy::None => Ok(None),
            RedirectPolicy::Patient => Ok(Some(patient_url(patient.require_id()?))),
            RedirectPolicy::Episode => {
                let patient_id = patient.require_id()?;
                match store.episodes_for(patient).await?.last() {
                    Some(episode) => Ok(Some(format!(
                        "/#/patient/{}/{}",
                        patient_id, episode.id
                    ))),
                    None => {
                        tracing::warn!(
                            "Patient {} has no episodes; redirecting to patient",
                            patient_id
                        );
                        Ok(Some(patient_url(patient_id)))
                    }
                }
            }
        }
    }

    /// Run step hooks, find or create the patient, and hand the payload to the store
    pub async fn save(
        &self,
        mut data: SavePayload,
        user: &User,
        store: &dyn RecordStore,
    ) -> PathwayResult<Patient> {
        for step in self.steps() {
            step.pre_save(&mut data, user)?;
        }

        let existing = match hospital_number(&data)? {
            Some(number) => store.find_patient_by_hospital_number(&number).await?,
            None => None,
        };

        let mut patient = match existing {
            Some(patient) => {
                tracing::debug!("Updating existing patient {:?}", patient.id);
                patient
            }
            None => Patient::new(),
        };

        store.bulk_update(&mut patient, &data, user).await?;
        tracing::info!(
            "Saved pathway '{}' for patient {:?} as {}",
            self.slug(),
            patient.id,
            user.username
        );
        Ok(patient)
    }
}

fn patient_url(patient_id: u64) -> String {
    format!("/#/patient/{}", patient_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordModel;
    use crate::step::{MultiSaveStep, Step};
    use serde_json::json;

    fn demographics() -> RecordModel {
        RecordModel::new("demographics", "Demographics").with_icon("fa fa-user")
    }

    fn diagnosis() -> RecordModel {
        RecordModel::new("diagnosis", "Diagnosis")
    }

    fn add_patient() -> Arc<PathwayDefinition> {
        Arc::new(
            PathwayDefinition::new("AddPatientPathway")
                .with_display_name("Add Patient")
                .step(demographics())
                .step(MultiSaveStep::new(diagnosis()))
                .step(
                    Step::new()
                        .with("title", "Notes")
                        .with("template_url", "/templates/notes.html"),
                ),
        )
    }

    #[test]
    fn test_slug_and_templates() {
        let pathway = Pathway::new(add_patient(), None);
        assert_eq!(pathway.slug(), "addpatientpathway");
        assert_eq!(
            pathway.template_names(),
            vec![
                "pathway/addpatientpathway.html".to_string(),
                DEFAULT_TEMPLATE.to_string()
            ]
        );
    }

    #[test]
    fn test_to_dict_shape() {
        let pathway = Pathway::new(add_patient(), Some(3));
        let dict = pathway.to_dict(&RouteTable::new()).unwrap();

        assert_eq!(dict["title"], json!("Add Patient"));
        assert_eq!(dict["save_url"], json!("/pathway/addpatientpathway/"));
        assert!(dict.get("unrolled").is_none());

        let steps = dict["steps"].as_array().unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0]["api_name"], json!("demographics"));
        assert_eq!(steps[1]["controller_class"], json!("MultiSaveCtrl"));
        assert_eq!(steps[2], json!({"title": "Notes", "template_url": "/templates/notes.html"}));
    }

    #[test]
    fn test_variants() {
        let routes = RouteTable::new();

        let unrolled = Pathway::new(
            Arc::new(PathwayDefinition::new("UnrolledPathway").unrolled().step(diagnosis())),
            None,
        );
        assert_eq!(unrolled.to_dict(&routes).unwrap()["unrolled"], json!(true));

        let modal = Pathway::new(
            Arc::new(PathwayDefinition::new("ModalPathway").modal().step(diagnosis())),
            None,
        );
        let dict = modal.to_dict(&routes).unwrap();
        assert!(dict.get("unrolled").is_none());
        assert_eq!(dict["title"], json!("ModalPathway"));
    }
}
