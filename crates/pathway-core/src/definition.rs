// Pathways Core - Pathway resources
//
// Apps declare pathways in YAML. A step names a record model by API name
// (resolved against the model catalog), can be flagged as multi-save, and
// any other keys become keyword overrides for the step.

use crate::error::{PathwayError, PathwayResult};
use crate::model::ModelCatalog;
use crate::pathway::{PathwayDefinition, PathwayVariant, RedirectPolicy};
use crate::resource::{default_api_version, expect_kind, ResourceMetadata};
use crate::step::{MultiSaveStep, Step, StepEntry};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pathway as declared in an app's YAML files
///
/// Example:
/// ```yaml
/// apiVersion: pathways.dev/v1
/// kind: Pathway
/// metadata:
///   name: AddPatientPathway
/// spec:
///   displayName: Add Patient
///   variant: unrolled
///   redirect: patient
///   steps:
///     - model: demographics
///     - model: diagnosis
///       multiSave: true
///     - title: Notes
///       templateUrl: /templates/notes.html
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwayResource {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_pathway_kind")]
    pub kind: String,

    pub metadata: ResourceMetadata,

    pub spec: PathwaySpec,
}

/// Kind of pathway resources
pub const PATHWAY_KIND: &str = "Pathway";

fn default_pathway_kind() -> String {
    PATHWAY_KIND.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwaySpec {
    /// Title shown to users; defaults to the resource name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default)]
    pub variant: PathwayVariant,

    #[serde(default)]
    pub redirect: RedirectPolicy,

    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSpec {
    /// API name of the record model this step edits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default)]
    pub multi_save: bool,

    /// Everything else is passed through as keyword overrides
    #[serde(flatten)]
    pub overrides: Map<String, Value>,
}

impl PathwayResource {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Resolve model references and build the definition
    pub fn into_definition(self, models: &ModelCatalog) -> PathwayResult<PathwayDefinition> {
        expect_kind(&self.kind, PATHWAY_KIND, &self.metadata.name).map_err(PathwayError::Config)?;
        let name = self.metadata.name;
        let mut definition = PathwayDefinition::new(name.clone())
            .with_variant(self.spec.variant)
            .with_redirect(self.spec.redirect);
        if let Some(display_name) = self.spec.display_name {
            definition = definition.with_display_name(display_name);
        }

        for (index, step) in self.spec.steps.into_iter().enumerate() {
            let entry = step
                .into_entry(models)
                .map_err(|e| PathwayError::InvalidPathway {
                    pathway: name.clone(),
                    step: index,
                    source: Box::new(e),
                })?;
            definition = definition.step(entry);
        }

        Ok(definition)
    }
}

impl StepSpec {
    fn into_entry(self, models: &ModelCatalog) -> PathwayResult<StepEntry> {
        let model = match self.model {
            Some(api_name) => Some(models.resolve(&api_name)?.clone()),
            None => None,
        };
        let overrides = snake_case_keys(self.overrides);

        let entry = match (model, self.multi_save) {
            (Some(model), true) => MultiSaveStep::new(model).with_overrides(overrides).into(),
            (None, true) => {
                return Err(PathwayError::config("multi-save steps need a model"));
            }
            (Some(model), false) if overrides.is_empty() => StepEntry::Model(model),
            (Some(model), false) => Step::for_model(model).with_overrides(overrides).into(),
            (None, false) => Step::new().with_overrides(overrides).into(),
        };
        Ok(entry)
    }
}

fn snake_case_keys(overrides: Map<String, Value>) -> Map<String, Value> {
    overrides
        .into_iter()
        .map(|(key, value)| (to_snake_case(&key), value))
        .collect()
}

/// `templateUrl` → `template_url`; snake_case keys pass through unchanged
fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
