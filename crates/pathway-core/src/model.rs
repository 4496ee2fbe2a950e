// Pathways Core - Record model descriptors
//
// A RecordModel describes one record type of the external records system:
// the API name the front end posts under, a display name and an optional
// icon. Steps bound to a model derive their UI metadata from it.

use crate::error::{PathwayError, PathwayResult};
use crate::resource::{default_api_version, expect_kind, load_yaml_documents, ResourceMetadata};
use crate::routes::is_route_param;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Where records of a model hang in the records tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordScope {
    /// One or more records per patient (demographics, allergies)
    Patient,
    /// Records attached to an episode of care
    #[default]
    Episode,
}

/// Descriptor of a record type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordModel {
    pub api_name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub scope: RecordScope,
}

impl RecordModel {
    pub fn new(api_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            api_name: api_name.into(),
            display_name: display_name.into(),
            icon: None,
            scope: RecordScope::default(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_scope(mut self, scope: RecordScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_name.is_empty() {
            return Err("RecordModel api_name is required".to_string());
        }
        if !is_route_param(&self.api_name) {
            return Err(format!(
                "RecordModel api_name '{}' must use only lowercase letters, digits, '_' and '-'",
                self.api_name
            ));
        }
        if self.display_name.is_empty() {
            return Err(format!("RecordModel '{}' requires a display name", self.api_name));
        }
        Ok(())
    }
}

/// RecordModel as declared in an app's YAML files
///
/// Example:
/// ```yaml
/// apiVersion: pathways.dev/v1
/// kind: RecordModel
/// metadata:
///   name: diagnosis
/// spec:
///   displayName: Diagnosis
///   icon: fa fa-stethoscope
///   scope: episode
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordModelResource {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_model_kind")]
    pub kind: String,

    pub metadata: ResourceMetadata,

    pub spec: RecordModelSpec,
}

/// Kind of record model resources
pub const RECORD_MODEL_KIND: &str = "RecordModel";

fn default_model_kind() -> String {
    RECORD_MODEL_KIND.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordModelSpec {
    /// Defaults to the resource name when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default)]
    pub scope: RecordScope,
}

impl From<RecordModelResource> for RecordModel {
    fn from(resource: RecordModelResource) -> Self {
        let display_name = resource
            .spec
            .display_name
            .unwrap_or_else(|| resource.metadata.name.clone());
        Self {
            api_name: resource.metadata.name,
            display_name,
            icon: resource.spec.icon,
            scope: resource.spec.scope,
        }
    }
}

/// All record models known to the site, keyed by API name
#[derive(Debug, Default, Clone)]
pub struct ModelCatalog {
    models: HashMap<String, RecordModel>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model; a later registration with the same API name replaces the earlier one
    pub fn register(&mut self, model: RecordModel) -> PathwayResult<()> {
        model.validate().map_err(PathwayError::Config)?;
        if self.models.contains_key(&model.api_name) {
            tracing::warn!("Record model '{}' redefined", model.api_name);
        }
        self.models.insert(model.api_name.clone(), model);
        Ok(())
    }

    pub fn get(&self, api_name: &str) -> Option<&RecordModel> {
        self.models.get(api_name)
    }

    /// Look up a model, failing when no app declared it
    pub fn resolve(&self, api_name: &str) -> PathwayResult<&RecordModel> {
        self.get(api_name)
            .ok_or_else(|| PathwayError::UnknownModel(api_name.to_string()))
    }

    pub fn exists(&self, api_name: &str) -> bool {
        self.models.contains_key(api_name)
    }

    /// Sorted model names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// API names of patient-scoped models
    pub fn patient_models(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .models
            .values()
            .filter(|m| m.scope == RecordScope::Patient)
            .map(|m| m.api_name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn count(&self) -> usize {
        self.models.len()
    }

    /// Load every RecordModel resource from a YAML file
    pub fn load_file(&mut self, path: &Path) -> PathwayResult<usize> {
        let resources: Vec<RecordModelResource> = load_yaml_documents(path)?;
        let mut count = 0;
        for resource in resources {
            expect_kind(&resource.kind, RECORD_MODEL_KIND, &resource.metadata.name)
                .map_err(|e| PathwayError::config(format!("{}: {}", path.display(), e)))?;
            let model = RecordModel::from(resource);
            tracing::debug!("Loaded record model: {}", model.api_name);
            self.register(model)?;
            count += 1;
        }
        Ok(count)
    }

    /// Load all model YAML files in a directory
    pub fn load_directory(&mut self, path: &Path) -> PathwayResult<usize> {
        let mut count = 0;
        for file_path in crate::resource::yaml_files(path)? {
            count += self.load_file(&file_path)?;
        }
        Ok(count)
    }
}
