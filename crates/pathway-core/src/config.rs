// Pathways Core - Site configuration
//
// PathwaysConfig lists the installed apps to discover pathways in, route
// template overrides, and record store settings. Relative paths resolve
// against the directory holding the config file.

use crate::error::{PathwayError, PathwayResult};
use crate::records::DEMOGRAPHICS;
use crate::resource::{default_api_version, deserialize_documents, ResourceMetadata};
use crate::routes::RouteTable;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default location of the JSON record store
pub const DEFAULT_STORE_PATH: &str = "records.json";

/// Example:
/// ```yaml
/// apiVersion: pathways.dev/v1
/// kind: PathwaysConfig
/// metadata:
///   name: local
/// spec:
///   installedApps: [apps/core, apps/research]
///   routes:
///     pathway_create: /api/pathways/{name}/
///   patientModels: [demographics, allergies]
///   store:
///     path: records.json
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwaysConfig {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_config_kind")]
    pub kind: String,

    #[serde(default)]
    pub metadata: ResourceMetadata,

    #[serde(default)]
    pub spec: PathwaysConfigSpec,

    /// Directory relative paths resolve against
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

fn default_config_kind() -> String {
    "PathwaysConfig".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwaysConfigSpec {
    /// App directories, searched in order
    #[serde(default)]
    pub installed_apps: Vec<PathBuf>,

    /// Route template overrides by route name
    #[serde(default)]
    pub routes: HashMap<String, String>,

    /// Record models attached to the patient rather than an episode
    #[serde(default = "default_patient_models")]
    pub patient_models: Vec<String>,

    /// Models holding at most one record per owner
    #[serde(default = "default_singleton_models")]
    pub singleton_models: Vec<String>,

    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for PathwaysConfigSpec {
    fn default() -> Self {
        Self {
            installed_apps: Vec::new(),
            routes: HashMap::new(),
            patient_models: default_patient_models(),
            singleton_models: default_singleton_models(),
            store: StoreConfig::default(),
        }
    }
}

fn default_patient_models() -> Vec<String> {
    vec![DEMOGRAPHICS.to_string()]
}

fn default_singleton_models() -> Vec<String> {
    vec![DEMOGRAPHICS.to_string()]
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for PathwaysConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_config_kind(),
            metadata: ResourceMetadata::default(),
            spec: PathwaysConfigSpec::default(),
            base_dir: None,
        }
    }
}

impl PathwaysConfig {
    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> PathwayResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PathwayError::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let mut config = Self::parse(&content)
            .map_err(|e| PathwayError::config(format!("{}: {}", path.display(), e)))?;
        config.base_dir = path.parent().map(Path::to_path_buf);

        tracing::info!(
            "Loaded config '{}' from {} ({} installed apps)",
            config.metadata.name,
            path.display(),
            config.spec.installed_apps.len()
        );
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> PathwayResult<Self> {
        Self::parse(content).map_err(PathwayError::Config)
    }

    fn parse(content: &str) -> Result<Self, String> {
        let mut documents: Vec<Self> = deserialize_documents(content)?;
        if documents.len() != 1 {
            return Err(format!(
                "expected one PathwaysConfig document, found {}",
                documents.len()
            ));
        }
        let config = documents.remove(0);
        config.validate()?;
        Ok(config)
    }

    /// Resolve relative paths against `dir`
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.kind != "PathwaysConfig" {
            return Err(format!("expected kind PathwaysConfig, found {}", self.kind));
        }
        let models = self
            .spec
            .patient_models
            .iter()
            .chain(&self.spec.singleton_models);
        for name in models {
            if name.trim().is_empty() {
                return Err("model names in patientModels and singletonModels must not be empty".to_string());
            }
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Installed app directories, resolved
    pub fn app_dirs(&self) -> Vec<PathBuf> {
        self.spec
            .installed_apps
            .iter()
            .map(|app| self.resolve(app))
            .collect()
    }

    /// Record store file, resolved
    pub fn store_path(&self) -> PathBuf {
        let path = self
            .spec
            .store
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));
        self.resolve(&path)
    }

    /// Default routes with the configured overrides applied
    pub fn route_table(&self) -> RouteTable {
        let mut routes = RouteTable::new();
        routes.extend(&self.spec.routes);
        routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::PATHWAY_CREATE;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = PathwaysConfig::from_yaml("kind: PathwaysConfig\n").unwrap();
        assert!(config.spec.installed_apps.is_empty());
        assert_eq!(config.spec.patient_models, vec!["demographics"]);
        assert_eq!(config.spec.singleton_models, vec!["demographics"]);
        assert_eq!(config.store_path(), PathBuf::from(DEFAULT_STORE_PATH));
    }

    #[test]
    fn test_route_overrides() {
        let yaml = r#"
apiVersion: pathways.dev/v1
kind: PathwaysConfig
metadata:
  name: local
spec:
  routes:
    pathway_create: /api/pathways/{name}/
"#;
        let config = PathwaysConfig::from_yaml(yaml).unwrap();
        let routes = config.route_table();
        assert_eq!(
            routes.reverse(PATHWAY_CREATE, &[("name", "referral")]).unwrap(),
            "/api/pathways/referral/"
        );
    }

    #[test]
    fn test_wrong_kind_rejected() {
        assert!(PathwaysConfig::from_yaml("kind: Pathway\n").is_err());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pathways.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(
            br#"
kind: PathwaysConfig
metadata:
  name: test
spec:
  installedApps: [apps/core, /opt/shared]
  store:
    path: data/records.json
"#,
        )
        .unwrap();

        let config = PathwaysConfig::load(&path).unwrap();
        assert_eq!(
            config.app_dirs(),
            vec![temp_dir.path().join("apps/core"), PathBuf::from("/opt/shared")]
        );
        assert_eq!(config.store_path(), temp_dir.path().join("data/records.json"));
    }

    #[test]
    fn test_bad_field_type_reports_location() {
        let err = PathwaysConfig::from_yaml("kind: PathwaysConfig\nspec:\n  installedApps: 3\n")
            .unwrap_err();
        assert!(err.to_string().contains("spec.installedApps"), "{}", err);
    }

    #[test]
    fn test_load_error_names_file_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pathways.yaml");
        std::fs::write(&path, "kind: Pathway
").unwrap();

        let message = PathwaysConfig::load(&path).unwrap_err().to_string();
        assert!(message.starts_with("Configuration error: "), "{}", message);
        assert_eq!(message.matches("Configuration error").count(), 1, "{}", message);
        assert!(message.contains(&path.display().to_string()), "{}", message);
        assert!(message.contains("expected kind PathwaysConfig"), "{}", message);
    }
}
