// Pathways Core - App discovery
//
// Each installed app may contribute record models and pathways, either as a
// directory of YAML files (`models/`, `pathways/`) or as a single file
// (`models.yaml`, `pathways.yaml`). An app without one of these simply does
// not contribute it. Anything that exists but fails to load is an error.

use crate::definition::PathwayResource;
use crate::error::PathwayResult;
use crate::model::ModelCatalog;
use crate::registry::PathwayRegistry;
use crate::resource::{load_yaml_documents, yaml_files};

use std::fmt;
use std::path::{Path, PathBuf};

/// Conventional name of the pathways location inside an app
pub const PATHWAYS_MODULE: &str = "pathways";
/// Conventional name of the record models location inside an app
pub const MODELS_MODULE: &str = "models";

/// Code-defined contributor of models and pathways
///
/// Plugins are registered on the site builder and called once at startup,
/// models first so pathways can reference models from any plugin or app.
pub trait PathwayPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn register_models(&self, _models: &mut ModelCatalog) -> PathwayResult<()> {
        Ok(())
    }

    fn register_pathways(
        &self,
        pathways: &mut PathwayRegistry,
        models: &ModelCatalog,
    ) -> PathwayResult<()>;
}

/// Files an app provides for a module, or None when the module is absent
fn module_files(app: &Path, module: &str) -> PathwayResult<Option<Vec<PathBuf>>> {
    let dir = app.join(module);
    if dir.is_dir() {
        return Ok(Some(yaml_files(&dir)?));
    }

    for ext in ["yaml", "yml"] {
        let file = app.join(format!("{}.{}", module, ext));
        if file.is_file() {
            return Ok(Some(vec![file]));
        }
    }

    Ok(None)
}

/// Load an app's record models into the catalog
pub fn discover_models(app: &Path, models: &mut ModelCatalog) -> PathwayResult<usize> {
    let Some(files) = module_files(app, MODELS_MODULE)? else {
        tracing::debug!("App {} has no {} module", app.display(), MODELS_MODULE);
        return Ok(0);
    };

    let mut count = 0;
    for file in files {
        count += models.load_file(&file)?;
    }
    Ok(count)
}

/// Load an app's pathways into the registry
pub fn discover_pathways(
    app: &Path,
    models: &ModelCatalog,
    pathways: &mut PathwayRegistry,
) -> PathwayResult<usize> {
    let Some(files) = module_files(app, PATHWAYS_MODULE)? else {
        tracing::debug!("App {} has no {} module", app.display(), PATHWAYS_MODULE);
        return Ok(0);
    };

    let mut count = 0;
    for file in files {
        let resources: Vec<PathwayResource> = load_yaml_documents(&file)?;
        for resource in resources {
            let definition = resource.into_definition(models)?;
            tracing::debug!("Loaded pathway {} from {}", definition.name(), file.display());
            pathways.register(definition)?;
            count += 1;
        }
    }
    Ok(count)
}

/// What startup discovery found
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiscoverySummary {
    pub apps: usize,
    pub plugins: usize,
    pub models: usize,
    pub pathways: usize,
}

impl fmt::Display for DiscoverySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Discovered {} pathways and {} record models from {} apps and {} plugins",
            self.pathways, self.models, self.apps, self.plugins
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PathwayError;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    const MODELS: &str = r#"
kind: RecordModel
metadata:
  name: demographics
spec:
  displayName: Demographics
  scope: patient
"#;

    const PATHWAY: &str = r#"
kind: Pathway
metadata:
  name: AddPatientPathway
spec:
  steps:
    - model: demographics
"#;

    #[test]
    fn test_absent_modules_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let mut models = ModelCatalog::new();
        let mut pathways = PathwayRegistry::new();

        assert_eq!(discover_models(temp_dir.path(), &mut models).unwrap(), 0);
        assert_eq!(
            discover_pathways(temp_dir.path(), &models, &mut pathways).unwrap(),
            0
        );
    }

    #[test]
    fn test_file_and_directory_layouts() {
        let temp_dir = TempDir::new().unwrap();
        let app = temp_dir.path();
        write(&app.join("models.yaml"), MODELS);
        write(&app.join("pathways/add_patient.yaml"), PATHWAY);
        write(&app.join("pathways/README.txt"), "ignored");

        let mut models = ModelCatalog::new();
        let mut pathways = PathwayRegistry::new();
        assert_eq!(discover_models(app, &mut models).unwrap(), 1);
        assert_eq!(discover_pathways(app, &models, &mut pathways).unwrap(), 1);
        assert!(pathways.exists("addpatientpathway"));
    }

    #[test]
    fn test_broken_module_propagates() {
        let temp_dir = TempDir::new().unwrap();
        let app = temp_dir.path();
        write(&app.join("pathways.yml"), "metadata: [not, a, map]\n");

        let models = ModelCatalog::new();
        let mut pathways = PathwayRegistry::new();
        let err = discover_pathways(app, &models, &mut pathways).unwrap_err();
        assert!(matches!(err, PathwayError::Config(_)));
    }

    #[test]
    fn test_pathway_in_models_file_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let app = temp_dir.path();
        write(&app.join("models.yaml"), PATHWAY);

        let mut models = ModelCatalog::new();
        let err = discover_models(app, &mut models).unwrap_err();
        assert!(matches!(err, PathwayError::Config(_)));
        assert!(
            err.to_string().contains("has kind Pathway, expected RecordModel"),
            "{}",
            err
        );
        assert_eq!(models.count(), 0);
    }

    #[test]
    fn test_model_in_pathways_file_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let app = temp_dir.path();
        write(&app.join("pathways.yaml"), MODELS);

        let models = ModelCatalog::new();
        let mut pathways = PathwayRegistry::new();
        let err = discover_pathways(app, &models, &mut pathways).unwrap_err();
        assert!(
            err.to_string().contains("has kind RecordModel, expected Pathway"),
            "{}",
            err
        );
        assert!(pathways.is_empty());
    }

    #[test]
    fn test_summary_display() {
        let summary = DiscoverySummary {
            apps: 2,
            plugins: 1,
            models: 5,
            pathways: 3,
        };
        assert_eq!(
            summary.to_string(),
            "Discovered 3 pathways and 5 record models from 2 apps and 1 plugins"
        );
    }
}
