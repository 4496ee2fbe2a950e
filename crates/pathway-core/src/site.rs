// Pathways Core - Site initialization
//
// A PathwaySite is built once by the hosting application's startup code and
// then shared (usually as Arc<PathwaySite>) with every request handler. It
// owns the route table, the record model catalog and the pathway registry.

use crate::config::PathwaysConfig;
use crate::discovery::{discover_models, discover_pathways, DiscoverySummary, PathwayPlugin};
use crate::error::PathwayResult;
use crate::model::ModelCatalog;
use crate::pathway::{Pathway, PathwayDefinition};
use crate::records::EpisodeId;
use crate::registry::PathwayRegistry;
use crate::routes::RouteTable;

use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PathwaySite {
    routes: RouteTable,
    models: ModelCatalog,
    pathways: PathwayRegistry,
    summary: DiscoverySummary,
}

impl PathwaySite {
    pub fn builder() -> PathwaySiteBuilder {
        PathwaySiteBuilder::default()
    }

    /// Discover everything the config's installed apps provide
    pub fn from_config(config: &PathwaysConfig) -> PathwayResult<Self> {
        Self::builder()
            .routes(config.route_table())
            .apps(config.app_dirs())
            .build()
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn models(&self) -> &ModelCatalog {
        &self.models
    }

    pub fn pathways(&self) -> &PathwayRegistry {
        &self.pathways
    }

    pub fn summary(&self) -> DiscoverySummary {
        self.summary
    }

    pub fn list(&self) -> Vec<Arc<PathwayDefinition>> {
        self.pathways.list()
    }

    /// Request handle for `slug`; unknown slugs are `NotFound`
    pub fn pathway(&self, slug: &str, episode_id: Option<EpisodeId>) -> PathwayResult<Pathway> {
        self.pathways.build(slug, episode_id)
    }
}

#[derive(Default)]
pub struct PathwaySiteBuilder {
    routes: Option<RouteTable>,
    apps: Vec<PathBuf>,
    plugins: Vec<Box<dyn PathwayPlugin>>,
}

impl PathwaySiteBuilder {
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = Some(routes);
        self
    }

    pub fn app(mut self, dir: impl Into<PathBuf>) -> Self {
        self.apps.push(dir.into());
        self
    }

    pub fn apps(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.apps.extend(dirs);
        self
    }

    pub fn plugin(mut self, plugin: impl PathwayPlugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Run discovery: plugin models, app models, plugin pathways, app pathways
    pub fn build(self) -> PathwayResult<PathwaySite> {
        let mut models = ModelCatalog::new();
        let mut pathways = PathwayRegistry::new();
        let mut summary = DiscoverySummary {
            apps: self.apps.len(),
            plugins: self.plugins.len(),
            ..Default::default()
        };

        for app in &self.apps {
            if !app.is_dir() {
                tracing::warn!("Installed app {} is not a directory; skipping", app.display());
            }
        }

        for plugin in &self.plugins {
            tracing::debug!("Registering models from plugin {}", plugin.name());
            plugin.register_models(&mut models)?;
        }
        for app in &self.apps {
            discover_models(app, &mut models)?;
        }
        summary.models = models.count();

        for plugin in &self.plugins {
            tracing::debug!("Registering pathways from plugin {}", plugin.name());
            plugin.register_pathways(&mut pathways, &models)?;
        }
        for app in &self.apps {
            discover_pathways(app, &models, &mut pathways)?;
        }
        summary.pathways = pathways.count();

        tracing::info!("{}", summary);
        Ok(PathwaySite {
            routes: self.routes.unwrap_or_default(),
            models,
            pathways,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PathwayError;
    use crate::model::{RecordModel, RecordScope};

    struct CorePlugin;

    impl PathwayPlugin for CorePlugin {
        fn name(&self) -> &str {
            "core"
        }

        fn register_models(&self, models: &mut ModelCatalog) -> PathwayResult<()> {
            models.register(
                RecordModel::new("demographics", "Demographics").with_scope(RecordScope::Patient),
            )
        }

        fn register_pathways(
            &self,
            pathways: &mut PathwayRegistry,
            models: &ModelCatalog,
        ) -> PathwayResult<()> {
            let demographics = models.resolve("demographics")?.clone();
            pathways.register(PathwayDefinition::new("AddPatientPathway").step(demographics))?;
            Ok(())
        }
    }

    #[test]
    fn test_plugin_registration() {
        let site = PathwaySite::builder().plugin(CorePlugin).build().unwrap();
        assert_eq!(site.summary().plugins, 1);
        assert_eq!(site.summary().pathways, 1);
        assert_eq!(site.models().count(), 1);

        let pathway = site.pathway("addpatientpathway", None).unwrap();
        assert_eq!(pathway.display_name(), "AddPatientPathway");
        assert!(matches!(
            site.pathway("unknown", None),
            Err(PathwayError::NotFound(_))
        ));
    }

    #[test]
    fn test_missing_app_dir_is_tolerated() {
        let site = PathwaySite::builder()
            .app("/definitely/not/a/real/app")
            .build()
            .unwrap();
        assert_eq!(site.summary().apps, 1);
        assert!(site.list().is_empty());
    }
}
