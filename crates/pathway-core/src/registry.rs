// Pathways Core - Pathway registry
//
// Pathways are registered explicitly, once, while the hosting application
// starts. Registration validates every step so configuration mistakes fail
// at startup instead of when a user opens the form. Lookups are by slug;
// listing preserves registration order.

use crate::error::{PathwayError, PathwayResult};
use crate::pathway::{Pathway, PathwayDefinition};
use crate::records::EpisodeId;

use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct PathwayRegistry {
    pathways: Vec<Arc<PathwayDefinition>>,
    by_slug: HashMap<String, usize>,
}

impl PathwayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add a pathway
    pub fn register(&mut self, definition: PathwayDefinition) -> PathwayResult<Arc<PathwayDefinition>> {
        validate_definition(&definition)?;

        let slug = definition.slug().to_string();
        if let Some(&index) = self.by_slug.get(&slug) {
            return Err(PathwayError::DuplicateSlug {
                slug,
                existing: self.pathways[index].name().to_string(),
            });
        }

        let definition = Arc::new(definition);
        self.by_slug.insert(slug.clone(), self.pathways.len());
        self.pathways.push(Arc::clone(&definition));
        tracing::debug!("Registered pathway: {} ({})", definition.name(), slug);
        Ok(definition)
    }

    /// The pathway registered under `slug`
    pub fn get(&self, slug: &str) -> PathwayResult<Arc<PathwayDefinition>> {
        self.by_slug
            .get(slug)
            .map(|&index| Arc::clone(&self.pathways[index]))
            .ok_or_else(|| PathwayError::NotFound(slug.to_string()))
    }

    /// A request handle for `slug`, optionally bound to an episode
    pub fn build(&self, slug: &str, episode_id: Option<EpisodeId>) -> PathwayResult<Pathway> {
        Ok(Pathway::new(self.get(slug)?, episode_id))
    }

    /// All pathways in registration order
    pub fn list(&self) -> Vec<Arc<PathwayDefinition>> {
        self.pathways.clone()
    }

    pub fn slugs(&self) -> Vec<&str> {
        self.pathways.iter().map(|p| p.slug()).collect()
    }

    pub fn exists(&self, slug: &str) -> bool {
        self.by_slug.contains_key(slug)
    }

    pub fn count(&self) -> usize {
        self.pathways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pathways.is_empty()
    }
}

fn validate_definition(definition: &PathwayDefinition) -> PathwayResult<()> {
    if definition.name().trim().is_empty() {
        return Err(PathwayError::config("Pathway name is required"));
    }
    if definition.slug().is_empty() {
        return Err(PathwayError::config(format!(
            "Pathway name '{}' does not produce a usable slug",
            definition.name()
        )));
    }

    for (index, step) in definition.steps().iter().enumerate() {
        step.validate().map_err(|e| PathwayError::InvalidPathway {
            pathway: definition.name().to_string(),
            step: index,
            source: Box::new(e),
        })?;
    }

    Ok(())
}
