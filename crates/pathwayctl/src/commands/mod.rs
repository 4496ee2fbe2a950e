pub mod completion;
pub mod list;
pub mod save;
pub mod show;
pub mod templates;
pub mod validate;

use anyhow::{Context, Result};
use pathway_core::{PathwaySite, PathwaysConfig};
use std::path::Path;

/// Load the config and run startup discovery over its installed apps
pub fn load_site(config_path: &Path) -> Result<(PathwaysConfig, PathwaySite)> {
    tracing::debug!("Using config {}", config_path.display());
    let config = PathwaysConfig::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    let site = PathwaySite::from_config(&config)
        .with_context(|| format!("Failed to load pathways for {}", config_path.display()))?;
    Ok((config, site))
}
