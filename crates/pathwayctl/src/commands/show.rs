use anyhow::{bail, Result};
use std::path::Path;

use super::load_site;

/// Print a pathway's front-end dictionary
pub fn execute(config_path: &Path, slug: &str, episode: Option<u64>, output: &str) -> Result<()> {
    let (_, site) = load_site(config_path)?;
    let pathway = site.pathway(slug, episode)?;
    let dict = pathway.to_dict(site.routes())?;

    match output {
        "json" => println!("{}", serde_json::to_string_pretty(&dict)?),
        "yaml" => print!("{}", serde_yaml::to_string(&dict)?),
        other => bail!("Unsupported output format: {} (expected json or yaml)", other),
    }

    Ok(())
}
