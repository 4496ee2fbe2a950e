use anyhow::Result;
use std::path::Path;

use super::load_site;

/// Print candidate page templates, most specific first
pub fn execute(config_path: &Path, slug: &str) -> Result<()> {
    let (_, site) = load_site(config_path)?;
    let pathway = site.pathway(slug, None)?;

    for name in pathway.template_names() {
        println!("{}", name);
    }

    Ok(())
}
