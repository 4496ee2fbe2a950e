use anyhow::{bail, Result};
use std::path::Path;

use super::load_site;

/// Run discovery, then render every pathway to catch fields that only fail at render time
pub fn execute(config_path: &Path) -> Result<()> {
    let (_, site) = load_site(config_path)?;
    println!("{}", site.summary());

    let mut failures = 0;
    for definition in site.list() {
        let pathway = site.pathway(definition.slug(), None)?;
        match pathway.to_dict(site.routes()) {
            Ok(_) => println!("  ok      {}", definition.slug()),
            Err(e) => {
                failures += 1;
                println!("  FAILED  {}: {}", definition.slug(), e);
            }
        }
    }

    if failures > 0 {
        bail!("{} pathway(s) failed to render", failures);
    }
    Ok(())
}
