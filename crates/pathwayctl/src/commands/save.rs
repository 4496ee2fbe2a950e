use anyhow::{bail, Context, Result};
use pathway_core::{SavePayload, User};
use pathway_records::{FileRecordStore, StoreOptions};
use serde_json::{json, Value};
use std::path::Path;

use super::load_site;

/// Save a payload file through a pathway and report where the front end would go next
pub async fn execute(
    config_path: &Path,
    slug: &str,
    data_path: &Path,
    user: &str,
    episode: Option<u64>,
) -> Result<()> {
    let (config, site) = load_site(config_path)?;
    let pathway = site.pathway(slug, episode)?;
    let data = read_payload(data_path)?;

    let options = StoreOptions::from_config(&config)
        .with_patient_models(site.models().patient_models());
    let store = FileRecordStore::open(config.store_path(), options)
        .await
        .with_context(|| format!("Failed to open record store {}", config.store_path().display()))?;

    let user = User::new(user);
    let patient = pathway.save(data, &user, &store).await?;
    let redirect_url = pathway.redirect_url(&patient, &store).await?;

    let result = json!({
        "pathway": pathway.slug(),
        "patient_id": patient.id,
        "redirect_url": redirect_url,
    });
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn read_payload(path: &Path) -> Result<SavePayload> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read payload {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse payload {}", path.display()))?;

    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("Payload {} must be a JSON object keyed by model API name", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_payload_requires_object() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("payload.json");

        std::fs::write(&path, r#"[{"hospital_number": "H1"}]"#).unwrap();
        assert!(read_payload(&path).is_err());

        std::fs::write(&path, r#"{"demographics": [{"hospital_number": "H1"}]}"#).unwrap();
        let payload = read_payload(&path).unwrap();
        assert!(payload.contains_key("demographics"));
    }
}
