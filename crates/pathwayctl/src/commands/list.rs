use anyhow::Result;
use pathway_core::resource::API_VERSION;
use pathway_core::PathwayDefinition;
use serde_json::{json, Value};
use std::path::Path;

use super::load_site;

/// List registered pathways (kubectl-style output formats)
pub fn execute(config_path: &Path, output: &str) -> Result<()> {
    let (_, site) = load_site(config_path)?;
    let pathways = site.list();

    match output {
        "json" | "yaml" => {
            let items: Vec<Value> = pathways.iter().map(|p| to_item(p)).collect();
            let list = json!({
                "apiVersion": API_VERSION,
                "kind": "PathwayList",
                "items": items,
            });
            if output == "json" {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                print!("{}", serde_yaml::to_string(&list)?);
            }
        }
        "name" => {
            for pathway in &pathways {
                println!("pathway/{}", pathway.slug());
            }
        }
        _ => {
            if pathways.is_empty() {
                println!("No pathways registered.");
                return Ok(());
            }
            println!(
                "{:<28} {:<32} {:<10} {:<9} {}",
                "SLUG", "DISPLAY NAME", "VARIANT", "REDIRECT", "STEPS"
            );
            for pathway in &pathways {
                println!(
                    "{:<28} {:<32} {:<10} {:<9} {}",
                    pathway.slug(),
                    pathway.display_name(),
                    label(&pathway.variant()),
                    label(&pathway.redirect_policy()),
                    pathway.entries().len()
                );
            }
        }
    }

    Ok(())
}

fn to_item(pathway: &PathwayDefinition) -> Value {
    json!({
        "metadata": { "name": pathway.name() },
        "slug": pathway.slug(),
        "displayName": pathway.display_name(),
        "variant": pathway.variant(),
        "redirect": pathway.redirect_policy(),
        "steps": pathway.entries().len(),
    })
}

/// Serialized name of a unit enum variant
fn label<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(Value::String(s)) => s,
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathway_core::{PathwayVariant, RedirectPolicy};

    #[test]
    fn test_item_shape() {
        let definition = PathwayDefinition::new("Add Patient")
            .unrolled()
            .with_redirect(RedirectPolicy::Episode);
        let item = to_item(&definition);

        assert_eq!(item["slug"], "add-patient");
        assert_eq!(item["variant"], "unrolled");
        assert_eq!(item["redirect"], "episode");
        assert_eq!(item["steps"], 0);
    }

    #[test]
    fn test_label() {
        assert_eq!(label(&PathwayVariant::Modal), "modal");
        assert_eq!(label(&RedirectPolicy::None), "none");
    }
}
