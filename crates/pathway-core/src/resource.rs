// Pathways Core - Shared resource plumbing
//
// Every YAML resource (RecordModel, Pathway, PathwaysConfig) uses the same
// apiVersion/kind/metadata/spec envelope and the same loading helpers.

use crate::error::{PathwayError, PathwayResult};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "pathways.dev/v1";

pub(crate) fn default_api_version() -> String {
    API_VERSION.to_string()
}

/// Resource metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceMetadata {
    /// Resource name (unique per kind)
    pub name: String,

    /// Labels for categorization
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,

    /// Annotations for additional metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub annotations: HashMap<String, String>,
}

/// Deserialize every YAML document in a file
///
/// Errors carry the file name and the path of the offending field.
pub fn load_yaml_documents<T: DeserializeOwned>(path: &Path) -> PathwayResult<Vec<T>> {
    let content = std::fs::read_to_string(path)?;
    deserialize_documents(&content)
        .map_err(|e| PathwayError::config(format!("{}: {}", path.display(), e)))
}

/// Deserialize every YAML document in a string
pub fn parse_yaml_documents<T: DeserializeOwned>(content: &str) -> PathwayResult<Vec<T>> {
    deserialize_documents(content).map_err(PathwayError::Config)
}

/// Multi-document deserialization; the error names the offending field path
pub(crate) fn deserialize_documents<T: DeserializeOwned>(content: &str) -> Result<Vec<T>, String> {
    let mut resources = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        let resource: T = serde_path_to_error::deserialize(document)
            .map_err(|e| format!("{} (at '{}')", e.inner(), e.path()))?;
        resources.push(resource);
    }
    Ok(resources)
}

/// Reject a document whose `kind` is not the one being loaded
pub(crate) fn expect_kind(kind: &str, expected: &str, name: &str) -> Result<(), String> {
    if kind != expected {
        return Err(format!("'{}' has kind {}, expected {}", name, kind, expected));
    }
    Ok(())
}

/// YAML files directly inside a directory, sorted by name
pub(crate) fn yaml_files(dir: &Path) -> PathwayResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let file_path = entry?.path();
        if file_path
            .extension()
            .map_or(false, |e| e == "yaml" || e == "yml")
        {
            files.push(file_path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        metadata: ResourceMetadata,
        #[serde(default = "default_api_version", rename = "apiVersion")]
        api_version: String,
    }

    #[test]
    fn test_parse_documents() {
        let yaml = "metadata:\n  name: a\n---\nmetadata:\n  name: b\n";
        let samples: Vec<Sample> = parse_yaml_documents(yaml).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].metadata.name, "b");
        assert_eq!(samples[0].api_version, API_VERSION);
    }

    #[test]
    fn test_parse_error_reports_path() {
        let yaml = "metadata:\n  name: [1, 2]\n";
        let err = parse_yaml_documents::<Sample>(yaml).unwrap_err();
        assert!(matches!(err, PathwayError::Config(_)));
        assert!(
            err.to_string().contains("metadata.name"),
            "unexpected error: {}",
            err
        );
    }

    #[test]
    fn test_expect_kind() {
        assert!(expect_kind("Pathway", "Pathway", "intake").is_ok());
        assert_eq!(
            expect_kind("Pathway", "RecordModel", "intake").unwrap_err(),
            "'intake' has kind Pathway, expected RecordModel"
        );
    }
}
