// Pathways Core - Error types
//
// A single error enum shared by every pathway crate. Variants map onto the
// HTTP status a hosting web layer should answer with (see `status_code`).

use crate::field::StepField;
use thiserror::Error;

/// Result alias used throughout the pathway crates
pub type PathwayResult<T> = Result<T, PathwayError>;

#[derive(Debug, Error)]
pub enum PathwayError {
    /// No pathway is registered under the requested slug
    #[error("Pathway does not exist: {0}")]
    NotFound(String),

    /// A step field has neither an explicit override nor a model to derive it from
    #[error("{field} needs to either be a keyword or we need a model set")]
    MissingField { field: StepField },

    /// A pathway failed validation while being registered
    #[error("Invalid pathway '{pathway}' at step {step}: {source}")]
    InvalidPathway {
        pathway: String,
        step: usize,
        #[source]
        source: Box<PathwayError>,
    },

    /// Another pathway already claimed this slug
    #[error("Duplicate pathway slug '{slug}' (registered by '{existing}')")]
    DuplicateSlug { slug: String, existing: String },

    /// A step references a record model that no app declared
    #[error("Unknown record model: {0}")]
    UnknownModel(String),

    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    /// Route parameters missing or not matching the route pattern
    #[error("Reverse for '{route}' not found: {reason}")]
    NoReverseMatch { route: String, reason: String },

    /// The save payload is malformed
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Failure reported by the record store
    #[error("Record store error: {0}")]
    Record(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PathwayError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn record(msg: impl Into<String>) -> Self {
        Self::Record(msg.into())
    }

    pub fn payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }

    /// HTTP status a web layer should respond with for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidPayload(_) => 400,
            _ => 500,
        }
    }

    /// Whether this is the "pathway does not exist" condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PathwayError::NotFound("x".into()).status_code(), 404);
        assert_eq!(PathwayError::payload("bad").status_code(), 400);
        assert_eq!(PathwayError::record("down").status_code(), 500);
    }

    #[test]
    fn test_missing_field_message() {
        let err = PathwayError::MissingField {
            field: StepField::Title,
        };
        assert_eq!(
            err.to_string(),
            "title needs to either be a keyword or we need a model set"
        );
    }
}
