//! Step field resolution
//!
//! A step field comes from the step's explicit overrides when present,
//! otherwise from the bound record model. With neither, resolution fails
//! with [`PathwayError::MissingField`].

use crate::error::{PathwayError, PathwayResult};
use crate::model::RecordModel;
use crate::routes::{RouteTable, FORM_TEMPLATE_VIEW};

use serde_json::{Map, Value};
use std::fmt;

/// The UI fields every step can describe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepField {
    TemplateUrl,
    Title,
    Icon,
    ApiName,
}

impl StepField {
    pub const ALL: [StepField; 4] = [
        StepField::TemplateUrl,
        StepField::Title,
        StepField::Icon,
        StepField::ApiName,
    ];

    /// Key used in the serialized step dictionary
    pub fn key(self) -> &'static str {
        match self {
            StepField::TemplateUrl => "template_url",
            StepField::Title => "title",
            StepField::Icon => "icon",
            StepField::ApiName => "api_name",
        }
    }
}

impl fmt::Display for StepField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Resolve one step field: override first, then model, else a configuration error
pub fn resolve_field(
    field: StepField,
    overrides: &Map<String, Value>,
    model: Option<&RecordModel>,
    routes: &RouteTable,
) -> PathwayResult<Value> {
    if let Some(value) = overrides.get(field.key()) {
        return Ok(value.clone());
    }

    let model = model.ok_or(PathwayError::MissingField { field })?;
    derive_from_model(field, model, routes)
}

/// The value a record model contributes for a field
pub fn derive_from_model(
    field: StepField,
    model: &RecordModel,
    routes: &RouteTable,
) -> PathwayResult<Value> {
    let value = match field {
        StepField::TemplateUrl => Value::String(
            routes.reverse(FORM_TEMPLATE_VIEW, &[("model", model.api_name.as_str())])?,
        ),
        StepField::Title => Value::String(model.display_name.clone()),
        StepField::Icon => model
            .icon
            .as_ref()
            .map(|icon| Value::String(icon.clone()))
            .unwrap_or(Value::Null),
        StepField::ApiName => Value::String(model.api_name.clone()),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn diagnosis() -> RecordModel {
        RecordModel::new("diagnosis", "Diagnosis").with_icon("fa fa-stethoscope")
    }

    #[test]
    fn test_override_wins() {
        let mut overrides = Map::new();
        overrides.insert("title".to_string(), json!("Problems"));

        let value = resolve_field(
            StepField::Title,
            &overrides,
            Some(&diagnosis()),
            &RouteTable::new(),
        )
        .unwrap();
        assert_eq!(value, json!("Problems"));
    }

    #[test]
    fn test_falls_back_to_model() {
        let routes = RouteTable::new();
        let model = diagnosis();
        let empty = Map::new();

        assert_eq!(
            resolve_field(StepField::TemplateUrl, &empty, Some(&model), &routes).unwrap(),
            json!("/templates/forms/diagnosis.html")
        );
        assert_eq!(
            resolve_field(StepField::Icon, &empty, Some(&model), &routes).unwrap(),
            json!("fa fa-stethoscope")
        );
        assert_eq!(
            resolve_field(StepField::ApiName, &empty, Some(&model), &routes).unwrap(),
            json!("diagnosis")
        );
    }

    #[test]
    fn test_model_without_icon_gives_null() {
        let model = RecordModel::new("diagnosis", "Diagnosis");
        let value =
            resolve_field(StepField::Icon, &Map::new(), Some(&model), &RouteTable::new()).unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_missing_everything_is_an_error() {
        for field in StepField::ALL {
            let err = resolve_field(field, &Map::new(), None, &RouteTable::new()).unwrap_err();
            assert!(matches!(err, PathwayError::MissingField { field: f } if f == field));
        }
    }
}
