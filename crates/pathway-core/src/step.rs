// Pathways Core - Steps
//
// A step is one form of a pathway. It either wraps a record model, in which
// case its UI metadata is derived from the model, or it is a plain bag of
// keyword data. Explicit keywords always win over derived values.

use crate::error::{PathwayError, PathwayResult};
use crate::field::{resolve_field, StepField};
use crate::model::RecordModel;
use crate::records::{SavePayload, User};
use crate::routes::{RouteTable, FORM_TEMPLATE_VIEW, RECORD_VIEW};

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Default template for multi-save steps
pub const MULTI_SAVE_TEMPLATE: &str = "/templates/pathway/multi_save.html";
/// Default front-end controller for multi-save steps
pub const MULTI_SAVE_CONTROLLER: &str = "MultiSaveCtrl";

/// Anything a pathway can hold as a step
///
/// Implement this for steps that need custom serialization or that must
/// adjust the payload before it is saved.
pub trait PathwayStep: Send + Sync + fmt::Debug {
    /// Dictionary sent to the front end for this step
    fn to_dict(&self, routes: &RouteTable) -> PathwayResult<Map<String, Value>>;

    /// Hook run before the pathway saves; may rewrite the payload
    fn pre_save(&self, _data: &mut SavePayload, _user: &User) -> PathwayResult<()> {
        Ok(())
    }

    /// Configuration check run when the owning pathway is registered
    fn validate(&self) -> PathwayResult<()> {
        Ok(())
    }

    /// Record model this step edits, if any
    fn model(&self) -> Option<&RecordModel> {
        None
    }
}

/// A form step: an optional record model plus keyword overrides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Step {
    model: Option<RecordModel>,
    overrides: Map<String, Value>,
}

impl Step {
    /// A model-less step; it needs at least `template_url` and `title` overrides
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_model(model: RecordModel) -> Self {
        Self {
            model: Some(model),
            overrides: Map::new(),
        }
    }

    /// Set a keyword override
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    pub fn with_overrides(mut self, overrides: Map<String, Value>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    pub fn overrides(&self) -> &Map<String, Value> {
        &self.overrides
    }

    pub fn field(&self, field: StepField, routes: &RouteTable) -> PathwayResult<Value> {
        resolve_field(field, &self.overrides, self.model.as_ref(), routes)
    }

    pub fn template_url(&self, routes: &RouteTable) -> PathwayResult<Value> {
        self.field(StepField::TemplateUrl, routes)
    }

    pub fn title(&self, routes: &RouteTable) -> PathwayResult<Value> {
        self.field(StepField::Title, routes)
    }

    pub fn icon(&self, routes: &RouteTable) -> PathwayResult<Value> {
        self.field(StepField::Icon, routes)
    }

    pub fn api_name(&self, routes: &RouteTable) -> PathwayResult<Value> {
        self.field(StepField::ApiName, routes)
    }
}

impl PathwayStep for Step {
    fn to_dict(&self, routes: &RouteTable) -> PathwayResult<Map<String, Value>> {
        let mut result = Map::new();

        if self.model.is_some() {
            for field in StepField::ALL {
                result.insert(field.key().to_string(), self.field(field, routes)?);
            }
        }

        result.extend(self.overrides.clone());
        Ok(result)
    }

    fn validate(&self) -> PathwayResult<()> {
        match &self.model {
            Some(model) => model.validate().map_err(PathwayError::Config)?,
            None => {
                for field in [StepField::TemplateUrl, StepField::Title] {
                    if !self.overrides.contains_key(field.key()) {
                        return Err(PathwayError::MissingField { field });
                    }
                }
            }
        }
        Ok(())
    }

    fn model(&self) -> Option<&RecordModel> {
        self.model.as_ref()
    }
}

/// Step editing several records of one model at once
#[derive(Debug, Clone, PartialEq)]
pub struct MultiSaveStep {
    step: Step,
}

impl MultiSaveStep {
    pub fn new(model: RecordModel) -> Self {
        Self {
            step: Step::for_model(model),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.step = self.step.with(key, value);
        self
    }

    pub fn with_overrides(mut self, overrides: Map<String, Value>) -> Self {
        self.step = self.step.with_overrides(overrides);
        self
    }
}

impl PathwayStep for MultiSaveStep {
    fn to_dict(&self, routes: &RouteTable) -> PathwayResult<Map<String, Value>> {
        let mut result = self.step.to_dict(routes)?;
        let overrides = self.step.overrides();

        if !overrides.contains_key("template_url") {
            result.insert("template_url".to_string(), MULTI_SAVE_TEMPLATE.into());
        }
        if !overrides.contains_key("controller_class") {
            result.insert("controller_class".to_string(), MULTI_SAVE_CONTROLLER.into());
        }

        let model = self
            .step
            .model
            .as_ref()
            .ok_or_else(|| PathwayError::config("multi-save steps need a model"))?;
        let params = [("model", model.api_name.as_str())];
        result.insert(
            "model_form_url".to_string(),
            routes.reverse(FORM_TEMPLATE_VIEW, &params)?.into(),
        );
        result.insert(
            "record_url".to_string(),
            routes.reverse(RECORD_VIEW, &params)?.into(),
        );
        Ok(result)
    }

    fn validate(&self) -> PathwayResult<()> {
        if self.step.model.is_none() {
            return Err(PathwayError::config("multi-save steps need a model"));
        }
        self.step.validate()
    }

    fn model(&self) -> Option<&RecordModel> {
        self.step.model.as_ref()
    }
}

/// One entry in a pathway's step list: a bare model or a full step
#[derive(Debug, Clone)]
pub enum StepEntry {
    Model(RecordModel),
    Step(Arc<dyn PathwayStep>),
}

impl StepEntry {
    pub fn step(step: impl PathwayStep + 'static) -> Self {
        Self::Step(Arc::new(step))
    }

    /// The entry as a step; bare models are wrapped in a plain [`Step`]
    pub fn as_step(&self) -> Arc<dyn PathwayStep> {
        match self {
            Self::Model(model) => Arc::new(Step::for_model(model.clone())),
            Self::Step(step) => Arc::clone(step),
        }
    }
}

impl From<RecordModel> for StepEntry {
    fn from(model: RecordModel) -> Self {
        Self::Model(model)
    }
}

impl From<Step> for StepEntry {
    fn from(step: Step) -> Self {
        Self::step(step)
    }
}

impl From<MultiSaveStep> for StepEntry {
    fn from(step: MultiSaveStep) -> Self {
        Self::step(step)
    }
}
