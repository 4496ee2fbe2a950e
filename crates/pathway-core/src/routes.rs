//! Named URL routes and reversal
//!
//! Pathways never hard-code URLs for the views they link to. They ask the
//! route table to reverse a named route with keyword parameters, the same
//! way the hosting web framework would.

use crate::error::{PathwayError, PathwayResult};

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Form template for a record model (`model`)
pub const FORM_TEMPLATE_VIEW: &str = "form_template_view";
/// Record display template for a record model (`model`)
pub const RECORD_VIEW: &str = "record_view";
/// Endpoint a pathway posts its payload to (`name`)
pub const PATHWAY_CREATE: &str = "pathway_create";

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex"))
}

fn param_value() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-z_\-]+$").expect("static regex"))
}

/// Whether a value can fill a route parameter
pub fn is_route_param(value: &str) -> bool {
    param_value().is_match(value)
}

/// Route name → path template with `{param}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: HashMap<String, String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        let mut routes = HashMap::new();
        routes.insert(
            FORM_TEMPLATE_VIEW.to_string(),
            "/templates/forms/{model}.html".to_string(),
        );
        routes.insert(
            RECORD_VIEW.to_string(),
            "/templates/record/{model}.html".to_string(),
        );
        routes.insert(PATHWAY_CREATE.to_string(), "/pathway/{name}/".to_string());
        Self { routes }
    }
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with no routes at all
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    pub fn with_route(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.set(name, template);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, template: impl Into<String>) {
        self.routes.insert(name.into(), template.into());
    }

    /// Apply overrides on top of the current routes
    pub fn extend(&mut self, overrides: &HashMap<String, String>) {
        for (name, template) in overrides {
            self.set(name.clone(), template.clone());
        }
    }

    pub fn template(&self, name: &str) -> Option<&str> {
        self.routes.get(name).map(|s| s.as_str())
    }

    /// Build the URL for a named route
    ///
    /// Every placeholder needs a parameter, every parameter needs a
    /// placeholder, and values must match `[0-9a-z_-]+`.
    pub fn reverse(&self, name: &str, params: &[(&str, &str)]) -> PathwayResult<String> {
        let template = self
            .template(name)
            .ok_or_else(|| PathwayError::UnknownRoute(name.to_string()))?;

        let no_match = |reason: String| PathwayError::NoReverseMatch {
            route: name.to_string(),
            reason,
        };

        let wanted: Vec<&str> = placeholder()
            .captures_iter(template)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();

        for (key, _) in params {
            if !wanted.contains(key) {
                return Err(no_match(format!("unexpected parameter '{}'", key)));
            }
        }

        let mut url = template.to_string();
        for key in wanted {
            let value = params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v)
                .ok_or_else(|| no_match(format!("missing parameter '{}'", key)))?;

            if !is_route_param(value) {
                return Err(no_match(format!(
                    "parameter '{}' has invalid value '{}'",
                    key, value
                )));
            }
            url = url.replace(&format!("{{{}}}", key), value);
        }

        Ok(url)
    }
}
