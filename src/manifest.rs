//! # Route Manifest
//!
//! Declarative endpoint definitions loaded with `serde`, used by the CLI and
//! by [`hot_reload`](crate::hot_reload). TOML is the default format; files
//! ending in `.json` are read as JSON with the same shape.
//!
//! ```toml
//! [routing]
//! lowercase_urls = true
//!
//! [[endpoints]]
//! template = "/users/{id}"
//! name = "user"
//! methods = ["GET"]
//! handler = "users::show"
//! constraints = { id = ["int", "min(1)"] }
//!
//! [[endpoints]]
//! template = "/{controller}/{action}/{id?}"
//! order = 10
//! required_values = { controller = "Home", action = "Index" }
//! ```

use crate::endpoint::{
    Endpoint, HostMetadata, HttpMethodMetadata, RouteEndpointBuilder, RouteNameMetadata,
};
use crate::error::RouteError;
use crate::pattern::{self, ParameterPolicyReference};
use crate::runtime_config::RoutingOptions;
use crate::values::{RouteValue, RouteValueDictionary};
use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One constraint or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstraintSpec {
    One(String),
    Many(Vec<String>),
}

impl ConstraintSpec {
    fn texts(&self) -> Vec<String> {
        match self {
            ConstraintSpec::One(text) => vec![text.clone()],
            ConstraintSpec::Many(texts) => texts.clone(),
        }
    }
}

/// A single endpoint definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub template: String,
    #[serde(default)]
    pub order: i32,
    /// Route name used for link generation
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub handler: Option<String>,
    /// HTTP methods; empty accepts any
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub cors_preflight: bool,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub defaults: BTreeMap<String, RouteValue>,
    #[serde(default)]
    pub constraints: BTreeMap<String, ConstraintSpec>,
    #[serde(default)]
    pub required_values: BTreeMap<String, RouteValue>,
}

impl EndpointSpec {
    /// Parse the template with the out-of-line parts and attach metadata.
    ///
    /// # Errors
    ///
    /// Template errors from [`pattern::parse_with`], and
    /// [`RouteError::Manifest`] for an invalid HTTP method.
    pub fn to_builder(&self) -> Result<RouteEndpointBuilder, RouteError> {
        let defaults: RouteValueDictionary = self.defaults.clone().into_iter().collect();
        let required: RouteValueDictionary = self.required_values.clone().into_iter().collect();
        let policies: Vec<(String, Vec<ParameterPolicyReference>)> = self
            .constraints
            .iter()
            .map(|(key, spec)| {
                let references = spec
                    .texts()
                    .into_iter()
                    .map(ParameterPolicyReference::Content)
                    .collect();
                (key.clone(), references)
            })
            .collect();
        let pattern = pattern::parse_with(&self.template, &defaults, &policies, &required)?;

        let mut builder = RouteEndpointBuilder::new(pattern, self.order);
        if let Some(display_name) = &self.display_name {
            builder = builder.display_name(display_name.as_str());
        }
        if let Some(handler) = &self.handler {
            builder = builder.handler(handler.as_str());
        }
        if let Some(name) = &self.name {
            builder.add_metadata(RouteNameMetadata(name.clone()));
        }
        if !self.methods.is_empty() || self.cors_preflight {
            let methods = self
                .methods
                .iter()
                .map(|m| {
                    Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes()).map_err(|e| {
                        RouteError::Manifest {
                            path: self.template.clone(),
                            message: format!("invalid HTTP method '{m}': {e}"),
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            builder.add_metadata(
                HttpMethodMetadata::new(methods).with_cors_preflight(self.cors_preflight),
            );
        }
        if !self.hosts.is_empty() {
            builder.add_metadata(HostMetadata::new(self.hosts.iter().cloned()));
        }
        Ok(builder)
    }
}

/// A parsed manifest file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteManifest {
    #[serde(default)]
    pub routing: RoutingOptions,
    #[serde(default)]
    pub endpoints: Vec<EndpointSpec>,
}

impl RouteManifest {
    /// # Errors
    ///
    /// [`RouteError::Manifest`] when `text` is not a valid manifest.
    pub fn from_toml_str(text: &str) -> Result<Self, RouteError> {
        toml::from_str(text).map_err(|e| manifest_error("<inline>", e))
    }

    /// # Errors
    ///
    /// [`RouteError::Manifest`] when `text` is not a valid manifest.
    pub fn from_json_str(text: &str) -> Result<Self, RouteError> {
        serde_json::from_str(text).map_err(|e| manifest_error("<inline>", e))
    }

    /// Read a manifest, choosing JSON for a `.json` extension and TOML
    /// otherwise.
    ///
    /// # Errors
    ///
    /// [`RouteError::Manifest`] when the file cannot be read or decoded.
    pub fn load(path: &Path) -> Result<Self, RouteError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| manifest_error(&display, e))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&text).map_err(|e| manifest_error(&display, e))
        } else {
            toml::from_str(&text).map_err(|e| manifest_error(&display, e))
        }
    }

    /// Build every endpoint, in manifest order.
    ///
    /// # Errors
    ///
    /// The first endpoint that fails [`EndpointSpec::to_builder`].
    pub fn build_endpoints(&self) -> Result<Vec<Endpoint>, RouteError> {
        self.endpoints
            .iter()
            .map(|spec| spec.to_builder().map(RouteEndpointBuilder::build))
            .collect()
    }
}

fn manifest_error(path: &str, error: impl std::fmt::Display) -> RouteError {
    RouteError::Manifest {
        path: path.to_string(),
        message: error.to_string(),
    }
}

/// Load `path` and build its endpoints.
///
/// # Errors
///
/// See [`RouteManifest::load`] and [`RouteManifest::build_endpoints`].
pub fn load_endpoints(path: &Path) -> Result<Vec<Endpoint>, RouteError> {
    RouteManifest::load(path)?.build_endpoints()
}
