//! # Runtime Configuration Module
//!
//! Routing options loaded from environment variables or from a `[routing]`
//! table in a TOML file.
//!
//! ## Environment Variables
//!
//! ### `BRRT_ROUTING_LOWERCASE_URLS`
//!
//! Lowercase the path of generated URLs. Accepts `1`/`true`/`yes`/`on`
//! (any case) and `0`/`false`/`no`/`off`. Default: `false`.
//!
//! ### `BRRT_ROUTING_LOWERCASE_QUERY`
//!
//! Also lowercase the query string of generated URLs. Only takes effect when
//! URLs are lowercased. Default: `false`.
//!
//! ### `BRRT_ROUTING_TRAILING_SLASH`
//!
//! Append a trailing `/` to generated paths. Default: `false`.
//!
//! ### `BRRT_ROUTING_SLOW_MATCH_US`
//!
//! Matching slower than this many microseconds is logged at `warn`.
//! Default: `1000`.
//!
//! ## Usage
//!
//! ```rust
//! use brrtrouting::runtime_config::RoutingOptions;
//!
//! let options = RoutingOptions::from_env();
//! println!("lowercase urls: {}", options.lowercase_urls);
//! ```
//!
//! ## Example Configuration
//!
//! ```toml
//! [routing]
//! lowercase_urls = true
//! append_trailing_slash = false
//! slow_match_threshold_us = 500
//! ```

use crate::error::RouteError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

const DEFAULT_SLOW_MATCH_US: u64 = 1000;

/// Global routing options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingOptions {
    /// Lowercase generated paths
    pub lowercase_urls: bool,
    /// Lowercase generated query strings (requires `lowercase_urls`)
    pub lowercase_query_strings: bool,
    /// Append `/` to generated paths
    pub append_trailing_slash: bool,
    /// Threshold for the slow-match warning, in microseconds
    pub slow_match_threshold_us: u64,
}

impl Default for RoutingOptions {
    fn default() -> Self {
        Self {
            lowercase_urls: false,
            lowercase_query_strings: false,
            append_trailing_slash: false,
            slow_match_threshold_us: DEFAULT_SLOW_MATCH_US,
        }
    }
}

#[derive(Deserialize)]
struct RoutingFile {
    #[serde(default)]
    routing: RoutingOptions,
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(val) => parse_flag(&val).unwrap_or(default),
        Err(_) => default,
    }
}

impl RoutingOptions {
    /// Load options from environment variables, falling back to defaults for
    /// unset or unparseable values.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let slow_match_threshold_us = match env::var("BRRT_ROUTING_SLOW_MATCH_US") {
            Ok(val) => val.trim().parse().unwrap_or(DEFAULT_SLOW_MATCH_US),
            Err(_) => DEFAULT_SLOW_MATCH_US,
        };
        RoutingOptions {
            lowercase_urls: env_flag("BRRT_ROUTING_LOWERCASE_URLS", defaults.lowercase_urls),
            lowercase_query_strings: env_flag(
                "BRRT_ROUTING_LOWERCASE_QUERY",
                defaults.lowercase_query_strings,
            ),
            append_trailing_slash: env_flag(
                "BRRT_ROUTING_TRAILING_SLASH",
                defaults.append_trailing_slash,
            ),
            slow_match_threshold_us,
        }
    }

    /// Parse the `[routing]` table of a TOML document. A missing table yields defaults.
    ///
    /// # Errors
    ///
    /// [`RouteError::Manifest`] when the document is not valid TOML or the
    /// table has the wrong shape.
    pub fn from_toml_str(text: &str) -> Result<Self, RouteError> {
        toml::from_str::<RoutingFile>(text)
            .map(|file| file.routing)
            .map_err(|e| RouteError::Manifest {
                path: "<inline>".to_string(),
                message: e.to_string(),
            })
    }

    /// Read the `[routing]` table from a TOML file.
    ///
    /// # Errors
    ///
    /// [`RouteError::Manifest`] when the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> Result<Self, RouteError> {
        let text = std::fs::read_to_string(path).map_err(|e| RouteError::Manifest {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text).map_err(|e| match e {
            RouteError::Manifest { message, .. } => RouteError::Manifest {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }
}

/// Per-call overrides for link generation. `None` falls back to [`RoutingOptions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOptions {
    pub lowercase_urls: Option<bool>,
    pub lowercase_query_strings: Option<bool>,
    pub append_trailing_slash: Option<bool>,
}

impl LinkOptions {
    /// Merge with the global options.
    #[must_use]
    pub fn resolve(&self, global: &RoutingOptions) -> ResolvedLinkOptions {
        ResolvedLinkOptions {
            lowercase_urls: self.lowercase_urls.unwrap_or(global.lowercase_urls),
            lowercase_query_strings: self
                .lowercase_query_strings
                .unwrap_or(global.lowercase_query_strings),
            append_trailing_slash: self
                .append_trailing_slash
                .unwrap_or(global.append_trailing_slash),
        }
    }
}

/// Link options after merging per-call overrides with the global defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedLinkOptions {
    pub lowercase_urls: bool,
    pub lowercase_query_strings: bool,
    pub append_trailing_slash: bool,
}
