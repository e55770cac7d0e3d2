//! Endpoint filters applied after a pattern and its constraints matched.

use super::core::RequestContext;
use crate::endpoint::{Endpoint, HeaderMatchMode, HeaderMetadata, HostMetadata, HttpMethodMetadata};
use http::Method;

const PREFLIGHT_REQUEST_METHOD: &str = "access-control-request-method";

/// A request-time filter over candidate endpoints.
pub trait MatcherPolicy: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    fn accepts(&self, endpoint: &Endpoint, context: &RequestContext) -> bool;
}

/// Filters on [`HttpMethodMetadata`].
///
/// A CORS preflight (`OPTIONS` with `Access-Control-Request-Method`) is
/// matched against the requested method when the endpoint accepts preflight,
/// and as a plain `OPTIONS` request otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpMethodPolicy;

impl MatcherPolicy for HttpMethodPolicy {
    fn name(&self) -> &'static str {
        "http_method"
    }

    fn accepts(&self, endpoint: &Endpoint, context: &RequestContext) -> bool {
        let Some(metadata) = endpoint.metadata().get::<HttpMethodMetadata>() else {
            return true;
        };
        if metadata.methods.is_empty() {
            return true;
        }
        let method = match preflight_method(context) {
            Some(requested) if metadata.accept_cors_preflight => requested,
            _ => context.method.clone(),
        };
        metadata.methods.iter().any(|m| *m == method)
    }
}

fn preflight_method(context: &RequestContext) -> Option<Method> {
    if context.method != Method::OPTIONS {
        return None;
    }
    context
        .headers
        .get(PREFLIGHT_REQUEST_METHOD)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Method::from_bytes(v.trim().as_bytes()).ok())
}

/// Filters on [`HostMetadata`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HostPolicy;

impl MatcherPolicy for HostPolicy {
    fn name(&self) -> &'static str {
        "host"
    }

    fn accepts(&self, endpoint: &Endpoint, context: &RequestContext) -> bool {
        let Some(metadata) = endpoint.metadata().get::<HostMetadata>() else {
            return true;
        };
        if metadata.hosts.is_empty() {
            return true;
        }
        let (host, port) = split_host_port(context.host.as_deref().unwrap_or_default());
        metadata
            .hosts
            .iter()
            .any(|pattern| host_matches(pattern, host, port))
    }
}

fn split_host_port(value: &str) -> (&str, Option<&str>) {
    // `[::1]:8080`
    if let Some(rest) = value.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            return (host, tail.strip_prefix(':'));
        }
    }
    match value.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => (host, Some(port)),
        _ => (value, None),
    }
}

/// `*`, `host`, `*.suffix`, each optionally followed by `:port` or `:*`.
pub(crate) fn host_matches(pattern: &str, host: &str, port: Option<&str>) -> bool {
    let (pattern_host, pattern_port) = split_host_port(pattern);
    let port_ok = match pattern_port {
        None | Some("*") => true,
        Some(expected) => port == Some(expected),
    };
    if !port_ok {
        return false;
    }
    if pattern_host == "*" {
        return true;
    }
    if host.is_empty() {
        return false;
    }
    match pattern_host.strip_prefix("*.") {
        // The wildcard needs at least one label: `*.example.com` does not
        // match `example.com`.
        Some(suffix) => {
            let Some(start) = host.len().checked_sub(suffix.len()) else {
                return false;
            };
            // A non-ASCII host can put `start` inside a character.
            start > 1
                && host.as_bytes().get(start - 1) == Some(&b'.')
                && host.get(start..).is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
        }
        None => host.eq_ignore_ascii_case(pattern_host),
    }
}

/// Filters on every [`HeaderMetadata`] of the endpoint; all must pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderPolicy;

impl MatcherPolicy for HeaderPolicy {
    fn name(&self) -> &'static str {
        "header"
    }

    fn accepts(&self, endpoint: &Endpoint, context: &RequestContext) -> bool {
        endpoint
            .metadata()
            .ordered::<HeaderMetadata>()
            .all(|metadata| header_matches(metadata, context))
    }
}

fn header_matches(metadata: &HeaderMetadata, context: &RequestContext) -> bool {
    let mut present = context
        .headers
        .get_all(metadata.name.as_str())
        .iter()
        .filter_map(|v| v.to_str().ok())
        .peekable();
    if present.peek().is_none() {
        return false;
    }
    if metadata.values.is_empty() {
        return true;
    }
    present.any(|actual| {
        metadata.values.iter().any(|expected| {
            let (actual, expected) = if metadata.case_sensitive {
                (actual.to_string(), expected.clone())
            } else {
                (actual.to_ascii_lowercase(), expected.to_ascii_lowercase())
            };
            match metadata.mode {
                HeaderMatchMode::Exact => actual == expected,
                HeaderMatchMode::Prefix => actual.starts_with(&expected),
            }
        })
    })
}
