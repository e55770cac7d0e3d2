//! # Hot Reload Module
//!
//! Live reloading of a route manifest without restarting the host.
//!
//! ## Overview
//!
//! [`watch_manifest`] watches a manifest file and, when it changes:
//! - Reloads and validates the manifest
//! - Replaces the endpoints of a [`DynamicEndpointDataSource`]
//! - Calls a reload hook for application-specific updates
//!
//! Replacing the endpoints fires the source's change token, so every router
//! and link generator built on it rebuilds its cached state on its own.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use brrtrouting::data_source::DynamicEndpointDataSource;
//! use brrtrouting::hot_reload::watch_manifest;
//! use std::sync::Arc;
//!
//! let source = Arc::new(DynamicEndpointDataSource::new(initial_endpoints));
//! let router = Router::new(source.clone(), ConstraintResolver::default(), options);
//!
//! let watcher = watch_manifest("routes.toml", source, |manifest| {
//!     println!("Reloaded {} endpoints", manifest.endpoints.len());
//! })?;
//!
//! // Keep the watcher alive for as long as reloads are wanted.
//! ```
//!
//! ## Error Handling
//!
//! If the new manifest fails to load or one of its templates is invalid:
//! - The error is logged
//! - The previous endpoints remain active
//! - The watcher keeps running, so a later fix is picked up
//!
//! ## Performance
//!
//! A reload builds the new endpoint list before swapping it in; requests in
//! flight keep matching against the previous snapshot.

use crate::data_source::DynamicEndpointDataSource;
use crate::error::RouteError;
use crate::manifest::RouteManifest;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Load `path` and swap its endpoints into `source`.
///
/// # Errors
///
/// Manifest and template errors; `source` is left unchanged.
pub fn reload_manifest(
    path: &Path,
    source: &DynamicEndpointDataSource,
) -> Result<RouteManifest, RouteError> {
    let manifest = RouteManifest::load(path)?;
    let endpoints = manifest.build_endpoints()?;
    let count = endpoints.len();
    source.set_endpoints(endpoints);
    info!(
        manifest = %path.display(),
        endpoints_count = count,
        "hot-reload: applied route manifest"
    );
    Ok(manifest)
}

/// Watch a route manifest and replace the endpoints of `source` when it changes.
///
/// The callback receives each successfully applied manifest.
///
/// # Errors
///
/// Whatever `notify` reports while creating the watcher or watching `path`.
pub fn watch_manifest<P, F>(
    manifest_path: P,
    source: Arc<DynamicEndpointDataSource>,
    mut on_reload: F,
) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
    F: FnMut(&RouteManifest) + Send + 'static,
{
    let path: PathBuf = manifest_path.as_ref().to_path_buf();
    let watch_path = path.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    match reload_manifest(&watch_path, &source) {
                        Ok(manifest) => on_reload(&manifest),
                        Err(e) => warn!(
                            manifest = %watch_path.display(),
                            error = %e,
                            "hot-reload: manifest rejected, keeping previous endpoints"
                        ),
                    }
                }
            }
            Err(e) => error!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&path, RecursiveMode::NonRecursive)?;
    info!(manifest = %path.display(), "hot-reload: watching route manifest");
    Ok(watcher)
}
