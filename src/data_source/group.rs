use super::{regroup, EndpointDataSource, EndpointList, RouteGroupContext};
use crate::change_token::{ChangeToken, ChangeTokenSource, CompositeChangeToken};
use crate::endpoint::{Convention, Endpoint, RouteEndpointBuilder};
use crate::error::RouteError;
use crate::pattern::{self, RoutePattern};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A route prefix plus conventions applied to every endpoint mapped under it.
///
/// Endpoints are re-derived on every read, so they always reflect the current
/// children. Conventions can only be added before the first read; after that
/// [`add_convention`](Self::add_convention) fails with
/// [`RouteError::ConventionsFrozen`].
pub struct RouteGroupBuilder {
    prefix: RoutePattern,
    entries: RwLock<Vec<Arc<Endpoint>>>,
    sources: RwLock<Vec<Arc<dyn EndpointDataSource>>>,
    conventions: RwLock<Vec<Convention>>,
    finally_conventions: RwLock<Vec<Convention>>,
    frozen: AtomicBool,
    token: Mutex<ChangeTokenSource>,
}

impl RouteGroupBuilder {
    /// Start a group for `prefix`.
    ///
    /// # Errors
    ///
    /// Any parse error for `prefix`.
    pub fn new(prefix: &str) -> Result<Self, RouteError> {
        Ok(Self::with_pattern(pattern::parse(prefix)?))
    }

    #[must_use]
    pub fn with_pattern(prefix: RoutePattern) -> Self {
        Self {
            prefix,
            entries: RwLock::new(Vec::new()),
            sources: RwLock::new(Vec::new()),
            conventions: RwLock::new(Vec::new()),
            finally_conventions: RwLock::new(Vec::new()),
            frozen: AtomicBool::new(false),
            token: Mutex::new(ChangeTokenSource::new()),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &RoutePattern {
        &self.prefix
    }

    /// Map an endpoint under this group.
    pub fn map(&self, builder: RouteEndpointBuilder) {
        self.entries.write().push(Arc::new(builder.build()));
        self.notify();
    }

    /// Nest another data source (often another group) under this group.
    pub fn add_data_source(&self, source: Arc<dyn EndpointDataSource>) {
        self.sources.write().push(source);
        self.notify();
    }

    /// Create a nested group and return it for mapping.
    ///
    /// # Errors
    ///
    /// Any parse error for `prefix`.
    pub fn group(&self, prefix: &str) -> Result<Arc<RouteGroupBuilder>, RouteError> {
        let child = Arc::new(RouteGroupBuilder::new(prefix)?);
        self.add_data_source(Arc::clone(&child) as Arc<dyn EndpointDataSource>);
        Ok(child)
    }

    /// Add a convention that runs before each endpoint's own metadata.
    ///
    /// # Errors
    ///
    /// [`RouteError::ConventionsFrozen`] once endpoints have been read.
    pub fn add_convention(&self, convention: Convention) -> Result<(), RouteError> {
        self.check_not_frozen()?;
        self.conventions.write().push(convention);
        Ok(())
    }

    /// Add a convention that runs after each endpoint's own metadata.
    ///
    /// # Errors
    ///
    /// [`RouteError::ConventionsFrozen`] once endpoints have been read.
    pub fn add_finally_convention(&self, convention: Convention) -> Result<(), RouteError> {
        self.check_not_frozen()?;
        self.finally_conventions.write().push(convention);
        Ok(())
    }

    fn check_not_frozen(&self) -> Result<(), RouteError> {
        if self.frozen.load(Ordering::Acquire) {
            return Err(RouteError::ConventionsFrozen {
                prefix: self.prefix.raw_text().to_string(),
            });
        }
        Ok(())
    }

    fn notify(&self) {
        let previous = std::mem::take(&mut *self.token.lock());
        previous.fire();
    }

    /// Context for children: the enclosing context (if any) combined with
    /// this group's prefix and conventions.
    fn child_context(
        &self,
        outer: Option<&RouteGroupContext>,
    ) -> Result<RouteGroupContext, RouteError> {
        self.frozen.store(true, Ordering::Release);
        let own_conventions = self.conventions.read();
        let own_finally = self.finally_conventions.read();
        Ok(match outer {
            None => RouteGroupContext {
                prefix: self.prefix.clone(),
                conventions: own_conventions.clone(),
                finally_conventions: own_finally.clone(),
            },
            Some(outer) => RouteGroupContext {
                prefix: pattern::combine(Some(&outer.prefix), &self.prefix)?,
                conventions: outer
                    .conventions
                    .iter()
                    .chain(own_conventions.iter())
                    .cloned()
                    .collect(),
                finally_conventions: own_finally
                    .iter()
                    .chain(outer.finally_conventions.iter())
                    .cloned()
                    .collect(),
            },
        })
    }

    fn derive(&self, outer: Option<&RouteGroupContext>) -> Result<Vec<Arc<Endpoint>>, RouteError> {
        let context = self.child_context(outer)?;
        let mut endpoints = Vec::new();
        for entry in self.entries.read().iter() {
            endpoints.push(Arc::new(regroup(entry, &context)?));
        }
        for source in self.sources.read().iter() {
            endpoints.extend(source.grouped_endpoints(&context)?);
        }
        Ok(endpoints)
    }
}

impl std::fmt::Debug for RouteGroupBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteGroupBuilder")
            .field("prefix", &self.prefix.raw_text())
            .field("entries", &self.entries.read().len())
            .field("sources", &self.sources.read().len())
            .finish()
    }
}

impl EndpointDataSource for RouteGroupBuilder {
    fn endpoints(&self) -> Result<EndpointList, RouteError> {
        self.derive(None).map(Arc::new)
    }

    fn change_token(&self) -> Arc<dyn ChangeToken> {
        let mut tokens = vec![self.token.lock().token()];
        tokens.extend(self.sources.read().iter().map(|s| s.change_token()));
        Arc::new(CompositeChangeToken::new(tokens))
    }

    fn grouped_endpoints(
        &self,
        context: &RouteGroupContext,
    ) -> Result<Vec<Arc<Endpoint>>, RouteError> {
        self.derive(Some(context))
    }
}
