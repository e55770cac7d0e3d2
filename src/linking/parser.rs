use super::address::{AddressSchemeRegistry, EndpointName};
use super::generator::index_cache;
use super::index::LinkIndex;
use crate::cache::DataSourceDependentCache;
use crate::constraints::{ConstraintResolver, RouteConstraintMatcher, RouteDirection};
use crate::data_source::EndpointDataSource;
use crate::error::RouteError;
use crate::values::RouteValueDictionary;
use std::sync::Arc;
use tracing::debug;

/// Parses paths back into route values for the endpoints an address selects.
#[derive(Debug, Clone)]
pub struct LinkParser {
    index: Arc<DataSourceDependentCache<LinkIndex>>,
    schemes: AddressSchemeRegistry,
}

impl LinkParser {
    #[must_use]
    pub fn new(data_source: Arc<dyn EndpointDataSource>, resolver: ConstraintResolver) -> Self {
        Self::from_parts(
            index_cache(data_source, resolver),
            AddressSchemeRegistry::with_defaults(),
        )
    }

    pub(crate) fn from_parts(
        index: Arc<DataSourceDependentCache<LinkIndex>>,
        schemes: AddressSchemeRegistry,
    ) -> Self {
        Self { index, schemes }
    }

    /// Match `path` against each endpoint `address` selects, in order, and
    /// return the values of the first match that also passes its constraints.
    ///
    /// # Errors
    ///
    /// [`RouteError::NoAddressScheme`] for an unregistered address type, and
    /// configuration errors from building the index.
    pub fn parse_path_by_address<A: 'static>(
        &self,
        address: &A,
        path: &str,
    ) -> Result<Option<RouteValueDictionary>, RouteError> {
        let scheme = self.schemes.get::<A>()?;
        let index = self.index.ensure_initialized()?;
        for endpoint in scheme.find_endpoints(&index, address) {
            let Some(entry) = index.parser(&endpoint)? else {
                continue;
            };
            let mut values = RouteValueDictionary::new();
            if !entry.matcher.try_match(path, &mut values) {
                continue;
            }
            if !RouteConstraintMatcher::matches(
                &entry.constraints,
                &values,
                RouteDirection::IncomingRequest,
            ) {
                continue;
            }
            debug!(
                endpoint = %endpoint.display_name(),
                path = %path,
                "Path parsed into route values"
            );
            return Ok(Some(values));
        }
        Ok(None)
    }

    /// [`parse_path_by_address`](Self::parse_path_by_address) for an endpoint name.
    ///
    /// # Errors
    ///
    /// Configuration errors from building the index.
    pub fn parse_path_by_endpoint_name(
        &self,
        name: &str,
        path: &str,
    ) -> Result<Option<RouteValueDictionary>, RouteError> {
        self.parse_path_by_address(&EndpointName::from(name), path)
    }
}
