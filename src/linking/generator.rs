use super::address::{AddressScheme, AddressSchemeRegistry, EndpointName, RouteValuesAddress};
use super::index::LinkIndex;
use super::parser::LinkParser;
use crate::cache::DataSourceDependentCache;
use crate::constraints::ConstraintResolver;
use crate::data_source::EndpointDataSource;
use crate::endpoint::Endpoint;
use crate::error::RouteError;
use crate::runtime_config::{LinkOptions, ResolvedLinkOptions, RoutingOptions};
use crate::template::BoundUrl;
use crate::values::RouteValueDictionary;
use std::sync::Arc;
use tracing::debug;

/// Optional inputs to a link generation call.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkContext<'a> {
    /// Route values of the current request
    pub ambient_values: Option<&'a RouteValueDictionary>,
    /// Prefix for the generated path, e.g. an application mount point
    pub path_base: Option<&'a str>,
    /// Appended percent-encoded after `#`
    pub fragment: Option<&'a str>,
    pub options: Option<&'a LinkOptions>,
}

pub(crate) fn index_cache(
    data_source: Arc<dyn EndpointDataSource>,
    resolver: ConstraintResolver,
) -> Arc<DataSourceDependentCache<LinkIndex>> {
    Arc::new(DataSourceDependentCache::new(data_source, move |endpoints| {
        LinkIndex::build(endpoints, &resolver)
    }))
}

/// Generates paths and URIs from addresses and route values.
///
/// Generation that cannot be satisfied yields `Ok(None)`; errors are reserved
/// for configuration problems (duplicate names, unknown constraints) and
/// invalid arguments.
#[derive(Debug, Clone)]
pub struct LinkGenerator {
    index: Arc<DataSourceDependentCache<LinkIndex>>,
    schemes: AddressSchemeRegistry,
    options: RoutingOptions,
}

impl LinkGenerator {
    #[must_use]
    pub fn new(
        data_source: Arc<dyn EndpointDataSource>,
        resolver: ConstraintResolver,
        options: RoutingOptions,
    ) -> Self {
        Self {
            index: index_cache(data_source, resolver),
            schemes: AddressSchemeRegistry::with_defaults(),
            options,
        }
    }

    /// Register the scheme for a custom address type.
    pub fn register_scheme<A: 'static>(&self, scheme: Arc<dyn AddressScheme<A>>) {
        self.schemes.register(scheme);
    }

    /// A parser sharing this generator's index and address schemes.
    #[must_use]
    pub fn parser(&self) -> LinkParser {
        LinkParser::from_parts(Arc::clone(&self.index), self.schemes.clone())
    }

    /// The current link index, built on first use.
    ///
    /// # Errors
    ///
    /// [`RouteError::DuplicateEndpointName`] and data source errors.
    pub fn index(&self) -> Result<Arc<LinkIndex>, RouteError> {
        self.index.ensure_initialized()
    }

    /// Generate a path for the first endpoint `address` resolves to whose
    /// values, constraints and template all accept `values`.
    ///
    /// # Errors
    ///
    /// [`RouteError::NoAddressScheme`] for an unregistered address type, and
    /// configuration errors from building the index or an endpoint binder.
    pub fn get_path_by_address<A: 'static>(
        &self,
        address: &A,
        values: &RouteValueDictionary,
        context: &LinkContext<'_>,
    ) -> Result<Option<String>, RouteError> {
        let Some(url) = self.bind_address(address, values, context)? else {
            return Ok(None);
        };
        Ok(Some(render(None, context, &url)))
    }

    /// Like [`get_path_by_address`](Self::get_path_by_address) but returns
    /// `scheme://host/path`.
    ///
    /// # Errors
    ///
    /// [`RouteError::InvalidArgument`] when `scheme` or `host` is empty, plus
    /// the errors of `get_path_by_address`.
    pub fn get_uri_by_address<A: 'static>(
        &self,
        address: &A,
        values: &RouteValueDictionary,
        scheme: &str,
        host: &str,
        context: &LinkContext<'_>,
    ) -> Result<Option<String>, RouteError> {
        if scheme.is_empty() {
            return Err(RouteError::InvalidArgument {
                argument: "scheme",
                message: "a scheme is required to build an absolute URI".to_string(),
            });
        }
        if host.is_empty() {
            return Err(RouteError::InvalidArgument {
                argument: "host",
                message: "a host is required to build an absolute URI".to_string(),
            });
        }
        let Some(url) = self.bind_address(address, values, context)? else {
            return Ok(None);
        };
        Ok(Some(render(Some((scheme, host)), context, &url)))
    }

    /// Path for the endpoint named `name`.
    ///
    /// # Errors
    ///
    /// See [`get_path_by_address`](Self::get_path_by_address).
    pub fn get_path_by_name(
        &self,
        name: &str,
        values: &RouteValueDictionary,
    ) -> Result<Option<String>, RouteError> {
        self.get_path_by_address(&EndpointName::from(name), values, &LinkContext::default())
    }

    /// Path chosen by route values, optionally restricted to `route_name`.
    ///
    /// # Errors
    ///
    /// See [`get_path_by_address`](Self::get_path_by_address).
    pub fn get_path_by_route_values(
        &self,
        route_name: Option<&str>,
        values: &RouteValueDictionary,
        ambient: Option<&RouteValueDictionary>,
    ) -> Result<Option<String>, RouteError> {
        let address = RouteValuesAddress {
            route_name: route_name.map(str::to_string),
            explicit_values: values.clone(),
            ambient_values: ambient.cloned(),
        };
        let context = LinkContext {
            ambient_values: ambient,
            ..LinkContext::default()
        };
        self.get_path_by_address(&address, values, &context)
    }

    /// Path for a specific endpoint, whether or not it is link-eligible.
    ///
    /// # Errors
    ///
    /// Configuration errors from building the index or the endpoint binder.
    pub fn get_path_by_endpoint(
        &self,
        endpoint: &Arc<Endpoint>,
        values: &RouteValueDictionary,
        context: &LinkContext<'_>,
    ) -> Result<Option<String>, RouteError> {
        let index = self.index.ensure_initialized()?;
        let options = self.resolve_options(context);
        let url = bind_first(
            &index,
            std::slice::from_ref(endpoint),
            values,
            context.ambient_values,
            &options,
        )?;
        Ok(url.map(|url| render(None, context, &url)))
    }

    fn resolve_options(&self, context: &LinkContext<'_>) -> ResolvedLinkOptions {
        context
            .options
            .copied()
            .unwrap_or_default()
            .resolve(&self.options)
    }

    fn bind_address<A: 'static>(
        &self,
        address: &A,
        values: &RouteValueDictionary,
        context: &LinkContext<'_>,
    ) -> Result<Option<BoundUrl>, RouteError> {
        let scheme = self.schemes.get::<A>()?;
        let index = self.index.ensure_initialized()?;
        let endpoints = scheme.find_endpoints(&index, address);
        if endpoints.is_empty() {
            debug!(
                address_type = std::any::type_name::<A>(),
                "No endpoints found for link generation address"
            );
            return Ok(None);
        }
        let options = self.resolve_options(context);
        bind_first(&index, &endpoints, values, context.ambient_values, &options)
    }
}

/// Bind with each endpoint in turn; the first success wins.
fn bind_first(
    index: &LinkIndex,
    endpoints: &[Arc<Endpoint>],
    values: &RouteValueDictionary,
    ambient: Option<&RouteValueDictionary>,
    options: &ResolvedLinkOptions,
) -> Result<Option<BoundUrl>, RouteError> {
    for endpoint in endpoints {
        let Some(binder) = index.binder(endpoint)? else {
            continue;
        };
        let Some(result) = binder.get_values(ambient, values) else {
            debug!(
                endpoint = %endpoint.display_name(),
                "Link generation skipped endpoint: route values not satisfied"
            );
            continue;
        };
        if binder.try_process_constraints(&result.combined_values).is_err() {
            continue;
        }
        let Some(url) = binder.try_bind_values(&result.accepted_values, options) else {
            debug!(
                endpoint = %endpoint.display_name(),
                "Link generation skipped endpoint: template could not be bound"
            );
            continue;
        };
        debug!(
            endpoint = %endpoint.display_name(),
            path = %url.path,
            "Link generated"
        );
        return Ok(Some(url));
    }
    Ok(None)
}

/// Join the optional origin, path base, bound URL and fragment.
fn render(origin: Option<(&str, &str)>, context: &LinkContext<'_>, url: &BoundUrl) -> String {
    let mut out = String::new();
    if let Some((scheme, host)) = origin {
        out.push_str(scheme);
        out.push_str("://");
        out.push_str(host);
    }
    if let Some(base) = context.path_base {
        let base = base.trim_end_matches('/');
        if !base.is_empty() {
            if !base.starts_with('/') {
                out.push('/');
            }
            out.push_str(base);
        }
    }
    out.push_str(&url.path);
    out.push_str(&url.query);
    if let Some(fragment) = context.fragment.filter(|f| !f.is_empty()) {
        out.push('#');
        out.push_str(&urlencoding::encode(fragment));
    }
    out
}
