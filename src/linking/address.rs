//! Address schemes: how an address value selects candidate endpoints.

use super::index::LinkIndex;
use crate::endpoint::Endpoint;
use crate::error::RouteError;
use crate::values::RouteValueDictionary;
use parking_lot::RwLock;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Finds the endpoints an address of type `A` refers to, in priority order.
pub trait AddressScheme<A>: Send + Sync {
    fn find_endpoints(&self, index: &LinkIndex, address: &A) -> Vec<Arc<Endpoint>>;
}

/// Address an endpoint by its name (endpoint name, else route name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointName(pub String);

impl From<&str> for EndpointName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Address endpoints by route values, optionally restricted to a route name.
///
/// `route_name` is looked up among [`RouteNameMetadata`] names only, so an
/// endpoint that also carries a different endpoint name stays reachable by
/// its route name.
///
/// [`RouteNameMetadata`]: crate::endpoint::RouteNameMetadata
#[derive(Debug, Clone, Default)]
pub struct RouteValuesAddress {
    pub route_name: Option<String>,
    pub explicit_values: RouteValueDictionary,
    pub ambient_values: Option<RouteValueDictionary>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointNameAddressScheme;

impl AddressScheme<EndpointName> for EndpointNameAddressScheme {
    fn find_endpoints(&self, index: &LinkIndex, address: &EndpointName) -> Vec<Arc<Endpoint>> {
        index.find_by_name(&address.0).cloned().into_iter().collect()
    }
}

/// A route name takes precedence; otherwise the required-values tree
/// narrows the candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteValuesAddressScheme;

impl AddressScheme<RouteValuesAddress> for RouteValuesAddressScheme {
    fn find_endpoints(
        &self,
        index: &LinkIndex,
        address: &RouteValuesAddress,
    ) -> Vec<Arc<Endpoint>> {
        match &address.route_name {
            Some(name) => index.find_by_route_name(name).cloned().into_iter().collect(),
            None => index.find_by_values(&address.explicit_values, address.ambient_values.as_ref()),
        }
    }
}

/// Address schemes keyed by address type.
#[derive(Clone, Default)]
pub struct AddressSchemeRegistry {
    schemes: Arc<RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>>,
}

impl AddressSchemeRegistry {
    /// A registry with the name and route-values schemes.
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::default();
        registry.register::<EndpointName>(Arc::new(EndpointNameAddressScheme));
        registry.register::<RouteValuesAddress>(Arc::new(RouteValuesAddressScheme));
        registry
    }

    /// Register (or replace) the scheme for address type `A`.
    pub fn register<A: 'static>(&self, scheme: Arc<dyn AddressScheme<A>>) {
        self.schemes.write().insert(TypeId::of::<A>(), Box::new(scheme));
    }

    /// The scheme for address type `A`.
    ///
    /// # Errors
    ///
    /// [`RouteError::NoAddressScheme`] when none is registered.
    pub fn get<A: 'static>(&self) -> Result<Arc<dyn AddressScheme<A>>, RouteError> {
        self.schemes
            .read()
            .get(&TypeId::of::<A>())
            .and_then(|scheme| scheme.downcast_ref::<Arc<dyn AddressScheme<A>>>())
            .cloned()
            .ok_or(RouteError::NoAddressScheme {
                address_type: type_name::<A>(),
            })
    }
}

impl std::fmt::Debug for AddressSchemeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressSchemeRegistry")
            .field("schemes", &self.schemes.read().len())
            .finish()
    }
}
