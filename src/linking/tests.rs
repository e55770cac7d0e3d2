use super::*;
use crate::constraints::ConstraintResolver;
use crate::data_source::{DefaultEndpointDataSource, DynamicEndpointDataSource};
use crate::endpoint::{
    Endpoint, EndpointNameMetadata, FallbackMetadata, RouteEndpointBuilder, RouteNameMetadata,
    SuppressLinkGenerationMetadata,
};
use crate::error::RouteError;
use crate::pattern;
use crate::runtime_config::{LinkOptions, RoutingOptions};
use crate::values::RouteValueDictionary;
use std::sync::Arc;

fn named(template: &str, name: &str) -> RouteEndpointBuilder {
    RouteEndpointBuilder::parse(template, 0)
        .unwrap()
        .with_metadata(RouteNameMetadata(name.to_string()))
}

fn conventional(
    template: &str,
    order: i32,
    required: RouteValueDictionary,
) -> RouteEndpointBuilder {
    let pattern =
        pattern::parse_with(template, &RouteValueDictionary::new(), &[], &required).unwrap();
    RouteEndpointBuilder::new(pattern, order)
}

fn generator(builders: Vec<RouteEndpointBuilder>) -> LinkGenerator {
    let source =
        DefaultEndpointDataSource::new(builders.into_iter().map(RouteEndpointBuilder::build));
    LinkGenerator::new(
        Arc::new(source),
        ConstraintResolver::default(),
        RoutingOptions::default(),
    )
}

fn home_and_user() -> LinkGenerator {
    generator(vec![named("/", "home"), named("/users/{id:int}", "user")])
}

#[test]
fn test_path_by_name() {
    let links = home_and_user();
    assert_eq!(
        links
            .get_path_by_name("user", &RouteValueDictionary::from([("id", 5)]))
            .unwrap()
            .as_deref(),
        Some("/users/5")
    );
    assert_eq!(
        links
            .get_path_by_name("home", &RouteValueDictionary::new())
            .unwrap()
            .as_deref(),
        Some("/")
    );
}

#[test]
fn test_constraint_failure_yields_none() {
    let links = home_and_user();
    let path = links
        .get_path_by_name("user", &RouteValueDictionary::from([("id", "abc")]))
        .unwrap();
    assert!(path.is_none());
}

#[test]
fn test_names_are_case_insensitive() {
    let links = home_and_user();
    let path = links
        .get_path_by_name("USER", &RouteValueDictionary::from([("id", 1)]))
        .unwrap();
    assert_eq!(path.as_deref(), Some("/users/1"));
    assert!(links
        .get_path_by_name("nobody", &RouteValueDictionary::new())
        .unwrap()
        .is_none());
}

#[test]
fn test_parse_path_by_endpoint_name() {
    let parser = home_and_user().parser();
    let values = parser
        .parse_path_by_endpoint_name("user", "/users/5")
        .unwrap()
        .unwrap();
    assert_eq!(values, RouteValueDictionary::from([("id", "5")]));
    assert!(parser
        .parse_path_by_endpoint_name("user", "/users/abc")
        .unwrap()
        .is_none());
    assert!(parser
        .parse_path_by_endpoint_name("home", "/users/5")
        .unwrap()
        .is_none());
}

#[test]
fn test_duplicate_names_fail_index_build() {
    let links = generator(vec![
        named("/a", "dup").display_name("first dup"),
        RouteEndpointBuilder::parse("/b", 0)
            .unwrap()
            .display_name("second dup")
            .with_metadata(EndpointNameMetadata("DUP".to_string())),
    ]);
    let err = links.index().unwrap_err();
    match &err {
        RouteError::DuplicateEndpointName { name, display_names } => {
            assert_eq!(name, "dup");
            assert_eq!(display_names, &vec!["first dup".to_string(), "second dup".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("first dup"));
    assert!(err.is_configuration_error());

    // Every call re-raises; the failure is not cached.
    assert!(links.get_path_by_name("dup", &RouteValueDictionary::new()).is_err());
}

#[test]
fn test_suppressed_and_anonymous_endpoints_are_not_indexed() {
    let links = generator(vec![
        named("/hidden", "hidden").with_metadata(SuppressLinkGenerationMetadata(true)),
        RouteEndpointBuilder::parse("/anonymous", 0).unwrap(),
        named("/visible", "visible"),
    ]);
    let index = links.index().unwrap();
    assert_eq!(index.endpoints().len(), 1);
    assert!(index.find_by_name("hidden").is_none());
}

#[test]
fn test_uri_with_path_base_query_and_fragment() {
    let links = home_and_user();
    let context = LinkContext {
        path_base: Some("/app/"),
        fragment: Some("top section"),
        ..LinkContext::default()
    };
    let uri = links
        .get_uri_by_address(
            &EndpointName::from("user"),
            &RouteValueDictionary::from([("id", "5"), ("q", "a b")]),
            "https",
            "example.com",
            &context,
        )
        .unwrap();
    assert_eq!(
        uri.as_deref(),
        Some("https://example.com/app/users/5?q=a%20b#top%20section")
    );
}

#[test]
fn test_uri_requires_scheme_and_host() {
    let links = home_and_user();
    let values = RouteValueDictionary::from([("id", 5)]);
    let address = EndpointName::from("user");
    let err = links
        .get_uri_by_address(&address, &values, "", "example.com", &LinkContext::default())
        .unwrap_err();
    assert!(matches!(err, RouteError::InvalidArgument { argument: "scheme", .. }));
    let err = links
        .get_uri_by_address(&address, &values, "https", "", &LinkContext::default())
        .unwrap_err();
    assert!(matches!(err, RouteError::InvalidArgument { argument: "host", .. }));
}

#[test]
fn test_link_options_override_globals() {
    let links = generator(vec![named("/Products/{name}", "product")]);
    let options = LinkOptions {
        lowercase_urls: Some(true),
        append_trailing_slash: Some(true),
        ..LinkOptions::default()
    };
    let context = LinkContext {
        options: Some(&options),
        ..LinkContext::default()
    };
    let path = links
        .get_path_by_address(
            &EndpointName::from("product"),
            &RouteValueDictionary::from([("name", "Widget")]),
            &context,
        )
        .unwrap();
    assert_eq!(path.as_deref(), Some("/products/widget/"));
}

#[test]
fn test_route_values_select_by_required_values() {
    let links = generator(vec![
        conventional(
            "/{controller}/{action}/{id?}",
            0,
            RouteValueDictionary::from([("controller", "Home"), ("action", "Index")]),
        ),
        conventional(
            "/{controller}/{action}/{id?}",
            0,
            RouteValueDictionary::from([("controller", "Store"), ("action", "Browse")]),
        ),
    ]);
    let path = links
        .get_path_by_route_values(
            None,
            &RouteValueDictionary::from([
                ("controller", "Store"),
                ("action", "Browse"),
                ("id", "3"),
            ]),
            None,
        )
        .unwrap();
    assert_eq!(path.as_deref(), Some("/Store/Browse/3"));

    let path = links
        .get_path_by_route_values(
            None,
            &RouteValueDictionary::from([("controller", "Store"), ("action", "Index")]),
            None,
        )
        .unwrap();
    assert!(path.is_none());
}

#[test]
fn test_route_values_use_ambient_controller() {
    let links = generator(vec![
        conventional(
            "/{controller}/{action}",
            0,
            RouteValueDictionary::from([("controller", "Store"), ("action", "Details")]),
        ),
        conventional(
            "/{controller}/{action}",
            0,
            RouteValueDictionary::from([("controller", "Home"), ("action", "Details")]),
        ),
    ]);
    let ambient = RouteValueDictionary::from([("controller", "Store"), ("action", "Browse")]);
    let path = links
        .get_path_by_route_values(
            None,
            &RouteValueDictionary::from([("action", "Details")]),
            Some(&ambient),
        )
        .unwrap();
    assert_eq!(path.as_deref(), Some("/Store/Details"));
}

#[test]
fn test_candidate_order_and_fallback() {
    let required = || RouteValueDictionary::from([("controller", "X")]);
    let links = generator(vec![
        conventional("/a/{controller}", 1, required()),
        conventional("/b/{controller}", 0, required()).with_metadata(FallbackMetadata),
        conventional("/c/{controller}", 0, required()),
    ]);
    let index = links.index().unwrap();
    let order: Vec<String> = index
        .find_by_values(&required(), None)
        .iter()
        .map(|e| e.pattern().unwrap().raw_text().to_string())
        .collect();
    assert_eq!(order, vec!["/c/{controller}", "/a/{controller}", "/b/{controller}"]);

    let path = links.get_path_by_route_values(None, &required(), None).unwrap();
    assert_eq!(path.as_deref(), Some("/c/X"));
}

#[test]
fn test_ambient_values_stop_at_first_difference() {
    let links = generator(vec![named("/shop/{category}/{item}", "product")]);
    let ambient = RouteValueDictionary::from([("category", "tools"), ("item", "hammer")]);
    let address = EndpointName::from("product");
    let context = LinkContext {
        ambient_values: Some(&ambient),
        ..LinkContext::default()
    };

    let path = links
        .get_path_by_address(&address, &RouteValueDictionary::from([("item", "saw")]), &context)
        .unwrap();
    assert_eq!(path.as_deref(), Some("/shop/tools/saw"));

    let path = links
        .get_path_by_address(
            &address,
            &RouteValueDictionary::from([("category", "garden")]),
            &context,
        )
        .unwrap();
    assert!(path.is_none());
}

struct ByHandler(&'static str);

struct ByHandlerScheme;

impl AddressScheme<ByHandler> for ByHandlerScheme {
    fn find_endpoints(&self, index: &LinkIndex, address: &ByHandler) -> Vec<Arc<Endpoint>> {
        index
            .endpoints()
            .iter()
            .filter(|e| e.handler_name() == Some(address.0))
            .cloned()
            .collect()
    }
}

#[test]
fn test_custom_address_scheme() {
    let links = generator(vec![
        named("/orders/{id}", "order").handler("orders::show"),
        named("/carts/{id}", "cart").handler("carts::show"),
    ]);
    let values = RouteValueDictionary::from([("id", 9)]);
    let err = links
        .get_path_by_address(&ByHandler("carts::show"), &values, &LinkContext::default())
        .unwrap_err();
    assert!(matches!(err, RouteError::NoAddressScheme { .. }));

    links.register_scheme::<ByHandler>(Arc::new(ByHandlerScheme));
    let path = links
        .get_path_by_address(&ByHandler("carts::show"), &values, &LinkContext::default())
        .unwrap();
    assert_eq!(path.as_deref(), Some("/carts/9"));
}

#[test]
fn test_path_by_endpoint_ignores_eligibility() {
    let endpoint = Arc::new(RouteEndpointBuilder::parse("/raw/{slug}", 0).unwrap().build());
    let links = generator(Vec::new());
    let path = links
        .get_path_by_endpoint(
            &endpoint,
            &RouteValueDictionary::from([("slug", "hello world")]),
            &LinkContext::default(),
        )
        .unwrap();
    assert_eq!(path.as_deref(), Some("/raw/hello%20world"));
}

#[test]
fn test_index_follows_dynamic_source() {
    let source = Arc::new(DynamicEndpointDataSource::new([named("/v1", "v").build()]));
    let links = LinkGenerator::new(
        source.clone(),
        ConstraintResolver::default(),
        RoutingOptions::default(),
    );
    let empty = RouteValueDictionary::new();
    assert_eq!(links.get_path_by_name("v", &empty).unwrap().as_deref(), Some("/v1"));

    source.set_endpoints([named("/v2", "v").build()]);
    assert_eq!(links.get_path_by_name("v", &empty).unwrap().as_deref(), Some("/v2"));
}

#[test]
fn test_route_name_reachable_when_endpoint_name_differs() {
    let links = generator(vec![named("/products/{id}", "product")
        .with_metadata(EndpointNameMetadata("products-show".to_string()))]);
    let values = RouteValueDictionary::from([("id", 4)]);

    let path = links.get_path_by_route_values(Some("PRODUCT"), &values, None).unwrap();
    assert_eq!(path.as_deref(), Some("/products/4"));
    assert_eq!(
        links.get_path_by_name("products-show", &values).unwrap().as_deref(),
        Some("/products/4")
    );
    // The endpoint name shadows the route name for name addresses.
    assert!(links.get_path_by_name("product", &values).unwrap().is_none());
    assert!(links
        .get_path_by_route_values(Some("products-show"), &values, None)
        .unwrap()
        .is_none());
}

#[test]
fn test_duplicate_route_names_behind_distinct_endpoint_names() {
    let links = generator(vec![
        named("/a", "shared")
            .display_name("alpha")
            .with_metadata(EndpointNameMetadata("a".to_string())),
        named("/b", "shared")
            .display_name("beta")
            .with_metadata(EndpointNameMetadata("b".to_string())),
    ]);
    match links.index().unwrap_err() {
        RouteError::DuplicateEndpointName { name, display_names } => {
            assert_eq!(name, "shared");
            assert_eq!(display_names, vec!["alpha".to_string(), "beta".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
