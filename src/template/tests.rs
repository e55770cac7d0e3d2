use super::*;
use crate::constraints::{build_constraints, ConstraintResolver};
use crate::pattern;
use crate::runtime_config::ResolvedLinkOptions;
use crate::values::{RouteValue, RouteValueDictionary};
use std::sync::Arc;

fn binder(template: &str) -> TemplateBinder {
    let pattern = Arc::new(pattern::parse(template).unwrap());
    let constraints = build_constraints(&pattern, &ConstraintResolver::default()).unwrap();
    TemplateBinder::new(pattern, constraints)
}

fn bind(template: &str, values: &RouteValueDictionary) -> Option<String> {
    binder(template)
        .bind(None, values, &ResolvedLinkOptions::default())
        .map(|url| url.to_string())
}

fn matches(template: &str, path: &str) -> Option<RouteValueDictionary> {
    let matcher = TemplateMatcher::new(Arc::new(pattern::parse(template).unwrap()));
    let mut values = RouteValueDictionary::new();
    matcher.try_match(path, &mut values).then_some(values)
}

#[test]
fn test_bind_simple_parameters() {
    let values = RouteValueDictionary::from([("id", "42")]);
    assert_eq!(bind("/users/{id}", &values).as_deref(), Some("/users/42"));
}

#[test]
fn test_bind_missing_required_parameter_fails() {
    assert_eq!(bind("/users/{id}", &RouteValueDictionary::new()), None);
}

#[test]
fn test_bind_elides_trailing_defaults() {
    let template = "/{controller=Home}/{action=Index}/{id?}";
    let values = RouteValueDictionary::from([("controller", "Home"), ("action", "Index")]);
    assert_eq!(bind(template, &values).as_deref(), Some("/"));

    let values = RouteValueDictionary::from([("controller", "Home"), ("action", "About")]);
    assert_eq!(bind(template, &values).as_deref(), Some("/Home/About"));

    let values =
        RouteValueDictionary::from([("controller", "Home"), ("action", "Index"), ("id", "5")]);
    assert_eq!(bind(template, &values).as_deref(), Some("/Home/Index/5"));
}

#[test]
fn test_bind_extra_values_become_query_string() {
    let values = RouteValueDictionary::from([("id", "7"), ("page", "2"), ("q", "a b")]);
    assert_eq!(
        bind("/items/{id}", &values).as_deref(),
        Some("/items/7?page=2&q=a%20b")
    );

    let values =
        RouteValueDictionary::from([("id", RouteValue::from("7")), ("empty", RouteValue::Null)]);
    assert_eq!(bind("/items/{id}", &values).as_deref(), Some("/items/7"));
}

#[test]
fn test_bind_encodes_values() {
    let values = RouteValueDictionary::from([("name", "a/b c")]);
    assert_eq!(bind("/files/{name}", &values).as_deref(), Some("/files/a%2Fb%20c"));

    let values = RouteValueDictionary::from([("path", "docs/a b.md")]);
    assert_eq!(bind("/raw/{*path}", &values).as_deref(), Some("/raw/docs%2Fa%20b.md"));
    assert_eq!(bind("/raw/{**path}", &values).as_deref(), Some("/raw/docs/a%20b.md"));
}

#[test]
fn test_bind_complex_segment_is_all_or_none() {
    let values = RouteValueDictionary::from([("a", "x"), ("b", "y")]);
    assert_eq!(bind("/{a}-{b}.xml", &values).as_deref(), Some("/x-y.xml"));

    let values = RouteValueDictionary::from([("a", "x")]);
    assert_eq!(bind("/{a}-{b}.xml", &values), None);
}

#[test]
fn test_bind_optional_after_separator() {
    let values = RouteValueDictionary::from([("name", "file"), ("ext", "txt")]);
    assert_eq!(bind("/{name}.{ext?}", &values).as_deref(), Some("/file.txt"));

    let values = RouteValueDictionary::from([("name", "file")]);
    assert_eq!(bind("/{name}.{ext?}", &values).as_deref(), Some("/file"));
}

#[test]
fn test_bind_checks_constraints() {
    let ok = RouteValueDictionary::from([("id", "12")]);
    let bad = RouteValueDictionary::from([("id", "twelve")]);
    assert_eq!(bind("/orders/{id:int}", &ok).as_deref(), Some("/orders/12"));
    assert_eq!(bind("/orders/{id:int}", &bad), None);

    let b = binder("/orders/{id:int}");
    let rejected = b.try_process_constraints(&bad).unwrap_err();
    assert_eq!(rejected.parameter, "id");
}

#[test]
fn test_ambient_values_fill_gaps_until_a_change() {
    let b = binder("/{controller}/{action}/{id?}");
    let ambient =
        RouteValueDictionary::from([("controller", "Store"), ("action", "Browse"), ("id", "3")]);
    let options = ResolvedLinkOptions::default();

    // Same controller, new action: id is not carried over.
    let values = RouteValueDictionary::from([("action", "Details")]);
    let url = b.bind(Some(&ambient), &values, &options).unwrap();
    assert_eq!(url.to_string(), "/Store/Details");

    // Nothing explicit: every ambient value is reused.
    let url = b
        .bind(Some(&ambient), &RouteValueDictionary::new(), &options)
        .unwrap();
    assert_eq!(url.to_string(), "/Store/Browse/3");

    // A new controller invalidates everything after it.
    let values = RouteValueDictionary::from([("controller", "Cart")]);
    assert!(b.bind(Some(&ambient), &values, &options).is_none());
}

#[test]
fn test_get_values_combined_includes_ambient_extras() {
    let b = binder("/{id}");
    let ambient = RouteValueDictionary::from([("area", "admin"), ("id", "1")]);
    let values = RouteValueDictionary::from([("id", "2")]);
    let result = b.get_values(Some(&ambient), &values).unwrap();
    assert_eq!(result.accepted_values, RouteValueDictionary::from([("id", "2")]));
    assert_eq!(result.combined_values.get_str("area").as_deref(), Some("admin"));
}

#[test]
fn test_filter_defaults_must_agree() {
    let defaults = RouteValueDictionary::from([("area", "blog")]);
    let pattern = Arc::new(
        pattern::parse_with("/posts/{id}", &defaults, &[], &RouteValueDictionary::new()).unwrap(),
    );
    let b = TemplateBinder::new(pattern, Vec::new());
    let options = ResolvedLinkOptions::default();

    let values = RouteValueDictionary::from([("id", "1"), ("area", "blog")]);
    assert_eq!(b.bind(None, &values, &options).unwrap().to_string(), "/posts/1");

    let values = RouteValueDictionary::from([("id", "1"), ("area", "shop")]);
    assert!(b.bind(None, &values, &options).is_none());
}

#[test]
fn test_required_values_must_match() {
    let defaults = RouteValueDictionary::from([("controller", "Home"), ("action", "Index")]);
    let required = RouteValueDictionary::from([("controller", "Home"), ("action", "Index")]);
    let pattern = Arc::new(
        pattern::parse_with("/{controller}/{action}", &defaults, &[], &required).unwrap(),
    );
    let b = TemplateBinder::new(pattern, Vec::new());
    let options = ResolvedLinkOptions::default();

    let values = RouteValueDictionary::from([("controller", "Home"), ("action", "Index")]);
    assert_eq!(b.bind(None, &values, &options).unwrap().to_string(), "/");

    let values = RouteValueDictionary::from([("controller", "Home"), ("action", "About")]);
    assert!(b.bind(None, &values, &options).is_none());
}

#[test]
fn test_link_options_shape_output() {
    let b = binder("/Products/{name}");
    let values = RouteValueDictionary::from([("name", "Widget"), ("Sort", "Asc")]);

    let lower = ResolvedLinkOptions {
        lowercase_urls: true,
        ..ResolvedLinkOptions::default()
    };
    assert_eq!(
        b.bind(None, &values, &lower).unwrap().to_string(),
        "/products/widget?Sort=Asc"
    );

    let all = ResolvedLinkOptions {
        lowercase_urls: true,
        lowercase_query_strings: true,
        append_trailing_slash: true,
    };
    let url = b.bind(None, &values, &all).unwrap();
    assert_eq!(url.path, "/products/widget/");
    assert_eq!(url.query, "?sort=asc");
}

#[test]
fn test_round_trip_bind_then_match() {
    let cases: &[(&str, &[(&str, &str)])] = &[
        ("/users/{id:int}", &[("id", "17")]),
        ("/{a}-{b}.xml", &[("a", "left"), ("b", "right")]),
        ("/files/{name}.{ext?}", &[("name", "report"), ("ext", "pdf")]),
        ("/blog/{year}/{slug}", &[("year", "2024"), ("slug", "hello world")]),
        ("/raw/{**path}", &[("path", "a/b/c.txt")]),
    ];
    for (template, pairs) in cases {
        let values: RouteValueDictionary = pairs.iter().copied().collect();
        let url = bind(template, &values).unwrap_or_else(|| panic!("bind {template}"));
        let matched = matches(template, &url).unwrap_or_else(|| panic!("match {template} {url}"));
        for (key, value) in *pairs {
            assert_eq!(matched.get_str(key).as_deref(), Some(*value), "{template}");
        }
    }
}

#[test]
fn test_round_trip_with_elided_defaults() {
    let template = "/{controller=Home}/{action=Index}/{id?}";
    let values = RouteValueDictionary::from([("controller", "Home"), ("action", "Index")]);
    let url = bind(template, &values).unwrap();
    let matched = matches(template, &url).unwrap();
    assert_eq!(matched, values);
}
