//! Inbound matching of one pattern against a request path.

use crate::pattern::{RoutePattern, RoutePatternPart, RoutePatternPathSegment};
use crate::values::{RouteValue, RouteValueDictionary};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::sync::Arc;

/// Request path segments; most paths have no more than eight.
pub(crate) type PathSegments<'a> = SmallVec<[&'a str; 8]>;

/// Split a request path into segments.
///
/// The path is treated as starting with `/`; a single trailing `/` is
/// ignored; interior empty segments are kept.
pub(crate) fn split_path(path: &str) -> PathSegments<'_> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return PathSegments::new();
    }
    trimmed.split('/').collect()
}

/// Percent-decode a path fragment, keeping the raw text if the result is not UTF-8.
pub(crate) fn decode(text: &str) -> Cow<'_, str> {
    if !text.contains('%') {
        return Cow::Borrowed(text);
    }
    match urlencoding::decode(text) {
        Ok(decoded) => decoded,
        Err(_) => Cow::Borrowed(text),
    }
}

/// Matches request paths against a single [`RoutePattern`].
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    pattern: Arc<RoutePattern>,
}

impl TemplateMatcher {
    #[must_use]
    pub fn new(pattern: Arc<RoutePattern>) -> Self {
        Self { pattern }
    }

    #[must_use]
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Match `path` and, on success, write the captured values (plus every
    /// pattern default not captured) into `values`.
    ///
    /// On failure `values` is left untouched.
    pub fn try_match(&self, path: &str, values: &mut RouteValueDictionary) -> bool {
        let segments = split_path(path);
        self.try_match_segments(&segments, values)
    }

    pub(crate) fn try_match_segments(
        &self,
        path: &[&str],
        values: &mut RouteValueDictionary,
    ) -> bool {
        let pattern_segments = self.pattern.path_segments();

        if !self.structurally_matches(pattern_segments, path) {
            return false;
        }

        let mut captured = RouteValueDictionary::with_capacity(self.pattern.parameters().len());
        for (i, segment) in pattern_segments.iter().enumerate() {
            if let Some(parameter) = segment.simple_parameter() {
                if parameter.is_catch_all() {
                    let rest = if i < path.len() {
                        path[i..].join("/")
                    } else {
                        String::new()
                    };
                    if !rest.is_empty() {
                        captured.insert(parameter.name(), decode(&rest).into_owned());
                    } else if let Some(default) = parameter.default() {
                        captured.insert(parameter.name(), default.clone());
                    }
                    break;
                }
                match path.get(i) {
                    Some(value) => {
                        captured.insert(parameter.name(), decode(value).into_owned());
                    }
                    None => {
                        if let Some(default) = parameter.default() {
                            captured.insert(parameter.name(), default.clone());
                        }
                    }
                }
            } else if !segment.is_simple() {
                let Some(value) = path.get(i) else {
                    return false;
                };
                if !match_complex_segment(segment, value, &mut captured) {
                    return false;
                }
            }
        }

        for (key, default) in self.pattern.defaults() {
            captured.try_insert(key, default.clone());
        }
        for (key, value) in &captured {
            values.insert(key, value.clone());
        }
        true
    }

    /// Literal segments match, no required segment is missing and no extra
    /// segments remain.
    fn structurally_matches(
        &self,
        pattern_segments: &[RoutePatternPathSegment],
        path: &[&str],
    ) -> bool {
        for (i, segment) in pattern_segments.iter().enumerate() {
            let Some(value) = path.get(i) else {
                match segment.simple_parameter() {
                    Some(parameter) if parameter.can_be_absent() => continue,
                    _ => return false,
                }
            };

            if let Some(literal) = segment.simple_literal() {
                if !decode(value).eq_ignore_ascii_case(literal) {
                    return false;
                }
            } else if let Some(parameter) = segment.simple_parameter() {
                if parameter.is_catch_all() {
                    return true;
                }
                if value.is_empty() {
                    return false;
                }
            }
        }
        path.len() <= pattern_segments.len()
    }
}

/// Step back to the previous character boundary.
fn previous_boundary(text: &str, index: usize) -> usize {
    let mut i = index.saturating_sub(1);
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Match a segment made of several parts, e.g. `{name}.{ext?}`.
///
/// If the segment ends in `.{optional}` and the full match fails, it is
/// retried without the optional part, unless the request segment ends with
/// the separator itself.
fn match_complex_segment(
    segment: &RoutePatternPathSegment,
    request: &str,
    values: &mut RouteValueDictionary,
) -> bool {
    let parts = segment.parts();
    let last = parts.len() - 1;

    let trailing_optional = last > 0
        && parts[last].as_parameter().is_some_and(|p| p.is_optional())
        && matches!(parts[last - 1], RoutePatternPart::Separator(_));

    if !trailing_optional {
        return match_complex_segment_core(parts, request, values, last);
    }
    if match_complex_segment_core(parts, request, values, last) {
        return true;
    }
    let separator = parts[last - 1].text().unwrap_or_default();
    if request
        .to_ascii_lowercase()
        .ends_with(&separator.to_ascii_lowercase())
    {
        return false;
    }
    last >= 2 && match_complex_segment_core(parts, request, values, last - 2)
}

/// Right-to-left match: each literal is located with a case-insensitive
/// `rfind`, and the text between literals becomes the pending parameter's
/// value. Every parameter must capture at least one character.
fn match_complex_segment_core(
    parts: &[RoutePatternPart],
    request: &str,
    values: &mut RouteValueDictionary,
    last_used: usize,
) -> bool {
    // ASCII lowercasing keeps byte offsets aligned with `request`.
    let lowered = request.to_ascii_lowercase();
    let mut last_index = request.len();
    let mut pending: Option<&str> = None;
    let mut last_literal: Option<usize> = None;
    let mut captured: SmallVec<[(&str, &str); 4]> = SmallVec::new();

    let mut index = last_used as isize;
    while index >= 0 {
        let i = index as usize;
        let part = &parts[i];
        let mut new_last_index = last_index;

        match part {
            RoutePatternPart::Parameter(parameter) => pending = Some(parameter.name()),
            RoutePatternPart::Literal(text) | RoutePatternPart::Separator(text) => {
                let mut start = last_index;
                if pending.is_some() {
                    // Leave at least one character for the pending parameter.
                    start = previous_boundary(request, start);
                }
                if start == 0 {
                    return false;
                }
                let needle = text.to_ascii_lowercase();
                let Some(found) = lowered[..start].rfind(&needle) else {
                    return false;
                };
                if i == parts.len() - 1 && found + text.len() != request.len() {
                    return false;
                }
                last_literal = Some(text.len());
                new_last_index = found;
            }
        }

        if let Some(name) = pending {
            let is_literal = !part.is_parameter();
            if (last_literal.is_some() && is_literal) || i == 0 {
                let (start, length) = match last_literal {
                    None => (0, last_index),
                    Some(_) if i == 0 && part.is_parameter() => (0, last_index),
                    Some(literal_len) => {
                        let start = new_last_index + literal_len;
                        (start, last_index.saturating_sub(start))
                    }
                };
                let Some(value) = request.get(start..start + length) else {
                    return false;
                };
                if value.is_empty() {
                    return false;
                }
                captured.push((name, value));
                pending = None;
                last_literal = None;
            }
        }

        last_index = new_last_index;
        index -= 1;
    }

    if last_index == 0 || parts[0].is_parameter() {
        for (name, value) in captured {
            values.insert(name, RouteValue::String(decode(value).into_owned()));
        }
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::parse;

    fn matcher(template: &str) -> TemplateMatcher {
        TemplateMatcher::new(Arc::new(parse(template).unwrap()))
    }

    fn try_match(template: &str, path: &str) -> Option<RouteValueDictionary> {
        let mut values = RouteValueDictionary::new();
        matcher(template)
            .try_match(path, &mut values)
            .then_some(values)
    }

    #[test]
    fn test_split_path_normalisation() {
        assert!(split_path("/").is_empty());
        assert!(split_path("").is_empty());
        assert_eq!(split_path("/a/b/").as_slice(), &["a", "b"]);
        assert_eq!(split_path("a//b").as_slice(), &["a", "", "b"]);
    }

    #[test]
    fn test_literal_match_is_case_insensitive() {
        assert!(try_match("/api/Users", "/API/users").is_some());
        assert!(try_match("/api/users", "/api/user").is_none());
        assert!(try_match("/api", "/api/users").is_none());
    }

    #[test]
    fn test_root_pattern() {
        assert!(try_match("/", "/").is_some());
        assert!(try_match("", "").is_some());
        assert!(try_match("/", "/a").is_none());
    }

    #[test]
    fn test_parameters_and_defaults() {
        let values = try_match("/{controller=Home}/{action=Index}/{id?}", "/").unwrap();
        assert_eq!(values.get_str("controller").as_deref(), Some("Home"));
        assert_eq!(values.get_str("action").as_deref(), Some("Index"));
        assert!(!values.contains_key("id"));

        let values = try_match("/{controller=Home}/{action=Index}/{id?}", "/store/buy/7").unwrap();
        assert_eq!(values.get_str("controller").as_deref(), Some("store"));
        assert_eq!(values.get_str("id").as_deref(), Some("7"));
    }

    #[test]
    fn test_required_parameter_missing() {
        assert!(try_match("/users/{id}", "/users").is_none());
        assert!(try_match("/users/{id}", "/users//").is_none());
    }

    #[test]
    fn test_catch_all_binds_remainder() {
        let values = try_match("/files/{*rest}", "/files/a/b/c").unwrap();
        assert_eq!(values.get_str("rest").as_deref(), Some("a/b/c"));

        let values = try_match("/files/{*rest}", "/files").unwrap();
        assert!(!values.contains_key("rest"));

        let values = try_match("/files/{*rest=index}", "/files").unwrap();
        assert_eq!(values.get_str("rest").as_deref(), Some("index"));
    }

    #[test]
    fn test_values_are_percent_decoded() {
        let values = try_match("/search/{term}", "/search/hello%20world").unwrap();
        assert_eq!(values.get_str("term").as_deref(), Some("hello world"));

        let values = try_match("/files/{*rest}", "/files/a%2Fb/c").unwrap();
        assert_eq!(values.get_str("rest").as_deref(), Some("a/b/c"));
    }

    #[test]
    fn test_complex_segment() {
        let values = try_match("/{a}-{b}.xml", "/v1-v2.xml").unwrap();
        assert_eq!(values.get_str("a").as_deref(), Some("v1"));
        assert_eq!(values.get_str("b").as_deref(), Some("v2"));

        assert!(try_match("/{a}-{b}.xml", "/v1-.xml").is_none());
        assert!(try_match("/{a}-{b}.xml", "/v1-v2.json").is_none());
    }

    #[test]
    fn test_complex_segment_rightmost_literal() {
        // The first `.` found from the right is the one that splits.
        let values = try_match("/{name}.{ext}", "/archive.tar.gz").unwrap();
        assert_eq!(values.get_str("name").as_deref(), Some("archive.tar"));
        assert_eq!(values.get_str("ext").as_deref(), Some("gz"));
    }

    #[test]
    fn test_literal_prefix_must_cover_whole_segment() {
        assert!(try_match("/foo{id}", "/foo12").is_some());
        assert!(try_match("/foo{id}", "/xfoo12").is_none());
        assert!(try_match("/{id}foo", "/12foox").is_none());
    }

    #[test]
    fn test_optional_separator() {
        let values = try_match("/{name}.{ext?}", "/file.txt").unwrap();
        assert_eq!(values.get_str("name").as_deref(), Some("file"));
        assert_eq!(values.get_str("ext").as_deref(), Some("txt"));

        let values = try_match("/{name}.{ext?}", "/file").unwrap();
        assert_eq!(values.get_str("name").as_deref(), Some("file"));
        assert!(!values.contains_key("ext"));

        assert!(try_match("/{name}.{ext?}", "/file.").is_none());
    }

    #[test]
    fn test_failed_match_leaves_values_untouched() {
        let mut values = RouteValueDictionary::from([("keep", "me")]);
        assert!(!matcher("/{a}-{b}.xml").try_match("/x.json", &mut values));
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_non_parameter_defaults_are_copied() {
        let p = crate::pattern::parse_with(
            "/home",
            &RouteValueDictionary::from([("controller", "Home")]),
            &[],
            &RouteValueDictionary::new(),
        )
        .unwrap();
        let m = TemplateMatcher::new(Arc::new(p));
        let mut values = RouteValueDictionary::new();
        assert!(m.try_match("/home", &mut values));
        assert_eq!(values.get_str("controller").as_deref(), Some("Home"));
    }
}
