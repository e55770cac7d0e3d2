//! Route template parser.
//!
//! A single left-to-right scan splits the template into `/`-delimited segments
//! and each segment into alternating literal and `{parameter}` runs. Parameter
//! text is handed to [`parse_parameter`], whose inline-constraint scanner is an
//! explicit state machine that tracks parenthesis depth by hand, so constraint
//! arguments may contain `,`, `:`, `=` and nested parentheses.

use super::core::{
    ParameterKind, ParameterPolicyReference, RoutePatternParameterPart, RoutePatternPart,
    RoutePatternPathSegment,
};
use crate::error::RouteError;
use crate::values::RouteValue;

const INVALID_NAME_MESSAGE: &str = "Route parameter names must be non-empty and cannot contain these characters: '{', '}', '/'. The '?' character marks a parameter as optional, and can occur only at the end of the parameter. The '*' character marks a parameter as catch-all, and can occur only at the start of the parameter.";
const INCOMPLETE_PARAMETER: &str = "There is an incomplete parameter in the route template. Check that each '{' character has a matching '}' character.";
const CONSECUTIVE_SEPARATORS: &str = "The route template separator character '/' cannot appear consecutively. It must be separated by either a parameter or a literal value.";

/// Cursor over the template characters.
struct Cursor<'a> {
    template: &'a str,
    chars: Vec<char>,
    index: usize,
}

impl<'a> Cursor<'a> {
    fn new(template: &'a str, text: &str) -> Self {
        Self {
            template,
            chars: text.chars().collect(),
            index: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    fn at_end(&self) -> bool {
        self.index >= self.chars.len()
    }

    fn error(&self, message: impl Into<String>) -> RouteError {
        RouteError::template(self.template, message)
    }
}

/// Parse the text of a template (after prefix stripping) into path segments.
pub(crate) fn parse_segments(template: &str) -> Result<Vec<RoutePatternPathSegment>, RouteError> {
    let text = strip_prefix(template)?;
    let mut cursor = Cursor::new(template, text);
    let mut segments = Vec::new();

    while !cursor.at_end() {
        let segment = parse_segment(&mut cursor)?;
        segments.push(segment);

        match cursor.current() {
            None => break,
            Some('/') => {
                cursor.index += 1;
                if cursor.current() == Some('/') {
                    return Err(cursor.error(CONSECUTIVE_SEPARATORS));
                }
            }
            Some(_) => return Err(cursor.error(INCOMPLETE_PARAMETER)),
        }
    }

    validate_catch_all_position(template, &segments)?;
    Ok(segments)
}

fn strip_prefix(template: &str) -> Result<&str, RouteError> {
    if let Some(rest) = template.strip_prefix("~/") {
        return Ok(rest);
    }
    if template.starts_with('~') {
        return Err(RouteError::template(
            template,
            "The route template cannot start with a '~' character unless followed by a '/'.",
        ));
    }
    let rest = template.strip_prefix('/').unwrap_or(template);
    if rest.starts_with('/') {
        return Err(RouteError::template(
            template,
            CONSECUTIVE_SEPARATORS,
        ));
    }
    Ok(rest)
}

fn parse_segment(cursor: &mut Cursor<'_>) -> Result<RoutePatternPathSegment, RouteError> {
    let mut parts: Vec<RoutePatternPart> = Vec::new();

    loop {
        match cursor.current() {
            None | Some('/') => break,
            Some('{') if cursor.peek() != Some('{') => {
                let parameter = read_parameter_text(cursor)?;
                let part = parse_parameter(cursor.template, &parameter)?;
                parts.push(RoutePatternPart::Parameter(part));
            }
            Some('}') if cursor.peek() != Some('}') => {
                return Err(cursor.error(INCOMPLETE_PARAMETER));
            }
            Some(_) => {
                let literal = read_literal(cursor)?;
                parts.push(RoutePatternPart::Literal(literal));
            }
        }
    }

    if parts.is_empty() {
        return Err(cursor.error(CONSECUTIVE_SEPARATORS));
    }

    let segment = RoutePatternPathSegment { parts };
    validate_segment(cursor.template, segment)
}

/// Read a literal run, unescaping `{{` and `}}`.
fn read_literal(cursor: &mut Cursor<'_>) -> Result<String, RouteError> {
    let mut literal = String::new();
    loop {
        match cursor.current() {
            None | Some('/') => break,
            Some('{') => {
                if cursor.peek() == Some('{') {
                    literal.push('{');
                    cursor.index += 2;
                } else {
                    break;
                }
            }
            Some('}') => {
                if cursor.peek() == Some('}') {
                    literal.push('}');
                    cursor.index += 2;
                } else {
                    break;
                }
            }
            Some(c) => {
                literal.push(c);
                cursor.index += 1;
            }
        }
    }

    if literal.contains('?') {
        return Err(cursor.error(format!(
            "The literal section '{literal}' is invalid. Literal sections cannot contain the '?' character."
        )));
    }
    Ok(literal)
}

/// Read the text between `{` and the matching `}`, unescaping doubled braces.
fn read_parameter_text(cursor: &mut Cursor<'_>) -> Result<String, RouteError> {
    // Skip the opening brace.
    cursor.index += 1;
    let mut text = String::new();
    loop {
        match cursor.current() {
            None => return Err(cursor.error(INCOMPLETE_PARAMETER)),
            Some('}') => {
                if cursor.peek() == Some('}') {
                    text.push('}');
                    cursor.index += 2;
                } else {
                    cursor.index += 1;
                    return Ok(text);
                }
            }
            Some('{') => {
                if cursor.peek() == Some('{') {
                    text.push('{');
                    cursor.index += 2;
                } else {
                    return Err(cursor.error(INCOMPLETE_PARAMETER));
                }
            }
            Some(c) => {
                text.push(c);
                cursor.index += 1;
            }
        }
    }
}

/// States of the inline constraint scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstraintState {
    Start,
    ParsingName,
    InsideParenthesis,
    End,
}

/// Parse the text inside `{...}` into a parameter part.
///
/// Grammar: `['*' | '**'] name (':' constraint)* ['=' default] ['?']`.
pub(crate) fn parse_parameter(
    template: &str,
    text: &str,
) -> Result<RoutePatternParameterPart, RouteError> {
    let (kind, encode_slashes, body) = if let Some(rest) = text.strip_prefix("**") {
        (ParameterKind::CatchAll, false, rest)
    } else if let Some(rest) = text.strip_prefix('*') {
        (ParameterKind::CatchAll, true, rest)
    } else {
        (ParameterKind::Standard, true, text)
    };

    let (optional, body) = match body.strip_suffix('?') {
        Some(rest) => (true, rest),
        None => (false, body),
    };

    let chars: Vec<char> = body.chars().collect();
    let mut index = 0;

    let mut name = String::new();
    while index < chars.len() && chars[index] != ':' && chars[index] != '=' {
        name.push(chars[index]);
        index += 1;
    }
    validate_name(template, &name)?;

    let mut policies = Vec::new();
    while index < chars.len() && chars[index] == ':' {
        index += 1;
        let (constraint, next) = scan_constraint(template, &chars, index)?;
        if constraint.is_empty() {
            return Err(RouteError::template(
                template,
                format!("The inline constraint on route parameter '{name}' is empty."),
            ));
        }
        policies.push(ParameterPolicyReference::Content(constraint));
        index = next;
    }

    let mut default = None;
    if index < chars.len() && chars[index] == '=' {
        let value: String = chars[index + 1..].iter().collect();
        default = Some(RouteValue::String(value));
        index = chars.len();
    }

    if index != chars.len() {
        return Err(RouteError::template(
            template,
            format!("The route parameter name '{text}' is invalid. {INVALID_NAME_MESSAGE}"),
        ));
    }

    if optional && kind == ParameterKind::CatchAll {
        return Err(RouteError::template(
            template,
            "A catch-all parameter cannot be marked optional.",
        ));
    }
    if optional && default.is_some() {
        return Err(RouteError::OptionalWithDefault { parameter: name });
    }

    let mut part = RoutePatternParameterPart::new(
        name,
        if optional {
            ParameterKind::Optional
        } else {
            kind
        },
    );
    part.encode_slashes = encode_slashes;
    part.default = default;
    part.policies = policies;
    Ok(part)
}

/// Scan one inline constraint starting at `start` (just past its `:`).
///
/// Returns the constraint text and the index of the terminator (`:`, `=` or end).
/// A `)` closes the argument list only at depth one and only when followed by a
/// terminator; anywhere else it is argument text.
fn scan_constraint(
    template: &str,
    chars: &[char],
    start: usize,
) -> Result<(String, usize), RouteError> {
    let mut state = ConstraintState::Start;
    let mut depth = 0usize;
    let mut index = start;

    while state != ConstraintState::End {
        let current = chars.get(index).copied();
        state = match (state, current) {
            (ConstraintState::Start | ConstraintState::ParsingName, None) => ConstraintState::End,
            (ConstraintState::Start | ConstraintState::ParsingName, Some(':' | '=')) => {
                ConstraintState::End
            }
            (ConstraintState::Start | ConstraintState::ParsingName, Some('(')) => {
                depth = 1;
                index += 1;
                ConstraintState::InsideParenthesis
            }
            (ConstraintState::Start | ConstraintState::ParsingName, Some(_)) => {
                index += 1;
                ConstraintState::ParsingName
            }
            (ConstraintState::InsideParenthesis, None) => {
                let text: String = chars[start..].iter().collect();
                return Err(RouteError::template(
                    template,
                    format!("The inline constraint '{text}' has an unbalanced parenthesis."),
                ));
            }
            (ConstraintState::InsideParenthesis, Some('(')) => {
                depth += 1;
                index += 1;
                ConstraintState::InsideParenthesis
            }
            (ConstraintState::InsideParenthesis, Some(')')) => {
                index += 1;
                let closes = depth == 1
                    && matches!(chars.get(index), None | Some(':') | Some('='));
                if closes {
                    ConstraintState::End
                } else {
                    depth = depth.saturating_sub(1).max(1);
                    ConstraintState::InsideParenthesis
                }
            }
            (ConstraintState::InsideParenthesis, Some(_)) => {
                index += 1;
                ConstraintState::InsideParenthesis
            }
            (ConstraintState::End, _) => ConstraintState::End,
        };
    }

    let text: String = chars[start..index].iter().collect();
    Ok((text, index))
}

fn validate_name(template: &str, name: &str) -> Result<(), RouteError> {
    let invalid = name.is_empty()
        || name
            .chars()
            .any(|c| matches!(c, '{' | '}' | '/' | '?' | '*'));
    if invalid {
        return Err(RouteError::template(
            template,
            format!("The route parameter name '{name}' is invalid. {INVALID_NAME_MESSAGE}"),
        ));
    }
    Ok(())
}

/// Apply the per-segment rules and turn the `.` before a trailing optional
/// parameter into a separator part.
fn validate_segment(
    template: &str,
    mut segment: RoutePatternPathSegment,
) -> Result<RoutePatternPathSegment, RouteError> {
    let count = segment.parts.len();

    for window in segment.parts.windows(2) {
        if window[0].is_parameter() && window[1].is_parameter() {
            return Err(RouteError::template(
                template,
                "A path segment cannot contain two consecutive parameters. They must be separated by a '/' or by a literal string.",
            ));
        }
    }

    if count > 1 {
        if segment
            .parts
            .iter()
            .any(|p| p.as_parameter().is_some_and(|p| p.is_catch_all()))
        {
            return Err(RouteError::template(
                template,
                "A path segment that contains more than one section, such as a literal section or a parameter, cannot contain a catch-all parameter.",
            ));
        }

        let segment_text = segment.to_text();
        for i in 0..count {
            let Some(parameter) = segment.parts[i].as_parameter() else {
                continue;
            };
            if !parameter.is_optional() {
                continue;
            }
            if i + 1 < count {
                let following = match &segment.parts[i + 1] {
                    RoutePatternPart::Parameter(p) => p.name.clone(),
                    other => other.text().unwrap_or_default().to_string(),
                };
                return Err(RouteError::template(
                    template,
                    format!(
                        "An optional parameter must be at the end of the segment. In the segment '{segment_text}', optional parameter '{}' is followed by '{following}'.",
                        parameter.name
                    ),
                ));
            }
            if i > 0 {
                let preceding = segment.parts[i - 1].text().unwrap_or_default();
                if preceding != "." {
                    return Err(RouteError::template(
                        template,
                        format!(
                            "In the segment '{segment_text}', the optional parameter '{}' is preceded by an invalid segment '{preceding}'. Only a period (.) can precede an optional parameter.",
                            parameter.name
                        ),
                    ));
                }
                segment.parts[i - 1] = RoutePatternPart::Separator(".".to_string());
            }
        }
    }

    Ok(segment)
}

pub(crate) fn validate_catch_all_position(
    template: &str,
    segments: &[RoutePatternPathSegment],
) -> Result<(), RouteError> {
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.iter().enumerate() {
        let has_catch_all = segment
            .parts
            .iter()
            .any(|p| p.as_parameter().is_some_and(|p| p.is_catch_all()));
        if has_catch_all && i != last {
            return Err(RouteError::template(
                template,
                "A catch-all parameter can only appear as the last segment of the route template.",
            ));
        }
    }
    Ok(())
}
