//! Route precedence.
//!
//! Each segment contributes one digit. Inbound digits form a decimal number
//! where lower sorts first; outbound digits form an integer where higher
//! sorts first.
//!
//! | Segment                | Inbound | Outbound |
//! |------------------------|---------|----------|
//! | literal                | 1       | 5        |
//! | complex (multi-part)   | 2       | 4        |
//! | constrained parameter  | 2       | 4        |
//! | parameter              | 3       | 3        |
//! | constrained catch-all  | 4       | 2        |
//! | catch-all              | 5       | 1        |

use super::core::{RoutePatternPart, RoutePatternPathSegment};

/// Inbound precedence: `/api/template` is 1.1, `/api/{id}` is 1.3,
/// `/api/{id:int}` is 1.2.
#[must_use]
pub fn compute_inbound(segments: &[RoutePatternPathSegment]) -> f64 {
    let mut precedence = 0.0;
    let mut scale = 1.0;
    for segment in segments {
        precedence += f64::from(inbound_digit(segment)) * scale;
        scale /= 10.0;
    }
    precedence
}

/// Outbound precedence: `/api/template` is 55, `/api/{id}` is 53.
#[must_use]
pub fn compute_outbound(segments: &[RoutePatternPathSegment]) -> u64 {
    segments.iter().fold(0u64, |acc, segment| {
        acc.saturating_mul(10)
            .saturating_add(u64::from(outbound_digit(segment)))
    })
}

fn inbound_digit(segment: &RoutePatternPathSegment) -> u8 {
    if segment.parts.len() > 1 {
        return 2;
    }
    match &segment.parts[0] {
        RoutePatternPart::Literal(_) | RoutePatternPart::Separator(_) => 1,
        RoutePatternPart::Parameter(p) => {
            let digit = if p.is_catch_all() { 5 } else { 3 };
            if p.policies.is_empty() {
                digit
            } else {
                digit - 1
            }
        }
    }
}

fn outbound_digit(segment: &RoutePatternPathSegment) -> u8 {
    if segment.parts.len() > 1 {
        return 4;
    }
    match &segment.parts[0] {
        RoutePatternPart::Literal(_) | RoutePatternPart::Separator(_) => 5,
        RoutePatternPart::Parameter(p) => {
            let digit = if p.is_catch_all() { 1 } else { 3 };
            if p.policies.is_empty() {
                digit
            } else {
                digit + 1
            }
        }
    }
}
