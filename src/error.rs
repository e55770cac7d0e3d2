//! # Routing Errors
//!
//! Configuration and programming errors raised by the routing engine.
//!
//! Match and link-generation *failures* are not errors: a path that matches no
//! endpoint, or a set of values that cannot produce a link, is reported in band
//! as `Ok(None)` / `false`. Everything in [`RouteError`] is fatal and is expected
//! to surface to the application developer, usually at startup or on the first
//! request that forces the routing tables to be built.

use thiserror::Error;

/// Errors raised while building or configuring routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The route template could not be parsed.
    #[error("An error occurred while creating the route with template '{template}': {message}")]
    Template {
        /// The offending template text
        template: String,
        /// What was wrong with it
        message: String,
    },

    /// Two parameters in one pattern share a name (compared case-insensitively).
    #[error("The route parameter name '{name}' appears more than one time in the route template '{template}'.")]
    DuplicateParameter { template: String, name: String },

    /// An inline constraint references a key that is not in the constraint map.
    #[error("The constraint reference '{constraint}' on parameter '{parameter}' could not be resolved. Register the constraint key in the constraint map.")]
    UnknownConstraint { parameter: String, constraint: String },

    /// More than one constraint constructor is equally suitable for the arguments.
    #[error("The constraint '{constraint}' has more than one constructor taking {arity} argument(s) with {services} service parameter(s).")]
    AmbiguousConstraint {
        constraint: String,
        arity: usize,
        services: usize,
    },

    /// A constraint constructor rejected its arguments.
    #[error("Could not create the constraint '{constraint}': {message}")]
    ConstraintConstruction { constraint: String, message: String },

    /// An out-of-line policy could not be turned into a constraint.
    #[error("The constraint entry '{key}' - '{value}' must have a string value or be a route constraint.")]
    InvalidConstraintReference { key: String, value: String },

    /// A parameter received a default both inline and out of line.
    #[error("The route parameter '{parameter}' has both an inline default value and an explicit default value specified. A route parameter cannot contain an inline default value when a default value is specified explicitly. Consider removing one of them.")]
    ConflictingDefault { parameter: String },

    /// An optional parameter was also given a default.
    #[error("An optional parameter cannot have default value ('{parameter}').")]
    OptionalWithDefault { parameter: String },

    /// A required value does not correspond to a parameter or a matching default.
    #[error("No corresponding parameter or default value could be found for the required value '{key}={value}'. A non-null required value must correspond to a route parameter or the route pattern must have a matching default value.")]
    InvalidRequiredValue { key: String, value: String },

    /// Two link-eligible endpoints share a name.
    #[error("The following endpoints with a duplicate endpoint name were found.{}", format_duplicates(.name, .display_names))]
    DuplicateEndpointName {
        name: String,
        display_names: Vec<String>,
    },

    /// A grouping operation received an endpoint without a route pattern.
    #[error("The endpoint '{display_name}' is not supported: route groups can only contain route endpoints.")]
    UnsupportedEndpoint { display_name: String },

    /// Conventions were added to a group after its endpoints were materialized.
    #[error("Conventions cannot be added to the route group '{prefix}' after its endpoints have been built.")]
    ConventionsFrozen { prefix: String },

    /// No address scheme is registered for the requested address type.
    #[error("No address scheme is registered for address type '{address_type}'.")]
    NoAddressScheme { address_type: &'static str },

    /// A public entry point received an unusable argument.
    #[error("Invalid argument '{argument}': {message}")]
    InvalidArgument {
        argument: &'static str,
        message: String,
    },

    /// A route manifest could not be read or decoded.
    #[error("Failed to load route manifest '{path}': {message}")]
    Manifest { path: String, message: String },
}

fn format_duplicates(name: &str, display_names: &[String]) -> String {
    let mut out = String::new();
    out.push_str("\n\nEndpoints with endpoint name '");
    out.push_str(name);
    out.push_str("':");
    for display_name in display_names {
        out.push('\n');
        out.push_str(display_name);
    }
    out
}

impl RouteError {
    pub(crate) fn template(template: &str, message: impl Into<String>) -> Self {
        RouteError::Template {
            template: template.to_string(),
            message: message.into(),
        }
    }

    /// True for errors that describe a broken route configuration, as opposed
    /// to misuse of an API by the caller.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            RouteError::ConventionsFrozen { .. }
                | RouteError::NoAddressScheme { .. }
                | RouteError::InvalidArgument { .. }
        )
    }
}
