use crate::pattern::PatternError;
use thiserror::Error;

/// A malformed routing configuration. Fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("domain '{domain}' has an empty host")]
    EmptyHost { domain: String },

    #[error("domain key '{key}' is registered more than once")]
    DuplicateDomain { key: String },

    #[error("domains '{first}' and '{second}' are both marked as default")]
    MultipleDefaultDomains { first: String, second: String },

    #[error("domain '{domain}': route '{route}' has invalid path '{path}': {source}")]
    InvalidPath {
        domain: String,
        route: String,
        path: String,
        #[source]
        source: PatternError,
    },

    #[error("domain '{domain}': route name '{route}' is declared more than once")]
    DuplicateRouteName { domain: String, route: String },

    #[error("domain '{domain}': route '{route}' registers {method} {path} already taken by route '{existing}'")]
    DuplicateRoute { domain: String, route: String, existing: String, method: String, path: String },

    #[error("domain '{domain}': route '{route}' names parameter '{name}' where '{existing}' is already registered")]
    ConflictingParam { domain: String, route: String, name: String, existing: String },

    #[error("domain '{domain}': route '{route}' has invalid method '{method}'")]
    InvalidMethod { domain: String, route: String, method: String },

    #[error("domain '{domain}': route '{route}' has neither a controller nor a websocket target")]
    MissingTarget { domain: String, route: String },

    #[error("domain '{domain}': route '{route}' targets {controller}.{action}: {reason}")]
    UnresolvedTarget { domain: String, route: String, controller: String, action: String, reason: String },
}

/// The request host matches no registered domain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("no domain is registered for host '{host}'")]
    DomainNotFound { host: String },
}

impl LookupError {
    pub fn domain_not_found<S: ToString>(host: S) -> Self {
        Self::DomainNotFound { host: host.to_string() }
    }
}

/// A reverse URL could not be built. Callers typically degrade to an empty link.
#[derive(Error, Debug)]
pub enum ReverseUrlError {
    #[error("route '{0}' not found")]
    UnknownRoute(String),

    #[error("no domain is available to resolve route '{0}'")]
    NoDomain(String),

    #[error("route '{route}' expects a value for '{name}'")]
    MissingArgument { route: String, name: String },

    #[error("route '{route}' received an empty value for '{name}'")]
    EmptyArgument { route: String, name: String },

    #[error("route '{route}' takes {expected} arguments, {given} given")]
    TooManyArguments { route: String, expected: usize, given: usize },

    #[error("cannot encode query string: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),
}

impl ReverseUrlError {
    pub fn missing_argument<R: ToString, N: ToString>(route: R, name: N) -> Self {
        Self::MissingArgument { route: route.to_string(), name: name.to_string() }
    }

    pub fn empty_argument<R: ToString, N: ToString>(route: R, name: N) -> Self {
        Self::EmptyArgument { route: route.to_string(), name: name.to_string() }
    }
}
