//! Host and path based request routing
//!
//! This crate maps an incoming request, identified by its `Host` header, method and path,
//! to a named route of a domain. Routes are declared in a nested configuration tree and
//! flattened into one segment trie per domain.
//!
//! # Features
//!
//! - Literal, `:named` and `*wildcard` path segments
//! - Backtracking lookup: literals win over parameters, parameters over wildcards
//! - Trailing slash redirects, automatic `OPTIONS` and `405 Method Not Allowed` detection
//! - A `WS` pseudo-method for WebSocket routes that share paths with HTTP routes
//! - Exact, per-port, wildcard sub-domain and default domain resolution
//! - Reverse URLs by route name, across domains
//! - Route inheritance of controller, auth scheme, anti-CSRF flag and CORS policy
//!
//! # Example
//!
//! ```
//! use http::Method;
//! use micro_router::{DomainConfig, DomainRegistry, MatchOutcome, RouteConfig, RoutingConfig};
//!
//! let config = RoutingConfig::new().domain(
//!     "localhost",
//!     DomainConfig::new("localhost").port(8080).route(
//!         "version_home",
//!         RouteConfig::new("/doc/:version")
//!             .controller("Doc")
//!             .action("VersionHome")
//!             .route("show_doc", RouteConfig::new("/*content").action("ShowDoc")),
//!     ),
//! );
//! let registry = DomainRegistry::load(&config).unwrap();
//!
//! let (_, outcome) = registry.lookup("localhost:8080", &Method::GET, "/doc/v0.3/guide/routing.html").unwrap();
//! match outcome {
//!     MatchOutcome::Found { route, params } => {
//!         assert_eq!(route.name(), "show_doc");
//!         assert_eq!(params.get("version"), Some("v0.3"));
//!         assert_eq!(params.get("content"), Some("guide/routing.html"));
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

mod config;
mod cors;
mod domain;
mod error;
mod matcher;
mod method;
mod params;
mod pattern;
mod registry;
mod reverse;
mod route;
mod table;

pub use config::{CorsConfig, DomainConfig, RouteConfig, RoutingConfig};
pub use cors::Cors;
pub use domain::Domain;
pub use error::{ConfigError, LookupError, ReverseUrlError};
pub use matcher::{InsertError, MatchOutcome, MatchPolicy, PathMatcher, Redirect};
pub use method::{default_action, is_websocket, parse_method, AllowedMethods, WS};
pub use params::PathParams;
pub use pattern::{PathPattern, PatternError, Segment};
pub use registry::{DomainRegistry, DomainRegistryBuilder};
pub use route::Route;
pub use table::RouteTable;
