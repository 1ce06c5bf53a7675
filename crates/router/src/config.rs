//! Deserializable routing configuration.
//!
//! The engine consumes these structures and does not care which file format produced them;
//! any `serde` format works. A JSON example:
//!
//! ```
//! use micro_router::RoutingConfig;
//!
//! let config: RoutingConfig = serde_json::from_str(r#"{
//!     "domains": {
//!         "localhost": {
//!             "host": "localhost",
//!             "port": 8080,
//!             "routes": {
//!                 "version_home": {
//!                     "path": "/doc/:version",
//!                     "controller": "Doc",
//!                     "action": "VersionHome",
//!                     "routes": {
//!                         "show_doc": { "path": "/*content", "action": "ShowDoc" }
//!                     }
//!                 }
//!             }
//!         }
//!     }
//! }"#).unwrap();
//!
//! assert!(config.domains["localhost"].redirect_trailing_slash);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const fn enabled() -> bool {
    true
}

/// Every domain the application serves, keyed by an arbitrary identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub domains: BTreeMap<String, DomainConfig>,
}

impl RoutingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn domain(mut self, key: impl Into<String>, domain: DomainConfig) -> Self {
        self.domains.insert(key.into(), domain);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools, reason = "mirrors the configuration keys")]
pub struct DomainConfig {
    /// Display name, defaults to the domain key.
    #[serde(default)]
    pub name: Option<String>,

    /// Host name; `*.example.com` registers a wildcard sub-domain.
    pub host: String,

    #[serde(default)]
    pub port: Option<u16>,

    /// Answers requests whose host matches no other domain.
    #[serde(default)]
    pub default: bool,

    /// Serves every sub-domain of `host`. Implied by a `*.` host prefix.
    #[serde(default)]
    pub subdomain: bool,

    #[serde(default = "enabled")]
    pub redirect_trailing_slash: bool,

    #[serde(default = "enabled")]
    pub method_not_allowed: bool,

    #[serde(default = "enabled")]
    pub auto_options: bool,

    #[serde(default)]
    pub default_auth: String,

    #[serde(default)]
    pub cors: Option<CorsConfig>,

    /// Static file serving block, carried through untouched.
    #[serde(default, rename = "static")]
    pub static_files: Option<serde_json::Value>,

    #[serde(default)]
    pub routes: BTreeMap<String, RouteConfig>,
}

impl DomainConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            name: None,
            host: host.into(),
            port: None,
            default: false,
            subdomain: false,
            redirect_trailing_slash: true,
            method_not_allowed: true,
            auto_options: true,
            default_auth: String::new(),
            cors: None,
            static_files: None,
            routes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn route(mut self, name: impl Into<String>, route: RouteConfig) -> Self {
        self.routes.insert(name.into(), route);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn default_domain(mut self) -> Self {
        self.default = true;
        self
    }

    #[must_use]
    pub fn policy(mut self, redirect_trailing_slash: bool, method_not_allowed: bool, auto_options: bool) -> Self {
        self.redirect_trailing_slash = redirect_trailing_slash;
        self.method_not_allowed = method_not_allowed;
        self.auto_options = auto_options;
        self
    }

    #[must_use]
    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.cors = Some(cors);
        self
    }

    #[must_use]
    pub fn default_auth(mut self, auth: impl Into<String>) -> Self {
        self.default_auth = auth.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub enable: bool,

    #[serde(default)]
    pub allow_origins: Vec<String>,

    #[serde(default)]
    pub allow_methods: Vec<String>,

    #[serde(default)]
    pub allow_headers: Vec<String>,

    #[serde(default)]
    pub expose_headers: Vec<String>,

    #[serde(default)]
    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds.
    #[serde(default)]
    pub max_age: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Path pattern, relative to the parent route when nested.
    pub path: String,

    #[serde(default)]
    pub controller: Option<String>,

    #[serde(default)]
    pub action: Option<String>,

    /// Defaults to `GET`.
    #[serde(default)]
    pub method: Option<String>,

    /// Makes this a `WS` route handled by the named controller.
    #[serde(default)]
    pub websocket: Option<String>,

    #[serde(default)]
    pub auth: Option<String>,

    #[serde(default)]
    pub anti_csrf_check: Option<bool>,

    #[serde(default)]
    pub cors: Option<CorsConfig>,

    #[serde(default)]
    pub routes: BTreeMap<String, RouteConfig>,
}

impl RouteConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Self::default() }
    }

    #[must_use]
    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[must_use]
    pub fn websocket(mut self, controller: impl Into<String>) -> Self {
        self.websocket = Some(controller.into());
        self
    }

    #[must_use]
    pub fn auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    #[must_use]
    pub fn anti_csrf_check(mut self, check: bool) -> Self {
        self.anti_csrf_check = Some(check);
        self
    }

    #[must_use]
    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.cors = Some(cors);
        self
    }

    #[must_use]
    pub fn route(mut self, name: impl Into<String>, route: RouteConfig) -> Self {
        self.routes.insert(name.into(), route);
        self
    }
}
