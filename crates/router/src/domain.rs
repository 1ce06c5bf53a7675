use crate::config::DomainConfig;
use crate::matcher::{MatchOutcome, MatchPolicy};
use crate::reverse::split_anchor;
use crate::{ConfigError, Cors, ReverseUrlError, Route, RouteTable};
use http::Method;
use std::sync::Arc;
use tracing::info;

const WILDCARD_PREFIX: &str = "*.";

/// A routing namespace selected by the request host.
#[derive(Debug)]
pub struct Domain {
    pub(crate) id: usize,
    key: String,
    name: String,
    host: String,
    port: Option<u16>,
    subdomain: bool,
    is_default: bool,
    default_auth: String,
    cors: Option<Arc<Cors>>,
    static_files: Option<serde_json::Value>,
    table: RouteTable,
}

impl Domain {
    /// Loads a domain and flattens its route tree.
    pub fn load(key: &str, config: &DomainConfig) -> Result<Self, ConfigError> {
        let host = config.host.trim().to_ascii_lowercase();
        let (host, subdomain) = match host.strip_prefix(WILDCARD_PREFIX) {
            Some(parent) => (parent.to_owned(), true),
            None => (host, config.subdomain),
        };
        if host.is_empty() {
            return Err(ConfigError::EmptyHost { domain: key.to_owned() });
        }

        let table = RouteTable::load(key, config)?;
        info!(domain = key, host = %host, port = ?config.port, subdomain, routes = table.len(), "domain loaded");

        Ok(Self {
            id: 0,
            key: key.to_owned(),
            name: config.name.clone().unwrap_or_else(|| key.to_owned()),
            host,
            port: config.port,
            subdomain,
            is_default: config.default,
            default_auth: config.default_auth.clone(),
            cors: config.cors.as_ref().and_then(Cors::from_config).map(Arc::new),
            static_files: config.static_files.clone(),
            table,
        })
    }

    pub fn lookup(&self, method: &Method, path: &str) -> MatchOutcome<&Arc<Route>> {
        self.table.lookup(method, path)
    }

    /// Position of the domain inside its registry.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Configuration key the domain was loaded from.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-cased host, without the `*.` prefix of a wildcard domain.
    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Whether every sub-domain of [`Domain::host`] is served by this domain.
    #[inline]
    pub fn is_subdomain(&self) -> bool {
        self.subdomain
    }

    #[inline]
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    #[inline]
    pub fn default_auth(&self) -> &str {
        &self.default_auth
    }

    #[inline]
    pub fn cors(&self) -> Option<&Arc<Cors>> {
        self.cors.as_ref()
    }

    #[inline]
    pub fn static_files(&self) -> Option<&serde_json::Value> {
        self.static_files.as_ref()
    }

    #[inline]
    pub fn policy(&self) -> MatchPolicy {
        self.table.policy()
    }

    #[inline]
    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    pub fn route(&self, name: &str) -> Option<&Arc<Route>> {
        self.table.route(name)
    }

    /// The port the domain is registered under, `None` for the default HTTP(S) ports.
    pub(crate) fn effective_port(&self) -> Option<u16> {
        self.port.filter(|p| !matches!(p, 80 | 443))
    }

    /// Key the domain is registered under, `host` or `host:port`.
    pub(crate) fn host_key(&self) -> String {
        match self.effective_port() {
            Some(port) => format!("{}:{port}", self.host),
            None => self.host.clone(),
        }
    }

    /// `host[:port]` to use in absolute URLs.
    pub fn authority(&self) -> String {
        self.host_key()
    }

    /// Path of the named route, `name#anchor` appends the anchor.
    pub fn reverse_url<I>(&self, name: &str, args: I) -> Result<String, ReverseUrlError>
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let (name, anchor) = split_anchor(name);
        let route = self.route(name).ok_or_else(|| ReverseUrlError::UnknownRoute(name.to_owned()))?;
        Ok(with_anchor(route.reverse_path(args)?, anchor))
    }

    /// Path of the named route with parameters taken by name; other entries become the query string.
    pub fn reverse_url_with_map<I, K, V>(&self, name: &str, args: I) -> Result<String, ReverseUrlError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let (name, anchor) = split_anchor(name);
        let route = self.route(name).ok_or_else(|| ReverseUrlError::UnknownRoute(name.to_owned()))?;
        Ok(with_anchor(route.reverse_path_with_map(args)?, anchor))
    }
}

pub(crate) fn with_anchor(mut path: String, anchor: Option<&str>) -> String {
    if let Some(anchor) = anchor {
        path.push('#');
        path.push_str(anchor);
    }
    path
}
