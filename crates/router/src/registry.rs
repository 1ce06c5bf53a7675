//! Host based domain resolution and cross-domain reverse URLs.

use crate::config::RoutingConfig;
use crate::domain::with_anchor;
use crate::matcher::MatchOutcome;
use crate::reverse::split_anchor;
use crate::{ConfigError, Domain, LookupError, ReverseUrlError, Route};
use http::uri::Scheme;
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Every domain of an application, resolvable by request host.
#[derive(Debug)]
pub struct DomainRegistry {
    domains: Vec<Arc<Domain>>,
    hosts: HashMap<String, usize>,
    wildcards: HashMap<String, usize>,
    default: Option<usize>,
}

#[derive(Debug, Default)]
pub struct DomainRegistryBuilder {
    domains: Vec<Domain>,
}

impl DomainRegistryBuilder {
    #[must_use]
    pub fn domain(mut self, domain: Domain) -> Self {
        self.domains.push(domain);
        self
    }

    pub fn build(self) -> Result<DomainRegistry, ConfigError> {
        let mut registry = DomainRegistry {
            domains: Vec::with_capacity(self.domains.len()),
            hosts: HashMap::new(),
            wildcards: HashMap::new(),
            default: None,
        };

        for (id, mut domain) in self.domains.into_iter().enumerate() {
            domain.id = id;

            let key = domain.host_key();
            let hosts = if domain.is_subdomain() { &mut registry.wildcards } else { &mut registry.hosts };
            if hosts.insert(key.clone(), id).is_some() {
                let key = if domain.is_subdomain() { format!("*.{key}") } else { key };
                return Err(ConfigError::DuplicateDomain { key });
            }

            if domain.is_default() {
                if let Some(first) = registry.default {
                    return Err(ConfigError::MultipleDefaultDomains {
                        first: registry.domains[first].key().to_owned(),
                        second: domain.key().to_owned(),
                    });
                }
                registry.default = Some(id);
            }

            registry.domains.push(Arc::new(domain));
        }

        info!(domains = registry.domains.len(), "domain registry built");
        Ok(registry)
    }
}

impl DomainRegistry {
    pub fn builder() -> DomainRegistryBuilder {
        DomainRegistryBuilder::default()
    }

    /// Loads every configured domain.
    pub fn load(config: &RoutingConfig) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        for (key, domain) in &config.domains {
            builder = builder.domain(Domain::load(key, domain)?);
        }
        builder.build()
    }

    #[inline]
    pub fn domains(&self) -> &[Arc<Domain>] {
        &self.domains
    }

    #[inline]
    pub fn get(&self, id: usize) -> Option<&Arc<Domain>> {
        self.domains.get(id)
    }

    pub fn by_key(&self, key: &str) -> Option<&Arc<Domain>> {
        self.domains.iter().find(|d| d.key() == key)
    }

    pub fn default_domain(&self) -> Option<&Arc<Domain>> {
        self.default.map(|id| &self.domains[id])
    }

    /// Finds the domain serving `host`, a `Host` header value with an optional port.
    ///
    /// Tries `host:port`, then `host`, then the wildcard domain of the parent host in the
    /// same two forms, then the default domain.
    pub fn resolve(&self, host: &str) -> Result<&Arc<Domain>, LookupError> {
        let host = host.trim().to_ascii_lowercase();
        let (name, port) = split_port(&host);

        let id = self
            .find(&self.hosts, name, port)
            .or_else(|| name.split_once('.').and_then(|(_, parent)| self.find(&self.wildcards, parent, port)))
            .or(self.default)
            .ok_or_else(|| LookupError::domain_not_found(&host))?;

        Ok(&self.domains[id])
    }

    fn find(&self, hosts: &HashMap<String, usize>, name: &str, port: Option<&str>) -> Option<usize> {
        let with_port = port.and_then(|port| hosts.get(&format!("{name}:{port}")));
        with_port.or_else(|| hosts.get(name)).copied()
    }

    /// Resolves the domain for `host`, then matches `method` and `path` in it.
    pub fn lookup(
        &self,
        host: &str,
        method: &Method,
        path: &str,
    ) -> Result<(&Arc<Domain>, MatchOutcome<&Arc<Route>>), LookupError> {
        let domain = self.resolve(host)?;
        Ok((domain, domain.lookup(method, path)))
    }

    /// URL of a named route, seen from a request served by `current`.
    ///
    /// A route of the current domain yields its path. A name qualified as `label.route`,
    /// where `label` is a domain key or the first label of a domain's host, or a route that
    /// only exists in another domain, yields an absolute `scheme://host[:port]path` URL.
    pub fn reverse_url<I>(
        &self,
        current: Option<&Domain>,
        scheme: &Scheme,
        name: &str,
        args: I,
    ) -> Result<String, ReverseUrlError>
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let (name, anchor) = split_anchor(name);
        let (domain, route, absolute) = self.find_route(current, name)?;
        let path = with_anchor(route.reverse_path(args)?, anchor);
        Ok(if absolute { format!("{scheme}://{}{path}", domain.authority()) } else { path })
    }

    pub fn reverse_url_with_map<I, K, V>(
        &self,
        current: Option<&Domain>,
        scheme: &Scheme,
        name: &str,
        args: I,
    ) -> Result<String, ReverseUrlError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let (name, anchor) = split_anchor(name);
        let (domain, route, absolute) = self.find_route(current, name)?;
        let path = with_anchor(route.reverse_path_with_map(args)?, anchor);
        Ok(if absolute { format!("{scheme}://{}{path}", domain.authority()) } else { path })
    }

    fn find_route<'r>(
        &'r self,
        current: Option<&Domain>,
        name: &str,
    ) -> Result<(&'r Domain, &'r Arc<Route>, bool), ReverseUrlError> {
        let is_current = |domain: &Domain| current.is_some_and(|c| c.id() == domain.id() && c.key() == domain.key());

        if let Some((label, route_name)) = name.split_once('.') {
            let domain: &Domain = self.by_label(label).ok_or_else(|| ReverseUrlError::NoDomain(name.to_owned()))?;
            let route = domain.route(route_name).ok_or_else(|| ReverseUrlError::UnknownRoute(name.to_owned()))?;
            return Ok((domain, route, !is_current(domain)));
        }

        if let Some(own) = current.and_then(|c| self.get(c.id()).filter(|d| d.key() == c.key())) {
            if let Some(route) = own.route(name) {
                return Ok((own.as_ref(), route, false));
            }
        }

        if self.domains.is_empty() {
            return Err(ReverseUrlError::NoDomain(name.to_owned()));
        }

        self.domains
            .iter()
            .find_map(|domain| domain.route(name).map(|route| (domain.as_ref(), route, !is_current(domain.as_ref()))))
            .ok_or_else(|| ReverseUrlError::UnknownRoute(name.to_owned()))
    }

    fn by_label(&self, label: &str) -> Option<&Arc<Domain>> {
        self.by_key(label).or_else(|| {
            self.domains
                .iter()
                .find(|d| !d.is_subdomain() && d.host().split('.').next().is_some_and(|first| first == label))
        })
    }
}

/// Splits `host:port`, dropping the default HTTP(S) ports. IPv6 literals keep their brackets.
fn split_port(host: &str) -> (&str, Option<&str>) {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            let port = (port != "80" && port != "443").then_some(port);
            (name, port)
        }
        _ => (host, None),
    }
}
