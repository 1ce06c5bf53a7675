//! Per-request dispatch state.
//!
//! A [`DispatchContext`] holds everything resolved for one request: domain, route, path
//! parameters and call target, plus the state actions and interceptors record while the
//! request runs. Contexts are pooled; [`DispatchContext::reset`] returns one to its empty
//! state while keeping allocated capacity.

use crate::application::Routing;
use crate::reply::Reply;
use crate::target::CallTarget;
use http::uri::Scheme;
use http::Method;
use micro_router::{AllowedMethods, Domain, PathParams, ReverseUrlError, Route};
use std::collections::HashMap;
use std::sync::Arc;

/// The request line the context is bound to.
#[derive(Debug, Clone)]
pub struct RequestInfo<'a> {
    pub scheme: Scheme,
    pub host: &'a str,
    pub method: Method,
    pub path: &'a str,
}

/// Resolution results a context is bound to.
#[derive(Debug)]
pub struct Resolved {
    pub routing: Arc<Routing>,
    pub domain: Arc<Domain>,
    pub route: Option<Arc<Route>>,
    pub params: PathParams,
    pub target: Arc<CallTarget>,
    pub allowed: Option<AllowedMethods>,
}

#[derive(Debug)]
pub struct DispatchContext {
    routing: Option<Arc<Routing>>,
    domain: Option<Arc<Domain>>,
    route: Option<Arc<Route>>,
    params: PathParams,
    target: Option<Arc<CallTarget>>,
    pub(crate) allowed: Option<AllowedMethods>,
    scheme: Scheme,
    host: String,
    method: Method,
    path: String,
    view_args: HashMap<String, serde_json::Value>,
    aborted: bool,
    reply: Reply,
}

impl Default for DispatchContext {
    fn default() -> Self {
        Self {
            routing: None,
            domain: None,
            route: None,
            params: PathParams::new(),
            target: None,
            allowed: None,
            scheme: Scheme::HTTP,
            host: String::new(),
            method: Method::GET,
            path: String::new(),
            view_args: HashMap::new(),
            aborted: false,
            reply: Reply::default(),
        }
    }
}

impl DispatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populates an empty or reset context.
    pub fn bind(&mut self, request: RequestInfo<'_>, resolved: Resolved) {
        self.scheme = request.scheme;
        self.host.clear();
        self.host.push_str(request.host);
        self.method = request.method;
        self.path.clear();
        self.path.push_str(request.path);

        self.params.clear();
        for (name, value) in resolved.params.iter() {
            self.params.push(name, value);
        }

        self.routing = Some(resolved.routing);
        self.domain = Some(resolved.domain);
        self.route = resolved.route;
        self.target = Some(resolved.target);
        self.allowed = resolved.allowed;
    }

    /// Clears all request state. Allocations of parameters, view args and strings are kept.
    pub fn reset(&mut self) {
        self.routing = None;
        self.domain = None;
        self.route = None;
        self.params.clear();
        self.target = None;
        self.allowed = None;
        self.scheme = Scheme::HTTP;
        self.host.clear();
        self.method = Method::GET;
        self.path.clear();
        self.view_args.clear();
        self.aborted = false;
        self.reply.reset();
    }

    #[inline]
    pub fn domain(&self) -> Option<&Arc<Domain>> {
        self.domain.as_ref()
    }

    /// The matched route, `None` for synthesized `OPTIONS` responses.
    #[inline]
    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }

    #[inline]
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    #[inline]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    #[inline]
    pub fn target(&self) -> Option<&Arc<CallTarget>> {
        self.target.as_ref()
    }

    /// Methods registered for the path of an automatic `OPTIONS` response.
    #[inline]
    pub fn allowed(&self) -> Option<&AllowedMethods> {
        self.allowed.as_ref()
    }

    #[inline]
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn add_view_arg(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> &mut Self {
        self.view_args.insert(key.into(), value.into());
        self
    }

    pub fn view_arg(&self, key: &str) -> Option<&serde_json::Value> {
        self.view_args.get(key)
    }

    #[inline]
    pub fn view_args(&self) -> &HashMap<String, serde_json::Value> {
        &self.view_args
    }

    /// Stops the remaining interceptors and the action from running.
    #[inline]
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    #[inline]
    pub fn reply(&self) -> &Reply {
        &self.reply
    }

    #[inline]
    pub fn reply_mut(&mut self) -> &mut Reply {
        &mut self.reply
    }

    /// URL of a named route, see [`micro_router::DomainRegistry::reverse_url`].
    pub fn reverse_url<I>(&self, name: &str, args: I) -> Result<String, ReverseUrlError>
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let routing = self.routing.as_ref().ok_or_else(|| ReverseUrlError::NoDomain(name.to_owned()))?;
        routing.domains().reverse_url(self.domain.as_deref(), &self.scheme, name, args)
    }

    pub fn reverse_url_with_map<I, K, V>(&self, name: &str, args: I) -> Result<String, ReverseUrlError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let routing = self.routing.as_ref().ok_or_else(|| ReverseUrlError::NoDomain(name.to_owned()))?;
        routing.domains().reverse_url_with_map(self.domain.as_deref(), &self.scheme, name, args)
    }
}
