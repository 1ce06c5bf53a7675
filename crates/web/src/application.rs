//! The top-level object tying routing, controllers and dispatch together.
//!
//! An [`Application`] owns an immutable routing snapshot: the domain registry and the call
//! target of every route, resolved once when the snapshot is built. Requests read the
//! current snapshot without locking; [`Application::reload`] builds a new one and swaps it
//! in atomically. Contexts bound to the old snapshot keep it alive until they are dropped.

use crate::context::{Resolved, RequestInfo};
use crate::error::{ApplicationBuildError, DispatchError, ResolveError};
use crate::interceptor::{Interceptor, Interceptors};
use crate::pool::{ContextPool, PooledContext, DEFAULT_POOL_CAPACITY};
use crate::registry::ControllerRegistry;
use crate::target::CallTarget;
use crate::DispatchContext;
use arc_swap::ArcSwap;
use http::Method;
use micro_router::{
    AllowedMethods, ConfigError, Domain, DomainRegistry, LookupError, MatchOutcome, PathParams, Redirect, Route,
    RoutingConfig,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Domains and the call target of every route, as of one configuration load.
#[derive(Debug)]
pub struct Routing {
    domains: DomainRegistry,
    targets: Vec<Vec<Arc<CallTarget>>>,
}

impl Routing {
    /// Loads `config` and resolves the target of every route against `controllers`.
    pub fn build(config: &RoutingConfig, controllers: &ControllerRegistry) -> Result<Self, ConfigError> {
        let domains = DomainRegistry::load(config)?;

        let mut targets = Vec::with_capacity(domains.domains().len());
        for domain in domains.domains() {
            let mut domain_targets = Vec::with_capacity(domain.routes().len());
            for route in domain.routes().routes() {
                let target = controllers.resolve(route.controller(), route.action()).map_err(|e| {
                    ConfigError::UnresolvedTarget {
                        domain: domain.key().to_owned(),
                        route: route.name().to_owned(),
                        controller: route.controller().to_owned(),
                        action: route.action().to_owned(),
                        reason: e.to_string(),
                    }
                })?;
                debug!(
                    domain = domain.key(),
                    route = route.name(),
                    declared_by = target.declared_by(),
                    embedded_path = ?target.embedded_path(),
                    "call target resolved"
                );
                domain_targets.push(Arc::new(target));
            }
            targets.push(domain_targets);
        }

        Ok(Self { domains, targets })
    }

    #[inline]
    pub fn domains(&self) -> &DomainRegistry {
        &self.domains
    }

    /// Target of `route`, when both it and `domain` belong to this snapshot.
    pub fn target(&self, domain: &Domain, route: &Route) -> Option<&Arc<CallTarget>> {
        let own = self.domains.get(domain.id())?;
        if !std::ptr::eq(own.as_ref(), domain) {
            return None;
        }
        let own_route = own.routes().routes().get(route.index())?;
        if !std::ptr::eq(own_route.as_ref(), route) {
            return None;
        }
        self.targets.get(domain.id())?.get(route.index())
    }
}

/// Result of [`Application::lookup`].
#[derive(Debug)]
pub struct Lookup {
    pub routing: Arc<Routing>,
    pub domain: Arc<Domain>,
    pub outcome: MatchOutcome<Arc<Route>>,
}

impl Lookup {
    /// Call target of the matched route.
    pub fn target(&self) -> Option<&Arc<CallTarget>> {
        match &self.outcome {
            MatchOutcome::Found { route, .. } => self.routing.target(&self.domain, route),
            _ => None,
        }
    }
}

/// Result of [`Application::prepare`].
#[derive(Debug)]
pub enum Prepared {
    /// A bound context ready for [`Application::invoke`], including automatic `OPTIONS`.
    Dispatch(PooledContext),
    Redirect(Redirect),
    MethodNotAllowed(AllowedMethods),
    NotFound,
}

#[derive(Debug)]
pub struct Application {
    routing: ArcSwap<Routing>,
    controllers: ControllerRegistry,
    interceptors: Interceptors,
    pool: ContextPool,
    log_dispatch: Option<tracing::Dispatch>,
}

#[derive(Debug)]
pub struct ApplicationBuilder {
    config: Option<RoutingConfig>,
    controllers: Option<ControllerRegistry>,
    interceptors: Interceptors,
    pool_capacity: usize,
    log_dispatch: Option<tracing::Dispatch>,
}

impl ApplicationBuilder {
    fn new() -> Self {
        Self {
            config: None,
            controllers: None,
            interceptors: Interceptors::default(),
            pool_capacity: DEFAULT_POOL_CAPACITY,
            log_dispatch: None,
        }
    }

    #[must_use]
    pub fn routing(mut self, config: RoutingConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn controllers(mut self, controllers: ControllerRegistry) -> Self {
        self.controllers = Some(controllers);
        self
    }

    #[must_use]
    pub fn interceptors(mut self, interceptors: Interceptors) -> Self {
        self.interceptors = interceptors;
        self
    }

    #[must_use]
    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    /// Sends startup and reload events to `dispatch` instead of the global subscriber.
    #[must_use]
    pub fn log_dispatch(mut self, dispatch: tracing::Dispatch) -> Self {
        self.log_dispatch = Some(dispatch);
        self
    }

    pub fn build(self) -> Result<Application, ApplicationBuildError> {
        let config = self.config.ok_or(ApplicationBuildError::MissingRouting)?;
        let controllers = self.controllers.ok_or(ApplicationBuildError::MissingControllers)?;

        let routing = with_log(self.log_dispatch.as_ref(), || {
            let routing = Routing::build(&config, &controllers)?;
            info!(domains = routing.domains().domains().len(), controllers = controllers.len(), "application built");
            Ok::<_, ConfigError>(routing)
        })?;

        Ok(Application {
            routing: ArcSwap::from_pointee(routing),
            controllers,
            interceptors: self.interceptors,
            pool: ContextPool::new(self.pool_capacity),
            log_dispatch: self.log_dispatch,
        })
    }
}

fn with_log<T>(dispatch: Option<&tracing::Dispatch>, f: impl FnOnce() -> T) -> T {
    match dispatch {
        Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
        None => f(),
    }
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// The current routing snapshot.
    pub fn routing(&self) -> Arc<Routing> {
        self.routing.load_full()
    }

    #[inline]
    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    #[inline]
    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }

    /// Builds a routing snapshot from `config` and swaps it in. The current snapshot is kept on error.
    pub fn reload(&self, config: &RoutingConfig) -> Result<(), ConfigError> {
        with_log(self.log_dispatch.as_ref(), || -> Result<(), ConfigError> {
            let routing = Routing::build(config, &self.controllers)?;
            info!(domains = routing.domains().domains().len(), "routing reloaded");
            self.routing.store(Arc::new(routing));
            Ok(())
        })
    }

    /// Resolves the domain for `host` and matches `method` and `path` in it.
    pub fn lookup(&self, host: &str, method: &Method, path: &str) -> Result<Lookup, LookupError> {
        let routing = self.routing.load_full();
        let (domain, outcome) = routing.domains().lookup(host, method, path)?;
        let domain = Arc::clone(domain);
        let outcome = outcome.map_route(Arc::clone);
        Ok(Lookup { routing, domain, outcome })
    }

    /// Looks up the request and, when it dispatches to an action, binds a pooled context.
    pub fn prepare(&self, request: RequestInfo<'_>) -> Result<Prepared, LookupError> {
        let Lookup { routing, domain, outcome } = self.lookup(request.host, &request.method, request.path)?;

        let (route, params, target, allowed) = match outcome {
            MatchOutcome::Found { route, params } => {
                let Some(target) = routing.target(&domain, &route).cloned() else {
                    return Ok(Prepared::NotFound);
                };
                (Some(route), params, target, None)
            }
            MatchOutcome::AutoOptions(allowed) => (None, PathParams::empty(), CallTarget::auto_options(), Some(allowed)),
            MatchOutcome::Redirect(redirect) => return Ok(Prepared::Redirect(redirect)),
            MatchOutcome::MethodNotAllowed(allowed) => return Ok(Prepared::MethodNotAllowed(allowed)),
            MatchOutcome::NotFound => return Ok(Prepared::NotFound),
        };

        let mut ctx = self.pool.acquire();
        ctx.bind(request, Resolved { routing, domain, route, params, target, allowed });
        Ok(Prepared::Dispatch(ctx))
    }

    /// Call target of `route`, resolved afresh when the route is not part of the current snapshot.
    pub fn resolve_target(&self, domain: &Domain, route: &Route) -> Result<Arc<CallTarget>, ResolveError> {
        if let Some(target) = self.routing.load().target(domain, route) {
            return Ok(Arc::clone(target));
        }
        self.controllers.resolve(route.controller(), route.action()).map(Arc::new)
    }

    /// Runs the interceptors and the action of a bound context.
    pub async fn invoke(&self, ctx: &mut DispatchContext) -> Result<(), DispatchError> {
        let target = ctx.target().map(Arc::clone).ok_or(DispatchError::Unbound)?;

        self.interceptors.before(ctx).await;
        if ctx.is_aborted() {
            return Ok(());
        }

        let handler = target
            .action()
            .action_handler()
            .ok_or_else(|| DispatchError::missing_handler(target.controller(), target.action().name()))?;
        handler.invoke(ctx).await.map_err(DispatchError::Handler)?;

        self.interceptors.after(ctx).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ActionDescriptor, ControllerDescriptor, TypeTag};
    use crate::handler::action_fn;
    use http::uri::Scheme;
    use http::{header, StatusCode};
    use micro_router::{DomainConfig, RouteConfig};

    fn controllers() -> ControllerRegistry {
        ControllerRegistry::builder()
            .base_type("Context")
            .register(ControllerDescriptor::new("Context"))
            .register(
                ControllerDescriptor::new("Site")
                    .embed(0, "Context")
                    .action(ActionDescriptor::new("Index").handler(action_fn(|ctx| {
                        ctx.reply_mut().text("home");
                        Ok(())
                    }))),
            )
            .register(
                ControllerDescriptor::new("User")
                    .embed(0, "Context")
                    .action(ActionDescriptor::new("Show").param("id", TypeTag::Int).handler(action_fn(|ctx| {
                        let id = ctx.param("id").unwrap_or_default().to_owned();
                        ctx.add_view_arg("id", id);
                        Ok(())
                    })))
                    .action(ActionDescriptor::new("Update"))
                    .action(ActionDescriptor::new("Fail").handler(action_fn(|_| Err("boom".into())))),
            )
            .build()
            .unwrap()
    }

    fn config() -> RoutingConfig {
        RoutingConfig::new().domain(
            "localhost",
            DomainConfig::new("localhost")
                .port(8080)
                .route("index", RouteConfig::new("/").controller("Site"))
                .route(
                    "user",
                    RouteConfig::new("/users/:id")
                        .controller("User")
                        .action("Show")
                        .route("update_user", RouteConfig::new("/").method("PUT"))
                        .route("fail", RouteConfig::new("/fail").action("Fail")),
                ),
        )
    }

    fn application() -> Application {
        Application::builder().routing(config()).controllers(controllers()).build().unwrap()
    }

    fn request<'a>(method: Method, path: &'a str) -> RequestInfo<'a> {
        RequestInfo { scheme: Scheme::HTTP, host: "localhost:8080", method, path }
    }

    #[test]
    fn test_build_requires_parts() {
        assert!(matches!(
            Application::builder().controllers(controllers()).build(),
            Err(ApplicationBuildError::MissingRouting)
        ));
        assert!(matches!(Application::builder().routing(config()).build(), Err(ApplicationBuildError::MissingControllers)));
    }

    #[test]
    fn test_unresolved_target_fails_fast() {
        let config = RoutingConfig::new()
            .domain("localhost", DomainConfig::new("localhost").route("x", RouteConfig::new("/x").controller("Nope")));
        let err = Application::builder().routing(config).controllers(controllers()).build().unwrap_err();
        assert!(matches!(err, ApplicationBuildError::Config(ConfigError::UnresolvedTarget { ref controller, .. }) if controller == "Nope"));
    }

    #[test]
    fn test_lookup_target() {
        let app = application();
        let lookup = app.lookup("localhost:8080", &Method::GET, "/users/42").unwrap();

        let target = lookup.target().unwrap();
        assert_eq!(target.controller(), "User");
        assert_eq!(target.action().name(), "Show");
        assert_eq!(target.base_paths(), &[vec![0]]);

        assert!(matches!(app.lookup("example.org", &Method::GET, "/"), Err(LookupError::DomainNotFound { .. })));
    }

    #[tokio::test]
    async fn test_prepare_and_invoke() {
        let app = application();
        let Prepared::Dispatch(mut ctx) = app.prepare(request(Method::GET, "/users/42")).unwrap() else {
            panic!("expected a dispatch");
        };

        assert_eq!(ctx.route().unwrap().name(), "user");
        assert_eq!(ctx.param("id"), Some("42"));
        assert_eq!(ctx.host(), "localhost:8080");
        assert_eq!(ctx.reverse_url("update_user", [7]).unwrap(), "/users/7/");

        app.invoke(&mut ctx).await.unwrap();
        assert_eq!(ctx.view_arg("id"), Some(&serde_json::json!("42")));
    }

    #[tokio::test]
    async fn test_prepare_outcomes() {
        let app = application();

        match app.prepare(request(Method::PUT, "/users/42")).unwrap() {
            Prepared::Redirect(redirect) => {
                assert_eq!(redirect.path, "/users/42/");
                assert_eq!(redirect.status, StatusCode::TEMPORARY_REDIRECT);
            }
            other => panic!("unexpected {other:?}"),
        }

        match app.prepare(request(Method::DELETE, "/users/42")).unwrap() {
            Prepared::MethodNotAllowed(allowed) => assert_eq!(allowed.to_string(), "GET"),
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(app.prepare(request(Method::GET, "/nowhere")).unwrap(), Prepared::NotFound));
    }

    #[tokio::test]
    async fn test_auto_options() {
        let app = application();
        let Prepared::Dispatch(mut ctx) = app.prepare(request(Method::OPTIONS, "/users/42/")).unwrap() else {
            panic!("expected a dispatch");
        };

        assert!(ctx.route().is_none());
        assert!(ctx.target().unwrap().is_auto_options());

        app.invoke(&mut ctx).await.unwrap();
        assert_eq!(ctx.reply().status_code(), StatusCode::OK);
        assert_eq!(ctx.reply().headers()[header::ALLOW], "PUT");
    }

    #[tokio::test]
    async fn test_invoke_errors() {
        let app = application();

        let mut unbound = DispatchContext::new();
        assert!(matches!(app.invoke(&mut unbound).await, Err(DispatchError::Unbound)));

        let Prepared::Dispatch(mut ctx) = app.prepare(request(Method::PUT, "/users/42/")).unwrap() else {
            panic!("expected a dispatch");
        };
        assert!(matches!(
            app.invoke(&mut ctx).await,
            Err(DispatchError::MissingHandler { ref action, .. }) if action == "Update"
        ));

        let Prepared::Dispatch(mut ctx) = app.prepare(request(Method::GET, "/users/42/fail")).unwrap() else {
            panic!("expected a dispatch");
        };
        let err = app.invoke(&mut ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "action failed: boom");
    }

    #[test]
    fn test_resolve_target() {
        let app = application();
        let routing = app.routing();
        let domain = routing.domains().by_key("localhost").unwrap();
        let route = domain.route("user").unwrap();

        let cached = app.resolve_target(domain, route).unwrap();
        assert!(Arc::ptr_eq(&cached, routing.target(domain, route).unwrap()));

        app.reload(&config()).unwrap();
        let fresh = app.resolve_target(domain, route).unwrap();
        assert!(!Arc::ptr_eq(&cached, &fresh));
        assert_eq!(fresh.action().name(), "Show");
    }

    #[test]
    fn test_reload_keeps_snapshot_on_error() {
        let app = application();
        let broken = RoutingConfig::new()
            .domain("localhost", DomainConfig::new("localhost").route("x", RouteConfig::new("x").controller("Site")));

        assert!(matches!(app.reload(&broken), Err(ConfigError::InvalidPath { .. })));
        assert!(app.lookup("localhost:8080", &Method::GET, "/").unwrap().outcome.is_found());
    }

    #[test]
    fn test_reload_error_converts_into_dispatch_error() {
        fn reload_and_lookup(app: &Application, config: &RoutingConfig) -> Result<bool, DispatchError> {
            app.reload(config)?;
            Ok(app.lookup("localhost:8080", &Method::GET, "/")?.outcome.is_found())
        }

        let app = application();
        let unresolved = RoutingConfig::new()
            .domain("localhost", DomainConfig::new("localhost").route("x", RouteConfig::new("/x").controller("Nobody")));

        let err = reload_and_lookup(&app, &unresolved).unwrap_err();
        assert!(matches!(err, DispatchError::Config(ConfigError::UnresolvedTarget { ref controller, .. }) if controller == "Nobody"));
        assert!(err.to_string().contains("Nobody"));
    }
}
