//! Flattens a domain's nested route configuration into a route table.

use crate::config::{DomainConfig, RouteConfig};
use crate::matcher::{InsertError, MatchOutcome, MatchPolicy, PathMatcher};
use crate::method::{default_action, parse_method, WS};
use crate::pattern::PathPattern;
use crate::{ConfigError, Cors, Route};
use http::Method;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// The routes of one domain and the matcher built from them.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
    names: HashMap<String, usize>,
    matcher: PathMatcher,
}

#[derive(Debug, Clone)]
enum Target {
    Controller(String),
    WebSocket(String),
}

/// What a child route inherits from the group it is declared in.
#[derive(Debug)]
struct Inherited<'a> {
    name: &'a str,
    pattern: &'a PathPattern,
    target: Option<Target>,
    auth: &'a str,
    anti_csrf_check: bool,
    cors: Option<Arc<Cors>>,
}

struct Loader<'c> {
    domain: &'c str,
    default_auth: &'c str,
    domain_cors: Option<Arc<Cors>>,
    table: RouteTable,
}

impl RouteTable {
    pub fn load(domain: &str, config: &DomainConfig) -> Result<Self, ConfigError> {
        let policy = MatchPolicy {
            redirect_trailing_slash: config.redirect_trailing_slash,
            method_not_allowed: config.method_not_allowed,
            auto_options: config.auto_options,
        };
        let domain_cors = config.cors.as_ref().and_then(Cors::from_config).map(Arc::new);

        let mut loader = Loader {
            domain,
            default_auth: &config.default_auth,
            domain_cors,
            table: RouteTable { routes: Vec::new(), names: HashMap::new(), matcher: PathMatcher::new(policy) },
        };
        loader.add_routes(None, &config.routes)?;
        Ok(loader.table)
    }

    pub fn lookup(&self, method: &Method, path: &str) -> MatchOutcome<&Arc<Route>> {
        self.matcher.resolve(method, path).map_route(|idx| &self.routes[idx])
    }

    pub fn route(&self, name: &str) -> Option<&Arc<Route>> {
        self.names.get(name).map(|idx| &self.routes[*idx])
    }

    #[inline]
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    #[inline]
    pub fn policy(&self) -> MatchPolicy {
        self.matcher.policy()
    }
}

impl Loader<'_> {
    fn add_routes(&mut self, parent: Option<&Inherited<'_>>, routes: &BTreeMap<String, RouteConfig>) -> Result<(), ConfigError> {
        for (name, config) in routes {
            self.add_route(parent, name, config)?;
        }
        Ok(())
    }

    fn add_route(&mut self, parent: Option<&Inherited<'_>>, name: &str, config: &RouteConfig) -> Result<(), ConfigError> {
        let pattern = match parent {
            Some(parent) => parent.pattern.join(&config.path),
            None => PathPattern::parse(&config.path),
        }
        .map_err(|source| ConfigError::InvalidPath {
            domain: self.domain.to_owned(),
            route: name.to_owned(),
            path: config.path.clone(),
            source,
        })?;

        let target = match (&config.websocket, &config.controller) {
            (Some(websocket), _) => Some(Target::WebSocket(websocket.clone())),
            (None, Some(controller)) => Some(Target::Controller(controller.clone())),
            (None, None) => parent.and_then(|p| p.target.clone()),
        };

        let auth = config.auth.as_deref().or(parent.map(|p| p.auth)).unwrap_or(self.default_auth);
        let anti_csrf_check = config.anti_csrf_check.or(parent.map(|p| p.anti_csrf_check)).unwrap_or(true);
        let cors = match &config.cors {
            Some(cors) => Cors::from_config(cors).map(Arc::new),
            None => parent.map_or_else(|| self.domain_cors.clone(), |p| p.cors.clone()),
        };

        match &target {
            Some(target) => self.register(parent, name, config, &pattern, target, auth, anti_csrf_check, cors.clone())?,
            None if !config.routes.is_empty() => debug!(domain = self.domain, group = name, "route group without target"),
            None => {
                return Err(ConfigError::MissingTarget { domain: self.domain.to_owned(), route: name.to_owned() });
            }
        }

        if config.routes.is_empty() {
            return Ok(());
        }

        let inherited = Inherited { name, pattern: &pattern, target, auth, anti_csrf_check, cors };
        self.add_routes(Some(&inherited), &config.routes)
    }

    #[allow(clippy::too_many_arguments, reason = "flattening carries the full inherited state")]
    fn register(
        &mut self,
        parent: Option<&Inherited<'_>>,
        name: &str,
        config: &RouteConfig,
        pattern: &PathPattern,
        target: &Target,
        auth: &str,
        anti_csrf_check: bool,
        cors: Option<Arc<Cors>>,
    ) -> Result<(), ConfigError> {
        if self.table.names.contains_key(name) {
            return Err(ConfigError::DuplicateRouteName { domain: self.domain.to_owned(), route: name.to_owned() });
        }

        let (method, controller) = match target {
            Target::WebSocket(controller) => (WS.clone(), controller.clone()),
            Target::Controller(controller) => {
                let method = match &config.method {
                    Some(method) => parse_method(method).ok_or_else(|| ConfigError::InvalidMethod {
                        domain: self.domain.to_owned(),
                        route: name.to_owned(),
                        method: method.clone(),
                    })?,
                    None => Method::GET,
                };
                (method, controller.clone())
            }
        };
        let action = config.action.clone().unwrap_or_else(|| default_action(&method).to_owned());

        let index = self.table.routes.len();
        self.table.matcher.insert(pattern, method.clone(), index).map_err(|e| match e {
            InsertError::Duplicate { existing } => ConfigError::DuplicateRoute {
                domain: self.domain.to_owned(),
                route: name.to_owned(),
                existing: self.table.routes[existing].name.clone(),
                method: method.to_string(),
                path: pattern.to_string(),
            },
            InsertError::ConflictingParam { existing, name: param } => ConfigError::ConflictingParam {
                domain: self.domain.to_owned(),
                route: name.to_owned(),
                name: param,
                existing,
            },
        })?;

        debug!(
            domain = self.domain,
            route = name,
            method = %method,
            path = %pattern,
            controller = %controller,
            action = %action,
            "route registered"
        );

        self.table.routes.push(Arc::new(Route {
            index,
            name: name.to_owned(),
            pattern: pattern.clone(),
            method,
            controller,
            action,
            auth: auth.to_owned(),
            anti_csrf_check,
            cors,
            parent: parent.map(|p| p.name.to_owned()),
        }));
        self.table.names.insert(name.to_owned(), index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorsConfig;
    use crate::pattern::Segment;
    use crate::PathParams;

    fn load(config: &DomainConfig) -> RouteTable {
        RouteTable::load("localhost", config).unwrap()
    }

    fn found<'t>(outcome: MatchOutcome<&'t Arc<Route>>) -> (&'t Arc<Route>, PathParams) {
        match outcome {
            MatchOutcome::Found { route, params } => (route, params),
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_routes_inherit() {
        let config = DomainConfig::new("localhost").default_auth("form_auth").route(
            "version_home",
            RouteConfig::new("/doc/:version")
                .controller("Doc")
                .action("VersionHome")
                .anti_csrf_check(false)
                .route("show_doc", RouteConfig::new("/*content").action("ShowDoc"))
                .route("edit_doc", RouteConfig::new("/edit").controller("Editor").method("post").auth("admin")),
        );
        let table = load(&config);
        assert_eq!(table.len(), 3);

        let home = table.route("version_home").unwrap();
        assert_eq!(home.controller(), "Doc");
        assert_eq!(home.auth(), "form_auth");
        assert_eq!(home.parent(), None);

        let show_doc = table.route("show_doc").unwrap();
        assert_eq!(show_doc.path(), "/doc/:version/*content");
        assert_eq!(show_doc.controller(), "Doc");
        assert_eq!(show_doc.action(), "ShowDoc");
        assert_eq!(show_doc.auth(), "form_auth");
        assert!(!show_doc.anti_csrf_check());
        assert_eq!(show_doc.parent(), Some("version_home"));

        let edit = table.route("edit_doc").unwrap();
        assert_eq!(edit.method(), &Method::POST);
        assert_eq!(edit.controller(), "Editor");
        assert_eq!(edit.action(), "Create");
        assert_eq!(edit.auth(), "admin");
    }

    #[test]
    fn test_group_without_target() {
        let config = DomainConfig::new("localhost").route(
            "api",
            RouteConfig::new("/api/v1")
                .auth("token")
                .route("users", RouteConfig::new("/users").controller("User"))
                .route("user", RouteConfig::new("/users/:id").controller("User").action("Show")),
        );
        let table = load(&config);

        assert!(table.route("api").is_none());
        let user = table.route("user").unwrap();
        assert_eq!(user.path(), "/api/v1/users/:id");
        assert_eq!(user.auth(), "token");
        assert_eq!(table.route("users").unwrap().action(), "Index");
    }

    #[test]
    fn test_websocket_route() {
        let config = DomainConfig::new("localhost")
            .route("chat_page", RouteConfig::new("/chat").controller("Chat"))
            .route(
                "chat_ws",
                RouteConfig::new("/chat")
                    .websocket("ChatSocket")
                    .route("room_ws", RouteConfig::new("/:room").action("Room")),
            );
        let table = load(&config);

        let ws = table.route("chat_ws").unwrap();
        assert!(ws.is_websocket());
        assert_eq!(ws.controller(), "ChatSocket");
        assert_eq!(ws.action(), "Handle");

        let room = table.route("room_ws").unwrap();
        assert!(room.is_websocket());
        assert_eq!(room.controller(), "ChatSocket");

        assert_eq!(found(table.lookup(&Method::GET, "/chat")).0.name(), "chat_page");
        assert_eq!(found(table.lookup(&WS, "/chat")).0.name(), "chat_ws");
        assert_eq!(found(table.lookup(&WS, "/chat/lobby")).1.get("room"), Some("lobby"));
    }

    #[test]
    fn test_cors_inheritance() {
        let domain_cors = CorsConfig { enable: true, allow_origins: vec!["https://a.example".into()], ..Default::default() };
        let route_cors = CorsConfig { enable: true, allow_origins: vec!["https://b.example".into()], ..Default::default() };
        let config = DomainConfig::new("localhost")
            .cors(domain_cors)
            .route("plain", RouteConfig::new("/plain").controller("Site"))
            .route(
                "own",
                RouteConfig::new("/own")
                    .controller("Site")
                    .cors(route_cors)
                    .route("child", RouteConfig::new("/child")),
            )
            .route("off", RouteConfig::new("/off").controller("Site").cors(CorsConfig::default()));
        let table = load(&config);

        assert!(table.route("plain").unwrap().cors().unwrap().is_origin_allowed("https://a.example"));
        assert!(table.route("own").unwrap().cors().unwrap().is_origin_allowed("https://b.example"));
        assert!(table.route("child").unwrap().cors().unwrap().is_origin_allowed("https://b.example"));
        assert!(table.route("off").unwrap().cors().is_none());
    }

    #[test]
    fn test_every_route_matches_its_own_concrete_path() {
        let config = DomainConfig::new("localhost")
            .route("index", RouteConfig::new("/").controller("Site"))
            .route("baskets", RouteConfig::new("/baskets").controller("Basket").method("POST"))
            .route("new_basket", RouteConfig::new("/baskets/new").controller("Basket").action("New"))
            .route("basket", RouteConfig::new("/baskets/:id").controller("Basket").action("Show"))
            .route("basket_items", RouteConfig::new("/baskets/:id/items/*rest").controller("Basket").action("Items"))
            .route("chat", RouteConfig::new("/baskets/:id").websocket("BasketSocket"));
        let table = load(&config);

        for route in table.routes() {
            let args: Vec<String> = route.pattern().param_names().map(|n| format!("{n}-value")).collect();
            let path = route.reverse_path(&args).unwrap();

            let (matched, params) = found(table.lookup(route.method(), &path));
            assert_eq!(matched.name(), route.name(), "path {path}");
            for (segment, value) in route.pattern().segments().iter().filter_map(Segment::param_name).zip(&args) {
                assert_eq!(params.get(segment), Some(value.as_str()));
            }
        }
    }

    #[test]
    fn test_duplicate_route_name() {
        let config = DomainConfig::new("localhost").route(
            "home",
            RouteConfig::new("/").controller("Site").route("home", RouteConfig::new("/home")),
        );
        assert_eq!(
            RouteTable::load("localhost", &config).unwrap_err(),
            ConfigError::DuplicateRouteName { domain: "localhost".into(), route: "home".into() }
        );
    }

    #[test]
    fn test_duplicate_method_and_path() {
        let config = DomainConfig::new("localhost")
            .route("a", RouteConfig::new("/users/:id").controller("User"))
            .route("b", RouteConfig::new("/users/:id").controller("Other"));
        assert_eq!(
            RouteTable::load("localhost", &config).unwrap_err(),
            ConfigError::DuplicateRoute {
                domain: "localhost".into(),
                route: "b".into(),
                existing: "a".into(),
                method: "GET".into(),
                path: "/users/:id".into(),
            }
        );
    }

    #[test]
    fn test_invalid_routes() {
        let missing = DomainConfig::new("localhost").route("lonely", RouteConfig::new("/lonely"));
        assert!(matches!(RouteTable::load("localhost", &missing), Err(ConfigError::MissingTarget { .. })));

        let bad_path = DomainConfig::new("localhost").route("bad", RouteConfig::new("/files/*path/x").controller("F"));
        assert!(matches!(RouteTable::load("localhost", &bad_path), Err(ConfigError::InvalidPath { .. })));

        let bad_method =
            DomainConfig::new("localhost").route("bad", RouteConfig::new("/x").controller("F").method("GE T"));
        assert!(matches!(RouteTable::load("localhost", &bad_method), Err(ConfigError::InvalidMethod { .. })));

        let conflict = DomainConfig::new("localhost")
            .route("a", RouteConfig::new("/users/:id").controller("User"))
            .route("b", RouteConfig::new("/users/:name/posts").controller("Post"));
        assert!(matches!(RouteTable::load("localhost", &conflict), Err(ConfigError::ConflictingParam { .. })));
    }
}
