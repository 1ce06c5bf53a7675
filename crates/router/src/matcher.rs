//! The per-domain path matcher.
//!
//! Routes are stored in a segment trie. Every node may have any number of literal children,
//! at most one named child and at most one wildcard child. A node that ends a pattern keeps
//! the route index registered for each method.
//!
//! Lookup descends segment by segment with backtracking, trying children in priority order:
//!
//! 1. the literal child equal to the segment
//! 2. the named child, for a non-empty segment
//! 3. the wildcard child, for a non-empty remainder
//!
//! A node only terminates a match when it holds a route for the requested method, so
//! `/baskets/new` registered for `POST` does not hide `/baskets/:id` for a `GET`.
//!
//! On top of the trie, [`PathMatcher::resolve`] applies the domain policy: trailing slash
//! redirects, automatic `OPTIONS` responses and `405 Method Not Allowed` detection.

use crate::method::{is_websocket, AllowedMethods};
use crate::pattern::{PathPattern, Segment};
use percent_encoding::percent_decode_str;
use crate::PathParams;
use http::{Method, StatusCode};
use std::collections::HashMap;

/// Policy flags that decide what happens when a path does not match exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPolicy {
    pub redirect_trailing_slash: bool,
    pub method_not_allowed: bool,
    pub auto_options: bool,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self { redirect_trailing_slash: true, method_not_allowed: true, auto_options: true }
    }
}

/// A redirect to the same path with its trailing slash added or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub path: String,
    pub status: StatusCode,
}

impl Redirect {
    fn for_method(method: &Method, path: String) -> Self {
        let status = if method == Method::GET { StatusCode::MOVED_PERMANENTLY } else { StatusCode::TEMPORARY_REDIRECT };
        Self { path, status }
    }
}

/// Result of matching a method and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome<R> {
    /// A route is registered for the method and path.
    Found { route: R, params: PathParams },
    /// The path matches only with its trailing slash toggled.
    Redirect(Redirect),
    /// An `OPTIONS` request for a path other methods are registered on.
    AutoOptions(AllowedMethods),
    /// The path is registered, but not for this method.
    MethodNotAllowed(AllowedMethods),
    NotFound,
}

impl<R> MatchOutcome<R> {
    pub fn map_route<R2, F: FnOnce(R) -> R2>(self, f: F) -> MatchOutcome<R2> {
        match self {
            MatchOutcome::Found { route, params } => MatchOutcome::Found { route: f(route), params },
            MatchOutcome::Redirect(redirect) => MatchOutcome::Redirect(redirect),
            MatchOutcome::AutoOptions(allowed) => MatchOutcome::AutoOptions(allowed),
            MatchOutcome::MethodNotAllowed(allowed) => MatchOutcome::MethodNotAllowed(allowed),
            MatchOutcome::NotFound => MatchOutcome::NotFound,
        }
    }

    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, MatchOutcome::Found { .. })
    }
}

/// Why a pattern could not be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertError {
    /// The method and pattern are already registered to the route at this index.
    Duplicate { existing: usize },
    /// Another parameter name already occupies this position.
    ConflictingParam { existing: String, name: String },
}

#[derive(Debug, Default)]
struct Slots {
    routes: Vec<(Method, usize)>,
}

impl Slots {
    fn get(&self, method: &Method) -> Option<usize> {
        self.routes.iter().find(|(m, _)| m == method).map(|(_, idx)| *idx)
    }

    fn insert(&mut self, method: Method, idx: usize) -> Result<(), InsertError> {
        match self.get(&method) {
            Some(existing) => Err(InsertError::Duplicate { existing }),
            None => {
                self.routes.push((method, idx));
                Ok(())
            }
        }
    }

    fn collect(&self, allowed: &mut AllowedMethods) {
        for (method, _) in &self.routes {
            allowed.insert(method.clone());
        }
    }
}

#[derive(Debug, Default)]
struct Node {
    literals: HashMap<String, Node>,
    named: Option<(String, Box<Node>)>,
    wildcard: Option<(String, Slots)>,
    slots: Slots,
}

#[derive(Debug, Clone, Copy)]
struct PathSegment<'p> {
    start: usize,
    text: &'p str,
}

fn split_path(path: &str) -> Option<Vec<PathSegment<'_>>> {
    let rest = path.strip_prefix('/')?;
    let mut start = 1;
    let mut segments = Vec::with_capacity(8);
    for text in rest.split('/') {
        segments.push(PathSegment { start, text });
        start += text.len() + 1;
    }
    Some(segments)
}

impl Node {
    fn insert(&mut self, segments: &[Segment], method: Method, idx: usize) -> Result<(), InsertError> {
        let Some((first, rest)) = segments.split_first() else {
            return self.slots.insert(method, idx);
        };

        match first {
            Segment::Literal(literal) => self.literals.entry(literal.clone()).or_default().insert(rest, method, idx),
            Segment::Named(name) => {
                let (existing, child) = self.named.get_or_insert_with(|| (name.clone(), Box::default()));
                if existing != name {
                    return Err(InsertError::ConflictingParam { existing: existing.clone(), name: name.clone() });
                }
                child.insert(rest, method, idx)
            }
            Segment::Wildcard(name) => {
                let (existing, slots) = self.wildcard.get_or_insert_with(|| (name.clone(), Slots::default()));
                if existing != name {
                    return Err(InsertError::ConflictingParam { existing: existing.clone(), name: name.clone() });
                }
                slots.insert(method, idx)
            }
        }
    }

    fn search<'t, 'p>(
        &'t self,
        segments: &[PathSegment<'p>],
        path: &'p str,
        method: &Method,
        params: &mut Vec<(&'t str, &'p str)>,
    ) -> Option<usize> {
        let Some((first, rest)) = segments.split_first() else {
            return self.slots.get(method);
        };

        if let Some(child) = self.literals.get(first.text) {
            if let Some(idx) = child.search(rest, path, method, params) {
                return Some(idx);
            }
        }

        if let Some((name, child)) = &self.named {
            if !first.text.is_empty() {
                params.push((name.as_str(), first.text));
                if let Some(idx) = child.search(rest, path, method, params) {
                    return Some(idx);
                }
                params.pop();
            }
        }

        if let Some((name, slots)) = &self.wildcard {
            let remainder = &path[first.start..];
            if !remainder.is_empty() {
                if let Some(idx) = slots.get(method) {
                    params.push((name.as_str(), remainder));
                    return Some(idx);
                }
            }
        }

        None
    }

    /// Collects every method registered on any pattern the path matches.
    fn collect_methods(&self, segments: &[PathSegment<'_>], path: &str, allowed: &mut AllowedMethods) {
        let Some((first, rest)) = segments.split_first() else {
            self.slots.collect(allowed);
            return;
        };

        if let Some(child) = self.literals.get(first.text) {
            child.collect_methods(rest, path, allowed);
        }
        if let Some((_, child)) = &self.named {
            if !first.text.is_empty() {
                child.collect_methods(rest, path, allowed);
            }
        }
        if let Some((_, slots)) = &self.wildcard {
            if first.start < path.len() {
                slots.collect(allowed);
            }
        }
    }
}

/// Matches request paths of one domain against its registered patterns.
#[derive(Debug, Default)]
pub struct PathMatcher {
    root: Node,
    policy: MatchPolicy,
    len: usize,
}

impl PathMatcher {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { root: Node::default(), policy, len: 0 }
    }

    #[inline]
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Number of registered (method, pattern) pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Registers `idx` for the method and pattern.
    pub fn insert(&mut self, pattern: &PathPattern, method: Method, idx: usize) -> Result<(), InsertError> {
        self.root.insert(pattern.segments(), method, idx)?;
        self.len += 1;
        Ok(())
    }

    /// Finds the route registered for exactly this method and path. Captured values are
    /// percent-decoded.
    pub fn find(&self, method: &Method, path: &str) -> Option<(usize, PathParams)> {
        let segments = split_path(path)?;
        let mut params = Vec::new();
        let idx = self.root.search(&segments, path, method, &mut params)?;
        let mut decoded = PathParams::new();
        for (name, value) in params {
            decoded.push(name, percent_decode_str(value).decode_utf8_lossy());
        }
        Some((idx, decoded))
    }

    /// Methods registered for any pattern matching the path, `WS` excluded.
    pub fn allowed(&self, path: &str) -> AllowedMethods {
        let mut allowed = AllowedMethods::new();
        if let Some(segments) = split_path(path) {
            self.root.collect_methods(&segments, path, &mut allowed);
        }
        allowed.remove(&crate::WS);
        allowed
    }

    /// Matches a method and path, applying the policy when there is no exact match.
    pub fn resolve(&self, method: &Method, path: &str) -> MatchOutcome<usize> {
        if !path.starts_with('/') {
            return MatchOutcome::NotFound;
        }

        if let Some((route, params)) = self.find(method, path) {
            return MatchOutcome::Found { route, params };
        }

        if self.policy.redirect_trailing_slash && path != "/" && method != Method::CONNECT {
            let toggled = toggle_trailing_slash(path);
            if self.find(method, &toggled).is_some() {
                return MatchOutcome::Redirect(Redirect::for_method(method, toggled));
            }
        }

        if is_websocket(method) {
            return MatchOutcome::NotFound;
        }

        if method == Method::OPTIONS && self.policy.auto_options {
            let mut allowed = self.allowed(path);
            allowed.remove(&Method::OPTIONS);
            if !allowed.is_empty() {
                return MatchOutcome::AutoOptions(allowed);
            }
        } else if self.policy.method_not_allowed {
            let mut allowed = self.allowed(path);
            allowed.remove(method);
            if !allowed.is_empty() {
                return MatchOutcome::MethodNotAllowed(allowed);
            }
        }

        MatchOutcome::NotFound
    }
}

fn toggle_trailing_slash(path: &str) -> String {
    match path.strip_suffix('/') {
        Some(stripped) => stripped.to_owned(),
        None => format!("{path}/"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WS;

    fn matcher(policy: MatchPolicy, routes: &[(Method, &str)]) -> PathMatcher {
        let mut matcher = PathMatcher::new(policy);
        for (idx, (method, path)) in routes.iter().enumerate() {
            matcher.insert(&PathPattern::parse(path).unwrap(), method.clone(), idx).unwrap();
        }
        matcher
    }

    fn found(outcome: MatchOutcome<usize>) -> (usize, PathParams) {
        match outcome {
            MatchOutcome::Found { route, params } => (route, params),
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn test_literal_out_ranks_named_in_either_order() {
        let orders: [&[(Method, &str)]; 2] = [
            &[(Method::GET, "/baskets/new"), (Method::GET, "/baskets/:id")],
            &[(Method::GET, "/baskets/:id"), (Method::GET, "/baskets/new")],
        ];

        for routes in orders {
            let matcher = matcher(MatchPolicy::default(), routes);
            let literal = routes.iter().position(|(_, p)| *p == "/baskets/new").unwrap();
            let named = 1 - literal;

            let (idx, params) = found(matcher.resolve(&Method::GET, "/baskets/new"));
            assert_eq!(idx, literal);
            assert!(params.is_empty());

            let (idx, params) = found(matcher.resolve(&Method::GET, "/baskets/42"));
            assert_eq!(idx, named);
            assert_eq!(params.get("id"), Some("42"));
        }
    }

    #[test]
    fn test_literal_without_method_falls_back_to_named() {
        let matcher = matcher(MatchPolicy::default(), &[(Method::POST, "/baskets/new"), (Method::GET, "/baskets/:id")]);

        let (idx, params) = found(matcher.resolve(&Method::GET, "/baskets/new"));
        assert_eq!(idx, 1);
        assert_eq!(params.get("id"), Some("new"));
    }

    #[test]
    fn test_backtracks_out_of_dead_literal_branch() {
        let matcher =
            matcher(MatchPolicy::default(), &[(Method::GET, "/users/admin/settings"), (Method::GET, "/users/:id/posts")]);

        let (idx, params) = found(matcher.resolve(&Method::GET, "/users/admin/posts"));
        assert_eq!(idx, 1);
        assert_eq!(params.get("id"), Some("admin"));
    }

    #[test]
    fn test_wildcard() {
        let matcher =
            matcher(MatchPolicy::default(), &[(Method::GET, "/doc/:version"), (Method::GET, "/doc/:version/*content")]);

        let (idx, params) = found(matcher.resolve(&Method::GET, "/doc/v1/a/b/c"));
        assert_eq!(idx, 1);
        assert_eq!(params.get("version"), Some("v1"));
        assert_eq!(params.get("content"), Some("a/b/c"));

        let (idx, params) = found(matcher.resolve(&Method::GET, "/doc/v1"));
        assert_eq!(idx, 0);
        assert_eq!(params.len(), 1);

        // a wildcard needs a non-empty remainder
        assert_eq!(matcher.find(&Method::GET, "/doc/v1/"), None);
    }

    #[test]
    fn test_params_are_decoded() {
        let matcher = matcher(MatchPolicy::default(), &[(Method::GET, "/users/:name"), (Method::GET, "/doc/*content")]);

        let (_, params) = found(matcher.resolve(&Method::GET, "/users/a%2Fb%20c"));
        assert_eq!(params.get("name"), Some("a/b c"));

        let (_, params) = found(matcher.resolve(&Method::GET, "/doc/x/100%25/caf%C3%A9"));
        assert_eq!(params.get("content"), Some("x/100%/caf\u{e9}"));
    }

    #[test]
    fn test_wildcard_is_last_resort() {
        let matcher = matcher(
            MatchPolicy::default(),
            &[(Method::GET, "/files/*path"), (Method::GET, "/files/:name"), (Method::GET, "/files/readme")],
        );

        assert_eq!(found(matcher.resolve(&Method::GET, "/files/readme")).0, 2);
        assert_eq!(found(matcher.resolve(&Method::GET, "/files/other")).0, 1);

        let (idx, params) = found(matcher.resolve(&Method::GET, "/files/a/b.txt"));
        assert_eq!(idx, 0);
        assert_eq!(params.get("path"), Some("a/b.txt"));
    }

    #[test]
    fn test_root() {
        let matcher = matcher(MatchPolicy::default(), &[(Method::GET, "/")]);
        assert_eq!(found(matcher.resolve(&Method::GET, "/")).0, 0);
        assert_eq!(matcher.resolve(&Method::GET, ""), MatchOutcome::NotFound);
        assert_eq!(matcher.resolve(&Method::GET, "/x"), MatchOutcome::NotFound);
    }

    #[test]
    fn test_trailing_slash_redirect() {
        let matcher = matcher(MatchPolicy::default(), &[(Method::GET, "/baskets"), (Method::POST, "/orders/")]);

        assert_eq!(
            matcher.resolve(&Method::GET, "/baskets/"),
            MatchOutcome::Redirect(Redirect { path: "/baskets".into(), status: StatusCode::MOVED_PERMANENTLY })
        );
        assert_eq!(
            matcher.resolve(&Method::POST, "/orders"),
            MatchOutcome::Redirect(Redirect { path: "/orders/".into(), status: StatusCode::TEMPORARY_REDIRECT })
        );

        let disabled = self::matcher(
            MatchPolicy { redirect_trailing_slash: false, ..MatchPolicy::default() },
            &[(Method::GET, "/baskets")],
        );
        assert_eq!(disabled.resolve(&Method::GET, "/baskets/"), MatchOutcome::NotFound);
    }

    #[test]
    fn test_method_not_allowed() {
        let routes = [(Method::POST, "/baskets")];

        let enabled = matcher(MatchPolicy::default(), &routes);
        let expected: AllowedMethods = [Method::POST].into_iter().collect();
        assert_eq!(enabled.resolve(&Method::GET, "/baskets"), MatchOutcome::MethodNotAllowed(expected));

        let disabled = matcher(MatchPolicy { method_not_allowed: false, ..MatchPolicy::default() }, &routes);
        assert_eq!(disabled.resolve(&Method::GET, "/baskets"), MatchOutcome::NotFound);
    }

    #[test]
    fn test_method_not_allowed_collects_across_patterns() {
        let matcher = matcher(
            MatchPolicy::default(),
            &[(Method::POST, "/baskets/new"), (Method::PUT, "/baskets/:id"), (Method::DELETE, "/baskets/:id")],
        );

        let expected: AllowedMethods = [Method::DELETE, Method::POST, Method::PUT].into_iter().collect();
        assert_eq!(matcher.resolve(&Method::PATCH, "/baskets/new"), MatchOutcome::MethodNotAllowed(expected));
    }

    #[test]
    fn test_auto_options() {
        let matcher = matcher(MatchPolicy::default(), &[(Method::POST, "/baskets"), (Method::GET, "/baskets")]);

        let expected: AllowedMethods = [Method::GET, Method::POST].into_iter().collect();
        assert_eq!(matcher.resolve(&Method::OPTIONS, "/baskets"), MatchOutcome::AutoOptions(expected));
        assert_eq!(matcher.resolve(&Method::OPTIONS, "/unknown"), MatchOutcome::NotFound);
    }

    #[test]
    fn test_explicit_options_route_wins() {
        let matcher = matcher(MatchPolicy::default(), &[(Method::POST, "/baskets"), (Method::OPTIONS, "/baskets")]);
        assert_eq!(found(matcher.resolve(&Method::OPTIONS, "/baskets")).0, 1);
    }

    #[test]
    fn test_options_without_auto_options_is_method_not_allowed() {
        let matcher = matcher(MatchPolicy { auto_options: false, ..MatchPolicy::default() }, &[(Method::POST, "/baskets")]);

        let expected: AllowedMethods = [Method::POST].into_iter().collect();
        assert_eq!(matcher.resolve(&Method::OPTIONS, "/baskets"), MatchOutcome::MethodNotAllowed(expected));
    }

    #[test]
    fn test_websocket_routes_share_paths() {
        let matcher = matcher(MatchPolicy::default(), &[(Method::GET, "/chat"), (WS.clone(), "/chat")]);

        assert_eq!(found(matcher.resolve(&Method::GET, "/chat")).0, 0);
        assert_eq!(found(matcher.resolve(&WS, "/chat")).0, 1);

        let expected: AllowedMethods = [Method::GET].into_iter().collect();
        assert_eq!(matcher.resolve(&Method::POST, "/chat"), MatchOutcome::MethodNotAllowed(expected));
        assert_eq!(matcher.resolve(&WS, "/other"), MatchOutcome::NotFound);
    }

    #[test]
    fn test_insert_errors() {
        let mut matcher = PathMatcher::new(MatchPolicy::default());
        matcher.insert(&PathPattern::parse("/users/:id").unwrap(), Method::GET, 0).unwrap();

        assert_eq!(
            matcher.insert(&PathPattern::parse("/users/:id").unwrap(), Method::GET, 1),
            Err(InsertError::Duplicate { existing: 0 })
        );
        assert_eq!(
            matcher.insert(&PathPattern::parse("/users/:name/posts").unwrap(), Method::GET, 2),
            Err(InsertError::ConflictingParam { existing: "id".into(), name: "name".into() })
        );
        assert!(matcher.insert(&PathPattern::parse("/users/:id").unwrap(), Method::DELETE, 3).is_ok());
        assert_eq!(matcher.len(), 2);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let matcher = matcher(MatchPolicy::default(), &[(Method::GET, "/doc/:version/*content")]);
        let first = matcher.resolve(&Method::GET, "/doc/v2/x/y");
        let second = matcher.resolve(&Method::GET, "/doc/v2/x/y");
        assert_eq!(first, second);
    }
}
