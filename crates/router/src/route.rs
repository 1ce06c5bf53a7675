use crate::method::is_websocket;
use crate::pattern::PathPattern;
use crate::Cors;
use http::Method;
use std::sync::Arc;

/// A named rule mapping a method and path pattern to a controller action.
///
/// Routes are produced by loading a domain's configuration and never change afterwards.
#[derive(Debug, Clone)]
pub struct Route {
    pub(crate) index: usize,
    pub(crate) name: String,
    pub(crate) pattern: PathPattern,
    pub(crate) method: Method,
    pub(crate) controller: String,
    pub(crate) action: String,
    pub(crate) auth: String,
    pub(crate) anti_csrf_check: bool,
    pub(crate) cors: Option<Arc<Cors>>,
    pub(crate) parent: Option<String>,
}

impl Route {
    /// Position of the route inside its domain's route table.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    #[inline]
    pub fn path(&self) -> &str {
        self.pattern.as_str()
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[inline]
    pub fn is_websocket(&self) -> bool {
        is_websocket(&self.method)
    }

    #[inline]
    pub fn controller(&self) -> &str {
        &self.controller
    }

    #[inline]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Auth scheme name, empty when the route is public.
    #[inline]
    pub fn auth(&self) -> &str {
        &self.auth
    }

    #[inline]
    pub fn anti_csrf_check(&self) -> bool {
        self.anti_csrf_check
    }

    #[inline]
    pub fn cors(&self) -> Option<&Arc<Cors>> {
        self.cors.as_ref()
    }

    /// Name of the route group this route was declared in.
    #[inline]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}
