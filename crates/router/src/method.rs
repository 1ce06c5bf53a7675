//! HTTP methods as the router sees them, plus the `WS` pseudo-method.

use http::header::InvalidHeaderValue;
use http::{HeaderValue, Method};
use once_cell::sync::Lazy;
use std::fmt;

/// The pseudo-method WebSocket routes are registered under.
///
/// A WebSocket upgrade request should be looked up with this method instead of `GET`,
/// so `GET /chat` and `WS /chat` can live side by side.
#[allow(clippy::expect_used, reason = "a constant two letter token always parses")]
pub static WS: Lazy<Method> = Lazy::new(|| Method::from_bytes(b"WS").expect("WS is a valid method token"));

#[inline]
pub fn is_websocket(method: &Method) -> bool {
    method.as_str() == "WS"
}

/// Parses a configured method name, case-insensitively.
pub fn parse_method(name: &str) -> Option<Method> {
    let upper = name.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return None;
    }
    Method::from_bytes(upper.as_bytes()).ok()
}

/// The action name a route gets when its configuration does not name one.
pub fn default_action(method: &Method) -> &'static str {
    match method.as_str() {
        "POST" => "Create",
        "PUT" | "PATCH" => "Update",
        "DELETE" => "Delete",
        "OPTIONS" => "Options",
        "HEAD" => "Head",
        "TRACE" => "Trace",
        "WS" => "Handle",
        _ => "Index",
    }
}

/// The set of methods registered for a path, used for `Allow` headers.
///
/// Kept sorted by method name and free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedMethods {
    methods: Vec<Method>,
}

impl AllowedMethods {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, method: Method) {
        if let Err(pos) = self.methods.binary_search_by(|m| m.as_str().cmp(method.as_str())) {
            self.methods.insert(pos, method);
        }
    }

    pub fn remove(&mut self, method: &Method) {
        self.methods.retain(|m| m != method);
    }

    #[inline]
    pub fn contains(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter()
    }

    pub fn to_header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::try_from(self.to_string())
    }
}

impl fmt::Display for AllowedMethods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, method) in self.methods.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(method.as_str())?;
        }
        Ok(())
    }
}

impl FromIterator<Method> for AllowedMethods {
    fn from_iter<T: IntoIterator<Item = Method>>(iter: T) -> Self {
        let mut allowed = AllowedMethods::new();
        for method in iter {
            allowed.insert(method);
        }
        allowed
    }
}
