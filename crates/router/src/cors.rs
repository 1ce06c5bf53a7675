use crate::config::CorsConfig;
use tracing::warn;

const DEFAULT_ALLOW_METHODS: &[&str] = &["GET", "POST", "HEAD"];
const DEFAULT_ALLOW_HEADERS: &[&str] = &["Accept", "Authorization", "Content-Type", "Origin"];
const DEFAULT_MAX_AGE: u64 = 24 * 60 * 60;

/// Cross-origin policy of a domain or a single route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cors {
    allow_origins: Vec<String>,
    allow_methods: Vec<String>,
    allow_headers: Vec<String>,
    expose_headers: Vec<String>,
    allow_credentials: bool,
    max_age: u64,
}

impl Cors {
    /// Builds the policy of an enabled CORS block, `None` when the block is disabled.
    pub fn from_config(config: &CorsConfig) -> Option<Self> {
        if !config.enable {
            return None;
        }

        let allow_origins = if config.allow_origins.is_empty() {
            warn!("cors is enabled without allow_origins, allowing any origin");
            vec!["*".to_owned()]
        } else {
            config.allow_origins.iter().map(|o| o.trim_end_matches('/').to_ascii_lowercase()).collect()
        };

        Some(Self {
            allow_origins,
            allow_methods: or_defaults(&config.allow_methods, DEFAULT_ALLOW_METHODS, |m| m.to_ascii_uppercase()),
            allow_headers: or_defaults(&config.allow_headers, DEFAULT_ALLOW_HEADERS, str::to_owned),
            expose_headers: config.expose_headers.clone(),
            allow_credentials: config.allow_credentials,
            max_age: config.max_age.unwrap_or(DEFAULT_MAX_AGE),
        })
    }

    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.allows_any_origin() {
            return true;
        }
        let origin = origin.trim_end_matches('/');
        self.allow_origins.iter().any(|allowed| allowed.eq_ignore_ascii_case(origin))
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allow_origins.iter().any(|o| o == "*")
    }

    pub fn is_method_allowed(&self, method: &str) -> bool {
        self.allow_methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }

    pub fn allow_origins(&self) -> &[String] {
        &self.allow_origins
    }

    pub fn allow_methods(&self) -> &[String] {
        &self.allow_methods
    }

    pub fn allow_headers(&self) -> &[String] {
        &self.allow_headers
    }

    pub fn expose_headers(&self) -> &[String] {
        &self.expose_headers
    }

    pub fn allow_credentials(&self) -> bool {
        self.allow_credentials
    }

    pub fn max_age(&self) -> u64 {
        self.max_age
    }
}

fn or_defaults(values: &[String], defaults: &[&str], normalize: impl Fn(&str) -> String) -> Vec<String> {
    if values.is_empty() {
        defaults.iter().map(|v| normalize(v)).collect()
    } else {
        values.iter().map(|v| normalize(v)).collect()
    }
}
